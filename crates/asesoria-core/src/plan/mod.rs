//! Plans: the unified record, date handling, the legacy text codec, form
//! validation, and the repository.

pub mod dates;
pub mod record;
pub mod repository;
pub mod summary;
pub mod validate;

pub use dates::{DateValue, format_travel_date, normalize_date};
pub use record::Plan;
pub use repository::ScheduleEntry;
pub use summary::{PlanSummary, SummaryParseError};
pub use validate::{PlanDraft, PlanForm, PlanFormError, ValidationReport, validate, validate_on};
