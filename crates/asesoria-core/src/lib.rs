//! Plan domain for asesoria: normalizing rows from both plan tables into one
//! record, validating submitted plan forms, and the repository operations the
//! controller layer calls.

pub mod plan;
