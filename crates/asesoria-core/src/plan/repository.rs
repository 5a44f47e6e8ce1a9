//! Plan repository.
//!
//! Reads go to `travel_plans` first and only fall back to `citas` when the
//! modern table has nothing for the request. The two are never merged.
//! Writes, participation and the discovery feed live on `citas` until the
//! remaining rows are migrated.
//!
//! No operation here checks who is asking. Authorship is the caller's check.

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, info};

use asesoria_db::models::{JoinedUser, PlanSource, SourceSchema};
use asesoria_db::queries::{favoritos, plans as plan_queries};

use super::record::{Plan, today};
use super::summary::{CANCELLED_MARKER, encode_summary};
use super::validate::PlanDraft;

/// Most plans shown in the discovery feed.
pub const FEED_LIMIT: i64 = 10;

/// An entry of a user's schedule: a plan they wrote or joined.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleEntry {
    #[serde(flatten)]
    pub plan: Plan,
    /// Plan creation time for own plans, join time for joined ones.
    pub joined_at: DateTime<Utc>,
    pub es_propio: bool,
}

/// Store a new plan authored by `autor_id`. Returns its id.
pub async fn create(pool: &PgPool, autor_id: i64, draft: &PlanDraft) -> Result<i64> {
    let text = encode_summary(
        &draft.destination,
        &draft.start_text(),
        &draft.end_text(),
        &draft.plan,
    );
    let id = plan_queries::insert_legacy_plan(pool, &text, autor_id).await?;

    info!(plan_id = id, autor_id, "plan created");
    Ok(id)
}

/// Fetch one plan with its author's name, or `None` if neither table has it.
pub async fn get_by_id(pool: &PgPool, id: i64) -> Result<Option<Plan>> {
    let source = match plan_queries::get_modern_plan(pool, id).await? {
        Some(row) => Some(PlanSource::Modern(row)),
        None => {
            debug!(plan_id = id, "no travel_plans row, falling back to citas");
            plan_queries::get_legacy_plan(pool, id)
                .await?
                .map(PlanSource::Legacy)
        }
    };

    if let Some(source) = &source {
        debug!(plan_id = source.id(), schema = %source.schema(), "plan resolved");
    }
    Ok(source.map(Plan::from))
}

/// All plans written by `autor_id`, newest first.
pub async fn get_by_author(pool: &PgPool, autor_id: i64) -> Result<Vec<Plan>> {
    let modern = plan_queries::list_modern_plans_by_author(pool, autor_id).await?;
    let sources: Vec<PlanSource> = if modern.is_empty() {
        debug!(autor_id, "no travel_plans rows, falling back to citas");
        plan_queries::list_legacy_plans_by_author(pool, autor_id)
            .await?
            .into_iter()
            .map(PlanSource::Legacy)
            .collect()
    } else {
        modern.into_iter().map(PlanSource::Modern).collect()
    };

    Ok(normalize_all(sources))
}

/// The discovery feed: up to [`FEED_LIMIT`] plans the viewer neither wrote
/// nor joined, newest first.
pub async fn get_others(pool: &PgPool, viewer_id: i64) -> Result<Vec<Plan>> {
    let rows = plan_queries::list_legacy_plans_for_viewer(pool, viewer_id, FEED_LIMIT).await?;
    Ok(normalize_all(rows.into_iter().map(PlanSource::Legacy)))
}

/// Participants of a plan (never its author), oldest join first.
pub async fn get_joined_users(pool: &PgPool, plan_id: i64) -> Result<Vec<JoinedUser>> {
    favoritos::list_joined_users(pool, plan_id).await
}

/// Participants of an already resolved plan.
///
/// Participation rows reference `citas`, so a plan read from `travel_plans`
/// has none, even when a `citas` row happens to share its id.
pub async fn get_participants(pool: &PgPool, plan: &Plan) -> Result<Vec<JoinedUser>> {
    match plan.source {
        SourceSchema::Modern => Ok(Vec::new()),
        SourceSchema::Legacy => get_joined_users(pool, plan.id).await,
    }
}

/// Add `usuario_id` as a participant. Joining twice is a no-op.
pub async fn join(pool: &PgPool, usuario_id: i64, plan_id: i64) -> Result<()> {
    let inserted = favoritos::insert_favorito(pool, usuario_id, plan_id).await?;
    if inserted {
        info!(plan_id, usuario_id, "joined plan");
    } else {
        debug!(plan_id, usuario_id, "already joined");
    }
    Ok(())
}

/// Remove `usuario_id` from a plan's participants, if present.
pub async fn leave(pool: &PgPool, usuario_id: i64, plan_id: i64) -> Result<()> {
    let removed = favoritos::delete_favorito(pool, usuario_id, plan_id).await?;
    info!(plan_id, usuario_id, removed, "left plan");
    Ok(())
}

/// Mark a plan cancelled. Returns `false` when it already was (or does not
/// exist); the marker is never applied twice.
pub async fn cancel(pool: &PgPool, plan_id: i64) -> Result<bool> {
    let marked = plan_queries::prefix_legacy_plan_text(pool, plan_id, CANCELLED_MARKER).await?;
    info!(plan_id, marked, "plan cancel requested");
    Ok(marked > 0)
}

/// Remove a plan. Its participation rows are removed by the storage cascade.
pub async fn delete(pool: &PgPool, plan_id: i64) -> Result<()> {
    let removed = plan_queries::delete_legacy_plan(pool, plan_id).await?;
    info!(plan_id, removed, "plan deleted");
    Ok(())
}

/// Replace a plan's content with `draft`. Every field is rewritten.
pub async fn update(pool: &PgPool, plan_id: i64, draft: &PlanDraft) -> Result<()> {
    let text = encode_summary(
        &draft.destination,
        &draft.start_text(),
        &draft.end_text(),
        &draft.plan,
    );
    let updated = plan_queries::update_legacy_plan_text(pool, plan_id, &text).await?;
    if updated == 0 {
        bail!("asesoría {plan_id} no encontrada");
    }

    info!(plan_id, "plan updated");
    Ok(())
}

/// A user's schedule: the plans they wrote together with the plans they
/// joined, most recent activity first.
pub async fn get_trip_schedules(pool: &PgPool, usuario_id: i64) -> Result<Vec<ScheduleEntry>> {
    let own = plan_queries::list_legacy_plans_by_author(pool, usuario_id).await?;
    let joined = plan_queries::list_legacy_plans_joined_by(pool, usuario_id).await?;
    let today = today();

    let mut entries = Vec::with_capacity(own.len() + joined.len());
    entries.extend(own.into_iter().map(|row| {
        let joined_at = row.creado_en;
        ScheduleEntry {
            plan: Plan::from_source(PlanSource::Legacy(row), today),
            joined_at,
            es_propio: true,
        }
    }));
    entries.extend(joined.into_iter().map(|joined| ScheduleEntry {
        plan: Plan::from_source(PlanSource::Legacy(joined.row), today),
        joined_at: joined.joined_at,
        es_propio: false,
    }));

    entries.sort_by(|a, b| b.joined_at.cmp(&a.joined_at));
    Ok(entries)
}

fn normalize_all(sources: impl IntoIterator<Item = PlanSource>) -> Vec<Plan> {
    let today = today();
    sources
        .into_iter()
        .map(|source| Plan::from_source(source, today))
        .collect()
}
