//! CLI handlers for `asesoria plan` subcommands.
//!
//! Every command that acts for someone takes the acting user with `--user`.
//! Authorship checks happen here; the repository performs none.

use anyhow::{Result, bail};
use serde_json::json;
use sqlx::PgPool;

use asesoria_core::plan::record::today;
use asesoria_core::plan::repository;
use asesoria_core::plan::{DateValue, Plan, PlanForm, ScheduleEntry, format_travel_date};
use asesoria_db::models::{JoinedUser, SourceSchema};
use asesoria_db::queries::usuarios;

use crate::{PlanCommands, PlanFields, print_json};

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `PlanCommands` variant to the appropriate handler.
pub async fn run_plan_command(command: PlanCommands, pool: &PgPool, json: bool) -> Result<()> {
    match command {
        PlanCommands::Create { user, fields } => cmd_create(pool, user, fields, json).await,
        PlanCommands::Show { plan_id } => cmd_show(pool, plan_id, json).await,
        PlanCommands::Mine { user } => {
            let plans = repository::get_by_author(pool, user).await?;
            print_plans(&plans, json, "Todavía no has solicitado ninguna asesoría.")
        }
        PlanCommands::Feed { user } => {
            let plans = repository::get_others(pool, user).await?;
            print_plans(&plans, json, "No hay asesorías nuevas a las que unirse.")
        }
        PlanCommands::Schedule { user } => cmd_schedule(pool, user, json).await,
        PlanCommands::Join { user, plan_id } => cmd_join(pool, user, plan_id).await,
        PlanCommands::Leave { user, plan_id } => cmd_leave(pool, user, plan_id).await,
        PlanCommands::Update {
            user,
            plan_id,
            fields,
        } => cmd_update(pool, user, plan_id, fields).await,
        PlanCommands::Cancel { user, plan_id } => cmd_cancel(pool, user, plan_id).await,
        PlanCommands::Delete { user, plan_id } => cmd_delete(pool, user, plan_id).await,
    }
}

// -----------------------------------------------------------------------
// Checks
// -----------------------------------------------------------------------

impl PlanFields {
    fn into_form(self) -> PlanForm {
        PlanForm {
            destination: self.topic,
            plan: self.notes,
            duracion_horas: self.hours,
            travel_start_date: self.date,
        }
    }
}

async fn load_plan(pool: &PgPool, plan_id: i64) -> Result<Plan> {
    match repository::get_by_id(pool, plan_id).await? {
        Some(plan) => Ok(plan),
        None => bail!("asesoría {plan_id} no encontrada"),
    }
}

async fn require_user(pool: &PgPool, usuario_id: i64) -> Result<()> {
    if usuarios::get_usuario(pool, usuario_id).await?.is_none() {
        bail!("usuario {usuario_id} no encontrado");
    }
    Ok(())
}

fn ensure_author(plan: &Plan, usuario_id: i64) -> Result<()> {
    if !plan.is_authored_by(usuario_id) {
        bail!(
            "el usuario {usuario_id} no tiene permisos para editar la asesoría {}",
            plan.id
        );
    }
    Ok(())
}

/// Writes and participation only exist for plans stored in `citas`.
fn ensure_writable(plan: &Plan) -> Result<()> {
    if plan.source == SourceSchema::Modern {
        bail!(
            "la asesoría {} está guardada en {} y es de solo lectura hasta su migración",
            plan.id,
            plan.source.table_name()
        );
    }
    Ok(())
}

// -----------------------------------------------------------------------
// Handlers
// -----------------------------------------------------------------------

async fn cmd_create(pool: &PgPool, user: i64, fields: PlanFields, json: bool) -> Result<()> {
    require_user(pool, user).await?;
    let draft = fields.into_form().into_draft(today())?;

    let id = repository::create(pool, user, &draft).await?;

    if json {
        return print_json(&json!({ "id": id }));
    }
    println!("Asesoría creada.");
    println!();
    println!("  ID:       {id}");
    println!("  Tema:     {}", draft.destination);
    println!(
        "  Fecha:    {}",
        format_travel_date(Some(DateValue::Date(draft.travel_start_date)))
    );
    println!("  Horas:    {}", draft.duracion_horas);
    Ok(())
}

async fn cmd_show(pool: &PgPool, plan_id: i64, json: bool) -> Result<()> {
    let plan = load_plan(pool, plan_id).await?;
    let joined = repository::get_participants(pool, &plan).await?;

    if json {
        return print_json(&json!({ "plan": plan, "joined_users": joined }));
    }

    let view = PlanView::of(&plan);
    println!("Asesoría #{}", plan.id);
    println!("  Tema:     {}", view.topic);
    println!("  Fecha:    {}", view.date);
    println!("  Notas:    {}", view.notes);
    println!("  Autor:    {} (usuario {})", plan.author_name(), plan.autor_id);
    println!("  Estado:   {}", view.status);
    println!("  Creada:   {}", plan.creado_en.format("%Y-%m-%d %H:%M:%S UTC"));
    if let Some(hours) = plan.duracion_horas {
        println!("  Horas:    {hours}");
    }
    println!("  Tabla:    {}", plan.source.table_name());

    print_joined(&joined);
    Ok(())
}

async fn cmd_schedule(pool: &PgPool, user: i64, json: bool) -> Result<()> {
    let entries = repository::get_trip_schedules(pool, user).await?;
    if json {
        return print_json(&entries);
    }
    print_schedule(&entries);
    Ok(())
}

async fn cmd_join(pool: &PgPool, user: i64, plan_id: i64) -> Result<()> {
    require_user(pool, user).await?;
    let plan = load_plan(pool, plan_id).await?;
    ensure_writable(&plan)?;
    if plan.is_authored_by(user) {
        bail!("el usuario {user} es autor de la asesoría {plan_id} y no puede unirse");
    }

    repository::join(pool, user, plan_id).await?;
    println!("Te has unido a la asesoría {plan_id}.");
    Ok(())
}

async fn cmd_leave(pool: &PgPool, user: i64, plan_id: i64) -> Result<()> {
    let plan = load_plan(pool, plan_id).await?;
    ensure_writable(&plan)?;

    repository::leave(pool, user, plan_id).await?;
    println!("Has cancelado tu participación en la asesoría {plan_id}.");
    Ok(())
}

async fn cmd_update(pool: &PgPool, user: i64, plan_id: i64, fields: PlanFields) -> Result<()> {
    let plan = load_plan(pool, plan_id).await?;
    ensure_author(&plan, user)?;
    ensure_writable(&plan)?;
    let draft = fields.into_form().into_draft(today())?;

    repository::update(pool, plan_id, &draft).await?;
    println!("Asesoría {plan_id} actualizada.");
    Ok(())
}

async fn cmd_cancel(pool: &PgPool, user: i64, plan_id: i64) -> Result<()> {
    let plan = load_plan(pool, plan_id).await?;
    ensure_author(&plan, user)?;
    ensure_writable(&plan)?;

    if repository::cancel(pool, plan_id).await? {
        println!("Asesoría {plan_id} cancelada.");
    } else {
        println!("La asesoría {plan_id} ya estaba cancelada.");
    }
    Ok(())
}

async fn cmd_delete(pool: &PgPool, user: i64, plan_id: i64) -> Result<()> {
    let plan = load_plan(pool, plan_id).await?;
    ensure_author(&plan, user)?;
    ensure_writable(&plan)?;

    repository::delete(pool, plan_id).await?;
    println!("Asesoría {plan_id} eliminada.");
    Ok(())
}

// -----------------------------------------------------------------------
// Output
// -----------------------------------------------------------------------

/// Display fields of a plan. Legacy plans show what the author entered
/// when their text decodes, and the synthesized record otherwise.
struct PlanView {
    topic: String,
    date: String,
    notes: String,
    status: &'static str,
}

impl PlanView {
    fn of(plan: &Plan) -> Self {
        let (topic, start, notes, cancelled) = match plan.summary() {
            Some(s) => (s.destination, s.travel_start_date, s.plan, s.cancelled),
            None => (
                plan.destination.clone(),
                plan.travel_start_date.clone(),
                plan.plan.clone(),
                plan.is_cancelled(),
            ),
        };

        Self {
            topic,
            date: format_travel_date(Some(DateValue::Text(&start))),
            notes,
            status: if cancelled { "cancelada" } else { "activa" },
        }
    }
}

fn print_plans(plans: &[Plan], json: bool, empty_message: &str) -> Result<()> {
    if json {
        return print_json(&plans);
    }
    if plans.is_empty() {
        println!("{empty_message}");
        return Ok(());
    }

    let views: Vec<PlanView> = plans.iter().map(PlanView::of).collect();
    let topic_w = column_width(views.iter().map(|v| v.topic.as_str()), "TEMA");
    let author_w = column_width(plans.iter().map(|p| p.autor_nombre.as_str()), "AUTOR");

    println!(
        "{:>6}  {:<topic_w$}  {:<11}  {:<author_w$}  {:<9}  NOTAS",
        "ID", "TEMA", "FECHA", "AUTOR", "ESTADO",
    );
    for (plan, view) in plans.iter().zip(&views) {
        println!(
            "{:>6}  {:<topic_w$}  {:<11}  {:<author_w$}  {:<9}  {}",
            plan.id, view.topic, view.date, plan.autor_nombre, view.status, view.notes,
        );
    }
    Ok(())
}

fn print_schedule(entries: &[ScheduleEntry]) {
    if entries.is_empty() {
        println!("Tu agenda está vacía.");
        return;
    }

    let views: Vec<PlanView> = entries.iter().map(|e| PlanView::of(&e.plan)).collect();
    let topic_w = column_width(views.iter().map(|v| v.topic.as_str()), "TEMA");

    println!(
        "{:>6}  {:<topic_w$}  {:<11}  {:<6}  {:<9}  DESDE",
        "ID", "TEMA", "FECHA", "ROL", "ESTADO",
    );
    for (entry, view) in entries.iter().zip(&views) {
        let role = if entry.es_propio { "autor" } else { "unido" };
        println!(
            "{:>6}  {:<topic_w$}  {:<11}  {:<6}  {:<9}  {}",
            entry.plan.id,
            view.topic,
            view.date,
            role,
            view.status,
            entry.joined_at.format("%Y-%m-%d %H:%M"),
        );
    }
}

fn print_joined(joined: &[JoinedUser]) {
    println!();
    if joined.is_empty() {
        println!("Nadie se ha unido todavía.");
        return;
    }
    println!("Participantes ({}):", joined.len());
    for user in joined {
        println!(
            "  {} {} (usuario {}) desde {}",
            user.nombre,
            user.apellido,
            user.usuario_id,
            user.fecha_union.format("%Y-%m-%d %H:%M"),
        );
    }
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, header: &str) -> usize {
    values
        .map(|v| v.chars().count())
        .max()
        .unwrap_or(0)
        .max(header.len())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use asesoria_core::plan::summary::encode_summary;
    use asesoria_db::models::{LegacyPlanRow, ModernPlanRow, PlanSource};

    use super::*;

    fn legacy(cita: Option<&str>, autor_id: i64) -> Plan {
        let stamp = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        Plan::from_source(
            PlanSource::Legacy(LegacyPlanRow {
                id: 9,
                cita: cita.map(str::to_owned),
                autor_id,
                creado_en: stamp,
                actualizado_en: stamp,
                autor_nombre: "Ana".to_owned(),
                autor_apellido: "Ruiz".to_owned(),
            }),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        )
    }

    fn modern(autor_id: i64) -> Plan {
        let stamp = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        Plan::from_source(
            PlanSource::Modern(ModernPlanRow {
                id: 9,
                destination: "Algebra".to_owned(),
                description: None,
                travel_start_date: day,
                travel_end_date: day,
                plan: "vectors".to_owned(),
                duracion_horas: Some(2),
                is_active: Some(true),
                autor_id,
                creado_en: stamp,
                actualizado_en: stamp,
                autor_nombre: "Ana".to_owned(),
                autor_apellido: "Ruiz".to_owned(),
            }),
            day,
        )
    }

    #[test]
    fn only_the_author_passes_the_author_check() {
        let plan = legacy(None, 4);
        assert!(ensure_author(&plan, 4).is_ok());

        let err = ensure_author(&plan, 5).unwrap_err();
        assert_eq!(
            err.to_string(),
            "el usuario 5 no tiene permisos para editar la asesoría 9"
        );
    }

    #[test]
    fn modern_plans_are_read_only() {
        assert!(ensure_writable(&legacy(None, 4)).is_ok());

        let err = ensure_writable(&modern(4)).unwrap_err();
        assert!(err.to_string().contains("travel_plans"), "{err}");
    }

    #[test]
    fn view_uses_decoded_fields() {
        let text = encode_summary("Paris", "2026-11-02", "2026-11-02", "Need a French tutor");
        let view = PlanView::of(&legacy(Some(&text), 4));

        assert_eq!(view.topic, "Paris");
        assert_eq!(view.date, "Nov 02 2026");
        assert_eq!(view.notes, "Need a French tutor");
        assert_eq!(view.status, "activa");
    }

    #[test]
    fn view_falls_back_to_record_fields() {
        let view = PlanView::of(&legacy(Some("free text"), 4));

        assert_eq!(view.topic, "Destino #9");
        assert_eq!(view.date, "Mar 01 2026");
        assert_eq!(view.notes, "free text");
    }

    #[test]
    fn view_marks_cancelled_plans() {
        let text = format!("[CANCELADO] {}", encode_summary("Go", "2026-11-02", "2026-11-02", "n"));
        assert_eq!(PlanView::of(&legacy(Some(&text), 4)).status, "cancelada");
    }

    #[test]
    fn fields_map_onto_form() {
        let form = PlanFields {
            topic: Some("Rust".to_owned()),
            notes: Some("lifetimes".to_owned()),
            date: Some("2030-01-01".to_owned()),
            hours: None,
        }
        .into_form();

        assert_eq!(form.destination.as_deref(), Some("Rust"));
        assert_eq!(form.plan.as_deref(), Some("lifetimes"));
        assert_eq!(form.travel_start_date.as_deref(), Some("2030-01-01"));
        assert_eq!(form.duracion_horas, None);
    }

    #[test]
    fn column_width_respects_header() {
        assert_eq!(column_width(["ab"].into_iter(), "TEMA"), 4);
        assert_eq!(column_width(["ñandú salvaje"].into_iter(), "TEMA"), 13);
    }
}
