//! Session inspection commands: list, show, delete, clean.

use anyhow::{Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use claudio_core::repository::state_store::StateStore;
use claudio_types::workflow::{WorkflowState, WorkflowStatus};

use super::parse_session_id;
use super::plan::{print_estimate, print_plan};
use crate::state::AppState;

/// List all stored sessions, newest last.
pub async fn list_sessions(state: &AppState, json: bool) -> Result<()> {
    let ids = state.store.list_sessions().await?;
    let mut sessions = Vec::with_capacity(ids.len());
    for id in ids {
        match state.store.load(id).await {
            Ok(Some(session)) => sessions.push(session),
            Ok(None) => {}
            Err(e) => tracing::warn!(session_id = %id, error = %e, "skipping unreadable session"),
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!(
            "  {} No sessions in {}. Create one with: {}",
            style("i").blue().bold(),
            style(state.data_dir.display()).dim(),
            style("claudio plan <seconds> --save").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Session").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("Scenes").fg(Color::White),
        Cell::new("Length").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
    ]);

    for session in &sessions {
        let (scenes, length) = match &session.scene_plan {
            Some(plan) => (
                format!("{}/{}", plan.completed_scene_count(), plan.scene_count()),
                format!("{:.1}s", plan.total_duration),
            ),
            None => ("-".to_string(), "-".to_string()),
        };
        table.add_row(vec![
            Cell::new(session.session_id).fg(Color::Cyan),
            status_cell(session.status),
            Cell::new(scenes),
            Cell::new(length),
            Cell::new(format_relative_time(&session.updated_at)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} session{}",
        style(sessions.len()).bold(),
        if sessions.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}

/// Show one session in detail.
pub async fn show_session(state: &AppState, id: &str, json: bool) -> Result<()> {
    let session = load_session(state, id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {}",
        style("Session").bold(),
        style(session.session_id).cyan().bold()
    );
    println!();
    println!("  {}", style("── Details ──").dim());
    println!("  {}    {}", style("Status:").bold(), format_status(session.status));
    println!(
        "  {}   {}",
        style("Created:").bold(),
        session.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "  {}   {}",
        style("Updated:").bold(),
        format_relative_time(&session.updated_at)
    );
    if let Some(req) = &session.requirements {
        println!("  {}   {}", style("Purpose:").bold(), req.video_purpose);
        if let Some(business) = &req.business_name {
            println!("  {}  {}", style("Business:").bold(), business);
        }
    }
    if let Some(error) = &session.error {
        println!("  {}     {}", style("Error:").bold(), style(error).red());
    }

    if let Some(plan) = &session.scene_plan {
        print_plan(plan);
        println!("  {}", style("── Progress ──").dim());
        println!(
            "  {}    {}/{}",
            style("Images:").bold(),
            session.production.images_completed.len(),
            plan.scene_count()
        );
        println!(
            "  {}    {}/{}",
            style("Videos:").bold(),
            session.production.videos_completed.len(),
            plan.scene_count()
        );
        if !session.production.scenes_failed.is_empty() {
            let failed: Vec<&str> = session
                .production
                .scenes_failed
                .iter()
                .map(String::as_str)
                .collect();
            println!("  {}    {}", style("Failed:").bold(), style(failed.join(", ")).red());
        }
        println!();
    }

    if let Some(estimate) = &session.estimated_cost {
        print_estimate(estimate);
    }
    if let Some(final_video) = &session.assets.final_video {
        println!(
            "  {} Final video: {}",
            style("✓").green().bold(),
            style(final_video.display()).yellow()
        );
        println!();
    }
    Ok(())
}

/// Delete a session directory after confirmation.
pub async fn delete_session(state: &AppState, id: &str, force: bool, json: bool) -> Result<()> {
    let session_id = parse_session_id(id)?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Permanently delete session '{}' and all its assets?",
                style(session_id).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    if !state.store.delete(session_id).await? {
        bail!("session not found: {session_id}");
    }

    if json {
        println!("{}", serde_json::json!({ "deleted": true, "session_id": session_id }));
    } else {
        println!("  {} Session {} deleted.", style("✓").red().bold(), session_id);
    }
    Ok(())
}

/// Remove a session's intermediate assets, keeping its state.
pub async fn clean_session(state: &AppState, id: &str, all: bool, json: bool) -> Result<()> {
    let session = load_session(state, id).await?;
    if !session.is_terminal() {
        tracing::warn!(
            session_id = %session.session_id,
            status = %session.status,
            "cleaning a session that has not finished"
        );
    }

    state
        .workspace
        .cleanup_session(session.session_id, !all)
        .await?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "cleaned": true, "session_id": session.session_id, "final_removed": all })
        );
    } else {
        println!(
            "  {} Intermediate assets of {} removed{}.",
            style("✓").green().bold(),
            session.session_id,
            if all { " (final video too)" } else { "" }
        );
    }
    Ok(())
}

pub(crate) async fn load_session(state: &AppState, id: &str) -> Result<WorkflowState> {
    let session_id = parse_session_id(id)?;
    match state.store.load(session_id).await? {
        Some(session) => Ok(session),
        None => bail!("session not found: {session_id}"),
    }
}

fn status_cell(status: WorkflowStatus) -> Cell {
    let cell = Cell::new(status.as_str());
    match status {
        WorkflowStatus::Completed => cell.fg(Color::Green),
        WorkflowStatus::Failed => cell.fg(Color::Red),
        WorkflowStatus::Planning | WorkflowStatus::Approval => cell.fg(Color::Yellow),
        _ => cell.fg(Color::Blue),
    }
}

fn format_status(status: WorkflowStatus) -> String {
    match status {
        WorkflowStatus::Completed => format!("{}", style("● completed").green()),
        WorkflowStatus::Failed => format!("{}", style("✗ failed").red()),
        other => format!("{}", style(format!("○ {other}")).yellow()),
    }
}

fn format_relative_time(dt: &chrono::DateTime<chrono::Utc>) -> String {
    let diff = chrono::Utc::now() - *dt;

    if diff.num_minutes() < 1 {
        "just now".to_string()
    } else if diff.num_hours() < 1 {
        format!("{}m ago", diff.num_minutes())
    } else if diff.num_days() < 1 {
        format!("{}h ago", diff.num_hours())
    } else if diff.num_days() < 30 {
        format!("{}d ago", diff.num_days())
    } else {
        dt.format("%Y-%m-%d").to_string()
    }
}
