//! Planning commands: draft a plan from a duration, import a plan document.

use std::path::Path;

use anyhow::{Context, Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use claudio_core::planning::{draft_plan, new_session, parse_plan_document, validate_plan};
use claudio_core::production::orchestrator::estimate_and_record;
use claudio_core::repository::state_store::StateStore;
use claudio_types::scene::{ScenePlan, VideoRequirements};
use claudio_types::workflow::{CostEstimate, WorkflowState};

use super::PlanArgs;
use crate::state::AppState;

/// Draft a plan for `args.duration`, optionally saving it as a session.
///
/// # Examples
///
/// ```bash
/// claudio plan 20 --theme "warm sunrise" --save
/// ```
pub async fn plan(state: &AppState, args: PlanArgs, json: bool) -> Result<()> {
    let limit = state.config.max_scene_duration;
    let max = args.max_segment.unwrap_or(limit);
    if max > limit {
        bail!("--max-segment {max} exceeds the configured max_scene_duration of {limit}s");
    }
    let requirements = VideoRequirements {
        business_name: args.business,
        video_purpose: args.purpose,
        duration: args.duration,
        theme: args.theme,
        additional_context: args.context,
    };
    let plan = draft_plan(&requirements, max)?;

    if args.save {
        let session = new_session(Some(requirements), plan, max)?;
        return save_and_print(state, session, json).await;
    }

    validate_plan(&plan, max)?;
    let estimate = CostEstimate::compute(plan.scene_count(), plan.total_duration, &state.config);

    if json {
        let out = serde_json::json!({ "plan": plan, "estimated_cost": estimate });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_plan(&plan);
    print_estimate(&estimate);
    println!(
        "  Save it as a session with: {}",
        style(format!("claudio plan {} --save", args.duration)).yellow()
    );
    println!();
    Ok(())
}

/// Create a session from a plan document on disk.
pub async fn import(state: &AppState, file: &Path, json: bool) -> Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let (requirements, plan) = parse_plan_document(&text)?;
    let session = new_session(Some(requirements), plan, state.config.max_scene_duration)?;
    save_and_print(state, session, json).await
}

async fn save_and_print(state: &AppState, mut session: WorkflowState, json: bool) -> Result<()> {
    state.store.save(&session).await?;
    let estimate = estimate_and_record(&mut session, &state.store, &state.config).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Session created, awaiting approval",
        style("✓").green().bold()
    );
    println!(
        "  {}  {}",
        style("ID:").bold(),
        style(session.session_id.to_string()).cyan()
    );
    if let Some(plan) = &session.scene_plan {
        print_plan(plan);
    }
    print_estimate(&estimate);
    Ok(())
}

/// Render the scenes of a plan as a table.
pub(crate) fn plan_table(plan: &ScenePlan) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Scene").fg(Color::White),
        Cell::new("Duration").fg(Color::White),
        Cell::new("Image").fg(Color::White),
        Cell::new("Video").fg(Color::White),
        Cell::new("Prompt").fg(Color::White),
    ]);

    for scene in &plan.scenes {
        let done = |ok: bool| {
            if ok {
                Cell::new("✓").fg(Color::Green)
            } else {
                Cell::new("·").fg(Color::DarkGrey)
            }
        };
        table.add_row(vec![
            Cell::new(&scene.scene_id).fg(Color::Cyan),
            Cell::new(format!("{:.1}s", scene.duration)),
            done(scene.usable_image().is_some()),
            done(scene.usable_video().is_some()),
            Cell::new(truncate(&scene.video_prompt, 60)),
        ]);
    }
    table
}

pub(crate) fn print_plan(plan: &ScenePlan) {
    println!();
    if let Some(theme) = &plan.theme {
        println!("  {}  {}", style("Theme:").bold(), theme);
    }
    println!(
        "  {}  {:.1}s in {} scene{}",
        style("Length:").bold(),
        plan.total_duration,
        plan.scene_count(),
        if plan.scene_count() == 1 { "" } else { "s" }
    );
    println!();
    println!("{}", plan_table(plan));
    println!();
}

pub(crate) fn print_estimate(estimate: &CostEstimate) {
    println!("  {}", style("── Estimated cost ──").dim());
    for line in estimate.format_cost().lines() {
        println!("  {line}");
    }
    println!();
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars - 3).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
