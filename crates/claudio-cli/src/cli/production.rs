//! Production commands operating on a stored session: estimate, concat.

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use claudio_core::production::orchestrator::{concatenate_session, estimate_and_record};

use super::plan::print_estimate;
use super::session::load_session;
use crate::state::AppState;

/// Compute, persist and print the cost estimate of a session.
pub async fn estimate(state: &AppState, id: &str, json: bool) -> Result<()> {
    let mut session = load_session(state, id).await?;
    let estimate = estimate_and_record(&mut session, &state.store, &state.config).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
        return Ok(());
    }

    println!();
    print_estimate(&estimate);
    Ok(())
}

/// Concatenate the session's finished segments into its final video.
///
/// Scenes without a finished segment are left out; a session with none fails.
pub async fn concat(state: &AppState, id: &str, json: bool) -> Result<()> {
    let mut session = load_session(state, id).await?;

    let spinner = if json {
        ProgressBar::hidden()
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
        spinner.set_message("Combining video segments...");
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        spinner
    };

    let result = concatenate_session(&mut session, &state.store, &state.concatenator).await;
    spinner.finish_and_clear();
    let final_video = result?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "session_id": session.session_id,
                "status": session.status,
                "final_video": final_video,
            })
        );
    } else {
        println!();
        println!(
            "  {} Final video written to {}",
            style("✓").green().bold(),
            style(final_video.display()).yellow()
        );
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use claudio_core::planning::{draft_plan, new_session};
    use claudio_core::repository::state_store::StateStore;
    use claudio_types::scene::VideoRequirements;
    use claudio_types::workflow::WorkflowStatus;

    #[tokio::test]
    async fn estimate_is_persisted() {
        let tmp = tempfile::TempDir::new().unwrap();
        let state = AppState::at(tmp.path().to_path_buf()).await.unwrap();
        let requirements = VideoRequirements {
            business_name: None,
            video_purpose: "teaser".to_string(),
            duration: 20.0,
            theme: None,
            additional_context: None,
        };
        let plan = draft_plan(&requirements, 8.0).unwrap();
        let session = new_session(Some(requirements), plan, 8.0).unwrap();
        state.store.save(&session).await.unwrap();

        estimate(&state, &session.session_id.to_string(), true)
            .await
            .unwrap();

        let stored = state.store.load(session.session_id).await.unwrap().unwrap();
        let cost = stored.estimated_cost.unwrap();
        assert!((cost.images_cost - 0.30).abs() < 1e-9);
        assert!((cost.videos_cost - 8.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn concat_without_videos_leaves_status_untouched() {
        let tmp = tempfile::TempDir::new().unwrap();
        let state = AppState::at(tmp.path().to_path_buf()).await.unwrap();
        let requirements = VideoRequirements {
            business_name: None,
            video_purpose: "teaser".to_string(),
            duration: 8.0,
            theme: None,
            additional_context: None,
        };
        let plan = draft_plan(&requirements, 8.0).unwrap();
        let session = new_session(Some(requirements), plan, 8.0).unwrap();
        state.store.save(&session).await.unwrap();

        assert!(concat(&state, &session.session_id.to_string(), true).await.is_err());

        let stored = state.store.load(session.session_id).await.unwrap().unwrap();
        assert_eq!(stored.status, WorkflowStatus::Approval);
    }
}
