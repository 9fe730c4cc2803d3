//! Workflow state machine driving one production session.
//!
//! The orchestrator advances a [`WorkflowState`] through
//! `generating_images -> generating_videos -> concatenating -> completed`:
//!
//! 1. Validate the scene plan before any generation call.
//! 2. Image stage: one task per scene still missing its end frame, run on
//!    the bounded [`TaskScheduler`].
//! 3. Video stage: one task per scene still missing its video, with frames
//!    wired by the [`chainer`](super::chainer).
//! 4. Concatenate finished videos in plan order.
//!
//! State is persisted after every status change and after every finished
//! task. Per-task failures are counted, never raised; a stage is fatal only
//! when it leaves no usable output. A fatal error moves the session to
//! `failed` and is persisted before it is returned; when that save fails the
//! caller gets `FailureNotRecorded`. Stage tasks work on a copy of the
//! caller's state, so a cancelled pipeline leaves the last completed stage
//! boundary in place.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use claudio_types::config::ProductionConfig;
use claudio_types::error::{GenerationError, StoreError};
use claudio_types::generation::ImageRequest;
use claudio_types::workflow::{CostEstimate, WorkflowState, WorkflowStatus};
use uuid::Uuid;

use super::chainer::chain_video_tasks;
use super::error::{ProductionError, Stage};
use super::progress::ProgressTracker;
use super::scheduler::{TaskFailure, TaskScheduler};
use crate::concat::Concatenator;
use crate::gateway::GenerationGateway;
use crate::planning::validate_plan;
use crate::repository::state_store::StateStore;

/// Receives human-readable progress messages.
pub type ProgressCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Task counts for one stage run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    pub succeeded: usize,
    pub failed: usize,
    /// Scenes not dispatched because an upstream asset was missing.
    pub skipped: usize,
}

/// Why a stage task produced no asset.
#[derive(Debug)]
enum StageTaskError {
    Generation(GenerationError),
    Persist(StoreError),
}

// ---------------------------------------------------------------------------
// ProductionOrchestrator
// ---------------------------------------------------------------------------

/// Drives sessions from approved plan to final video.
///
/// Generic over the gateway, state store and concatenator so the engine
/// never depends on a concrete backend.
pub struct ProductionOrchestrator<G, S, C> {
    gateway: Arc<G>,
    store: Arc<S>,
    concatenator: C,
    config: ProductionConfig,
    scheduler: TaskScheduler,
}

impl<G, S, C> ProductionOrchestrator<G, S, C>
where
    G: GenerationGateway + 'static,
    S: StateStore + 'static,
    C: Concatenator,
{
    pub fn new(gateway: G, store: S, concatenator: C, config: ProductionConfig) -> Self {
        let scheduler = TaskScheduler::bounded(config.max_concurrency);
        Self {
            gateway: Arc::new(gateway),
            store: Arc::new(store),
            concatenator,
            config,
            scheduler,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ProductionConfig {
        &self.config
    }

    /// Estimate the cost of the session's plan and persist it into the state.
    pub async fn estimate_cost(
        &self,
        state: &mut WorkflowState,
    ) -> Result<CostEstimate, ProductionError> {
        estimate_and_record(state, &*self.store, &self.config).await
    }

    /// Generate end-frame images for every scene that lacks one.
    pub async fn run_image_stage(
        &self,
        state: &mut WorkflowState,
    ) -> Result<StageCounts, ProductionError> {
        self.image_stage(state, None).await
    }

    /// Generate video segments for every scene that lacks one.
    pub async fn run_video_stage(
        &self,
        state: &mut WorkflowState,
    ) -> Result<StageCounts, ProductionError> {
        self.video_stage(state, None).await
    }

    /// Concatenate finished videos in plan order and complete the session.
    pub async fn concatenate(&self, state: &mut WorkflowState) -> Result<PathBuf, ProductionError> {
        concatenate_session(state, &*self.store, &self.concatenator).await
    }

    /// Run the remaining stages of the session in order.
    ///
    /// Starts from the stage matching the current status, so a session
    /// interrupted mid-stage continues where it stopped. Partial failure
    /// within a stage is passed on; a stage with no usable output aborts the
    /// pipeline and moves the session to `failed`.
    pub async fn run_full_pipeline(
        &self,
        state: &mut WorkflowState,
        on_progress: Option<ProgressCallback>,
    ) -> Result<(), ProductionError> {
        if !state.can_resume() {
            return Err(ProductionError::NotResumable {
                session_id: state.session_id,
                status: state.status,
            });
        }
        let plan = state.scene_plan.as_ref().ok_or(ProductionError::MissingPlan)?;
        validate_plan(plan, self.config.max_scene_duration)?;

        tracing::info!(
            session_id = %state.session_id,
            status = %state.status,
            scenes = plan.scene_count(),
            "starting production"
        );

        match self.drive(state, on_progress.as_ref()).await {
            Ok(()) => {
                tracing::info!(session_id = %state.session_id, "production complete");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                tracing::error!(session_id = %state.session_id, error = %err_msg, "production failed");
                if let Err(transition) = state.mark_failed(&err_msg) {
                    tracing::warn!(
                        session_id = %state.session_id,
                        status = %state.status,
                        error = %transition,
                        "session already terminal, failed status not recorded"
                    );
                    return Err(e);
                }
                if let Err(save_err) = self.store.save(state).await {
                    tracing::error!(
                        session_id = %state.session_id,
                        error = %save_err,
                        "failed to persist failed status"
                    );
                    return Err(ProductionError::FailureNotRecorded {
                        cause: Box::new(e),
                        store: save_err,
                    });
                }
                Err(e)
            }
        }
    }

    /// Load a stored session and continue its pipeline.
    pub async fn resume(
        &self,
        session_id: Uuid,
        on_progress: Option<ProgressCallback>,
    ) -> Result<WorkflowState, ProductionError> {
        let mut state = self
            .store
            .load(session_id)
            .await?
            .ok_or(ProductionError::SessionNotFound(session_id))?;

        if !state.can_resume() {
            return Err(ProductionError::NotResumable {
                session_id,
                status: state.status,
            });
        }

        tracing::info!(session_id = %session_id, status = %state.status, "resuming session");
        self.run_full_pipeline(&mut state, on_progress).await?;
        Ok(state)
    }

    // -----------------------------------------------------------------------
    // Pipeline
    // -----------------------------------------------------------------------

    async fn drive(
        &self,
        state: &mut WorkflowState,
        progress: Option<&ProgressCallback>,
    ) -> Result<(), ProductionError> {
        if matches!(
            state.status,
            WorkflowStatus::Planning | WorkflowStatus::Approval | WorkflowStatus::GeneratingImages
        ) {
            report(progress, "Generating scene end-frame images...");
            let counts = self.image_stage(state, progress).await?;
            if counts.failed > 0 {
                tracing::warn!(session_id = %state.session_id, failed = counts.failed, "some images failed");
            }
            if usable_count(state, Stage::Images) == 0 {
                return Err(ProductionError::StageFatal {
                    stage: Stage::Images,
                    message: "no images were generated successfully".to_string(),
                });
            }
        }

        if state.status == WorkflowStatus::GeneratingImages
            || state.status == WorkflowStatus::GeneratingVideos
        {
            report(progress, "Generating video segments...");
            let counts = self.video_stage(state, progress).await?;
            if counts.failed > 0 || counts.skipped > 0 {
                tracing::warn!(
                    session_id = %state.session_id,
                    failed = counts.failed,
                    skipped = counts.skipped,
                    "some videos failed"
                );
            }
            if usable_count(state, Stage::Videos) == 0 {
                return Err(ProductionError::StageFatal {
                    stage: Stage::Videos,
                    message: "no videos were generated successfully".to_string(),
                });
            }
        }

        report(progress, "Combining video segments...");
        self.concatenate(state).await?;
        report(progress, "Production complete");
        Ok(())
    }

    async fn image_stage(
        &self,
        state: &mut WorkflowState,
        progress: Option<&ProgressCallback>,
    ) -> Result<StageCounts, ProductionError> {
        let plan = state.scene_plan.as_ref().ok_or(ProductionError::MissingPlan)?;
        validate_plan(plan, self.config.max_scene_duration)?;

        let requests: Vec<ImageRequest> = plan
            .pending_images()
            .map(|scene| ImageRequest {
                session_id: state.session_id,
                scene_id: scene.scene_id.clone(),
                prompt: scene.end_image_prompt.clone(),
                aspect_ratio: self.config.aspect_ratio.clone(),
                quality: self.config.image_quality.clone(),
            })
            .collect();

        state.transition_to(WorkflowStatus::GeneratingImages)?;
        self.store.save(state).await?;

        tracing::info!(
            session_id = %state.session_id,
            count = requests.len(),
            "generating images"
        );
        if requests.is_empty() {
            return Ok(StageCounts::default());
        }

        let scene_ids: Vec<String> = requests.iter().map(|r| r.scene_id.clone()).collect();
        let tracker = Arc::new(ProgressTracker::new(requests.len()));
        let shared = Arc::new(Mutex::new(state.clone()));

        let tasks: Vec<_> = requests
            .into_iter()
            .map(|request| {
                let gateway = Arc::clone(&self.gateway);
                let store = Arc::clone(&self.store);
                let shared = Arc::clone(&shared);
                let tracker = Arc::clone(&tracker);
                let progress = progress.cloned();
                async move {
                    let outcome = gateway.generate_end_frame_image(&request).await;
                    finish_task(
                        Stage::Images,
                        &request.scene_id,
                        outcome,
                        &shared,
                        &*store,
                        &tracker,
                        progress.as_ref(),
                    )
                    .await
                }
            })
            .collect();

        let results = self.scheduler.run(tasks).await;
        *state = reclaim(shared).await;
        self.settle(state, Stage::Images, scene_ids, results).await
    }

    async fn video_stage(
        &self,
        state: &mut WorkflowState,
        progress: Option<&ProgressCallback>,
    ) -> Result<StageCounts, ProductionError> {
        let plan = state.scene_plan.as_ref().ok_or(ProductionError::MissingPlan)?;
        validate_plan(plan, self.config.max_scene_duration)?;

        let chain = chain_video_tasks(plan);
        let skipped = chain.skipped.len();

        state.transition_to(WorkflowStatus::GeneratingVideos)?;
        self.store.save(state).await?;

        tracing::info!(
            session_id = %state.session_id,
            count = chain.links.len(),
            skipped,
            "generating videos"
        );
        if chain.links.is_empty() {
            return Ok(StageCounts {
                skipped,
                ..StageCounts::default()
            });
        }

        let session_id = state.session_id;
        let scene_ids: Vec<String> = chain.links.iter().map(|l| l.scene_id.clone()).collect();
        let tracker = Arc::new(ProgressTracker::new(chain.links.len()));
        let shared = Arc::new(Mutex::new(state.clone()));

        let tasks: Vec<_> = chain
            .links
            .into_iter()
            .map(|link| {
                let request = link.into_request(session_id, &self.config.video_resolution);
                let gateway = Arc::clone(&self.gateway);
                let store = Arc::clone(&self.store);
                let shared = Arc::clone(&shared);
                let tracker = Arc::clone(&tracker);
                let progress = progress.cloned();
                async move {
                    let outcome = gateway.generate_video_segment(&request).await;
                    finish_task(
                        Stage::Videos,
                        &request.scene_id,
                        outcome,
                        &shared,
                        &*store,
                        &tracker,
                        progress.as_ref(),
                    )
                    .await
                }
            })
            .collect();

        let results = self.scheduler.run(tasks).await;
        *state = reclaim(shared).await;
        let mut counts = self.settle(state, Stage::Videos, scene_ids, results).await?;
        counts.skipped = skipped;
        Ok(counts)
    }

    /// Tally a stage's result slots.
    ///
    /// Persistence failures inside tasks are propagated. Panicked or aborted
    /// tasks never recorded their outcome, so their scenes are marked failed
    /// here.
    async fn settle(
        &self,
        state: &mut WorkflowState,
        stage: Stage,
        scene_ids: Vec<String>,
        results: Vec<Result<PathBuf, TaskFailure<StageTaskError>>>,
    ) -> Result<StageCounts, ProductionError> {
        let mut counts = StageCounts::default();
        let mut persist_error = None;
        let mut unrecorded = false;

        for (scene_id, result) in scene_ids.iter().zip(results) {
            match result {
                Ok(_) => counts.succeeded += 1,
                Err(TaskFailure::Failed(StageTaskError::Generation(e))) => {
                    tracing::debug!(scene_id = scene_id.as_str(), error = %e, "counted as failed");
                    counts.failed += 1;
                }
                Err(TaskFailure::Failed(StageTaskError::Persist(e))) => {
                    persist_error.get_or_insert(e);
                }
                Err(TaskFailure::Panicked(_)) | Err(TaskFailure::Aborted) => {
                    state.record_scene_failure(scene_id);
                    unrecorded = true;
                    counts.failed += 1;
                }
            }
        }

        if let Some(e) = persist_error {
            return Err(ProductionError::Store(e));
        }
        if unrecorded {
            self.store.save(state).await?;
        }

        tracing::info!(
            session_id = %state.session_id,
            %stage,
            succeeded = counts.succeeded,
            failed = counts.failed,
            "stage finished"
        );
        Ok(counts)
    }
}

// ---------------------------------------------------------------------------
// Stage helpers
// ---------------------------------------------------------------------------

/// Estimate the cost of the session's plan and persist it into the state.
pub async fn estimate_and_record<S: StateStore>(
    state: &mut WorkflowState,
    store: &S,
    config: &ProductionConfig,
) -> Result<CostEstimate, ProductionError> {
    let plan = state.scene_plan.as_ref().ok_or(ProductionError::MissingPlan)?;
    let estimate = CostEstimate::compute(plan.scene_count(), plan.total_duration, config);

    tracing::info!(
        session_id = %state.session_id,
        scenes = plan.scene_count(),
        total_cost = estimate.total_cost,
        "cost estimated"
    );

    state.estimated_cost = Some(estimate.clone());
    store.save(state).await?;
    Ok(estimate)
}

/// Concatenate the session's finished videos in plan order.
///
/// Scenes without a video are left out with a warning. On success the final
/// asset is recorded and the session moves to `completed`.
pub async fn concatenate_session<S: StateStore, C: Concatenator>(
    state: &mut WorkflowState,
    store: &S,
    concatenator: &C,
) -> Result<PathBuf, ProductionError> {
    let plan = state.scene_plan.as_ref().ok_or(ProductionError::MissingPlan)?;

    let mut inputs = Vec::with_capacity(plan.scene_count());
    for scene in &plan.scenes {
        match scene.usable_video() {
            Some(path) => inputs.push(path.clone()),
            None => tracing::warn!(
                session_id = %state.session_id,
                scene_id = scene.scene_id.as_str(),
                "missing video, left out of concatenation"
            ),
        }
    }
    if inputs.is_empty() {
        return Err(ProductionError::MissingAssets);
    }

    state.transition_to(WorkflowStatus::Concatenating)?;
    store.save(state).await?;

    tracing::info!(session_id = %state.session_id, inputs = inputs.len(), "concatenating videos");
    let final_video = concatenator.concatenate(state.session_id, &inputs).await?;

    state.complete_with(final_video.clone())?;
    store.save(state).await?;
    tracing::info!(
        session_id = %state.session_id,
        path = %final_video.display(),
        "concatenation complete"
    );
    Ok(final_video)
}

/// Record one task's outcome, persist, and report progress.
async fn finish_task<S: StateStore>(
    stage: Stage,
    scene_id: &str,
    outcome: Result<PathBuf, GenerationError>,
    shared: &Mutex<WorkflowState>,
    store: &S,
    tracker: &ProgressTracker,
    progress: Option<&ProgressCallback>,
) -> Result<PathBuf, StageTaskError> {
    let mut state = shared.lock().await;
    let session_id = state.session_id;

    match &outcome {
        Ok(path) => {
            match stage {
                Stage::Images => state.record_image(scene_id, path.clone()),
                Stage::Videos => state.record_video(scene_id, path.clone()),
            }
            tracing::info!(session_id = %session_id, scene_id, %stage, "scene asset generated");
        }
        Err(e) => {
            state.record_scene_failure(scene_id);
            tracing::error!(session_id = %session_id, scene_id, %stage, error = %e, "scene generation failed");
        }
    }

    store.save(&state).await.map_err(StageTaskError::Persist)?;
    drop(state);

    let snapshot = match outcome {
        Ok(_) => tracker.mark_completed(),
        Err(_) => tracker.mark_failed(),
    };
    let label = match stage {
        Stage::Images => "Images",
        Stage::Videos => "Videos",
    };
    report(progress, &format!("{label}: {snapshot}"));

    outcome.map_err(StageTaskError::Generation)
}

/// Take the stage's state back once every task has finished.
async fn reclaim(shared: Arc<Mutex<WorkflowState>>) -> WorkflowState {
    match Arc::try_unwrap(shared) {
        Ok(mutex) => mutex.into_inner(),
        Err(shared) => shared.lock().await.clone(),
    }
}

fn usable_count(state: &WorkflowState, stage: Stage) -> usize {
    state.scene_plan.as_ref().map_or(0, |plan| {
        plan.scenes
            .iter()
            .filter(|s| match stage {
                Stage::Images => s.usable_image().is_some(),
                Stage::Videos => s.usable_video().is_some(),
            })
            .count()
    })
}

fn report(progress: Option<&ProgressCallback>, message: &str) {
    if let Some(callback) = progress {
        callback(message);
    }
}
