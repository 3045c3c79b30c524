//! Workflow Orchestrator
//!
//! Drives each strategy through the pipeline as an independent task:
//!
//! ```text
//! RECEIVED → FUNDAMENTAL → TECHNICAL → RISK → EXECUTION → COMPLETED
//! ```
//!
//! For every stage it issues exactly one protected call (breaker → retry →
//! client), interprets the reply through the stage handler table, appends
//! the stage result to the audit trail and either advances or settles on
//! the stage's terminal status. Stages of one workflow never overlap;
//! independent workflows share nothing but the per-dependency breakers.
//!
//! Cancellation and the overall workflow timeout are observed between
//! stages and while a call is in flight. An in-flight call is left to
//! finish on its own task, but its result is discarded.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::{
    AuditFilter, AuditSummary, PipelineSettings, StageContext, StageDecision, StageHandlers,
};
use crate::application::ports::{AuditError, AuditTrail, RepositoryError, WorkflowRepository};
use crate::domain::shared::WorkflowId;
use crate::domain::workflow::{
    Stage, StageOutcome, StageResult, StrategyInput, Workflow, WorkflowError, WorkflowStatus,
    WorkflowSummary,
};
use crate::observability::metrics;
use crate::resilience::{CircuitBreakerMetrics, ServiceDependencies, SystemHealth};

/// Orchestrator errors.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// No workflow with this id.
    #[error("Workflow not found: {0}")]
    NotFound(WorkflowId),

    /// The strategy was rejected at submission.
    #[error("Invalid strategy: {0}")]
    InvalidStrategy(String),

    /// The workflow already finished.
    #[error("Workflow {id} already finished with {status}")]
    AlreadyTerminal {
        /// Workflow id.
        id: WorkflowId,
        /// Its terminal status.
        status: WorkflowStatus,
    },

    /// The orchestrator is shutting down and accepts no new work.
    #[error("Orchestrator is shutting down")]
    ShuttingDown,

    /// Snapshot store failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Audit trail failure.
    #[error(transparent)]
    Audit(#[from] AuditError),
}

/// Handle on a running workflow.
struct LiveWorkflow {
    cancel: CancellationToken,
    done: watch::Receiver<bool>,
}

/// Owned by the task driving a workflow.
struct RunHandle {
    cancel: CancellationToken,
    done: watch::Sender<bool>,
}

/// Drives workflows through the four-stage pipeline.
pub struct WorkflowOrchestrator<A, R>
where
    A: AuditTrail,
    R: WorkflowRepository,
{
    dependencies: ServiceDependencies,
    handlers: StageHandlers,
    settings: PipelineSettings,
    audit: Arc<A>,
    repository: Arc<R>,
    live: Mutex<HashMap<WorkflowId, LiveWorkflow>>,
    shutdown: CancellationToken,
}

impl<A, R> std::fmt::Debug for WorkflowOrchestrator<A, R>
where
    A: AuditTrail,
    R: WorkflowRepository,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowOrchestrator")
            .field("settings", &self.settings)
            .field("live_workflows", &self.live.lock().len())
            .finish_non_exhaustive()
    }
}

impl<A, R> WorkflowOrchestrator<A, R>
where
    A: AuditTrail + 'static,
    R: WorkflowRepository + 'static,
{
    /// Create an orchestrator bound to its dependencies and ports.
    #[must_use]
    pub fn new(
        dependencies: ServiceDependencies,
        settings: PipelineSettings,
        audit: Arc<A>,
        repository: Arc<R>,
    ) -> Self {
        Self {
            dependencies,
            handlers: StageHandlers::default(),
            settings,
            audit,
            repository,
            live: Mutex::new(HashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    // ========================================================================
    // Public surface
    // ========================================================================

    /// Accept a strategy and start driving it on its own task.
    ///
    /// Returns as soon as the workflow is recorded in `RECEIVED`.
    pub async fn submit(self: &Arc<Self>, strategy: StrategyInput) -> Result<WorkflowId, OrchestratorError> {
        let (workflow, handle) = self.accept(strategy).await?;
        let id = workflow.id().clone();

        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.drive(workflow, handle).await;
        });

        Ok(id)
    }

    /// Accept a strategy and wait for its terminal snapshot.
    ///
    /// The workflow runs on its own task exactly as with `submit`, so
    /// dropping this future ends the wait but not the workflow.
    pub async fn run(self: &Arc<Self>, strategy: StrategyInput) -> Result<Workflow, OrchestratorError> {
        let id = self.submit(strategy).await?;
        self.wait(&id).await
    }

    /// Current snapshot of a workflow.
    pub async fn get_status(&self, id: &WorkflowId) -> Result<Workflow, OrchestratorError> {
        self.repository
            .find(id)
            .await?
            .ok_or_else(|| OrchestratorError::NotFound(id.clone()))
    }

    /// Wait for a workflow to reach its terminal status and return it.
    pub async fn wait(&self, id: &WorkflowId) -> Result<Workflow, OrchestratorError> {
        let done = self.live.lock().get(id).map(|live| live.done.clone());
        if let Some(mut done) = done {
            // A dropped sender means the driving task is gone; fall through
            // to whatever snapshot it left.
            let _ = done.wait_for(|finished| *finished).await;
        }
        self.get_status(id).await
    }

    /// Request cancellation of a running workflow.
    ///
    /// The workflow settles on `CANCELLED` at its next suspension point.
    pub async fn cancel(&self, id: &WorkflowId) -> Result<(), OrchestratorError> {
        let token = self
            .live
            .lock()
            .get(id)
            .filter(|live| !*live.done.borrow())
            .map(|live| live.cancel.clone());

        if let Some(token) = token {
            tracing::info!(workflow_id = %id, "Cancellation requested");
            token.cancel();
            return Ok(());
        }

        let workflow = self.get_status(id).await?;
        Err(OrchestratorError::AlreadyTerminal {
            id: id.clone(),
            status: workflow.status(),
        })
    }

    /// Summaries of all known workflows, newest first.
    pub async fn list(&self) -> Result<Vec<WorkflowSummary>, OrchestratorError> {
        Ok(self
            .repository
            .list()
            .await?
            .iter()
            .map(Workflow::summary)
            .collect())
    }

    /// Ordered audit trail of a workflow.
    pub async fn audit_trail(&self, id: &WorkflowId) -> Result<Vec<StageResult>, OrchestratorError> {
        self.get_status(id).await?;
        Ok(self.audit.read(id).await?)
    }

    /// Audit trail entries of a workflow that pass `filter`.
    pub async fn filtered_audit_trail(
        &self,
        id: &WorkflowId,
        filter: AuditFilter,
    ) -> Result<Vec<StageResult>, OrchestratorError> {
        Ok(filter.apply(self.audit_trail(id).await?))
    }

    /// Roll up the audit trails of every workflow submitted since `since`.
    pub async fn audit_summary(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<AuditSummary, OrchestratorError> {
        let mut summary = AuditSummary::new(since);
        for workflow in self.repository.list().await? {
            if !summary.covers(workflow.created_at()) {
                continue;
            }
            let trail = self.audit.read(workflow.id()).await?;
            summary.record(workflow.status(), &trail);
        }
        Ok(summary)
    }

    /// Circuit breaker state of every dependency.
    #[must_use]
    pub fn dependency_health(&self) -> Vec<CircuitBreakerMetrics> {
        self.dependencies.all_metrics()
    }

    /// Check every dependency's health endpoint and roll up the results
    /// with breaker state.
    pub async fn system_health(&self) -> SystemHealth {
        let health = self.dependencies.check_health().await;
        tracing::debug!(
            status = health.status.as_str(),
            healthy = health.healthy,
            degraded = health.degraded,
            unhealthy = health.unhealthy,
            "Dependency health checked"
        );
        health
    }

    /// Number of workflows still running.
    #[must_use]
    pub fn live_workflows(&self) -> usize {
        self.live.lock().len()
    }

    /// Stop accepting work, cancel every running workflow and wait for
    /// them to settle.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();

        let pending: Vec<_> = self
            .live
            .lock()
            .values()
            .map(|live| live.done.clone())
            .collect();

        tracing::info!(running = pending.len(), "Cancelling running workflows");
        for mut done in pending {
            let _ = done.wait_for(|finished| *finished).await;
        }
    }

    // ========================================================================
    // Workflow driver
    // ========================================================================

    async fn accept(&self, strategy: StrategyInput) -> Result<(Workflow, RunHandle), OrchestratorError> {
        if self.shutdown.is_cancelled() {
            return Err(OrchestratorError::ShuttingDown);
        }
        strategy.validate().map_err(|e| match e {
            WorkflowError::InvalidStrategy(msg) => OrchestratorError::InvalidStrategy(msg),
            other => OrchestratorError::InvalidStrategy(other.to_string()),
        })?;

        let workflow = Workflow::new(WorkflowId::generate(), strategy);
        self.repository.save(&workflow).await?;

        let cancel = self.shutdown.child_token();
        let (done_tx, done_rx) = watch::channel(false);
        self.live.lock().insert(
            workflow.id().clone(),
            LiveWorkflow {
                cancel: cancel.clone(),
                done: done_rx,
            },
        );

        tracing::info!(
            workflow_id = %workflow.id(),
            goal = %workflow.strategy().goal,
            "Workflow received"
        );

        Ok((
            workflow,
            RunHandle {
                cancel,
                done: done_tx,
            },
        ))
    }

    async fn drive(&self, mut workflow: Workflow, handle: RunHandle) -> Workflow {
        let span = tracing::info_span!("workflow", workflow_id = %workflow.id());

        async {
            let deadline = Instant::now() + self.settings.workflow_timeout;
            let mut ctx = StageContext::new(workflow.strategy().clone());

            let status = self
                .run_stages(&mut workflow, &mut ctx, &handle.cancel, deadline)
                .await;

            if let Err(e) = workflow.finish(status) {
                tracing::error!(error = %e, "Failed to set terminal status");
            }
            self.publish(&workflow).await;
            metrics::record_workflow_terminal(workflow.status().as_str());

            tracing::info!(
                status = %workflow.status(),
                stages = workflow.stage_results().len(),
                "Workflow finished"
            );

            handle.done.send_replace(true);
            self.live.lock().remove(workflow.id());
            workflow
        }
        .instrument(span)
        .await
    }

    /// Run stages in order and return the terminal status to settle on.
    async fn run_stages(
        &self,
        workflow: &mut Workflow,
        ctx: &mut StageContext,
        cancel: &CancellationToken,
        deadline: Instant,
    ) -> WorkflowStatus {
        for stage in Stage::ALL {
            if cancel.is_cancelled() {
                workflow.set_last_error(format!("cancelled before {stage} stage"));
                return WorkflowStatus::Cancelled;
            }
            if Instant::now() >= deadline {
                workflow.set_last_error(self.timeout_detail(stage));
                return WorkflowStatus::Cancelled;
            }

            if let Err(e) = workflow.begin_stage(stage) {
                tracing::error!(stage = %stage, error = %e, "Stage out of order");
                workflow.set_last_error(e.to_string());
                return WorkflowStatus::StageFailed;
            }
            self.publish(workflow).await;

            let result = match self.execute_stage(stage, ctx, cancel, deadline).await {
                Ok(result) => result,
                Err(interrupted) => {
                    tracing::info!(stage = %stage, reason = %interrupted, "In-flight stage abandoned");
                    workflow.set_last_error(interrupted);
                    return WorkflowStatus::Cancelled;
                }
            };

            workflow.add_warnings(ctx.warnings.drain(..));
            if let Some(trade) = ctx.trade.take() {
                workflow.set_final_result(trade);
            }

            let outcome = result.outcome;
            let detail = result.detail.clone();
            if let Err(detail) = self.record(workflow, result).await {
                workflow.set_last_error(detail);
                return stage.failure_status();
            }

            match outcome {
                StageOutcome::Success => {}
                StageOutcome::DomainRejection => return stage.rejection_status(),
                StageOutcome::Failed | StageOutcome::Skipped => {
                    if let Some(detail) = detail {
                        workflow.set_last_error(detail);
                    }
                    return stage.failure_status();
                }
            }
        }

        WorkflowStatus::Completed
    }

    /// Make the stage's call and turn the reply into a stage result.
    ///
    /// `Err` carries the reason the stage was abandoned (cancel or timeout).
    async fn execute_stage(
        &self,
        stage: Stage,
        ctx: &mut StageContext,
        cancel: &CancellationToken,
        deadline: Instant,
    ) -> Result<StageResult, String> {
        let handler = self.handlers.get(stage);
        let started_at = Utc::now();

        let params = match handler.build_params(ctx, &self.settings) {
            Ok(params) => params,
            Err(e) => {
                return Ok(StageResult::failed(stage, e.to_string(), 0, started_at, Duration::ZERO));
            }
        };

        let dependency = Arc::clone(self.dependencies.get(stage.dependency()));
        let call = tokio::spawn(async move { dependency.call(stage.method(), params).await });

        let report = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return Err(format!("cancelled during {stage} stage"));
            }
            () = tokio::time::sleep_until(deadline) => {
                return Err(self.timeout_detail(stage));
            }
            joined = call => match joined {
                Ok(report) => report,
                Err(e) => {
                    return Ok(StageResult::failed(
                        stage,
                        format!("stage task failed: {e}"),
                        0,
                        started_at,
                        Duration::ZERO,
                    ));
                }
            },
        };

        let payload = match report.result {
            Ok(payload) => payload,
            Err(err) => {
                return Ok(StageResult::failed(
                    stage,
                    err.to_string(),
                    report.attempts,
                    report.started_at,
                    report.duration,
                ));
            }
        };

        Ok(match handler.interpret(&payload, ctx, &self.settings) {
            Ok(StageDecision::Proceed) => StageResult::success(
                stage,
                payload,
                report.attempts,
                report.started_at,
                report.duration,
            ),
            Ok(StageDecision::Stop { reason }) => StageResult::rejection(
                stage,
                payload,
                reason,
                report.attempts,
                report.started_at,
                report.duration,
            ),
            Err(e) => StageResult::failed(
                stage,
                format!("Protocol error: {e}"),
                report.attempts,
                report.started_at,
                report.duration,
            ),
        })
    }

    fn timeout_detail(&self, stage: Stage) -> String {
        format!(
            "workflow timed out after {}s at {stage} stage",
            self.settings.workflow_timeout.as_secs()
        )
    }

    /// Append a stage result to the audit trail, then to the workflow.
    ///
    /// A result the trail refuses is kept out of the snapshot as well, and
    /// `Err` carries the detail the stage fails with.
    async fn record(&self, workflow: &mut Workflow, result: StageResult) -> Result<(), String> {
        tracing::info!(
            stage = %result.stage,
            outcome = result.outcome.as_str(),
            attempts = result.attempt_count,
            duration_ms = u64::try_from(result.duration.as_millis()).unwrap_or(u64::MAX),
            detail = result.detail.as_deref().unwrap_or(""),
            "Stage resolved"
        );
        metrics::record_stage(
            result.stage.as_str(),
            result.outcome.as_str(),
            result.duration.as_secs_f64(),
        );

        if let Err(e) = self.audit.append(workflow.id(), result.clone()).await {
            tracing::error!(error = %e, "Failed to append to audit trail");
            return Err(format!("audit trail append failed: {e}"));
        }
        if let Err(e) = workflow.record_stage(result) {
            tracing::error!(error = %e, "Rejected stage result");
            return Err(e.to_string());
        }
        self.publish(workflow).await;
        Ok(())
    }

    async fn publish(&self, workflow: &Workflow) {
        if let Err(e) = self.repository.save(workflow).await {
            tracing::error!(
                workflow_id = %workflow.id(),
                error = %e,
                "Failed to publish workflow snapshot"
            );
        }
    }
}
