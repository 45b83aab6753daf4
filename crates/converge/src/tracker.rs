//! Task tracking
//!
//! Some providers hand back a task for every mutating call. Completion of
//! the task says nothing about the resource: a "successful" power-on can
//! leave the server stopped. [`TaskTracker`] waits for the task and then
//! checks the resource once against the expected state.

use crate::accessor::{Fetched, ResourceAccessor, TaskAccessor};
use crate::await_spec::AwaitSpec;
use crate::error::{ConvergeError, Result};
use crate::lifecycle::LifecycleState;
use crate::poller::{ConvergenceOutcome, Poller};
use crate::snapshot::{ResourceId, ResourceSnapshot, Task};
use crate::status::Translate;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct TaskTracker {
    tasks: Poller,
    resources: Arc<dyn Translate>,
}

impl TaskTracker {
    pub fn new(
        task_table: impl Translate + 'static,
        resource_table: impl Translate + 'static,
    ) -> Self {
        Self {
            tasks: Poller::new(task_table),
            resources: Arc::new(resource_table),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.tasks = self.tasks.with_cancellation(token);
        self
    }

    /// Wait for `task` to finish, then confirm `resource_id` is in `expected`.
    ///
    /// `spec` bounds the task poll; its acceptable set is replaced with the
    /// task-success state. `resource_fetch` must read `resource_id`.
    /// Returns the resource snapshot, or `None` when `expected` is `Deleted`
    /// and the resource is gone.
    pub async fn track_operation<TF, TFut, RF, RFut>(
        &self,
        task: &Task,
        resource_id: &ResourceId,
        expected: LifecycleState,
        spec: &AwaitSpec,
        mut task_fetch: TF,
        mut resource_fetch: RF,
    ) -> Result<Option<ResourceSnapshot>>
    where
        TF: FnMut() -> TFut + Send,
        TFut: Future<Output = Result<Task>> + Send,
        RF: FnMut() -> RFut + Send,
        RFut: Future<Output = Result<Fetched<ResourceSnapshot>>> + Send,
    {
        let finished = self.wait_for_task(task, spec, &mut task_fetch).await?;
        tracing::debug!(
            task = %finished.id,
            resource = %resource_id,
            operation = %task.operation,
            "Task finished, checking resource"
        );

        let (actual, snapshot) = match resource_fetch().await? {
            Fetched::Found(snapshot) => {
                (self.resources.translate(&snapshot.status), Some(snapshot))
            }
            Fetched::NotFound => (LifecycleState::Deleted, None),
        };

        if actual == expected {
            return Ok(snapshot);
        }

        tracing::warn!(
            resource = %resource_id,
            operation = %task.operation,
            %actual,
            %expected,
            "Task completed but resource is not in the expected state"
        );
        Err(ConvergeError::UnexpectedState {
            resource: resource_id.to_string(),
            actual,
            expected,
            operation: task.operation.clone(),
        })
    }

    /// [`track_operation`](Self::track_operation) through accessors.
    pub async fn track<TA, RA>(
        &self,
        tasks: &TA,
        resources: &RA,
        task: &Task,
        expected: LifecycleState,
        spec: &AwaitSpec,
    ) -> Result<Option<ResourceSnapshot>>
    where
        TA: TaskAccessor + ?Sized,
        RA: ResourceAccessor + ?Sized,
    {
        self.track_operation(
            task,
            &task.target,
            expected,
            spec,
            move || tasks.fetch_task(&task.id),
            move || resources.fetch_resource(&task.target),
        )
        .await
    }

    /// Block on the most recent unfinished task in `tasks` (oldest first).
    ///
    /// Used before submitting a new mutation to a resource that may still
    /// be busy. Returns the finished task, or `None` when nothing was in
    /// flight.
    pub async fn settle_in_flight<A>(
        &self,
        accessor: &A,
        tasks: &[Task],
        spec: &AwaitSpec,
    ) -> Result<Option<Task>>
    where
        A: TaskAccessor + ?Sized,
    {
        let Some(running) = tasks
            .iter()
            .rev()
            .find(|t| !self.tasks.translate(*t).is_settled())
        else {
            return Ok(None);
        };

        tracing::info!(
            task = %running.id,
            operation = %running.operation,
            "Waiting for in-flight task"
        );
        let mut fetch = move || accessor.fetch_task(&running.id);
        self.wait_for_task(running, spec, &mut fetch).await.map(Some)
    }

    async fn wait_for_task<F, Fut>(
        &self,
        task: &Task,
        spec: &AwaitSpec,
        fetch: &mut F,
    ) -> Result<Task>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<Task>> + Send,
    {
        let spec = AwaitSpec {
            accept: vec![LifecycleState::Active],
            absence_is_success: false,
            ..spec.clone()
        };

        let outcome = self
            .tasks
            .wait_for(
                || {
                    let fut = fetch();
                    async move { fut.await.map(Fetched::Found) }
                },
                &spec,
            )
            .await?;

        match outcome {
            ConvergenceOutcome::Converged(Some(finished)) => Ok(finished),
            ConvergenceOutcome::Converged(None) => {
                Err(operation_failed(task, "not found".to_string()))
            }
            ConvergenceOutcome::Failed { snapshot, .. } => {
                Err(operation_failed(task, describe_task(&snapshot)))
            }
            ConvergenceOutcome::TimedOut { last, attempts, .. } => {
                let status = describe_task(last.as_ref().unwrap_or(task));
                Err(operation_failed(
                    task,
                    format!("{} (timed out after {} attempts)", status, attempts),
                ))
            }
        }
    }
}

impl std::fmt::Debug for TaskTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskTracker")
            .field("tasks", &self.tasks)
            .finish_non_exhaustive()
    }
}

fn describe_task(task: &Task) -> String {
    match &task.error {
        Some(error) => format!("{}: {}", task.status, error),
        None => task.status.to_string(),
    }
}

fn operation_failed(task: &Task, last_status: String) -> ConvergeError {
    tracing::warn!(
        task = %task.id,
        operation = %task.operation,
        %last_status,
        "Operation failed"
    );
    ConvergeError::OperationFailed {
        operation: task.operation.clone(),
        task: task.id.to_string(),
        last_status,
    }
}
