//! Bounded poller
//!
//! Repeatedly fetches a resource (or task) at a fixed interval until a
//! predicate accepts it, a fatal state shows up, or the budget in the
//! [`AwaitSpec`] runs out. Fetches within one call are strictly sequential;
//! the fetch and the sleep both race the poller's cancellation token.

use crate::accessor::{Fetched, ResourceAccessor};
use crate::await_spec::AwaitSpec;
use crate::error::{ConvergeError, Result};
use crate::lifecycle::LifecycleState;
use crate::predicate::{ConvergencePredicate, LifecyclePredicate, Verdict};
use crate::snapshot::{Observed, ResourceId, ResourceKind, ResourceSnapshot};
use crate::status::{StatusRegistry, Translate};
use futures_util::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

/// How a bounded wait ended
#[derive(Debug, Clone)]
pub enum ConvergenceOutcome<T> {
    /// Accepted. `None` when absence counted as success.
    Converged(Option<T>),

    /// Budget exhausted. `last` is `None` when the final fetch found nothing.
    TimedOut {
        last: Option<T>,
        last_state: Option<LifecycleState>,
        attempts: u32,
        elapsed: Duration,
    },

    /// A fatal state was observed; polling stopped early
    Failed { state: LifecycleState, snapshot: T },
}

impl<T: Observed> ConvergenceOutcome<T> {
    pub fn is_converged(&self) -> bool {
        matches!(self, ConvergenceOutcome::Converged(_))
    }

    /// Turn `TimedOut` and `Failed` into typed errors.
    pub fn into_result(self, resource: &str) -> Result<Option<T>> {
        match self {
            ConvergenceOutcome::Converged(value) => Ok(value),
            ConvergenceOutcome::TimedOut {
                last_state,
                attempts,
                elapsed,
                ..
            } => Err(ConvergeError::Timeout {
                resource: resource.to_string(),
                last_state,
                elapsed,
                attempts,
            }),
            ConvergenceOutcome::Failed { state, snapshot } => Err(ConvergeError::FatalState {
                resource: resource.to_string(),
                state,
                native: match snapshot.failure() {
                    Some(detail) => format!("{} ({})", snapshot.native_status(), detail),
                    None => snapshot.native_status().to_string(),
                },
            }),
        }
    }
}

/// Polls through one status translator
#[derive(Clone)]
pub struct Poller {
    translator: Arc<dyn Translate>,
    cancel: CancellationToken,
}

impl Poller {
    /// Use `translator` (usually a `&'static StatusTable`) for every fetch.
    pub fn new(translator: impl Translate + 'static) -> Self {
        Self {
            translator: Arc::new(translator),
            cancel: CancellationToken::new(),
        }
    }

    /// Poller for a built-in table, if one is registered for the pair
    pub fn for_kind(provider: &str, kind: ResourceKind) -> Option<Self> {
        StatusRegistry::builtin().table(provider, kind).map(Self::new)
    }

    /// Share an external cancellation token; cancelling it aborts every
    /// wait running on this poller (and its clones).
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn translate(&self, observed: &impl Observed) -> LifecycleState {
        self.translator.translate(observed.native_status())
    }

    /// Wait until the observation reaches one of `spec.accept`.
    pub async fn wait_for<T, F, Fut>(
        &self,
        fetch: F,
        spec: &AwaitSpec,
    ) -> Result<ConvergenceOutcome<T>>
    where
        T: Observed,
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<Fetched<T>>> + Send,
    {
        self.wait_with(fetch, spec, &LifecyclePredicate).await
    }

    /// Wait until the resource is deleted or no longer found.
    ///
    /// Only the budget and interval of `spec` are used.
    pub async fn wait_for_deleted<T, F, Fut>(
        &self,
        fetch: F,
        spec: &AwaitSpec,
    ) -> Result<ConvergenceOutcome<T>>
    where
        T: Observed,
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<Fetched<T>>> + Send,
    {
        let spec = AwaitSpec {
            accept: vec![LifecycleState::Deleted],
            absence_is_success: true,
            ..spec.clone()
        };
        self.wait_with(fetch, &spec, &LifecyclePredicate).await
    }

    /// Wait for a resource through its accessor.
    pub async fn wait_for_resource<A>(
        &self,
        accessor: &A,
        id: &ResourceId,
        spec: &AwaitSpec,
    ) -> Result<ConvergenceOutcome<ResourceSnapshot>>
    where
        A: ResourceAccessor + ?Sized,
    {
        self.wait_for(move || accessor.fetch_resource(id), spec).await
    }

    /// Wait for several resources concurrently with the same spec.
    ///
    /// Each resource gets its own sequential poll loop; results come back
    /// in the order of `ids`.
    pub async fn wait_for_all<A>(
        &self,
        accessor: &A,
        ids: &[ResourceId],
        spec: &AwaitSpec,
    ) -> Vec<Result<ConvergenceOutcome<ResourceSnapshot>>>
    where
        A: ResourceAccessor + ?Sized,
    {
        join_all(ids.iter().map(|id| self.wait_for_resource(accessor, id, spec))).await
    }

    /// Poll until `predicate` decides.
    ///
    /// Transport errors from `fetch` are returned as-is without retrying.
    pub async fn wait_with<T, F, Fut, P>(
        &self,
        mut fetch: F,
        spec: &AwaitSpec,
        predicate: &P,
    ) -> Result<ConvergenceOutcome<T>>
    where
        T: Observed,
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<Fetched<T>>> + Send,
        P: ConvergencePredicate<T> + ?Sized,
    {
        spec.validate()?;

        let start = Instant::now();
        let mut attempts: u32 = 0;
        let mut last: Option<T> = None;
        let mut last_state: Option<LifecycleState>;

        loop {
            let fetched = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(cancelled(&last)),
                fetched = fetch() => fetched?,
            };
            attempts += 1;

            match fetched {
                Fetched::NotFound if spec.absence_is_success => {
                    tracing::info!(attempts, "Resource no longer exists");
                    return Ok(ConvergenceOutcome::Converged(None));
                }
                Fetched::NotFound => {
                    tracing::debug!(attempts, "Resource not visible yet");
                    last = None;
                    last_state = None;
                }
                Fetched::Found(observed) => {
                    let state = self.translator.translate(observed.native_status());
                    match predicate.evaluate(state, &observed, spec) {
                        Verdict::Accept => {
                            tracing::info!(
                                subject = observed.subject(),
                                %state,
                                attempts,
                                "Converged"
                            );
                            return Ok(ConvergenceOutcome::Converged(Some(observed)));
                        }
                        Verdict::RejectFatal => {
                            // a provider failure detail outranks the status it came with
                            let state = if observed.failure().is_some() {
                                LifecycleState::Error
                            } else {
                                state
                            };
                            tracing::warn!(
                                subject = observed.subject(),
                                %state,
                                native = %observed.native_status(),
                                "Fatal state observed"
                            );
                            return Ok(ConvergenceOutcome::Failed {
                                state,
                                snapshot: observed,
                            });
                        }
                        Verdict::RejectRetry => {
                            tracing::debug!(
                                subject = observed.subject(),
                                %state,
                                native = %observed.native_status(),
                                attempts,
                                "Not converged yet"
                            );
                            last = Some(observed);
                            last_state = Some(state);
                        }
                    }
                }
            }

            let elapsed = start.elapsed();
            if spec.is_exhausted(attempts, elapsed) {
                tracing::warn!(
                    subject = last.as_ref().map(|o| o.subject()).unwrap_or("<not found>"),
                    attempts,
                    ?elapsed,
                    "Gave up waiting"
                );
                return Ok(ConvergenceOutcome::TimedOut {
                    last,
                    last_state,
                    attempts,
                    elapsed,
                });
            }

            let delay = spec.next_delay(elapsed);
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(cancelled(&last)),
                _ = sleep(delay) => {}
            }
        }
    }
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

fn cancelled<T: Observed>(last: &Option<T>) -> ConvergeError {
    ConvergeError::Cancelled {
        resource: last
            .as_ref()
            .map(|o| o.subject().to_string())
            .unwrap_or_else(|| "<not found>".to_string()),
    }
}
