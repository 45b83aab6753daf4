//! Convergence predicates
//!
//! A predicate decides, for one observation, whether polling is done
//! (`Accept`), hopeless (`RejectFatal`) or should go on (`RejectRetry`).

use crate::await_spec::AwaitSpec;
use crate::lifecycle::LifecycleState;
use crate::snapshot::Observed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    RejectFatal,
    RejectRetry,
}

pub trait ConvergencePredicate<T: Observed>: Send + Sync {
    fn evaluate(&self, state: LifecycleState, observed: &T, spec: &AwaitSpec) -> Verdict;
}

/// Default predicate: compare the translated state against the `AwaitSpec`
///
/// An observation carrying a provider failure detail is fatal whatever its
/// status says.
#[derive(Debug, Clone, Copy, Default)]
pub struct LifecyclePredicate;

impl LifecyclePredicate {
    /// Accept only when the lifecycle check passes *and* `condition` holds,
    /// e.g. "active and has a virtual IP".
    pub fn and_require<T, F>(self, condition: F) -> Require<F>
    where
        T: Observed,
        F: Fn(&T) -> bool + Send + Sync,
    {
        Require { condition }
    }
}

impl<T: Observed> ConvergencePredicate<T> for LifecyclePredicate {
    fn evaluate(&self, state: LifecycleState, observed: &T, spec: &AwaitSpec) -> Verdict {
        if observed.failure().is_some() {
            Verdict::RejectFatal
        } else if spec.is_acceptable(state) {
            Verdict::Accept
        } else if spec.is_fatal(state) {
            Verdict::RejectFatal
        } else {
            Verdict::RejectRetry
        }
    }
}

/// See [`LifecyclePredicate::and_require`]
#[derive(Debug, Clone)]
pub struct Require<F> {
    condition: F,
}

impl<T, F> ConvergencePredicate<T> for Require<F>
where
    T: Observed,
    F: Fn(&T) -> bool + Send + Sync,
{
    fn evaluate(&self, state: LifecycleState, observed: &T, spec: &AwaitSpec) -> Verdict {
        match LifecyclePredicate.evaluate(state, observed, spec) {
            Verdict::Accept if !(self.condition)(observed) => Verdict::RejectRetry,
            verdict => verdict,
        }
    }
}

/// Predicate backed by a closure
#[derive(Debug, Clone)]
pub struct FnPredicate<F> {
    f: F,
}

pub fn predicate_fn<T, F>(f: F) -> FnPredicate<F>
where
    T: Observed,
    F: Fn(LifecycleState, &T, &AwaitSpec) -> Verdict + Send + Sync,
{
    FnPredicate { f }
}

impl<T, F> ConvergencePredicate<T> for FnPredicate<F>
where
    T: Observed,
    F: Fn(LifecycleState, &T, &AwaitSpec) -> Verdict + Send + Sync,
{
    fn evaluate(&self, state: LifecycleState, observed: &T, spec: &AwaitSpec) -> Verdict {
        (self.f)(state, observed, spec)
    }
}
