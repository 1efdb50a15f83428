#![forbid(unsafe_code)]

//! Host boundary: the history port, the deferred-correction scheduler, and
//! deterministic in-memory implementations of both.
//!
//! The controller only ever writes to the history. It never asks for the
//! depth or contents of the stack, so sibling writers (the user's own back
//! gesture, a router transition) can interleave freely with its corrections.

use core::time::Duration;
use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::path::TrapPath;

/// Host operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortOp {
    Replace,
    Push,
    StepForward,
    Schedule,
}

impl PortOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Push => "push",
            Self::StepForward => "step_forward",
            Self::Schedule => "schedule",
        }
    }
}

/// A host refused or failed a navigation call.
///
/// The lock treats these as degraded defence, never as fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} failed: {detail}", .op.as_str())]
pub struct PortError {
    pub op: PortOp,
    pub detail: String,
}

impl PortError {
    pub fn new(op: PortOp, detail: impl Into<String>) -> Self {
        Self {
            op,
            detail: detail.into(),
        }
    }
}

/// Write-only view of the host navigation history.
pub trait HistoryPort {
    /// Overwrite the active entry without growing the stack.
    fn replace_current_entry(&mut self, location: &TrapPath) -> Result<(), PortError>;

    /// Append an entry after the active one and make it active.
    fn push_entry(&mut self, location: &TrapPath) -> Result<(), PortError>;

    /// Move one entry forward if one exists.
    fn step_forward(&mut self) -> Result<(), PortError>;
}

impl<T: HistoryPort + ?Sized> HistoryPort for &mut T {
    fn replace_current_entry(&mut self, location: &TrapPath) -> Result<(), PortError> {
        (**self).replace_current_entry(location)
    }

    fn push_entry(&mut self, location: &TrapPath) -> Result<(), PortError> {
        (**self).push_entry(location)
    }

    fn step_forward(&mut self) -> Result<(), PortError> {
        (**self).step_forward()
    }
}

impl<T: HistoryPort + ?Sized> HistoryPort for Rc<RefCell<T>> {
    fn replace_current_entry(&mut self, location: &TrapPath) -> Result<(), PortError> {
        self.borrow_mut().replace_current_entry(location)
    }

    fn push_entry(&mut self, location: &TrapPath) -> Result<(), PortError> {
        self.borrow_mut().push_entry(location)
    }

    fn step_forward(&mut self) -> Result<(), PortError> {
        self.borrow_mut().step_forward()
    }
}

/// Correction run after the current event turn completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredCorrection {
    StepForward,
}

impl DeferredCorrection {
    /// Run the correction against a history handle.
    pub fn apply<H: HistoryPort + ?Sized>(self, history: &mut H) -> Result<(), PortError> {
        match self {
            Self::StepForward => history.step_forward(),
        }
    }
}

/// One-shot timer facility for deferred corrections.
///
/// Once scheduled, a correction belongs to the scheduler: it is never
/// cancelled and may fire after the lock session that requested it has ended.
/// It only touches the history port, never controller memory.
pub trait DeferredScheduler {
    fn schedule(&mut self, delay: Duration, correction: DeferredCorrection)
    -> Result<(), PortError>;
}

impl<T: DeferredScheduler + ?Sized> DeferredScheduler for &mut T {
    fn schedule(
        &mut self,
        delay: Duration,
        correction: DeferredCorrection,
    ) -> Result<(), PortError> {
        (**self).schedule(delay, correction)
    }
}

impl<T: DeferredScheduler + ?Sized> DeferredScheduler for Rc<RefCell<T>> {
    fn schedule(
        &mut self,
        delay: Duration,
        correction: DeferredCorrection,
    ) -> Result<(), PortError> {
        self.borrow_mut().schedule(delay, correction)
    }
}

/// Mutation recorded by [`SimulatedHistory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryOp {
    Replace(String),
    Push(String),
    StepForward,
}

/// In-memory browser-like history stack.
///
/// Behaves like a session history: pushing truncates any forward entries,
/// `step_forward` is a no-op at the end of the stack, and [`Self::user_back`]
/// models a real back gesture that the controller did not initiate. Every
/// port call is recorded in [`Self::ops`].
#[derive(Debug, Clone)]
pub struct SimulatedHistory {
    entries: Vec<String>,
    index: usize,
    ops: Vec<HistoryOp>,
    declining: bool,
}

impl SimulatedHistory {
    /// Start with a single entry at `origin`, the page the user came from.
    #[must_use]
    pub fn new(origin: &str) -> Self {
        Self {
            entries: vec![origin.to_owned()],
            index: 0,
            ops: Vec::new(),
            declining: false,
        }
    }

    /// Active location.
    #[must_use]
    pub fn active(&self) -> &str {
        &self.entries[self.index]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of the active entry.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Port calls received so far, including declined ones.
    #[must_use]
    pub fn ops(&self) -> &[HistoryOp] {
        &self.ops
    }

    /// Drain the recorded port calls.
    pub fn take_ops(&mut self) -> Vec<HistoryOp> {
        std::mem::take(&mut self.ops)
    }

    /// Entries at or below the active position equal to `location`.
    #[must_use]
    pub fn entries_behind_matching(&self, location: &str) -> usize {
        self.entries[..=self.index]
            .iter()
            .filter(|entry| entry.as_str() == location)
            .count()
    }

    /// Make every subsequent port call fail, as a hostile host would.
    pub fn set_declining(&mut self, declining: bool) {
        self.declining = declining;
    }

    /// A back gesture performed by the user. Returns `false` at the start of
    /// the stack.
    pub fn user_back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    /// A navigation performed by sibling code (a router transition).
    pub fn external_push(&mut self, location: &str) {
        self.entries.truncate(self.index + 1);
        self.entries.push(location.to_owned());
        self.index = self.entries.len() - 1;
    }

    fn check(&self, op: PortOp) -> Result<(), PortError> {
        if self.declining {
            Err(PortError::new(op, "history declined the call"))
        } else {
            Ok(())
        }
    }
}

impl HistoryPort for SimulatedHistory {
    fn replace_current_entry(&mut self, location: &TrapPath) -> Result<(), PortError> {
        self.ops.push(HistoryOp::Replace(location.as_str().to_owned()));
        self.check(PortOp::Replace)?;
        self.entries[self.index] = location.as_str().to_owned();
        Ok(())
    }

    fn push_entry(&mut self, location: &TrapPath) -> Result<(), PortError> {
        self.ops.push(HistoryOp::Push(location.as_str().to_owned()));
        self.check(PortOp::Push)?;
        self.external_push(location.as_str());
        Ok(())
    }

    fn step_forward(&mut self) -> Result<(), PortError> {
        self.ops.push(HistoryOp::StepForward);
        self.check(PortOp::StepForward)?;
        if self.index + 1 < self.entries.len() {
            self.index += 1;
        }
        Ok(())
    }
}

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingCorrection {
    id: u64,
    due: Duration,
    correction: DeferredCorrection,
}

/// Scheduler driven by an explicit clock.
///
/// Nothing fires during `schedule`; corrections run only from
/// [`Self::advance`], after the event turn that scheduled them.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    clock: DeterministicClock,
    pending: Vec<PendingCorrection>,
    next_id: u64,
    fired: u64,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Corrections scheduled but not yet run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Corrections run so far.
    #[must_use]
    pub const fn fired(&self) -> u64 {
        self.fired
    }

    /// Advance time by `dt` and run every correction now due, in due-time
    /// then scheduling order. Returns how many ran. Port failures are
    /// swallowed: a late correction has nobody left to report to.
    pub fn advance<H: HistoryPort + ?Sized>(&mut self, dt: Duration, history: &mut H) -> usize {
        self.clock.advance(dt);
        let now = self.clock.now();
        let mut due: Vec<PendingCorrection> = Vec::new();
        self.pending.retain(|pending| {
            if pending.due <= now {
                due.push(*pending);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|pending| (pending.due, pending.id));
        for pending in &due {
            if let Err(error) = pending.correction.apply(history) {
                tracing::warn!(
                    target: "navlock::scheduler",
                    correction_id = pending.id,
                    %error,
                    "deferred correction failed"
                );
            }
        }
        self.fired = self.fired.saturating_add(due.len() as u64);
        due.len()
    }
}

impl DeferredScheduler for ManualScheduler {
    fn schedule(
        &mut self,
        delay: Duration,
        correction: DeferredCorrection,
    ) -> Result<(), PortError> {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        self.pending.push(PendingCorrection {
            id,
            due: self.clock.now().saturating_add(delay),
            correction,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn trap() -> TrapPath {
        TrapPath::new("timeout").expect("valid trap path")
    }

    #[test]
    fn push_truncates_forward_entries() {
        let mut history = SimulatedHistory::new("form");
        history.push_entry(&trap()).unwrap();
        history.push_entry(&trap()).unwrap();
        assert!(history.user_back());
        history.external_push("elsewhere");
        assert_eq!(history.entries(), ["form", "timeout", "elsewhere"]);
        assert_eq!(history.active(), "elsewhere");
    }

    #[test]
    fn replace_keeps_depth() {
        let mut history = SimulatedHistory::new("form");
        history.replace_current_entry(&trap()).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.active(), "timeout");
        assert_eq!(history.ops(), [HistoryOp::Replace("timeout".into())]);
    }

    #[test]
    fn step_forward_at_end_is_noop() {
        let mut history = SimulatedHistory::new("form");
        history.step_forward().unwrap();
        assert_eq!(history.index(), 0);
        assert_eq!(history.ops(), [HistoryOp::StepForward]);
    }

    #[test]
    fn user_back_stops_at_origin() {
        let mut history = SimulatedHistory::new("form");
        assert!(!history.user_back());
        history.push_entry(&trap()).unwrap();
        assert!(history.user_back());
        assert_eq!(history.active(), "form");
    }

    #[test]
    fn declining_history_records_but_does_not_mutate() {
        let mut history = SimulatedHistory::new("form");
        history.set_declining(true);
        let err = history.push_entry(&trap()).unwrap_err();
        assert_eq!(err.op, PortOp::Push);
        assert_eq!(err.to_string(), "push failed: history declined the call");
        assert_eq!(history.len(), 1);
        assert_eq!(history.ops().len(), 1);
    }

    #[test]
    fn manual_scheduler_fires_only_when_due() {
        let mut history = SimulatedHistory::new("form");
        history.push_entry(&trap()).unwrap();
        history.user_back();

        let mut scheduler = ManualScheduler::new();
        scheduler
            .schedule(Duration::from_millis(10), DeferredCorrection::StepForward)
            .unwrap();
        assert_eq!(scheduler.pending(), 1);

        assert_eq!(scheduler.advance(Duration::from_millis(9), &mut history), 0);
        assert_eq!(history.active(), "form");

        assert_eq!(scheduler.advance(Duration::from_millis(1), &mut history), 1);
        assert_eq!(history.active(), "timeout");
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.fired(), 1);

        // Fired corrections never run twice.
        assert_eq!(scheduler.advance(Duration::from_secs(1), &mut history), 0);
    }

    #[test]
    fn zero_delay_still_waits_for_advance() {
        let mut history = SimulatedHistory::new("form");
        let mut scheduler = ManualScheduler::new();
        scheduler
            .schedule(Duration::ZERO, DeferredCorrection::StepForward)
            .unwrap();
        assert!(history.ops().is_empty());
        assert_eq!(scheduler.advance(Duration::ZERO, &mut history), 1);
        assert_eq!(history.ops(), [HistoryOp::StepForward]);
    }

    #[test]
    fn shared_handles_forward_to_inner_port() {
        let history = Rc::new(RefCell::new(SimulatedHistory::new("form")));
        let mut handle = Rc::clone(&history);
        handle.push_entry(&trap()).unwrap();
        assert_eq!(history.borrow().active(), "timeout");
    }

    #[test]
    fn clock_saturates() {
        let mut clock = DeterministicClock::new();
        clock.advance(Duration::MAX);
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.now(), Duration::MAX);
    }
}
