#![forbid(unsafe_code)]

//! Navigation-lock controller: runs [`NavLockMachine`] transitions against
//! injected host ports.
//!
//! One controller is one lock session. The host calls [`activate`] on mount
//! (before first paint), forwards reinforcement signals while mounted, and
//! calls [`deactivate`] on unmount. All stack corrections for a signal are
//! issued before the handler returns; the forward-step fallback is handed to
//! the scheduler and runs on a later turn.
//!
//! [`activate`]: NavigationLockController::activate
//! [`deactivate`]: NavigationLockController::deactivate

use tracing::{debug, trace, warn};

use crate::NavLockError;
use crate::config::NavLockConfig;
use crate::machine::{
    LockEffect, LockOutcome, LockPhase, LockSignal, LockState, LockTransition, NavLockMachine,
};
use crate::page::TerminalPage;
use crate::path::TrapPath;
use crate::port::{DeferredCorrection, DeferredScheduler, HistoryPort, PortError};

/// Structured log record for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockLogEntry {
    pub phase: LockPhase,
    /// Assigned only to applied transitions.
    pub sequence: Option<u64>,
    pub replaced: bool,
    pub pushed: u32,
    pub scheduled_forward: bool,
    pub suppress_default: bool,
    /// Port calls the host refused during this dispatch.
    pub port_failures: u32,
    pub outcome: LockOutcome,
}

/// Result of one controller dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockDispatch {
    pub transition: LockTransition,
    /// The host should cancel default handling of the triggering event
    /// (`preventDefault`) where it can.
    pub suppress_default: bool,
    pub log: LockLogEntry,
}

/// Session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockStats {
    pub back_attempts: u64,
    pub repins: u64,
    pub edge_touches: u64,
    pub entries_replaced: u64,
    pub entries_pushed: u64,
    pub forward_steps_scheduled: u64,
    pub ignored_signals: u64,
    pub port_failures: u64,
}

/// Keeps one trap path sticky against backward navigation.
#[derive(Debug)]
pub struct NavigationLockController<H, S> {
    trap: TrapPath,
    machine: NavLockMachine,
    history: H,
    scheduler: S,
    next_sequence: u64,
    stats: LockStats,
}

impl<H: HistoryPort, S: DeferredScheduler> NavigationLockController<H, S> {
    /// Build an idle controller. Fails only on an invalid config.
    pub fn new(
        trap: TrapPath,
        config: NavLockConfig,
        history: H,
        scheduler: S,
    ) -> Result<Self, NavLockError> {
        config.validate()?;
        Ok(Self {
            trap,
            machine: NavLockMachine::new(config),
            history,
            scheduler,
            next_sequence: 1,
            stats: LockStats::default(),
        })
    }

    /// Build an idle controller for one of the terminal pages.
    pub fn for_page(
        page: TerminalPage,
        config: NavLockConfig,
        history: H,
        scheduler: S,
    ) -> Result<Self, NavLockError> {
        Self::new(page.trap_path()?, config, history, scheduler)
    }

    #[must_use]
    pub const fn trap_path(&self) -> &TrapPath {
        &self.trap
    }

    #[must_use]
    pub const fn state(&self) -> LockState {
        self.machine.state()
    }

    #[must_use]
    pub const fn config(&self) -> &NavLockConfig {
        self.machine.config()
    }

    #[must_use]
    pub const fn stats(&self) -> LockStats {
        self.stats
    }

    #[must_use]
    pub const fn history(&self) -> &H {
        &self.history
    }

    #[must_use]
    pub const fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Mount: replace the current entry with the trap path and pad the stack.
    pub fn activate(&mut self) -> LockDispatch {
        self.dispatch(LockSignal::Activate)
    }

    /// The host observed a backward traversal.
    pub fn back_navigation_attempt(&mut self) -> LockDispatch {
        self.dispatch(LockSignal::BackNavigationAttempt)
    }

    pub fn visibility_hidden(&mut self) -> LockDispatch {
        self.dispatch(LockSignal::VisibilityHidden)
    }

    pub fn visibility_restored(&mut self) -> LockDispatch {
        self.dispatch(LockSignal::VisibilityRestored)
    }

    pub fn focus_regained(&mut self) -> LockDispatch {
        self.dispatch(LockSignal::FocusRegained)
    }

    /// A touch gesture began; `primary_x` is the first contact's horizontal
    /// coordinate, `None` when the event had no contacts.
    pub fn pointer_down(&mut self, primary_x: Option<f64>) -> LockDispatch {
        self.dispatch(LockSignal::PointerDown { primary_x })
    }

    /// Unmount. Later signals are ignored; corrections already handed to the
    /// scheduler still run.
    pub fn deactivate(&mut self) -> LockDispatch {
        self.dispatch(LockSignal::Deactivate)
    }

    /// Feed any signal through the machine and perform its effects.
    pub fn dispatch(&mut self, signal: LockSignal) -> LockDispatch {
        let transition = self.machine.apply(signal);
        let phase = transition.phase;

        if let LockOutcome::Ignored(reason) = transition.outcome {
            self.stats.ignored_signals = self.stats.ignored_signals.saturating_add(1);
            trace!(
                target: "navlock::controller",
                trap = %self.trap,
                phase = phase.as_str(),
                reason = reason.as_str(),
                "lock signal ignored"
            );
            return LockDispatch {
                suppress_default: false,
                log: LockLogEntry {
                    phase,
                    sequence: None,
                    replaced: false,
                    pushed: 0,
                    scheduled_forward: false,
                    suppress_default: false,
                    port_failures: 0,
                    outcome: transition.outcome,
                },
                transition,
            };
        }

        let sequence = self.next_sequence();
        let mut log = LockLogEntry {
            phase,
            sequence: Some(sequence),
            replaced: false,
            pushed: 0,
            scheduled_forward: false,
            suppress_default: false,
            port_failures: 0,
            outcome: transition.outcome,
        };
        for effect in &transition.effects {
            let result = match *effect {
                LockEffect::ReplaceCurrent => self
                    .history
                    .replace_current_entry(&self.trap)
                    .map(|()| log.replaced = true),
                LockEffect::PushEntry => self
                    .history
                    .push_entry(&self.trap)
                    .map(|()| log.pushed = log.pushed.saturating_add(1)),
                LockEffect::SuppressDefault => {
                    log.suppress_default = true;
                    Ok(())
                }
                LockEffect::ScheduleStepForward { delay } => self
                    .scheduler
                    .schedule(delay, DeferredCorrection::StepForward)
                    .map(|()| log.scheduled_forward = true),
            };
            // Keep going: later corrections are independent of earlier ones.
            if let Err(error) = result {
                log.port_failures = log.port_failures.saturating_add(1);
                self.report_port_failure(phase, &error);
            }
        }
        self.record(&log);

        match phase {
            LockPhase::Activate => debug!(
                target: "navlock::controller",
                trap = %self.trap,
                sequence,
                pad_depth = log.pushed,
                "lock session activated"
            ),
            LockPhase::Deactivate => debug!(
                target: "navlock::controller",
                trap = %self.trap,
                sequence,
                back_attempts = self.stats.back_attempts,
                entries_pushed = self.stats.entries_pushed,
                "lock session released"
            ),
            _ => debug!(
                target: "navlock::controller",
                trap = %self.trap,
                sequence,
                phase = phase.as_str(),
                pushed = log.pushed,
                scheduled_forward = log.scheduled_forward,
                "lock reinforced"
            ),
        }

        LockDispatch {
            suppress_default: log.suppress_default,
            log,
            transition,
        }
    }

    /// Tear down the controller and hand back its ports.
    pub fn into_parts(self) -> (H, S) {
        (self.history, self.scheduler)
    }

    fn record(&mut self, log: &LockLogEntry) {
        let stats = &mut self.stats;
        match log.phase {
            LockPhase::BackNavigationAttempt => {
                stats.back_attempts = stats.back_attempts.saturating_add(1);
            }
            LockPhase::VisibilityRestored | LockPhase::FocusRegained => {
                stats.repins = stats.repins.saturating_add(1);
            }
            LockPhase::PointerDown => {
                stats.edge_touches = stats.edge_touches.saturating_add(1);
            }
            LockPhase::Activate | LockPhase::VisibilityHidden | LockPhase::Deactivate => {}
        }
        stats.entries_replaced = stats.entries_replaced.saturating_add(u64::from(log.replaced));
        stats.entries_pushed = stats.entries_pushed.saturating_add(u64::from(log.pushed));
        stats.forward_steps_scheduled = stats
            .forward_steps_scheduled
            .saturating_add(u64::from(log.scheduled_forward));
        stats.port_failures = stats
            .port_failures
            .saturating_add(u64::from(log.port_failures));
    }

    fn report_port_failure(&self, phase: LockPhase, error: &PortError) {
        warn!(
            target: "navlock::controller",
            trap = %self.trap,
            phase = phase.as_str(),
            op = error.op.as_str(),
            detail = %error.detail,
            "host refused lock correction"
        );
    }

    fn next_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);
        sequence
    }
}
