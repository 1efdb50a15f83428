#![forbid(unsafe_code)]

//! Pure navigation-lock state machine.
//!
//! The machine never touches the host. Each [`LockSignal`] produces a
//! [`LockTransition`] listing the side effects the caller must perform, in
//! order. While `Locked`, every reinforcement is a self-transition whose
//! effects are additive: re-applying one only pushes more identical trap
//! entries, so overlapping or re-entrant signals need no deduplication.
//!
//! ```text
//!   Idle ──Activate──▶ Locked ──Deactivate──▶ Released
//!                      │    ▲
//!                      └────┘ BackNavigationAttempt | VisibilityRestored
//!                             | FocusRegained | PointerDown(edge)
//! ```

use core::time::Duration;

use crate::config::NavLockConfig;

/// Lifecycle state of one lock session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// Constructed, not yet mounted.
    Idle,
    /// Mounted; the trap path is being defended.
    Locked,
    /// Unmounted. Terminal.
    Released,
}

impl LockState {
    #[must_use]
    pub const fn is_locked(self) -> bool {
        matches!(self, Self::Locked)
    }
}

/// Host-delivered input to the machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LockSignal {
    /// Page mount, before first paint.
    Activate,
    /// The host reports a backward traversal of the active entry.
    BackNavigationAttempt,
    /// The page went to the background.
    VisibilityHidden,
    /// The page became visible again.
    VisibilityRestored,
    FocusRegained,
    /// A touch/pointer gesture began. `primary_x` is the horizontal
    /// coordinate of the first contact, `None` when the event carried no
    /// contact points.
    PointerDown { primary_x: Option<f64> },
    /// Page unmount.
    Deactivate,
}

impl LockSignal {
    #[must_use]
    pub const fn phase(self) -> LockPhase {
        match self {
            Self::Activate => LockPhase::Activate,
            Self::BackNavigationAttempt => LockPhase::BackNavigationAttempt,
            Self::VisibilityHidden => LockPhase::VisibilityHidden,
            Self::VisibilityRestored => LockPhase::VisibilityRestored,
            Self::FocusRegained => LockPhase::FocusRegained,
            Self::PointerDown { .. } => LockPhase::PointerDown,
            Self::Deactivate => LockPhase::Deactivate,
        }
    }
}

/// Data-free signal kind, used in logs and counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockPhase {
    Activate,
    BackNavigationAttempt,
    VisibilityHidden,
    VisibilityRestored,
    FocusRegained,
    PointerDown,
    Deactivate,
}

impl LockPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::BackNavigationAttempt => "back_navigation_attempt",
            Self::VisibilityHidden => "visibility_hidden",
            Self::VisibilityRestored => "visibility_restored",
            Self::FocusRegained => "focus_regained",
            Self::PointerDown => "pointer_down",
            Self::Deactivate => "deactivate",
        }
    }
}

/// One side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockEffect {
    /// Overwrite the active history entry with the trap path.
    ReplaceCurrent,
    /// Append one trap path entry.
    PushEntry,
    /// Ask the host to cancel its default handling of the triggering event.
    SuppressDefault,
    /// Arrange for one forward step after `delay`. Not cancellable.
    ScheduleStepForward { delay: Duration },
}

/// Why a signal produced no effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockIgnoredReason {
    /// Signal arrived before activation.
    NotActive,
    /// Signal arrived after deactivation.
    SessionEnded,
    /// Activation requested twice.
    AlreadyActive,
    /// Touch event carried zero contact points.
    NoContactPoint,
    OutsideEdgeZone,
    /// Visibility changed, but not to visible.
    VisibilityNotRestored,
    /// The matching reinforcement is switched off in the config.
    GuardDisabled,
}

impl LockIgnoredReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotActive => "not_active",
            Self::SessionEnded => "session_ended",
            Self::AlreadyActive => "already_active",
            Self::NoContactPoint => "no_contact_point",
            Self::OutsideEdgeZone => "outside_edge_zone",
            Self::VisibilityNotRestored => "visibility_not_restored",
            Self::GuardDisabled => "guard_disabled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    Applied,
    Ignored(LockIgnoredReason),
}

/// Result of applying one signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockTransition {
    pub phase: LockPhase,
    pub from: LockState,
    pub to: LockState,
    pub effects: Vec<LockEffect>,
    pub outcome: LockOutcome,
}

impl LockTransition {
    fn ignored(phase: LockPhase, state: LockState, reason: LockIgnoredReason) -> Self {
        Self {
            phase,
            from: state,
            to: state,
            effects: Vec::new(),
            outcome: LockOutcome::Ignored(reason),
        }
    }

    #[must_use]
    pub fn is_applied(&self) -> bool {
        self.outcome == LockOutcome::Applied
    }

    /// Number of trap entries this transition pushes.
    #[must_use]
    pub fn pushes(&self) -> usize {
        self.effects
            .iter()
            .filter(|effect| matches!(effect, LockEffect::PushEntry))
            .count()
    }

    #[must_use]
    pub fn suppresses_default(&self) -> bool {
        self.effects.contains(&LockEffect::SuppressDefault)
    }
}

/// Deterministic navigation-lock machine.
#[derive(Debug, Clone)]
pub struct NavLockMachine {
    state: LockState,
    config: NavLockConfig,
}

impl NavLockMachine {
    /// Build a machine in [`LockState::Idle`]. The config is expected to be
    /// validated by the caller.
    #[must_use]
    pub const fn new(config: NavLockConfig) -> Self {
        Self {
            state: LockState::Idle,
            config,
        }
    }

    #[must_use]
    pub const fn state(&self) -> LockState {
        self.state
    }

    #[must_use]
    pub const fn config(&self) -> &NavLockConfig {
        &self.config
    }

    /// Apply one signal and return the effects to perform.
    pub fn apply(&mut self, signal: LockSignal) -> LockTransition {
        let phase = signal.phase();
        let from = self.state;
        match (from, signal) {
            (LockState::Idle, LockSignal::Activate) => {
                let mut effects = Vec::with_capacity(1 + usize::from(self.config.pad_depth));
                effects.push(LockEffect::ReplaceCurrent);
                push_entries(&mut effects, self.config.pad_depth);
                self.transition(phase, LockState::Locked, effects)
            }
            (LockState::Locked, LockSignal::Activate) => {
                LockTransition::ignored(phase, from, LockIgnoredReason::AlreadyActive)
            }
            (LockState::Idle | LockState::Locked, LockSignal::Deactivate) => {
                self.transition(phase, LockState::Released, Vec::new())
            }
            (LockState::Released, _) => {
                LockTransition::ignored(phase, from, LockIgnoredReason::SessionEnded)
            }
            (LockState::Idle, _) => {
                LockTransition::ignored(phase, from, LockIgnoredReason::NotActive)
            }
            (LockState::Locked, reinforcement) => self.reinforce(phase, reinforcement),
        }
    }

    fn reinforce(&mut self, phase: LockPhase, signal: LockSignal) -> LockTransition {
        let state = self.state;
        let config = self.config;
        let mut effects = Vec::new();
        match signal {
            LockSignal::BackNavigationAttempt => {
                effects.push(LockEffect::SuppressDefault);
                push_entries(&mut effects, config.back_repad);
                effects.push(LockEffect::ScheduleStepForward {
                    delay: config.fallback_delay(),
                });
            }
            LockSignal::VisibilityHidden => {
                return LockTransition::ignored(
                    phase,
                    state,
                    LockIgnoredReason::VisibilityNotRestored,
                );
            }
            LockSignal::VisibilityRestored if !config.repin_on_visibility => {
                return LockTransition::ignored(phase, state, LockIgnoredReason::GuardDisabled);
            }
            LockSignal::FocusRegained if !config.repin_on_focus => {
                return LockTransition::ignored(phase, state, LockIgnoredReason::GuardDisabled);
            }
            LockSignal::VisibilityRestored | LockSignal::FocusRegained => {
                effects.push(LockEffect::PushEntry);
            }
            LockSignal::PointerDown { primary_x } => {
                if !config.edge_touch_guard {
                    return LockTransition::ignored(phase, state, LockIgnoredReason::GuardDisabled);
                }
                let Some(x) = primary_x else {
                    return LockTransition::ignored(phase, state, LockIgnoredReason::NoContactPoint);
                };
                if !config.is_edge_origin(x) {
                    return LockTransition::ignored(
                        phase,
                        state,
                        LockIgnoredReason::OutsideEdgeZone,
                    );
                }
                effects.push(LockEffect::PushEntry);
            }
            // Lifecycle signals are handled in `apply`.
            LockSignal::Activate | LockSignal::Deactivate => {
                return LockTransition::ignored(phase, state, LockIgnoredReason::AlreadyActive);
            }
        }
        self.transition(phase, state, effects)
    }

    fn transition(
        &mut self,
        phase: LockPhase,
        to: LockState,
        effects: Vec<LockEffect>,
    ) -> LockTransition {
        let from = self.state;
        self.state = to;
        LockTransition {
            phase,
            from,
            to,
            effects,
            outcome: LockOutcome::Applied,
        }
    }
}

fn push_entries(effects: &mut Vec<LockEffect>, count: u8) {
    effects.extend(core::iter::repeat_n(
        LockEffect::PushEntry,
        usize::from(count),
    ));
}
