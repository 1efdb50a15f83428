#![forbid(unsafe_code)]

//! `navlock-core` keeps a terminal page's location pinned against backward
//! navigation.
//!
//! A terminal page (access required, session timed out) mounts one
//! [`NavigationLockController`] for its lifetime. On mount the controller
//! replaces the current history entry with the page's [`TrapPath`] and pads
//! the stack with redundant copies; while mounted it re-pads on every back
//! attempt, visibility restore, focus regain and edge-swipe start.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment delivers signals and owns
//!   the history; the controller only writes to it through [`HistoryPort`].
//! - **Deterministic time**: deferred corrections go through a
//!   [`DeferredScheduler`]; tests drive a [`ManualScheduler`] explicitly.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! This is a best-effort deterrent. Nothing here stops a user from editing
//! the address bar or closing the tab.

pub mod config;
pub mod controller;
pub mod harness;
pub mod machine;
pub mod page;
pub mod path;
pub mod port;

use thiserror::Error;

pub use config::{NavLockConfig, NavLockConfigError};
pub use controller::{LockDispatch, LockLogEntry, LockStats, NavigationLockController};
pub use harness::LockHarness;
pub use machine::{
    LockEffect, LockIgnoredReason, LockOutcome, LockPhase, LockSignal, LockState, LockTransition,
    NavLockMachine,
};
pub use page::{SESSION_IDLE_TIMEOUT, TerminalPage};
pub use path::{TrapPath, TrapPathError};
pub use port::{
    DeferredCorrection, DeferredScheduler, DeterministicClock, HistoryOp, HistoryPort,
    ManualScheduler, PortError, PortOp, SimulatedHistory,
};

/// Construction-time failure. Runtime signals never fail; see
/// [`LockOutcome::Ignored`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NavLockError {
    #[error(transparent)]
    TrapPath(#[from] TrapPathError),
    #[error(transparent)]
    Config(#[from] NavLockConfigError),
}
