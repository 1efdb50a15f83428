#![forbid(unsafe_code)]

//! Deterministic fixture bundling a controller with a simulated history and
//! a manual scheduler.
//!
//! The history and scheduler live outside the controller, so
//! [`LockHarness::unmount`] can drop the controller while corrections it
//! already scheduled keep running on [`LockHarness::advance`], the same way a
//! browser timer outlives the component that set it.

use core::time::Duration;
use std::cell::{Ref, RefCell};
use std::rc::Rc;

use crate::NavLockError;
use crate::config::NavLockConfig;
use crate::controller::{LockDispatch, LockStats, NavigationLockController};
use crate::machine::LockState;
use crate::path::TrapPath;
use crate::port::{ManualScheduler, SimulatedHistory};

pub type SharedHistory = Rc<RefCell<SimulatedHistory>>;
pub type SharedScheduler = Rc<RefCell<ManualScheduler>>;
pub type HarnessController = NavigationLockController<SharedHistory, SharedScheduler>;

/// Simulated page mount for tests and replays.
#[derive(Debug)]
pub struct LockHarness {
    history: SharedHistory,
    scheduler: SharedScheduler,
    controller: Option<HarnessController>,
    final_stats: Option<LockStats>,
}

impl LockHarness {
    /// Mount-ready harness: `origin` is the entry the user was on before the
    /// terminal page.
    pub fn new(trap: &str, origin: &str) -> Result<Self, NavLockError> {
        Self::with_config(trap, origin, NavLockConfig::default())
    }

    pub fn with_config(
        trap: &str,
        origin: &str,
        config: NavLockConfig,
    ) -> Result<Self, NavLockError> {
        let history = Rc::new(RefCell::new(SimulatedHistory::new(origin)));
        let scheduler = Rc::new(RefCell::new(ManualScheduler::new()));
        let controller = NavigationLockController::new(
            TrapPath::new(trap)?,
            config,
            Rc::clone(&history),
            Rc::clone(&scheduler),
        )?;
        Ok(Self {
            history,
            scheduler,
            controller: Some(controller),
            final_stats: None,
        })
    }

    /// Mount the page and activate the lock.
    pub fn mount(&mut self) -> Option<LockDispatch> {
        self.controller.as_mut().map(NavigationLockController::activate)
    }

    /// Deactivate and drop the controller. Returns `None` if already
    /// unmounted.
    pub fn unmount(&mut self) -> Option<LockDispatch> {
        let mut controller = self.controller.take()?;
        let dispatch = controller.deactivate();
        self.final_stats = Some(controller.stats());
        Some(dispatch)
    }

    /// Live controller, `None` after unmount.
    pub fn controller_mut(&mut self) -> Option<&mut HarnessController> {
        self.controller.as_mut()
    }

    #[must_use]
    pub fn state(&self) -> LockState {
        self.controller
            .as_ref()
            .map_or(LockState::Released, NavigationLockController::state)
    }

    /// Stats of the live controller, or the final stats after unmount.
    #[must_use]
    pub fn stats(&self) -> LockStats {
        self.controller
            .as_ref()
            .map(NavigationLockController::stats)
            .or(self.final_stats)
            .unwrap_or_default()
    }

    /// User back gesture: pops the simulated stack and, if the page is still
    /// mounted, delivers the back-navigation signal the browser would fire.
    pub fn back_gesture(&mut self) -> Option<LockDispatch> {
        if !self.history.borrow_mut().user_back() {
            return None;
        }
        self.controller
            .as_mut()
            .map(NavigationLockController::back_navigation_attempt)
    }

    /// Advance time, running due corrections. Returns how many ran.
    pub fn advance(&mut self, dt: Duration) -> usize {
        let mut history = self.history.borrow_mut();
        self.scheduler.borrow_mut().advance(dt, &mut *history)
    }

    #[must_use]
    pub fn history(&self) -> Ref<'_, SimulatedHistory> {
        self.history.borrow()
    }

    /// Direct mutable access for host-side actions (declining, external
    /// pushes).
    pub fn with_history<R>(&self, f: impl FnOnce(&mut SimulatedHistory) -> R) -> R {
        f(&mut self.history.borrow_mut())
    }

    #[must_use]
    pub fn scheduler(&self) -> Ref<'_, ManualScheduler> {
        self.scheduler.borrow()
    }

    /// Active location of the simulated stack.
    #[must_use]
    pub fn active(&self) -> String {
        self.history.borrow().active().to_owned()
    }
}
