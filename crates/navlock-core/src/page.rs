#![forbid(unsafe_code)]

//! Catalogue of the terminal pages that mount a lock session.
//!
//! Layout, styling and animation belong to the host; this module only fixes
//! each page's trap path and copy so the binding and the host agree on them.

use core::time::Duration;

use crate::path::{TrapPath, TrapPathError};

/// Idle time after which the attendance session expires and the timeout
/// page is shown.
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Terminal page of the attendance flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalPage {
    /// No session token present.
    AccessRequired,
    /// Session expired after inactivity.
    SessionTimedOut,
}

impl TerminalPage {
    pub const ALL: [Self; 2] = [Self::AccessRequired, Self::SessionTimedOut];

    /// Logical location the page pins navigation to.
    #[must_use]
    pub const fn trap_location(self) -> &'static str {
        match self {
            Self::AccessRequired => "blank",
            Self::SessionTimedOut => "timeout",
        }
    }

    pub fn trap_path(self) -> Result<TrapPath, TrapPathError> {
        TrapPath::new(self.trap_location())
    }

    /// Resolve a page from its trap location, with or without a leading `/`.
    #[must_use]
    pub fn from_location(location: &str) -> Option<Self> {
        let location = location.strip_prefix('/').unwrap_or(location);
        Self::ALL
            .into_iter()
            .find(|page| page.trap_location() == location)
    }

    #[must_use]
    pub const fn headline(self) -> Option<&'static str> {
        match self {
            Self::AccessRequired => None,
            Self::SessionTimedOut => Some("Session Timed Out"),
        }
    }

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::AccessRequired => "Please scan the QR code to access the attendance system",
            Self::SessionTimedOut => {
                "Your session has expired due to inactivity. Please re-scan the QR code to \
                 access the attendance form and sign your attendance."
            }
        }
    }

    /// Call-to-action shown in a callout box.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::AccessRequired => None,
            Self::SessionTimedOut => Some("Re-scan your QR code to continue"),
        }
    }

    #[must_use]
    pub fn footnote(self) -> Option<String> {
        match self {
            Self::AccessRequired => None,
            Self::SessionTimedOut => Some(format!(
                "Sessions automatically expire after {} for security purposes",
                describe_timeout(SESSION_IDLE_TIMEOUT)
            )),
        }
    }
}

fn describe_timeout(timeout: Duration) -> String {
    let secs = timeout.as_secs();
    match (secs / 60, secs % 60) {
        (1, 0) => "1 minute".to_owned(),
        (minutes, 0) => format!("{minutes} minutes"),
        _ => format!("{secs} seconds"),
    }
}
