#![forbid(unsafe_code)]

//! Lock tuning knobs.
//!
//! Defaults reproduce the reference behavior: three padding entries on
//! activation, two on every back attempt, a 10 ms forward-step fallback and
//! a 20 px leading-edge zone for swipe-back detection.

use core::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Padding entries pushed on activation.
pub const DEFAULT_PAD_DEPTH: u8 = 3;
/// Entries pushed synchronously on each back-navigation attempt.
pub const DEFAULT_BACK_REPAD: u8 = 2;
/// Delay before the forward-step fallback fires.
pub const DEFAULT_FALLBACK_DELAY_MS: u32 = 10;
/// Width of the leading-edge zone treated as a swipe-back origin.
pub const DEFAULT_EDGE_ZONE_PX: f64 = 20.0;
/// Upper bound on the fallback delay; beyond this the fallback lands long
/// after the user has seen the previous page.
pub const MAX_FALLBACK_DELAY_MS: u32 = 1_000;

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NavLockConfigError {
    #[error("pad_depth must be at least 1")]
    ZeroPadDepth,
    #[error("back_repad must be at least 1")]
    ZeroBackRepad,
    #[error("fallback_delay_ms {0} exceeds {max}", max = MAX_FALLBACK_DELAY_MS)]
    FallbackDelayTooLong(u32),
    #[error("edge_zone_px must be finite and positive, got {0}")]
    InvalidEdgeZone(f64),
    #[error("config json: {0}")]
    Json(String),
}

/// Navigation lock configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NavLockConfig {
    /// Redundant trap entries pushed after the activation replace.
    pub pad_depth: u8,
    /// Trap entries pushed on each back-navigation attempt.
    pub back_repad: u8,
    /// Delay of the forward-step fallback after a back attempt.
    pub fallback_delay_ms: u32,
    /// Horizontal extent (CSS px from the leading edge) counted as an edge touch.
    pub edge_zone_px: f64,
    pub repin_on_visibility: bool,
    pub repin_on_focus: bool,
    pub edge_touch_guard: bool,
}

impl Default for NavLockConfig {
    fn default() -> Self {
        Self {
            pad_depth: DEFAULT_PAD_DEPTH,
            back_repad: DEFAULT_BACK_REPAD,
            fallback_delay_ms: DEFAULT_FALLBACK_DELAY_MS,
            edge_zone_px: DEFAULT_EDGE_ZONE_PX,
            repin_on_visibility: true,
            repin_on_focus: true,
            edge_touch_guard: true,
        }
    }
}

impl NavLockConfig {
    /// Check invariants the state machine relies on.
    pub fn validate(&self) -> Result<(), NavLockConfigError> {
        if self.pad_depth == 0 {
            return Err(NavLockConfigError::ZeroPadDepth);
        }
        if self.back_repad == 0 {
            return Err(NavLockConfigError::ZeroBackRepad);
        }
        if self.fallback_delay_ms > MAX_FALLBACK_DELAY_MS {
            return Err(NavLockConfigError::FallbackDelayTooLong(
                self.fallback_delay_ms,
            ));
        }
        if !self.edge_zone_px.is_finite() || self.edge_zone_px <= 0.0 {
            return Err(NavLockConfigError::InvalidEdgeZone(self.edge_zone_px));
        }
        Ok(())
    }

    /// Parse a (possibly partial) JSON object and validate it. Missing keys
    /// take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, NavLockConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| NavLockConfigError::Json(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn fallback_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.fallback_delay_ms))
    }

    /// Whether a contact at `x` (CSS px from the leading edge) starts inside
    /// the edge zone.
    #[must_use]
    pub fn is_edge_origin(&self, x: f64) -> bool {
        x.is_finite() && x >= 0.0 && x < self.edge_zone_px
    }
}
