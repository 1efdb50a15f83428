#![forbid(unsafe_code)]

//! Browser binding for `navlock-core`.
//!
//! [`NavigationLock`] is a `wasm-bindgen` class that a terminal page creates
//! on mount. It wires the core controller to `window.history`, listens for
//! `popstate`, `visibilitychange`, `focus` and (passively) `touchstart`, and
//! schedules the forward-step fallback with `setTimeout`.
//!
//! The [`dom`] module holds the target-independent event mapping so it can be
//! tested natively.

pub mod dom;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::NavigationLock;
