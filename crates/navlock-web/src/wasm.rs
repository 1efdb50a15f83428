#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for [`NavigationLock`].
//!
//! Binds the core controller to `window.history`, the DOM listeners in
//! [`crate::dom::LOCK_LISTENERS`] and `setTimeout`. Only compiled on `wasm32`
//! targets.

use core::time::Duration;
use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Function, JSON, Reflect};
use navlock_core::{
    DeferredCorrection, DeferredScheduler, HistoryPort, NavLockConfig, NavigationLockController,
    PortError, PortOp, TerminalPage, TrapPath,
};
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, Document, Event, EventTarget, History, TouchEvent, VisibilityState,
    Window,
};

use crate::dom::{
    DomEventData, LOCK_LISTENERS, ListenerSpec, ListenerTarget, dispatch_to_json,
    signal_for_event, state_label, stats_to_json,
};

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = if let Some(loc) = info.location() {
                format!(
                    "panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                )
            } else {
                format!("panic: {info}")
            };
            console_error(&msg);
        }));
    });
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn port_error(op: PortOp, err: &JsValue) -> PortError {
    PortError::new(op, err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

fn json_to_js(value: &serde_json::Value) -> JsValue {
    JSON::parse(&value.to_string()).unwrap_or(JsValue::NULL)
}

/// `window.history` as a lock port.
struct BrowserHistory {
    history: History,
}

impl HistoryPort for BrowserHistory {
    fn replace_current_entry(&mut self, location: &TrapPath) -> Result<(), PortError> {
        self.history
            .replace_state_with_url(&JsValue::NULL, "", Some(&location.href()))
            .map_err(|err| port_error(PortOp::Replace, &err))
    }

    fn push_entry(&mut self, location: &TrapPath) -> Result<(), PortError> {
        self.history
            .push_state_with_url(&JsValue::NULL, "", Some(&location.href()))
            .map_err(|err| port_error(PortOp::Push, &err))
    }

    fn step_forward(&mut self) -> Result<(), PortError> {
        self.history
            .forward()
            .map_err(|err| port_error(PortOp::StepForward, &err))
    }
}

/// `setTimeout`-backed scheduler. Each correction owns its own history
/// handle, so it still runs after the lock is dropped.
struct TimeoutScheduler {
    window: Window,
    history: History,
}

impl DeferredScheduler for TimeoutScheduler {
    fn schedule(
        &mut self,
        delay: Duration,
        correction: DeferredCorrection,
    ) -> Result<(), PortError> {
        let mut port = BrowserHistory {
            history: self.history.clone(),
        };
        let callback = Closure::once_into_js(move || {
            if let Err(error) = correction.apply(&mut port) {
                warn!(target: "navlock_web::lock", %error, "deferred correction failed");
            }
        });
        let delay_ms = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        self.window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref::<Function>(),
                delay_ms,
            )
            .map(|_handle| ())
            .map_err(|err| port_error(PortOp::Schedule, &err))
    }
}

type BrowserController = NavigationLockController<BrowserHistory, TimeoutScheduler>;

struct InstalledListener {
    target: EventTarget,
    spec: ListenerSpec,
    callback: Closure<dyn FnMut(Event)>,
}

fn visibility_label(document: &Document) -> &'static str {
    match document.visibility_state() {
        VisibilityState::Visible => "visible",
        _ => "hidden",
    }
}

fn primary_touch_x(event: &Event) -> Option<f64> {
    let touch = event.dyn_ref::<TouchEvent>()?.touches().get(0)?;
    Some(f64::from(touch.client_x()))
}

/// Navigation lock for one terminal page, exported to JS.
///
/// ```js
/// const lock = new NavigationLock("timeout");
/// lock.mount();   // before first paint
/// // ...
/// lock.unmount(); // on page teardown
/// lock.free();
/// ```
#[wasm_bindgen]
pub struct NavigationLock {
    window: Window,
    document: Document,
    controller: Rc<RefCell<BrowserController>>,
    listeners: Vec<InstalledListener>,
}

#[wasm_bindgen]
impl NavigationLock {
    /// Create an idle lock. `config_json` is an optional partial
    /// `NavLockConfig` object serialized as JSON.
    #[wasm_bindgen(constructor)]
    pub fn new(trap_path: &str, config_json: Option<String>) -> Result<NavigationLock, JsValue> {
        install_panic_hook();
        let trap = TrapPath::new(trap_path).map_err(js_error)?;
        Self::build(trap, config_json)
    }

    /// Create an idle lock for a catalogue page (`"blank"` or `"timeout"`).
    #[wasm_bindgen(js_name = forPage)]
    pub fn for_page(page: &str, config_json: Option<String>) -> Result<NavigationLock, JsValue> {
        install_panic_hook();
        let page = TerminalPage::from_location(page)
            .ok_or_else(|| JsValue::from_str(&format!("unknown terminal page: {page}")))?;
        let trap = page.trap_path().map_err(js_error)?;
        Self::build(trap, config_json)
    }

    /// Pin the trap path, pad the stack and start listening.
    pub fn mount(&mut self) -> Result<JsValue, JsValue> {
        let dispatch = self.controller.borrow_mut().activate();
        if dispatch.transition.is_applied() {
            self.attach_listeners()?;
        }
        Ok(json_to_js(&dispatch_to_json(&dispatch)))
    }

    /// Stop listening and release the lock. Pending fallbacks still fire.
    pub fn unmount(&mut self) -> JsValue {
        self.detach_listeners();
        let dispatch = self.controller.borrow_mut().deactivate();
        json_to_js(&dispatch_to_json(&dispatch))
    }

    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        state_label(self.controller.borrow().state()).to_owned()
    }

    #[wasm_bindgen(getter, js_name = trapPath)]
    pub fn trap_path(&self) -> String {
        self.controller.borrow().trap_path().as_str().to_owned()
    }

    pub fn stats(&self) -> JsValue {
        json_to_js(&stats_to_json(&self.controller.borrow().stats()))
    }
}

impl NavigationLock {
    fn build(trap: TrapPath, config_json: Option<String>) -> Result<NavigationLock, JsValue> {
        let config = match config_json.as_deref() {
            Some(json) => NavLockConfig::from_json_str(json).map_err(js_error)?,
            None => NavLockConfig::default(),
        };
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let history = window.history()?;
        let controller = NavigationLockController::new(
            trap,
            config,
            BrowserHistory {
                history: history.clone(),
            },
            TimeoutScheduler {
                window: window.clone(),
                history,
            },
        )
        .map_err(js_error)?;
        Ok(Self {
            window,
            document,
            controller: Rc::new(RefCell::new(controller)),
            listeners: Vec::new(),
        })
    }

    fn attach_listeners(&mut self) -> Result<(), JsValue> {
        for spec in LOCK_LISTENERS {
            let target: EventTarget = match spec.target {
                ListenerTarget::Window => self.window.clone().into(),
                ListenerTarget::Document => self.document.clone().into(),
            };
            let controller = Rc::clone(&self.controller);
            let document = self.document.clone();
            let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
                let data = DomEventData {
                    visibility_state: Some(visibility_label(&document)),
                    primary_touch_x: primary_touch_x(&event),
                };
                let Some(signal) = signal_for_event(spec.event_type, data) else {
                    return;
                };
                let Ok(mut controller) = controller.try_borrow_mut() else {
                    warn!(
                        target: "navlock_web::lock",
                        event_type = spec.event_type,
                        "lock busy; dropping re-entrant event"
                    );
                    return;
                };
                let dispatch = controller.dispatch(signal);
                if dispatch.suppress_default && event.cancelable() {
                    event.prevent_default();
                }
            });

            let options = AddEventListenerOptions::new();
            options.set_passive(spec.passive);
            target.add_event_listener_with_callback_and_add_event_listener_options(
                spec.event_type,
                callback.as_ref().unchecked_ref(),
                &options,
            )?;
            self.listeners.push(InstalledListener {
                target,
                spec,
                callback,
            });
        }
        debug!(
            target: "navlock_web::lock",
            listeners = self.listeners.len(),
            "lock listeners attached"
        );
        Ok(())
    }

    fn detach_listeners(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        let count = self.listeners.len();
        for listener in self.listeners.drain(..) {
            let _ = listener.target.remove_event_listener_with_callback(
                listener.spec.event_type,
                listener.callback.as_ref().unchecked_ref(),
            );
        }
        debug!(
            target: "navlock_web::lock",
            listeners = count,
            "lock listeners detached"
        );
    }
}

impl Drop for NavigationLock {
    fn drop(&mut self) {
        self.detach_listeners();
        if let Ok(mut controller) = self.controller.try_borrow_mut() {
            controller.deactivate();
        }
    }
}
