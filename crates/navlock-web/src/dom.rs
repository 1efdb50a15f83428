#![forbid(unsafe_code)]

//! Browser-independent half of the binding: which DOM listeners a lock
//! installs, how raw event data maps to [`LockSignal`]s, and the JSON shape
//! handed back to JS.
//!
//! Kept free of `web-sys` so it compiles and tests natively.

use navlock_core::{LockDispatch, LockOutcome, LockSignal, LockState, LockStats};
use serde_json::{Value, json};

/// Object a listener is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerTarget {
    Window,
    Document,
}

/// One DOM listener installed for the life of a lock session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerSpec {
    pub event_type: &'static str,
    pub target: ListenerTarget,
    /// Passive listeners never delay the gesture they observe.
    pub passive: bool,
}

/// Every listener a mounted lock holds.
pub const LOCK_LISTENERS: [ListenerSpec; 4] = [
    ListenerSpec {
        event_type: "popstate",
        target: ListenerTarget::Window,
        passive: false,
    },
    ListenerSpec {
        event_type: "visibilitychange",
        target: ListenerTarget::Document,
        passive: false,
    },
    ListenerSpec {
        event_type: "focus",
        target: ListenerTarget::Window,
        passive: false,
    },
    ListenerSpec {
        event_type: "touchstart",
        target: ListenerTarget::Document,
        passive: true,
    },
];

/// Raw data a DOM event handler can extract cheaply.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DomEventData<'a> {
    /// `document.visibilityState` at dispatch time.
    pub visibility_state: Option<&'a str>,
    /// `clientX` of `touches[0]`, absent when the touch list is empty.
    pub primary_touch_x: Option<f64>,
}

/// Map a DOM event to a lock signal. Unknown event types map to `None`.
#[must_use]
pub fn signal_for_event(event_type: &str, data: DomEventData<'_>) -> Option<LockSignal> {
    match event_type {
        "popstate" => Some(LockSignal::BackNavigationAttempt),
        "visibilitychange" => Some(match data.visibility_state {
            Some("visible") => LockSignal::VisibilityRestored,
            _ => LockSignal::VisibilityHidden,
        }),
        "focus" => Some(LockSignal::FocusRegained),
        "touchstart" => Some(LockSignal::PointerDown {
            primary_x: data.primary_touch_x,
        }),
        _ => None,
    }
}

#[must_use]
pub const fn state_label(state: LockState) -> &'static str {
    match state {
        LockState::Idle => "idle",
        LockState::Locked => "locked",
        LockState::Released => "released",
    }
}

/// JSON summary of one dispatch, as returned to JS hosts.
#[must_use]
pub fn dispatch_to_json(dispatch: &LockDispatch) -> Value {
    let log = &dispatch.log;
    let (accepted, ignored_reason) = match log.outcome {
        LockOutcome::Applied => (true, Value::Null),
        LockOutcome::Ignored(reason) => (false, Value::from(reason.as_str())),
    };
    json!({
        "accepted": accepted,
        "phase": log.phase.as_str(),
        "sequence": log.sequence,
        "state": state_label(dispatch.transition.to),
        "replaced": log.replaced,
        "pushed": log.pushed,
        "scheduled_forward": log.scheduled_forward,
        "suppress_default": dispatch.suppress_default,
        "port_failures": log.port_failures,
        "ignored_reason": ignored_reason,
    })
}

#[must_use]
pub fn stats_to_json(stats: &LockStats) -> Value {
    json!({
        "back_attempts": stats.back_attempts,
        "repins": stats.repins,
        "edge_touches": stats.edge_touches,
        "entries_replaced": stats.entries_replaced,
        "entries_pushed": stats.entries_pushed,
        "forward_steps_scheduled": stats.forward_steps_scheduled,
        "ignored_signals": stats.ignored_signals,
        "port_failures": stats.port_failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use navlock_core::LockHarness;
    use pretty_assertions::assert_eq;

    #[test]
    fn only_touchstart_is_passive() {
        let passive: Vec<_> = LOCK_LISTENERS
            .iter()
            .filter(|spec| spec.passive)
            .map(|spec| spec.event_type)
            .collect();
        assert_eq!(passive, vec!["touchstart"]);
    }

    #[test]
    fn popstate_and_focus_map_directly() {
        assert_eq!(
            signal_for_event("popstate", DomEventData::default()),
            Some(LockSignal::BackNavigationAttempt)
        );
        assert_eq!(
            signal_for_event("focus", DomEventData::default()),
            Some(LockSignal::FocusRegained)
        );
        assert_eq!(signal_for_event("blur", DomEventData::default()), None);
    }

    #[test]
    fn visibility_state_selects_direction() {
        let visible = DomEventData {
            visibility_state: Some("visible"),
            ..DomEventData::default()
        };
        let hidden = DomEventData {
            visibility_state: Some("hidden"),
            ..DomEventData::default()
        };
        assert_eq!(
            signal_for_event("visibilitychange", visible),
            Some(LockSignal::VisibilityRestored)
        );
        assert_eq!(
            signal_for_event("visibilitychange", hidden),
            Some(LockSignal::VisibilityHidden)
        );
        assert_eq!(
            signal_for_event("visibilitychange", DomEventData::default()),
            Some(LockSignal::VisibilityHidden)
        );
    }

    #[test]
    fn touch_without_contacts_carries_no_coordinate() {
        assert_eq!(
            signal_for_event("touchstart", DomEventData::default()),
            Some(LockSignal::PointerDown { primary_x: None })
        );
        let edge = DomEventData {
            primary_touch_x: Some(10.0),
            ..DomEventData::default()
        };
        assert_eq!(
            signal_for_event("touchstart", edge),
            Some(LockSignal::PointerDown {
                primary_x: Some(10.0)
            })
        );
    }

    #[test]
    fn dispatch_json_describes_back_attempt() {
        let mut harness = LockHarness::new("timeout", "form").expect("valid harness");
        harness.mount();
        let dispatch = harness.back_gesture().expect("controller is mounted");
        assert_eq!(
            dispatch_to_json(&dispatch),
            json!({
                "accepted": true,
                "phase": "back_navigation_attempt",
                "sequence": 2,
                "state": "locked",
                "replaced": false,
                "pushed": 2,
                "scheduled_forward": true,
                "suppress_default": true,
                "port_failures": 0,
                "ignored_reason": null,
            })
        );
    }

    #[test]
    fn dispatch_json_reports_ignored_reason() {
        let mut harness = LockHarness::new("blank", "form").expect("valid harness");
        harness.mount();
        let dispatch = harness
            .controller_mut()
            .expect("controller is mounted")
            .pointer_down(Some(300.0));
        let value = dispatch_to_json(&dispatch);
        assert_eq!(value["accepted"], json!(false));
        assert_eq!(value["ignored_reason"], json!("outside_edge_zone"));
        assert_eq!(value["sequence"], Value::Null);
    }

    #[test]
    fn stats_json_has_every_counter() {
        let value = stats_to_json(&LockStats::default());
        assert_eq!(value.as_object().map(serde_json::Map::len), Some(8));
    }
}
