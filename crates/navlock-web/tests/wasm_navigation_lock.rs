#![cfg(target_arch = "wasm32")]
#![forbid(unsafe_code)]

use navlock_web::NavigationLock;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

wasm_bindgen_test_configure!(run_in_browser);

fn field(value: &JsValue, key: &str) -> JsValue {
    js_sys::Reflect::get(value, &JsValue::from_str(key)).expect("summary field should exist")
}

fn location_path() -> String {
    web_sys::window()
        .expect("window")
        .location()
        .pathname()
        .expect("pathname")
}

#[wasm_bindgen_test]
fn mount_pins_location_and_unmount_releases() {
    let mut lock = NavigationLock::new("timeout", None).expect("lock should build");
    assert_eq!(lock.state(), "idle");

    let summary = lock.mount().expect("mount should succeed");
    assert_eq!(field(&summary, "accepted").as_bool(), Some(true));
    assert_eq!(field(&summary, "pushed").as_f64(), Some(3.0));
    assert_eq!(location_path(), "/timeout");
    assert_eq!(lock.state(), "locked");

    let summary = lock.unmount();
    assert_eq!(field(&summary, "state").as_string().as_deref(), Some("released"));
    assert_eq!(lock.state(), "released");
}

#[wasm_bindgen_test]
fn second_mount_is_ignored() {
    let mut lock = NavigationLock::for_page("blank", None).expect("lock should build");
    lock.mount().expect("mount should succeed");
    let summary = lock.mount().expect("second mount returns a summary");
    assert_eq!(field(&summary, "accepted").as_bool(), Some(false));
    assert_eq!(
        field(&summary, "ignored_reason").as_string().as_deref(),
        Some("already_active")
    );
    lock.unmount();
}

#[wasm_bindgen_test]
fn config_json_is_validated() {
    let err = NavigationLock::new("timeout", Some(r#"{"pad_depth":0}"#.to_owned()));
    assert!(err.is_err());
    let err = NavigationLock::for_page("form", None);
    assert!(err.is_err());
}

#[wasm_bindgen_test]
fn focus_event_repins_while_mounted() {
    let mut lock = NavigationLock::new("timeout", Some(r#"{"pad_depth":1}"#.to_owned()))
        .expect("lock should build");
    lock.mount().expect("mount should succeed");

    let window = web_sys::window().expect("window");
    let event = web_sys::Event::new("focus").expect("event should build");
    window.dispatch_event(&event).expect("dispatch should succeed");

    let stats = lock.stats();
    assert_eq!(field(&stats, "repins").as_f64(), Some(1.0));
    assert_eq!(field(&stats, "entries_pushed").as_f64(), Some(2.0));

    lock.unmount();
    window.dispatch_event(&event).expect("dispatch should succeed");
    assert_eq!(field(&lock.stats(), "repins").as_f64(), Some(1.0));
}
