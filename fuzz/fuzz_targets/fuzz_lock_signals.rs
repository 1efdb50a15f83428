#![no_main]

use core::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use navlock_core::{HistoryOp, LockHarness, LockSignal, LockState, NavLockConfig};

#[derive(Debug, Arbitrary)]
enum Step {
    Mount,
    Unmount,
    BackGesture,
    SilentBack,
    Hidden,
    Restored,
    Focus,
    Touch(Option<i16>),
    Advance(u8),
    ExternalPush,
}

#[derive(Debug, Arbitrary)]
struct Input {
    pad_depth: u8,
    back_repad: u8,
    fallback_delay_ms: u8,
    steps: Vec<Step>,
}

fuzz_target!(|input: Input| {
    let config = NavLockConfig {
        pad_depth: input.pad_depth % 8 + 1,
        back_repad: input.back_repad % 4 + 1,
        fallback_delay_ms: u32::from(input.fallback_delay_ms),
        ..NavLockConfig::default()
    };
    let Ok(mut harness) = LockHarness::with_config("timeout", "home", config) else {
        return;
    };

    for step in input.steps.iter().take(256) {
        match step {
            Step::Mount => {
                harness.mount();
            }
            Step::Unmount => {
                harness.unmount();
            }
            Step::BackGesture => {
                harness.back_gesture();
            }
            Step::SilentBack => {
                harness.with_history(|history| history.user_back());
            }
            Step::Advance(ms) => {
                harness.advance(Duration::from_millis(u64::from(*ms)));
            }
            Step::ExternalPush => harness.with_history(|history| history.external_push("other")),
            Step::Hidden => dispatch(&mut harness, LockSignal::VisibilityHidden),
            Step::Restored => dispatch(&mut harness, LockSignal::VisibilityRestored),
            Step::Focus => dispatch(&mut harness, LockSignal::FocusRegained),
            Step::Touch(x) => dispatch(
                &mut harness,
                LockSignal::PointerDown {
                    primary_x: x.map(f64::from),
                },
            ),
        }

        let history = harness.history();
        assert!(history.index() < history.len(), "active index out of bounds");
        for op in history.ops() {
            if let HistoryOp::Replace(location) | HistoryOp::Push(location) = op {
                assert_eq!(location, "timeout", "lock wrote a foreign location");
            }
        }
    }

    // Released sessions schedule nothing new; draining the clock empties the queue.
    if harness.state() == LockState::Released {
        let pending = harness.scheduler().pending();
        assert_eq!(harness.advance(Duration::from_secs(2)), pending);
        assert_eq!(harness.scheduler().pending(), 0);
    }
});

fn dispatch(harness: &mut LockHarness, signal: LockSignal) {
    if let Some(controller) = harness.controller_mut() {
        controller.dispatch(signal);
    }
}
