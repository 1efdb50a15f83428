#![forbid(unsafe_code)]

use core::time::Duration;

use navlock_core::{HistoryOp, LockHarness, LockSignal, NavLockConfig};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    BackGesture,
    Hidden,
    Restored,
    Focus,
    Touch(Option<f64>),
    Advance(u8),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => Just(Step::BackGesture),
        1 => Just(Step::Hidden),
        1 => Just(Step::Restored),
        1 => Just(Step::Focus),
        2 => proptest::option::of(0.0f64..800.0).prop_map(Step::Touch),
        2 => any::<u8>().prop_map(Step::Advance),
    ]
}

fn config_strategy() -> impl Strategy<Value = NavLockConfig> {
    (1u8..8, 1u8..5, 0u32..50).prop_map(|(pad_depth, back_repad, fallback_delay_ms)| {
        NavLockConfig {
            pad_depth,
            back_repad,
            fallback_delay_ms,
            ..NavLockConfig::default()
        }
    })
}

fn mounted(config: NavLockConfig) -> LockHarness {
    let mut harness =
        LockHarness::with_config("timeout", "home", config).expect("generated config is valid");
    harness.with_history(|history| history.external_push("form"));
    harness.mount().expect("fresh harness mounts");
    harness
}

proptest! {
    #[test]
    fn padding_absorbs_exactly_pad_depth_silent_backs(config in config_strategy(), extra in 0usize..4) {
        let mut harness = mounted(config);
        let depth = usize::from(config.pad_depth);
        for attempt in 1..=depth + extra {
            harness.with_history(|history| history.user_back());
            let pinned = harness.active() == "timeout";
            prop_assert_eq!(pinned, attempt <= depth, "attempt {}", attempt);
        }
    }

    #[test]
    fn defended_session_never_exposes_prior_page(
        config in config_strategy(),
        steps in proptest::collection::vec(step_strategy(), 0..64),
    ) {
        let mut harness = mounted(config);
        for step in steps {
            match step {
                Step::BackGesture => { harness.back_gesture(); }
                Step::Advance(ms) => { harness.advance(Duration::from_millis(u64::from(ms))); }
                Step::Hidden => { dispatch(&mut harness, LockSignal::VisibilityHidden); }
                Step::Restored => { dispatch(&mut harness, LockSignal::VisibilityRestored); }
                Step::Focus => { dispatch(&mut harness, LockSignal::FocusRegained); }
                Step::Touch(primary_x) => {
                    dispatch(&mut harness, LockSignal::PointerDown { primary_x });
                }
            }
            prop_assert_eq!(harness.active(), "timeout");
        }
    }

    #[test]
    fn corrections_only_ever_write_the_trap_path(
        config in config_strategy(),
        steps in proptest::collection::vec(step_strategy(), 0..64),
    ) {
        let mut harness = mounted(config);
        let mut expected_pushes = u64::from(config.pad_depth);
        let mut backs = 0u64;
        for step in steps {
            match step {
                Step::BackGesture => {
                    if harness.back_gesture().is_some() {
                        backs += 1;
                        expected_pushes += u64::from(config.back_repad);
                    }
                }
                Step::Advance(ms) => { harness.advance(Duration::from_millis(u64::from(ms))); }
                Step::Hidden => { dispatch(&mut harness, LockSignal::VisibilityHidden); }
                Step::Restored => {
                    dispatch(&mut harness, LockSignal::VisibilityRestored);
                    expected_pushes += 1;
                }
                Step::Focus => {
                    dispatch(&mut harness, LockSignal::FocusRegained);
                    expected_pushes += 1;
                }
                Step::Touch(primary_x) => {
                    let edge = primary_x.is_some_and(|x| config.is_edge_origin(x));
                    dispatch(&mut harness, LockSignal::PointerDown { primary_x });
                    expected_pushes += u64::from(edge);
                }
            }
        }

        let history = harness.history();
        let mut pushes = 0u64;
        for op in history.ops() {
            match op {
                HistoryOp::Replace(location) | HistoryOp::Push(location) => {
                    prop_assert_eq!(location.as_str(), "timeout");
                    pushes += u64::from(matches!(op, HistoryOp::Push(_)));
                }
                HistoryOp::StepForward => {}
            }
        }
        prop_assert_eq!(pushes, expected_pushes);
        let scheduler = harness.scheduler();
        prop_assert_eq!(scheduler.fired() + scheduler.pending() as u64, backs);
    }
}

fn dispatch(harness: &mut LockHarness, signal: LockSignal) {
    harness
        .controller_mut()
        .expect("controller stays mounted")
        .dispatch(signal);
}
