//! Integration tests for the boost engine
//!
//! Elevated hooks are replaced by recorders that append to a shared log,
//! so every test can check the exact enter/exit sequence.

use parking_lot::Mutex;
use proptest::prelude::*;
use schedboost_core::{BoostEngine, BoostHook, BoostMode, EngineBuilder, Error, PlacementState};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HookEvent {
    Enter(BoostMode),
    Exit(BoostMode),
}

use HookEvent::{Enter, Exit};

type Log = Arc<Mutex<Vec<HookEvent>>>;

struct Recorder {
    mode: BoostMode,
    log: Log,
}

impl BoostHook for Recorder {
    fn enter(&self) {
        self.log.lock().push(Enter(self.mode));
    }

    fn exit(&self) {
        self.log.lock().push(Exit(self.mode));
    }
}

fn harness() -> (BoostEngine, Log) {
    let log: Log = Arc::default();
    let mut builder = EngineBuilder::new();
    for mode in BoostMode::ELEVATED {
        builder = builder.hook(
            mode,
            Recorder {
                mode,
                log: log.clone(),
            },
        );
    }
    (builder.build(Arc::new(PlacementState::new())), log)
}

fn take(log: &Log) -> Vec<HookEvent> {
    std::mem::take(&mut *log.lock())
}

/// Replay a log and return the elevated mode left entered, if any.
///
/// Panics on a double enter, on two modes entered at once, or on an exit
/// of a mode that is not entered. Reset exits every mode with a nonzero
/// count, including outranked ones that were never entered, so callers
/// replaying a reset pass `reset = true` to let those through.
fn replay(events: &[HookEvent], mut entered: Option<BoostMode>, reset: bool) -> Option<BoostMode> {
    for event in events {
        match *event {
            Enter(mode) => {
                assert_eq!(entered, None, "enter({mode}) while {entered:?} is entered");
                entered = Some(mode);
            }
            Exit(mode) if entered == Some(mode) => entered = None,
            Exit(mode) => {
                assert!(reset, "exit({mode}) while {entered:?} is entered");
            }
        }
    }
    entered
}

fn expected_effective(counts: &[u32; 4]) -> BoostMode {
    BoostMode::ELEVATED
        .into_iter()
        .find(|m| counts[m.index()] > 0)
        .unwrap_or(BoostMode::NoBoost)
}

/// Full throttle over conservative, then unwinding both
#[test]
fn test_priority_stepping_scenario() {
    let (engine, log) = harness();

    engine.request(BoostMode::FullThrottle).unwrap();
    assert_eq!(engine.query(), BoostMode::FullThrottle);
    assert_eq!(take(&log), vec![Enter(BoostMode::FullThrottle)]);

    engine.request(BoostMode::Conservative).unwrap();
    assert_eq!(engine.query(), BoostMode::FullThrottle);
    assert!(take(&log).is_empty(), "outranked request must not fire hooks");

    engine.release(BoostMode::FullThrottle).unwrap();
    assert_eq!(engine.query(), BoostMode::Conservative);
    assert_eq!(
        take(&log),
        vec![Exit(BoostMode::FullThrottle), Enter(BoostMode::Conservative)]
    );

    engine.release(BoostMode::Conservative).unwrap();
    assert_eq!(engine.query(), BoostMode::NoBoost);
    assert_eq!(take(&log), vec![Exit(BoostMode::Conservative)]);
}

/// Out-of-range commands are rejected without side effects
#[test]
fn test_invalid_mode_scenario() {
    let (engine, log) = harness();
    engine.dispatch(3).unwrap();
    take(&log);

    assert_eq!(engine.dispatch(5), Err(Error::InvalidMode(5)));
    assert_eq!(engine.dispatch(-5), Err(Error::InvalidMode(-5)));
    assert_eq!(engine.dispatch(i32::MIN), Err(Error::InvalidMode(i32::MIN)));

    assert_eq!(engine.query(), BoostMode::Restrained);
    assert_eq!(engine.requested(), 3);
    assert_eq!(engine.snapshot().refcounts, [0, 0, 0, 1]);
    assert!(take(&log).is_empty());
}

/// Reset drops every request, later releases are no-ops
#[test]
fn test_reset_scenario() {
    let (engine, log) = harness();

    engine.request(BoostMode::Conservative).unwrap();
    take(&log);

    engine.reset();
    assert_eq!(take(&log), vec![Exit(BoostMode::Conservative)]);
    assert_eq!(engine.snapshot().refcount(BoostMode::Conservative), 0);
    assert_eq!(engine.query(), BoostMode::NoBoost);

    engine.release(BoostMode::Conservative).unwrap();
    assert!(take(&log).is_empty());
    assert_eq!(engine.query(), BoostMode::NoBoost);
}

/// Reset with overlapping requests clears everything
#[test]
fn test_reset_completeness() {
    let (engine, log) = harness();
    for cmd in [3, 2, 2, 1, 3] {
        engine.dispatch(cmd).unwrap();
    }
    take(&log);

    engine.dispatch(0).unwrap();
    let events = take(&log);

    assert_eq!(engine.snapshot().refcounts, [0, 0, 0, 0]);
    assert_eq!(engine.query(), BoostMode::NoBoost);
    assert!(events.iter().all(|e| matches!(e, Exit(_))));
    // Conservative and restrained were outranked and never entered
    assert_eq!(replay(&events, Some(BoostMode::FullThrottle), true), None);
}

/// Two requests, one enter; one release, no exit
#[test]
fn test_double_activation() {
    let (engine, log) = harness();

    engine.request(BoostMode::Restrained).unwrap();
    engine.request(BoostMode::Restrained).unwrap();
    assert_eq!(engine.snapshot().refcount(BoostMode::Restrained), 2);
    assert_eq!(take(&log), vec![Enter(BoostMode::Restrained)]);

    engine.release(BoostMode::Restrained).unwrap();
    assert!(take(&log).is_empty());
    assert_eq!(engine.query(), BoostMode::Restrained);

    engine.release(BoostMode::Restrained).unwrap();
    assert_eq!(take(&log), vec![Exit(BoostMode::Restrained)]);
}

/// Releasing at zero fires nothing and changes nothing
#[test]
fn test_refcount_floor() {
    let (engine, log) = harness();

    engine.release(BoostMode::FullThrottle).unwrap();
    engine.dispatch(-2).unwrap();

    assert!(take(&log).is_empty());
    assert_eq!(engine.snapshot().refcounts, [0, 0, 0, 0]);
    assert_eq!(engine.query(), BoostMode::NoBoost);
}

/// The winner does not depend on request order
#[test]
fn test_priority_independent_of_order() {
    for order in [[1, 3], [3, 1]] {
        let (engine, _) = harness();
        for cmd in order {
            engine.dispatch(cmd).unwrap();
        }
        assert_eq!(engine.query(), BoostMode::FullThrottle);
    }
}

/// Releasing an outranked mode never touches the winner's hooks
#[test]
fn test_release_of_outranked_mode_is_silent() {
    let (engine, log) = harness();
    engine.dispatch(2).unwrap();
    engine.dispatch(3).unwrap();
    take(&log);

    engine.dispatch(-3).unwrap();
    assert!(take(&log).is_empty());
    assert_eq!(engine.query(), BoostMode::Conservative);
}

/// A guard outliving a reset must not release a later request
#[test]
fn test_stale_guard_after_reset() {
    let (engine, log) = harness();

    let stale = engine.acquire(BoostMode::Conservative).unwrap();
    engine.reset();
    engine.request(BoostMode::Conservative).unwrap();
    take(&log);

    drop(stale);

    assert_eq!(engine.query(), BoostMode::Conservative);
    assert_eq!(engine.snapshot().refcount(BoostMode::Conservative), 1);
    assert!(take(&log).is_empty(), "stale guard fired hooks");

    engine.release(BoostMode::Conservative).unwrap();
    assert_eq!(take(&log), vec![Exit(BoostMode::Conservative)]);
}

proptest! {
    /// Any command sequence, invalid values included, matches the model
    #[test]
    fn test_invariants_hold_for_any_command_sequence(
        commands in proptest::collection::vec(-5i32..=5, 0..200)
    ) {
        let (engine, log) = harness();
        let mut counts = [0u32; 4];
        let mut entered = None;

        for command in commands {
            let prev_effective = engine.query();
            let result = engine.dispatch(command);
            let events = take(&log);

            match command {
                0 => counts = [0; 4],
                c if c.unsigned_abs() > 3 => {
                    prop_assert_eq!(result, Err(Error::InvalidMode(c)));
                    prop_assert!(events.is_empty());
                    continue;
                }
                c if c > 0 => counts[c as usize] += 1,
                c => {
                    let slot = &mut counts[c.unsigned_abs() as usize];
                    *slot = slot.saturating_sub(1);
                }
            }

            let effective = expected_effective(&counts);
            prop_assert_eq!(result, Ok(effective));
            prop_assert_eq!(engine.query(), effective);
            prop_assert_eq!(engine.requested(), command);
            prop_assert_eq!(engine.snapshot().refcounts, counts);

            // At most one enter and one exit per mode, enter never follows enter
            for mode in BoostMode::ELEVATED {
                prop_assert!(events.iter().filter(|&&e| e == Enter(mode)).count() <= 1);
                prop_assert!(events.iter().filter(|&&e| e == Exit(mode)).count() <= 1);
            }
            for pair in events.windows(2) {
                if let Enter(_) = pair[1] {
                    prop_assert!(matches!(pair[0], Exit(_)), "enter after {:?}", pair[0]);
                }
            }

            // No hooks unless the effective mode moved
            if prev_effective == effective && command != 0 {
                prop_assert!(events.is_empty());
            }

            entered = replay(&events, entered, command == 0);
            prop_assert_eq!(entered, effective.is_elevated().then_some(effective));
        }
    }
}

/// Concurrent scoped requests leave the engine at baseline
#[test]
fn test_concurrent_guards() {
    const WRITERS: usize = 8;

    let (engine, log) = harness();
    let mirror = engine.mirror();
    let finished = AtomicUsize::new(0);
    let reader_started = AtomicBool::new(false);

    // Held until the reader has looked at the mirror at least once
    let hold = engine.acquire(BoostMode::FullThrottle).unwrap();

    let (seen, reads) = crossbeam::scope(|s| {
        for t in 0..WRITERS {
            let engine = &engine;
            let finished = &finished;
            s.spawn(move |_| {
                for i in 0..500usize {
                    let mode = BoostMode::ELEVATED[(t + i) % 3];
                    let _g = engine.acquire(mode).unwrap();
                    if i % 7 == 0 {
                        let _inner = engine.acquire(BoostMode::Restrained).unwrap();
                    }
                }
                finished.fetch_add(1, Ordering::Release);
            });
        }

        let finished = &finished;
        let mirror = &mirror;
        let started = &reader_started;
        let reader = s.spawn(move |_| {
            let mut seen = [false; 4];
            let mut reads = 0usize;
            loop {
                let (mode, requested) = mirror.load();
                assert!(
                    requested.unsigned_abs() <= 3,
                    "{mode} published with unknown command {requested}"
                );
                seen[mode.index()] = true;
                reads += 1;
                started.store(true, Ordering::Release);
                if finished.load(Ordering::Acquire) == WRITERS {
                    break;
                }
            }
            (seen, reads)
        });

        while !reader_started.load(Ordering::Acquire) {
            std::hint::spin_loop();
        }
        drop(hold);

        reader.join().unwrap()
    })
    .unwrap_or_else(|_| panic!("worker thread panicked"));

    assert!(reads > 0);
    assert!(
        seen[BoostMode::FullThrottle.index()],
        "reader never saw the held boost"
    );

    assert_eq!(engine.query(), BoostMode::NoBoost);
    assert_eq!(engine.snapshot().refcounts, [0, 0, 0, 0]);

    // Hooks run under the lock, so the log is the serialized order
    let events = take(&log);
    assert!(!events.is_empty());
    assert_eq!(replay(&events, None, false), None);
}
