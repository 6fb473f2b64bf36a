// Host-side tests for the controller lifecycle state machine and the
// process-wide single-field flag.
// The main crate is wasm-only, so we include the pure-Rust module directly.

#![allow(dead_code)]
mod lifecycle {
    include!("../src/lifecycle.rs");
}

use lifecycle::*;

// One test covers the whole acquire/release protocol: the flag is process
// state, so splitting it across #[test] functions would race.
#[test]
fn only_one_field_holds_the_slot_at_a_time() {
    assert!(try_acquire());
    assert!(!try_acquire(), "second mount must be refused");
    release();
    assert!(try_acquire(), "slot is reusable after release");
    release();
}

#[test]
fn happy_path_walks_init_running_teardown() {
    let mut lc = Lifecycle::new();
    assert_eq!(lc.phase(), Phase::Uninitialized);
    assert!(lc.begin_init());
    assert!(!lc.begin_init(), "init is one-shot");
    assert!(lc.mark_running());
    assert_eq!(lc.phase(), Phase::Running);
    assert!(lc.begin_teardown());
    assert!(!lc.begin_teardown(), "teardown is one-shot");
    lc.finish_teardown();
    assert_eq!(lc.phase(), Phase::Destroyed);
}

#[test]
fn hidden_pauses_and_visible_resumes_exactly_once() {
    let mut lc = Lifecycle::new();
    lc.begin_init();
    lc.mark_running();
    assert!(lc.on_hidden(), "first hide cancels the frame callback");
    assert_eq!(lc.phase(), Phase::Paused);
    assert!(!lc.on_hidden(), "repeat hide events are no-ops");
    assert!(lc.on_visible(), "first show re-arms the loop");
    assert_eq!(lc.phase(), Phase::Running);
    assert!(!lc.on_visible(), "repeat show events are no-ops");
}

#[test]
fn visibility_events_are_ignored_outside_running_or_paused() {
    let mut lc = Lifecycle::new();
    assert!(!lc.on_hidden());
    assert!(!lc.on_visible());
    lc.begin_init();
    assert!(!lc.on_hidden(), "still initializing; nothing scheduled yet");
    lc.mark_running();
    lc.begin_teardown();
    assert!(!lc.on_hidden());
    assert!(!lc.on_visible());
    assert!(!lc.mark_running(), "a torn-down field never restarts");
}

#[test]
fn teardown_is_reachable_from_every_live_phase() {
    for advance in 0..3 {
        let mut lc = Lifecycle::new();
        lc.begin_init();
        if advance >= 1 {
            lc.mark_running();
        }
        if advance >= 2 {
            lc.on_hidden();
        }
        assert!(lc.is_alive());
        assert!(lc.begin_teardown());
        assert!(!lc.is_alive(), "late async arrivals must be dropped");
        assert!(!lc.is_running());
    }
}

#[test]
fn paused_fields_are_alive_but_not_running() {
    let mut lc = Lifecycle::new();
    lc.begin_init();
    lc.mark_running();
    lc.on_hidden();
    assert!(lc.is_alive());
    assert!(!lc.is_running());
}
