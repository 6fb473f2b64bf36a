// Host-side tests for worker request/response bookkeeping.
// The main crate is wasm-only, so we include the pure-Rust module directly.

#![allow(dead_code)]
mod pending {
    include!("../src/pending.rs");
}

use pending::{PendingQueues, TaskKind};

#[test]
fn responses_pair_with_resolvers_in_send_order() {
    let mut q: PendingQueues<&str> = PendingQueues::new();
    q.push(TaskKind::InitialData, "spark").unwrap();
    q.push(TaskKind::InitialData, "orb").unwrap();
    q.push(TaskKind::Palette, "palette").unwrap();
    assert_eq!(q.pop(TaskKind::InitialData), Some("spark"));
    assert_eq!(q.pop(TaskKind::Palette), Some("palette"));
    assert_eq!(q.pop(TaskKind::InitialData), Some("orb"));
    assert_eq!(q.pop(TaskKind::InitialData), None);
    assert_eq!(q.pop(TaskKind::Palette), None);
}

#[test]
fn worker_failure_drains_every_waiter_for_rejection() {
    // A worker that dies after construction (e.g. a blob: script refused by
    // CSP) emits an error event and never answers. Every parked caller must
    // be handed back so its future rejects instead of pending forever.
    let mut q: PendingQueues<u32> = PendingQueues::new();
    q.push(TaskKind::InitialData, 1).unwrap();
    q.push(TaskKind::InitialData, 2).unwrap();
    q.push(TaskKind::Palette, 3).unwrap();
    let drained = q.fail();
    assert_eq!(drained.len(), 3);
    assert!(q.has_failed());
    assert_eq!(q.pop(TaskKind::InitialData), None);
    assert_eq!(q.pop(TaskKind::Palette), None);
}

#[test]
fn failed_queues_refuse_new_work() {
    let mut q: PendingQueues<u32> = PendingQueues::new();
    q.fail();
    // The resolver comes back so the caller can reject it immediately.
    assert_eq!(q.push(TaskKind::Palette, 9), Err(9));
    assert_eq!(q.push(TaskKind::InitialData, 10), Err(10));
    assert!(q.fail().is_empty(), "repeat failure has nothing left to drain");
}
