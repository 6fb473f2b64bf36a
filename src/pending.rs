// Request/response bookkeeping for the message-passing compute worker.
//
// The worker answers tasks of the same kind in send order, so one FIFO of
// resolver handles per kind is enough to pair responses with callers. A
// worker that signals an error never recovers: `fail` hands every waiting
// handle back for rejection and the queues refuse new work from then on, so
// no caller is ever parked forever on a dead worker.

use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    InitialData,
    Palette,
}

#[derive(Debug)]
pub struct PendingQueues<F> {
    initial: VecDeque<F>,
    palette: VecDeque<F>,
    failed: bool,
}

impl<F> Default for PendingQueues<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> PendingQueues<F> {
    pub fn new() -> Self {
        Self {
            initial: VecDeque::new(),
            palette: VecDeque::new(),
            failed: false,
        }
    }

    fn queue_mut(&mut self, kind: TaskKind) -> &mut VecDeque<F> {
        match kind {
            TaskKind::InitialData => &mut self.initial,
            TaskKind::Palette => &mut self.palette,
        }
    }

    /// Enqueue a resolver for the next `kind` response. Returns the resolver
    /// untouched when the worker has already failed, so the caller can reject
    /// it immediately instead of parking it.
    pub fn push(&mut self, kind: TaskKind, resolver: F) -> Result<(), F> {
        if self.failed {
            return Err(resolver);
        }
        self.queue_mut(kind).push_back(resolver);
        Ok(())
    }

    /// Take the resolver paired with the oldest outstanding `kind` task.
    pub fn pop(&mut self, kind: TaskKind) -> Option<F> {
        self.queue_mut(kind).pop_front()
    }

    /// Mark the worker dead and drain every waiter for rejection.
    pub fn fail(&mut self) -> Vec<F> {
        self.failed = true;
        self.initial
            .drain(..)
            .chain(self.palette.drain(..))
            .collect()
    }

    pub fn has_failed(&self) -> bool {
        self.failed
    }
}
