use std::collections::VecDeque;

use crate::event::OpenRequest;
use crate::frame::{HeaderBlock, Priority};

/// Local stream opens waiting for a concurrency slot. One FIFO per priority
/// tier; lower tiers open first.
#[derive(Debug)]
pub(crate) struct OpenQueue {
    tiers: Vec<VecDeque<PendingOpen>>,
    next_request: u64,
}

#[derive(Debug)]
pub(crate) struct PendingOpen {
    pub request: OpenRequest,
    pub priority: Priority,
    pub headers: HeaderBlock,
    pub fin: bool,
}

impl OpenQueue {
    pub fn new() -> OpenQueue {
        OpenQueue {
            tiers: (0..Priority::MAX_TIERS).map(|_| VecDeque::new()).collect(),
            next_request: 0,
        }
    }

    pub fn push(&mut self, priority: Priority, headers: HeaderBlock, fin: bool) -> OpenRequest {
        let request = OpenRequest(self.next_request);
        self.next_request += 1;

        tracing::trace!(?request, tier = priority.tier(), "open queued");
        self.tiers[priority.queue_index()].push_back(PendingOpen {
            request,
            priority,
            headers,
            fin,
        });
        request
    }

    pub fn pop(&mut self) -> Option<PendingOpen> {
        self.tiers
            .iter_mut()
            .find(|queue| !queue.is_empty())
            .and_then(|queue| queue.pop_front())
    }

    /// Removes one waiting request. Returns false when it is not queued.
    pub fn cancel(&mut self, request: OpenRequest) -> bool {
        for queue in &mut self.tiers {
            if let Some(pos) = queue.iter().position(|open| open.request == request) {
                queue.remove(pos);
                return true;
            }
        }
        false
    }

    /// Empties the queue, highest priority first.
    pub fn drain(&mut self) -> Vec<OpenRequest> {
        self.tiers
            .iter_mut()
            .flat_map(|queue| queue.drain(..))
            .map(|open| open.request)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tiers.iter().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.iter().all(VecDeque::is_empty)
    }
}
