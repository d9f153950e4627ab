use std::collections::VecDeque;

use crate::frame::{Control, Frame, Priority, StreamId};

/// Orders outbound frames: an urgent queue for session-health frames, then
/// one FIFO per priority tier. Lower tiers are served strictly first and may
/// starve higher-numbered ones.
#[derive(Debug)]
pub(crate) struct Prioritize {
    urgent: VecDeque<Frame>,
    tiers: Vec<VecDeque<(StreamId, Frame)>>,
    buffered_data: usize,
}

/// What [`Prioritize::cancel`] threw away.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Cancelled {
    /// DATA payload bytes removed.
    pub data_bytes: usize,
    /// The stream's SYN_STREAM had not left yet.
    pub syn_dropped: bool,
}

impl Prioritize {
    pub fn new() -> Prioritize {
        Prioritize {
            urgent: VecDeque::new(),
            tiers: (0..Priority::MAX_TIERS).map(|_| VecDeque::new()).collect(),
            buffered_data: 0,
        }
    }

    pub fn enqueue(&mut self, stream_id: StreamId, priority: Priority, frame: Frame) {
        let span = tracing::trace_span!("Prioritize::enqueue", ?stream_id, tier = priority.tier());
        let _e = span.enter();

        if let Frame::Data(ref data) = frame {
            self.buffered_data += data.payload().len();
        }
        tracing::trace!(?frame, "queued");
        self.tiers[priority.queue_index()].push_back((stream_id, frame));
    }

    pub fn enqueue_urgent(&mut self, frame: Frame) {
        tracing::trace!(?frame, "queued urgent");
        self.urgent.push_back(frame);
    }

    pub fn next(&mut self) -> Option<Frame> {
        if let Some(frame) = self.urgent.pop_front() {
            return Some(frame);
        }

        let (_, frame) = self
            .tiers
            .iter_mut()
            .find(|queue| !queue.is_empty())
            .and_then(|queue| queue.pop_front())?;

        if let Frame::Data(ref data) = frame {
            self.buffered_data -= data.payload().len();
        }
        Some(frame)
    }

    /// Drops everything still queued for `stream_id`.
    pub fn cancel(&mut self, stream_id: StreamId) -> Cancelled {
        let mut cancelled = Cancelled::default();

        for queue in &mut self.tiers {
            queue.retain(|(id, frame)| {
                if *id != stream_id {
                    return true;
                }
                match *frame {
                    Frame::Data(ref data) => cancelled.data_bytes += data.payload().len(),
                    Frame::Control {
                        body: Control::SynStream(_),
                        ..
                    } => cancelled.syn_dropped = true,
                    _ => {}
                }
                false
            });
        }

        self.buffered_data -= cancelled.data_bytes;
        if cancelled != Cancelled::default() {
            tracing::trace!(?stream_id, ?cancelled, "cancelled queued frames");
        }
        cancelled
    }

    /// Drops every stream frame, leaving the urgent queue alone.
    pub fn clear_streams(&mut self) {
        for queue in &mut self.tiers {
            queue.clear();
        }
        self.buffered_data = 0;
    }

    /// DATA payload bytes waiting in the tier queues.
    pub fn buffered_data(&self) -> usize {
        self.buffered_data
    }

    pub fn is_empty(&self) -> bool {
        self.urgent.is_empty() && self.tiers.iter().all(|queue| queue.is_empty())
    }
}
