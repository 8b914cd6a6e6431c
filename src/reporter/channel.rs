use super::event::CompileEvent;
use crossbeam::deque::{Injector, Steal};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Lock-free event bus shared by every scheduling step of one invocation.
///
/// Senders never block. Every event is stamped with a monotonic sequence
/// number at send time, so a consumer can hand events out in exact
/// insertion order no matter how its steals from the bus interleave with
/// concurrent sends — which is what a protocol logger on the other end
/// relies on.
///
#[derive(Clone, Debug, Default)]
pub struct ReporterChannel {
    inner: Arc<ChannelInner>,
}

#[derive(Debug, Default)]
struct ChannelInner {
    bus: Injector<(u64, CompileEvent)>,
    sequence: AtomicU64,
}

impl ReporterChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.bus.is_empty()
    }

    pub fn send(&self, event: CompileEvent) {
        let sequence = self.inner.sequence.fetch_add(1, Ordering::Relaxed);
        self.inner.bus.push((sequence, event));
    }

    pub fn consumer(&self) -> ReporterConsumer {
        ReporterConsumer {
            channel: self.clone(),
            staged: BTreeMap::new(),
        }
    }
}

/// One consumer's ordered view of the channel.
///
/// Stolen events are staged by sequence number and released in ascending
/// order, so a consumer observes the exact send order even when it drains
/// while producers are still running.
///
pub struct ReporterConsumer {
    channel: ReporterChannel,
    staged: BTreeMap<u64, CompileEvent>,
}

impl ReporterConsumer {
    fn stage(&mut self) {
        loop {
            match self.channel.inner.bus.steal() {
                Steal::Success((sequence, event)) => {
                    self.staged.insert(sequence, event);
                }
                Steal::Retry => continue,
                Steal::Empty => break,
            }
        }
    }

    /// The next event in send order, if any has arrived.
    ///
    pub fn try_next(&mut self) -> Option<CompileEvent> {
        self.stage();
        self.staged.pop_first().map(|(_, event)| event)
    }

    pub fn is_empty(&mut self) -> bool {
        self.stage();
        self.staged.is_empty()
    }

    /// Everything currently on the channel, in send order.
    ///
    pub fn drain(&mut self) -> Vec<CompileEvent> {
        self.stage();
        std::mem::take(&mut self.staged).into_values().collect()
    }
}

impl Iterator for ReporterConsumer {
    type Item = CompileEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.try_next()
    }
}
