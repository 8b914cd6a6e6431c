use super::{JavaLatch, JavaOutcome};
use crate::model::ProjectName;

/// Per-invocation view of the upstream java compilations a compiler may
/// want to reference symbols from.
///
/// Only upstreams that actually carry java sources appear here. The
/// compiler probes or awaits an entry before resolving java symbols from
/// that upstream.
///
#[derive(Debug, Default, Clone)]
pub struct CompilerOracle {
    entries: Vec<(ProjectName, JavaLatch)>,
}

impl CompilerOracle {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(entries: Vec<(ProjectName, JavaLatch)>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn projects(&self) -> impl Iterator<Item = &ProjectName> {
        self.entries.iter().map(|(name, _)| name)
    }

    /// The latch for one upstream, if it has java sources.
    ///
    pub fn latch(&self, project: &ProjectName) -> Option<&JavaLatch> {
        self.entries
            .iter()
            .find(|(name, _)| name == project)
            .map(|(_, latch)| latch)
    }

    /// Non-blocking probe: has this upstream's java compilation reached a
    /// terminal state yet?
    ///
    pub fn is_settled(&self, project: &ProjectName) -> bool {
        self.latch(project)
            .map(|latch| latch.is_completed())
            .unwrap_or(false)
    }

    /// Await one upstream's java compilation. `None` when the upstream is
    /// unknown to the oracle or its compile was cancelled.
    ///
    pub async fn await_java(&self, project: &ProjectName) -> Option<JavaOutcome> {
        match self.latch(project) {
            Some(latch) => latch.wait().await,
            None => None,
        }
    }
}
