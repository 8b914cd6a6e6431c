use super::{CompilerOracle, JavaLatch, JavaSignalFuture, PicklePromise};
use crate::model::CompileBundle;
use url::Url;

/// The full record handed to the injected compile operation for one node.
///
#[derive(Clone)]
pub struct CompileInputs {
    pub bundle: CompileBundle,

    /// Upstream pickle locations, in the deterministic depth-first order of
    /// the dependency DAG. Empty outside pipelined traversal.
    pub picklepath: Vec<Url>,

    /// This node's own pickle promise. A pipelined compiler completes it as
    /// soon as pickles are written; the scheduler settles it after the
    /// compile returns if the compiler never did.
    pub pickle_ready: PicklePromise,

    /// This node's own java-completion latch.
    pub complete_java: JavaLatch,

    /// Lazy fold of every transitive upstream's java signal. The late java
    /// phase must observe it before referencing upstream java symbols.
    pub transitive_java_signal: JavaSignalFuture,

    /// Java-completion latches of the upstreams that carry java sources.
    pub oracle: CompilerOracle,

    /// True iff pipelining is active for this traversal.
    pub separate_java_and_scala: bool,
}

impl CompileInputs {
    pub fn project_name(&self) -> &crate::model::ProjectName {
        self.bundle.project().name()
    }
}
