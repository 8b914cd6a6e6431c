use crate::compiler::CompileFlow;
use crate::model::{CompileBundle, Dag, NodeId, ProjectName};
use crate::pipeline::{JavaLatch, JavaSignalFuture, PicklePromise, PromiseCut};
use futures::future::{self, BoxFuture, Shared};
use futures::FutureExt;
use fxhash::FxHashSet;
use std::sync::Arc;

/// A handle onto a node's final compile result. Cheap to clone; every
/// observer sees the single memoised outcome.
pub type Ongoing = Shared<BoxFuture<'static, CompileFlow>>;

/// Wrap an already-known result as an ongoing handle.
///
pub fn settled(flow: CompileFlow) -> Ongoing {
    future::ready(flow).boxed().shared()
}

/// A node that was scheduled successfully. Available to parents as soon as
/// the node's pickle promise resolves — its backend compilation may still
/// be running behind `ongoing`.
///
#[derive(Clone)]
pub struct PartialSuccess {
    pub bundle: CompileBundle,
    pub pickle_ready: PicklePromise,
    pub complete_java: JavaLatch,
    pub java_trigger: JavaSignalFuture,
    pub ongoing: Ongoing,
}

impl std::fmt::Debug for PartialSuccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartialSuccess")
            .field("bundle", &self.bundle)
            .field("pickle_ready", &self.pickle_ready)
            .field("complete_java", &self.complete_java)
            .finish()
    }
}

/// A node that failed, or was never compiled because an upstream failed.
///
#[derive(Clone)]
pub struct PartialFailure {
    pub bundle: CompileBundle,
    pub cause: PromiseCut,
    pub ongoing: Ongoing,
}

impl std::fmt::Debug for PartialFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartialFailure")
            .field("bundle", &self.bundle)
            .field("cause", &self.cause)
            .finish()
    }
}

impl PartialFailure {
    /// Synthesise the failure for a node whose direct dependencies include
    /// at least one blocked or failed project. The node is not compiled.
    ///
    pub fn blocked(bundle: CompileBundle, blocking: Vec<ProjectName>) -> Self {
        Self {
            bundle,
            cause: PromiseCut::Blocked,
            ongoing: settled(CompileFlow::Blocked { blocking }),
        }
    }

    pub fn project_name(&self) -> &ProjectName {
        self.bundle.project().name()
    }
}

/// Per-node outcome usable by downstream scheduling before the node's full
/// compilation has finished.
///
#[derive(Clone, Debug)]
pub enum PartialCompileResult {
    /// A passthrough node: an aggregate with no project of its own.
    Empty,

    Success(PartialSuccess),

    Failure(PartialFailure),

    /// Aggregation of sibling failures under an aggregate node.
    Failures(Vec<PartialFailure>),
}

/// The result DAG produced by a traversal; same shape as the input DAG.
pub type ResultDag = Dag<PartialCompileResult>;

impl PartialCompileResult {
    fn blocking_failure(&self) -> Option<&PartialFailure> {
        match self {
            PartialCompileResult::Empty | PartialCompileResult::Success(_) => None,
            PartialCompileResult::Failure(failure) => Some(failure),
            PartialCompileResult::Failures(failures) => failures.first(),
        }
    }

    /// The shallow blocked predicate: only the root of each sub-DAG is
    /// examined, because blocking is propagated upward at construction
    /// time. Returns the winning failure when the sub-DAG is blocked.
    ///
    pub fn blocked_root(dag: &ResultDag) -> Option<&PartialFailure> {
        match dag {
            Dag::Leaf { value, .. } | Dag::Parent { value, .. } => value.blocking_failure(),
            Dag::Aggregate { children, .. } => {
                children.iter().find_map(|child| Self::blocked_root(child))
            }
        }
    }
}

/// Collect every transitive `PartialSuccess` below the given dependency
/// results, in deterministic pre-order with shared sub-DAGs visited once.
/// This order is the downstream picklepath order.
///
pub fn transitive_successes(deps: &[Arc<ResultDag>]) -> Vec<PartialSuccess> {
    let mut visited = FxHashSet::default();
    let mut successes = vec![];
    for dep in deps {
        collect_successes(dep, &mut visited, &mut successes);
    }
    successes
}

fn collect_successes(
    node: &Arc<ResultDag>,
    visited: &mut FxHashSet<NodeId>,
    successes: &mut Vec<PartialSuccess>,
) {
    if !visited.insert(node.id()) {
        return;
    }
    if let Some(PartialCompileResult::Success(success)) = node.value() {
        successes.push(success.clone());
    }
    for child in node.children() {
        collect_successes(child, visited, successes);
    }
}

/// Gather the failures among an aggregate's children, flattening nested
/// `Failures` so every blocking project appears exactly once.
///
pub fn failed_children(children: &[Arc<ResultDag>]) -> Vec<PartialFailure> {
    let mut failures = vec![];
    for child in children {
        match child.value() {
            Some(PartialCompileResult::Failure(failure)) => failures.push(failure.clone()),
            Some(PartialCompileResult::Failures(nested)) => failures.extend(nested.iter().cloned()),
            _ => {}
        }
    }
    failures
}
