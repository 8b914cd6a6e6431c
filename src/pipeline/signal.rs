use crate::model::ProjectName;
use futures::future::{self, BoxFuture, Shared};
use futures::FutureExt;

/// Signal gating the late java phase of a downstream compile.
///
/// A downstream node folds the signals of **all** its transitive upstreams
/// into one before touching java symbols: any upstream failure turns the
/// fold into a fail-fast carrying every failed project name.
///
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum JavaSignal {
    ContinueCompilation,
    FailFastCompilation(Vec<ProjectName>),
}

/// A memoised, awaitable java signal: every downstream observer of the
/// same upstream sees a single outcome.
pub type JavaSignalFuture = Shared<BoxFuture<'static, JavaSignal>>;

impl JavaSignal {
    /// Commutative, associative combination with `ContinueCompilation` as
    /// the identity. Fail-fast lists concatenate; their order is not
    /// observable.
    ///
    pub fn merge(self, other: JavaSignal) -> JavaSignal {
        match (self, other) {
            (JavaSignal::ContinueCompilation, other) => other,
            (signal, JavaSignal::ContinueCompilation) => signal,
            (JavaSignal::FailFastCompilation(mut ps), JavaSignal::FailFastCompilation(qs)) => {
                ps.extend(qs);
                JavaSignal::FailFastCompilation(ps)
            }
        }
    }

    pub fn is_continue(&self) -> bool {
        matches!(self, JavaSignal::ContinueCompilation)
    }

    /// A pre-resolved continue signal, used for leaves and for non-pipelined
    /// traversal where every upstream has already fully compiled.
    ///
    pub fn ready_continue() -> JavaSignalFuture {
        future::ready(JavaSignal::ContinueCompilation).boxed().shared()
    }
}

/// Fold upstream java signals into one. All upstreams are awaited — the
/// fold never short-circuits, so no pending promise is leaked.
///
pub fn aggregate_signals(triggers: Vec<JavaSignalFuture>) -> JavaSignalFuture {
    async move {
        future::join_all(triggers)
            .await
            .into_iter()
            .fold(JavaSignal::ContinueCompilation, JavaSignal::merge)
    }
    .boxed()
    .shared()
}
