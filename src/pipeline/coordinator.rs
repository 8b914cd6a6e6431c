use super::{
    aggregate_signals, CompileInputs, CompilerOracle, JavaLatch, JavaOutcome, JavaSignal,
    JavaSignalFuture, PickleOutcome, PicklePromise, Promise, PromiseCut,
};
use crate::compiler::{Compile, CompileFlow};
use crate::graph::{settled, Ongoing, PartialCompileResult, PartialFailure, PartialSuccess};
use crate::model::{CompileBundle, ProjectName};
use crate::reporter::{CompileEvent, Reporter};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::*;
use url::Url;

/// The aggregated upstream context a node's compile is invoked with.
///
pub struct UpstreamInputs {
    pub picklepath: Vec<Url>,
    pub transitive_java_signal: JavaSignalFuture,
    pub oracle: CompilerOracle,
}

impl UpstreamInputs {
    /// The context of a leaf: nothing upstream, java trivially continues.
    ///
    pub fn empty() -> Self {
        Self {
            picklepath: vec![],
            transitive_java_signal: JavaSignal::ready_continue(),
            oracle: CompilerOracle::empty(),
        }
    }

    /// Assemble the context from the transitive partial successes of a
    /// node's dependencies, in their deterministic depth-first order.
    ///
    /// Every success's pickle promise has already resolved by the time the
    /// success materialised, so the awaits here settle immediately.
    ///
    pub async fn from_successes(successes: &[PartialSuccess]) -> Self {
        let mut picklepath = vec![];
        for success in successes {
            if let Some(PickleOutcome::Produced(url)) = success.pickle_ready.wait().await {
                picklepath.push(url);
            }
        }

        let transitive_java_signal = aggregate_signals(
            successes
                .iter()
                .map(|success| success.java_trigger.clone())
                .collect(),
        );

        let oracle = CompilerOracle::new(
            successes
                .iter()
                .filter(|success| success.bundle.has_java_sources())
                .map(|success| {
                    (
                        success.bundle.project().name().clone(),
                        success.complete_java.clone(),
                    )
                })
                .collect(),
        );

        Self {
            picklepath,
            transitive_java_signal,
            oracle,
        }
    }
}

/// Terminate a node without invoking its compile: no sources, or no
/// compiler instance. Both promises are completed synthetically so
/// downstream waiters settle immediately.
///
pub fn early_result(bundle: CompileBundle, flow: CompileFlow) -> PartialCompileResult {
    let pickle_ready: PicklePromise = Arc::new(Promise::new());
    pickle_ready.complete(PickleOutcome::Cut(PromiseCut::Completed));

    let complete_java: JavaLatch = Arc::new(Promise::new());
    complete_java.complete(if flow.is_ok() {
        JavaOutcome::Finished
    } else {
        JavaOutcome::Aborted
    });

    if flow.is_ok() {
        PartialCompileResult::Success(PartialSuccess {
            bundle,
            pickle_ready,
            complete_java,
            java_trigger: JavaSignal::ready_continue(),
            ongoing: settled(flow),
        })
    } else {
        PartialCompileResult::Failure(PartialFailure {
            bundle,
            cause: PromiseCut::Completed,
            ongoing: settled(flow),
        })
    }
}

/// Non-pipelined scheduling: the compile runs inside the node's scheduling
/// step and blocks it until finished. Promises are pre-completed so the
/// downstream optional-URI path needs no mode special-casing.
///
pub async fn run_direct<C>(
    compiler: &Arc<C>,
    bundle: CompileBundle,
    upstream: UpstreamInputs,
    reporter: &Reporter,
) -> PartialCompileResult
where
    C: Compile + ?Sized,
{
    let pickle_ready: PicklePromise = Arc::new(Promise::new());
    pickle_ready.complete(PickleOutcome::Cut(PromiseCut::Completed));

    let complete_java: JavaLatch = Arc::new(Promise::new());
    complete_java.complete(JavaOutcome::Finished);

    let name = bundle.project().name().clone();
    reporter.report(CompileEvent::CompileStarted {
        project: name.clone(),
        pipelined: false,
    });

    let inputs = CompileInputs {
        bundle: bundle.clone(),
        picklepath: upstream.picklepath,
        pickle_ready: pickle_ready.clone(),
        complete_java: complete_java.clone(),
        transitive_java_signal: upstream.transitive_java_signal,
        oracle: upstream.oracle,
        separate_java_and_scala: false,
    };

    let flow = invoke(compiler, inputs).await;

    if flow.is_ok() {
        PartialCompileResult::Success(PartialSuccess {
            bundle,
            pickle_ready,
            complete_java,
            java_trigger: JavaSignal::ready_continue(),
            ongoing: settled(flow),
        })
    } else {
        debug!("compilation of '{name}' failed");
        PartialCompileResult::Failure(PartialFailure {
            bundle,
            cause: PromiseCut::Failed,
            ongoing: settled(flow),
        })
    }
}

/// Pipelined scheduling: the compile is forked onto the runtime and the
/// node's partial result materialises as soon as its pickle promise
/// resolves, letting parents start while the backend work continues.
///
pub async fn run_pipelined<C>(
    compiler: &Arc<C>,
    bundle: CompileBundle,
    upstream: UpstreamInputs,
    reporter: &Reporter,
) -> PartialCompileResult
where
    C: Compile + ?Sized,
{
    let pickle_ready: PicklePromise = Arc::new(Promise::new());
    let complete_java: JavaLatch = Arc::new(Promise::new());

    let name = bundle.project().name().clone();
    let java_only = bundle.java_only();
    reporter.report(CompileEvent::CompileStarted {
        project: name.clone(),
        pipelined: true,
    });

    let inputs = CompileInputs {
        bundle: bundle.clone(),
        picklepath: upstream.picklepath,
        pickle_ready: pickle_ready.clone(),
        complete_java: complete_java.clone(),
        transitive_java_signal: upstream.transitive_java_signal,
        oracle: upstream.oracle,
        separate_java_and_scala: true,
    };

    let handle = tokio::spawn({
        let compiler = compiler.clone();
        let pickle_ready = pickle_ready.clone();
        let complete_java = complete_java.clone();
        let reporter = reporter.clone();
        let name = name.clone();
        async move {
            let flow = invoke(&compiler, inputs).await;
            settle_promises(&name, java_only, &flow, &pickle_ready, &complete_java, &reporter)
                .await;
            flow
        }
    });

    let ongoing: Ongoing = async move {
        match handle.await {
            Ok(flow) => flow,
            Err(err) if err.is_panic() => {
                CompileFlow::failed(anyhow::anyhow!("compile task panicked: {err}"))
            }
            Err(_) => CompileFlow::Cancelled,
        }
    }
    .boxed()
    .shared();

    let java_trigger = java_trigger(&complete_java, name);

    // `None` means the forked task was torn down before settlement could
    // run; downstream treats it like a failed producer.
    match pickle_ready.wait().await {
        Some(PickleOutcome::Cut(PromiseCut::Failed)) | None => {
            PartialCompileResult::Failure(PartialFailure {
                bundle,
                cause: PromiseCut::Failed,
                ongoing,
            })
        }
        _ => PartialCompileResult::Success(PartialSuccess {
            bundle,
            pickle_ready,
            complete_java,
            java_trigger,
            ongoing,
        }),
    }
}

/// The memoised java signal a node contributes to its downstreams: continue
/// on a finished java pass, fail-fast carrying this project's name
/// otherwise.
///
pub fn java_trigger(latch: &JavaLatch, project: ProjectName) -> JavaSignalFuture {
    let wait = latch.wait();
    async move {
        match wait.await {
            Some(JavaOutcome::Finished) => JavaSignal::ContinueCompilation,
            _ => JavaSignal::FailFastCompilation(vec![project]),
        }
    }
    .boxed()
    .shared()
}

async fn invoke<C>(compiler: &Arc<C>, inputs: CompileInputs) -> CompileFlow
where
    C: Compile + ?Sized,
{
    match AssertUnwindSafe(compiler.compile(inputs)).catch_unwind().await {
        Ok(flow) => flow,
        Err(panic) => CompileFlow::failed(anyhow::anyhow!(
            "compile panicked: {}",
            panic_message(&panic)
        )),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    eprintln!("DEBUG typeid {:?} str_typeid {:?}", panic.type_id(), std::any::TypeId::of::<&'static str>());
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "opaque panic payload".to_string()
    }
}

/// Post-compile promise settlement. Guarantees both promises reach a
/// terminal state in bounded time after the compile operation returns, so
/// downstream waiters never deadlock.
///
async fn settle_promises(
    name: &ProjectName,
    java_only: bool,
    flow: &CompileFlow,
    pickle_ready: &PicklePromise,
    complete_java: &JavaLatch,
    reporter: &Reporter,
) {
    if pickle_ready.is_completed() {
        match pickle_ready.wait().await {
            Some(PickleOutcome::Produced(url)) => {
                reporter.report(CompileEvent::PicklesReady {
                    project: name.clone(),
                    uri: url.to_string(),
                });
            }
            Some(PickleOutcome::Empty) if !java_only => {
                reporter.report(CompileEvent::PipeliningNotUsed {
                    project: name.clone(),
                });
            }
            _ => {}
        }
    } else if flow.is_not_ok() {
        pickle_ready.complete(PickleOutcome::Cut(PromiseCut::Failed));
    } else {
        pickle_ready.complete(PickleOutcome::Cut(PromiseCut::Completed));
        if !java_only {
            reporter.report(CompileEvent::PipeliningNotUsed {
                project: name.clone(),
            });
        }
    }

    if !complete_java.is_completed() {
        complete_java.complete(if flow.is_ok() {
            JavaOutcome::Finished
        } else {
            JavaOutcome::Aborted
        });
    }
}
