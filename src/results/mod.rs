//! # Result collection
//!
//! After a traversal yields its result DAG, the collector folds it
//! depth-first, awaits every node's final compile result, feeds the
//! build-wide cache, and reports the aggregate exit status.
//!

use crate::compiler::CompileFlow;
use crate::graph::{PartialCompileResult, PartialFailure, ResultDag};
use crate::model::{CompileBundle, ProjectName};
use crate::reporter::{CompileEvent, Reporter};
use dashmap::DashMap;
use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::*;

/// Aggregate status of one compile invocation.
///
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum ExitStatus {
    #[default]
    Ok,
    CompilationError,
    /// Surfaced by the command-line layer, never by the scheduler itself.
    InvalidCommandLineOption,
}

impl ExitStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, ExitStatus::Ok)
    }
}

/// The pairing of a bundle with its compiler's terminal result.
///
#[derive(Clone)]
pub struct FinalCompileResult {
    pub bundle: CompileBundle,
    pub flow: CompileFlow,
}

impl FinalCompileResult {
    pub fn project_name(&self) -> &ProjectName {
        self.bundle.project().name()
    }
}

impl std::fmt::Debug for FinalCompileResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinalCompileResult")
            .field("project", self.project_name())
            .field("flow", &self.flow)
            .finish()
    }
}

/// Build-wide result cache. Read-only during a traversal; fed by the
/// collector afterwards. Last-successful lookups keep reflecting the most
/// recent `Ok` outcome per project even after later failures.
///
#[derive(Debug, Default)]
pub struct ResultsCache {
    latest: DashMap<ProjectName, FinalCompileResult>,
    successful: DashMap<ProjectName, FinalCompileResult>,
}

impl ResultsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, result: FinalCompileResult) {
        let name = result.project_name().clone();
        if result.flow.is_ok() {
            self.successful.insert(name.clone(), result.clone());
        }
        self.latest.insert(name, result);
    }

    pub fn latest(&self, project: &ProjectName) -> Option<FinalCompileResult> {
        self.latest.get(project).map(|r| r.value().clone())
    }

    pub fn last_successful(&self, project: &ProjectName) -> Option<FinalCompileResult> {
        self.successful.get(project).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The subset of `projects` whose most recent recorded outcome is a
    /// failure.
    ///
    pub fn previously_failed<'a>(
        &self,
        projects: impl Iterator<Item = &'a ProjectName>,
    ) -> Vec<ProjectName> {
        projects
            .filter(|name| {
                self.latest(name)
                    .map(|result| result.flow.is_not_ok())
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }
}

/// Await every node's final result, feed the cache, and compute the
/// aggregate status. Any failure with a captured error is logged with its
/// message; the full payload goes to trace level.
///
pub async fn collect(
    result: &Arc<ResultDag>,
    cache: &ResultsCache,
    reporter: &Reporter,
) -> ExitStatus {
    let mut seen: FxHashSet<ProjectName> = FxHashSet::default();
    let mut finals: Vec<FinalCompileResult> = vec![];

    for node in result.dfs() {
        match node.value() {
            None | Some(PartialCompileResult::Empty) => {}
            Some(PartialCompileResult::Success(success)) => {
                if seen.insert(success.bundle.project().name().clone()) {
                    finals.push(FinalCompileResult {
                        bundle: success.bundle.clone(),
                        flow: success.ongoing.clone().await,
                    });
                }
            }
            Some(PartialCompileResult::Failure(failure)) => {
                if let Some(result) = await_failure(failure, &mut seen).await {
                    finals.push(result);
                }
            }
            Some(PartialCompileResult::Failures(failures)) => {
                for failure in failures {
                    if let Some(result) = await_failure(failure, &mut seen).await {
                        finals.push(result);
                    }
                }
            }
        }
    }

    let mut status = ExitStatus::Ok;
    for result in finals {
        if result.flow.is_not_ok() {
            status = ExitStatus::CompilationError;
            report_failure(&result, reporter);
        }
        cache.record(result);
    }
    status
}

async fn await_failure(
    failure: &PartialFailure,
    seen: &mut FxHashSet<ProjectName>,
) -> Option<FinalCompileResult> {
    if !seen.insert(failure.project_name().clone()) {
        return None;
    }
    Some(FinalCompileResult {
        bundle: failure.bundle.clone(),
        flow: failure.ongoing.clone().await,
    })
}

fn report_failure(result: &FinalCompileResult, reporter: &Reporter) {
    let project = result.project_name().clone();
    match &result.flow {
        CompileFlow::Failed { error } => {
            if reporter.config().stack_traces() {
                error!("compilation of '{project}' failed: {error:?}");
            }
            trace!("failure payload for '{project}': {error:#?}");
            reporter.report(CompileEvent::ProjectFailed {
                project,
                message: format!("{error:#}"),
            });
        }
        CompileFlow::GlobalError { message } => {
            reporter.report(CompileEvent::ProjectFailed {
                project,
                message: message.clone(),
            });
        }
        CompileFlow::Cancelled => {
            reporter.report(CompileEvent::ProjectFailed {
                project,
                message: "compilation was cancelled".to_string(),
            });
        }
        // Blocked nodes were reported when they were synthesised.
        CompileFlow::Blocked { .. } | CompileFlow::Completed => {}
    }
}
