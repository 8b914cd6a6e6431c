//! # DAG walker
//!
//! Memoised recursive traversal of the project DAG. Each sub-DAG is
//! scheduled at most once per invocation and its result shared by every
//! parent; blocking decisions are folded upward at construction time so
//! parents never need to look deeper than the root of a dependency's
//! result.
//!

mod partial;

pub use partial::*;

use crate::compiler::{Compile, Setup, EMIT_PICKLES_OPTION};
use crate::model::{CompileBundle, Dag, NodeId, Project, ProjectName};
use crate::pipeline::{early_result, run_direct, run_pipelined, UpstreamInputs};
use crate::reporter::{CompileEvent, Reporter};
use dashmap::DashMap;
use futures::future::{self, BoxFuture, Shared};
use futures::FutureExt;
use std::sync::Arc;
use tracing::*;

/// A memoised scheduling computation for one sub-DAG.
pub type ScheduledNode = Shared<BoxFuture<'static, Arc<ResultDag>>>;

/// Walks a project DAG and schedules a compile for every reachable
/// project, threading partial results downstream.
///
/// The visited map is keyed on node identity: two structurally equal
/// sub-DAGs with distinct identities are scheduled independently, and a
/// sub-DAG shared by several parents is scheduled once.
///
pub struct Walker<S, C> {
    setup: Arc<S>,
    compiler: Arc<C>,
    pipeline: bool,
    reporter: Reporter,
    visited: DashMap<NodeId, ScheduledNode>,
}

impl<S, C> Walker<S, C>
where
    S: Setup + 'static,
    C: Compile,
{
    pub fn new(
        setup: Arc<S>,
        compiler: Arc<C>,
        pipeline: bool,
        reporter: Reporter,
    ) -> Arc<Self> {
        Arc::new(Self {
            setup,
            compiler,
            pipeline,
            reporter,
            visited: DashMap::new(),
        })
    }

    /// The lazy scheduling computation for `dag`. Nothing runs until the
    /// returned computation is driven.
    ///
    #[instrument(name = "Walker::traverse", skip(self, dag), fields(node = %dag.id()))]
    pub fn traverse(self: Arc<Self>, dag: Arc<Dag<Project>>) -> ScheduledNode {
        if let Some(scheduled) = self.visited.get(&dag.id()) {
            return scheduled.clone();
        }

        let computation = {
            let this = self.clone();
            let node = dag.clone();
            async move { this.walk(node).await }.boxed().shared()
        };

        // The entry API arbitrates concurrent recursions reaching the same
        // node: the losing computation is dropped unpolled.
        self.visited
            .entry(dag.id())
            .or_insert(computation)
            .value()
            .clone()
    }

    async fn walk(self: Arc<Self>, node: Arc<Dag<Project>>) -> Arc<ResultDag> {
        match &*node {
            Dag::Leaf { value: project, .. } => {
                let partial = self.schedule_project(project, &[]).await;
                Dag::leaf(partial)
            }

            Dag::Parent {
                value: project,
                children,
                ..
            } => {
                let dep_results = self.clone().schedule_all(children).await;

                let blocking: Vec<ProjectName> = dep_results
                    .iter()
                    .filter_map(|dep| PartialCompileResult::blocked_root(dep))
                    .map(|failure| failure.project_name().clone())
                    .collect();

                let partial = if blocking.is_empty() {
                    self.schedule_project(project, &dep_results).await
                } else {
                    let bundle = self.bundle_for(project);
                    self.reporter.report(CompileEvent::ProjectBlocked {
                        project: project.name().clone(),
                        blocking: blocking.clone(),
                    });
                    PartialCompileResult::Failure(PartialFailure::blocked(bundle, blocking))
                };

                Dag::parent(partial, dep_results)
            }

            Dag::Aggregate { children, .. } => {
                let dep_results = self.clone().schedule_all(children).await;
                let failures = failed_children(&dep_results);
                let partial = if failures.is_empty() {
                    PartialCompileResult::Empty
                } else {
                    PartialCompileResult::Failures(failures)
                };
                Dag::parent(partial, dep_results)
            }
        }
    }

    async fn schedule_all(self: Arc<Self>, children: &[Arc<Dag<Project>>]) -> Vec<Arc<ResultDag>> {
        future::join_all(
            children
                .iter()
                .map(|child| self.clone().traverse(child.clone())),
        )
        .await
    }

    fn bundle_for(&self, project: &Project) -> CompileBundle {
        let bundle = self.setup.setup(project);
        if self.pipeline {
            bundle.with_option(EMIT_PICKLES_OPTION)
        } else {
            bundle
        }
    }

    async fn schedule_project(
        &self,
        project: &Project,
        dep_results: &[Arc<ResultDag>],
    ) -> PartialCompileResult {
        let bundle = self.bundle_for(project);

        if let Some(flow) = bundle.early_return() {
            debug!("early result for '{}'", project.name());
            return early_result(bundle, flow);
        }

        let upstream = if dep_results.is_empty() {
            UpstreamInputs::empty()
        } else {
            let successes = transitive_successes(dep_results);
            UpstreamInputs::from_successes(&successes).await
        };

        if self.pipeline {
            run_pipelined(&self.compiler, bundle, upstream, &self.reporter).await
        } else {
            run_direct(&self.compiler, bundle, upstream, &self.reporter).await
        }
    }
}
