use crate::compiler::{Compile, Setup};
use crate::graph::Walker;
use crate::model::{CompileMode, Dag, Project, ProjectName, UserMode};
use crate::reporter::{CompileEvent, Reporter, ReporterConfig};
use crate::results::{collect, ExitStatus};
use crate::state::BuildState;
use std::sync::Arc;
use thiserror::*;
use tracing::*;

#[derive(Error, Debug)]
pub enum DriveError {
    #[error("project '{0}' is not part of the current build")]
    UnknownProject(ProjectName),
}

/// The external surface of the scheduling core.
///
/// A drive owns the injected collaborators (bundle setup and compile
/// operation) and runs one compile invocation at a time against a
/// `BuildState`, returning the new state with its status and an updated
/// result cache.
///
pub struct CompileDrive<S, C> {
    setup: Arc<S>,
    compiler: Arc<C>,
}

impl<S, C> CompileDrive<S, C>
where
    S: Setup + 'static,
    C: Compile,
{
    pub fn new(setup: S, compiler: C) -> Self {
        Self {
            setup: Arc::new(setup),
            compiler: Arc::new(compiler),
        }
    }

    /// Compile `root` and everything it depends on.
    ///
    /// `sequential` short-circuits when a transitive dependency failed in a
    /// previous invocation; `pipeline` upgrades the user mode and instructs
    /// compilers to emit pickles; `exclude_root` compiles only the
    /// dependencies of the root.
    ///
    #[instrument(name = "CompileDrive::compile", skip(self, state, reporter_config))]
    pub async fn compile(
        &self,
        state: BuildState,
        root: &ProjectName,
        reporter_config: ReporterConfig,
        sequential: bool,
        user_mode: UserMode,
        pipeline: bool,
        exclude_root: bool,
    ) -> Result<BuildState, DriveError> {
        let dag = state
            .build()
            .find(root)
            .ok_or_else(|| DriveError::UnknownProject(root.clone()))?;

        let dag = if exclude_root {
            Dag::aggregate(dag.children().to_vec())
        } else {
            dag
        };

        let mode = CompileMode::new(user_mode, pipeline);
        let reporter = Reporter::new(reporter_config, state.channel().clone());
        reporter.report(CompileEvent::BuildStarted { mode });
        info!("compiling '{root}' in {mode} mode");

        if sequential {
            let failed = state
                .results()
                .previously_failed(dependency_names(&dag).iter());
            if !failed.is_empty() {
                reporter.report(CompileEvent::SequentialGateTripped { failed });
                reporter.report(CompileEvent::BuildCompleted {
                    status: ExitStatus::CompilationError,
                });
                return Ok(state.with_status(ExitStatus::CompilationError));
            }
        }

        let walker = Walker::new(
            self.setup.clone(),
            self.compiler.clone(),
            mode.is_pipelined(),
            reporter.clone(),
        );
        let result = walker.traverse(dag).await;

        let status = collect(&result, state.results(), &reporter).await;
        reporter.report(CompileEvent::BuildCompleted { status });

        Ok(state.with_status(status))
    }
}

/// The transitive dependency set of the root, excluding the root itself.
///
fn dependency_names(dag: &Arc<Dag<Project>>) -> Vec<ProjectName> {
    let root_id = dag.id();
    dag.dfs()
        .iter()
        .filter(|node| node.id() != root_id)
        .filter_map(|node| node.value())
        .map(|project| project.name().clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(name: &str) -> Project {
        Project::builder().name(name).build().unwrap()
    }

    #[test]
    fn dependency_names_exclude_the_root() {
        let a = Dag::leaf(project("a"));
        let b = Dag::parent(project("b"), vec![a.clone()]);
        let c = Dag::parent(project("c"), vec![b]);

        assert_eq!(
            dependency_names(&c),
            vec![ProjectName::from("b"), ProjectName::from("a")]
        );
        assert_eq!(dependency_names(&a), Vec::<ProjectName>::new());
    }
}
