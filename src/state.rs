use crate::compiler::CompilerCache;
use crate::model::{Dag, Project, ProjectName};
use crate::reporter::ReporterChannel;
use crate::results::{ExitStatus, ResultsCache};
use std::sync::Arc;

/// The loaded build: the roots of the project DAG for the current
/// workspace. Dependencies point from dependent to dependency.
///
#[derive(Debug, Default, Clone)]
pub struct Build {
    dags: Vec<Arc<Dag<Project>>>,
}

impl Build {
    pub fn new(dags: Vec<Arc<Dag<Project>>>) -> Self {
        Self { dags }
    }

    pub fn dags(&self) -> &[Arc<Dag<Project>>] {
        &self.dags
    }

    /// The sub-DAG rooted at the project with this name, searching every
    /// root in order.
    ///
    pub fn find(&self, name: &ProjectName) -> Option<Arc<Dag<Project>>> {
        self.dags
            .iter()
            .find_map(|dag| Dag::find_node(dag, |project| project.name() == name))
    }
}

/// Everything a compile invocation consumes and produces: the build, the
/// caches that survive across invocations, the reporter channel, and the
/// status of the most recent invocation.
///
#[derive(Clone, Debug)]
pub struct BuildState {
    build: Build,
    results: Arc<ResultsCache>,
    compilers: Arc<CompilerCache>,
    channel: ReporterChannel,
    status: ExitStatus,
}

impl BuildState {
    pub fn new(build: Build, compilers: Arc<CompilerCache>) -> Self {
        Self {
            build,
            results: Arc::new(ResultsCache::new()),
            compilers,
            channel: ReporterChannel::new(),
            status: ExitStatus::Ok,
        }
    }

    pub fn build(&self) -> &Build {
        &self.build
    }

    pub fn results(&self) -> &Arc<ResultsCache> {
        &self.results
    }

    pub fn compilers(&self) -> &Arc<CompilerCache> {
        &self.compilers
    }

    pub fn channel(&self) -> &ReporterChannel {
        &self.channel
    }

    pub fn status(&self) -> ExitStatus {
        self.status
    }

    pub fn with_status(self, status: ExitStatus) -> Self {
        Self { status, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(name: &str) -> Project {
        Project::builder().name(name).build().unwrap()
    }

    #[test]
    fn find_locates_nested_projects() {
        let a = Dag::leaf(project("a"));
        let b = Dag::parent(project("b"), vec![a.clone()]);
        let build = Build::new(vec![b]);

        assert!(build.find(&"b".into()).is_some());
        let found = build.find(&"a".into()).unwrap();
        assert_eq!(found.id(), a.id());
        assert!(build.find(&"missing".into()).is_none());
    }

    #[test]
    fn with_status_replaces_only_the_status() {
        let state = BuildState::new(Build::default(), Arc::new(CompilerCache::new()));
        let results = state.results().clone();
        let state = state.with_status(ExitStatus::CompilationError);
        assert_eq!(state.status(), ExitStatus::CompilationError);
        assert!(Arc::ptr_eq(state.results(), &results));
    }
}
