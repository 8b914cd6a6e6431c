use dashmap::{DashMap, DashSet};
use slipstream_core::pipeline::{CompileInputs, JavaOutcome, PickleOutcome};
use slipstream_core::{
    Build, BuildState, Compile, CompileDrive, CompileFlow, CompilerCache, CompilerInstance, Dag,
    DefaultSetup, Platform, Project, ProjectName, ReporterConfig,
};
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

/// A compile operation that records everything the scheduler hands it.
/// Clones share their recordings.
///
#[derive(Clone, Default)]
pub struct RecordingCompiler {
    invocations: Arc<DashMap<ProjectName, usize>>,
    picklepaths: Arc<DashMap<ProjectName, Vec<String>>>,
    pickle_precompleted: Arc<DashMap<ProjectName, bool>>,
    java_precompleted: Arc<DashMap<ProjectName, bool>>,
    failing: Arc<DashSet<ProjectName>>,
}

impl RecordingCompiler {
    pub fn fail(&self, name: &str) {
        self.failing.insert(name.into());
    }

    pub fn count(&self, name: &str) -> usize {
        self.invocations
            .get(&name.into())
            .map(|c| *c.value())
            .unwrap_or(0)
    }

    pub fn picklepath(&self, name: &str) -> Vec<String> {
        self.picklepaths
            .get(&name.into())
            .map(|p| p.value().clone())
            .unwrap_or_default()
    }

    pub fn pickle_was_precompleted(&self, name: &str) -> bool {
        self.pickle_precompleted
            .get(&name.into())
            .map(|v| *v.value())
            .unwrap_or(false)
    }

    pub fn java_was_precompleted(&self, name: &str) -> bool {
        self.java_precompleted
            .get(&name.into())
            .map(|v| *v.value())
            .unwrap_or(false)
    }
}

#[async_trait]
impl Compile for RecordingCompiler {
    async fn compile(&self, inputs: CompileInputs) -> CompileFlow {
        let name = inputs.project_name().clone();
        *self.invocations.entry(name.clone()).or_insert(0) += 1;
        self.picklepaths.insert(
            name.clone(),
            inputs.picklepath.iter().map(|u| u.to_string()).collect(),
        );
        self.pickle_precompleted
            .insert(name.clone(), inputs.pickle_ready.is_completed());
        self.java_precompleted
            .insert(name.clone(), inputs.complete_java.is_completed());

        if self.failing.contains(&name) {
            return CompileFlow::failed(anyhow::anyhow!("compilation of '{name}' failed"));
        }

        if inputs.separate_java_and_scala {
            let uri = Url::parse(&format!("pickle:///{name}")).unwrap();
            inputs.pickle_ready.complete(PickleOutcome::Produced(uri));
            inputs.complete_java.complete(JavaOutcome::Finished);
        }
        CompileFlow::Completed
    }
}

pub struct Harness {
    pub state: BuildState,
    pub drive: CompileDrive<DefaultSetup, RecordingCompiler>,
    pub compiler: RecordingCompiler,
}

pub fn harness(dags: Vec<Arc<Dag<Project>>>) -> Harness {
    let compilers = Arc::new(CompilerCache::new());
    compilers.register(CompilerInstance::new(Platform::Jvm, "3.3.1"));

    let state = BuildState::new(Build::new(dags), compilers.clone());
    let compiler = RecordingCompiler::default();
    let drive = CompileDrive::new(DefaultSetup::new(compilers), compiler.clone());

    Harness {
        state,
        drive,
        compiler,
    }
}

/// A reporter configuration whose events land on the state's channel, for
/// scenarios that assert on the event stream.
///
pub fn structured() -> ReporterConfig {
    ReporterConfig::builder().structured(true).build().unwrap()
}

pub fn project(name: &str) -> Project {
    Project::builder()
        .name(name)
        .sources(vec![format!("{name}.scala").into()])
        .build()
        .unwrap()
}
