//! # Compiler seams
//!
//! The scheduling core never runs a compiler itself. It is handed a
//! [Setup] that maps a project to a [crate::model::CompileBundle] and a
//! [Compile] that turns assembled [CompileInputs] into a terminal
//! [CompileFlow]. Everything else in the crate exists to order, gate, and
//! collect those two calls.
//!

use crate::model::{CompileBundle, Platform, Project, ProjectName};
use crate::pipeline::CompileInputs;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Compiler option instructing the backend to emit pickles before full
/// bytecode. Appended to every bundle when pipelining is active.
pub const EMIT_PICKLES_OPTION: &str = "-Ypickle-write";

/// Terminal result of one project's compile operation.
///
/// `Completed` is the only successful variant; the others are the `NotOk`
/// family. Failures carry the captured error so the collector can log the
/// message and backtrace; blocked nodes carry the intransitive list of
/// failing direct dependencies.
///
#[derive(Debug, Clone)]
pub enum CompileFlow {
    Completed,

    Failed { error: Arc<anyhow::Error> },

    Blocked { blocking: Vec<ProjectName> },

    Cancelled,

    GlobalError { message: String },
}

impl CompileFlow {
    pub fn failed(error: anyhow::Error) -> Self {
        Self::Failed {
            error: Arc::new(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn is_not_ok(&self) -> bool {
        !self.is_ok()
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }

    pub fn error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Maps a project to the bundle describing what its compile needs. Must be
/// pure: the same project yields the same bundle for the whole invocation.
///
pub trait Setup: Sync + Send {
    fn setup(&self, project: &Project) -> CompileBundle;
}

/// The injected compile operation.
///
/// Implementations own the pickle-ready and java-complete promises handed
/// to them through [CompileInputs]: a pipelined compiler completes
/// `pickle_ready` as soon as its early phase has written pickles, and
/// `complete_java` when its java pass is done. The scheduler guarantees
/// both reach a terminal state even when the implementation never touches
/// them.
///
#[async_trait]
pub trait Compile: Sync + Send + 'static {
    async fn compile(&self, inputs: CompileInputs) -> CompileFlow;
}

/// A live compiler for one platform, reused across projects and
/// invocations.
///
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CompilerInstance {
    platform: Platform,
    version: String,
}

impl CompilerInstance {
    pub fn new(platform: Platform, version: impl Into<String>) -> Self {
        Self {
            platform,
            version: version.into(),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Build-wide cache of compiler instances, keyed by platform. Read-only
/// during a traversal.
///
#[derive(Debug, Default)]
pub struct CompilerCache {
    instances: DashMap<Platform, Arc<CompilerInstance>>,
}

impl CompilerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, instance: CompilerInstance) -> Arc<CompilerInstance> {
        let instance = Arc::new(instance);
        self.instances.insert(instance.platform(), instance.clone());
        instance
    }

    pub fn instance(&self, platform: Platform) -> Option<Arc<CompilerInstance>> {
        self.instances.get(&platform).map(|i| i.value().clone())
    }
}

/// The default [Setup]: partitions project sources by language, resolves
/// the compiler instance from the cache, and derives the java-only flag.
///
#[derive(Clone)]
pub struct DefaultSetup {
    compilers: Arc<CompilerCache>,
}

impl DefaultSetup {
    pub fn new(compilers: Arc<CompilerCache>) -> Self {
        Self { compilers }
    }
}

impl Setup for DefaultSetup {
    fn setup(&self, project: &Project) -> CompileBundle {
        let (java_sources, sources): (Vec<_>, Vec<_>) = project
            .sources()
            .iter()
            .cloned()
            .partition(|path| path.extension().map(|ext| ext == "java").unwrap_or(false));

        let instance = self.compilers.instance(project.platform());

        CompileBundle::new(project.clone(), sources, java_sources, instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_returns_the_registered_instance() {
        let cache = CompilerCache::new();
        assert!(cache.instance(Platform::Jvm).is_none());

        let registered = cache.register(CompilerInstance::new(Platform::Jvm, "3.3.1"));
        let found = cache.instance(Platform::Jvm).unwrap();
        assert_eq!(found, registered);
        assert!(cache.instance(Platform::Native).is_none());
    }

    #[test]
    fn default_setup_partitions_sources_by_language() {
        let cache = Arc::new(CompilerCache::new());
        cache.register(CompilerInstance::new(Platform::Jvm, "3.3.1"));

        let project = Project::builder()
            .name("mixed")
            .sources(vec!["src/A.scala".into(), "src/B.java".into()])
            .build()
            .unwrap();

        let bundle = DefaultSetup::new(cache).setup(&project);
        assert_eq!(bundle.sources().len(), 1);
        assert_eq!(bundle.java_sources().len(), 1);
        assert!(!bundle.java_only());
        assert!(bundle.instance().is_some());
    }

    #[test]
    fn a_project_with_only_java_sources_is_java_only() {
        let cache = Arc::new(CompilerCache::new());
        let project = Project::builder()
            .name("plain-java")
            .sources(vec!["src/Only.java".into()])
            .build()
            .unwrap();

        let bundle = DefaultSetup::new(cache).setup(&project);
        assert!(bundle.java_only());
        assert!(bundle.instance().is_none());
    }
}
