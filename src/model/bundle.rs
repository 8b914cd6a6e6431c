use super::Project;
use crate::compiler::{CompileFlow, CompilerInstance};
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a single project's compile needs, derived purely from the
/// project by the bundle setup.
///
#[derive(Debug, Clone)]
pub struct CompileBundle {
    project: Project,
    sources: Vec<PathBuf>,
    java_sources: Vec<PathBuf>,
    instance: Option<Arc<CompilerInstance>>,
    compile_options: Vec<String>,
    java_only: bool,
}

/// Outcome of inspecting a bundle before scheduling its compile.
///
#[derive(Debug)]
pub enum BundleFlow<'a> {
    Ready {
        sources: &'a [PathBuf],
        instance: Option<&'a Arc<CompilerInstance>>,
        java_only: bool,
    },

    /// Nothing to schedule: the node terminates with this result and its
    /// promises are completed synthetically.
    EarlyReturn(CompileFlow),
}

impl CompileBundle {
    pub fn new(
        project: Project,
        sources: Vec<PathBuf>,
        java_sources: Vec<PathBuf>,
        instance: Option<Arc<CompilerInstance>>,
    ) -> Self {
        let java_only = sources.is_empty() && !java_sources.is_empty();
        let compile_options = project.compile_options().to_vec();
        Self {
            project,
            sources,
            java_sources,
            instance,
            compile_options,
            java_only,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn java_sources(&self) -> &[PathBuf] {
        &self.java_sources
    }

    pub fn has_java_sources(&self) -> bool {
        !self.java_sources.is_empty()
    }

    pub fn instance(&self) -> Option<&Arc<CompilerInstance>> {
        self.instance.as_ref()
    }

    pub fn compile_options(&self) -> &[String] {
        &self.compile_options
    }

    pub fn java_only(&self) -> bool {
        self.java_only
    }

    /// Append a compiler option, skipping duplicates.
    ///
    pub fn with_option(mut self, option: &str) -> Self {
        if !self.compile_options.iter().any(|o| o == option) {
            self.compile_options.push(option.to_string());
        }
        self
    }

    /// The early result for this bundle, when compilation should
    /// short-circuit without invoking the compiler.
    ///
    pub fn early_return(&self) -> Option<CompileFlow> {
        match self.to_sources_and_instance() {
            BundleFlow::EarlyReturn(flow) => Some(flow),
            BundleFlow::Ready { .. } => None,
        }
    }

    /// Classify the bundle: either a ready (sources, instance, java-only)
    /// triple, or an early result that short-circuits compilation.
    ///
    pub fn to_sources_and_instance(&self) -> BundleFlow<'_> {
        if self.sources.is_empty() && self.java_sources.is_empty() {
            return BundleFlow::EarlyReturn(CompileFlow::Completed);
        }
        if !self.java_only && self.instance.is_none() {
            return BundleFlow::EarlyReturn(CompileFlow::GlobalError {
                message: format!(
                    "no compiler instance for platform {:?} (project '{}')",
                    self.project.platform(),
                    self.project.name()
                ),
            });
        }
        BundleFlow::Ready {
            sources: &self.sources,
            instance: self.instance.as_ref(),
            java_only: self.java_only,
        }
    }
}
