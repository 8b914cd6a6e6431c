use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The stable name a project is known by across a build. Names are the unit
/// of reporting: blocked lists, result caches, and fail-fast signals all
/// carry project names.
///
#[derive(Debug, Default, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ProjectName(String);

impl ProjectName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProjectName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ProjectName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for ProjectName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(
    Debug, Default, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize,
)]
pub enum Platform {
    #[default]
    Jvm,
    Js,
    Native,
}

/// A compilation unit in the build DAG. Immutable for the duration of one
/// compile invocation.
///
#[derive(Builder, Debug, Default, Clone, Serialize, Deserialize)]
pub struct Project {
    #[builder(setter(into))]
    name: ProjectName,

    /// Every source file of the project, mixed-language. The bundle setup
    /// partitions these into compiler sources and java sources.
    #[builder(default)]
    sources: Vec<PathBuf>,

    #[builder(default)]
    classpath: Vec<PathBuf>,

    #[builder(default)]
    compile_options: Vec<String>,

    #[builder(default)]
    platform: Platform,
}

impl Project {
    pub fn builder() -> ProjectBuilder {
        Default::default()
    }

    pub fn name(&self) -> &ProjectName {
        &self.name
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn classpath(&self) -> &[PathBuf] {
        &self.classpath
    }

    pub fn compile_options(&self) -> &[String] {
        &self.compile_options
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::Arbitrary;

    impl quickcheck::Arbitrary for ProjectName {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            let raw = String::arbitrary(g);
            Self(format!("project-{}", raw.len()))
        }
    }

    impl quickcheck::Arbitrary for Platform {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            *g.choose(&[Platform::Jvm, Platform::Js, Platform::Native])
                .unwrap()
        }
    }

    #[test]
    fn builder_defaults_to_an_empty_source_list() {
        let project = Project::builder().name("a").build().unwrap();
        assert!(project.sources().is_empty());
        assert_eq!(project.platform(), Platform::Jvm);
    }
}
