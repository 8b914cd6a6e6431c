use crate::model::{CompileMode, ProjectName};
use crate::results::ExitStatus;

/// Everything the scheduling core tells the outside world about one
/// compile invocation.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompileEvent {
    BuildStarted {
        mode: CompileMode,
    },

    BuildCompleted {
        status: ExitStatus,
    },

    CompileStarted {
        project: ProjectName,
        pipelined: bool,
    },

    /// The compiler published early pickles for this project.
    PicklesReady {
        project: ProjectName,
        uri: String,
    },

    /// Pipelining was requested but this project's compiler never produced
    /// pickles. A warning surface, never a failure.
    PipeliningNotUsed {
        project: ProjectName,
    },

    ProjectBlocked {
        project: ProjectName,
        blocking: Vec<ProjectName>,
    },

    ProjectFailed {
        project: ProjectName,
        message: String,
    },

    /// Sequential mode found previously failed dependencies and skipped
    /// scheduling entirely.
    SequentialGateTripped {
        failed: Vec<ProjectName>,
    },
}

impl CompileEvent {
    pub fn project(&self) -> Option<&ProjectName> {
        match self {
            CompileEvent::CompileStarted { project, .. }
            | CompileEvent::PicklesReady { project, .. }
            | CompileEvent::PipeliningNotUsed { project }
            | CompileEvent::ProjectBlocked { project, .. }
            | CompileEvent::ProjectFailed { project, .. } => Some(project),
            _ => None,
        }
    }
}
