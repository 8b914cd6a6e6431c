use serde::{Deserialize, Serialize};

/// The concurrency mode the user asked for on the command line.
///
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum UserMode {
    #[default]
    Sequential,
    Parallel {
        batches: u32,
    },
}

/// The effective compile mode: the user mode, upgraded when pipelining is
/// requested. Batch counts are carried through for reporting; sizing the
/// worker pool is the runtime's concern, not the scheduler's.
///
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum CompileMode {
    Sequential,
    Parallel { batches: u32 },
    Pipelined,
    ParallelAndPipelined { batches: u32 },
}

impl CompileMode {
    pub fn new(user_mode: UserMode, pipeline: bool) -> Self {
        match (user_mode, pipeline) {
            (UserMode::Sequential, false) => Self::Sequential,
            (UserMode::Sequential, true) => Self::Pipelined,
            (UserMode::Parallel { batches }, false) => Self::Parallel { batches },
            (UserMode::Parallel { batches }, true) => Self::ParallelAndPipelined { batches },
        }
    }

    pub fn is_pipelined(&self) -> bool {
        matches!(self, Self::Pipelined | Self::ParallelAndPipelined { .. })
    }

    pub fn batches(&self) -> Option<u32> {
        match self {
            Self::Parallel { batches } | Self::ParallelAndPipelined { batches } => Some(*batches),
            _ => None,
        }
    }
}

impl std::fmt::Display for CompileMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequential => "sequential".fmt(f),
            Self::Parallel { batches } => write!(f, "parallel ({batches} batches)"),
            Self::Pipelined => "pipelined".fmt(f),
            Self::ParallelAndPipelined { batches } => {
                write!(f, "parallel+pipelined ({batches} batches)")
            }
        }
    }
}
