//! # Slipstream Core
//!
//! The compilation scheduling core of a build engine for a toolchain that
//! emits early type-information artifacts ("pickles") before full bytecode.
//!
//! The flow begins by loading a `BuildState` (the project DAG plus the
//! caches that survive across invocations) and handing it to a
//! `CompileDrive` together with the injected `Setup` and `Compile`
//! collaborators. The drive walks the DAG, schedules every project at most
//! once, threads partial results (pickle URIs, java-completion signals)
//! downstream, and collects the final results into a new `BuildState`.
//!

pub mod compiler;
pub mod drive;
pub mod graph;
pub mod model;
pub mod pipeline;
pub mod reporter;
pub mod results;
pub mod state;

pub use compiler::{Compile, CompileFlow, CompilerCache, CompilerInstance, DefaultSetup, Setup};
pub use drive::*;
pub use model::{
    CompileBundle, CompileMode, Dag, NodeId, Platform, Project, ProjectName, UserMode,
};
pub use reporter::{CompileEvent, Reporter, ReporterChannel, ReporterConfig};
pub use results::{ExitStatus, FinalCompileResult, ResultsCache};
pub use state::*;

#[macro_use]
extern crate derive_builder;

#[cfg(test)]
#[macro_use]
extern crate assert_matches;

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;
