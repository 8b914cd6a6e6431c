//! # Compile reporting
//!
//! Progress and diagnostics flow through a lock-free channel as typed
//! events. Consumers observe events in send order, which is what a
//! structured/protocol logger on the other end relies on.
//!

mod channel;
mod event;

pub use channel::*;
pub use event::*;

use tracing::*;

/// How the reporter surfaces events. Passed through the compile operation
/// to the reporter factory.
///
#[derive(Builder, Debug, Default, Clone)]
pub struct ReporterConfig {
    /// Emit events onto the channel for a structured/protocol consumer.
    /// When unset, events only reach the tracing subscriber.
    #[builder(default)]
    structured: bool,

    /// Log captured failure stacks at error level; the full debug payload
    /// always goes to trace level.
    #[builder(default = "true")]
    stack_traces: bool,
}

impl ReporterConfig {
    pub fn builder() -> ReporterConfigBuilder {
        Default::default()
    }

    pub fn structured(&self) -> bool {
        self.structured
    }

    pub fn stack_traces(&self) -> bool {
        self.stack_traces
    }
}

/// Every event goes to the tracing subscriber; structured reporters also
/// put it on the ordered channel for their protocol consumer.
///
#[derive(Clone)]
pub struct Reporter {
    config: ReporterConfig,
    channel: ReporterChannel,
}

impl Reporter {
    pub fn new(config: ReporterConfig, channel: ReporterChannel) -> Self {
        Self { config, channel }
    }

    pub fn config(&self) -> &ReporterConfig {
        &self.config
    }

    pub fn report(&self, event: CompileEvent) {
        match &event {
            CompileEvent::PipeliningNotUsed { project } => {
                warn!("project '{project}' did not use pipelined compilation");
            }
            CompileEvent::ProjectBlocked { project, blocking } => {
                warn!("project '{project}' is blocked by {blocking:?}");
            }
            CompileEvent::ProjectFailed { project, message } => {
                error!("project '{project}' failed to compile: {message}");
            }
            CompileEvent::SequentialGateTripped { failed } => {
                warn!("skipping compilation, previously failed dependencies: {failed:?}");
            }
            event => debug!("{event:?}"),
        }
        if self.config.structured {
            self.channel.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structured() -> ReporterConfig {
        ReporterConfig::builder().structured(true).build().unwrap()
    }

    #[test]
    fn config_defaults_are_unstructured_with_stacks() {
        let config = ReporterConfig::builder().build().unwrap();
        assert!(!config.structured());
        assert!(config.stack_traces());
    }

    #[test]
    fn a_structured_reporter_emits_events_in_order() {
        let channel = ReporterChannel::new();
        let reporter = Reporter::new(structured(), channel.clone());
        let mut consumer = channel.consumer();

        reporter.report(CompileEvent::CompileStarted {
            project: "a".into(),
            pipelined: true,
        });
        reporter.report(CompileEvent::PipeliningNotUsed {
            project: "a".into(),
        });

        let events = consumer.drain();
        assert_eq!(events.len(), 2);
        assert_matches!(events[0], CompileEvent::CompileStarted { .. });
        assert_matches!(events[1], CompileEvent::PipeliningNotUsed { .. });
    }

    #[test]
    fn an_unstructured_reporter_keeps_the_channel_silent() {
        let channel = ReporterChannel::new();
        let reporter = Reporter::new(ReporterConfig::default(), channel.clone());

        reporter.report(CompileEvent::PipeliningNotUsed {
            project: "a".into(),
        });

        assert!(channel.is_empty());
    }
}
