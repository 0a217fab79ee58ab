//! Streaming progress channel (§4.4, §6): a caller-supplied
//! `tokio::sync::mpsc::UnboundedSender` the orchestrator pushes
//! [`ProgressEvent`]s into at phase boundaries and at each adapter's
//! start/finish/error, so an external streaming surface (out of core
//! scope, §1) can forward them to a UI without the orchestrator knowing
//! anything about HTTP or SSE framing.

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

/// One of the four phases a search run passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Search,
    Citations,
    Process,
    Complete,
}

impl Phase {
    fn as_str(self) -> &'static str {
        match self {
            Phase::Search => "Search",
            Phase::Citations => "Citations",
            Phase::Process => "Process",
            Phase::Complete => "Complete",
        }
    }
}

/// Lifecycle state of a phase or adapter call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProgressStatus {
    Running,
    Complete,
    Error,
}

impl ProgressStatus {
    fn as_str(self) -> &'static str {
        match self {
            ProgressStatus::Running => "running",
            ProgressStatus::Complete => "complete",
            ProgressStatus::Error => "error",
        }
    }
}

/// A single progress message. `source` is set for adapter-level events and
/// absent for phase-boundary events.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub phase: Phase,
    pub source: Option<String>,
    pub status: ProgressStatus,
    pub count: Option<usize>,
    pub message: Option<String>,
}

impl ProgressEvent {
    #[must_use]
    pub fn phase_boundary(phase: Phase, status: ProgressStatus, message: impl Into<String>) -> Self {
        Self {
            phase,
            source: None,
            status,
            count: None,
            message: Some(message.into()),
        }
    }

    #[must_use]
    pub fn adapter(
        phase: Phase,
        source: impl Into<String>,
        status: ProgressStatus,
        count: Option<usize>,
        message: Option<String>,
    ) -> Self {
        Self {
            phase,
            source: Some(source.into()),
            status,
            count,
            message,
        }
    }

    /// Render the `§6` wire shape: `{type:"progress", phase, source,
    /// status, count, message}`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "progress",
            "phase": self.phase.as_str(),
            "source": self.source,
            "status": self.status.as_str(),
            "count": self.count,
            "message": self.message,
        })
    }
}

/// The channel an orchestrator search sends [`ProgressEvent`]s into. The
/// orchestrator sends best-effort: a closed receiver (nobody is listening
/// any more) is not an error (§5).
pub type ProgressSender = UnboundedSender<ProgressEvent>;

/// Send an event if a sender was supplied, swallowing a closed channel.
pub(crate) fn emit(sender: Option<&ProgressSender>, event: ProgressEvent) {
    if let Some(sender) = sender {
        let _ = sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_boundary_has_no_source() {
        let event = ProgressEvent::phase_boundary(Phase::Search, ProgressStatus::Running, "starting");
        assert!(event.source.is_none());
        assert_eq!(event.to_json()["status"], "running");
    }

    #[test]
    fn adapter_event_carries_source_and_count() {
        let event = ProgressEvent::adapter(
            Phase::Search,
            "PubMed",
            ProgressStatus::Complete,
            Some(42),
            None,
        );
        let json = event.to_json();
        assert_eq!(json["source"], "PubMed");
        assert_eq!(json["count"], 42);
    }
}
