use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::outcome::FailureKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Resolving,
    Downloading,
    Extracting,
    Indexing,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Resolving => "Resolving latest release",
            Stage::Downloading => "Downloading dictionary",
            Stage::Extracting => "Extracting dictionary",
            Stage::Indexing => "Indexing dictionary",
        }
    }
}

/// State of the dictionary update as seen by the UI layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UpdateStatus {
    Idle,
    Running { stage: Stage, progress: f64 },
    Succeeded { message: String },
    Failed { kind: FailureKind, message: String },
    /// Neutral terminal state, never shown as a failure
    Cancelled,
}

impl UpdateStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UpdateStatus::Succeeded { .. } | UpdateStatus::Failed { .. } | UpdateStatus::Cancelled
        )
    }
}

/// Shared progress/status sink.
///
/// Progress within a stage never goes backwards: a lower value than the last
/// reported one is ignored.
#[derive(Debug, Clone)]
pub struct StatusReporter {
    tx: watch::Sender<UpdateStatus>,
}

impl StatusReporter {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(UpdateStatus::Idle);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<UpdateStatus> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> UpdateStatus {
        self.tx.borrow().clone()
    }

    pub fn begin(&self, stage: Stage) {
        tracing::info!("{}", stage.label());
        self.tx.send_replace(UpdateStatus::Running {
            stage,
            progress: 0.0,
        });
    }

    pub fn progress(&self, stage: Stage, value: f64) {
        let value = if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            0.0
        };

        self.tx.send_if_modified(|status| match status {
            UpdateStatus::Running {
                stage: current,
                progress,
            } if *current == stage => {
                if value > *progress {
                    *progress = value;
                    true
                } else {
                    false
                }
            }
            _ => {
                *status = UpdateStatus::Running {
                    stage,
                    progress: value,
                };
                true
            }
        });
    }

    pub fn succeed(&self, message: impl Into<String>) {
        self.tx.send_replace(UpdateStatus::Succeeded {
            message: message.into(),
        });
    }

    pub fn fail(&self, kind: FailureKind, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("Dictionary update failed ({kind}): {message}");
        self.tx.send_replace(UpdateStatus::Failed { kind, message });
    }

    pub fn cancel(&self) {
        tracing::info!("Dictionary update cancelled");
        self.tx.send_replace(UpdateStatus::Cancelled);
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new()
    }
}
