//! Progress reporting for long-running collaborator calls

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

/// One progress update from a fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub stage: String,
    /// Percentage, clamped into 0..=100
    pub progress: f32,
    pub message: String,
}

impl ProgressEvent {
    pub fn new(stage: impl Into<String>, progress: f32, message: impl Into<String>) -> Self {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 100.0)
        };
        Self {
            stage: stage.into(),
            progress,
            message: message.into(),
        }
    }
}

/// Receiver of progress events
pub trait ProgressSink {
    fn report(&mut self, event: ProgressEvent);
}

/// Keeps only the most recent event
#[derive(Debug, Default, Clone)]
pub struct ProgressTracker {
    latest: Option<ProgressEvent>,
}

impl ProgressTracker {
    pub fn latest(&self) -> Option<&ProgressEvent> {
        self.latest.as_ref()
    }
}

impl ProgressSink for ProgressTracker {
    fn report(&mut self, event: ProgressEvent) {
        // Re-clamp in case the event was built by hand
        self.latest = Some(ProgressEvent::new(event.stage, event.progress, event.message));
    }
}

/// Terminal progress bar driven by progress events
#[derive(Debug)]
pub struct ProgressReporter {
    pb: Option<ProgressBar>,
}

impl ProgressReporter {
    pub fn new(message: &str) -> Self {
        Self {
            pb: Some(create_progress_bar(message)),
        }
    }

    /// Create minimal progress reporter (no progress bars)
    pub fn new_minimal() -> Self {
        Self { pb: None }
    }

    pub fn finish(&mut self, message: &str) {
        if let Some(pb) = self.pb.take() {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl ProgressSink for ProgressReporter {
    fn report(&mut self, event: ProgressEvent) {
        if let Some(pb) = &self.pb {
            pb.set_position(event.progress.round() as u64);
            pb.set_message(format!("[{}] {}", event.stage, event.message));
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(pb) = self.pb.take() {
            pb.finish_and_clear();
        }
    }
}

/// Create a percentage progress bar
fn create_progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .expect("Invalid progress template")
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}
