//! Indicatif-backed progress reporting for training runs.

use indicatif::ProgressBar;
use loraforge_training::{ProgressEvent, ProgressSink};

/// Renders trainer step events as a progress bar; hidden in JSON mode so
/// machine-readable output stays clean.
pub struct ProgressBarSink {
    bar: ProgressBar,
}

impl ProgressBarSink {
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet { ProgressBar::hidden() } else { ProgressBar::no_length() };
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for ProgressBarSink {
    fn on_event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { .. } => self.bar.set_message("training"),
            ProgressEvent::Message { message, .. } => self.bar.set_message(message),
            ProgressEvent::Step { step, total, loss, .. } => {
                if let Some(total) = total {
                    self.bar.set_length(total);
                }
                self.bar.set_position(step);
                if let Some(loss) = loss {
                    self.bar.set_message(format!("loss {loss:.4}"));
                }
            }
            ProgressEvent::Finished { .. } => self.bar.set_message("finished"),
        }
    }
}
