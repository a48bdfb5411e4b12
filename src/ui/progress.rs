use crate::output::is_quiet;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// Spinner shown while datasets are loaded; hidden when stdout is not a terminal
pub struct Spinner {
    pb: ProgressBar,
    started: Instant,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = if console::Term::stdout().is_term() && !is_quiet() {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Self {
            pb,
            started: Instant::now(),
        }
    }

    /// Clear the spinner and return the human-readable elapsed time
    pub fn finish(&self) -> String {
        self.pb.finish_and_clear();
        HumanDuration(self.started.elapsed()).to_string()
    }
}
