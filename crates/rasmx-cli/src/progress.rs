//! Progress display and human-readable formatting.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Step-by-step progress for the benchmark run
pub struct BenchProgress {
    bar: ProgressBar,
}

impl BenchProgress {
    /// Create a tracker over `total_steps` steps
    #[must_use]
    pub fn new(total_steps: u64) -> Self {
        let bar = ProgressBar::new(total_steps);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Announce the step that is about to run
    pub fn start_step(&self, msg: impl Into<String>) {
        self.bar.set_message(msg.into());
    }

    /// Mark the current step done and print a result line above the bar
    pub fn finish_step(&self, line: impl AsRef<str>) {
        self.bar.println(line.as_ref());
        self.bar.inc(1);
    }

    /// Finish with custom message
    pub fn finish_with_message(&self, msg: impl Into<String>) {
        self.bar.finish_with_message(msg.into());
    }
}

/// Format bytes in human-readable format
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{size:.2} {}", UNITS[unit_idx])
}

/// Format speed in human-readable format (bytes/sec)
#[must_use]
pub fn format_speed(bytes_per_sec: f64) -> String {
    format!("{}/s", format_bytes(bytes_per_sec as u64))
}

/// Throughput of `bytes` processed in `elapsed`
#[must_use]
pub fn throughput(bytes: u64, elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64().max(f64::EPSILON);
    format_speed(bytes as f64 / secs)
}

/// Format a duration with millisecond precision
#[must_use]
pub fn format_millis(duration: Duration) -> String {
    format!("{:.2}ms", duration.as_secs_f64() * 1000.0)
}

/// Group digits with commas, e.g. `1,234,567`
#[must_use]
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
