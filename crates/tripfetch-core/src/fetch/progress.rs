//! Single-line transfer progress on stderr.

use std::io::Write;
use std::time::{Duration, Instant};

const INTERVAL: Duration = Duration::from_millis(500);
const MIB: f64 = 1_048_576.0;

/// Redraws `  done / total MiB (pct%)` at most every 500ms.
pub(super) struct ProgressMeter {
    /// Bytes already on disk before this transfer started.
    base: u64,
    last_draw: Option<Instant>,
    drew: bool,
}

impl ProgressMeter {
    pub(super) fn new(base: u64) -> Self {
        Self {
            base,
            last_draw: None,
            drew: false,
        }
    }

    /// Called from the libcurl progress callback; values are relative to this transfer.
    pub(super) fn update(&mut self, now_bytes: f64, total_bytes: f64) {
        let now = Instant::now();
        if let Some(last) = self.last_draw {
            if now.duration_since(last) < INTERVAL {
                return;
            }
        }
        self.last_draw = Some(now);
        self.drew = true;
        let line = self.line(now_bytes, total_bytes);
        let mut err = std::io::stderr().lock();
        let _ = write!(err, "\r{}", line);
        let _ = err.flush();
    }

    /// libcurl reports a total of 0 until it knows the length; keep that as unknown.
    fn line(&self, now_bytes: f64, total_bytes: f64) -> String {
        let base = self.base as f64;
        let total = if total_bytes > 0.0 {
            base + total_bytes
        } else {
            0.0
        };
        render(base + now_bytes, total)
    }

    /// Ends the progress line so the next transcript line starts clean.
    pub(super) fn finish(&self) {
        if self.drew {
            let _ = writeln!(std::io::stderr().lock());
        }
    }
}

fn render(done: f64, total: f64) -> String {
    if total > 0.0 {
        format!(
            "  {:.1} / {:.1} MiB ({:.1}%)  ",
            done / MIB,
            total / MIB,
            (done / total * 100.0).min(100.0)
        )
    } else {
        format!("  {:.1} MiB  ", done / MIB)
    }
}
