use std::time::{Duration, Instant};
use tracing::info;

/// Logs when a pipeline step starts and how long it took when dropped.
pub struct Timer {
    label: String,
    start: Instant,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        let label = label.into();
        info!("Starting: {}", label);
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        info!("Finished: {} (took {:.2?})", self.label, self.elapsed());
    }
}

/// Format a count with thousands separators.
pub fn fmt_count(n: usize) -> String {
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

/// Horizontal bar scaled so that `max` fills `width` cells.
/// Any non-zero value gets at least one cell.
pub fn bar(value: usize, max: usize, width: usize) -> String {
    if max == 0 || value == 0 {
        return String::new();
    }
    let cells = (value * width).div_ceil(max).min(width);
    "█".repeat(cells.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_count() {
        assert_eq!(fmt_count(1_234_567), "1,234,567");
        assert_eq!(fmt_count(0), "0");
        assert_eq!(fmt_count(42_000), "42,000");
        assert_eq!(fmt_count(999), "999");
    }

    #[test]
    fn test_bar() {
        assert_eq!(bar(10, 10, 5), "█████");
        assert_eq!(bar(5, 10, 4), "██");
        assert_eq!(bar(1, 1000, 10), "█");
        assert_eq!(bar(0, 10, 10), "");
        assert_eq!(bar(3, 0, 10), "");
    }
}
