use std::process::ExitCode;
use std::time::Duration;

use indicatif::HumanCount;

/// Result of converting a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Converted {
    pub input_size: u64,
    pub output_size: u64,
}

impl Converted {
    pub fn size_change_percent(&self) -> f64 {
        size_change_percent(self.input_size, self.output_size)
    }
}

/// Percentage saved going from `before` to `after` bytes; negative if the output grew
pub fn size_change_percent(before: u64, after: u64) -> f64 {
    if before == 0 {
        return 0.0;
    }
    (1.0 - after as f64 / before as f64) * 100.0
}

/// Human readable byte count: `1.5 KB`, `-300.0 B`
pub fn format_size(bytes: i64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let sign = if bytes < 0 { "-" } else { "" };
    let mut size = bytes.unsigned_abs() as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{sign}{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{sign}{size:.1} TB")
}

/// Per-batch tally of converted, skipped and failed files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub input_bytes: u64,
    pub output_bytes: u64,
}

impl BatchSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record_converted(&mut self, converted: Converted) {
        self.converted += 1;
        self.input_bytes += converted.input_size;
        self.output_bytes += converted.output_size;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn record_failed(&mut self) {
        self.failed += 1;
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.has_failures() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }

    pub fn print(&self, elapsed: Duration) {
        println!("{}", "-".repeat(60));
        println!("Conversion finished in {}", humantime::format_duration(round_to_millis(elapsed)));
        println!("Total files: {}", self.total);
        println!("Converted:   {}", self.converted);
        println!("Skipped:     {}", self.skipped);
        println!("Failed:      {}", self.failed);

        if self.converted > 0 {
            println!(
                "Total size:  {} -> {} bytes ({:+.1}%)",
                HumanCount(self.input_bytes),
                HumanCount(self.output_bytes),
                size_change_percent(self.input_bytes, self.output_bytes)
            );
        }
    }
}

/// humantime prints every sub-unit down to nanoseconds
pub fn round_to_millis(elapsed: Duration) -> Duration {
    Duration::from_millis(elapsed.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.0 B");
        assert_eq!(format_size(1023), "1023.0 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
        assert_eq!(format_size(2048 * 1024 * 1024 * 1024), "2.0 TB");
        assert_eq!(format_size(-1536), "-1.5 KB");
    }

    #[test]
    fn test_size_change_percent() {
        assert_eq!(size_change_percent(200, 50), 75.0);
        assert_eq!(size_change_percent(100, 150), -50.0);
        assert_eq!(size_change_percent(0, 10), 0.0);
    }

    #[test]
    fn test_byte_counts_are_grouped() {
        assert_eq!(HumanCount(1_234_567).to_string(), "1,234,567");
        assert_eq!(HumanCount(999).to_string(), "999");
    }

    #[test]
    fn test_summary_tally() {
        let mut summary = BatchSummary::new(3);
        summary.record_converted(Converted { input_size: 100, output_size: 40 });
        summary.record_skipped();
        assert!(!summary.has_failures());
        assert_eq!(summary.exit_code(), ExitCode::SUCCESS);
        assert_eq!((summary.input_bytes, summary.output_bytes), (100, 40));

        summary.record_failed();
        assert!(summary.has_failures());
        assert_eq!(summary.exit_code(), ExitCode::FAILURE);
    }
}
