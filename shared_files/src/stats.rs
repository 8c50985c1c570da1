//! Statistics and timing for the compression report.
//!
//! [`CompressionStats`] aggregates the metrics of one compression or
//! decompression run (sizes, ratio, throughput, optional header breakdown)
//! and renders them for the terminal through its `Display` impl. It is
//! built through [`CompressionStatsBuilder`], which refuses to build when a
//! required field was never set. [`StatsTimer`] measures the overall run
//! and collects named section timings; [`OptionalStatsTimer`] wraps it so
//! that timing can be switched off at runtime without littering call sites
//! with conditionals.

use std::error::Error;
use std::fmt::{self, Display};
use std::time::{Duration, Instant};

const KIB: usize = 1024;
const MIB: usize = KIB * 1024;
const GIB: usize = MIB * 1024;

/// Formats a byte count with binary prefixes, two decimals from KiB up.
fn format_bytes(bytes: usize) -> String {
    if bytes >= GIB {
        format!("{:.2} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.2} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.2} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Failure to construct a value through a builder.
#[derive(Debug)]
pub enum BuilderError {
    /// A required field was never set; the name identifies it.
    MissingField(&'static str),
}

impl Display for BuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuilderError::MissingField(field) => {
                write!(f, "missing required field '{}'", field)
            }
        }
    }
}

impl Error for BuilderError {}

/// Name and duration of one timed step.
#[derive(Debug, Clone)]
pub struct SectionStats {
    pub name: String,
    pub duration: Duration,
}

impl SectionStats {
    pub fn new(name: &str, duration: Duration) -> Self {
        SectionStats { name: name.to_string(), duration }
    }
}

impl Display for SectionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<24} {:.3} seconds", self.name, self.duration.as_secs_f64())
    }
}

/// Times a single section; consumed by `end` so it cannot be read twice.
pub struct SubSectionTimer {
    start_time: Instant,
    section_name: String,
}

impl SubSectionTimer {
    pub fn new(name: &str) -> Self {
        SubSectionTimer { start_time: Instant::now(), section_name: name.to_string() }
    }

    pub fn end(self) -> SectionStats {
        SectionStats::new(&self.section_name, self.start_time.elapsed())
    }
}

/// Measures the overall run and collects completed section timings.
pub struct StatsTimer {
    start_time: Instant,
    sections: Vec<SectionStats>,
}

impl StatsTimer {
    pub fn new() -> Self {
        StatsTimer { start_time: Instant::now(), sections: Vec::new() }
    }

    pub fn start_section(&mut self, name: &str) -> SubSectionTimer {
        SubSectionTimer::new(name)
    }

    pub fn add_section(&mut self, section_stats: SectionStats) {
        self.sections.push(section_stats);
    }

    /// Stops the overall timing; returns the total duration and the
    /// collected sections.
    pub fn end(self) -> (Duration, Vec<SectionStats>) {
        (self.start_time.elapsed(), self.sections)
    }
}

impl Default for StatsTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// A `StatsTimer` that may be disabled; every method is a no-op then.
pub struct OptionalStatsTimer(Option<StatsTimer>);

impl OptionalStatsTimer {
    pub fn new(enabled: bool) -> Self {
        OptionalStatsTimer(enabled.then(StatsTimer::new))
    }

    pub fn start_section(&mut self, name: &str) -> Option<SubSectionTimer> {
        self.0.as_mut().map(|timer| timer.start_section(name))
    }

    pub fn add_section(&mut self, timer: Option<SubSectionTimer>) {
        if let (Some(sub_timer), Some(main_timer)) = (timer, self.0.as_mut()) {
            main_timer.add_section(sub_timer.end());
        }
    }

    /// Total duration and sections, or zeros when disabled.
    pub fn end(self) -> (Duration, Vec<SectionStats>) {
        self.0.map_or((Duration::ZERO, Vec::new()), StatsTimer::end)
    }
}

/// Metrics of one compression or decompression run.
#[derive(Debug, Clone)]
pub struct CompressionStats {
    /// Bytes going in (the csv for compression, the compressed file for
    /// decompression).
    pub original_len: usize,
    /// Bytes coming out.
    pub processed_len: usize,
    /// Size of the table header inside the compressed file, when known.
    pub header_len: Option<usize>,
    pub duration: Duration,
    pub is_compression: bool,
    pub sections: Vec<SectionStats>,

    /// `uncompressed / compressed`; 2.0 means the output is half the input.
    pub compression_ratio_factor: f64,
    /// Uncompressed throughput in MiB per second.
    pub speed_mib_s: f64,
    /// `uncompressed - compressed`; negative means the file grew.
    pub raw_byte_difference: i64,
    /// Absolute size change relative to the uncompressed size, percent.
    pub percentage_change: f64,
}

impl CompressionStats {
    fn calculate(
        original_len: usize,
        processed_len: usize,
        header_len: Option<usize>,
        duration: Duration,
        is_compression: bool,
        sections: Vec<SectionStats>,
    ) -> Self {
        let (uncompressed_len, compressed_len) = if is_compression {
            (original_len, processed_len)
        } else {
            (processed_len, original_len)
        };

        let compression_ratio_factor = if compressed_len == 0 {
            0.0
        } else {
            uncompressed_len as f64 / compressed_len as f64
        };

        let duration_secs = duration.as_secs_f64();
        let speed_mib_s = if duration_secs == 0.0 {
            f64::INFINITY
        } else {
            (uncompressed_len as f64 / MIB as f64) / duration_secs
        };

        let raw_byte_difference = uncompressed_len as i64 - compressed_len as i64;
        let percentage_change = if uncompressed_len == 0 {
            0.0
        } else {
            (raw_byte_difference.unsigned_abs() as f64 / uncompressed_len as f64) * 100.0
        };

        CompressionStats {
            original_len,
            processed_len,
            header_len,
            duration,
            is_compression,
            sections,
            compression_ratio_factor,
            speed_mib_s,
            raw_byte_difference,
            percentage_change,
        }
    }
}

impl Display for CompressionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = if self.is_compression { "Compression" } else { "Decompression" };
        let (uncompressed_len, compressed_len) = if self.is_compression {
            (self.original_len, self.processed_len)
        } else {
            (self.processed_len, self.original_len)
        };

        writeln!(f, "--- {} Statistics ---", title)?;
        writeln!(f, "    Uncompressed Size:   {}", format_bytes(uncompressed_len))?;
        writeln!(f, "    Compressed Size:     {}", format_bytes(compressed_len))?;
        if let Some(header_len) = self.header_len {
            writeln!(f, "    Header Size:         {}", format_bytes(header_len))?;
            writeln!(
                f,
                "    Payload Size:        {}",
                format_bytes(compressed_len.saturating_sub(header_len))
            )?;
        }
        writeln!(
            f,
            "    Bytes Difference:    {} ({})",
            self.raw_byte_difference,
            format_bytes(self.raw_byte_difference.unsigned_abs() as usize)
        )?;
        writeln!(
            f,
            "    Compression Ratio:   {:.3}:1 (uncompressed / compressed)",
            self.compression_ratio_factor
        )?;
        let change_label = if self.raw_byte_difference >= 0 { "Size Saved" } else { "Size Added" };
        writeln!(f, "    {}:          {:.2}%", change_label, self.percentage_change)?;
        writeln!(f, "    Processing Time:     {:.3} seconds", self.duration.as_secs_f64())?;
        writeln!(f, "    Throughput:          {:.2} MiB/s", self.speed_mib_s)?;

        if !self.sections.is_empty() {
            writeln!(f, "--- Detailed Processing Steps ---")?;
            for section in &self.sections {
                writeln!(f, "    - {}", section)?;
            }
        }
        Ok(())
    }
}

/// Builds [`CompressionStats`], checking that every required field is set.
#[derive(Default)]
pub struct CompressionStatsBuilder {
    original_len: Option<usize>,
    processed_len: Option<usize>,
    header_len: Option<usize>,
    duration: Option<Duration>,
    is_compression: Option<bool>,
    sections: Vec<SectionStats>,
}

impl CompressionStatsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn original_len(mut self, len: usize) -> Self {
        self.original_len = Some(len);
        self
    }

    pub fn processed_len(mut self, len: usize) -> Self {
        self.processed_len = Some(len);
        self
    }

    /// Optional: size of the table header inside the compressed file.
    pub fn header_len(mut self, len: usize) -> Self {
        self.header_len = Some(len);
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn is_compression(mut self, is_compression: bool) -> Self {
        self.is_compression = Some(is_compression);
        self
    }

    pub fn sections(mut self, sections: Vec<SectionStats>) -> Self {
        self.sections = sections;
        self
    }

    pub fn build(self) -> Result<CompressionStats, BuilderError> {
        let original_len =
            self.original_len.ok_or(BuilderError::MissingField("original_len"))?;
        let processed_len =
            self.processed_len.ok_or(BuilderError::MissingField("processed_len"))?;
        let duration = self.duration.ok_or(BuilderError::MissingField("duration"))?;
        let is_compression =
            self.is_compression.ok_or(BuilderError::MissingField("is_compression"))?;

        Ok(CompressionStats::calculate(
            original_len,
            processed_len,
            self.header_len,
            duration,
            is_compression,
            self.sections,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_computes_derived_metrics() {
        let stats = CompressionStatsBuilder::new()
            .original_len(1000)
            .processed_len(250)
            .header_len(50)
            .duration(Duration::from_secs(2))
            .is_compression(true)
            .build()
            .unwrap();

        assert_eq!(stats.compression_ratio_factor, 4.0);
        assert_eq!(stats.raw_byte_difference, 750);
        assert_eq!(stats.percentage_change, 75.0);
    }

    #[test]
    fn decompression_swaps_the_size_roles() {
        let stats = CompressionStatsBuilder::new()
            .original_len(250)
            .processed_len(1000)
            .duration(Duration::from_secs(1))
            .is_compression(false)
            .build()
            .unwrap();

        assert_eq!(stats.compression_ratio_factor, 4.0);
        assert_eq!(stats.raw_byte_difference, 750);
    }

    #[test]
    fn builder_reports_the_missing_field() {
        let result = CompressionStatsBuilder::new().original_len(10).build();
        assert!(matches!(result, Err(BuilderError::MissingField("processed_len"))));
    }

    #[test]
    fn disabled_timer_collects_nothing() {
        let mut timer = OptionalStatsTimer::new(false);
        let section = timer.start_section("never timed");
        assert!(section.is_none());
        timer.add_section(section);
        let (duration, sections) = timer.end();
        assert_eq!(duration, Duration::ZERO);
        assert!(sections.is_empty());
    }

    #[test]
    fn enabled_timer_collects_sections() {
        let mut timer = OptionalStatsTimer::new(true);
        let section = timer.start_section("step");
        timer.add_section(section);
        let (_, sections) = timer.end();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].name, "step");
    }

    #[test]
    fn formats_byte_counts() {
        assert_eq!(format_bytes(512), "512 bytes");
        assert_eq!(format_bytes(1024), "1.00 KiB");
        assert_eq!(format_bytes(1_572_864), "1.50 MiB");
    }
}
