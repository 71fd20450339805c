//! Trace output formatters.
//!
//! Provides human-readable and JSON formatters for trace records.

use std::fmt::Write;

use mapexpr_foundation::ErrorCategory;

use super::record::{TraceEvent, TraceRecord};

// =============================================================================
// Trace Formatter Trait
// =============================================================================

/// Trait for formatting trace records.
pub trait TraceFormatter {
    /// Formats a single trace record to a string.
    fn format(&self, record: &TraceRecord) -> String;

    /// Formats multiple records.
    fn format_many(&self, records: &[&TraceRecord]) -> String {
        records
            .iter()
            .map(|r| self.format(r))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// =============================================================================
// Human-Readable Formatter
// =============================================================================

/// Formats trace records in human-readable form.
#[derive(Clone, Debug, Default)]
pub struct HumanFormatter {
    /// Whether to include timestamps.
    pub show_timestamps: bool,
    /// Whether to include record IDs.
    pub show_ids: bool,
}

impl HumanFormatter {
    /// Creates a new human formatter with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to show timestamps.
    #[must_use]
    pub fn with_timestamps(mut self) -> Self {
        self.show_timestamps = true;
        self
    }

    /// Builder method to show record IDs.
    #[must_use]
    pub fn with_ids(mut self) -> Self {
        self.show_ids = true;
        self
    }

    /// Formats timestamp in microseconds.
    #[allow(clippy::cast_precision_loss)]
    fn format_timestamp(ns: u64) -> String {
        let us = ns / 1000;
        if us >= 1_000_000 {
            format!("{:.3}s", us as f64 / 1_000_000.0)
        } else if us >= 1000 {
            format!("{:.3}ms", us as f64 / 1000.0)
        } else {
            format!("{us}us")
        }
    }
}

impl TraceFormatter for HumanFormatter {
    fn format(&self, record: &TraceRecord) -> String {
        let mut line = String::new();

        if self.show_ids {
            let _ = write!(line, "[{:06}] ", record.id);
        }

        let _ = write!(line, "R{:04} ", record.run);

        if self.show_timestamps {
            let _ = write!(line, "{:>10} ", Self::format_timestamp(record.timestamp_ns));
        }

        let _ = match &record.event {
            TraceEvent::RunStart { instructions } => {
                write!(line, "=== RUN START ({instructions} instructions) ===")
            }
            TraceEvent::Step {
                ip,
                instruction,
                stack_depth,
            } => write!(line, "  {ip:04}  {instruction:<12} depth={stack_depth}"),
            TraceEvent::RunEnd { result } => write!(line, "=== RUN END => {result} ==="),
            TraceEvent::Error { message, .. } => write!(line, "=== RUN FAILED: {message} ==="),
        };

        line
    }
}

// =============================================================================
// JSON Formatter
// =============================================================================

/// Formats trace records as JSON.
#[derive(Clone, Debug, Default)]
pub struct JsonFormatter {
    /// Whether to put each record of a batch on its own line.
    pub pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method for pretty printing.
    #[must_use]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Escapes a string for use inside JSON quotes.
    fn escape_string(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '"' => out.push_str("\\\""),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if u32::from(c) < 0x20 => {
                    let _ = write!(out, "\\u{:04x}", u32::from(c));
                }
                c => out.push(c),
            }
        }
        out
    }

    fn category_name(category: ErrorCategory) -> &'static str {
        match category {
            ErrorCategory::Syntax => "syntax",
            ErrorCategory::Semantic => "semantic",
            ErrorCategory::Runtime => "runtime",
        }
    }
}

impl TraceFormatter for JsonFormatter {
    fn format(&self, record: &TraceRecord) -> String {
        let event_data = match &record.event {
            TraceEvent::RunStart { instructions } => format!("\"instructions\":{instructions}"),
            TraceEvent::Step {
                ip,
                instruction,
                stack_depth,
            } => format!(
                "\"ip\":{ip},\"instruction\":\"{}\",\"stack_depth\":{stack_depth}",
                Self::escape_string(instruction)
            ),
            TraceEvent::RunEnd { result } => {
                format!("\"result\":\"{}\"", Self::escape_string(result))
            }
            TraceEvent::Error { message, category } => format!(
                "\"message\":\"{}\",\"category\":\"{}\"",
                Self::escape_string(message),
                Self::category_name(*category)
            ),
        };

        format!(
            "{{\"id\":{},\"run\":{},\"timestamp_ns\":{},\"type\":\"{}\",{}}}",
            record.id,
            record.run,
            record.timestamp_ns,
            record.event_type(),
            event_data
        )
    }

    fn format_many(&self, records: &[&TraceRecord]) -> String {
        let items: Vec<_> = records.iter().map(|r| self.format(r)).collect();
        if self.pretty {
            format!("[\n  {}\n]", items.join(",\n  "))
        } else {
            format!("[{}]", items.join(","))
        }
    }
}
