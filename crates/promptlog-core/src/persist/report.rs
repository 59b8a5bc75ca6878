//! Markdown summary report generated from a buffer.
//!
//! The report is a view of the buffer's items - it can be regenerated at
//! any time and never feeds back into the log.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::buffer::Buffer;
use crate::error::LogResult;
use crate::item::{format_timestamp, Item, ItemPayload};

/// Statistics about a set of items.
#[derive(Debug, Default)]
pub struct LogStats {
    pub total: usize,
    pub prompts: usize,
    pub completed_prompts: usize,
    pub pending_prompts: usize,
    pub events: usize,
    pub queries: usize,
}

impl LogStats {
    /// Count items by kind and completion state.
    pub fn from_items(items: &[Item]) -> Self {
        let mut stats = Self {
            total: items.len(),
            ..Self::default()
        };
        for item in items {
            match item.payload() {
                ItemPayload::Prompt { completion, .. } => {
                    stats.prompts += 1;
                    if completion.is_some() {
                        stats.completed_prompts += 1;
                    } else {
                        stats.pending_prompts += 1;
                    }
                }
                ItemPayload::Event { .. } => stats.events += 1,
                ItemPayload::Query { .. } => stats.queries += 1,
            }
        }
        stats
    }
}

/// Options for report generation.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Include the per-item detail sections
    pub include_detail: bool,

    /// Maximum entries per detail section (0 = unlimited)
    pub max_per_section: usize,

    /// Show full timestamps (vs time-of-day only)
    pub full_timestamps: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            include_detail: true,
            max_per_section: 0,
            full_timestamps: false,
        }
    }
}

/// Generate a markdown report for the buffer.
pub fn generate_report(buffer: &Buffer, options: &ReportOptions) -> String {
    let items = buffer.items();
    let title = match buffer.name() {
        Some(name) => format!("# Interaction Log - `{}`", name),
        None => "# Interaction Log".to_string(),
    };

    if items.is_empty() {
        return format!("{}\n\nNo items recorded.\n", title);
    }

    let stats = LogStats::from_items(&items);
    let mut report = String::new();

    writeln!(report, "{}", title).unwrap();
    writeln!(report).unwrap();

    if let (Some(first), Some(last)) = (items.first(), items.last()) {
        writeln!(
            report,
            "**Window:** {} to {}",
            format_timestamp(first.timestamp()),
            format_timestamp(last.timestamp())
        )
        .unwrap();
        writeln!(report).unwrap();
    }

    // Statistics table
    writeln!(report, "## Statistics").unwrap();
    writeln!(report).unwrap();
    writeln!(report, "| Kind | Count |").unwrap();
    writeln!(report, "|--------|-------|").unwrap();
    writeln!(report, "| Total | {} |", stats.total).unwrap();
    writeln!(report, "| Prompt | {} |", stats.prompts).unwrap();
    writeln!(report, "| Event | {} |", stats.events).unwrap();
    writeln!(report, "| Query | {} |", stats.queries).unwrap();
    writeln!(report).unwrap();
    writeln!(
        report,
        "{} of {} prompts completed, {} pending.",
        stats.completed_prompts, stats.prompts, stats.pending_prompts
    )
    .unwrap();
    writeln!(report).unwrap();

    // Pending prompts get their own section so they are hard to miss
    let pending: Vec<(usize, &Item)> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| matches!(item.payload(), ItemPayload::Prompt { completion: None, .. }))
        .collect();
    if !pending.is_empty() {
        writeln!(report, "## Pending prompts").unwrap();
        writeln!(report).unwrap();
        for (index, item) in &pending {
            let prompt = item.prompt().unwrap_or("");
            writeln!(
                report,
                "- **[{}]** {} - {:?}",
                index,
                short_timestamp(item, options),
                prompt
            )
            .unwrap();
        }
        writeln!(report).unwrap();
    }

    if options.include_detail {
        writeln!(report, "---").unwrap();
        writeln!(report).unwrap();
        writeln!(report, "## Items").unwrap();
        writeln!(report).unwrap();
        writeln!(report, "```log").unwrap();

        let shown = if options.max_per_section > 0 && items.len() > options.max_per_section {
            &items[..options.max_per_section]
        } else {
            &items[..]
        };
        for (index, item) in shown.iter().enumerate() {
            writeln!(
                report,
                "{} {} {} {}",
                index,
                short_timestamp(item, options),
                item.kind(),
                summary_line(item)
            )
            .unwrap();
        }
        if options.max_per_section > 0 && items.len() > options.max_per_section {
            writeln!(
                report,
                "... ({} more items truncated)",
                items.len() - options.max_per_section
            )
            .unwrap();
        }

        writeln!(report, "```").unwrap();
        writeln!(report).unwrap();
    }

    report
}

/// Write the report to `path`.
pub fn write_report(
    buffer: &Buffer,
    path: impl AsRef<Path>,
    options: &ReportOptions,
) -> LogResult<()> {
    let report = generate_report(buffer, options);
    fs::write(path, report)?;
    Ok(())
}

fn short_timestamp(item: &Item, options: &ReportOptions) -> String {
    let full = format_timestamp(item.timestamp());
    if options.full_timestamps {
        full
    } else {
        full.split('T').nth(1).unwrap_or(&full).to_string()
    }
}

fn summary_line(item: &Item) -> String {
    match item.payload() {
        ItemPayload::Prompt { prompt, completion } => {
            let state = if completion.is_some() { "done" } else { "pending" };
            format!("[{}] {:?}", state, prompt)
        }
        ItemPayload::Event { payload } => {
            let keys: Vec<&str> = payload.keys().map(String::as_str).collect();
            format!("keys: {}", keys.join(", "))
        }
        ItemPayload::Query {
            op_name,
            matched_indices,
        } => format!("{} ({} matched)", op_name, matched_indices.len()),
    }
}
