//! Plain-text views of console state.

use std::fmt::Write as _;

use crate::cache::CacheStatus;
use crate::entry::FaultEntry;
use crate::error::EntryIssue;
use crate::kind::Field;
use crate::submitter::BatchReport;
use crate::topology::TopologySnapshot;
use crate::workbench::Workbench;

/// One line per entry with its visible fields. A `*` marks a field holding
/// an unparsed draft.
pub fn render_entries(wb: &Workbench) -> String {
    let mut out = String::new();
    let total = wb.entries().len();
    for (idx, entry) in wb.entries().iter().enumerate() {
        let _ = write!(out, "{:>4} [{}/{}] {:<20}", entry.id, idx + 1, total, entry.kind());
        for field in entry.kind().relevant_fields().iter() {
            if field == Field::Kind {
                continue;
            }
            let (text, pending) = match wb.controller(entry.id) {
                Some(c) => (c.text(field).to_string(), c.is_pending(field)),
                None => (entry.value_text(field), false),
            };
            let shown = if text.is_empty() { "-" } else { text.as_str() };
            let marker = if pending { "*" } else { "" };
            let _ = write!(out, " {field}={shown}{marker}");
        }
        out.push('\n');
    }
    out
}

pub fn render_entry_line(entry: &FaultEntry) -> String {
    let fields: Vec<String> = entry
        .kind()
        .relevant_fields()
        .iter()
        .filter(|f| *f != Field::Kind)
        .map(|f| {
            let value = entry.value_text(f);
            format!("{f}={}", if value.is_empty() { "-" } else { value.as_str() })
        })
        .collect();
    format!("{} {} {}", entry.id, entry.kind(), fields.join(" "))
}

pub fn render_topology(topology: &TopologySnapshot, status: &CacheStatus) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "topology: {}", describe_status(status));
    if topology.is_empty() {
        out.push_str("  (no nodes)\n");
        return out;
    }
    for node in &topology.nodes {
        let interfaces = topology.interfaces(node);
        let _ = writeln!(
            out,
            "  node {:<16} interfaces: {}",
            node,
            if interfaces.is_empty() {
                "-".to_string()
            } else {
                interfaces.join(", ")
            }
        );
    }
    for link in &topology.links {
        let _ = writeln!(out, "  link {}", link.key());
    }
    out
}

pub fn describe_status(status: &CacheStatus) -> String {
    match status {
        CacheStatus::NotFetched { seeded_at: None } => "not fetched".to_string(),
        CacheStatus::NotFetched {
            seeded_at: Some(at),
        } => format!("restored from session (saved {}), not yet refreshed", at.to_rfc3339()),
        CacheStatus::Fresh { fetched_at } => format!("fresh (fetched {})", fetched_at.to_rfc3339()),
        CacheStatus::Failed { error } => format!("unavailable: {error}"),
    }
}

pub fn render_status(wb: &Workbench) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "topology:   {}", describe_status(wb.cache().status()));
    let _ = writeln!(out, "            {}", wb.topology().summary());
    let _ = writeln!(out, "entries:    {}", wb.entries().len());
    let refresh = if wb.is_refreshing() { "in flight" } else { "idle" };
    let _ = writeln!(out, "refresh:    {refresh}");
    let submit = if wb.is_submitting() { "in flight (edits locked)" } else { "idle" };
    let _ = writeln!(out, "submission: {submit}");
    if let Some(report) = wb.last_report() {
        let _ = writeln!(
            out,
            "last batch: {} at {}",
            report.outcome,
            report.completed_at.to_rfc3339()
        );
    }
    out
}

pub fn render_issues(issues: &[EntryIssue]) -> String {
    if issues.is_empty() {
        return "no issues\n".to_string();
    }
    let mut out = String::new();
    for issue in issues {
        let _ = writeln!(out, "  {issue}");
    }
    out
}

pub fn render_report(report: &BatchReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "batch {}: {}", report.outcome, report.message);
    for item in &report.items {
        let _ = writeln!(
            out,
            "  [{}] {} {:<8} {} - {}",
            item.position, item.entry, item.status, item.target_display, item.message
        );
    }
    for notice in &report.notices {
        let _ = writeln!(out, "  note: {notice}");
    }
    out
}

pub fn render_options(field: Field, values: &[String]) -> String {
    if values.is_empty() {
        return format!("{field}: no selectable values\n");
    }
    let mut out = format!("{field}:\n");
    for value in values {
        let _ = writeln!(out, "  {value}");
    }
    out
}
