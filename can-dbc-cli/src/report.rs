//! Report generation
//!
//! Summarises the registry as plain text or JSON.

use anyhow::Result;
use can_dbc_registry::{Registry, SourceId};
use serde::Serialize;
use std::fmt::Write;

/// Snapshot of the registry contents
#[derive(Debug, Serialize)]
pub struct Summary {
    pub files: Vec<FileSummary>,
    pub active_sources: Vec<SourceId>,
    pub total_messages: usize,
    pub signal_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceView>,
}

#[derive(Debug, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub sources: String,
    pub messages: usize,
    pub signals: usize,
}

/// Messages as seen on one source
#[derive(Debug, Serialize)]
pub struct SourceView {
    pub source: SourceId,
    pub file: Option<String>,
    pub messages: Vec<MessageRow>,
}

#[derive(Debug, Serialize)]
pub struct MessageRow {
    pub id: String,
    pub name: String,
    pub size: u32,
    pub signals: Vec<String>,
}

impl Summary {
    /// Collect a summary; `source` adds the per-source message listing
    pub fn collect(registry: &Registry, source: Option<SourceId>) -> Self {
        let files = registry
            .bindings()
            .iter()
            .map(|b| FileSummary {
                name: b.file().name().to_string(),
                sources: b.sources().to_string(),
                messages: b.file().message_count(),
                signals: b.file().signal_count(),
            })
            .collect();

        let source = source.map(|source| SourceView {
            source,
            file: registry.file_for_source(source).map(|f| f.name().to_string()),
            messages: registry
                .messages_for_source(source)
                .into_iter()
                .map(|(id, msg)| MessageRow {
                    id: id.to_string(),
                    name: msg.name,
                    size: msg.size,
                    signals: msg.signals.into_iter().map(|s| s.name).collect(),
                })
                .collect(),
        });

        Self {
            files,
            active_sources: registry.active_sources().iter().collect(),
            total_messages: registry.message_count(),
            signal_names: registry.signal_names(),
            source,
        }
    }
}

/// Render the summary as a plain text report
pub fn render_txt(summary: &Summary) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "═══════════════════════════════════════════════");
    let _ = writeln!(out, "  DBC Registry");
    let _ = writeln!(out, "═══════════════════════════════════════════════\n");

    let _ = writeln!(out, "Files: {}", summary.files.len());
    for file in &summary.files {
        let _ = writeln!(
            out,
            "  {:<40} sources {:<12} {} messages, {} signals",
            file.name, file.sources, file.messages, file.signals
        );
    }

    let active: Vec<String> = summary.active_sources.iter().map(|s| s.to_string()).collect();
    let active = if active.is_empty() {
        "-".to_string()
    } else {
        active.join(", ")
    };
    let _ = writeln!(out, "\nActive sources: {}", active);
    let _ = writeln!(out, "Total messages: {}", summary.total_messages);
    let _ = writeln!(out, "Unique signals: {}", summary.signal_names.len());

    if let Some(view) = &summary.source {
        let _ = writeln!(out, "\n───────────────────────────────────────────────");
        match &view.file {
            Some(file) => {
                let _ = writeln!(out, "Source {} uses {}", view.source, file);
            }
            None => {
                let _ = writeln!(out, "Source {} has no DBC file", view.source);
            }
        }
        for msg in &view.messages {
            let _ = writeln!(
                out,
                "  {:<10} {:<32} [{}] {}",
                msg.id,
                msg.name,
                msg.size,
                msg.signals.join(", ")
            );
        }
    }

    out
}

/// Render the summary as pretty-printed JSON
pub fn render_json(summary: &Summary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}
