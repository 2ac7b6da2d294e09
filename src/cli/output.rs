use std::fmt::Write as FmtWrite;

use crate::models::{IngestReport, OutputFormat};

pub trait Formatter {
    fn format_ingest_report(&self, report: &IngestReport) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct StatusInfo {
    pub backend_url: String,
    pub backend_connected: bool,
    pub backend_version: Option<String>,
    pub embedding_model: String,
    pub generation_model: String,
    pub vector_store_driver: String,
    pub vector_store_url: String,
    pub vector_store_connected: bool,
    pub vector_store_points: u64,
    pub collection: String,
    /// Embedding model recorded when the index was built, if known.
    pub indexed_model: Option<String>,
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_ingest_report(&self, report: &IngestReport) -> String {
        let mut output = String::new();
        writeln!(output, "Ingest Complete").unwrap();
        writeln!(output, "---------------").unwrap();
        writeln!(output, "Files scanned: {}", report.files_scanned).unwrap();
        writeln!(output, "Files skipped: {}", report.files_skipped).unwrap();
        writeln!(output, "Documents loaded: {}", report.documents_loaded).unwrap();
        writeln!(output, "Chunks created: {}", report.chunks_created).unwrap();
        writeln!(output, "Chunks added: {}", report.chunks_added).unwrap();
        writeln!(output, "Duration: {}ms", report.duration_ms).unwrap();
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();

        let backend_status = if status.backend_connected {
            "[CONNECTED]"
        } else {
            "[DISCONNECTED]"
        };
        writeln!(output, "Model Backend: {}", backend_status).unwrap();
        writeln!(output, "  URL:         {}", status.backend_url).unwrap();
        if let Some(ref version) = status.backend_version {
            writeln!(output, "  Version:     {}", version).unwrap();
        }
        writeln!(output, "  Embedding:   {}", status.embedding_model).unwrap();
        writeln!(output, "  Generation:  {}", status.generation_model).unwrap();
        writeln!(output).unwrap();

        let vector_status = if status.vector_store_connected {
            "[CONNECTED]"
        } else {
            "[DISCONNECTED]"
        };
        writeln!(
            output,
            "Vector Index:  {} ({})",
            status.vector_store_driver, vector_status
        )
        .unwrap();
        if status.vector_store_connected {
            writeln!(output, "  URL:         {}", status.vector_store_url).unwrap();
            writeln!(output, "  Collection:  {}", status.collection).unwrap();
            writeln!(output, "  Points:      {}", status.vector_store_points).unwrap();
            if let Some(ref model) = status.indexed_model {
                writeln!(output, "  Built with:  {}", model).unwrap();
            }
        }

        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render(&self, json: &serde_json::Value) -> String {
        if self.pretty {
            serde_json::to_string_pretty(json).unwrap_or_default()
        } else {
            serde_json::to_string(json).unwrap_or_default()
        }
    }
}

impl Formatter for JsonFormatter {
    fn format_ingest_report(&self, report: &IngestReport) -> String {
        let json = serde_json::json!({
            "files_scanned": report.files_scanned,
            "files_skipped": report.files_skipped,
            "documents_loaded": report.documents_loaded,
            "chunks_created": report.chunks_created,
            "chunks_added": report.chunks_added,
            "duration_ms": report.duration_ms,
        });
        self.render(&json)
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let json = serde_json::json!({
            "backend": {
                "url": status.backend_url,
                "connected": status.backend_connected,
                "version": status.backend_version,
                "embedding_model": status.embedding_model,
                "generation_model": status.generation_model,
            },
            "vector_index": {
                "driver": status.vector_store_driver,
                "url": status.vector_store_url,
                "connected": status.vector_store_connected,
                "collection": status.collection,
                "points": status.vector_store_points,
                "indexed_model": status.indexed_model,
            }
        });
        self.render(&json)
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string()
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_ingest_report(&self, report: &IngestReport) -> String {
        let mut output = String::new();
        writeln!(output, "## Ingest Complete\n").unwrap();
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Files scanned | {} |", report.files_scanned).unwrap();
        writeln!(output, "| Files skipped | {} |", report.files_skipped).unwrap();
        writeln!(output, "| Documents loaded | {} |", report.documents_loaded).unwrap();
        writeln!(output, "| Chunks created | {} |", report.chunks_created).unwrap();
        writeln!(output, "| Chunks added | {} |", report.chunks_added).unwrap();
        writeln!(output, "| Duration | {}ms |", report.duration_ms).unwrap();
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "## Status\n").unwrap();

        let backend_status = if status.backend_connected { "✅" } else { "❌" };
        writeln!(output, "### Model Backend {}\n", backend_status).unwrap();
        writeln!(output, "- **URL:** `{}`", status.backend_url).unwrap();
        if let Some(ref version) = status.backend_version {
            writeln!(output, "- **Version:** {}", version).unwrap();
        }
        writeln!(output, "- **Embedding:** {}", status.embedding_model).unwrap();
        writeln!(output, "- **Generation:** {}", status.generation_model).unwrap();
        writeln!(output).unwrap();

        let vector_status = if status.vector_store_connected {
            "✅"
        } else {
            "❌"
        };
        writeln!(
            output,
            "### Vector Index ({}) {}\n",
            status.vector_store_driver, vector_status
        )
        .unwrap();
        writeln!(output, "- **URL:** `{}`", status.vector_store_url).unwrap();
        writeln!(output, "- **Collection:** {}", status.collection).unwrap();
        writeln!(output, "- **Points:** {}", status.vector_store_points).unwrap();
        if let Some(ref model) = status.indexed_model {
            writeln!(output, "- **Built with:** {}", model).unwrap();
        }

        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("> ⚠️ **Error:** {}\n", error)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}
