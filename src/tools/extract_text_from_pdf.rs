//! PDF text extraction tool

use super::common::{blocking, definition, optional_count, resolve_path};
use crate::tool::{Tool, ToolArgs, ToolContext, ToolDefinition, ToolError, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use lopdf::Document;
use std::path::Path;

const DESCRIPTION: &str = "Extracts all text from a PDF file using direct text extraction.";
const ARGS_SCHEMA: &str = r#"{"pdf_path": "<string: path to the PDF file>", "page_limit": "<integer: optional, number of pages to process>"}"#;

/// Page separator in the extracted text
const PAGE_BREAK: char = '\u{c}';

#[derive(Debug, Deserialize)]
struct Args {
    #[serde(default)]
    pdf_path: Option<String>,
    #[serde(default, deserialize_with = "optional_count")]
    page_limit: Option<u64>,
}

pub struct ExtractTextFromPdf;

/// Extract text from the first `page_limit` pages (all when `None` or 0),
/// pages separated by form feeds. Returns an empty string for image-only PDFs.
pub fn extract_pdf_text(path: &Path, page_limit: Option<u64>) -> Result<String, lopdf::Error> {
    let doc = Document::load(path)?;
    let limit = match page_limit {
        None | Some(0) => usize::MAX,
        Some(n) => usize::try_from(n).unwrap_or(usize::MAX),
    };

    let mut text = String::new();
    for page_number in doc.get_pages().into_keys().take(limit) {
        // A page with an unreadable content stream contributes nothing
        match doc.extract_text(&[page_number]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => tracing::debug!(page = page_number, error = %e, "Skipping unreadable page"),
        }
        text.push(PAGE_BREAK);
    }

    Ok(text.trim().to_string())
}

/// Shared by the extraction and workflow tools
pub async fn extract_observation(path: std::path::PathBuf, page_limit: Option<u64>) -> Result<ToolResult, ToolError> {
    if !path.exists() {
        return Ok(ToolResult::error(format!(
            "Error: PDF file not found at: {}",
            path.display()
        )));
    }

    let extracted = blocking(move || extract_pdf_text(&path, page_limit)).await?;
    Ok(match extracted {
        Ok(text) if text.is_empty() => {
            ToolResult::error("Error: No text could be extracted from the PDF.")
        }
        Ok(text) => ToolResult::success(text),
        Err(e) => ToolResult::error(format!("Error processing PDF: {}", e)),
    })
}

#[async_trait]
impl Tool for ExtractTextFromPdf {
    fn name(&self) -> &str {
        "extract_text_from_pdf"
    }

    fn definition(&self) -> ToolDefinition {
        definition(self.name(), DESCRIPTION, ARGS_SCHEMA)
    }

    async fn execute(&self, args: ToolArgs, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let args: Args = args.parse()?;
        let Some(path) = resolve_path(args.pdf_path.as_deref().unwrap_or_default(), &ctx.working_dir)
        else {
            return Ok(ToolResult::error("Error: 'pdf_path' argument is required."));
        };
        extract_observation(path, args.page_limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::PermissionGate;
    use crate::tool::ToolInput;
    use crate::tools::common::write_sample_pdf;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_extracts_pages_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.pdf");
        write_sample_pdf(&path, &["Alpha", "Bravo"], None);

        let text = extract_pdf_text(&path, None).unwrap();
        let alpha = text.find("Alpha").unwrap();
        let bravo = text.find("Bravo").unwrap();
        assert!(alpha < bravo);
        assert!(text.contains(PAGE_BREAK));
    }

    #[test]
    fn test_page_limit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.pdf");
        write_sample_pdf(&path, &["Alpha", "Bravo"], None);

        let text = extract_pdf_text(&path, Some(1)).unwrap();
        assert!(text.contains("Alpha"));
        assert!(!text.contains("Bravo"));
    }

    #[test]
    fn test_zero_page_limit_means_all_pages() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.pdf");
        write_sample_pdf(&path, &["Alpha", "Bravo"], None);

        let text = extract_pdf_text(&path, Some(0)).unwrap();
        assert!(text.contains("Alpha"));
        assert!(text.contains("Bravo"));
    }

    #[tokio::test]
    async fn test_page_limit_as_text() {
        let dir = TempDir::new().unwrap();
        write_sample_pdf(&dir.path().join("doc.pdf"), &["Alpha", "Bravo"], None);
        let ctx = ToolContext::new(dir.path().to_path_buf(), Arc::new(PermissionGate::new()));

        let args = ToolInput::from(json!({"pdf_path": "doc.pdf", "page_limit": "1"}))
            .normalize()
            .unwrap();
        let result = ExtractTextFromPdf.execute(args, &ctx).await.unwrap();
        assert!(result.output.contains("Alpha"));
        assert!(!result.output.contains("Bravo"));
    }

    #[tokio::test]
    async fn test_missing_pdf() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path().to_path_buf(), Arc::new(PermissionGate::new()));
        let args = ToolInput::from(json!({"pdf_path": "nope.pdf"})).normalize().unwrap();
        let result = ExtractTextFromPdf.execute(args, &ctx).await.unwrap();
        assert!(result.output.starts_with("Error: PDF file not found at:"));
    }
}
