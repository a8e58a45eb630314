//! PDF info tool - page count and document metadata

use super::common::{blocking, definition, resolve_path};
use crate::tool::{Tool, ToolArgs, ToolContext, ToolDefinition, ToolError, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use lopdf::{Document, Object};
use serde_json::json;

const DESCRIPTION: &str =
    "Returns metadata about a PDF file, such as the number of pages and title.";
const ARGS_SCHEMA: &str = r#"{"pdf_path": "<string: The path to the PDF file>"}"#;

#[derive(Debug, Deserialize)]
struct Args {
    #[serde(default)]
    pdf_path: Option<String>,
}

pub struct PdfInfo;

/// Decode a PDF text string (UTF-16BE with BOM, otherwise byte text)
fn decode_pdf_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Look up a string entry in the document information dictionary
fn info_field(doc: &Document, key: &[u8]) -> Option<String> {
    let info = match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok()?,
        Object::Dictionary(dict) => dict,
        _ => return None,
    };
    match info.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

#[async_trait]
impl Tool for PdfInfo {
    fn name(&self) -> &str {
        "pdf_info"
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
        if !path.exists() {
            return Ok(ToolResult::error(format!(
                "Error: PDF file not found at: {}",
                path.display()
            )));
        }

        let loaded = blocking(move || Document::load(&path)).await?;
        let doc = match loaded {
            Ok(doc) => doc,
            Err(e) => return Ok(ToolResult::error(format!("Error getting PDF info: {}", e))),
        };

        let info = json!({
            "page_count": doc.get_pages().len(),
            "title": info_field(&doc, b"Title").unwrap_or_else(|| "N/A".to_string()),
            "author": info_field(&doc, b"Author").unwrap_or_else(|| "N/A".to_string()),
        });
        Ok(ToolResult::success(format!("PDF Info: {}", info)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::PermissionGate;
    use crate::tools::common::write_sample_pdf;
    use crate::tool::ToolInput;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_decode_utf16_title() {
        let bytes = [0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_pdf_string(&bytes), "Hi");
        assert_eq!(decode_pdf_string(b"Plain"), "Plain");
    }

    #[tokio::test]
    async fn test_reports_pages_and_title() {
        let dir = TempDir::new().unwrap();
        write_sample_pdf(&dir.path().join("report.pdf"), &["one", "two", "three"], Some("Quarterly"));
        let ctx = ToolContext::new(dir.path().to_path_buf(), Arc::new(PermissionGate::new()));

        let args = ToolInput::from(json!({"pdf_path": "report.pdf"})).normalize().unwrap();
        let result = PdfInfo.execute(args, &ctx).await.unwrap();

        assert!(!result.is_error, "{}", result.output);
        assert!(result.output.starts_with("PDF Info: "));
        assert!(result.output.contains(r#""page_count":3"#));
        assert!(result.output.contains(r#""title":"Quarterly""#));
    }

    #[tokio::test]
    async fn test_missing_metadata_is_na() {
        let dir = TempDir::new().unwrap();
        write_sample_pdf(&dir.path().join("bare.pdf"), &["only"], None);
        let ctx = ToolContext::new(dir.path().to_path_buf(), Arc::new(PermissionGate::new()));

        let args = ToolInput::from(json!({"pdf_path": "bare.pdf"})).normalize().unwrap();
        let result = PdfInfo.execute(args, &ctx).await.unwrap();
        assert!(result.output.contains(r#""author":"N/A""#));
    }
}
