//! PDF split tool - one single-page PDF per source page

use super::common::{blocking, definition, resolve_path};
use crate::permissions::PermissionFlag;
use crate::tool::{Tool, ToolArgs, ToolContext, ToolDefinition, ToolError, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use lopdf::Document;
use std::path::Path;

const DEFAULT_OUTPUT_DIR: &str = "output_pages";

const DESCRIPTION: &str = "Splits each page of a PDF into a separate, single-page PDF file.";
const ARGS_SCHEMA: &str = r#"{"pdf_path": "<string: path to the source PDF>", "output_dir": "<string: optional, directory to save page files, defaults to 'output_pages'>"}"#;

#[derive(Debug, Deserialize)]
struct Args {
    #[serde(default)]
    pdf_path: Option<String>,
    #[serde(default)]
    output_dir: Option<String>,
}

pub struct PdfSplit;

/// Write `<stem>_page_<n>.pdf` for every page; returns the page count
fn split_pages(source: &Path, output_dir: &Path) -> Result<usize, lopdf::Error> {
    std::fs::create_dir_all(output_dir)?;
    let doc = Document::load(source)?;
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    let page_numbers: Vec<u32> = doc.get_pages().into_keys().collect();
    for &keep in &page_numbers {
        let mut single = doc.clone();
        let others: Vec<u32> = page_numbers.iter().copied().filter(|&n| n != keep).collect();
        single.delete_pages(&others);
        single.prune_objects();
        single.save(output_dir.join(format!("{}_page_{}.pdf", stem, keep)))?;
    }

    Ok(page_numbers.len())
}

#[async_trait]
impl Tool for PdfSplit {
    fn name(&self) -> &str {
        "pdf_split"
    }

    fn definition(&self) -> ToolDefinition {
        definition(self.name(), DESCRIPTION, ARGS_SCHEMA)
    }

    async fn execute(&self, args: ToolArgs, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        if !ctx.allows(PermissionFlag::FileCreate) {
            return Ok(ToolResult::error(
                "Error: File creation is disabled by permissions.",
            ));
        }

        let args: Args = args.parse()?;
        let Some(source) = resolve_path(args.pdf_path.as_deref().unwrap_or_default(), &ctx.working_dir)
        else {
            return Ok(ToolResult::error("Error: 'pdf_path' argument is required."));
        };
        if !source.exists() {
            return Ok(ToolResult::error(format!(
                "Error: PDF file not found at: {}",
                source.display()
            )));
        }

        let output_arg = match args.output_dir.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_OUTPUT_DIR,
            Some(dir) => dir,
        };
        let Some(output_dir) = resolve_path(output_arg, &ctx.working_dir) else {
            return Ok(ToolResult::error("Error: 'output_dir' is not a valid path."));
        };

        let target = output_dir.clone();
        let split = blocking(move || split_pages(&source, &target)).await?;
        Ok(match split {
            Ok(count) => ToolResult::success(format!(
                "Successfully split {} pages into the directory: {}",
                count,
                output_dir.display()
            )),
            Err(e) => ToolResult::error(format!("Error splitting PDF: {}", e)),
        })
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

    #[tokio::test]
    async fn test_splits_into_default_directory() {
        let dir = TempDir::new().unwrap();
        write_sample_pdf(&dir.path().join("deck.pdf"), &["one", "two"], None);
        let ctx = ToolContext::new(dir.path().to_path_buf(), Arc::new(PermissionGate::new()));

        let args = ToolInput::from(json!({"pdf_path": "deck.pdf"})).normalize().unwrap();
        let result = PdfSplit.execute(args, &ctx).await.unwrap();

        assert!(!result.is_error, "{}", result.output);
        assert!(result.output.starts_with("Successfully split 2 pages"));
        for n in 1..=2 {
            let page = dir.path().join(format!("output_pages/deck_page_{}.pdf", n));
            let doc = Document::load(&page).unwrap();
            assert_eq!(doc.get_pages().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_denied_without_permission() {
        let dir = TempDir::new().unwrap();
        let gate = PermissionGate::with_flags([(PermissionFlag::FileCreate, false)]);
        let ctx = ToolContext::new(dir.path().to_path_buf(), Arc::new(gate));
        let args = ToolInput::from(json!({"pdf_path": "deck.pdf"})).normalize().unwrap();
        let result = PdfSplit.execute(args, &ctx).await.unwrap();
        assert_eq!(result.output, "Error: File creation is disabled by permissions.");
    }
}
