//! PDF to spreadsheet workflow tool

use super::common::{definition, resolve_path};
use super::extract_text_from_pdf::extract_observation;
use super::to_excel::{save_observation, SheetData};
use crate::permissions::PermissionFlag;
use crate::tool::{Tool, ToolArgs, ToolContext, ToolDefinition, ToolError, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;

const DESCRIPTION: &str =
    "High-level tool to extract text from a PDF and immediately save it as a spreadsheet.";
const ARGS_SCHEMA: &str = r#"{"pdf_path": "<string: path to the source PDF>", "output_excel_path": "<string: path for the new .xlsx file>"}"#;

#[derive(Debug, Deserialize)]
struct Args {
    #[serde(default)]
    pdf_path: Option<String>,
    #[serde(default)]
    output_excel_path: Option<String>,
}

pub struct ExtractInformation;

#[async_trait]
impl Tool for ExtractInformation {
    fn name(&self) -> &str {
        "extract_information"
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
        let pdf = resolve_path(args.pdf_path.as_deref().unwrap_or_default(), &ctx.working_dir);
        let output =
            resolve_path(args.output_excel_path.as_deref().unwrap_or_default(), &ctx.working_dir);
        let (Some(pdf), Some(output)) = (pdf, output) else {
            return Ok(ToolResult::error(
                "Error: 'pdf_path' and 'output_excel_path' are required arguments.",
            ));
        };

        let extracted = extract_observation(pdf, None).await?;
        if extracted.is_error {
            return Ok(ToolResult::error(format!(
                "Error during PDF extraction step: {}",
                extracted.output
            )));
        }

        tracing::debug!(chars = extracted.output.len(), "Extracted PDF text, writing spreadsheet");
        save_observation(output, SheetData::Text(extracted.output), None).await
    }
}
