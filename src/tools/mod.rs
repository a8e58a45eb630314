//! Built-in tool catalogue
//!
//! Each tool implements `crate::tool::Tool`. `catalog()` is the registration
//! table the registry is built from and re-scanned on reload.

mod common;
mod create_file;
mod delete_file;
mod extract_information;
mod extract_text_from_pdf;
mod move_file;
mod pdf_info;
mod pdf_split;
mod read_file;
mod run_command;
mod to_excel;
mod web_scrape;

pub use common::resolve_path;
pub use create_file::CreateFile;
pub use delete_file::DeleteFile;
pub use extract_information::ExtractInformation;
pub use extract_text_from_pdf::{extract_pdf_text, ExtractTextFromPdf};
pub use move_file::MoveFile;
pub use pdf_info::PdfInfo;
pub use pdf_split::PdfSplit;
pub use read_file::ReadFile;
pub use run_command::RunCommand;
pub use to_excel::{SheetData, ToExcel};
pub use web_scrape::{html_to_text, WebScrape};

use crate::tool::{Tool, ToolCatalog};
use std::sync::Arc;

/// Every built-in tool, in registration order
pub fn builtin_tools() -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(CreateFile),
        Arc::new(DeleteFile),
        Arc::new(MoveFile),
        Arc::new(ReadFile),
        Arc::new(RunCommand),
        Arc::new(WebScrape::new()),
        Arc::new(PdfInfo),
        Arc::new(ExtractTextFromPdf),
        Arc::new(PdfSplit),
        Arc::new(ToExcel),
        Arc::new(ExtractInformation),
    ]
}

pub fn catalog() -> ToolCatalog {
    Arc::new(builtin_tools)
}
