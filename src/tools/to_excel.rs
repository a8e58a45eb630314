//! Spreadsheet writer tool

use super::common::{blocking, definition, ensure_parent, resolve_path};
use crate::permissions::PermissionFlag;
use crate::tool::{Tool, ToolArgs, ToolContext, ToolDefinition, ToolError, ToolResult};
use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const DESCRIPTION: &str = "Writes data to an .xlsx file. Can create a new sheet from a list of dictionaries (rows) or from plain text.";
const ARGS_SCHEMA: &str = r#"{
  "output_path": "<string: path for the new .xlsx file>",
  "rows": "[<object>: optional, a list of data rows, e.g., [{'col1': 'valA'}, {'col1': 'valB'}]]",
  "text": "<string: optional, plain text to write line-by-line into the first column>",
  "template_path": "<string: optional, path to an existing .xlsx file to use as a template for headers>"
}"#;

#[derive(Debug, Deserialize)]
struct Args {
    #[serde(default)]
    output_path: Option<String>,
    /// A list of objects, or the same list as JSON/literal text
    #[serde(default)]
    rows: Option<Value>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    template_path: Option<String>,
}

pub struct ToExcel;

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("{0}")]
    Template(#[from] calamine::Error),
    #[error("{0}")]
    Write(#[from] XlsxError),
}

/// What goes into the single worksheet
#[derive(Debug, Clone, PartialEq)]
pub enum SheetData {
    /// Header row is the sorted union of keys, unless a template supplies it
    Rows(Vec<Map<String, Value>>),
    /// One line per row in the first column
    Text(String),
}

impl SheetData {
    /// Pick rows over text, accepting rows either as an array or as
    /// array-shaped text. `Ok(None)` when neither is given.
    pub fn from_parts(rows: Option<Value>, text: Option<String>) -> Result<Option<Self>, String> {
        let items = match rows {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(Value::String(text)) if text.trim().is_empty() => Vec::new(),
            Some(Value::String(text)) => parse_rows_text(&text)
                .ok_or_else(|| "Error: 'rows' must be a list of objects.".to_string())?,
            Some(_) => return Err("Error: 'rows' must be a list of objects.".to_string()),
        };

        if !items.is_empty() {
            let objects = items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| match item {
                    Value::Object(map) => Ok(map),
                    other => Err(format!(
                        "Error: Row {} in 'rows' is not an object: {}",
                        idx + 1,
                        other
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Some(SheetData::Rows(objects)));
        }

        Ok(text
            .filter(|text| !text.is_empty())
            .map(SheetData::Text))
    }
}

fn parse_rows_text(text: &str) -> Option<Vec<Value>> {
    if let Ok(Value::Array(items)) = serde_json::from_str(text) {
        return Some(items);
    }
    let yaml: serde_yaml::Value = serde_yaml::from_str(text).ok()?;
    match serde_json::to_value(yaml).ok()? {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

/// First worksheet of an existing workbook: its cells are carried over, its
/// first row names the columns, and new data goes below its last row
#[derive(Debug, Default)]
pub struct Template {
    cells: Vec<(u32, u16, Data)>,
    headers: Vec<Option<String>>,
    next_row: u32,
}

impl Template {
    pub fn load(path: &Path) -> Result<Self, calamine::Error> {
        let mut workbook = open_workbook_auto(path)?;
        let range = match workbook.worksheet_range_at(0) {
            Some(range) => range?,
            None => return Ok(Self::default()),
        };
        let (Some((first_row, first_col)), Some((last_row, last_col))) = (range.start(), range.end())
        else {
            return Ok(Self::default());
        };

        let cells = range
            .used_cells()
            .map(|(r, c, value)| (first_row + r as u32, (first_col + c as u32) as u16, value.clone()))
            .collect();

        let headers = if first_row == 0 {
            (0..=last_col)
                .map(|col| match range.get_value((0, col)) {
                    None | Some(Data::Empty) => None,
                    Some(Data::String(s)) => Some(s.clone()),
                    Some(other) => Some(other.to_string()),
                })
                .collect()
        } else {
            Vec::new()
        };

        Ok(Self {
            cells,
            headers,
            next_row: last_row + 1,
        })
    }

    fn has_headers(&self) -> bool {
        self.headers.iter().any(Option::is_some)
    }

    fn copy_into(&self, sheet: &mut Worksheet) -> Result<(), XlsxError> {
        for (row, col, value) in &self.cells {
            let (row, col) = (*row, *col);
            match value {
                Data::Empty => {}
                Data::String(s) => {
                    sheet.write_string(row, col, s)?;
                }
                Data::Int(i) => {
                    sheet.write_number(row, col, *i as f64)?;
                }
                Data::Float(f) => {
                    sheet.write_number(row, col, *f)?;
                }
                Data::Bool(b) => {
                    sheet.write_boolean(row, col, *b)?;
                }
                other => {
                    sheet.write_string(row, col, other.to_string())?;
                }
            }
        }
        Ok(())
    }
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, value: Option<&Value>) -> Result<(), XlsxError> {
    match value {
        None | Some(Value::Null) => {}
        Some(Value::String(s)) => {
            sheet.write_string(row, col, s)?;
        }
        Some(Value::Number(n)) => {
            sheet.write_number(row, col, n.as_f64().unwrap_or_default())?;
        }
        Some(Value::Bool(b)) => {
            sheet.write_boolean(row, col, *b)?;
        }
        Some(other) => {
            sheet.write_string(row, col, other.to_string())?;
        }
    }
    Ok(())
}

/// Write the sheet and save the workbook
pub fn write_workbook(path: &Path, data: &SheetData, template: Option<&Template>) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    let mut start_row = 0;
    if let Some(template) = template {
        template.copy_into(sheet)?;
        start_row = template.next_row;
    }

    match data {
        SheetData::Rows(rows) => {
            let headers: Vec<Option<String>> = match template.filter(|t| t.has_headers()) {
                Some(template) => template.headers.clone(),
                None => {
                    let keys: BTreeSet<&str> =
                        rows.iter().flat_map(|r| r.keys().map(String::as_str)).collect();
                    for (col, header) in keys.iter().enumerate() {
                        sheet.write_string(start_row, col as u16, *header)?;
                    }
                    start_row += 1;
                    keys.into_iter().map(|k| Some(k.to_string())).collect()
                }
            };
            for (idx, row) in rows.iter().enumerate() {
                let r = start_row + idx as u32;
                for (col, header) in headers.iter().enumerate() {
                    let value = header.as_deref().and_then(|h| row.get(h));
                    write_cell(sheet, r, col as u16, value)?;
                }
            }
        }
        SheetData::Text(text) => {
            for (idx, line) in text.trim().lines().enumerate() {
                sheet.write_string(start_row + idx as u32, 0, line)?;
            }
        }
    }

    workbook.save(path)
}

/// Save on a blocking thread and render the observation. A template that
/// does not exist is ignored.
pub async fn save_observation(
    path: PathBuf,
    data: SheetData,
    template_path: Option<PathBuf>,
) -> Result<ToolResult, ToolError> {
    if let Err(e) = ensure_parent(&path).await {
        return Ok(ToolResult::error(format!("Error writing to Excel file: {}", e)));
    }
    let target = path.clone();
    let saved = blocking(move || -> Result<(), SheetError> {
        let template = match template_path.filter(|p| p.exists()) {
            Some(template_path) => Some(Template::load(&template_path)?),
            None => None,
        };
        write_workbook(&target, &data, template.as_ref())?;
        Ok(())
    })
    .await?;
    Ok(match saved {
        Ok(()) => ToolResult::success(format!(
            "Successfully saved spreadsheet to {}",
            path.display()
        )),
        Err(e) => ToolResult::error(format!("Error writing to Excel file: {}", e)),
    })
}

#[async_trait]
impl Tool for ToExcel {
    fn name(&self) -> &str {
        "to_excel"
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
        let Some(path) = resolve_path(args.output_path.as_deref().unwrap_or_default(), &ctx.working_dir)
        else {
            return Ok(ToolResult::error("Error: 'output_path' is a required argument."));
        };
        let data = match SheetData::from_parts(args.rows, args.text) {
            Ok(Some(data)) => data,
            Ok(None) => {
                return Ok(ToolResult::error(
                    "Error: You must provide either 'rows' or 'text' data to write.",
                ))
            }
            Err(message) => return Ok(ToolResult::error(message)),
        };
        let template = args
            .template_path
            .as_deref()
            .and_then(|raw| resolve_path(raw, &ctx.working_dir));

        save_observation(path, data, template).await
    }
}
