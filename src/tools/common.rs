//! Helpers shared by the built-in tools

use crate::tool::{ToolDefinition, ToolError};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Resolve a path argument against the working directory.
///
/// Relative paths join the working directory. An absolute `/x` whose
/// working-directory twin `./x` exists is redirected to the twin, since models
/// routinely drop the leading dot. Returns `None` for an empty argument.
pub fn resolve_path(raw: &str, working_dir: &Path) -> Option<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let requested = Path::new(raw);
    if requested.is_absolute() {
        let twin = working_dir.join(raw.trim_start_matches('/'));
        if twin.exists() {
            return Some(twin);
        }
        return Some(requested.to_path_buf());
    }

    Some(working_dir.join(requested))
}

/// Create the parent directory of `path` if it has one
pub async fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent).await,
        _ => Ok(()),
    }
}

pub fn definition(name: &str, description: &str, args_schema: &str) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        args_schema: args_schema.to_string(),
    }
}

/// Text payload for a file. Objects and arrays the model sent unquoted are
/// written as pretty JSON.
pub fn text_content(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => serde_json::to_string_pretty(&other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Optional non-negative integer, given as a number or as numeric text
pub fn optional_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected a non-negative integer, got {}", n))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected an integer, got \"{}\"", s))),
        Some(other) => Err(de::Error::custom(format!("expected an integer, got {}", other))),
    }
}

/// Run blocking work (PDF and spreadsheet libraries) off the async runtime
pub async fn blocking<T, F>(work: F) -> Result<T, ToolError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ToolError::Failed(format!("background task failed: {}", e)))
}

/// Build a small text PDF for tool tests, one page per entry
#[cfg(test)]
pub fn write_sample_pdf(path: &Path, pages: &[&str], title: Option<&str>) {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if let Some(title) = title {
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
            "Author" => Object::string_literal("Operations"),
        });
        doc.trailer.set("Info", info_id);
    }

    doc.save(path).unwrap();
}
