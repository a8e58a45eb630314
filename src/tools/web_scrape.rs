//! Web scrape tool - HTTP GET and reduce the page to plain text

use super::common::definition;
use crate::permissions::PermissionFlag;
use crate::tool::{Tool, ToolArgs, ToolContext, ToolDefinition, ToolError, ToolResult};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Node, Selector};
use serde::Deserialize;
use std::time::Duration;

const TIMEOUT_SECS: u64 = 15;
const USER_AGENT: &str = "overseer/0.1 (AI Assistant)";

/// Tags whose entire subtree is dropped
const SKIP_TAGS: [&str; 2] = ["script", "style"];

const DESCRIPTION: &str = "Fetches the text content of a given URL, stripping all HTML tags.";
const ARGS_SCHEMA: &str = r#"{"url": "<string: The full URL to scrape>"}"#;

#[derive(Debug, Deserialize)]
struct Args {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum ScrapeError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP error: {0}")]
    Http(String),
}

#[derive(Clone, Default)]
pub struct WebScrape {
    client: Client,
}

impl WebScrape {
    pub fn new() -> Self {
        Self::default()
    }

    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ScrapeError::Http(response.status().to_string()));
        }

        Ok(response.text().await?)
    }
}

/// Extract readable text from HTML, one text run per line
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next());
    let root = body.unwrap_or_else(|| document.root_element());

    let mut parts = Vec::new();
    collect_text(root, &mut parts);
    parts.join("\n")
}

fn collect_text(element: ElementRef, parts: &mut Vec<String>) {
    if SKIP_TAGS.contains(&element.value().name()) {
        return;
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let t = text.trim();
                if !t.is_empty() {
                    parts.push(t.to_string());
                }
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, parts);
                }
            }
            _ => {}
        }
    }
}

#[async_trait]
impl Tool for WebScrape {
    fn name(&self) -> &str {
        "web_scrape"
    }

    fn definition(&self) -> ToolDefinition {
        definition(self.name(), DESCRIPTION, ARGS_SCHEMA)
    }

    async fn execute(&self, args: ToolArgs, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        if !ctx.allows(PermissionFlag::Network) {
            return Ok(ToolResult::error(
                "Error: Network access is disabled by permissions.",
            ));
        }

        let args: Args = args.parse()?;
        let url = args.url.as_deref().unwrap_or_default().trim();
        if url.is_empty() {
            return Ok(ToolResult::error("Error: 'url' argument is required."));
        }

        tracing::info!(url, "Scraping URL");
        Ok(match self.fetch(url).await {
            Ok(html) => ToolResult::success(html_to_text(&html)),
            Err(e) => ToolResult::error(format!("Error retrieving or parsing URL: {}", e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::PermissionGate;
    use crate::tool::ToolInput;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Arc;

    #[test]
    fn test_html_to_text_strips_scripts_and_styles() {
        let html = r#"<html><head><style>body { color: red; }</style></head>
            <body><h1>Title</h1><script>var x = 1;</script><p>First <b>bold</b> para.</p></body></html>"#;
        let text = html_to_text(html);
        assert_eq!(text, "Title\nFirst\nbold\npara.");
        assert!(!text.contains("var x"));
        assert!(!text.contains("color"));
    }

    #[test]
    fn test_html_without_body() {
        assert_eq!(html_to_text("just text"), "just text");
    }

    #[tokio::test]
    async fn test_denied_without_network() {
        let gate = PermissionGate::with_flags([(PermissionFlag::Network, false)]);
        let ctx = ToolContext::new(PathBuf::from("."), Arc::new(gate));
        let args = ToolInput::from(json!({"url": "https://example.com"})).normalize().unwrap();
        let result = WebScrape::new().execute(args, &ctx).await.unwrap();
        assert_eq!(result.output, "Error: Network access is disabled by permissions.");
    }

    #[tokio::test]
    async fn test_requires_url() {
        let ctx = ToolContext::new(PathBuf::from("."), Arc::new(PermissionGate::new()));
        let result = WebScrape::new().execute(ToolArgs::default(), &ctx).await.unwrap();
        assert_eq!(result.output, "Error: 'url' argument is required.");
    }
}
