//! Static-HTML implementation of the browser seam.
//!
//! `HttpBrowser` fetches pages with the shared reqwest client and answers DOM
//! queries with regex extraction over the raw markup. Sites that only render
//! their menu through JavaScript come back thin and fail as `empty_page`
//! downstream; a headless CDP driver would implement the same `Browser`
//! trait. Session state is just the last response, so dropping the session
//! releases everything.

use crate::domain::error::ScrapeError;
use crate::domain::traits::{Browser, BrowserFactory, Navigation, PageLink};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Url};
use std::time::Duration;

pub struct HttpBrowserFactory {
    client: Client,
}

impl HttpBrowserFactory {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BrowserFactory for HttpBrowserFactory {
    async fn open(&self) -> Result<Box<dyn Browser>, ScrapeError> {
        Ok(Box::new(HttpBrowser {
            client: self.client.clone(),
            html: None,
            url: None,
        }))
    }
}

pub struct HttpBrowser {
    client: Client,
    html: Option<String>,
    url: Option<Url>,
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<Navigation, ScrapeError> {
        let fetch = async {
            let resp = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| ScrapeError::http_error(format!("request to {} failed: {}", url, e)))?;

            let status = resp.status().as_u16();
            let final_url = resp.url().clone();
            let content_type = resp
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let is_html = content_type
                .as_deref()
                .map(|ct| ct.contains("text/html") || ct.contains("application/xhtml"))
                .unwrap_or(true);

            let html = if status < 400 && is_html {
                Some(resp.text().await.map_err(|e| {
                    ScrapeError::http_error(format!("reading body of {} failed: {}", url, e))
                })?)
            } else {
                None
            };

            Ok::<_, ScrapeError>((status, final_url, content_type, html))
        };

        let (status, final_url, content_type, html) = tokio::time::timeout(timeout, fetch)
            .await
            .map_err(|_| {
                ScrapeError::timeout(format!(
                    "navigation to {} exceeded {} ms",
                    url,
                    timeout.as_millis()
                ))
            })??;

        self.html = html;
        self.url = Some(final_url.clone());

        Ok(Navigation {
            status,
            final_url: final_url.to_string(),
            content_type,
        })
    }

    async fn links(&self) -> Result<Vec<PageLink>, ScrapeError> {
        let (Some(html), Some(base)) = (self.html.as_deref(), self.url.as_ref()) else {
            return Ok(Vec::new());
        };
        Ok(extract_links(html, base))
    }

    async fn extract_text(&self, selectors: &[&str]) -> Result<Option<String>, ScrapeError> {
        let Some(html) = self.html.as_deref() else {
            return Ok(None);
        };

        let scope = selectors
            .iter()
            .find_map(|sel| select_block(html, sel))
            .unwrap_or(html);

        let text = strip_tags(scope);
        Ok(if text.is_empty() { None } else { Some(text) })
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), ScrapeError> {
        // Static fetch already holds the full document.
        Ok(())
    }
}

static ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a>"#)
        .expect("valid anchor regex")
});
static SCRIPT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style|noscript|head)\b.*?</(script|style|noscript|head)>")
        .expect("valid script regex")
});
static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]+>").expect("valid tag regex"));
static BLANKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").expect("valid blanks regex"));
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid lines regex"));

fn extract_links(html: &str, base: &Url) -> Vec<PageLink> {
    ANCHOR
        .captures_iter(html)
        .filter_map(|cap| {
            let raw = cap[1].trim();
            if raw.is_empty()
                || raw.starts_with('#')
                || raw.starts_with("mailto:")
                || raw.starts_with("tel:")
                || raw.starts_with("javascript:")
            {
                return None;
            }
            let resolved = base.join(raw).ok()?;
            Some(PageLink {
                href: resolved.to_string(),
                text: strip_tags(&cap[2]),
                root_relative: raw.starts_with('/') && !raw.starts_with("//"),
            })
        })
        .collect()
}

/// Slice out the first block matching a simplified selector: a bare element
/// name (`main`, `article`), `#id`, or `.class-token`. Returns `None` when
/// the document has no such block.
fn select_block<'a>(html: &'a str, selector: &str) -> Option<&'a str> {
    let pattern = if let Some(id) = selector.strip_prefix('#') {
        format!(
            r#"(?is)<(\w+)[^>]*\bid\s*=\s*["']{}["'][^>]*>(.*?)</\w+>"#,
            regex::escape(id)
        )
    } else if let Some(class) = selector.strip_prefix('.') {
        format!(
            r#"(?is)<(\w+)[^>]*\bclass\s*=\s*["'][^"']*{}[^"']*["'][^>]*>(.*?)</\w+>"#,
            regex::escape(class)
        )
    } else {
        format!(
            r#"(?is)<{0}\b[^>]*>(.*?)</{0}>"#,
            regex::escape(selector)
        )
    };

    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(html)?;
    caps.get(caps.len() - 1).map(|m| m.as_str())
}

/// Reduce markup to visible text: drop script/style/head blocks, comments
/// and tags, decode the common entities, collapse runs of whitespace.
pub fn strip_tags(html: &str) -> String {
    let text = SCRIPT_BLOCK.replace_all(html, " ");
    let text = COMMENT.replace_all(&text, " ");
    let text = TAG.replace_all(&text, "\n");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    let text = BLANKS.replace_all(&text, " ");
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let joined = lines.join("\n");
    BLANK_LINES.replace_all(&joined, "\n\n").trim().to_string()
}
