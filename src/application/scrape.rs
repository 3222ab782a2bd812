//! Content scraper: drives one browser session through a layered menu
//! discovery heuristic and comes back with text and/or PDFs.
//!
//! The stages run as an explicit sequence, each ending in one of three ways:
//! fall through to the next stage, finish with a `ScrapeResult`, or fail
//! with a typed `ScrapeError`. The browser session is owned by this function
//! and dropped on every exit path.

use crate::domain::error::ScrapeError;
use crate::domain::model::{PdfItem, ScrapeResult};
use crate::domain::traits::{BrowserFactory, Navigation, PageLink};
use reqwest::{Client, Url};
use std::collections::HashSet;
use std::time::Duration;

/// Cap on extracted text, bounding downstream oracle payloads.
pub const MAX_TEXT_LEN: usize = 15_000;
/// Anything shorter is considered no content.
pub const MIN_TEXT_LEN: usize = 50;

/// Path fragments that mark a URL as already being a menu page.
const MENU_PATH_KEYWORDS: &[&str] = &[
    "/menu", "/our-menu", "/food", "/order", "/dining", "/eat", "/breakfast", "/lunch", "/dinner",
    "/brunch",
];

/// Keywords that mark an anchor (href or visible text) as menu-intent.
const MENU_LINK_KEYWORDS: &[&str] = &["menu", "food", "order", "dining", "eat"];

/// Container preference for text extraction, most menu-likely first.
const TEXT_SELECTORS: &[&str] = &[
    "main", ".menu", "#menu", ".Menu", "article", ".content", ".product", ".dish", ".item",
];

/// Navigation and settle timing, taken from the process config.
#[derive(Debug, Clone)]
pub struct ScrapeTiming {
    pub nav_timeout: Duration,
    pub settle_delay: Duration,
    pub scroll_delay: Duration,
}

impl ScrapeTiming {
    pub fn from_config(config: &crate::infrastructure::config::Config) -> Self {
        Self {
            nav_timeout: Duration::from_millis(config.scrape_timeout_ms),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            scroll_delay: Duration::from_millis(config.scroll_delay_ms),
        }
    }
}

/// Scrape menu content from a resolved website URL.
pub async fn scrape(
    browser: &dyn BrowserFactory,
    client: &Client,
    url: &str,
    timing: &ScrapeTiming,
) -> Result<ScrapeResult, ScrapeError> {
    // Stage 1: the URL itself may already be the menu PDF.
    if is_pdf_url(url) {
        let item = download_pdf(client, url).await?;
        return Ok(ScrapeResult {
            text: None,
            pdfs: vec![item],
            source_url: Some(url.to_string()),
        });
    }

    let mut session = browser.open().await?;

    // Stage 2: navigate and gate on status.
    let nav = session.navigate(url, timing.nav_timeout).await?;
    check_status(&nav)?;

    // Stage 3: the server may have answered with a PDF despite the URL.
    if is_pdf_response(&nav) {
        let item = download_pdf(client, &nav.final_url).await?;
        return Ok(ScrapeResult {
            text: None,
            pdfs: vec![item],
            source_url: Some(nav.final_url.clone()),
        });
    }

    let mut current = nav;

    // Stage 4/5: unless the landed path already looks like a menu page,
    // discover menu-intent links and follow the heuristic.
    if !is_menu_path(&current.final_url) {
        let links = session.links().await?;
        let discovered = discover_menu_links(&links, &current.final_url);

        // PDF links on the landing page beat any further HTML navigation.
        if !discovered.pdf.is_empty() {
            let pdfs = download_all(client, &discovered.pdf).await;
            if pdfs.is_empty() {
                return Err(ScrapeError::download_failed(format!(
                    "all {} menu PDF downloads failed on {}",
                    discovered.pdf.len(),
                    current.final_url
                )));
            }
            return Ok(ScrapeResult {
                text: None,
                pdfs,
                source_url: Some(current.final_url.clone()),
            });
        }

        // Stage 6: follow the best HTML candidate, same checks again.
        let next = discovered
            .same_domain_html
            .first()
            .or_else(|| discovered.cross_domain_html.first());
        if let Some(next_url) = next {
            tracing::info!(%next_url, "following menu link");
            let nav = session.navigate(next_url, timing.nav_timeout).await?;
            check_status(&nav)?;
            if is_pdf_response(&nav) {
                let item = download_pdf(client, &nav.final_url).await?;
                return Ok(ScrapeResult {
                    text: None,
                    pdfs: vec![item],
                    source_url: Some(nav.final_url.clone()),
                });
            }
            current = nav;
        }
    }

    // Stage 7: settled on the believed menu page, sweep it for PDF links.
    let links = session.links().await?;
    let pdf_urls = pdf_suffixed(&links);
    if !pdf_urls.is_empty() {
        let pdfs = download_all(client, &pdf_urls).await;
        if !pdfs.is_empty() {
            // The page may still carry useful surrounding text.
            let text = session
                .extract_text(TEXT_SELECTORS)
                .await?
                .filter(|t| t.trim().len() > MIN_TEXT_LEN)
                .map(|t| truncate(&t));
            tracing::info!(
                pdfs = pdfs.len(),
                has_text = text.is_some(),
                url = %current.final_url,
                "menu page yielded PDFs"
            );
            return Ok(ScrapeResult {
                text,
                pdfs,
                source_url: Some(current.final_url.clone()),
            });
        }
        // Every sweep download failed; fall through to the text path.
        tracing::warn!(url = %current.final_url, "PDF sweep downloads all failed");
    }

    // Stage 8: text extraction, with settle time for client-rendered pages
    // and a scroll to force lazy-loaded sections.
    tokio::time::sleep(timing.settle_delay).await;
    session.scroll_to_bottom().await?;
    tokio::time::sleep(timing.scroll_delay).await;

    let text = session.extract_text(TEXT_SELECTORS).await?;
    match text {
        Some(t) if t.trim().len() >= MIN_TEXT_LEN => {
            tracing::info!(chars = t.len(), url = %current.final_url, "scraped menu text");
            Ok(ScrapeResult {
                text: Some(truncate(&t)),
                pdfs: Vec::new(),
                source_url: Some(current.final_url.clone()),
            })
        }
        other => Err(ScrapeError::empty_page(format!(
            "{} chars of text on {}",
            other.map(|t| t.trim().len()).unwrap_or(0),
            current.final_url
        ))),
    }
}

fn check_status(nav: &Navigation) -> Result<(), ScrapeError> {
    if nav.status >= 400 {
        return Err(ScrapeError::http_error(format!(
            "HTTP {} from {}",
            nav.status, nav.final_url
        )));
    }
    Ok(())
}

/// Does the URL path end in `.pdf` (query and fragment ignored)?
pub fn is_pdf_url(url: &str) -> bool {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_lowercase(),
        Err(_) => {
            let trimmed = url.split(['?', '#']).next().unwrap_or(url);
            trimmed.to_lowercase()
        }
    };
    path.ends_with(".pdf")
}

fn is_pdf_response(nav: &Navigation) -> bool {
    nav.content_type
        .as_deref()
        .map(|ct| ct.to_lowercase().contains("application/pdf"))
        .unwrap_or(false)
        || is_pdf_url(&nav.final_url)
}

/// Does the URL path already match a menu keyword?
pub fn is_menu_path(url: &str) -> bool {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_lowercase(),
        Err(_) => url.to_lowercase(),
    };
    MENU_PATH_KEYWORDS.iter().any(|kw| path.contains(kw))
}

/// Menu-intent links on a page, partitioned by kind and domain.
#[derive(Debug, Default)]
pub struct MenuLinks {
    /// Same-domain PDF links, in page order.
    pub pdf: Vec<String>,
    pub same_domain_html: Vec<String>,
    pub cross_domain_html: Vec<String>,
}

/// Apply the menu-intent heuristic to a page's anchors.
pub fn discover_menu_links(links: &[PageLink], page_url: &str) -> MenuLinks {
    let page_host = host_of(page_url);
    let mut out = MenuLinks::default();
    let mut seen: HashSet<String> = HashSet::new();

    for link in links {
        if !is_menu_intent(link) || !seen.insert(link.href.clone()) {
            continue;
        }
        let same = is_same_domain(link, page_host.as_deref());
        if is_pdf_url(&link.href) {
            if same {
                out.pdf.push(link.href.clone());
            }
        } else if same {
            out.same_domain_html.push(link.href.clone());
        } else {
            out.cross_domain_html.push(link.href.clone());
        }
    }

    out
}

/// All PDF-suffixed links on a page, deduplicated in page order.
pub fn pdf_suffixed(links: &[PageLink]) -> Vec<String> {
    let mut seen = HashSet::new();
    links
        .iter()
        .filter(|l| is_pdf_url(&l.href))
        .filter(|l| seen.insert(l.href.clone()))
        .map(|l| l.href.clone())
        .collect()
}

fn is_menu_intent(link: &PageLink) -> bool {
    let href = link.href.to_lowercase();
    let text = link.text.to_lowercase();
    MENU_LINK_KEYWORDS
        .iter()
        .any(|kw| href.contains(kw) || text.contains(kw))
}

/// Root-relative hrefs are always same-domain; otherwise compare hosts with
/// a leading `www.` stripped.
fn is_same_domain(link: &PageLink, page_host: Option<&str>) -> bool {
    if link.root_relative {
        return true;
    }
    match (host_of(&link.href), page_host) {
        (Some(link_host), Some(page_host)) => {
            strip_www(&link_host) == strip_www(page_host)
        }
        _ => false,
    }
}

fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

fn truncate(text: &str) -> String {
    // The cap counts characters, so multibyte menus keep their full budget.
    match text.char_indices().nth(MAX_TEXT_LEN) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

/// Fetch one PDF over plain HTTP (separate from the browser session).
pub async fn download_pdf(client: &Client, url: &str) -> Result<PdfItem, ScrapeError> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| ScrapeError::download_failed(format!("GET {} failed: {}", url, e)))?;

    if !resp.status().is_success() {
        return Err(ScrapeError::download_failed(format!(
            "GET {} returned {}",
            url,
            resp.status()
        )));
    }

    let data = resp
        .bytes()
        .await
        .map_err(|e| ScrapeError::download_failed(format!("reading {} failed: {}", url, e)))?;

    tracing::info!(url, bytes = data.len(), "downloaded PDF");
    Ok(PdfItem {
        url: url.to_string(),
        data: data.to_vec(),
    })
}

/// Download a batch of PDFs, keeping page order and skipping failures.
async fn download_all(client: &Client, urls: &[String]) -> Vec<PdfItem> {
    let mut items = Vec::with_capacity(urls.len());
    for url in urls {
        match download_pdf(client, url).await {
            Ok(item) => items.push(item),
            Err(e) => tracing::warn!(url, error = %e, "skipping PDF"),
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(href: &str, text: &str, root_relative: bool) -> PageLink {
        PageLink {
            href: href.to_string(),
            text: text.to_string(),
            root_relative,
        }
    }

    #[test]
    fn pdf_url_ignores_query() {
        assert!(is_pdf_url("https://a.com/menu.pdf"));
        assert!(is_pdf_url("https://a.com/files/Menu.PDF?v=2"));
        assert!(!is_pdf_url("https://a.com/menu"));
    }

    #[test]
    fn menu_path_classification() {
        assert!(is_menu_path("https://a.com/menu"));
        assert!(is_menu_path("https://a.com/our-menu/dinner"));
        assert!(is_menu_path("https://a.com/food"));
        assert!(!is_menu_path("https://a.com/about"));
        // Keyword in the host does not make a menu path.
        assert!(!is_menu_path("https://menu-experts.com/about"));
    }

    #[test]
    fn discovery_partitions_by_domain_and_kind() {
        let links = vec![
            link("https://joesdiner.com/menu.pdf", "Dinner Menu", false),
            link("https://joesdiner.com/menu", "Menu", true),
            link("https://www.joesdiner.com/food", "Food", false),
            link("https://toasttab.com/joes/order", "Order Online", false),
            link("https://joesdiner.com/careers", "Careers", false),
        ];
        let found = discover_menu_links(&links, "https://joesdiner.com/");
        assert_eq!(found.pdf, vec!["https://joesdiner.com/menu.pdf"]);
        assert_eq!(
            found.same_domain_html,
            vec!["https://joesdiner.com/menu", "https://www.joesdiner.com/food"]
        );
        assert_eq!(
            found.cross_domain_html,
            vec!["https://toasttab.com/joes/order"]
        );
    }

    #[test]
    fn discovery_dedups_repeated_hrefs() {
        let links = vec![
            link("https://a.com/menu", "Menu", true),
            link("https://a.com/menu", "Our Menu", true),
        ];
        let found = discover_menu_links(&links, "https://a.com/");
        assert_eq!(found.same_domain_html.len(), 1);
    }

    #[test]
    fn sweep_collects_all_pdf_links_in_order() {
        let links = vec![
            link("https://a.com/dinner.pdf", "Dinner", true),
            link("https://b.com/wine.pdf", "Wine", false),
            link("https://a.com/contact", "Contact", true),
        ];
        assert_eq!(
            pdf_suffixed(&links),
            vec!["https://a.com/dinner.pdf", "https://b.com/wine.pdf"]
        );
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        // A two-byte char: below the cap nothing is cut, above it the cap
        // applies in characters.
        let exact = "é".repeat(MAX_TEXT_LEN);
        assert_eq!(truncate(&exact).chars().count(), MAX_TEXT_LEN);

        let over = "é".repeat(MAX_TEXT_LEN + 7);
        let cut = truncate(&over);
        assert_eq!(cut.chars().count(), MAX_TEXT_LEN);
        assert!(cut.chars().all(|c| c == 'é'));
    }
}
