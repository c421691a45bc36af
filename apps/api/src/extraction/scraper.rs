//! Job posting scraper: fetches a job page and isolates the description block.
//!
//! Locating the description is heuristic. The keyword list and fallback order live in
//! `ContentRules` so they can be tuned and tested without touching the fetch logic.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::extraction::normalize::collapse_whitespace;
use crate::extraction::{ensure_min_chars, ExtractionError, ExtractionResult, MIN_JOB_POSTING_CHARS};

/// Browser-like User-Agent. Many job boards refuse requests without one.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/96.0.4664.110 Safari/537.36";

const TOO_SHORT_MESSAGE: &str = "Could not extract job description from the provided URL. \
    The site may block automated extraction.";

/// Rules for locating the job description inside a page, tried in order:
/// 1. first `container_tags` element whose class contains one of `class_keywords`
/// 2. first match of each `fallback_selectors` entry
/// 3. `<body>` with `body_noise_tags` removed
#[derive(Debug, Clone)]
pub struct ContentRules {
    pub container_tags: Vec<String>,
    /// Matched case-insensitively as substrings of the class attribute.
    pub class_keywords: Vec<String>,
    pub fallback_selectors: Vec<String>,
    /// Never contribute text, wherever they appear.
    pub skipped_tags: Vec<String>,
    pub body_noise_tags: Vec<String>,
}

impl Default for ContentRules {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            container_tags: owned(&["div", "section"]),
            class_keywords: owned(&[
                "job-description",
                "description",
                "details",
                "jobdesc",
                "job_des",
                "jobdetail",
                "job-details",
            ]),
            fallback_selectors: owned(&["main, article", "div#content"]),
            skipped_tags: owned(&["script", "style"]),
            body_noise_tags: owned(&["header", "nav", "footer"]),
        }
    }
}

/// Fetches job postings over HTTP. Holds no per-user state.
#[derive(Clone)]
pub struct JobPostingScraper {
    client: Client,
    rules: ContentRules,
}

impl JobPostingScraper {
    pub fn new(
        timeout: Duration,
        user_agent: &str,
        rules: ContentRules,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client, rules })
    }

    /// Fetches `url` and returns the collapsed job description text.
    pub async fn scrape(&self, url: &str) -> ExtractionResult {
        let url = validate_url(url)?;
        info!("Scraping job posting from {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("Job posting fetch returned {} for {}", status, url);
            return Err(ExtractionError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(transport_error)?;
        let text = locate_job_description(&body, &self.rules);
        debug!("Located {} chars of job description at {}", text.len(), url);

        ensure_min_chars(text, MIN_JOB_POSTING_CHARS, TOO_SHORT_MESSAGE)
    }
}

/// Accepts only absolute http(s) URLs with a host.
pub fn validate_url(raw: &str) -> Result<Url, ExtractionError> {
    let invalid = || ExtractionError::InvalidUrl(raw.to_string());
    let url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    let has_host = url.host_str().is_some_and(|h| !h.is_empty());
    if !matches!(url.scheme(), "http" | "https") || !has_host {
        return Err(invalid());
    }
    Ok(url)
}

fn transport_error(e: reqwest::Error) -> ExtractionError {
    if e.is_timeout() {
        ExtractionError::Timeout
    } else {
        ExtractionError::Network(e.to_string())
    }
}

/// Finds the job description block in `html` and returns its visible text with
/// whitespace collapsed. Returns an empty string when nothing usable is found.
pub fn locate_job_description(html: &str, rules: &ContentRules) -> String {
    let document = Html::parse_document(html);
    let skipped: Vec<&str> = rules.skipped_tags.iter().map(String::as_str).collect();

    if let Some(container) = find_keyword_container(&document, rules) {
        debug!("Job description matched a keyword container");
        return visible_text(container, &skipped);
    }

    for raw in &rules.fallback_selectors {
        let Some(selector) = parse_selector(raw) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            debug!("Job description matched fallback selector '{raw}'");
            return visible_text(element, &skipped);
        }
    }

    let Some(body_selector) = parse_selector("body") else {
        return String::new();
    };
    let mut body_skipped = skipped;
    body_skipped.extend(rules.body_noise_tags.iter().map(String::as_str));
    document
        .select(&body_selector)
        .next()
        .map(|body| visible_text(body, &body_skipped))
        .unwrap_or_default()
}

fn find_keyword_container<'a>(document: &'a Html, rules: &ContentRules) -> Option<ElementRef<'a>> {
    let selector = parse_selector(&rules.container_tags.join(", "))?;
    let keywords: Vec<String> = rules
        .class_keywords
        .iter()
        .map(|k| k.to_lowercase())
        .collect();

    document.select(&selector).find(|element| {
        element
            .value()
            .attr("class")
            .map(|class| {
                let class = class.to_lowercase();
                keywords.iter().any(|k| class.contains(k.as_str()))
            })
            .unwrap_or(false)
    })
}

fn parse_selector(raw: &str) -> Option<Selector> {
    match Selector::parse(raw) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!("Ignoring invalid content selector '{raw}': {e:?}");
            None
        }
    }
}

/// Text nodes under `element`, trimmed and joined by single spaces, skipping the
/// subtrees of `skip` tags.
fn visible_text(element: ElementRef<'_>, skip: &[&str]) -> String {
    let mut parts = Vec::new();
    collect_text(element, skip, &mut parts);
    collapse_whitespace(&parts.join(" "))
}

fn collect_text(element: ElementRef<'_>, skip: &[&str], parts: &mut Vec<String>) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            let tag = child_element.value().name();
            if skip.iter().any(|s| s.eq_ignore_ascii_case(tag)) {
                continue;
            }
            collect_text(child_element, skip, parts);
        } else if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed.to_string());
            }
        }
    }
}
