//! Content extractor: turns a fetched HTML document into structured signals
//!
//! All document inspection happens in synchronous helpers so the parsed
//! `Html` never lives across an await point in the calling analyzer.

use crate::analyzer::types::SeoSignals;
use crate::{GaugeError, Result};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use url::Url;

/// Email domains that are never business contacts (matched as substrings)
const BLACKLIST_DOMAINS: &[&str] = &[
    "sentry",
    "wixpress",
    "example",
    "test",
    "schema.org",
    "w3.org",
    "googleapis",
    "gstatic",
    "google-analytics",
    "facebook.com",
    "twitter.com",
    "json-ld",
    "wordpress.com",
    "wp.com",
    "cloudflare",
    "jquery",
    "bootstrap",
    "fontawesome",
    "github.com",
    "gravatar.com",
    "wp.org",
    "wordpress.org",
];

/// Anchored patterns for machine-generated local parts
const BLACKLIST_LOCAL_PATTERNS: &[&str] = &[
    r"^[0-9a-f]{20,}@",
    r"^noreply@",
    r"^no-reply@",
    r"^donotreply@",
    r"^id[0-9]+@",
    r"^[0-9]+@",
    r"^[a-f0-9]{32}@",
    r"^[a-f0-9]{40}@",
    r"^[a-f0-9]{64}@",
];

/// Local-part keywords that mark an address as business-sounding
const BUSINESS_EMAIL_KEYWORDS: &[&str] = &[
    "contact", "info", "sales", "support", "hello", "admin", "office", "help", "inquiry",
    "service", "team", "business", "enquiry", "customer", "marketing",
];

/// Platform name → profile URL pattern
const SOCIAL_PATTERNS: &[(&str, &str)] = &[
    ("facebook", r"(?i)(?:https?:)?//(?:www\.)?facebook\.com/[a-zA-Z0-9._-]+"),
    ("twitter", r"(?i)(?:https?:)?//(?:www\.)?twitter\.com/[a-zA-Z0-9_]+"),
    ("instagram", r"(?i)(?:https?:)?//(?:www\.)?instagram\.com/[a-zA-Z0-9._-]+"),
    (
        "linkedin",
        r"(?i)(?:https?:)?//(?:www\.)?linkedin\.com/(?:company|in)/[a-zA-Z0-9._-]+",
    ),
    (
        "youtube",
        r"(?i)(?:https?:)?//(?:www\.)?youtube\.com/(?:c|channel|user)/[a-zA-Z0-9._-]+",
    ),
    ("tiktok", r"(?i)(?:https?:)?//(?:www\.)?tiktok\.com/@[a-zA-Z0-9._-]+"),
    ("pinterest", r"(?i)(?:https?:)?//(?:www\.)?pinterest\.com/[a-zA-Z0-9._-]+"),
];

/// Document-level technical signals (the auxiliary-file flags are filled in
/// later by the site analyzer)
#[derive(Debug, Clone, Default)]
pub struct PageTechnical {
    pub viewport_present: bool,
    pub viewport_content: Option<String>,
    pub lang_attribute: Option<String>,
    pub charset: Option<String>,
    pub is_https: bool,
}

/// Everything the extractor pulls out of one document
#[derive(Debug, Clone, Default)]
pub struct PageExtract {
    pub seo: SeoSignals,
    pub technical: PageTechnical,
    pub open_graph: BTreeMap<String, String>,
    pub emails: Vec<String>,
    pub social_media: BTreeMap<String, String>,
    pub cleaned_text: String,
}

/// Extractor with precompiled patterns, built once per run
pub struct Extractor {
    email_re: Regex,
    local_blacklist: Vec<Regex>,
    social: Vec<(&'static str, Regex)>,
}

impl Extractor {
    pub fn new() -> Result<Self> {
        let email_re = Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}")
            .map_err(|e| GaugeError::Parse(e.to_string()))?;

        let mut local_blacklist = Vec::with_capacity(BLACKLIST_LOCAL_PATTERNS.len());
        for pattern in BLACKLIST_LOCAL_PATTERNS {
            local_blacklist
                .push(Regex::new(pattern).map_err(|e| GaugeError::Parse(e.to_string()))?);
        }

        let mut social = Vec::with_capacity(SOCIAL_PATTERNS.len());
        for (platform, pattern) in SOCIAL_PATTERNS {
            social.push((
                *platform,
                Regex::new(pattern).map_err(|e| GaugeError::Parse(e.to_string()))?,
            ));
        }

        Ok(Self {
            email_re,
            local_blacklist,
            social,
        })
    }

    /// Runs the full extraction over one document
    ///
    /// Deterministic: the same HTML and URL always produce the same output.
    pub fn extract(&self, html: &str, url: &Url) -> PageExtract {
        let document = Html::parse_document(html);

        PageExtract {
            seo: extract_seo_signals(&document),
            technical: extract_technical(&document, url),
            open_graph: extract_open_graph(&document),
            emails: self.extract_emails(html),
            social_media: self.extract_social_media(html),
            cleaned_text: clean_text_content(&document),
        }
    }

    /// Extracts, filters, and ranks contact emails from raw HTML
    ///
    /// Matches are deduplicated in document order, machine-generated
    /// addresses are dropped, business-sounding locals are ranked first
    /// (stable otherwise), and the list is capped at 10.
    pub fn extract_emails(&self, html: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut emails: Vec<String> = self
            .email_re
            .find_iter(html)
            .map(|m| m.as_str().to_string())
            .filter(|e| seen.insert(e.to_lowercase()))
            .filter(|e| self.keep_email(e))
            .collect();

        // sort_by_key is stable, so document order is preserved within bands
        emails.sort_by_key(|e| !is_business_email(e));
        emails.truncate(10);
        emails
    }

    fn keep_email(&self, email: &str) -> bool {
        let lower = email.to_lowercase();
        let (local, domain) = match lower.split_once('@') {
            Some(parts) => parts,
            None => return false,
        };

        if !domain.contains('.') {
            return false;
        }

        if BLACKLIST_DOMAINS.iter().any(|b| domain.contains(b)) {
            return false;
        }

        if self.local_blacklist.iter().any(|re| re.is_match(&lower)) {
            return false;
        }

        // ID-like locals: too long, or all digits once separators are gone
        if local.len() > 30 {
            return false;
        }
        let stripped: String = local.chars().filter(|c| !".-_".contains(*c)).collect();
        if !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }

        // Mostly digits
        let digits = local.chars().filter(|c| c.is_ascii_digit()).count();
        if digits as f64 > local.len() as f64 * 0.7 {
            return false;
        }

        // Bare hex strings (tracking hashes)
        if local.len() > 10 && local.chars().all(|c| c.is_ascii_hexdigit() && !c.is_uppercase())
        {
            return false;
        }

        true
    }

    /// Finds the first profile link per social platform, normalized to https
    pub fn extract_social_media(&self, html: &str) -> BTreeMap<String, String> {
        let mut found = BTreeMap::new();
        for (platform, re) in &self.social {
            if let Some(m) = re.find(html) {
                found.insert(platform.to_string(), normalize_social_url(m.as_str()));
            }
        }
        found
    }
}

fn is_business_email(email: &str) -> bool {
    let lower = email.to_lowercase();
    BUSINESS_EMAIL_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn normalize_social_url(link: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        link.to_string()
    } else if link.starts_with("//") {
        format!("https:{}", link)
    } else {
        format!("https://{}", link)
    }
}

fn extract_seo_signals(document: &Html) -> SeoSignals {
    let mut signals = SeoSignals::default();

    signals.title = select_text(document, "title");
    signals.title_length = signals.title.as_deref().map_or(0, |t| t.chars().count());

    signals.meta_description = select_attr(document, r#"meta[name="description"]"#, "content")
        .map(|c| c.trim().to_string());
    signals.meta_description_length = signals
        .meta_description
        .as_deref()
        .map_or(0, |d| d.chars().count());

    signals.meta_keywords =
        select_attr(document, r#"meta[name="keywords"]"#, "content").map(|c| c.trim().to_string());
    signals.canonical_url = select_attr(document, r#"link[rel="canonical"]"#, "href");
    signals.robots_meta = select_attr(document, r#"meta[name="robots"]"#, "content");

    for level in 1..=6u8 {
        let count = count_elements(document, &format!("h{}", level));
        signals.header_counts.insert(level, count);
    }

    if let Ok(selector) = Selector::parse("h1") {
        signals.h1_texts = document
            .select(&selector)
            .take(3)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .collect();
    }

    if let Ok(selector) = Selector::parse("img") {
        for img in document.select(&selector) {
            signals.image_total += 1;
            let alt = img.value().attr("alt").unwrap_or("");
            if alt.is_empty() {
                signals.images_without_alt += 1;
            }
            let has_src = img.value().attr("src").is_some();
            if has_src && img.value().attr("loading") != Some("lazy") {
                signals.images_without_lazy += 1;
            }
        }
    }

    signals.schema_types = extract_schema_types(document);
    signals.has_schema = !signals.schema_types.is_empty();

    signals
}

/// Collects Schema.org type names from JSON-LD blocks and microdata
///
/// A malformed JSON-LD block is skipped; it never aborts extraction of the
/// rest of the page.
fn extract_schema_types(document: &Html) -> BTreeSet<String> {
    let mut types = BTreeSet::new();

    if let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) {
        for script in document.select(&selector) {
            let raw = script.text().collect::<String>();
            match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(value) => collect_json_ld_types(&value, &mut types),
                Err(_) => continue,
            }
        }
    }

    if let Ok(selector) = Selector::parse("[itemtype]") {
        for item in document.select(&selector) {
            if let Some(itemtype) = item.value().attr("itemtype") {
                if let Some(name) = itemtype.rsplit('/').find(|s| !s.is_empty()) {
                    types.insert(name.to_string());
                }
            }
        }
    }

    types
}

fn collect_json_ld_types(value: &serde_json::Value, types: &mut BTreeSet<String>) {
    match value {
        serde_json::Value::Object(map) => {
            match map.get("@type") {
                Some(serde_json::Value::String(t)) => {
                    types.insert(t.clone());
                }
                Some(serde_json::Value::Array(items)) => {
                    for item in items {
                        if let Some(t) = item.as_str() {
                            types.insert(t.to_string());
                        }
                    }
                }
                _ => {}
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                collect_json_ld_types(item, types);
            }
        }
        _ => {}
    }
}

fn extract_technical(document: &Html, url: &Url) -> PageTechnical {
    let viewport_content = select_attr(document, r#"meta[name="viewport"]"#, "content");

    PageTechnical {
        viewport_present: viewport_content.is_some(),
        viewport_content,
        lang_attribute: select_attr(document, "html", "lang"),
        charset: select_attr(document, "meta[charset]", "charset"),
        is_https: url.scheme() == "https",
    }
}

fn extract_open_graph(document: &Html) -> BTreeMap<String, String> {
    let mut og = BTreeMap::new();
    if let Ok(selector) = Selector::parse("meta[property]") {
        for meta in document.select(&selector) {
            let property = meta.value().attr("property").unwrap_or("");
            if !property.starts_with("og:") {
                continue;
            }
            if let Some(content) = meta.value().attr("content") {
                og.entry(property.to_string())
                    .or_insert_with(|| content.to_string());
            }
        }
    }
    og
}

/// Extracts readable text, skipping script and style content, with
/// whitespace collapsed to single spaces
pub fn clean_text_content(document: &Html) -> String {
    let mut raw = String::new();
    if let Ok(selector) = Selector::parse("*") {
        for element in document.select(&selector) {
            let name = element.value().name();
            if name == "script" || name == "style" {
                continue;
            }
            // Direct text children only; descendants are visited by their
            // own parent element.
            for child in element.children() {
                if let Some(text) = child.value().as_text() {
                    raw.push_str(text);
                    raw.push(' ');
                }
            }
        }
    }

    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn select_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn select_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|v| v.to_string())
}

fn count_elements(document: &Html, selector: &str) -> usize {
    match Selector::parse(selector) {
        Ok(selector) => document.select(&selector).count(),
        Err(_) => 0,
    }
}
