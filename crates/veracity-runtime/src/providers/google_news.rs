//! Google News RSS search. Free and keyless, so it is usually the first
//! provider in the configured order.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use veracity_core::Article;

use crate::config::{ConfigError, ProviderConfig};

use super::factory::ProviderFactory;
use super::http::{build_client, check_status, option_str, option_usize, transport_error, validate_base_url};
use super::{clip_description, EvidenceProvider, ProviderError};

pub const DEFAULT_BASE_URL: &str = "https://news.google.com/rss/search";
const DEFAULT_MAX_RESULTS: usize = 10;
const FALLBACK_SOURCE: &str = "Google News";

lazy_static! {
    static ref ITEM: Regex = Regex::new(r"(?s)<item\b[^>]*>(.*?)</item>").unwrap();
    static ref TITLE: Regex = Regex::new(r"(?s)<title\b[^>]*>(.*?)</title>").unwrap();
    static ref LINK: Regex = Regex::new(r"(?s)<link\b[^>]*>(.*?)</link>").unwrap();
    static ref PUB_DATE: Regex = Regex::new(r"(?s)<pubDate\b[^>]*>(.*?)</pubDate>").unwrap();
    static ref SOURCE: Regex = Regex::new(r"(?s)<source\b[^>]*>(.*?)</source>").unwrap();
    static ref DESCRIPTION: Regex = Regex::new(r"(?s)<description\b[^>]*>(.*?)</description>").unwrap();
    static ref CDATA: Regex = Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").unwrap();
    static ref TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref NUMERIC_ENTITY: Regex = Regex::new(r"&#(x[0-9A-Fa-f]+|[0-9]+);").unwrap();
}

/// Google News RSS provider.
#[derive(Debug)]
pub struct GoogleNewsRss {
    client: reqwest::Client,
    base_url: String,
    hl: String,
    gl: String,
    ceid: String,
    max_results: usize,
    timeout: Duration,
}

impl GoogleNewsRss {
    /// Build from provider config. `options` may set `base_url`, `hl`,
    /// `gl`, `ceid` and `max_results`.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let options = &config.options;
        Ok(Self {
            client: build_client(&config.id, config.timeout)?,
            base_url: option_str(options, "base_url", DEFAULT_BASE_URL),
            hl: option_str(options, "hl", "en-IN"),
            gl: option_str(options, "gl", "IN"),
            ceid: option_str(options, "ceid", "IN:en"),
            max_results: option_usize(options, "max_results", DEFAULT_MAX_RESULTS),
            timeout: config.timeout,
        })
    }
}

#[async_trait]
impl EvidenceProvider for GoogleNewsRss {
    fn name(&self) -> &str {
        "google-news-rss"
    }

    async fn search(&self, query: &str) -> Result<Vec<Article>, ProviderError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("hl", self.hl.as_str()),
                ("gl", self.gl.as_str()),
                ("ceid", self.ceid.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        let body = check_status(response)
            .await?
            .text()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(parse_feed(&body, self.max_results))
    }
}

/// Parse an RSS document into at most `max` articles.
///
/// Items without a title or link are dropped. Titles lose the trailing
/// " - Source" that Google News appends.
pub fn parse_feed(xml: &str, max: usize) -> Vec<Article> {
    ITEM.captures_iter(xml)
        .filter_map(|item| parse_item(&item[1]))
        .take(max)
        .collect()
}

fn parse_item(item: &str) -> Option<Article> {
    let raw_title = element(&TITLE, item)?;
    let url = element(&LINK, item)?;

    let source = element(&SOURCE, item);
    let (title, source) = split_title(&raw_title, source);

    let published_at = element(&PUB_DATE, item)
        .and_then(|d| DateTime::parse_from_rfc2822(&d).ok())
        .map(|d| d.with_timezone(&Utc));

    let description = element(&DESCRIPTION, item)
        .map(|d| strip_tags(&d))
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| title.clone());

    Some(Article {
        title,
        source,
        url,
        published_at,
        description: clip_description(Some(&description)),
        provider_id: String::new(),
    })
}

/// Text content of the first `pattern` match, unwrapped and decoded.
fn element(pattern: &Regex, item: &str) -> Option<String> {
    let raw = pattern.captures(item)?.get(1)?.as_str();
    let text = CDATA.replace_all(raw, "$1");
    let text = decode_entities(text.trim());
    (!text.is_empty()).then_some(text)
}

fn split_title(raw: &str, source: Option<String>) -> (String, String) {
    match source {
        Some(source) => {
            let suffix = format!(" - {}", source);
            let title = raw.strip_suffix(&suffix).unwrap_or(raw).trim().to_string();
            (title, source)
        }
        None => match raw.rsplit_once(" - ") {
            Some((title, source)) if !title.trim().is_empty() => {
                (title.trim().to_string(), source.trim().to_string())
            }
            _ => (raw.to_string(), FALLBACK_SOURCE.to_string()),
        },
    }
}

fn strip_tags(html: &str) -> String {
    let text = TAG.replace_all(html, " ");
    veracity_core::normalize::collapse_whitespace(&decode_entities(&text))
}

fn decode_entities(text: &str) -> String {
    let text = NUMERIC_ENTITY.replace_all(text, |caps: &regex::Captures| {
        let code = &caps[1];
        let value = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse().ok(),
        };
        value
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });

    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Factory for [`GoogleNewsRss`].
///
/// ## Configuration Format
/// ```yaml
/// - id: google-news
///   type: google-news-rss
///   timeout: 5s
///   options:
///     hl: en-IN        # optional
///     gl: IN           # optional
///     ceid: "IN:en"    # optional
///     max_results: 10  # optional
/// ```
pub struct GoogleNewsRssFactory;

impl ProviderFactory for GoogleNewsRssFactory {
    fn provider_type(&self) -> &'static str {
        "google-news-rss"
    }

    fn create(&self, config: &ProviderConfig) -> Result<Arc<dyn EvidenceProvider>, ConfigError> {
        Ok(Arc::new(GoogleNewsRss::from_config(config)?))
    }

    fn validate_config(&self, config: &ProviderConfig) -> Result<(), ConfigError> {
        validate_base_url(&config.options)
    }

    fn description(&self) -> &'static str {
        "Google News RSS search (no API key)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const FEED: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
<title>"moon landing" - Google News</title>
<item>
  <title>Apollo 11 crew honoured at NASA gala - Reuters</title>
  <link>https://news.google.com/rss/articles/abc</link>
  <guid isPermaLink="false">abc</guid>
  <pubDate>Mon, 03 Mar 2025 07:00:00 GMT</pubDate>
  <description>&lt;a href="https://news.google.com/rss/articles/abc"&gt;Apollo 11 crew honoured&lt;/a&gt;&amp;nbsp;&amp;nbsp;&lt;font color="#6f6f6f"&gt;Reuters&lt;/font&gt;</description>
  <source url="https://www.reuters.com">Reuters</source>
</item>
<item>
  <title><![CDATA[Moon rocks &amp; myths - The Hindu]]></title>
  <link>https://news.google.com/rss/articles/def</link>
  <pubDate>not a date</pubDate>
</item>
<item>
  <title>No link here - Somewhere</title>
</item>
</channel></rss>"##;

    #[test]
    fn test_parse_feed() {
        let articles = parse_feed(FEED, 10);
        assert_eq!(articles.len(), 2);

        let first = &articles[0];
        assert_eq!(first.title, "Apollo 11 crew honoured at NASA gala");
        assert_eq!(first.source, "Reuters");
        assert_eq!(first.url, "https://news.google.com/rss/articles/abc");
        assert_eq!(
            first.published_at,
            Some(Utc.with_ymd_and_hms(2025, 3, 3, 7, 0, 0).unwrap())
        );
        assert_eq!(first.description.as_deref(), Some("Apollo 11 crew honoured Reuters"));
    }

    #[test]
    fn test_title_suffix_used_as_source_without_source_element() {
        let articles = parse_feed(FEED, 10);
        let second = &articles[1];

        assert_eq!(second.title, "Moon rocks & myths");
        assert_eq!(second.source, "The Hindu");
        assert_eq!(second.published_at, None);
        assert_eq!(second.description.as_deref(), Some("Moon rocks & myths"));
    }

    #[test]
    fn test_parse_feed_respects_max() {
        assert_eq!(parse_feed(FEED, 1).len(), 1);
        assert!(parse_feed("<rss><channel></channel></rss>", 10).is_empty());
        assert!(parse_feed("not xml at all", 10).is_empty());
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("Tom &amp; Jerry &#39;n&#x27; co"), "Tom & Jerry 'n' co");
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_factory_rejects_bad_base_url() {
        let mut config = ProviderConfig::new("google-news", "google-news-rss");
        config.options = serde_json::json!({ "base_url": "file:///etc/passwd" });
        assert!(GoogleNewsRssFactory.validate_config(&config).is_err());
    }
}
