//! Reader for the publisher's RSS 2.0 news feed.
//!
//! Only `title`, `link`, `description` and `pubDate` of each `item` are
//! used, so the feed is scanned with patterns rather than a full XML
//! parser.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tyria_core::error::ApiError;

use crate::classify::{classify, is_success};
use crate::client::Gateway;

/// Longest description kept for a card.
const MAX_DESCRIPTION_LEN: usize = 300;

/// One news item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub published: Option<String>,
}

fn item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<item\b[^>]*>(.*?)</item>").expect("static pattern"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]+>").expect("static pattern"))
}

fn field(item: &str, name: &str) -> Option<String> {
    let open = format!("<{name}");
    let close = format!("</{name}>");
    let start = item.find(&open)?;
    let after_open = start + item[start..].find('>')? + 1;
    let end = after_open + item[after_open..].find(&close)?;
    Some(clean(&item[after_open..end]))
}

fn clean(raw: &str) -> String {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix("<![CDATA[")
        .and_then(|s| s.strip_suffix("]]>"))
        .unwrap_or(trimmed);
    unescape(inner.trim())
}

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#8217;", "\u{2019}")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

fn plain_text(html: &str) -> String {
    let stripped = tag_re().replace_all(html, " ");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_DESCRIPTION_LEN {
        let cut: String = collapsed.chars().take(MAX_DESCRIPTION_LEN).collect();
        format!("{}…", cut.trim_end())
    } else {
        collapsed
    }
}

/// Parse the items of an RSS document in feed order (newest first).
///
/// Items without a title are skipped.
pub fn parse_feed(xml: &str) -> Vec<FeedItem> {
    item_re()
        .captures_iter(xml)
        .filter_map(|cap| {
            let body = cap.get(1)?.as_str();
            let title = field(body, "title").filter(|t| !t.is_empty())?;
            Some(FeedItem {
                title,
                link: field(body, "link").unwrap_or_default(),
                description: field(body, "description")
                    .map(|d| plain_text(&d))
                    .unwrap_or_default(),
                published: field(body, "pubDate"),
            })
        })
        .collect()
}

impl Gateway {
    /// Fetch and parse the configured news feed.
    pub async fn news_feed(&self) -> Result<Vec<FeedItem>, ApiError> {
        let response = self
            .http()
            .get(&self.config().news_feed_url)
            .send()
            .await
            .map_err(|e| ApiError::Connection(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Connection(e.to_string()))?;
        if !is_success(status) {
            return Err(classify(status, &body));
        }
        Ok(parse_feed(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
  <title>Guild Wars 2</title>
  <item>
    <title>Game Update Notes: May 7, 2024</title>
    <link>https://www.guildwars2.com/en/news/game-update-notes-may-7-2024/</link>
    <pubDate>Tue, 07 May 2024 16:00:00 +0000</pubDate>
    <description><![CDATA[<p>Fixed a bug &amp; more.</p>]]></description>
  </item>
  <item>
    <title><![CDATA[Festival of the Four Winds Returns]]></title>
    <link>https://www.guildwars2.com/en/news/four-winds/</link>
    <description>&lt;b&gt;Zephyrites&lt;/b&gt; are back</description>
  </item>
  <item><link>https://example.invalid/untitled</link></item>
</channel></rss>"#;

    #[test]
    fn parses_items_in_order() {
        let items = parse_feed(FEED);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Game Update Notes: May 7, 2024");
        assert_eq!(items[1].title, "Festival of the Four Winds Returns");
        assert_eq!(
            items[0].published.as_deref(),
            Some("Tue, 07 May 2024 16:00:00 +0000")
        );
        assert!(items[1].published.is_none());
    }

    #[test]
    fn descriptions_are_plain_text() {
        let items = parse_feed(FEED);
        assert_eq!(items[0].description, "Fixed a bug & more.");
        assert_eq!(items[1].description, "Zephyrites are back");
    }

    #[test]
    fn long_descriptions_are_truncated() {
        let text = "word ".repeat(200);
        assert!(plain_text(&text).chars().count() <= MAX_DESCRIPTION_LEN + 1);
    }

    #[test]
    fn empty_document_has_no_items() {
        assert!(parse_feed("<rss></rss>").is_empty());
    }
}
