//! RSS 2.0 feed parsing.
//!
//! Substack serves `<rss><channel>...<item>...</item></channel></rss>` with
//! titles and descriptions wrapped in CDATA. Only the item fields the
//! normalizer reads are deserialized; everything else in the channel is
//! skipped.

use crate::fetcher::FetchError;
use crate::models::{FeedItem, RawEntry};
use serde::Deserialize;
use tracing::debug;

pub const PATH: &str = "feed";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default)]
    item: Vec<FeedItem>,
}

pub fn parse(body: &str) -> Result<Vec<RawEntry>, FetchError> {
    let rss: Rss = quick_xml::de::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;
    debug!(items = rss.channel.item.len(), "Parsed RSS channel");
    Ok(rss.channel.item.into_iter().map(RawEntry::Feed).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:content="http://purl.org/rss/1.0/modules/content/" version="2.0">
  <channel>
    <title><![CDATA[Gentle Velocity]]></title>
    <description><![CDATA[Notes on moving steadily.]]></description>
    <link>https://gentlevelocity.substack.com</link>
    <generator>Substack</generator>
    <item>
      <title><![CDATA[First "quoted" post]]></title>
      <description><![CDATA[<p>Hello &amp; welcome</p>]]></description>
      <link>https://gentlevelocity.substack.com/p/first</link>
      <guid isPermaLink="false">https://gentlevelocity.substack.com/p/first</guid>
      <dc:creator><![CDATA[Someone]]></dc:creator>
      <pubDate>Fri, 05 Jan 2024 10:00:00 GMT</pubDate>
      <content:encoded><![CDATA[<p>Long body</p>]]></content:encoded>
    </item>
    <item>
      <title>Second</title>
      <guid isPermaLink="false">https://gentlevelocity.substack.com/p/second</guid>
      <pubDate>Mon, 01 Jan 2024 09:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_items_in_order() {
        let entries = parse(FEED).unwrap();
        assert_eq!(entries.len(), 2);

        let RawEntry::Feed(first) = &entries[0] else {
            panic!("expected feed entry");
        };
        assert_eq!(first.title.as_deref(), Some("First \"quoted\" post"));
        assert_eq!(first.link.as_deref(), Some("https://gentlevelocity.substack.com/p/first"));
        assert_eq!(first.pub_date.as_deref(), Some("Fri, 05 Jan 2024 10:00:00 GMT"));
        assert_eq!(first.description.as_deref(), Some("<p>Hello &amp; welcome</p>"));

        let RawEntry::Feed(second) = &entries[1] else {
            panic!("expected feed entry");
        };
        assert!(second.link.is_none());
        assert_eq!(
            second.guid.as_ref().and_then(|g| g.value.as_deref()),
            Some("https://gentlevelocity.substack.com/p/second")
        );
    }

    #[test]
    fn test_parse_empty_channel() {
        let body = r#"<rss version="2.0"><channel><title>Empty</title></channel></rss>"#;
        assert!(parse(body).unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_html() {
        assert!(matches!(
            parse("<html><body>Too many requests</body></html>"),
            Err(FetchError::Parse(_))
        ));
    }
}
