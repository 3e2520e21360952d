//! Structured rewriting of the target component file.
//!
//! The target (an Astro component) holds three generated regions:
//!
//! ```text
//! // Static post data from RSS feeds (auto-updated: 2024-01-05T10:00:00.000Z)
//! // Aditya's latest posts from RSS feed
//! const adityaPosts: BlogPost[] = [
//!   {
//!     title: "...",
//!     date: "January 5, 2024",
//!     link: "https://...",
//!     description: "..."
//!   }
//! ];
//! ```
//!
//! [`TemplateDocument::parse`] splits the file into verbatim text and named
//! [`Slot`]s, [`TemplateDocument::render`] serializes it back with every
//! slot regenerated. Text outside the slots is reproduced byte-for-byte.
//!
//! A marker that cannot be found simply yields no slot, so rendering leaves
//! that region (if any) untouched.

use crate::config::Transport;
use crate::models::{PostRecord, SourceConfig};
use chrono::{DateTime, SecondsFormat, Utc};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

static STAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"// Static post data from (?:Substack|RSS) feeds \(auto-updated: .*?\)").unwrap()
});

/// A generated region of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Marker comment plus array literal for the source with this variable name.
    Posts { variable: String },
    /// The `auto-updated` timestamp comment.
    Stamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Verbatim(String),
    Slot { slot: Slot, original: String },
}

/// The records to write for one source.
#[derive(Debug, Clone, Copy)]
pub struct PostBlock<'a> {
    pub source: &'a SourceConfig,
    pub posts: &'a [PostRecord],
}

/// The target file split into text kept byte-for-byte and generated slots.
///
/// Produced by [`TemplateDocument::parse`]; the original text of each slot
/// is retained so a posts slot without fresh data renders unchanged.
///
/// # Example
///
/// ```ignore
/// let doc = TemplateDocument::parse(&text, &settings.sources)?;
/// let updated = doc.render(&blocks, Transport::Feed, Utc::now());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDocument {
    segments: Vec<Segment>,
}

/// The array ends at the first `];` that starts a line (or at an inline
/// `[];`), so a `];` inside an escaped string value never closes it.
fn posts_marker(source: &SourceConfig) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"(?m)// {} latest posts from (?:Substack API|RSS feed)\nconst {}: BlogPost\[\] = \[(?:\]|[\s\S]*?^\]);",
        regex::escape(&source.label),
        regex::escape(&source.variable),
    ))
}

impl TemplateDocument {
    /// Split `text` into verbatim segments and the slots of `sources`.
    ///
    /// Only the first occurrence of each marker becomes a slot.
    ///
    /// # Arguments
    ///
    /// * `text` - Full contents of the target file
    /// * `sources` - Sources whose marker comments should be located
    ///
    /// # Returns
    ///
    /// The parsed document, or a regex error if a marker pattern built
    /// from a source's label or variable fails to compile.
    pub fn parse(text: &str, sources: &[SourceConfig]) -> Result<Self, regex::Error> {
        let mut spans: Vec<(usize, usize, Slot)> = Vec::new();

        for source in sources {
            match posts_marker(source)?.find(text) {
                Some(m) => spans.push((
                    m.start(),
                    m.end(),
                    Slot::Posts {
                        variable: source.variable.clone(),
                    },
                )),
                None => debug!(variable = %source.variable, "Posts marker not present"),
            }
        }
        if let Some(m) = STAMP_RE.find(text) {
            spans.push((m.start(), m.end(), Slot::Stamp));
        }

        spans.sort_by_key(|(start, _, _)| *start);

        let mut segments = Vec::new();
        let mut cursor = 0;
        for (start, end, slot) in spans {
            if start < cursor {
                warn!(?slot, "Marker overlaps another generated region; ignoring it");
                continue;
            }
            if start > cursor {
                segments.push(Segment::Verbatim(text[cursor..start].to_string()));
            }
            segments.push(Segment::Slot {
                slot,
                original: text[start..end].to_string(),
            });
            cursor = end;
        }
        if cursor < text.len() {
            segments.push(Segment::Verbatim(text[cursor..].to_string()));
        }

        Ok(Self { segments })
    }

    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Slot { slot, .. } => Some(slot),
            Segment::Verbatim(_) => None,
        })
    }

    pub fn has_posts_slot(&self, variable: &str) -> bool {
        self.slots()
            .any(|s| matches!(s, Slot::Posts { variable: v } if v == variable))
    }

    pub fn has_stamp(&self) -> bool {
        self.slots().any(|s| *s == Slot::Stamp)
    }

    /// Serialize the document with every slot regenerated.
    ///
    /// A posts slot with no matching block keeps its original text.
    pub fn render(&self, blocks: &[PostBlock<'_>], transport: Transport, now: DateTime<Utc>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Verbatim(text) => out.push_str(text),
                Segment::Slot { slot: Slot::Stamp, .. } => {
                    out.push_str(&render_stamp(transport, now));
                }
                Segment::Slot {
                    slot: Slot::Posts { variable },
                    original,
                } => match blocks.iter().find(|b| &b.source.variable == variable) {
                    Some(block) => out.push_str(&render_posts(block, transport)),
                    None => out.push_str(original),
                },
            }
        }
        out
    }
}

/// Escape a value for a double-quoted string literal.
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

fn render_entry(post: &PostRecord) -> String {
    format!(
        "  {{\n    title: \"{}\",\n    date: \"{}\",\n    link: \"{}\",\n    description: \"{}\"\n  }}",
        escape_literal(&post.title),
        escape_literal(&post.date),
        escape_literal(&post.link),
        escape_literal(&post.description),
    )
}

/// Marker comment and array literal for one source.
pub fn render_posts(block: &PostBlock<'_>, transport: Transport) -> String {
    format!(
        "// {} latest posts from {}\nconst {}: BlogPost[] = [\n{}\n];",
        block.source.label,
        transport.marker_origin(),
        block.source.variable,
        block.posts.iter().map(render_entry).join(",\n"),
    )
}

pub fn render_stamp(transport: Transport, now: DateTime<Utc>) -> String {
    format!(
        "// Static post data from {} (auto-updated: {})",
        transport.stamp_origin(),
        now.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

/// Outcome of patching the target file.
#[derive(Debug)]
pub struct PatchReport {
    /// Variables whose marker was found and regenerated.
    pub replaced: Vec<String>,
    /// Variables whose marker was missing; their region was left alone.
    pub missing: Vec<String>,
    pub stamped: bool,
    pub written: bool,
    pub content: String,
}

/// Read `path`, regenerate every slot and write the result back.
///
/// The file is read completely before anything is written, and the write
/// is a single overwrite of the whole file. With `dry_run` nothing is
/// written and the rendered content is only returned.
#[instrument(level = "info", skip_all, fields(path = %path.display(), dry_run = dry_run))]
pub async fn patch_file(
    path: &Path,
    blocks: &[PostBlock<'_>],
    transport: Transport,
    now: DateTime<Utc>,
    dry_run: bool,
) -> Result<PatchReport, Box<dyn Error>> {
    let original = fs::read_to_string(path).await?;
    let sources: Vec<SourceConfig> = blocks.iter().map(|b| b.source.clone()).collect();
    let document = TemplateDocument::parse(&original, &sources)?;

    let (replaced, missing): (Vec<String>, Vec<String>) = sources
        .iter()
        .map(|s| s.variable.clone())
        .partition(|v| document.has_posts_slot(v));
    for variable in &missing {
        warn!(%variable, "Posts marker not found; leaving that region unchanged");
    }
    let stamped = document.has_stamp();
    if !stamped {
        warn!("Timestamp marker not found");
    }

    let content = document.render(blocks, transport, now);

    if !dry_run {
        fs::write(path, &content).await?;
        info!(replaced = replaced.len(), stamped, "Wrote updated template");
    }

    Ok(PatchReport {
        replaced,
        missing,
        stamped,
        written: !dry_run,
        content,
    })
}
