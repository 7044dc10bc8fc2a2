//! Turns the structural analyzer's markdown response into a breakdown tree.
//!
//! The response uses headings only:
//!
//! ```text
//! # Summary
//! one paragraph...
//! # Basic Syntax
//! ## Headers
//! ### Setext headers
//! # Special: References
//! ```
//!
//! `# Summary` opens the summary body, `# Special: T` a special note on the summary
//! (`## Special: T` anchors it on the current depth-1 section, and so on), and every
//! other heading a section one level per `#`. Plain lines belong to the last heading.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CompileError, Result};
use crate::ir::{Category, ContentNode};

static HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,3})\s+(.+?)\s*$").unwrap());
static SPECIAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^special\s*:\s*(.+)$").unwrap());
static SUMMARY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^summary$").unwrap());

const WRAP_COLUMNS: usize = 40;
const LINE_HEIGHT: i64 = 24;
const HEIGHT_PADDING: i64 = 60;

/// Where plain lines currently go.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    Preamble,
    Summary,
    /// Child indices below the summary, outermost first.
    Node(Vec<usize>),
}

pub fn parse_analysis(
    response: &str,
    source_ref: &str,
    article_title: &str,
) -> Result<ContentNode> {
    let mut summary = ContentNode::summary(format!("Summary of {article_title}"));
    let mut summary_body = String::new();
    let mut cursor = Cursor::Preamble;
    // Section path of the last heading at each depth.
    let mut open_sections: Vec<usize> = Vec::new();

    for (line_no, line) in response.lines().enumerate() {
        let Some(caps) = HEADING_RE.captures(line) else {
            match &cursor {
                Cursor::Preamble => {}
                Cursor::Summary => push_line(&mut summary_body, line),
                Cursor::Node(path) => {
                    let node = node_at(&mut summary, path);
                    push_line(node.body.get_or_insert_with(String::new), line);
                }
            }
            continue;
        };
        let level = caps[1].len();
        let text = caps[2].to_string();

        if level == 1 && SUMMARY_RE.is_match(&text) {
            cursor = Cursor::Summary;
            open_sections.clear();
            continue;
        }

        let anchor_depth = level - 1;
        if open_sections.len() < anchor_depth {
            return Err(CompileError::malformed(
                &format!("line {}", line_no + 1),
                format!("heading {text:?} has no enclosing level-{anchor_depth} section"),
            ));
        }
        let anchor_path = open_sections[..anchor_depth].to_vec();

        let (child, is_section) = match SPECIAL_RE.captures(&text) {
            Some(special) => (ContentNode::special(special[1].trim()), false),
            None => (ContentNode::section(level as u8, text.as_str()), true),
        };
        let anchor = node_at(&mut summary, &anchor_path);
        anchor.children.push(child);
        let mut path = anchor_path;
        path.push(anchor.children.len() - 1);
        if is_section {
            open_sections = path.clone();
        }
        cursor = Cursor::Node(path);
    }

    summary.body = Some(summary_body.trim().to_string()).filter(|body| !body.is_empty());
    finish_bodies(&mut summary);
    let mut original = ContentNode::original(article_title, source_ref);
    original.children.push(summary);
    tracing::debug!(nodes = original.count(), "parsed analysis response");
    Ok(original)
}

fn node_at<'a>(summary: &'a mut ContentNode, path: &[usize]) -> &'a mut ContentNode {
    path.iter().fold(summary, |node, idx| &mut node.children[*idx])
}

fn push_line(body: &mut String, line: &str) {
    body.push_str(line);
    body.push('\n');
}

/// Trims bodies and fills height estimates for every node below the original.
fn finish_bodies(node: &mut ContentNode) {
    if let Some(body) = node.body.take() {
        let trimmed = body.trim();
        node.body = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }
    if node.category != Category::Original && node.estimated_height.is_none() {
        node.estimated_height = Some(estimate_height(
            &node.title,
            node.body.as_deref().unwrap_or_default(),
        ));
    }
    for child in &mut node.children {
        finish_bodies(child);
    }
}

/// Height a note needs for its title and body, assuming a fixed wrap width.
/// Non-decreasing in the length of either input.
pub fn estimate_height(title: &str, body: &str) -> i64 {
    let wrapped = |text: &str| -> i64 {
        text.lines()
            .map(|line| line.chars().count().div_ceil(WRAP_COLUMNS).max(1) as i64)
            .sum()
    };
    HEIGHT_PADDING + LINE_HEIGHT * (wrapped(title).max(1) + wrapped(body))
}

/// Title for the original article: the file stem of a markdown path, else the first
/// top-level heading of its content, else `"Article"`.
pub fn article_title(path: &str, content: &str) -> String {
    let base = path.rsplit('/').next().unwrap_or(path);
    if let Some(stem) = base.strip_suffix(".md")
        && !stem.is_empty()
    {
        return stem.to_string();
    }
    content
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|heading| heading.trim().to_string())
        .filter(|heading| !heading.is_empty())
        .unwrap_or_else(|| "Article".to_string())
}
