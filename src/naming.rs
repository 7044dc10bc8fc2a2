use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CompileError, Result};
use crate::ir::{Breakdown, Category, NodeRef};

pub const SUMMARY_FILENAME: &str = "00-Summary.md";
const NOTE_EXTENSION: &str = ".md";

static NUMBERED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2,}(?:\.\d{2,})*)-(.+)\.md$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeName {
    pub id: String,
    pub filename: String,
}

/// Names for every node of a breakdown, indexed by [`NodeRef`].
#[derive(Debug, Clone)]
pub struct Names {
    names: Vec<NodeName>,
}

impl Names {
    pub fn get(&self, node: NodeRef) -> &NodeName {
        &self.names[node.index()]
    }

    pub fn id(&self, node: NodeRef) -> &str {
        &self.names[node.index()].id
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeName> {
        self.names.iter()
    }
}

pub fn assign_names(breakdown: &Breakdown<'_>) -> Result<Names> {
    let mut names = Vec::with_capacity(breakdown.len());
    for (node_ref, node) in breakdown.iter() {
        let filename = match node.category() {
            // Checked non-empty when the arena was built.
            Category::Original => node.content.source_ref.clone().unwrap_or_default(),
            Category::Summary => SUMMARY_FILENAME.to_string(),
            Category::Section => {
                let slug = slug_for(node.title())?;
                let prefix = breakdown
                    .section_path(node_ref)
                    .iter()
                    .map(|idx| format!("{idx:02}"))
                    .collect::<Vec<_>>()
                    .join(".");
                format!("{prefix}-{slug}{NOTE_EXTENSION}")
            }
            Category::Special => format!("{}{NOTE_EXTENSION}", slug_for(node.title())?),
        };
        let id = id_for(&filename).to_string();
        names.push(NodeName { id, filename });
    }
    tracing::debug!(count = names.len(), "assigned node names");
    Ok(Names { names })
}

fn slug_for(title: &str) -> Result<String> {
    let slug = sanitize_title(title);
    if slug.is_empty() {
        return Err(CompileError::InvalidTitle {
            title: title.to_string(),
        });
    }
    Ok(slug)
}

/// Trims, turns each whitespace character into `-` and drops anything outside
/// `[A-Za-z0-9-]`.
pub fn sanitize_title(title: &str) -> String {
    title
        .trim()
        .chars()
        .filter_map(|ch| {
            if ch.is_whitespace() {
                Some('-')
            } else if ch.is_ascii_alphanumeric() || ch == '-' {
                Some(ch)
            } else {
                None
            }
        })
        .collect()
}

/// A filename with its extension removed. Dots inside directory names are kept.
pub fn id_for(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(dot) if dot > 0 && !filename[dot..].contains('/') => &filename[..dot],
        _ => filename,
    }
}

/// What a produced note filename encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileRole {
    Summary,
    /// `path` holds the 1-based sibling index of each section level, outermost first.
    Section { path: Vec<usize>, slug: String },
    Special { slug: String },
}

impl FileRole {
    /// Section depth (1..=3), `None` for summary and special notes.
    pub fn depth(&self) -> Option<usize> {
        match self {
            FileRole::Section { path, .. } => Some(path.len()),
            _ => None,
        }
    }

    pub fn sibling_index(&self) -> Option<usize> {
        match self {
            FileRole::Section { path, .. } => path.last().copied(),
            _ => None,
        }
    }
}

pub fn parse_filename(filename: &str) -> Option<FileRole> {
    if filename == SUMMARY_FILENAME {
        return Some(FileRole::Summary);
    }
    if let Some(caps) = NUMBERED_RE.captures(filename) {
        let path = caps[1]
            .split('.')
            .map(|part| part.parse::<usize>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .ok()?;
        return Some(FileRole::Section {
            path,
            slug: caps[2].to_string(),
        });
    }
    let slug = filename.strip_suffix(NOTE_EXTENSION)?;
    if slug.is_empty() {
        return None;
    }
    Some(FileRole::Special {
        slug: slug.to_string(),
    })
}
