use chrono::NaiveDate;

use crate::canvas::breakdown_folder;
use crate::config::Config;
use crate::error::Result;
use crate::ir::{Breakdown, BreakdownNode, Category, ContentNode, NodeRef};
use crate::naming::{Names, assign_names};

/// A markdown note to be written into the vault next to the canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    /// Vault-relative path, inside the breakdown folder when there is one.
    pub path: String,
    pub content: String,
}

/// Renders one note per summary, section and special node. The original already exists
/// in the vault and gets none.
pub fn render_notes(tree: &ContentNode, config: &Config, date: NaiveDate) -> Result<Vec<Note>> {
    let breakdown = Breakdown::from_tree(tree)?;
    let names = assign_names(&breakdown)?;
    let folder = breakdown_folder(tree, config);
    let ctx = NoteContext {
        breakdown: &breakdown,
        names: &names,
        date: date.format("%Y-%m-%d").to_string(),
        source: tree.source_ref.as_deref().unwrap_or_default(),
        article: tree.title.as_str(),
    };

    let notes: Vec<Note> = breakdown
        .iter()
        .filter(|(_, node)| node.category() != Category::Original)
        .map(|(node_ref, node)| {
            let filename = &names.get(node_ref).filename;
            let content = match node.category() {
                Category::Summary => ctx.summary_note(node),
                Category::Section => ctx.section_note(node_ref, node),
                _ => ctx.special_note(node),
            };
            Note {
                path: match folder.as_deref() {
                    Some(folder) => format!("{folder}/{filename}"),
                    None => filename.clone(),
                },
                content,
            }
        })
        .collect();
    tracing::debug!(count = notes.len(), "rendered notes");
    Ok(notes)
}

struct NoteContext<'a, 'b> {
    breakdown: &'a Breakdown<'b>,
    names: &'a Names,
    date: String,
    source: &'a str,
    article: &'a str,
}

impl NoteContext<'_, '_> {
    fn link(&self, node: NodeRef) -> String {
        let title = self.breakdown.get(node).title();
        format!("[[{}|{}]]", self.names.get(node).filename, title)
    }

    fn front_matter(&self, title: &str, parent: Option<NodeRef>, tag: &str) -> String {
        let mut out = String::from("---\n");
        out.push_str(&format!("title: {title}\n"));
        out.push_str(&format!("date: {}\n", self.date));
        if let Some(parent) = parent {
            out.push_str(&format!("parent: \"[[{}]]\"\n", self.names.get(parent).filename));
        }
        out.push_str(&format!("original_article: {}\n", self.source));
        out.push_str(&format!("tags: [{tag}, article-breakdown]\n"));
        out.push_str("---\n\n");
        out
    }

    fn heading_and_body(out: &mut String, title: &str, node: &BreakdownNode<'_>) {
        out.push_str(&format!("# {title}\n\n"));
        if let Some(body) = node.content.body.as_deref() {
            out.push_str(body.trim_end());
            out.push_str("\n\n");
        }
    }

    fn summary_note(&self, node: &BreakdownNode<'_>) -> String {
        let mut out = self.front_matter(&format!("Summary of {}", self.article), None, "summary");
        Self::heading_and_body(&mut out, "Summary", node);

        out.push_str("## Table of Contents\n\n");
        for section in &node.children {
            self.toc_entry(&mut out, *section, 0);
        }

        let specials: Vec<NodeRef> = self
            .breakdown
            .iter()
            .filter(|(_, entry)| entry.category() == Category::Special)
            .map(|(node_ref, _)| node_ref)
            .collect();
        if !specials.is_empty() {
            out.push_str("\n## Special Nodes\n\n");
            for special in specials {
                out.push_str(&format!("- {}\n", self.link(special)));
            }
        }
        out
    }

    fn toc_entry(&self, out: &mut String, node: NodeRef, indent: usize) {
        let entry = self.breakdown.get(node);
        out.push_str(&format!("{}- {}\n", "  ".repeat(indent), self.link(node)));
        for child in &entry.children {
            self.toc_entry(out, *child, indent + 1);
        }
    }

    fn section_note(&self, node_ref: NodeRef, node: &BreakdownNode<'_>) -> String {
        let tag = if self.breakdown.section_path(node_ref).len() == 1 {
            "section"
        } else {
            "subsection"
        };
        let mut out = self.front_matter(node.title(), node.parent, tag);
        Self::heading_and_body(&mut out, node.title(), node);

        if !node.children.is_empty() {
            out.push_str("## Subsections\n\n");
            for child in &node.children {
                out.push_str(&format!("- {}\n", self.link(*child)));
            }
            out.push('\n');
        }
        if !node.attachments.is_empty() {
            out.push_str("## See Also\n\n");
            for special in &node.attachments {
                out.push_str(&format!("- {}\n", self.link(*special)));
            }
            out.push('\n');
        }
        self.back_link(&mut out, node);
        out
    }

    fn special_note(&self, node: &BreakdownNode<'_>) -> String {
        let mut out = self.front_matter(node.title(), node.parent, "special-node");
        Self::heading_and_body(&mut out, node.title(), node);
        self.back_link(&mut out, node);
        out
    }

    fn back_link(&self, out: &mut String, node: &BreakdownNode<'_>) {
        if let Some(parent) = node.parent {
            let title = match self.breakdown.get(parent).category() {
                Category::Summary => "Summary",
                _ => self.breakdown.get(parent).title(),
            };
            out.push_str(&format!(
                "[[{}|Back to {title}]]\n",
                self.names.get(parent).filename
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> ContentNode {
        ContentNode::original("Markdown", "Clippings/Markdown.md").with_child(
            ContentNode::summary("Summary of Markdown")
                .with_body("A lightweight markup language.")
                .with_children(vec![
                    ContentNode::section(1, "Basic Syntax")
                        .with_body("The core.")
                        .with_child(ContentNode::section(2, "Headers").with_body("Use hashes.")),
                    ContentNode::special("References").with_body("- Gruber"),
                ]),
        )
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn one_note_per_derived_node() {
        let notes = render_notes(&tree(), &Config::default(), date()).unwrap();
        let paths: Vec<&str> = notes.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(
            paths,
            [
                "Markdown-Breakdown/00-Summary.md",
                "Markdown-Breakdown/01-Basic-Syntax.md",
                "Markdown-Breakdown/01.01-Headers.md",
                "Markdown-Breakdown/References.md",
            ]
        );
    }

    #[test]
    fn summary_lists_everything() {
        let notes = render_notes(&tree(), &Config::default(), date()).unwrap();
        let summary = &notes[0].content;
        assert!(summary.starts_with("---\ntitle: Summary of Markdown\ndate: 2024-05-01\n"));
        assert!(summary.contains("original_article: Clippings/Markdown.md\n"));
        assert!(summary.contains("- [[01-Basic-Syntax.md|Basic Syntax]]\n  - [[01.01-Headers.md|Headers]]\n"));
        assert!(summary.contains("## Special Nodes\n\n- [[References.md|References]]\n"));
    }

    #[test]
    fn sections_link_up_and_down() {
        let notes = render_notes(&tree(), &Config::default(), date()).unwrap();
        let section = &notes[1].content;
        assert!(section.contains("parent: \"[[00-Summary.md]]\"\n"));
        assert!(section.contains("tags: [section, article-breakdown]\n"));
        assert!(section.contains("# Basic Syntax\n\nThe core.\n\n"));
        assert!(section.contains("## Subsections\n\n- [[01.01-Headers.md|Headers]]\n"));
        assert!(section.ends_with("[[00-Summary.md|Back to Summary]]\n"));

        let sub = &notes[2].content;
        assert!(sub.contains("tags: [subsection, article-breakdown]\n"));
        assert!(sub.ends_with("[[01-Basic-Syntax.md|Back to Basic Syntax]]\n"));
    }
}
