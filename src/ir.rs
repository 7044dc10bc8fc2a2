use serde::{Deserialize, Serialize};

use crate::error::{CompileError, Result};

/// Deepest section level a breakdown may use.
pub const MAX_SECTION_DEPTH: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Original,
    Summary,
    Section,
    Special,
}

/// One node of the breakdown tree as handed over by the structural analyzer.
///
/// Special nodes appear here as ordinary children of their anchor; [`Breakdown`]
/// separates them into an attachment list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentNode {
    pub category: Category,
    pub title: String,
    #[serde(default)]
    pub depth: u8,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ContentNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_height: Option<i64>,
}

impl ContentNode {
    fn new(category: Category, title: impl Into<String>, depth: u8) -> Self {
        Self {
            category,
            title: title.into(),
            depth,
            children: Vec::new(),
            source_ref: None,
            body: None,
            estimated_height: None,
        }
    }

    pub fn original(title: impl Into<String>, source_ref: impl Into<String>) -> Self {
        let mut node = Self::new(Category::Original, title, 0);
        node.source_ref = Some(source_ref.into());
        node
    }

    pub fn summary(title: impl Into<String>) -> Self {
        Self::new(Category::Summary, title, 0)
    }

    pub fn section(depth: u8, title: impl Into<String>) -> Self {
        Self::new(Category::Section, title, depth)
    }

    pub fn special(title: impl Into<String>) -> Self {
        Self::new(Category::Special, title, 0)
    }

    pub fn with_children(mut self, children: Vec<ContentNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_child(mut self, child: ContentNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_estimated_height(mut self, height: i64) -> Self {
        self.estimated_height = Some(height);
        self
    }

    /// Number of nodes in this subtree, specials included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(ContentNode::count).sum::<usize>()
    }
}

/// Index of a node inside a [`Breakdown`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeRef(usize);

impl NodeRef {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Semantic level of a node; decides its band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Original,
    Summary,
    /// Section depth, or the level a special is laid out at.
    Band(u8),
}

impl Level {
    fn ordinal(self) -> u8 {
        match self {
            Level::Original | Level::Summary => 0,
            Level::Band(level) => level,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BreakdownNode<'a> {
    pub content: &'a ContentNode,
    pub parent: Option<NodeRef>,
    /// Section children in sibling order.
    pub children: Vec<NodeRef>,
    /// Special nodes anchored here, in their given order.
    pub attachments: Vec<NodeRef>,
    /// 0-based position inside its sibling group (sections and specials count separately).
    pub sibling_index: usize,
    pub level: Level,
}

impl BreakdownNode<'_> {
    pub fn category(&self) -> Category {
        self.content.category
    }

    pub fn title(&self) -> &str {
        &self.content.title
    }

    pub fn is_attachment(&self) -> bool {
        self.content.category == Category::Special
    }
}

/// Arena view of a validated breakdown tree, stored in pre-order: a node, then the
/// subtrees of its section children, then its specials.
#[derive(Debug, Clone)]
pub struct Breakdown<'a> {
    nodes: Vec<BreakdownNode<'a>>,
}

struct Pending<'a> {
    content: &'a ContentNode,
    parent: Option<NodeRef>,
    sibling_index: usize,
    trail: String,
}

impl<'a> Breakdown<'a> {
    /// Flattens and checks the tree. Any structural violation is a `MalformedTree`.
    pub fn from_tree(root: &'a ContentNode) -> Result<Self> {
        let mut nodes: Vec<BreakdownNode<'a>> = Vec::with_capacity(root.count());
        let mut stack = vec![Pending {
            content: root,
            parent: None,
            sibling_index: 0,
            trail: root.title.clone(),
        }];

        while let Some(pending) = stack.pop() {
            let content = pending.content;
            let level = check_node(&nodes, &pending)?;
            let this = NodeRef(nodes.len());
            if let Some(parent) = pending.parent {
                let parent_node = &mut nodes[parent.0];
                if content.category == Category::Special {
                    parent_node.attachments.push(this);
                } else {
                    parent_node.children.push(this);
                }
            }
            nodes.push(BreakdownNode {
                content,
                parent: pending.parent,
                children: Vec::new(),
                attachments: Vec::new(),
                sibling_index: pending.sibling_index,
                level,
            });

            let sections: Vec<&ContentNode> = content
                .children
                .iter()
                .filter(|child| child.category != Category::Special)
                .collect();
            let specials: Vec<&ContentNode> = content
                .children
                .iter()
                .filter(|child| child.category == Category::Special)
                .collect();
            // Reverse push so sections pop first, in order, then specials.
            for (idx, child) in specials.into_iter().enumerate().rev() {
                stack.push(Pending {
                    content: child,
                    parent: Some(this),
                    sibling_index: idx,
                    trail: format!("{} > {}", pending.trail, child.title),
                });
            }
            for (idx, child) in sections.into_iter().enumerate().rev() {
                stack.push(Pending {
                    content: child,
                    parent: Some(this),
                    sibling_index: idx,
                    trail: format!("{} > {}", pending.trail, child.title),
                });
            }
        }

        Ok(Self { nodes })
    }

    pub fn root(&self) -> NodeRef {
        NodeRef(0)
    }

    pub fn get(&self, node: NodeRef) -> &BreakdownNode<'a> {
        &self.nodes[node.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes of the strict tree, i.e. everything except attached specials.
    pub fn strict_len(&self) -> usize {
        self.nodes.iter().filter(|node| !node.is_attachment()).count()
    }

    pub fn attachment_count(&self) -> usize {
        self.nodes.len() - self.strict_len()
    }

    /// Pre-order iteration; see [`Breakdown`] for the exact order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeRef, &BreakdownNode<'a>)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (NodeRef(idx), node))
    }

    /// Sibling positions from the first section level down to `node`, 1-based.
    pub fn section_path(&self, node: NodeRef) -> Vec<usize> {
        let mut path = Vec::new();
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            let entry = self.get(current);
            if entry.category() != Category::Section {
                break;
            }
            path.push(entry.sibling_index + 1);
            cursor = entry.parent;
        }
        path.reverse();
        path
    }
}

fn check_node(nodes: &[BreakdownNode<'_>], pending: &Pending<'_>) -> Result<Level> {
    let content = pending.content;
    let trail = pending.trail.as_str();
    if content.title.trim().is_empty() {
        return Err(CompileError::malformed(trail, "title is empty"));
    }

    let parent = pending.parent.map(|parent| &nodes[parent.0]);
    let Some(parent) = parent else {
        if content.category != Category::Original {
            return Err(CompileError::malformed(
                trail,
                format!("root must be an original, found {:?}", content.category),
            ));
        }
        if content.depth != 0 {
            return Err(CompileError::malformed(trail, "original must be at depth 0"));
        }
        let has_source = content
            .source_ref
            .as_deref()
            .map(|source| !source.trim().is_empty())
            .unwrap_or(false);
        if !has_source {
            return Err(CompileError::malformed(trail, "original has no source reference"));
        }
        if content.children.len() != 1
            || content.children[0].category != Category::Summary
        {
            return Err(CompileError::malformed(
                trail,
                "original must have exactly one summary child",
            ));
        }
        return Ok(Level::Original);
    };

    match content.category {
        Category::Original => Err(CompileError::malformed(trail, "original below the root")),
        Category::Summary => {
            if parent.category() != Category::Original {
                return Err(CompileError::malformed(trail, "summary must sit under the original"));
            }
            Ok(Level::Summary)
        }
        Category::Section => {
            let expected = match (parent.category(), parent.level) {
                (Category::Summary, _) => 1,
                (Category::Section, Level::Band(depth)) => depth + 1,
                _ => {
                    return Err(CompileError::malformed(
                        trail,
                        format!("section cannot hang under {:?}", parent.category()),
                    ));
                }
            };
            if content.depth != expected {
                return Err(CompileError::malformed(
                    trail,
                    format!(
                        "section at depth {} under a level-{} parent (expected depth {})",
                        content.depth,
                        expected - 1,
                        expected
                    ),
                ));
            }
            if content.depth > MAX_SECTION_DEPTH {
                return Err(CompileError::malformed(
                    trail,
                    format!("sections nest at most {MAX_SECTION_DEPTH} levels"),
                ));
            }
            Ok(Level::Band(content.depth))
        }
        Category::Special => {
            if !matches!(parent.category(), Category::Summary | Category::Section) {
                return Err(CompileError::malformed(
                    trail,
                    "special must attach to the summary or a section",
                ));
            }
            if !content.children.is_empty() {
                return Err(CompileError::malformed(trail, "special nodes cannot have children"));
            }
            Ok(Level::Band(parent.level.ordinal().max(1) + 1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ContentNode {
        ContentNode::original("Article", "Clippings/Article.md").with_child(
            ContentNode::summary("Summary").with_children(vec![
                ContentNode::special("References"),
                ContentNode::section(1, "Intro"),
                ContentNode::section(1, "Body").with_children(vec![
                    ContentNode::section(2, "Data"),
                    ContentNode::special("Glossary"),
                ]),
            ]),
        )
    }

    #[test]
    fn flattens_in_preorder_with_specials_last() {
        let tree = sample();
        let breakdown = Breakdown::from_tree(&tree).unwrap();
        let titles: Vec<&str> = breakdown.iter().map(|(_, node)| node.title()).collect();
        assert_eq!(
            titles,
            ["Article", "Summary", "Intro", "Body", "Data", "Glossary", "References"]
        );
        assert_eq!(breakdown.len(), 7);
        assert_eq!(breakdown.strict_len(), 5);
        assert_eq!(breakdown.attachment_count(), 2);
    }

    #[test]
    fn specials_take_the_band_below_their_anchor() {
        let tree = sample();
        let breakdown = Breakdown::from_tree(&tree).unwrap();
        let levels: Vec<Level> = breakdown.iter().map(|(_, node)| node.level).collect();
        assert_eq!(levels[5], Level::Band(2));
        assert_eq!(levels[6], Level::Band(2));
    }

    #[test]
    fn section_path_counts_sections_only() {
        let tree = sample();
        let breakdown = Breakdown::from_tree(&tree).unwrap();
        let data = breakdown
            .iter()
            .find(|(_, node)| node.title() == "Data")
            .map(|(node, _)| node)
            .unwrap();
        assert_eq!(breakdown.section_path(data), vec![2, 1]);
    }

    #[test]
    fn rejects_depth_skip() {
        let tree = ContentNode::original("A", "a.md")
            .with_child(ContentNode::summary("S").with_child(ContentNode::section(2, "Deep")));
        let err = Breakdown::from_tree(&tree).unwrap_err();
        assert!(matches!(err, CompileError::MalformedTree { .. }));
    }

    #[test]
    fn rejects_special_with_children() {
        let tree = ContentNode::original("A", "a.md").with_child(
            ContentNode::summary("S")
                .with_child(ContentNode::special("Refs").with_child(ContentNode::section(1, "X"))),
        );
        assert!(matches!(
            Breakdown::from_tree(&tree),
            Err(CompileError::MalformedTree { .. })
        ));
    }

    #[test]
    fn rejects_missing_summary_and_source() {
        let no_summary =
            ContentNode::original("A", "a.md").with_child(ContentNode::section(1, "Intro"));
        assert!(Breakdown::from_tree(&no_summary).is_err());

        let mut no_source = ContentNode::original("A", "a.md").with_child(ContentNode::summary("S"));
        no_source.source_ref = None;
        assert!(Breakdown::from_tree(&no_source).is_err());
    }

    #[test]
    fn rejects_fourth_section_level() {
        let tree = ContentNode::original("A", "a.md").with_child(
            ContentNode::summary("S").with_child(ContentNode::section(1, "1").with_child(
                ContentNode::section(2, "2").with_child(
                    ContentNode::section(3, "3").with_child(ContentNode::section(4, "4")),
                ),
            )),
        );
        assert!(matches!(
            Breakdown::from_tree(&tree),
            Err(CompileError::MalformedTree { .. })
        ));
    }

    #[test]
    fn parses_camel_case_json() {
        let json = r#"{
            "category": "original",
            "title": "Doc",
            "sourceRef": "Clippings/Doc.md",
            "children": [{"category": "summary", "title": "Summary", "estimatedHeight": 220}]
        }"#;
        let tree: ContentNode = serde_json::from_str(json).unwrap();
        assert_eq!(tree.source_ref.as_deref(), Some("Clippings/Doc.md"));
        assert_eq!(tree.children[0].estimated_height, Some(220));
        assert!(Breakdown::from_tree(&tree).is_ok());
    }
}
