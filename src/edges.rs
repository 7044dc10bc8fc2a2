use serde::Serialize;

use crate::ir::Breakdown;
use crate::naming::Names;
use crate::style::{ColorCode, Styles};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: String,
    pub from_node: String,
    pub from_side: Side,
    pub to_node: String,
    pub to_side: Side,
    pub color: ColorCode,
}

pub fn edge_id(index: usize) -> String {
    format!("edge-{index}")
}

/// One edge into every non-root node, parent or anchor first, in arena pre-order.
/// Ids depend only on that order, so an unchanged tree gets identical ids.
pub fn build_edges(breakdown: &Breakdown<'_>, names: &Names, styles: &Styles) -> Vec<GraphEdge> {
    let edges: Vec<GraphEdge> = breakdown
        .iter()
        .filter_map(|(node_ref, node)| node.parent.map(|parent| (parent, node_ref)))
        .enumerate()
        .map(|(index, (parent, child))| GraphEdge {
            id: edge_id(index),
            from_node: names.id(parent).to_string(),
            from_side: Side::Bottom,
            to_node: names.id(child).to_string(),
            to_side: Side::Top,
            color: styles.color(child),
        })
        .collect();
    tracing::debug!(count = edges.len(), "built edges");
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::ir::ContentNode;
    use crate::naming::assign_names;
    use crate::style::resolve_styles;

    #[test]
    fn edges_point_down_from_parents() {
        let tree = ContentNode::original("Doc", "Clippings/Doc.md").with_child(
            ContentNode::summary("Summary").with_children(vec![
                ContentNode::special("References"),
                ContentNode::section(1, "Body").with_child(ContentNode::section(2, "Data")),
            ]),
        );
        let breakdown = Breakdown::from_tree(&tree).unwrap();
        let names = assign_names(&breakdown).unwrap();
        let styles = resolve_styles(&breakdown, &LayoutConfig::default()).unwrap();
        let edges = build_edges(&breakdown, &names, &styles);

        let pairs: Vec<(&str, &str, &str, String)> = edges
            .iter()
            .map(|edge| {
                (
                    edge.id.as_str(),
                    edge.from_node.as_str(),
                    edge.to_node.as_str(),
                    edge.color.to_string(),
                )
            })
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("edge-0", "Clippings/Doc", "00-Summary", "4".to_string()),
                ("edge-1", "00-Summary", "01-Body", "3".to_string()),
                ("edge-2", "01-Body", "01.01-Data", "5".to_string()),
                ("edge-3", "00-Summary", "References", "2".to_string()),
            ]
        );
        assert!(edges
            .iter()
            .all(|edge| edge.from_side == Side::Bottom && edge.to_side == Side::Top));
    }
}
