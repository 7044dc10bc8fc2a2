use crate::config::Config;
use crate::edges::{GraphEdge, build_edges};
use crate::error::{Inconsistency, Result};
use crate::ir::{Breakdown, Category, ContentNode};
use crate::layout::compute_layout;
use crate::naming::{Names, assign_names, id_for};
use crate::style::{ColorCode, resolve_styles};
use anyhow::Context;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub file: String,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    pub color: ColorCode,
    #[serde(skip)]
    pub category: Category,
}

/// The canvas document: every node in arena pre-order, then every edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphDocument {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphDocument {
    /// Compact JSON, no trailing newline.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }
}

/// Compiles with the default geometry and a folder derived from the original.
pub fn serialize(tree: &ContentNode) -> Result<GraphDocument> {
    compile(tree, &Config::default())
}

/// Runs naming, styling, layout and edge building, then validates the result as a whole.
pub fn compile(tree: &ContentNode, config: &Config) -> Result<GraphDocument> {
    let span = tracing::debug_span!("compile", root = %tree.title);
    let _guard = span.enter();

    let breakdown = Breakdown::from_tree(tree)?;
    let names = assign_names(&breakdown)?;
    let styles = resolve_styles(&breakdown, &config.layout)?;
    let placement = compute_layout(&breakdown, &styles, &config.layout)?;
    let edges = build_edges(&breakdown, &names, &styles);

    let folder = breakdown_folder(tree, config);
    let nodes = breakdown
        .iter()
        .map(|(node_ref, node)| {
            let name = names.get(node_ref);
            let style = styles.get(node_ref);
            let position = placement.get(node_ref);
            let file = match (node.category(), folder.as_deref()) {
                (Category::Original, _) | (_, None) => name.filename.clone(),
                (_, Some(folder)) => format!("{folder}/{}", name.filename),
            };
            GraphNode {
                id: name.id.clone(),
                kind: NodeKind::File,
                file,
                x: position.x,
                y: position.y,
                width: style.width,
                height: style.height,
                color: style.style.color,
                category: node.category(),
            }
        })
        .collect();

    let document = GraphDocument { nodes, edges };
    validate(&breakdown, &names, &document)?;
    tracing::info!(
        nodes = document.nodes.len(),
        edges = document.edges.len(),
        "compiled canvas"
    );
    Ok(document)
}

/// Vault folder for the breakdown notes: the configured one (empty means none), or
/// `<original stem>-Breakdown`.
pub fn breakdown_folder(tree: &ContentNode, config: &Config) -> Option<String> {
    if let Some(folder) = config.folder.as_deref() {
        let folder = folder.trim_end_matches('/');
        return (!folder.is_empty()).then(|| folder.to_string());
    }
    let source = tree.source_ref.as_deref()?;
    let base = source.rsplit('/').next().unwrap_or(source);
    Some(format!("{}-Breakdown", id_for(base)))
}

/// Checks a built document against its breakdown and reports the first inconsistency.
pub fn validate(
    breakdown: &Breakdown<'_>,
    names: &Names,
    document: &GraphDocument,
) -> std::result::Result<(), Inconsistency> {
    if document.nodes.len() != breakdown.len() {
        return Err(Inconsistency::NodeCount {
            expected: breakdown.len(),
            actual: document.nodes.len(),
        });
    }

    let mut colors: HashMap<&str, ColorCode> = HashMap::with_capacity(document.nodes.len());
    for node in &document.nodes {
        if colors.insert(node.id.as_str(), node.color).is_some() {
            return Err(Inconsistency::DuplicateNodeId(node.id.clone()));
        }
    }

    let expected_edges = (breakdown.strict_len() - 1) + breakdown.attachment_count();
    if document.edges.len() != expected_edges {
        return Err(Inconsistency::EdgeCount {
            expected: expected_edges,
            actual: document.edges.len(),
        });
    }

    let mut edge_ids: HashSet<&str> = HashSet::with_capacity(document.edges.len());
    for edge in &document.edges {
        if !edge_ids.insert(edge.id.as_str()) {
            return Err(Inconsistency::DuplicateEdgeId(edge.id.clone()));
        }
        for endpoint in [&edge.from_node, &edge.to_node] {
            if !colors.contains_key(endpoint.as_str()) {
                return Err(Inconsistency::DanglingEndpoint {
                    edge: edge.id.clone(),
                    node: endpoint.clone(),
                });
            }
        }
    }

    let relation = breakdown
        .iter()
        .filter_map(|(node_ref, node)| node.parent.map(|parent| (parent, node_ref)));
    for (edge, (parent, child)) in document.edges.iter().zip(relation) {
        let (from, to) = (names.id(parent), names.id(child));
        if edge.from_node != from || edge.to_node != to {
            return Err(Inconsistency::EdgeMismatch {
                edge: edge.id.clone(),
                expected_from: from.to_string(),
                expected_to: to.to_string(),
            });
        }
        let node_color = colors[edge.to_node.as_str()];
        if edge.color != node_color {
            return Err(Inconsistency::EdgeColor {
                edge: edge.id.clone(),
                edge_color: edge.color.to_string(),
                node_color: node_color.to_string(),
            });
        }
    }
    Ok(())
}

pub fn write_document(
    document: &GraphDocument,
    output: Option<&Path>,
    pretty: bool,
) -> anyhow::Result<()> {
    let json = if pretty {
        document.to_json_pretty()?
    } else {
        document.to_json()?
    };
    match output {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("writing {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            writer
                .write_all(json.as_bytes())
                .and_then(|()| writer.flush())
                .with_context(|| format!("writing {}", path.display()))?;
        }
        None => {
            print!("{json}");
        }
    }
    Ok(())
}
