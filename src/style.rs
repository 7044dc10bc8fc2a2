use serde::{Serialize, Serializer};
use std::fmt;

use crate::config::LayoutConfig;
use crate::error::{CompileError, Result};
use crate::ir::{Breakdown, Category, NodeRef};

/// Canvas preset color. Written to the document as its numeric code in a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorCode {
    Blue = 1,
    Orange = 2,
    Yellow = 3,
    Green = 4,
    Cyan = 5,
    Purple = 6,
}

impl ColorCode {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ColorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for ColorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeStyle {
    pub color: ColorCode,
    pub min_width: i64,
    pub min_height: i64,
    pub max_height: i64,
}

impl NodeStyle {
    /// Clamps the caller's height estimate; no estimate means the minimum.
    pub fn height_for(&self, estimate: Option<i64>) -> i64 {
        estimate
            .unwrap_or(self.min_height)
            .clamp(self.min_height, self.max_height)
    }
}

/// Fixed category/depth color table.
pub fn color_for(category: Category, depth: u8) -> Option<ColorCode> {
    match (category, depth) {
        (Category::Original, _) => Some(ColorCode::Purple),
        (Category::Summary, _) => Some(ColorCode::Green),
        (Category::Section, 1) => Some(ColorCode::Yellow),
        (Category::Section, 2) => Some(ColorCode::Cyan),
        (Category::Section, 3) => Some(ColorCode::Blue),
        (Category::Section, _) => None,
        (Category::Special, _) => Some(ColorCode::Orange),
    }
}

pub fn resolve_style(category: Category, depth: u8, config: &LayoutConfig) -> Result<NodeStyle> {
    let color = color_for(category, depth).ok_or_else(|| {
        CompileError::malformed(
            &format!("{category:?}"),
            format!("no style for section depth {depth}"),
        )
    })?;
    Ok(NodeStyle {
        color,
        min_width: config.node_width,
        min_height: config.min_height,
        max_height: config.max_height.max(config.min_height),
    })
}

/// Style plus the clamped height of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedStyle {
    pub style: NodeStyle,
    pub width: i64,
    pub height: i64,
}

#[derive(Debug, Clone)]
pub struct Styles {
    styles: Vec<ResolvedStyle>,
}

impl Styles {
    pub fn get(&self, node: NodeRef) -> &ResolvedStyle {
        &self.styles[node.index()]
    }

    pub fn color(&self, node: NodeRef) -> ColorCode {
        self.styles[node.index()].style.color
    }
}

pub fn resolve_styles(breakdown: &Breakdown<'_>, config: &LayoutConfig) -> Result<Styles> {
    let styles = breakdown
        .iter()
        .map(|(_, node)| {
            let style = resolve_style(node.category(), node.content.depth, config)?;
            Ok(ResolvedStyle {
                style,
                width: style.min_width,
                height: style.height_for(node.content.estimated_height),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Styles { styles })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_categories() {
        assert_eq!(color_for(Category::Original, 0), Some(ColorCode::Purple));
        assert_eq!(color_for(Category::Summary, 0), Some(ColorCode::Green));
        assert_eq!(color_for(Category::Section, 1), Some(ColorCode::Yellow));
        assert_eq!(color_for(Category::Section, 2), Some(ColorCode::Cyan));
        assert_eq!(color_for(Category::Section, 3), Some(ColorCode::Blue));
        assert_eq!(color_for(Category::Special, 0), Some(ColorCode::Orange));
        assert_eq!(color_for(Category::Section, 4), None);
    }

    #[test]
    fn heights_are_clamped() {
        let style = resolve_style(Category::Summary, 0, &LayoutConfig::default()).unwrap();
        assert_eq!(style.min_width, 350);
        assert_eq!(style.height_for(None), 150);
        assert_eq!(style.height_for(Some(20)), 150);
        assert_eq!(style.height_for(Some(275)), 275);
        assert_eq!(style.height_for(Some(9000)), 400);
    }

    #[test]
    fn color_serializes_as_string_code() {
        assert_eq!(serde_json::to_string(&ColorCode::Orange).unwrap(), "\"2\"");
    }
}
