pub(crate) mod types;
pub use types::*;

use crate::config::LayoutConfig;
use crate::error::{CompileError, Result};
use crate::ir::{Breakdown, Level, NodeRef};
use crate::style::Styles;
use std::collections::BTreeMap;

/// Centres of a sibling group of `count` nodes around `center`:
/// `StartX = center - (count - 1) * (W + S) / 2`, then one pitch per sibling.
pub fn group_offsets(count: usize, center: i64, config: &LayoutConfig) -> Vec<i64> {
    if count == 0 {
        return Vec::new();
    }
    let pitch = config.pitch();
    let span = (count as i64 - 1) * pitch;
    let start = center - span.div_euclid(2);
    (0..count as i64).map(|idx| start + idx * pitch).collect()
}

pub fn compute_layout(
    breakdown: &Breakdown<'_>,
    styles: &Styles,
    config: &LayoutConfig,
) -> Result<Placement> {
    if config.node_width <= 0 {
        return Err(CompileError::InvalidGeometry(format!(
            "node width must be positive, got {}",
            config.node_width
        )));
    }

    let mut positions = vec![Position { x: 0, y: 0 }; breakdown.len()];
    let root = breakdown.root();
    positions[root.index()] = Position {
        x: 0,
        y: config.band_y(breakdown.get(root).level),
    };

    for (level, groups) in groups_by_level(breakdown) {
        let y = config.band_y(level);
        let (sections, specials): (Vec<_>, Vec<_>) = groups
            .into_iter()
            .partition(|group| group.kind == GroupKind::Sections);

        let mut placed: Vec<i64> = Vec::new();
        for (group, xs) in sweep_sections(&sections, &positions, config) {
            for (member, x) in group.members.iter().zip(&xs) {
                positions[member.index()] = Position { x: *x, y };
            }
            placed.extend(xs);
        }
        for group in &specials {
            let center = positions[group.anchor.index()].x;
            let xs = nearest_free_slot(group.members.len(), center, &placed, config);
            for (member, x) in group.members.iter().zip(&xs) {
                positions[member.index()] = Position { x: *x, y };
            }
            placed.extend(xs);
        }
        tracing::trace!(?level, y, nodes = placed.len(), "placed band");
    }

    let placement = Placement { positions };
    check_overlaps(breakdown, styles, &placement)?;
    tracing::debug!(nodes = placement.len(), "computed layout");
    Ok(placement)
}

/// Sibling groups keyed by the level they are drawn at. Levels iterate top-down, so
/// every anchor is final before its groups are placed.
fn groups_by_level(breakdown: &Breakdown<'_>) -> BTreeMap<Level, Vec<SiblingGroup>> {
    let mut levels: BTreeMap<Level, Vec<SiblingGroup>> = BTreeMap::new();
    for (anchor, node) in breakdown.iter() {
        for (kind, members) in [
            (GroupKind::Sections, &node.children),
            (GroupKind::Specials, &node.attachments),
        ] {
            let Some(first) = members.first() else {
                continue;
            };
            let level = breakdown.get(*first).level;
            levels.entry(level).or_default().push(SiblingGroup {
                anchor,
                kind,
                members: members.clone(),
            });
        }
    }
    levels
}

/// Places section groups under their anchors, left to right; a group that would
/// crowd the previous one moves right as a block.
fn sweep_sections<'g>(
    groups: &'g [SiblingGroup],
    positions: &[Position],
    config: &LayoutConfig,
) -> Vec<(&'g SiblingGroup, Vec<i64>)> {
    let mut ideal: Vec<(&SiblingGroup, Vec<i64>)> = groups
        .iter()
        .map(|group| {
            let center = positions[group.anchor.index()].x;
            (group, group_offsets(group.members.len(), center, config))
        })
        .collect();
    // Stable: equal left edges keep pre-order of their anchors.
    ideal.sort_by_key(|(_, xs)| xs[0]);

    let pitch = config.pitch();
    let mut last: Option<i64> = None;
    for (_, xs) in ideal.iter_mut() {
        if let Some(prev) = last {
            let shift = (prev + pitch - xs[0]).max(0);
            if shift > 0 {
                xs.iter_mut().for_each(|x| *x += shift);
            }
        }
        last = xs.last().copied();
    }
    ideal
}

/// Block position closest to the group's ideal centre that keeps a full pitch from
/// every node already placed in the band. Ties go right.
fn nearest_free_slot(count: usize, center: i64, placed: &[i64], config: &LayoutConfig) -> Vec<i64> {
    let ideal = group_offsets(count, center, config);
    let pitch = config.pitch();
    let fits = |first: i64| {
        (0..count as i64).all(|idx| {
            let x = first + idx * pitch;
            placed.iter().all(|other| (x - other).abs() >= pitch)
        })
    };
    if fits(ideal[0]) {
        return ideal;
    }

    let mut candidates: Vec<i64> = placed
        .iter()
        .flat_map(|other| [other + pitch, other - count as i64 * pitch])
        .filter(|first| fits(*first))
        .collect();
    candidates.sort_by_key(|first| ((first - ideal[0]).abs(), -(first - ideal[0])));
    let first = candidates.first().copied().unwrap_or(ideal[0]);
    (0..count as i64).map(|idx| first + idx * pitch).collect()
}

/// No two nodes sharing a band may have overlapping horizontal intervals.
fn check_overlaps(breakdown: &Breakdown<'_>, styles: &Styles, placement: &Placement) -> Result<()> {
    let mut bands: BTreeMap<i64, Vec<NodeRef>> = BTreeMap::new();
    for (node, _) in breakdown.iter() {
        bands.entry(placement.get(node).y).or_default().push(node);
    }
    for (band, mut nodes) in bands {
        nodes.sort_by_key(|node| (placement.get(*node).x, *node));
        for pair in nodes.windows(2) {
            let (left, right) = (pair[0], pair[1]);
            let left_edge = 2 * placement.get(left).x + styles.get(left).width;
            let right_edge = 2 * placement.get(right).x - styles.get(right).width;
            // Doubled to keep half widths exact; touching intervals are fine.
            if left_edge > right_edge {
                return Err(CompileError::LayoutOverflow {
                    band,
                    first: breakdown.get(left).title().to_string(),
                    second: breakdown.get(right).title().to_string(),
                });
            }
        }
    }
    Ok(())
}
