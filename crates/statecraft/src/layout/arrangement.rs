//! Packing policies for leaf states.
//!
//! Leaves are the children of a composite that have no children of their
//! own. They are placed below any composite siblings, starting at the
//! origin handed in by the solver. Two policies exist:
//!
//! - [`GridArrangement`] - uniform cells in a fixed number of columns
//! - [`TieredArrangement`] - one row band per complexity tier, sorted by
//!   category and label inside a tier

use std::cmp::Ordering;

use log::trace;

use statecraft_core::{
    geometry::{Point, Size},
    semantic::LayoutPolicy,
    visual::LayoutRect,
};

use crate::{config::LayoutConfig, layout::graph::LayoutNode};

/// Trait implemented by leaf packing policies.
pub trait LeafArrangement {
    /// Place `leaves` with their top-left content corner at `origin`.
    ///
    /// Returns one rectangle per leaf, in placement order.
    fn arrange(
        &self,
        leaves: &[&LayoutNode],
        origin: Point,
        config: &LayoutConfig,
    ) -> Vec<(String, LayoutRect)>;
}

/// Returns the arrangement implementing `policy`.
pub fn arrangement_for(policy: LayoutPolicy) -> Box<dyn LeafArrangement> {
    match policy {
        LayoutPolicy::Grid => Box::new(GridArrangement),
        LayoutPolicy::Tiered => Box::new(TieredArrangement),
    }
}

/// Smallest size at which a leaf's label and actions fit.
pub fn minimum_size(node: &LayoutNode, config: &LayoutConfig) -> Size {
    let label_width =
        node.label().chars().count() as f32 * config.char_width() + config.label_padding();
    let base_height = if node.is_terminal() {
        config.terminal_min_height()
    } else {
        config.state_min_height()
    };
    Size::new(
        config.leaf_min_width().max(label_width),
        base_height + node.action_count() as f32 * config.action_height(),
    )
}

/// Fixed-column grid with cells sized by the largest leaf.
#[derive(Debug, Default, Clone, Copy)]
pub struct GridArrangement;

impl LeafArrangement for GridArrangement {
    fn arrange(
        &self,
        leaves: &[&LayoutNode],
        origin: Point,
        config: &LayoutConfig,
    ) -> Vec<(String, LayoutRect)> {
        if leaves.is_empty() {
            return Vec::new();
        }

        let columns = config.grid_columns().min(leaves.len());
        let cell = leaves
            .iter()
            .map(|leaf| minimum_size(leaf, config))
            .fold(Size::default(), Size::max);
        trace!(columns, width = cell.width(), height = cell.height(); "Grid cell");

        leaves
            .iter()
            .enumerate()
            .map(|(index, leaf)| {
                let column = (index % columns) as f32;
                let row = (index / columns) as f32;
                let position = Point::new(
                    origin.x() + column * (cell.width() + config.spacing()),
                    origin.y() + row * (cell.height() + config.spacing()),
                );
                (leaf.id().to_string(), LayoutRect::from_parts(position, cell))
            })
            .collect()
    }
}

/// Semantic role of a leaf, used to order leaves inside a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    Initial,
    Operational,
    Sensor,
    Terminal,
    Error,
}

const ERROR_KEYWORDS: &[&str] = &["error", "fail", "fault", "abort", "panic"];
const TERMINAL_KEYWORDS: &[&str] = &["done", "end", "finish", "complete", "stop", "exit"];
const SENSOR_KEYWORDS: &[&str] = &["sensor", "monitor", "detect", "read", "sample", "watch", "listen"];

impl Category {
    /// Infer the category from the initial flag, the kind and the label.
    pub fn of(node: &LayoutNode) -> Self {
        let label = node.label().to_lowercase();
        let mentions = |keywords: &[&str]| keywords.iter().any(|keyword| label.contains(keyword));

        if node.is_initial() {
            Self::Initial
        } else if mentions(ERROR_KEYWORDS) {
            Self::Error
        } else if node.is_terminal() || mentions(TERMINAL_KEYWORDS) {
            Self::Terminal
        } else if mentions(SENSOR_KEYWORDS) {
            Self::Sensor
        } else {
            Self::Operational
        }
    }
}

/// Complexity tier from the number of entry and exit actions.
pub fn tier(node: &LayoutNode) -> usize {
    match node.action_count() {
        0 => 0,
        1 | 2 => 1,
        _ => 2,
    }
}

fn reading_order(a: &LayoutNode, b: &LayoutNode) -> Ordering {
    (Category::of(a), a.label(), a.id()).cmp(&(Category::of(b), b.label(), b.id()))
}

/// Row bands by complexity tier, leaves keep their own minimum size.
#[derive(Debug, Default, Clone, Copy)]
pub struct TieredArrangement;

impl LeafArrangement for TieredArrangement {
    fn arrange(
        &self,
        leaves: &[&LayoutNode],
        origin: Point,
        config: &LayoutConfig,
    ) -> Vec<(String, LayoutRect)> {
        let mut tiers: [Vec<&LayoutNode>; 3] = Default::default();
        for &leaf in leaves {
            tiers[tier(leaf)].push(leaf);
        }

        let mut placed = Vec::with_capacity(leaves.len());
        let mut y = origin.y();
        for (index, members) in tiers.iter_mut().enumerate() {
            if members.is_empty() {
                continue;
            }
            members.sort_by(|a, b| reading_order(a, b));
            trace!(tier = index, members = members.len(); "Placing tier");

            for row in members.chunks(config.tier_columns()) {
                let mut x = origin.x();
                let mut row_height: f32 = 0.0;
                for leaf in row {
                    let size = minimum_size(leaf, config);
                    placed.push((
                        leaf.id().to_string(),
                        LayoutRect::from_parts(Point::new(x, y), size),
                    ));
                    x += size.width() + config.spacing();
                    row_height = row_height.max(size.height());
                }
                y += row_height + config.spacing();
            }
        }
        placed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use float_cmp::approx_eq;

    fn leaf(id: &str) -> LayoutNode {
        LayoutNode::new(id, "state")
    }

    fn ids(placed: &[(String, LayoutRect)]) -> Vec<&str> {
        placed.iter().map(|(id, _)| id.as_str()).collect()
    }

    #[test]
    fn test_minimum_size() {
        let config = LayoutConfig::default();

        let short = minimum_size(&leaf("a"), &config);
        assert!(approx_eq!(f32, short.width(), 120.0));
        assert!(approx_eq!(f32, short.height(), 80.0));

        let long = minimum_size(&leaf("a_rather_long_label"), &config);
        assert!(approx_eq!(f32, long.width(), 19.0 * 8.0 + 40.0));

        let busy_final = minimum_size(&LayoutNode::new("f", "final").with_actions(1, 1), &config);
        assert!(approx_eq!(f32, busy_final.height(), 60.0 + 2.0 * 16.0));
    }

    #[test]
    fn test_grid_uses_uniform_cells() {
        let config = LayoutConfig::default();
        let nodes = [leaf("a"), leaf("b"), leaf("c").with_actions(2, 0)];
        let leaves: Vec<&LayoutNode> = nodes.iter().collect();

        let placed = GridArrangement.arrange(&leaves, Point::new(20.0, 60.0), &config);
        assert_eq!(ids(&placed), vec!["a", "b", "c"]);

        let cell_height = 80.0 + 2.0 * 16.0;
        for (_, rect) in &placed {
            assert!(approx_eq!(f32, rect.width, 120.0));
            assert!(approx_eq!(f32, rect.height, cell_height));
        }
        assert_eq!(placed[1].1.x, 20.0 + 120.0 + 20.0);
        assert_eq!(placed[1].1.y, 60.0);
        assert_eq!(placed[2].1.x, 20.0);
        assert_eq!(placed[2].1.y, 60.0 + cell_height + 20.0);
    }

    #[test]
    fn test_grid_single_leaf() {
        let config = LayoutConfig::default();
        let node = leaf("only");
        let placed = GridArrangement.arrange(&[&node], Point::new(0.0, 0.0), &config);
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].1, LayoutRect::new(0.0, 0.0, 120.0, 80.0));
    }

    #[test]
    fn test_categories() {
        assert_eq!(Category::of(&leaf("x").with_initial(true)), Category::Initial);
        assert_eq!(Category::of(&leaf("ReadTemperature")), Category::Sensor);
        assert_eq!(Category::of(&leaf("motor_fault")), Category::Error);
        assert_eq!(Category::of(&LayoutNode::new("halt", "final")), Category::Terminal);
        assert_eq!(Category::of(&leaf("running")), Category::Operational);
    }

    #[test]
    fn test_tiers() {
        assert_eq!(tier(&leaf("a")), 0);
        assert_eq!(tier(&leaf("a").with_actions(1, 1)), 1);
        assert_eq!(tier(&leaf("a").with_actions(2, 1)), 2);
    }

    #[test]
    fn test_tiered_bands_and_order() {
        let config = LayoutConfig::default();
        let nodes = [
            leaf("zeta"),
            leaf("heavy").with_actions(3, 0),
            leaf("sensor_poll"),
            leaf("alpha"),
            leaf("start").with_initial(true),
            leaf("retry").with_actions(1, 0),
        ];
        let leaves: Vec<&LayoutNode> = nodes.iter().collect();

        let placed = TieredArrangement.arrange(&leaves, Point::new(0.0, 0.0), &config);
        assert_eq!(
            ids(&placed),
            vec!["start", "alpha", "zeta", "sensor_poll", "retry", "heavy"]
        );

        // Tier 0 fits in one band of four.
        assert!(placed[..4].iter().all(|(_, rect)| rect.y == 0.0));
        assert_eq!(placed[4].1.y, 80.0 + 20.0);
        assert_eq!(placed[5].1.y, 80.0 + 20.0 + 96.0 + 20.0);
    }

    #[test]
    fn test_tiered_wraps_long_tiers() {
        let config = LayoutConfig::default();
        let nodes: Vec<_> = ["a", "b", "c", "d", "e"].into_iter().map(leaf).collect();
        let leaves: Vec<&LayoutNode> = nodes.iter().collect();

        let placed = TieredArrangement.arrange(&leaves, Point::new(0.0, 0.0), &config);
        assert_eq!(placed[4].1.x, 0.0);
        assert_eq!(placed[4].1.y, 100.0);
    }
}
