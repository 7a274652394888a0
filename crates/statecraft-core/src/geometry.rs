//! Points, sizes and bounding boxes used by the layout solver.
//!
//! The y axis grows downwards and every rectangle is anchored at its top-left
//! corner. A state's rectangle is relative to the content area of the
//! composite state that contains it.

/// A position in layout space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn x(self) -> f32 {
        self.x
    }

    pub fn y(self) -> f32 {
        self.y
    }
}

/// Width and height of a state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn width(self) -> f32 {
        self.width
    }

    pub fn height(self) -> f32 {
        self.height
    }

    /// The smallest size that fits both `self` and `other`.
    pub fn max(self, other: Size) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }
}

/// Axis-aligned box spanned by the states placed in one composite.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    /// Right edge.
    pub fn max_x(self) -> f32 {
        self.max_x
    }

    /// Bottom edge.
    pub fn max_y(self) -> f32 {
        self.max_y
    }

    /// The box covering both `self` and `other`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use statecraft_core::geometry::{Bounds, Point, Size};
    /// let idle = Bounds::new_from_top_left(Point::new(20.0, 60.0), Size::new(120.0, 80.0));
    /// let busy = Bounds::new_from_top_left(Point::new(160.0, 60.0), Size::new(120.0, 80.0));
    ///
    /// let content = idle.merge(&busy);
    /// assert_eq!(content.max_x(), 280.0);
    /// assert_eq!(content.max_y(), 140.0);
    /// ```
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Whether the two boxes share interior area; touching edges do not count.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn state_box(x: f32, y: f32, width: f32, height: f32) -> Bounds {
        Bounds::new_from_top_left(Point::new(x, y), Size::new(width, height))
    }

    #[test]
    fn test_size_max_takes_each_axis() {
        let leaf = Size::new(120.0, 80.0);
        let labelled = Size::new(200.0, 60.0);
        assert_eq!(leaf.max(labelled), Size::new(200.0, 80.0));
    }

    #[test]
    fn test_bounds_from_top_left() {
        let bounds = state_box(20.0, 60.0, 120.0, 80.0);
        assert_eq!(bounds.max_x(), 140.0);
        assert_eq!(bounds.max_y(), 140.0);
    }

    #[test]
    fn test_neighbouring_cells_do_not_overlap() {
        let cell = state_box(0.0, 0.0, 120.0, 80.0);
        let right = state_box(120.0, 0.0, 120.0, 80.0);
        let below = state_box(0.0, 80.0, 120.0, 80.0);
        let pinned = state_box(60.0, 40.0, 120.0, 80.0);

        assert!(!cell.overlaps(&right));
        assert!(!cell.overlaps(&below));
        assert!(cell.overlaps(&pinned));
        assert!(pinned.overlaps(&right));
    }

    fn bounds_strategy() -> impl Strategy<Value = Bounds> {
        (0.0f32..1000.0, 0.0f32..1000.0, 1.0f32..500.0, 1.0f32..500.0)
            .prop_map(|(x, y, width, height)| state_box(x, y, width, height))
    }

    fn check_merge_covers_both(a: Bounds, b: Bounds) -> Result<(), TestCaseError> {
        let merged = a.merge(&b);
        prop_assert_eq!(merged, b.merge(&a));
        for part in [a, b] {
            prop_assert!(merged.min_x <= part.min_x && merged.min_y <= part.min_y);
            prop_assert!(merged.max_x >= part.max_x && merged.max_y >= part.max_y);
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn merge_covers_both(a in bounds_strategy(), b in bounds_strategy()) {
            check_merge_covers_both(a, b)?;
        }
    }
}
