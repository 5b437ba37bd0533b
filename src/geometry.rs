//! Plain geometry for the packer: points, rectangles, and the hit-test.
//!
//! Packer coordinates live in (fixed, flex) axis space: `x` is always the
//! fixed-axis coordinate and `y` the flex-axis coordinate, regardless of
//! which screen axis is configured as fixed. Mapping to screen axes happens
//! at the layout boundary.

/// A point in (fixed, flex) coordinates. Doubles as a candidate slot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A concrete axis-aligned rectangle with both corners known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Rect {
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// A rectangle of the given extent anchored at the origin.
    pub const fn sized(fixed: f64, flex: f64) -> Self {
        Self::new(0.0, 0.0, fixed, flex)
    }
}

/// A rectangle whose sides may be unbounded. `None` means the comparison on
/// that side always passes, which is how the container sentinel models an
/// infinite wall.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x1: Option<f64>,
    pub y1: Option<f64>,
    pub x2: Option<f64>,
    pub y2: Option<f64>,
}

impl Bounds {
    /// Degenerate bounds covering a single point.
    pub const fn at(point: Point) -> Self {
        Self {
            x1: Some(point.x),
            y1: Some(point.y),
            x2: Some(point.x),
            y2: Some(point.y),
        }
    }

    /// A wall at the given fixed-axis coordinate, unbounded everywhere else.
    pub const fn wall_at(x: f64) -> Self {
        Self {
            x1: Some(x),
            y1: None,
            x2: None,
            y2: None,
        }
    }
}

impl From<Rect> for Bounds {
    fn from(rect: Rect) -> Self {
        Self {
            x1: Some(rect.x1),
            y1: Some(rect.y1),
            x2: Some(rect.x2),
            y2: Some(rect.y2),
        }
    }
}

/// Test whether `rect`, translated by `offset` and inflated by
/// `gutter - 1` on every side, overlaps `bounds`.
///
/// The 1-unit shrink means boxes that exactly touch at gutter 0 do not
/// count as overlapping, so adjacent placements are legal. Each axis is
/// tested independently and both must hit; an unbounded side never rejects.
pub fn overlaps(rect: Rect, bounds: Bounds, gutter: f64, offset: Point) -> bool {
    let x1 = rect.x1 + offset.x - gutter + 1.0;
    let y1 = rect.y1 + offset.y - gutter + 1.0;
    let x2 = rect.x2 + offset.x + gutter - 1.0;
    let y2 = rect.y2 + offset.y + gutter - 1.0;

    let hit_x = !bounds.x1.is_some_and(|b| x2 < b) && !bounds.x2.is_some_and(|b| x1 > b);
    let hit_y = !bounds.y1.is_some_and(|b| y2 < b) && !bounds.y2.is_some_and(|b| y1 > b);

    hit_x && hit_y
}

/// Container size in terminal cells, fed to the runtime by resize events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u16,
    pub height: u16,
}

impl Size {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}
