//! Canvas geometry
//!
//! Coordinate helpers shared by placement, routing and annotation:
//! - grid quantization (routed wires and annotations land on multiples of 5)
//! - the global offset that maps source-graph coordinates (Y-down) onto the
//!   host canvas (Y-up)
//! - the page-centering offset derived from the root block

use serde::{Deserialize, Serialize};

/// Drawing grid pitch in canvas units
pub const GRID: i64 = 5;

/// Page size used when the host cannot report one
pub const FALLBACK_PAGE_WIDTH: f64 = 1200.0;
pub const FALLBACK_PAGE_HEIGHT: f64 = 800.0;

/// A raw (unquantized) coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Snap both axes to the drawing grid
    pub fn quantize(self) -> GridPoint {
        GridPoint::new(quantize(self.x), quantize(self.y))
    }

    /// Nearest integer canvas position, without grid snapping
    pub fn round(self) -> GridPoint {
        GridPoint::new(round_half_up(self.x), round_half_up(self.y))
    }
}

/// An integer canvas coordinate pair.
///
/// Host drawing requests only accept this type. Everything the engine
/// computes is quantized onto the grid; only net stubs start on the raw
/// pin position reported by the host.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct GridPoint {
    pub x: i64,
    pub y: i64,
}

impl GridPoint {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i64, dy: i64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// True when the segment to `other` is horizontal, vertical or degenerate
    pub fn is_aligned_with(&self, other: &GridPoint) -> bool {
        self.x == other.x || self.y == other.y
    }
}

impl std::fmt::Display for GridPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Axis-aligned box in source-graph coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl Default for PageSize {
    fn default() -> Self {
        Self {
            width: FALLBACK_PAGE_WIDTH,
            height: FALLBACK_PAGE_HEIGHT,
        }
    }
}

fn round_half_up(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}

/// Round half up, then truncate to a multiple of the grid.
///
/// The remainder truncates toward zero, so negative values move toward zero
/// (`-7` becomes `-5`). The result is always a multiple of [`GRID`] and
/// quantizing twice is the same as quantizing once.
pub fn quantize(v: f64) -> i64 {
    let rounded = round_half_up(v);
    rounded - rounded % GRID
}

/// Global translation from source-graph space onto the canvas.
///
/// An unset axis leaves that coordinate untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl Offset {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn new(x: Option<f64>, y: Option<f64>) -> Self {
        Self { x, y }
    }

    /// Map into the placement frame: X shifts, Y flips around `offset.y`
    pub fn apply(&self, p: Point) -> Point {
        let x = match self.x {
            Some(ox) => ox + p.x,
            None => p.x,
        };
        let y = match self.y {
            Some(oy) => oy - p.y,
            None => p.y,
        };
        Point { x, y }
    }

    /// Map into the host's wire frame, whose Y axis is the negation of the
    /// placement frame. Pin positions reported by the host live here.
    pub fn to_wire_frame(&self, p: Point) -> Point {
        let placed = self.apply(p);
        Point::new(placed.x, -placed.y)
    }
}

pub fn apply_offset(x: f64, y: f64, offset: &Offset) -> Point {
    offset.apply(Point::new(x, y))
}

/// Offset that places the root block on the page.
///
/// Without a root block the identity is used. Centered mode centers the
/// root on both axes; otherwise only the vertical flip by the root height
/// is applied.
pub fn page_offset(root: Option<&Rect>, page: PageSize, centered: bool) -> Offset {
    let Some(root) = root else {
        return Offset::identity();
    };

    if centered {
        Offset {
            x: Some((page.width - root.width) / 2.0),
            y: Some((page.height - root.height) / 2.0 + root.height),
        }
    } else {
        Offset {
            x: None,
            y: Some(root.height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_positive() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(4.4), 0);
        assert_eq!(quantize(7.4), 5);
        assert_eq!(quantize(9.6), 10);
        assert_eq!(quantize(12.5), 10);
        assert_eq!(quantize(14.5), 15);
    }

    #[test]
    fn test_quantize_negative_truncates_toward_zero() {
        assert_eq!(quantize(-7.0), -5);
        assert_eq!(quantize(-2.5), 0);
        assert_eq!(quantize(-10.0), -10);
        assert_eq!(quantize(-12.6), -10);
    }

    #[test]
    fn test_quantize_idempotent_and_on_grid() {
        let mut v = -503.7;
        while v < 503.7 {
            let q = quantize(v);
            assert_eq!(q % GRID, 0, "quantize({}) = {} is off-grid", v, q);
            assert_eq!(quantize(q as f64), q, "quantize not idempotent at {}", v);
            v += 0.37;
        }
    }

    #[test]
    fn test_round_keeps_off_grid_positions() {
        assert_eq!(Point::new(101.0, -49.0).round(), GridPoint::new(101, -49));
        assert_eq!(Point::new(2.5, -2.5).round(), GridPoint::new(3, -2));
        assert_eq!(Point::new(101.0, -49.0).quantize(), GridPoint::new(100, -45));
    }

    #[test]
    fn test_offset_identity() {
        let p = apply_offset(12.5, -3.0, &Offset::new(None, None));
        assert_eq!(p, Point::new(12.5, -3.0));
    }

    #[test]
    fn test_offset_flips_y() {
        let offset = Offset::new(Some(100.0), Some(400.0));
        assert_eq!(offset.apply(Point::new(10.0, 50.0)), Point::new(110.0, 350.0));
        assert_eq!(
            offset.to_wire_frame(Point::new(10.0, 50.0)),
            Point::new(110.0, -350.0)
        );
    }

    #[test]
    fn test_offset_partial() {
        let offset = Offset::new(None, Some(200.0));
        assert_eq!(offset.apply(Point::new(10.0, 50.0)), Point::new(10.0, 150.0));
    }

    #[test]
    fn test_page_offset_centered() {
        let root = Rect {
            x: 0.0,
            y: 0.0,
            width: 400.0,
            height: 200.0,
        };
        let offset = page_offset(Some(&root), PageSize::default(), true);
        assert_eq!(offset.x, Some(400.0));
        assert_eq!(offset.y, Some(500.0));
    }

    #[test]
    fn test_page_offset_not_centered() {
        let root = Rect {
            x: 0.0,
            y: 0.0,
            width: 400.0,
            height: 200.0,
        };
        let offset = page_offset(Some(&root), PageSize::default(), false);
        assert_eq!(offset.x, None);
        assert_eq!(offset.y, Some(200.0));
    }

    #[test]
    fn test_page_offset_without_root() {
        let offset = page_offset(None, PageSize::default(), true);
        assert_eq!(offset, Offset::identity());
    }
}
