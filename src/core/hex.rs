//! Axial Hex Coordinates
//!
//! Pure coordinate math for the pointy-top hex grid.
//! Cells are addressed by axial `(q, r)`; the cube coordinate `s = -q - r`
//! is implicit.

use std::fmt;
use std::ops::Add;
use serde::{Serialize, Deserialize};

/// The six axial neighbor offsets.
pub const DIRECTIONS: [Hex; 6] = [
    Hex::new(1, 0),
    Hex::new(-1, 0),
    Hex::new(0, 1),
    Hex::new(0, -1),
    Hex::new(1, -1),
    Hex::new(-1, 1),
];

/// A cell on the hex grid in axial coordinates.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Hex {
    /// Column axis
    pub q: i32,
    /// Row axis
    pub r: i32,
}

impl Hex {
    /// The origin cell.
    pub const ORIGIN: Self = Self { q: 0, r: 0 };

    /// Create a hex from axial components.
    #[inline]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Implicit third cube coordinate.
    #[inline]
    pub const fn s(self) -> i32 {
        -self.q - self.r
    }

    /// Hex distance to another cell.
    ///
    /// `(|dq| + |dq + dr| + |dr|) / 2`. The numerator is always even for
    /// integer axial inputs, so the division is exact. Computed in `i64` so
    /// any pair of `i32` cells is safe; saturates at `u32::MAX`.
    #[inline]
    pub fn distance(self, other: Self) -> u32 {
        let (q1, r1) = (i64::from(self.q), i64::from(self.r));
        let (q2, r2) = (i64::from(other.q), i64::from(other.r));
        let dq = (q1 - q2).abs();
        let dr = (r1 - r2).abs();
        let ds = ((q1 + r1) - (q2 + r2)).abs();
        u32::try_from((dq + dr + ds) / 2).unwrap_or(u32::MAX)
    }

    /// Whether `other` is exactly one step away.
    #[inline]
    pub fn is_adjacent(self, other: Self) -> bool {
        self.distance(other) == 1
    }

    /// The six cells adjacent to this one.
    pub fn neighbors(self) -> [Hex; 6] {
        DIRECTIONS.map(|d| self + d)
    }

    /// All cells at exactly `radius` steps, walking the ring in a fixed order.
    pub fn ring(self, radius: u32) -> Vec<Hex> {
        if radius == 0 {
            return vec![self];
        }
        // Start at the (-1, +1) corner, then walk each side of the ring.
        let walk = [DIRECTIONS[0], DIRECTIONS[4], DIRECTIONS[3], DIRECTIONS[1], DIRECTIONS[5], DIRECTIONS[2]];
        let mut cell = self + Hex::new(-(radius as i32), radius as i32);
        let mut out = Vec::with_capacity(6 * radius as usize);
        for dir in walk {
            for _ in 0..radius {
                out.push(cell);
                cell = cell + dir;
            }
        }
        out
    }

    /// All cells within `radius` steps (inclusive), ring by ring.
    pub fn within_radius(self, radius: u32) -> Vec<Hex> {
        (0..=radius).flat_map(|k| self.ring(k)).collect()
    }
}

impl Add for Hex {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.q + other.q, self.r + other.r)
    }
}

impl fmt::Debug for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hex({}, {})", self.q, self.r)
    }
}

impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

// =============================================================================
// FRACTIONAL HEX
// =============================================================================

/// A point in axial space with fractional components (e.g. a pointer position).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FractionalHex {
    /// Fractional column
    pub q: f64,
    /// Fractional row
    pub r: f64,
}

impl FractionalHex {
    /// Create from fractional axial components.
    pub const fn new(q: f64, r: f64) -> Self {
        Self { q, r }
    }

    /// Round to the containing cell.
    ///
    /// Each cube coordinate is rounded on its own, then the axis with the
    /// largest rounding error is rebuilt from the other two so that
    /// `q + r + s == 0` holds exactly.
    pub fn round(self) -> Hex {
        let s = -self.q - self.r;

        let mut q = self.q.round();
        let mut r = self.r.round();
        let rs = s.round();

        let dq = (q - self.q).abs();
        let dr = (r - self.r).abs();
        let ds = (rs - s).abs();

        if dq > dr && dq > ds {
            q = -r - rs;
        } else if dr > ds {
            r = -q - rs;
        }

        Hex::new(q as i32, r as i32)
    }
}

// =============================================================================
// PIXEL LAYOUT
// =============================================================================

/// Pointy-top pixel layout for converting between screen space and cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HexLayout {
    /// Distance from cell center to a corner, in pixels.
    pub size: f64,
    /// Pixel position of the origin cell's center.
    pub origin: (f64, f64),
}

impl HexLayout {
    /// Create a layout with the given cell size and origin.
    pub const fn new(size: f64, origin: (f64, f64)) -> Self {
        Self { size, origin }
    }

    /// Center of a cell in pixels.
    pub fn hex_to_pixel(&self, hex: Hex) -> (f64, f64) {
        let q = f64::from(hex.q);
        let r = f64::from(hex.r);
        let x = self.size * (3f64.sqrt() * q + 3f64.sqrt() / 2.0 * r);
        let y = self.size * (1.5 * r);
        (x + self.origin.0, y + self.origin.1)
    }

    /// Fractional cell under a pixel position.
    pub fn pixel_to_hex(&self, x: f64, y: f64) -> FractionalHex {
        let px = (x - self.origin.0) / self.size;
        let py = (y - self.origin.1) / self.size;
        let q = 3f64.sqrt() / 3.0 * px - py / 3.0;
        let r = 2.0 / 3.0 * py;
        FractionalHex::new(q, r)
    }

    /// Cell under a pixel position.
    pub fn cell_at(&self, x: f64, y: f64) -> Hex {
        self.pixel_to_hex(x, y).round()
    }
}
