//! Pointy-top hexagonal lattice in axial coordinates.
//!
//! A cell of radius `r` (center to corner) is `r·√3` wide between opposite flat
//! sides, which is the "hexagon width" used on the command line. Offsets are
//! expressed in lattice units and move the whole lattice rigidly.

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Axial coordinate of one hexagonal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HexCoord {
    pub q: i64,
    pub r: i64,
}

/// Fractional lattice shift applied before rounding, each component in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatticeOffset {
    pub x: f64,
    pub y: f64,
}

impl LatticeOffset {
    /// Offset of sliding step `(offs_x, offs_y)` out of `n_move` steps per axis.
    pub fn from_step(offs_x: u32, offs_y: u32, n_move: u32) -> Self {
        let n = f64::from(n_move.max(1));
        Self {
            x: f64::from(offs_x) / n,
            y: f64::from(offs_y) / n,
        }
    }
}

/// Width between flat sides of a hexagon with the given radius.
#[inline]
pub fn radius_to_width(radius: f64) -> f64 {
    radius * SQRT_3
}

/// Radius of a hexagon whose flat sides are `width` apart.
#[inline]
pub fn width_to_radius(width: f64) -> f64 {
    width / SQRT_3
}

/// Cell containing the point `(x, y)`.
#[inline]
pub fn pixel_to_hex(x: f64, y: f64, radius: f64, offset: LatticeOffset) -> HexCoord {
    let q = (SQRT_3 / 3.0 * x - y / 3.0) / radius - offset.x;
    let r = (2.0 / 3.0 * y) / radius - offset.y;
    axial_round(q, r)
}

/// Cell of every point, in input order.
pub fn assign_points(points: &[(f64, f64)], radius: f64, offset: LatticeOffset) -> Vec<HexCoord> {
    points
        .iter()
        .map(|&(x, y)| pixel_to_hex(x, y, radius, offset))
        .collect()
}

/// Center of a cell in the same units as the input points.
pub fn hex_center(hex: HexCoord, radius: f64, offset: LatticeOffset) -> (f64, f64) {
    let q = hex.q as f64 + offset.x;
    let r = hex.r as f64 + offset.y;
    let x = radius * (SQRT_3 * q + SQRT_3 / 2.0 * r);
    let y = radius * (1.5 * r);
    (x, y)
}

fn axial_round(q: f64, r: f64) -> HexCoord {
    let s = -q - r;
    let mut rq = q.round();
    let mut rr = r.round();
    let rs = s.round();

    let dq = (rq - q).abs();
    let dr = (rr - r).abs();
    let ds = (rs - s).abs();

    if dq > dr && dq > ds {
        rq = -rr - rs;
    } else if dr > ds {
        rr = -rq - rs;
    }

    HexCoord {
        q: rq as i64,
        r: rr as i64,
    }
}
