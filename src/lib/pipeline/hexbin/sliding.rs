//! Sliding-window passes over the hexagonal lattice.
//!
//! Every pass shifts the lattice by `(offs_x, offs_y) / n_move`, keeps the
//! hexagons that collect at least `min_ct_per_unit` molecules and appends them
//! as new units. Units of different passes overlap in space and are never
//! merged.

use crate::core::error::{HexSgeError, Result};
use crate::pipeline::hexbin::config::GridPlan;
use crate::pipeline::hexbin::geometry::{assign_points, HexCoord, LatticeOffset};
use crate::pipeline::hexbin::minibatch::{aggregate_units, UnitMembers};
use crate::pipeline::hexbin::pixels::PixelTable;
use crate::pipeline::hexbin::writer::UnitSink;
use log::info;
use rustc_hash::FxHashMap;

/// Kept hexagons of one pass, rows ordered by hexagon coordinate.
#[derive(Debug, Clone)]
pub struct PassUnits {
    pub hexes: Vec<HexCoord>,
    /// Mean pixel position of each unit, microns.
    pub centroids: Vec<(f64, f64)>,
    pub totals: Vec<u64>,
    pub members: UnitMembers,
    /// Molecules in hexagons below the minimum.
    pub dropped_count: u64,
}

impl PassUnits {
    pub fn len(&self) -> usize {
        self.hexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hexes.is_empty()
    }

    pub fn kept_count(&self) -> u64 {
        self.totals.iter().sum()
    }

    /// Median total of the kept units.
    pub fn median_total(&self) -> Option<f64> {
        if self.totals.is_empty() {
            return None;
        }
        let mut sorted = self.totals.clone();
        sorted.sort_unstable();
        let mid = sorted.len() / 2;
        Some(if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
        } else {
            sorted[mid] as f64
        })
    }
}

#[derive(Default)]
struct HexTally {
    total: u64,
    sum_x: f64,
    sum_y: f64,
    n_pixels: usize,
}

/// Bin every pixel under `offset` and keep hexagons with total ≥ `min_ct_per_unit`.
pub fn collect_units(
    pixels: &PixelTable,
    radius: f64,
    offset: LatticeOffset,
    min_ct_per_unit: u64,
) -> PassUnits {
    let hexes = assign_points(pixels.coords(), radius, offset);

    let mut tally: FxHashMap<HexCoord, HexTally> = FxHashMap::default();
    for ((hex, &(x, y)), &tot) in hexes.iter().zip(pixels.coords()).zip(pixels.totals()) {
        let entry = tally.entry(*hex).or_default();
        entry.total += tot;
        entry.sum_x += x;
        entry.sum_y += y;
        entry.n_pixels += 1;
    }

    let mut dropped_count = 0u64;
    let mut kept: Vec<(HexCoord, HexTally)> = Vec::with_capacity(tally.len());
    for (hex, t) in tally {
        if t.total >= min_ct_per_unit {
            kept.push((hex, t));
        } else {
            dropped_count += t.total;
        }
    }
    kept.sort_unstable_by_key(|(hex, _)| *hex);

    let row_of: FxHashMap<HexCoord, usize> = kept
        .iter()
        .enumerate()
        .map(|(row, (hex, _))| (*hex, row))
        .collect();
    let unit_of: Vec<Option<usize>> = hexes.iter().map(|hex| row_of.get(hex).copied()).collect();
    let members = UnitMembers::from_assignment(&unit_of, kept.len());

    let mut units = PassUnits {
        hexes: Vec::with_capacity(kept.len()),
        centroids: Vec::with_capacity(kept.len()),
        totals: Vec::with_capacity(kept.len()),
        members,
        dropped_count,
    };
    for (hex, t) in kept {
        let n = t.n_pixels as f64;
        units.hexes.push(hex);
        units.centroids.push((t.sum_x / n, t.sum_y / n));
        units.totals.push(t.total);
    }
    units
}

/// What one pass contributed.
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    pub offs_x: u32,
    pub offs_y: u32,
    /// Hexagons passing the count minimum.
    pub n_hex: usize,
    /// Units appended to the output (0 when skipped).
    pub n_units: usize,
    pub n_blocks: usize,
    pub n_entries: usize,
    pub kept_count: u64,
    pub dropped_count: u64,
    pub skipped: bool,
}

/// Run the pass at step `(offs_x, offs_y)`, appending its units to `sink` unless the
/// skip policy drops it.
pub fn run_pass(
    pixels: &PixelTable,
    plan: &GridPlan,
    offs_x: u32,
    offs_y: u32,
    sink: &mut UnitSink,
) -> Result<PassReport> {
    let offset = LatticeOffset::from_step(offs_x, offs_y, plan.n_move);
    let units = collect_units(pixels, plan.radius, offset, plan.min_ct_per_unit);
    let n_hex = units.len();

    let mut report = PassReport {
        offs_x,
        offs_y,
        n_hex,
        n_units: 0,
        n_blocks: 0,
        n_entries: 0,
        kept_count: units.kept_count(),
        dropped_count: units.dropped_count,
        skipped: plan.skip.skips(n_hex),
    };

    info!(
        "Offset ({}, {}): {} hexagons kept ({} pixels), median count per unit {}",
        offs_x,
        offs_y,
        n_hex,
        units.members.n_members(),
        units
            .median_total()
            .map_or_else(|| "n/a".to_string(), |m| m.to_string())
    );

    if report.skipped {
        info!(
            "Offset ({}, {}) skipped: {} hexagons is below {}",
            offs_x, offs_y, n_hex, plan.skip.min_units
        );
        return Ok(report);
    }

    let start = sink.n_units();
    sink.write_barcodes(&units.centroids)?;
    let stats = aggregate_units(&units.members, pixels.counts(), plan.batch_size, sink)?;
    let appended = sink.n_units() - start;
    if appended != n_hex as u64 {
        return Err(HexSgeError::DimensionMismatch {
            expected: format!("{} units appended", n_hex),
            actual: format!("{} units appended", appended),
        });
    }

    report.n_units = n_hex;
    report.n_blocks = stats.n_blocks;
    report.n_entries = stats.n_entries;
    info!(
        "Sliding offset {}, {}. Fit data with {} units.",
        offs_x,
        offs_y,
        sink.n_units()
    );
    Ok(report)
}

/// Run all `n_move²` passes in order.
pub fn run_sliding(
    pixels: &PixelTable,
    plan: &GridPlan,
    sink: &mut UnitSink,
) -> Result<Vec<PassReport>> {
    let mut reports = Vec::with_capacity(plan.n_passes());
    for (offs_x, offs_y) in plan.offsets() {
        reports.push(run_pass(pixels, plan, offs_x, offs_y, sink)?);
    }
    let skipped = reports.iter().filter(|r| r.skipped).count();
    info!(
        "Completed {} passes ({} skipped), {} units in total",
        reports.len(),
        skipped,
        sink.n_units()
    );
    Ok(reports)
}
