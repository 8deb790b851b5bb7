//! Block-wise unit aggregation.
//!
//! Units of one pass are split into contiguous row blocks; each block is
//! aggregated as `membership (block × pixels) · counts (pixels × genes)` and
//! streamed to the sink before the next block is built, so at most one block
//! of unit-by-gene counts is in memory.

use crate::core::error::{HexSgeError, Result};
use crate::core::sparse::SparseOps;
use crate::pipeline::hexbin::writer::UnitSink;
use log::debug;
use nalgebra_sparse::CsrMatrix;
use std::ops::Range;

/// Member pixels of each unit, grouped by unit row in CSR layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitMembers {
    offsets: Vec<usize>,
    pixels: Vec<usize>,
}

impl UnitMembers {
    /// Group pixels by unit; `unit_of[p]` is the unit row of pixel `p`, if any.
    pub fn from_assignment(unit_of: &[Option<usize>], n_units: usize) -> Self {
        let mut offsets = vec![0usize; n_units + 1];
        for &unit in unit_of.iter().flatten() {
            offsets[unit + 1] += 1;
        }
        for i in 0..n_units {
            offsets[i + 1] += offsets[i];
        }

        let mut cursor = offsets.clone();
        let mut pixels = vec![0usize; offsets[n_units]];
        for (pixel, unit) in unit_of.iter().enumerate() {
            if let Some(unit) = *unit {
                pixels[cursor[unit]] = pixel;
                cursor[unit] += 1;
            }
        }

        Self { offsets, pixels }
    }

    /// Pixels of unit `row`, ascending.
    #[inline]
    pub fn row(&self, row: usize) -> &[usize] {
        &self.pixels[self.offsets[row]..self.offsets[row + 1]]
    }

    pub fn n_units(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Number of pixels assigned to any unit.
    pub fn n_members(&self) -> usize {
        self.pixels.len()
    }
}

/// Contiguous row ranges of at most `batch_size` rows; the last range holds the remainder.
pub fn block_ranges(n_rows: usize, batch_size: usize) -> Vec<Range<usize>> {
    let step = batch_size.max(1);
    (0..n_rows)
        .step_by(step)
        .map(|start| start..(start + step).min(n_rows))
        .collect()
}

/// Counts of the aggregated blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockStats {
    pub n_blocks: usize,
    pub n_entries: usize,
}

/// Unit-by-gene counts of the units in `rows`.
pub fn aggregate_block(
    members: &UnitMembers,
    rows: Range<usize>,
    counts: &CsrMatrix<u32>,
) -> Result<CsrMatrix<u32>> {
    if rows.end > members.n_units() {
        return Err(HexSgeError::InvalidInput(format!(
            "block {:?} exceeds {} units",
            rows,
            members.n_units()
        )));
    }
    let block: Vec<&[usize]> = rows.map(|row| members.row(row)).collect();
    let membership = SparseOps::membership_matrix(counts.nrows(), &block)?;
    SparseOps::multiply(&membership, counts)
}

/// Aggregate every unit block in increasing row order and append each to `sink`.
pub fn aggregate_units(
    members: &UnitMembers,
    counts: &CsrMatrix<u32>,
    batch_size: usize,
    sink: &mut UnitSink,
) -> Result<BlockStats> {
    let ranges = block_ranges(members.n_units(), batch_size);
    let n_blocks = ranges.len();
    let mut stats = BlockStats::default();

    for (i, rows) in ranges.into_iter().enumerate() {
        let block = aggregate_block(members, rows, counts)?;
        stats.n_entries += sink.write_block(&block)?;
        stats.n_blocks += 1;
        debug!(
            "{}/{}. Wrote {} units so far.",
            i + 1,
            n_blocks,
            sink.n_units()
        );
    }

    Ok(stats)
}
