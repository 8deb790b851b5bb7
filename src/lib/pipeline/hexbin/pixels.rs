//! Pixel aggregation: unique coordinates with summed counts and the pixel-by-gene matrix.

use crate::core::error::Result;
use crate::core::sparse::SparseOps;
use crate::pipeline::hexbin::features::FeatureSet;
use crate::pipeline::hexbin::input::MoleculeTable;
use log::info;
use nalgebra_sparse::CsrMatrix;
use rustc_hash::FxHashMap;

/// Deduplicated pixels of the kept genes.
///
/// Row `i` of [`counts`](PixelTable::counts) belongs to pixel `i`; pixels are numbered
/// by first appearance in the molecule table.
#[derive(Debug, Clone)]
pub struct PixelTable {
    coords: Vec<(f64, f64)>,
    totals: Vec<u64>,
    counts: CsrMatrix<u32>,
    total_molecules: u64,
}

impl PixelTable {
    /// Collapse rows of kept genes by exact raw coordinate and scale coordinates to microns.
    pub fn build(table: &MoleculeTable, features: &FeatureSet, mu_scale: f64) -> Result<Self> {
        let mut index: FxHashMap<(u64, u64), usize> = FxHashMap::default();
        let mut coords = Vec::new();
        let mut triplets = Vec::with_capacity(table.len());
        let mut total_molecules = 0u64;

        for molecule in table.molecules() {
            let Some(col) = features.column_of(molecule.gene) else {
                continue;
            };
            // -0.0 and 0.0 are the same location
            let key = ((molecule.x + 0.0).to_bits(), (molecule.y + 0.0).to_bits());
            let row = *index.entry(key).or_insert_with(|| {
                coords.push((molecule.x / mu_scale, molecule.y / mu_scale));
                coords.len() - 1
            });
            total_molecules += u64::from(molecule.count);
            triplets.push((row, col, molecule.count));
        }

        let counts = SparseOps::from_triplets_u32(coords.len(), features.len(), triplets)?;
        let totals = SparseOps::compute_row_sums(&counts);
        info!(
            "Aggregated {} pixels × {} genes ({} nonzeros, {} molecules)",
            counts.nrows(),
            counts.ncols(),
            counts.nnz(),
            total_molecules
        );

        Ok(Self {
            coords,
            totals,
            counts,
            total_molecules,
        })
    }

    /// Pixel coordinates in microns.
    #[inline]
    pub fn coords(&self) -> &[(f64, f64)] {
        &self.coords
    }

    /// Summed count of each pixel over kept genes.
    #[inline]
    pub fn totals(&self) -> &[u64] {
        &self.totals
    }

    /// Pixel-by-gene counts.
    #[inline]
    pub fn counts(&self) -> &CsrMatrix<u32> {
        &self.counts
    }

    /// Sum of all kept counts.
    #[inline]
    pub fn total_molecules(&self) -> u64 {
        self.total_molecules
    }

    pub fn n_genes(&self) -> usize {
        self.counts.ncols()
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}
