//! Hexagonal binning of spatial molecule tables.
//!
//! Molecules are collapsed into pixels, pixels are binned into hexagons on a
//! lattice that slides over `n_move²` sub-cell offsets, and every hexagon with
//! enough molecules becomes one unit (column) of a gene-by-unit MatrixMarket
//! matrix.
//!
//! # Key Components
//!
//! - [`config`]: run options and their resolution into a [`GridPlan`]
//! - [`geometry`]: pointy-top axial lattice
//! - [`input`]: molecule table reader
//! - [`features`]: gene catalog and feature filtering
//! - [`pixels`]: pixel aggregation and the pixel-by-gene matrix
//! - [`sliding`]: per-offset passes
//! - [`minibatch`]: block-wise sparse aggregation
//! - [`writer`]: barcode and matrix sinks

pub mod config;
pub mod features;
pub mod geometry;
pub mod input;
pub mod minibatch;
pub mod pixels;
pub mod sliding;
pub mod writer;

#[cfg(test)]
mod scenario_test;

pub use config::{GridPlan, HexbinConfig, SkipPolicy};
pub use features::{FeatureSet, GeneCatalog};
pub use input::MoleculeTable;
pub use pixels::PixelTable;
pub use sliding::{run_sliding, PassReport};
pub use writer::{SinkSummary, UnitSink};
