//! hexsge: hexagonal spatial gene expression binning
//!
//! Converts single-molecule spatial transcriptomics tables (X, Y, gene, count)
//! into gene-by-hexagon count matrices in MatrixMarket format, using a
//! sliding hexagonal lattice for staggered coverage.
//!
//! # Modules
//!
//! - [`core`]: errors, filesystem and IO helpers, sparse matrix operations
//! - [`pipeline`]: the hexagon binning pipeline
//! - [`utils`]: re-exports of frequently used helpers

pub mod core;
pub mod pipeline;
pub mod utils;

pub use pipeline::hexbin;
