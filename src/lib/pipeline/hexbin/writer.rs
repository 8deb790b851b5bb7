//! Streaming output of unit barcodes and MatrixMarket triplets.
//!
//! Everything is written to temporaries next to the final paths. The matrix
//! body is kept as plain text until [`UnitSink::finalize`] knows the number of
//! units, then the header and body are compressed into a second temporary.
//! Only once that is complete are the temporaries renamed, matrix first, then
//! barcodes and features. Dropping a sink, or failing inside `finalize`, removes
//! every temporary that was not yet renamed.

use crate::core::error::Result;
use crate::core::fs::{prefixed_path, sibling_dir};
use crate::core::io::gz_writer;
use crate::core::sparse::SparseMatrixExt;
use crate::pipeline::hexbin::features::FeatureSet;
use gzp::ZWriter;
use log::{debug, info};
use nalgebra_sparse::CsrMatrix;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const BARCODE_SUFFIX: &str = "barcode.tsv.gz";
pub const MATRIX_SUFFIX: &str = "matrix.mtx.gz";
pub const FEATURE_SUFFIX: &str = "features.tsv.gz";

const MATRIX_BANNER: &str = "%%MatrixMarket matrix coordinate integer general";

/// Final dimensions of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkSummary {
    pub n_units: u64,
    pub n_features: usize,
    pub n_entries: u64,
    pub total_molecules: u64,
    pub barcode_path: PathBuf,
    pub matrix_path: PathBuf,
    /// Set when features were staged with [`UnitSink::write_features`].
    pub features_path: Option<PathBuf>,
}

/// Owner of the global unit counter and of the open output streams.
pub struct UnitSink {
    n_units: u64,
    n_entries: u64,
    precision: usize,
    threads: usize,
    compression_level: u32,
    barcode_path: PathBuf,
    matrix_path: PathBuf,
    features_path: PathBuf,
    features_tmp: Option<NamedTempFile>,
    barcode_tmp: NamedTempFile,
    barcodes: Box<dyn ZWriter>,
    body_tmp: NamedTempFile,
    body: BufWriter<File>,
}

impl UnitSink {
    /// Open temporaries for `<prefix>barcode.tsv.gz` and `<prefix>matrix.mtx.gz`.
    ///
    /// Existing files at the final paths are left untouched until `finalize`.
    pub fn create(
        prefix: &str,
        precision: usize,
        threads: usize,
        compression_level: u32,
    ) -> Result<Self> {
        let barcode_path = prefixed_path(prefix, BARCODE_SUFFIX);
        let matrix_path = prefixed_path(prefix, MATRIX_SUFFIX);
        let features_path = prefixed_path(prefix, FEATURE_SUFFIX);

        let barcode_tmp = temp_beside(&barcode_path, ".barcode")?;
        let barcodes = gz_writer(barcode_tmp.reopen()?, threads, compression_level);
        let body_tmp = temp_beside(&matrix_path, ".matrix-body")?;
        let body = BufWriter::with_capacity(1 << 20, body_tmp.reopen()?);
        debug!(
            "Streaming matrix body to {:?}, barcodes to {:?}",
            body_tmp.path(),
            barcode_tmp.path()
        );

        Ok(Self {
            n_units: 0,
            n_entries: 0,
            precision,
            threads,
            compression_level,
            barcode_path,
            matrix_path,
            features_path,
            features_tmp: None,
            barcode_tmp,
            barcodes,
            body_tmp,
            body,
        })
    }

    /// Units written so far; the next unit gets id `n_units() + 1`.
    #[inline]
    pub fn n_units(&self) -> u64 {
        self.n_units
    }

    #[inline]
    pub fn n_entries(&self) -> u64 {
        self.n_entries
    }

    /// Stage `<prefix>features.tsv.gz`; it is renamed into place by [`finalize`](Self::finalize).
    pub fn write_features(&mut self, features: &FeatureSet) -> Result<()> {
        let tmp = temp_beside(&self.features_path, ".features")?;
        features.write_tsv(tmp.path(), self.threads, self.compression_level)?;
        self.features_tmp = Some(tmp);
        Ok(())
    }

    /// Write `<id>_<X>_<Y>` for units that will be appended next, ids counted from the
    /// current counter.
    pub fn write_barcodes(&mut self, centroids: &[(f64, f64)]) -> Result<()> {
        let p = self.precision;
        for (i, &(x, y)) in centroids.iter().enumerate() {
            let id = self.n_units + i as u64 + 1;
            writeln!(self.barcodes, "{}_{:.*}_{:.*}", id, p, x, p, y)?;
        }
        Ok(())
    }

    /// Append a unit-by-gene block as `<gene> <unit> <value>` lines and advance the counter
    /// by its row count. Explicit zeros are skipped.
    pub fn write_block(&mut self, block: &CsrMatrix<u32>) -> Result<usize> {
        let triplets = block.nonzero_triplets();
        for &(row, col, value) in &triplets {
            writeln!(
                self.body,
                "{} {} {}",
                col + 1,
                self.n_units + row as u64 + 1,
                value
            )?;
        }
        let written = triplets.len();
        self.n_units += block.nrows() as u64;
        self.n_entries += written as u64;
        Ok(written)
    }

    /// Write the header `<n_features> <n_units> <total_molecules>` ahead of the body and
    /// move every artifact into place.
    pub fn finalize(self, n_features: usize, total_molecules: u64) -> Result<SinkSummary> {
        let UnitSink {
            n_units,
            n_entries,
            threads,
            compression_level,
            barcode_path,
            matrix_path,
            features_path,
            features_tmp,
            barcode_tmp,
            mut barcodes,
            body_tmp,
            mut body,
            ..
        } = self;

        barcodes.finish()?;
        drop(barcodes);
        body.flush()?;
        drop(body);

        let matrix_tmp = temp_beside(&matrix_path, ".matrix")?;
        {
            let mut out = gz_writer(matrix_tmp.reopen()?, threads, compression_level);
            writeln!(out, "{}", MATRIX_BANNER)?;
            writeln!(out, "%")?;
            writeln!(out, "{} {} {}", n_features, n_units, total_molecules)?;
            let mut reader = BufReader::with_capacity(1 << 20, body_tmp.reopen()?);
            io::copy(&mut reader, &mut out)?;
            out.finish()?;
        }
        drop(body_tmp);

        matrix_tmp.persist(&matrix_path)?;
        barcode_tmp.persist(&barcode_path)?;
        let features_path = match features_tmp {
            Some(tmp) => {
                tmp.persist(&features_path)?;
                Some(features_path)
            }
            None => None,
        };

        info!(
            "Wrote {} units × {} features ({} nonzeros) to {:?}",
            n_units, n_features, n_entries, matrix_path
        );

        Ok(SinkSummary {
            n_units,
            n_features,
            n_entries,
            total_molecules,
            barcode_path,
            matrix_path,
            features_path,
        })
    }
}

fn temp_beside(target: &Path, tag: &str) -> Result<NamedTempFile> {
    let stem = target
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("hexsge");
    Ok(tempfile::Builder::new()
        .prefix(&format!(".{}{}", stem, tag))
        .suffix(".tmp")
        .tempfile_in(sibling_dir(target))?)
}
