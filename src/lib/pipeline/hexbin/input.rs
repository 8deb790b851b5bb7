//! Molecule table reader.
//!
//! The table is tab-separated with a header; `X`, `Y`, `gene` and one count
//! column (chosen by key) are required, other columns are ignored.

use crate::core::error::{HexSgeError, Result};
use crate::core::fs::require_file;
use crate::core::io::{get_reader, Encoding};
use log::{debug, info, warn};
use rustc_hash::FxHashMap;
use std::io::Read;
use std::path::Path;

pub const X_COLUMN: &str = "X";
pub const Y_COLUMN: &str = "Y";
pub const GENE_COLUMN: &str = "gene";

/// One input row with the gene name interned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Molecule {
    pub x: f64,
    pub y: f64,
    pub gene: u32,
    pub count: u32,
}

/// Raw molecule rows in file order plus the interned gene names.
#[derive(Debug, Clone, Default)]
pub struct MoleculeTable {
    genes: Vec<String>,
    gene_index: FxHashMap<String, u32>,
    molecules: Vec<Molecule>,
}

impl MoleculeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a table with the encoding its suffix suggests, falling back to the other
    /// decoders (gzip, plain text, bzip2) on failure. The first error is reported.
    pub fn from_path<P: AsRef<Path>>(path: P, key: &str) -> Result<Self> {
        let path = path.as_ref();
        require_file(path)?;

        let primary = Encoding::from_path(path);
        let first = match Self::read_with(path, key, primary) {
            Ok(table) => return Ok(table),
            Err(err) => err,
        };
        for fallback in Encoding::ALL.into_iter().filter(|&e| e != primary) {
            warn!(
                "Failed to read {:?} as {} ({}); retrying as {}",
                path,
                primary.name(),
                first,
                fallback.name()
            );
            match Self::read_with(path, key, fallback) {
                Ok(table) => return Ok(table),
                Err(err) => debug!("Fallback read of {:?} failed: {}", path, err),
            }
        }
        Err(first)
    }

    fn read_with(path: &Path, key: &str, encoding: Encoding) -> Result<Self> {
        let reader = get_reader(path, true, encoding)?;
        let table = Self::from_csv(reader, key, &path.display().to_string())?;
        info!(
            "Read {} molecule rows covering {} genes from {:?}",
            table.len(),
            table.genes.len(),
            path
        );
        Ok(table)
    }

    /// Parse every record of a headed, tab-delimited reader.
    pub fn from_csv<R: Read>(mut reader: csv::Reader<R>, key: &str, source: &str) -> Result<Self> {
        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| HexSgeError::MissingColumn {
                    column: name.to_string(),
                    path: source.to_string(),
                })
        };
        let x_idx = column(X_COLUMN)?;
        let y_idx = column(Y_COLUMN)?;
        let gene_idx = column(GENE_COLUMN)?;
        let count_idx = column(key)?;

        let mut table = Self::new();
        let mut record = csv::StringRecord::new();
        let mut line = 1usize;
        while reader.read_record(&mut record)? {
            line += 1;
            let field = |idx: usize| {
                record.get(idx).ok_or_else(|| {
                    HexSgeError::Parse(format!("{}: line {} has too few columns", source, line))
                })
            };
            let x = parse_coordinate(field(x_idx)?, source, line)?;
            let y = parse_coordinate(field(y_idx)?, source, line)?;
            let count = parse_count(field(count_idx)?, source, line)?;
            table.push(x, y, field(gene_idx)?, count);
        }

        Ok(table)
    }

    /// Append one row.
    pub fn push(&mut self, x: f64, y: f64, gene: &str, count: u32) {
        let gene = match self.gene_index.get(gene) {
            Some(&id) => id,
            None => {
                let id = self.genes.len() as u32;
                self.genes.push(gene.to_string());
                self.gene_index.insert(gene.to_string(), id);
                id
            }
        };
        self.molecules.push(Molecule { x, y, gene, count });
    }

    #[inline]
    pub fn gene_names(&self) -> &[String] {
        &self.genes
    }

    #[inline]
    pub fn molecules(&self) -> &[Molecule] {
        &self.molecules
    }

    pub fn len(&self) -> usize {
        self.molecules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.molecules.is_empty()
    }
}

fn parse_coordinate(raw: &str, source: &str, line: usize) -> Result<f64> {
    let value: f64 = raw.trim().parse().map_err(|_| {
        HexSgeError::Parse(format!("{}: line {}: invalid coordinate '{}'", source, line, raw))
    })?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(HexSgeError::Parse(format!(
            "{}: line {}: non-finite coordinate '{}'",
            source, line, raw
        )))
    }
}

/// Counts are non-negative integers; a decimal with zero fraction (`3.0`) is accepted.
fn parse_count(raw: &str, source: &str, line: usize) -> Result<u32> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<u32>() {
        return Ok(value);
    }
    match raw.parse::<f64>() {
        Ok(value) if value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX) => {
            Ok(value as u32)
        }
        _ => Err(HexSgeError::Parse(format!(
            "{}: line {}: invalid count '{}'",
            source, line, raw
        ))),
    }
}
