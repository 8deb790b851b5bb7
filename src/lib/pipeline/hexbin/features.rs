//! Gene catalog lookup and feature selection

use crate::core::error::Result;
use crate::core::fs::require_file;
use crate::core::io::{finish_writer, get_writer, open_text, Encoding};
use crate::pipeline::hexbin::input::MoleculeTable;
use log::{info, warn};
use rustc_hash::FxHashMap;
use std::io::BufRead;
use std::path::Path;

/// Label written in the third column of the features file.
pub const FEATURE_TYPE: &str = "Gene Expression";

/// Gene name → catalog identifier (e.g. Ensembl id).
#[derive(Debug, Clone, Default)]
pub struct GeneCatalog {
    name_to_id: FxHashMap<String, String>,
}

impl GeneCatalog {
    /// Load a tab-separated mapping with the identifier in column 0 and the name in column 1.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        require_file(path)?;
        let catalog = Self::from_reader(open_text(path, Encoding::from_path(path))?)?;
        info!("Loaded {} gene identifiers from {:?}", catalog.len(), path);
        Ok(catalog)
    }

    fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut name_to_id = FxHashMap::default();
        for line in reader.lines() {
            let line = line?;
            let mut columns = line.trim().split('\t');
            if let (Some(id), Some(name)) = (columns.next(), columns.next()) {
                name_to_id.insert(name.to_string(), id.to_string());
            }
        }
        Ok(Self { name_to_id })
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        Self {
            name_to_id: pairs
                .into_iter()
                .map(|(name, id)| (name.into(), id.into()))
                .collect(),
        }
    }

    #[inline]
    pub fn id_of(&self, name: &str) -> Option<&str> {
        self.name_to_id.get(name).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.name_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name_to_id.is_empty()
    }
}

/// Kept genes in column order.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    names: Vec<String>,
    ids: Vec<String>,
    totals: Vec<u64>,
    /// Column of each interned gene of the source table, `None` when filtered out.
    columns: Vec<Option<usize>>,
}

impl FeatureSet {
    /// Keep genes whose total count exceeds `min_count` and that have a catalog id.
    ///
    /// Kept genes are ordered by name.
    pub fn select(table: &MoleculeTable, catalog: &GeneCatalog, min_count: u64) -> Self {
        let genes = table.gene_names();
        let mut totals = vec![0u64; genes.len()];
        for molecule in table.molecules() {
            totals[molecule.gene as usize] += u64::from(molecule.count);
        }

        let mut above: Vec<usize> = (0..genes.len())
            .filter(|&g| totals[g] > min_count)
            .collect();
        let n_above = above.len();
        above.retain(|&g| catalog.id_of(&genes[g]).is_some());
        if above.len() < n_above {
            warn!(
                "{} of {} genes passing the count filter have no catalog identifier and are dropped",
                n_above - above.len(),
                n_above
            );
        }
        above.sort_unstable_by(|&a, &b| genes[a].cmp(&genes[b]));

        let mut columns = vec![None; genes.len()];
        let mut names = Vec::with_capacity(above.len());
        let mut ids = Vec::with_capacity(above.len());
        let mut kept_totals = Vec::with_capacity(above.len());
        for (col, &g) in above.iter().enumerate() {
            columns[g] = Some(col);
            names.push(genes[g].clone());
            ids.push(catalog.id_of(&genes[g]).unwrap_or_default().to_string());
            kept_totals.push(totals[g]);
        }

        info!(
            "Kept {} of {} genes with total count > {}",
            names.len(),
            genes.len(),
            min_count
        );
        Self {
            names,
            ids,
            totals: kept_totals,
            columns,
        }
    }

    /// Column of an interned gene from the source table.
    #[inline]
    pub fn column_of(&self, gene: u32) -> Option<usize> {
        self.columns.get(gene as usize).copied().flatten()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Total count of each kept gene, in column order.
    pub fn totals(&self) -> &[u64] {
        &self.totals
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Write `id<TAB>name<TAB>Gene Expression` lines, gzip-compressed, without header.
    pub fn write_tsv<P: AsRef<Path>>(&self, path: P, threads: usize, level: u32) -> Result<()> {
        let mut writer = get_writer(path.as_ref(), false, threads, level)?;
        for (id, name) in self.ids.iter().zip(&self.names) {
            writer.write_record([id.as_str(), name.as_str(), FEATURE_TYPE])?;
        }
        finish_writer(writer)
    }
}
