//! Whole-pipeline checks from molecule rows to the gzip artifacts.

#[cfg(test)]
mod hexbin_scenarios {
    use crate::pipeline::hexbin::config::HexbinConfig;
    use crate::pipeline::hexbin::features::{FeatureSet, GeneCatalog};
    use crate::pipeline::hexbin::geometry::LatticeOffset;
    use crate::pipeline::hexbin::input::MoleculeTable;
    use crate::pipeline::hexbin::pixels::PixelTable;
    use crate::pipeline::hexbin::sliding::{collect_units, run_sliding, PassReport};
    use crate::pipeline::hexbin::writer::{SinkSummary, UnitSink};
    use anyhow::Result;
    use flate2::read::MultiGzDecoder;
    use std::fs::File;
    use std::io::Read;
    use std::path::Path;
    use tempfile::tempdir;

    struct Run {
        summary: SinkSummary,
        reports: Vec<PassReport>,
        pixels: PixelTable,
        features: FeatureSet,
        barcodes: Vec<String>,
        header: (usize, u64, u64),
        entries: Vec<(usize, u64, u64)>,
    }

    fn gunzip(path: &Path) -> Result<String> {
        let mut text = String::new();
        MultiGzDecoder::new(File::open(path)?).read_to_string(&mut text)?;
        Ok(text)
    }

    fn run(table: &MoleculeTable, catalog: &GeneCatalog, config: &HexbinConfig) -> Result<Run> {
        let dir = tempdir()?;
        let prefix = format!("{}/hex.", dir.path().display());
        let plan = config.plan()?;

        let features = FeatureSet::select(table, catalog, config.min_count_per_feature);
        let pixels = PixelTable::build(table, &features, config.mu_scale)?;
        let mut sink = UnitSink::create(&prefix, plan.precision, 1, 6)?;
        let reports = run_sliding(&pixels, &plan, &mut sink)?;
        let summary = sink.finalize(features.len(), pixels.total_molecules())?;

        let barcodes = gunzip(&summary.barcode_path)?
            .lines()
            .map(str::to_string)
            .collect();
        let matrix = gunzip(&summary.matrix_path)?;
        let mut lines = matrix.lines();
        assert_eq!(
            lines.next(),
            Some("%%MatrixMarket matrix coordinate integer general")
        );
        assert_eq!(lines.next(), Some("%"));
        let dims: Vec<u64> = lines
            .next()
            .unwrap()
            .split(' ')
            .map(|v| v.parse().unwrap())
            .collect();
        let entries = lines
            .map(|line| {
                let v: Vec<u64> = line.split(' ').map(|v| v.parse().unwrap()).collect();
                (v[0] as usize, v[1], v[2])
            })
            .collect();

        Ok(Run {
            summary,
            reports,
            pixels,
            features,
            barcodes,
            header: (dims[0] as usize, dims[1], dims[2]),
            entries,
        })
    }

    fn one_gene_catalog() -> GeneCatalog {
        GeneCatalog::from_pairs(vec![("Actb", "ENSMUSG00000029580")])
    }

    #[test]
    fn four_pixels_in_one_large_hexagon() -> Result<()> {
        let mut table = MoleculeTable::new();
        for &(x, y) in &[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)] {
            table.push(x, y, "Actb", 25);
        }
        let config = HexbinConfig {
            mu_scale: 1.0,
            hex_radius: 100.0,
            n_move: 1,
            min_ct_per_unit: 20,
            min_count_per_feature: 0,
            batch_size: 4,
            ..HexbinConfig::default()
        };

        let out = run(&table, &one_gene_catalog(), &config)?;
        assert_eq!(out.reports.len(), 1);
        assert_eq!((out.reports[0].offs_x, out.reports[0].offs_y), (0, 0));
        assert_eq!(out.reports[0].kept_count, 100);
        assert_eq!(out.header, (1, 1, 100));
        assert_eq!(out.entries, vec![(1, 1, 100)]);
        assert_eq!(out.barcodes, vec!["1_0.5_0.5".to_string()]);
        Ok(())
    }

    #[test]
    fn low_count_gene_has_no_column() -> Result<()> {
        let mut table = MoleculeTable::new();
        for i in 0..4 {
            table.push(i as f64, 0.0, "Actb", 30);
        }
        table.push(0.0, 0.0, "Rare", 10);
        let catalog = GeneCatalog::from_pairs(vec![("Actb", "E1"), ("Rare", "E2")]);
        let config = HexbinConfig {
            mu_scale: 1.0,
            hex_radius: 50.0,
            n_move: 1,
            min_count_per_feature: 10,
            batch_size: 1,
            ..HexbinConfig::default()
        };

        let out = run(&table, &catalog, &config)?;
        assert_eq!(out.features.names(), &["Actb".to_string()]);
        assert_eq!(out.header.0, 1);
        assert!(out.entries.iter().all(|&(gene, _, _)| gene == 1));
        // the rare gene's molecules are not part of the total
        assert_eq!(out.header.2, 120);
        Ok(())
    }

    #[test]
    fn pass_with_too_few_hexagons_is_skipped() -> Result<()> {
        let mut table = MoleculeTable::new();
        // three far-apart clusters → three hexagons
        for &(cx, cy) in &[(0.0, 0.0), (500.0, 0.0), (0.0, 500.0)] {
            table.push(cx, cy, "Actb", 40);
            table.push(cx + 1.0, cy, "Actb", 40);
        }
        let config = HexbinConfig {
            mu_scale: 1.0,
            hex_width: 24,
            n_move: 1,
            min_count_per_feature: 0,
            batch_size: 512,
            ..HexbinConfig::default()
        };

        let out = run(&table, &one_gene_catalog(), &config)?;
        assert_eq!(out.reports.len(), 1);
        assert_eq!(out.reports[0].n_hex, 3);
        assert!(out.reports[0].skipped);
        assert!(out.barcodes.is_empty());
        assert!(out.entries.is_empty());
        assert_eq!(out.header, (1, 0, 240));
        assert_eq!(out.summary.n_units, 0);
        Ok(())
    }

    #[test]
    fn no_surviving_features_gives_empty_artifact() -> Result<()> {
        let mut table = MoleculeTable::new();
        table.push(0.0, 0.0, "Actb", 5);
        let config = HexbinConfig {
            mu_scale: 1.0,
            n_move: 2,
            ..HexbinConfig::default()
        };

        let out = run(&table, &one_gene_catalog(), &config)?;
        assert_eq!(out.reports.len(), 4);
        assert_eq!(out.header, (0, 0, 0));
        assert!(out.entries.is_empty());
        assert!(out.barcodes.is_empty());
        Ok(())
    }

    #[test]
    fn matrix_column_sums_match_binned_pixels() -> Result<()> {
        let genes = ["Actb", "Gapdh", "Malat1"];
        let mut table = MoleculeTable::new();
        for i in 0..40u32 {
            for j in 0..40u32 {
                let gene = genes[((i * 7 + j * 3) % 3) as usize];
                let count = 1 + (i * j) % 4;
                table.push(f64::from(i) * 26.67, f64::from(j) * 26.67, gene, count);
                if (i + j) % 5 == 0 {
                    table.push(f64::from(i) * 26.67, f64::from(j) * 26.67, "Actb", 2);
                }
            }
        }
        let catalog = GeneCatalog::from_pairs(vec![
            ("Actb", "E1"),
            ("Gapdh", "E2"),
            ("Malat1", "E3"),
        ]);
        let config = HexbinConfig {
            hex_width: 8,
            n_move: 2,
            min_ct_per_unit: 30,
            min_count_per_feature: 0,
            batch_size: 8,
            ..HexbinConfig::default()
        };
        let plan = config.plan()?;

        let out = run(&table, &catalog, &config)?;

        // expected per-gene sums over pixels of kept hexagons in non-skipped passes
        let mut expected = vec![0u64; out.features.len()];
        let mut expected_units = 0u64;
        for report in out.reports.iter().filter(|r| !r.skipped) {
            let offset = LatticeOffset::from_step(report.offs_x, report.offs_y, plan.n_move);
            let units = collect_units(&out.pixels, plan.radius, offset, plan.min_ct_per_unit);
            expected_units += units.len() as u64;
            for row in 0..units.len() {
                for &pixel in units.members.row(row) {
                    let counts = out.pixels.counts().row(pixel);
                    for (&col, &v) in counts.col_indices().iter().zip(counts.values()) {
                        expected[col] += u64::from(v);
                    }
                }
            }
        }

        let mut observed = vec![0u64; out.features.len()];
        let mut last_unit = 0u64;
        for &(gene, unit, value) in &out.entries {
            observed[gene - 1] += value;
            assert!(unit >= last_unit, "unit ids must not decrease");
            last_unit = unit;
        }

        assert!(out.reports.iter().any(|r| !r.skipped));
        assert_eq!(observed, expected);
        assert_eq!(out.header.1, expected_units);
        assert_eq!(out.barcodes.len() as u64, expected_units);
        assert_eq!(out.header.2, out.pixels.total_molecules());

        let ids: Vec<u64> = out
            .barcodes
            .iter()
            .map(|b| b.split('_').next().unwrap().parse().unwrap())
            .collect();
        assert_eq!(ids, (1..=expected_units).collect::<Vec<_>>());
        Ok(())
    }
}
