use hexsge_lib::hexbin::HexbinConfig;
use std::path::PathBuf;
use structopt::StructOpt;

/// Arguments for the `hexbin` command.
#[derive(Debug, Clone, StructOpt)]
#[structopt(
    name = "hexbin",
    about = "Bin a molecule table into sliding hexagons and write a MatrixMarket count matrix"
)]
pub struct HexbinArgs {
    /// Tab-separated molecule table with X, Y, gene and count columns (plain or gzip).
    #[structopt(short, long, parse(from_os_str))]
    pub input: PathBuf,

    /// Gzip-compressed gene mapping: catalog id in column 1, gene name in column 2.
    #[structopt(long, parse(from_os_str))]
    pub gene_id_info: PathBuf,

    /// Output prefix; `features.tsv.gz`, `barcode.tsv.gz` and `matrix.mtx.gz` are appended verbatim.
    #[structopt(short, long)]
    pub output_pref: String,

    /// Raw coordinate units per micron.
    #[structopt(long, default_value = "26.67")]
    pub mu_scale: f64,

    /// Count column (gn: gene, gt: gene total, spl/unspl/velo: velocity counts).
    #[structopt(short, long, default_value = "gn")]
    pub key: String,

    /// Hexagon width (flat side to flat side) in microns.
    #[structopt(long, default_value = "24")]
    pub hex_width: u32,

    /// Decimals stored for unit coordinates, 0 for integers.
    #[structopt(long, default_value = "1")]
    pub precision: usize,

    /// Hexagon radius in microns; overrides --hex-width when non-negative.
    #[structopt(long, default_value = "-1", allow_hyphen_values = true)]
    pub hex_radius: f64,

    /// Minimum molecules for a hexagon to be written as a unit.
    #[structopt(long, default_value = "20")]
    pub min_ct_per_unit: u64,

    /// Genes are kept when their total count is above this.
    #[structopt(long, default_value = "50")]
    pub min_count_per_feature: u64,

    /// Sliding steps per axis; defaults to a quarter of the hexagon width.
    #[structopt(long, default_value = "-1", allow_hyphen_values = true)]
    pub n_move: i64,

    /// Hexagons aggregated per sparse product.
    #[structopt(long, default_value = "512")]
    pub batch_size: usize,

    /// Skip passes keeping fewer hexagons than this (default: batch size / 4).
    #[structopt(long)]
    pub min_units_per_pass: Option<usize>,

    /// Gzip compression threads.
    #[structopt(short, long, default_value = "1")]
    pub threads: usize,

    /// Gzip level of the output files (0-9).
    #[structopt(long, default_value = "6")]
    pub compression_level: u32,
}

impl HexbinArgs {
    pub fn to_config(&self) -> HexbinConfig {
        HexbinConfig {
            mu_scale: self.mu_scale,
            count_key: self.key.clone(),
            hex_width: self.hex_width,
            hex_radius: self.hex_radius,
            precision: self.precision,
            min_ct_per_unit: self.min_ct_per_unit,
            min_count_per_feature: self.min_count_per_feature,
            n_move: self.n_move,
            batch_size: self.batch_size,
            min_units_per_pass: self.min_units_per_pass,
            threads: self.threads,
            compression_level: self.compression_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_arguments() {
        let args = HexbinArgs::from_iter_safe(&[
            "hexbin",
            "--input",
            "pixels.tsv.gz",
            "--gene-id-info",
            "genes.tsv.gz",
            "--output-pref",
            "out/sample.",
        ])
        .unwrap();

        assert_eq!(args.input, PathBuf::from("pixels.tsv.gz"));
        assert_eq!(args.output_pref, "out/sample.");
        assert_eq!(args.key, "gn");
        assert_eq!(args.hex_width, 24);
        assert_eq!(args.hex_radius, -1.0);
        assert_eq!(args.n_move, -1);
        assert_eq!(args.batch_size, 512);
        assert_eq!(args.min_units_per_pass, None);

        let config = args.to_config();
        assert_eq!(config.mu_scale, 26.67);
        assert_eq!(config.min_count_per_feature, 50);
        assert_eq!(config.compression_level, 6);
    }

    #[test]
    fn parses_negative_and_override_values() {
        let args = HexbinArgs::from_iter_safe(&[
            "hexbin",
            "-i",
            "pixels.tsv",
            "--gene-id-info",
            "genes.tsv.gz",
            "-o",
            "out.",
            "--hex-radius",
            "12.5",
            "--n-move",
            "-1",
            "--key",
            "gt",
            "--min-units-per-pass",
            "0",
            "--compression-level",
            "1",
        ])
        .unwrap();

        assert_eq!(args.hex_radius, 12.5);
        assert_eq!(args.n_move, -1);
        assert_eq!(args.to_config().count_key, "gt");
        assert_eq!(args.to_config().min_units_per_pass, Some(0));
        assert_eq!(args.to_config().compression_level, 1);
    }
}
