mod args;

use anyhow::{Context, Result};
use hexsge_lib::hexbin::writer::FEATURE_SUFFIX;
use hexsge_lib::hexbin::{
    run_sliding, FeatureSet, GeneCatalog, MoleculeTable, PixelTable, SinkSummary, UnitSink,
};
use hexsge_lib::utils;
use log::info;
use std::time::Instant;

pub use args::HexbinArgs;

/// Entry point for the `hexbin` command.
pub fn run_hexbin(args: HexbinArgs) -> Result<SinkSummary> {
    let start_time = Instant::now();
    let config = args.to_config();
    let plan = config.plan().context("invalid hexagon settings")?;
    info!(
        "Hexagon radius {:.3} µm, width {} µm, {} sliding steps per axis ({} passes)",
        plan.radius,
        plan.width,
        plan.n_move,
        plan.n_passes()
    );

    // both inputs must exist before anything is written
    utils::require_file(&args.input)?;
    utils::require_file(&args.gene_id_info)?;

    let table = MoleculeTable::from_path(&args.input, &config.count_key)
        .with_context(|| format!("Failed to read molecule table {:?}", args.input))?;
    let catalog = GeneCatalog::from_path(&args.gene_id_info)
        .with_context(|| format!("Failed to read gene mapping {:?}", args.gene_id_info))?;

    let features = FeatureSet::select(&table, &catalog, config.min_count_per_feature);
    let pixels = PixelTable::build(&table, &features, config.mu_scale)?;
    drop(table);
    info!(
        "Read data with {} pixels and {} genes.",
        pixels.len(),
        features.len()
    );

    let features_path = utils::prefixed_path(&args.output_pref, FEATURE_SUFFIX);
    utils::make_parent_dirs(&features_path)?;

    let mut sink = UnitSink::create(
        &args.output_pref,
        plan.precision,
        config.threads,
        config.compression_level,
    )?;
    sink.write_features(&features)
        .with_context(|| format!("Failed to write {:?}", features_path))?;
    run_sliding(&pixels, &plan, &mut sink)?;
    let summary = sink.finalize(features.len(), pixels.total_molecules())?;

    info!(
        "hexbin finished in {:?}: {} units, {} features, {} nonzeros",
        start_time.elapsed(),
        summary.n_units,
        summary.n_features,
        summary.n_entries
    );
    Ok(summary)
}
