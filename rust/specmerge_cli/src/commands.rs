use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;

use specmerge::{
    FeatureRow,
    MergeConfig,
    SpectraMerger,
};
use tracing::{
    info,
    instrument,
};

use crate::cli::{
    MergeArgs,
    WriteTemplateArgs,
};
use crate::error::CliError;
use crate::output::MergedRowWriter;
use crate::processing::process_rows;

/// Main function for the 'merge' subcommand.
#[instrument]
pub fn main_merge(args: MergeArgs) -> Result<(), CliError> {
    let config = match &args.config {
        Some(path) => read_merge_config(path)?,
        None => MergeConfig::default(),
    };
    info!("Using merge settings: {:#?}", config);
    let merger = SpectraMerger::new(config)?;

    info!("Loading feature rows from {}", args.input.display());
    let rows = read_feature_rows(&args.input)?;
    info!("Loaded {} feature rows", rows.len());

    std::fs::create_dir_all(&args.output_path)?;
    let put_path = args.output_path.join("merged_spectra.json");

    let start = Instant::now();
    let file = File::create(&put_path)?;
    let mut out = MergedRowWriter::new(BufWriter::new(file), args.format);
    let summary = process_rows(&rows, &merger, &mut out, args.chunk_size, args.best_only)?;
    let rows_written = out.finish()?;

    info!("Merge summary:\n{}", summary);
    println!("Wrote {} rows to {}", rows_written, put_path.display());
    println!("Total merging and serialization took {:#?}", start.elapsed());
    Ok(())
}

/// Reads and validates the merge configuration.
pub fn read_merge_config(path: &Path) -> Result<MergeConfig, CliError> {
    let config: MergeConfig = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    config.validate()?;
    Ok(config)
}

/// Reads the feature rows to merge, a json array of rows.
///
/// Every row is validated, a single bad peak fails the whole file.
pub fn read_feature_rows(path: &Path) -> Result<Vec<FeatureRow>, CliError> {
    let content = std::fs::read_to_string(path)?;
    let rows: Vec<FeatureRow> = serde_json::from_str(&content).map_err(|e| {
        CliError::DataReading(format!(
            "Failed to read feature rows from {}: {}",
            path.display(),
            e
        ))
    })?;
    for row in &rows {
        row.validate().map_err(|e| {
            CliError::DataReading(format!(
                "Invalid feature row {} in {}: {}",
                row.id,
                path.display(),
                e
            ))
        })?;
    }
    Ok(rows)
}

const MERGE_CONFIG_TEMPLATE: &str = r#"{
  "merge_mode": "across_samples",
  "cosine_threshold": 0.7,
  "mass_accuracy": { "da": 0.001, "ppm": 10.0 },
  "mz_merge_mode": "weighted_average_cutoff_outliers",
  "intensity_merge_mode": "sum_intensities",
  "relative_signal_count": 0.2,
  "isolation_window_offset": 0.0,
  "isolation_window_width": 1.0,
  "score_threshold_rule": "anchor_score",
  "quality_model": "low_chimeric_intensity_relative_to_ms1_intensity"
}"#;

const FEATURE_ROW_TEMPLATE: &str = r#"[
  {
    "id": 0,
    "features": [
      {
        "raw_file": "sample_1.mzML",
        "mz": 500.1234,
        "ms1_scans": [
          { "scan_id": 10, "rt": 301.2, "peaks": [ { "mz": 500.1234, "intensity": 150000.0 }, { "mz": 501.1262, "intensity": 42000.0 } ] },
          { "scan_id": 14, "rt": 302.4, "peaks": [ { "mz": 500.1236, "intensity": 120000.0 }, { "mz": 500.6010, "intensity": 9000.0 } ] }
        ],
        "fragment_scans": [
          {
            "scan_id": 11, "raw_file": "sample_1.mzML", "rt": 301.5,
            "polarity": "positive", "precursor_mz": 500.1234, "precursor_charge": 1,
            "peaks": [ { "mz": 72.0444, "intensity": 40.0 }, { "mz": 86.0600, "intensity": 100.0 }, { "mz": 130.0863, "intensity": 55.0 }, { "mz": 241.1183, "intensity": 30.0 } ]
          },
          {
            "scan_id": 12, "raw_file": "sample_1.mzML", "rt": 301.8,
            "polarity": "positive", "precursor_mz": 500.1234, "precursor_charge": 1,
            "peaks": [ { "mz": 72.0446, "intensity": 45.0 }, { "mz": 86.0601, "intensity": 110.0 }, { "mz": 130.0861, "intensity": 50.0 }, { "mz": 241.1185, "intensity": 25.0 } ]
          }
        ]
      }
    ]
  }
]"#;

/// Main function for the 'write-template' subcommand.
pub fn main_write_template(args: WriteTemplateArgs) -> Result<(), CliError> {
    let target_dir = args.output_path;
    std::fs::create_dir_all(&target_dir)?;

    let config_path = target_dir.join("merge_config_template.json");
    std::fs::write(&config_path, MERGE_CONFIG_TEMPLATE)?;
    println!("Wrote merge config template to: {}", config_path.display());

    let rows_path = target_dir.join("feature_rows_template.json");
    std::fs::write(&rows_path, FEATURE_ROW_TEMPLATE)?;
    println!("Wrote feature row template to: {}", rows_path.display());
    Ok(())
}
