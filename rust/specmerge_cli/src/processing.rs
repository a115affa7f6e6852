use indicatif::{
    ProgressIterator,
    ProgressStyle,
};
use specmerge::{
    FeatureRow,
    MergeSummary,
    MergedSpectrum,
    QualityScorer,
    SpectraMerger,
};
use std::io::Write;
use tracing::debug;

use crate::error::CliError;
use crate::output::{
    MergedRowWriter,
    RowOutput,
};

/// Merges the rows chunk by chunk (each chunk in parallel) and streams
/// the results out as they come.
pub fn process_rows<S: QualityScorer + Sync>(
    rows: &[FeatureRow],
    merger: &SpectraMerger<S>,
    out: &mut MergedRowWriter<impl Write>,
    chunk_size: usize,
    best_only: bool,
) -> Result<MergeSummary, CliError> {
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
    )
    .map_err(|e| CliError::Progress(e.to_string()))?;

    let mut summary = MergeSummary::new();
    for chunk in rows.chunks(chunk_size.max(1)).progress_with_style(style) {
        let mut chunk_summary = MergeSummary::new();
        for (row, spectra) in chunk.iter().zip(merger.par_merge_rows(chunk)) {
            let spectra = if best_only {
                best_of(spectra)
            } else {
                spectra
            };
            chunk_summary = chunk_summary.fold_row(&spectra);
            out.write_row(&RowOutput::new(row.id, &spectra))?;
        }
        debug!(
            "Chunk of {} rows gave {} spectra",
            chunk_summary.rows_processed, chunk_summary.spectra
        );
        summary = summary.combine(&chunk_summary);
    }
    Ok(summary)
}

fn best_of(spectra: Vec<MergedSpectrum>) -> Vec<MergedSpectrum> {
    spectra
        .into_iter()
        .max_by(|a, b| a.best_fragment_scan_score.total_cmp(&b.best_fragment_scan_score))
        .into_iter()
        .collect()
}
