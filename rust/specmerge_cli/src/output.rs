use serde::Serialize;
use specmerge::{
    MergedSpectrum,
    PeakLike,
    Polarity,
};
use std::io::{
    self,
    Write,
};

use crate::cli::SerializationFormat;

/// A merged spectrum as written out, peaks as parallel arrays.
#[derive(Debug, Serialize)]
pub struct SpectrumOutput {
    precursor_mz: f64,
    polarity: Polarity,
    precursor_charge: i32,
    origins: Vec<String>,
    scan_ids: Vec<u32>,
    best_fragment_scan_score: f64,
    tic: f64,
    removed_scans_by_low_quality: usize,
    removed_scans_by_low_cosine: usize,
    removed_scans_by_mismatch: usize,
    mz: Vec<f64>,
    intensity: Vec<f64>,
    num_sources: Vec<usize>,
}

impl From<&MergedSpectrum> for SpectrumOutput {
    fn from(spec: &MergedSpectrum) -> Self {
        let peaks = spec.peaks();
        SpectrumOutput {
            precursor_mz: spec.precursor_mz,
            polarity: spec.polarity,
            precursor_charge: spec.precursor_charge,
            origins: spec.origins().iter().cloned().collect(),
            scan_ids: spec.scan_ids().to_vec(),
            best_fragment_scan_score: spec.best_fragment_scan_score,
            tic: spec.tic(),
            removed_scans_by_low_quality: spec.removed_scans_by_low_quality,
            removed_scans_by_low_cosine: spec.removed_scans_by_low_cosine,
            removed_scans_by_mismatch: spec.removed_scans_by_mismatch,
            mz: peaks.iter().map(|p| p.mz()).collect(),
            intensity: peaks.iter().map(|p| p.intensity()).collect(),
            num_sources: peaks.iter().map(|p| p.num_sources()).collect(),
        }
    }
}

/// All merged spectra of a single feature row.
#[derive(Debug, Serialize)]
pub struct RowOutput {
    row_id: u64,
    spectra: Vec<SpectrumOutput>,
}

impl RowOutput {
    pub fn new(row_id: u64, spectra: &[MergedSpectrum]) -> Self {
        Self {
            row_id,
            spectra: spectra.iter().map(SpectrumOutput::from).collect(),
        }
    }
}

/// Streams [RowOutput] records to `writer` one row at a time.
///
/// Json and pretty json produce a single array (closed by
/// [MergedRowWriter::finish]), ndjson one record per line.
pub struct MergedRowWriter<W: Write> {
    writer: W,
    format: SerializationFormat,
    rows_written: usize,
}

impl<W: Write> MergedRowWriter<W> {
    pub fn new(writer: W, format: SerializationFormat) -> Self {
        Self {
            writer,
            format,
            rows_written: 0,
        }
    }

    pub fn write_row(&mut self, row: &RowOutput) -> io::Result<()> {
        let separator: &[u8] = match (self.format, self.rows_written) {
            (SerializationFormat::Ndjson, _) => b"",
            (_, 0) => b"[",
            (SerializationFormat::PrettyJson, _) => b",\n",
            (SerializationFormat::Json, _) => b",",
        };
        self.writer.write_all(separator)?;

        match self.format {
            SerializationFormat::PrettyJson => serde_json::to_writer_pretty(&mut self.writer, row),
            SerializationFormat::Json | SerializationFormat::Ndjson => {
                serde_json::to_writer(&mut self.writer, row)
            }
        }
        .map_err(io::Error::other)?;

        if self.format == SerializationFormat::Ndjson {
            self.writer.write_all(b"\n")?;
        }
        self.rows_written += 1;
        Ok(())
    }

    /// Closes the array if needed and flushes, returns the number of rows written.
    pub fn finish(mut self) -> io::Result<usize> {
        let closing: &[u8] = match (self.format, self.rows_written) {
            (SerializationFormat::Ndjson, _) => b"",
            (_, 0) => b"[]",
            _ => b"]",
        };
        self.writer.write_all(closing)?;
        self.writer.flush()?;
        Ok(self.rows_written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specmerge::{
        FragmentScan,
        IntensityMergeMode,
        MzMergeMode,
        RawPeak,
    };

    fn spectrum() -> MergedSpectrum {
        let scan = FragmentScan {
            scan_id: 4,
            raw_file: "a.mzML".into(),
            rt: 1.0,
            polarity: Polarity::Positive,
            precursor_mz: 300.0,
            precursor_charge: 1,
            peaks: vec![RawPeak::new(100.0, 2.0), RawPeak::new(150.0, 3.0)],
        };
        MergedSpectrum::from_scan(
            &scan,
            MzMergeMode::default(),
            IntensityMergeMode::default(),
        )
    }

    fn written(format: SerializationFormat, rows: &[RowOutput]) -> (String, usize) {
        let mut buf = Vec::new();
        let mut writer = MergedRowWriter::new(&mut buf, format);
        for row in rows {
            writer.write_row(row).unwrap();
        }
        let n = writer.finish().unwrap();
        (String::from_utf8(buf).unwrap(), n)
    }

    #[test]
    fn test_json_formats_are_arrays() {
        for format in [SerializationFormat::Json, SerializationFormat::PrettyJson] {
            let rows = [RowOutput::new(1, &[spectrum()]), RowOutput::new(2, &[])];
            let (out, n) = written(format, &rows);
            assert_eq!(n, 2);
            let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
            assert_eq!(parsed[0]["row_id"], 1);
            assert_eq!(parsed[0]["spectra"][0]["mz"], serde_json::json!([100.0, 150.0]));
            assert_eq!(parsed[0]["spectra"][0]["tic"], 5.0);
            assert_eq!(parsed[1]["spectra"], serde_json::json!([]));

            let (empty, n) = written(format, &[]);
            assert_eq!(n, 0);
            assert_eq!(empty, "[]");
        }
    }

    #[test]
    fn test_ndjson_is_one_row_per_line() {
        let rows = [RowOutput::new(1, &[spectrum()]), RowOutput::new(2, &[])];
        let (out, n) = written(SerializationFormat::Ndjson, &rows);
        assert_eq!(n, 2);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["row_id"], 2);

        let (empty, _) = written(SerializationFormat::Ndjson, &[]);
        assert!(empty.is_empty());
    }
}
