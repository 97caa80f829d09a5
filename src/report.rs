use std::fmt;
use std::io::{self, Write};
use std::time::Duration;

use serde::Serialize;

use crate::cache::CellKey;
use crate::config::{CodecKind, Direction};
use crate::error::{Result, VerificationFailure};
use crate::verify::VerificationResult;

/// Result of executing one (codec, level, direction) cell.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CellOutcome {
    pub codec: CodecKind,
    pub level: u32,
    pub direction: Direction,
    #[serde(flatten)]
    pub status: CellStatus,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CellStatus {
    Ok {
        output_len: usize,
        elapsed_ns: u64,
        /// MiB of uncompressed data moved per second.
        throughput_mib_s: f64,
    },
    Failed {
        cause: String,
    },
}

impl CellOutcome {
    pub fn ok(key: CellKey, direction: Direction, output_len: usize, processed: usize, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        let throughput_mib_s = if secs > 0.0 {
            processed as f64 / (1024.0 * 1024.0) / secs
        } else {
            0.0
        };
        Self {
            codec: key.codec,
            level: key.level,
            direction,
            status: CellStatus::Ok {
                output_len,
                elapsed_ns: u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
                throughput_mib_s,
            },
        }
    }

    pub fn failed(key: CellKey, direction: Direction, cause: impl fmt::Display) -> Self {
        Self {
            codec: key.codec,
            level: key.level,
            direction,
            status: CellStatus::Failed {
                cause: cause.to_string(),
            },
        }
    }

    pub fn key(&self) -> CellKey {
        CellKey::new(self.codec, self.level)
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.status, CellStatus::Ok { .. })
    }

    pub fn output_len(&self) -> Option<usize> {
        match self.status {
            CellStatus::Ok { output_len, .. } => Some(output_len),
            CellStatus::Failed { .. } => None,
        }
    }
}

/// Round-trip check for one (codec, level).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerificationOutcome {
    pub codec: CodecKind,
    pub level: u32,
    #[serde(flatten)]
    pub status: VerificationStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum VerificationStatus {
    Passed { result: VerificationResult },
    Mismatch {
        result: VerificationResult,
        failure: VerificationFailure,
    },
    /// The backend failed before there was anything to compare.
    Error { cause: String },
}

impl VerificationOutcome {
    pub fn key(&self) -> CellKey {
        CellKey::new(self.codec, self.level)
    }

    pub fn passed(&self) -> bool {
        matches!(self.status, VerificationStatus::Passed { .. })
    }

    pub fn result(&self) -> Option<&VerificationResult> {
        match &self.status {
            VerificationStatus::Passed { result } | VerificationStatus::Mismatch { result, .. } => Some(result),
            VerificationStatus::Error { .. } => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub cells_ok: usize,
    pub cells_failed: usize,
    pub verifications_passed: usize,
    pub verifications_failed: usize,
    pub oversized: usize,
}

/// Everything one session produced, sorted by (codec, level, direction).
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MatrixReport {
    pub corpus_len: usize,
    pub cells: Vec<CellOutcome>,
    pub verifications: Vec<VerificationOutcome>,
    /// Cells whose compressed output exceeded the input by more than the allowance.
    pub oversized: Vec<CellKey>,
}

impl MatrixReport {
    pub(crate) fn new(
        corpus_len: usize,
        mut cells: Vec<CellOutcome>,
        mut verifications: Vec<VerificationOutcome>,
        mut oversized: Vec<CellKey>,
    ) -> Self {
        cells.sort_by_key(|c| (c.codec, c.level, c.direction));
        verifications.sort_by_key(|v| (v.codec, v.level));
        oversized.sort();
        oversized.dedup();
        Self {
            corpus_len,
            cells,
            verifications,
            oversized,
        }
    }

    pub fn summary(&self) -> Summary {
        let cells_ok = self.cells.iter().filter(|c| c.is_ok()).count();
        let verifications_passed = self.verifications.iter().filter(|v| v.passed()).count();
        Summary {
            cells_ok,
            cells_failed: self.cells.len() - cells_ok,
            verifications_passed,
            verifications_failed: self.verifications.len() - verifications_passed,
            oversized: self.oversized.len(),
        }
    }

    /// No failed cell and no failed verification. Oversize flags do not count.
    pub fn is_clean(&self) -> bool {
        let s = self.summary();
        s.cells_failed == 0 && s.verifications_failed == 0
    }

    pub fn cell(&self, key: CellKey, direction: Direction) -> Option<&CellOutcome> {
        self.cells
            .iter()
            .find(|c| c.key() == key && c.direction == direction)
    }

    pub fn failed_cells(&self) -> impl Iterator<Item = &CellOutcome> {
        self.cells.iter().filter(|c| !c.is_ok())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the report to `out`, as pretty JSON or as the text table.
    pub fn write_to<W: Write>(&self, mut out: W, json: bool) -> Result<()> {
        if json {
            serde_json::to_writer_pretty(&mut out, self).map_err(io::Error::from)?;
            writeln!(out)?;
        } else {
            writeln!(out, "{self}")?;
        }
        out.flush()?;
        Ok(())
    }
}

impl fmt::Display for MatrixReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:=<72}", "")?;
        writeln!(f, "  CODEC MATRIX ({} byte corpus)", self.corpus_len)?;
        writeln!(f, "{:=<72}", "")?;
        writeln!(
            f,
            "  {:<11} {:>5} {:<10} {:>12} {:>12} {:>12}",
            "Codec", "Level", "Direction", "Output", "Time", "MiB/s"
        )?;
        writeln!(f, "  {:-<11} {:->5} {:-<10} {:->12} {:->12} {:->12}", "", "", "", "", "", "")?;
        for cell in &self.cells {
            match &cell.status {
                CellStatus::Ok {
                    output_len,
                    elapsed_ns,
                    throughput_mib_s,
                } => writeln!(
                    f,
                    "  {:<11} {:>5} {:<10} {:>12} {:>12.1?} {:>12.1}",
                    cell.codec.name(),
                    cell.level,
                    cell.direction.to_string(),
                    output_len,
                    Duration::from_nanos(*elapsed_ns),
                    throughput_mib_s
                )?,
                CellStatus::Failed { cause } => writeln!(
                    f,
                    "  {:<11} {:>5} {:<10} FAILED: {cause}",
                    cell.codec.name(),
                    cell.level,
                    cell.direction.to_string()
                )?,
            }
        }

        if !self.verifications.is_empty() {
            writeln!(f)?;
            writeln!(f, "  {:<11} {:>5} {:>10} {:>8} {:>8} {:>8}", "Codec", "Level", "Size", "Length", "Bytes", "Text")?;
            writeln!(f, "  {:-<11} {:->5} {:->10} {:->8} {:->8} {:->8}", "", "", "", "", "", "")?;
            for v in &self.verifications {
                match (&v.status, v.result()) {
                    (VerificationStatus::Error { cause }, _) => {
                        writeln!(f, "  {:<11} {:>5} ERROR: {cause}", v.codec.name(), v.level)?
                    }
                    (_, Some(r)) => writeln!(
                        f,
                        "  {:<11} {:>5} {:>10} {:>8} {:>8} {:>8}",
                        v.codec.name(),
                        v.level,
                        r.compressed_len,
                        r.length_match,
                        r.bytes_match,
                        r.text_match
                    )?,
                    (_, None) => {}
                }
            }
        }

        for key in &self.oversized {
            writeln!(f, "  warning: {key} produced output larger than its input")?;
        }

        let s = self.summary();
        writeln!(f, "{:=<72}", "")?;
        writeln!(
            f,
            "  cells: {} ok, {} failed   verifications: {} passed, {} failed",
            s.cells_ok, s.cells_failed, s.verifications_passed, s.verifications_failed
        )?;
        write!(f, "{:=<72}", "")
    }
}
