use std::fmt::{self, Display};
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use crate::consts::{NEW_PVALUE_COLUMN, NEW_SCORE_COLUMN};
use crate::errors::RefineError;
use crate::utils::get_dynamic_reader;

///
/// One candidate peak. Coordinates are 0-based half-open (BED).
///
/// `rest` carries every annotation column after `end` verbatim. The two
/// refinement outputs are kept apart from it so that a second run overwrites
/// them instead of stacking new columns behind old ones.
///
#[derive(PartialEq, Debug, Clone)]
pub struct Peak {
    pub chr: String,
    pub start: u32,
    pub end: u32,

    pub rest: Option<String>,

    pub new_score: Option<f64>,
    pub new_pvalue: Option<f64>,
}

impl Peak {
    pub fn new(chr: &str, start: u32, end: u32) -> Self {
        Peak {
            chr: chr.to_string(),
            start,
            end,
            rest: None,
            new_score: None,
            new_pvalue: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.end - self.start
    }

    ///
    /// Get the BED line for this peak, refinement columns included when set.
    ///
    pub fn as_string(&self) -> String {
        let mut line = format!("{}\t{}\t{}", self.chr, self.start, self.end);
        if let Some(rest) = self.rest.as_deref() {
            line.push('\t');
            line.push_str(rest);
        }
        if let (Some(score), Some(pvalue)) = (self.new_score, self.new_pvalue) {
            line.push_str(&format!("\t{:.3}\t{}", score, pvalue));
        }
        line
    }
}

impl Display for Peak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

///
/// An ordered peak set. Input order is never changed.
///
#[derive(Clone, Debug, Default)]
pub struct PeakSet {
    pub peaks: Vec<Peak>,
    /// `track`, `browser` and `#` lines, plus a column name row if one was present.
    pub header: Vec<String>,
}

impl From<Vec<Peak>> for PeakSet {
    fn from(peaks: Vec<Peak>) -> Self {
        PeakSet {
            peaks,
            header: Vec::new(),
        }
    }
}

impl TryFrom<&Path> for PeakSet {
    type Error = RefineError;

    ///
    /// Read a peak set from a (optionally gzipped) BED-like file.
    ///
    /// If a column name row lists `newScore`/`newPValue` (the output of an
    /// earlier refinement), those columns are dropped on the way in.
    fn try_from(value: &Path) -> Result<Self, RefineError> {
        let reader = get_dynamic_reader(value)?;

        let mut header: Vec<String> = Vec::new();
        let mut stale_columns: Vec<usize> = Vec::new();
        let mut peaks: Vec<Peak> = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let parts: Vec<&str> = line.split('\t').collect();

            let is_comment = line.starts_with("browser")
                || line.starts_with("track")
                || line.starts_with('#');
            // column names without a leading `#`
            let is_column_row =
                peaks.is_empty() && parts.len() >= 3 && parts[1].parse::<u32>().is_err();

            if is_comment || is_column_row {
                if is_column_row || line.starts_with('#') {
                    let names: Vec<&str> = line.trim_start_matches('#').split('\t').collect();
                    stale_columns = names
                        .iter()
                        .enumerate()
                        .filter(|(_, n)| **n == NEW_SCORE_COLUMN || **n == NEW_PVALUE_COLUMN)
                        .map(|(i, _)| i)
                        .collect();
                    if !stale_columns.is_empty() {
                        let kept: Vec<&str> = names
                            .iter()
                            .enumerate()
                            .filter(|(i, _)| !stale_columns.contains(i))
                            .map(|(_, n)| *n)
                            .collect();
                        let prefix = if line.starts_with('#') { "#" } else { "" };
                        header.push(format!("{}{}", prefix, kept.join("\t")));
                        continue;
                    }
                }
                header.push(line);
                continue;
            }

            if parts.len() < 3 {
                return Err(RefineError::Parse {
                    what: "peak file",
                    line: line_num + 1,
                    message: format!("expected at least 3 columns, found {}", parts.len()),
                });
            }

            let start: u32 = parts[1].parse().map_err(|_| RefineError::Parse {
                what: "peak file",
                line: line_num + 1,
                message: format!("invalid start position: {}", parts[1]),
            })?;
            let end: u32 = parts[2].parse().map_err(|_| RefineError::Parse {
                what: "peak file",
                line: line_num + 1,
                message: format!("invalid end position: {}", parts[2]),
            })?;
            if end < start {
                return Err(RefineError::Parse {
                    what: "peak file",
                    line: line_num + 1,
                    message: format!("end {} is before start {}", end, start),
                });
            }

            let rest: Vec<&str> = parts
                .iter()
                .enumerate()
                .skip(3)
                .filter(|(i, _)| !stale_columns.contains(i))
                .map(|(_, p)| *p)
                .collect();

            peaks.push(Peak {
                chr: parts[0].to_string(),
                start,
                end,
                rest: Some(rest.join("\t")).filter(|s| !s.is_empty()),
                new_score: None,
                new_pvalue: None,
            });
        }

        Ok(PeakSet { peaks, header })
    }
}

impl TryFrom<&str> for PeakSet {
    type Error = RefineError;

    fn try_from(value: &str) -> Result<Self, RefineError> {
        PeakSet::try_from(Path::new(value))
    }
}

impl PeakSet {
    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Peak> {
        self.peaks.iter()
    }

    ///
    /// Column name row for the refined output: the input's own row (if any)
    /// with the two refinement columns appended.
    ///
    fn output_column_row(&self) -> String {
        let column_row = self
            .header
            .iter()
            .rev()
            .find(|l| l.starts_with('#') && l.contains('\t'));

        let base = match column_row {
            Some(row) => row.trim_start_matches('#').to_string(),
            None => {
                let n_rest = self
                    .peaks
                    .first()
                    .and_then(|p| p.rest.as_deref())
                    .map_or(0, |r| r.split('\t').count());
                let mut names = vec!["chr".to_string(), "start".to_string(), "end".to_string()];
                names.extend((0..n_rest).map(|i| format!("col{}", i + 4)));
                names.join("\t")
            }
        };

        format!("#{}\t{}\t{}", base, NEW_SCORE_COLUMN, NEW_PVALUE_COLUMN)
    }

    ///
    /// Write the peak set as BED text. Refined sets get a column name row
    /// naming `newScore` and `newPValue`.
    ///
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), RefineError> {
        let refined = self
            .peaks
            .iter()
            .any(|p| p.new_score.is_some() && p.new_pvalue.is_some());

        let column_row = if refined {
            Some(self.output_column_row())
        } else {
            None
        };

        for line in &self.header {
            let is_column_row = line.starts_with('#') && line.contains('\t');
            if column_row.is_some() && is_column_row {
                continue;
            }
            writeln!(writer, "{}", line)?;
        }
        if let Some(row) = column_row {
            writeln!(writer, "{}", row)?;
        }

        for peak in &self.peaks {
            writeln!(writer, "{}", peak.as_string())?;
        }

        Ok(())
    }

    pub fn to_bed<T: AsRef<Path>>(&self, path: T) -> Result<(), RefineError> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        self.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
