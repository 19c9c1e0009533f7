//! Strand-specific 5'-end coverage and its sliding window sums.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use crate::errors::RefineError;
use crate::utils::get_dynamic_reader;
use crate::windows::Window;

/// `count` reads on every base of `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub start: u32,
    pub end: u32,
    pub count: u32,
}

///
/// Run-length encoded per-base counts for one strand, keyed by chromosome.
/// Runs are sorted and never overlap; bases outside every run count zero.
///
#[derive(Debug, Clone, Default)]
pub struct CoverageTrack {
    runs: HashMap<String, Vec<Run>>,
}

impl TryFrom<HashMap<String, Vec<Run>>> for CoverageTrack {
    type Error = RefineError;

    fn try_from(mut runs: HashMap<String, Vec<Run>>) -> Result<Self, RefineError> {
        for (chr, chr_runs) in runs.iter_mut() {
            chr_runs.retain(|r| r.count > 0 && r.end > r.start);
            chr_runs.sort_by_key(|r| r.start);
            for pair in chr_runs.windows(2) {
                if pair[1].start < pair[0].end {
                    return Err(RefineError::Coverage(format!(
                        "Overlapping runs on {}: [{}, {}) and [{}, {})",
                        chr, pair[0].start, pair[0].end, pair[1].start, pair[1].end
                    )));
                }
            }
        }
        Ok(CoverageTrack { runs })
    }
}

impl TryFrom<&Path> for CoverageTrack {
    type Error = RefineError;

    ///
    /// Read a (optionally gzipped) bedGraph file: `chr start end count`.
    /// `track`/`browser`/`#` lines are skipped.
    ///
    fn try_from(value: &Path) -> Result<Self, RefineError> {
        let reader = get_dynamic_reader(value)?;
        let mut runs: HashMap<String, Vec<Run>> = HashMap::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty()
                || line.starts_with("track")
                || line.starts_with("browser")
                || line.starts_with('#')
            {
                continue;
            }

            let parse_err = |message: String| RefineError::Parse {
                what: "bedGraph",
                line: line_num + 1,
                message,
            };

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return Err(parse_err(format!(
                    "expected 4 columns, found {}",
                    fields.len()
                )));
            }
            let start: u32 = fields[1]
                .parse()
                .map_err(|_| parse_err(format!("invalid start: {}", fields[1])))?;
            let end: u32 = fields[2]
                .parse()
                .map_err(|_| parse_err(format!("invalid end: {}", fields[2])))?;
            // counts are integers, but tools often write them as `3.0`
            let count: f64 = fields[3]
                .parse()
                .map_err(|_| parse_err(format!("invalid count: {}", fields[3])))?;
            if count < 0.0 || count.fract() != 0.0 {
                return Err(parse_err(format!(
                    "count must be a non-negative integer: {}",
                    fields[3]
                )));
            }

            runs.entry(fields[0].to_string()).or_default().push(Run {
                start,
                end,
                count: count as u32,
            });
        }

        CoverageTrack::try_from(runs)
    }
}

impl CoverageTrack {
    pub fn chroms(&self) -> impl Iterator<Item = &String> {
        self.runs.keys()
    }

    /// Per-base counts over `window`. Bases before 0 and unknown chromosomes are zero.
    pub fn values(&self, chr: &str, window: &Window) -> Vec<u32> {
        let mut out = vec![0u32; window.width()];
        let Some(runs) = self.runs.get(chr) else {
            return out;
        };

        let first = runs.partition_point(|r| (r.end as i64) <= window.start);
        for run in &runs[first..] {
            if run.start as i64 >= window.end {
                break;
            }
            let from = (run.start as i64).max(window.start);
            let to = (run.end as i64).min(window.end);
            for pos in from..to {
                out[(pos - window.start) as usize] = run.count;
            }
        }

        out
    }
}

///
/// Sum of `values[i..i + width]` for every `i`, with the window clipped at
/// the end of the slice. One output per input value.
///
pub fn running_sums(values: &[u32], width: usize) -> Vec<u64> {
    let mut prefix: Vec<u64> = Vec::with_capacity(values.len() + 1);
    prefix.push(0);
    for v in values {
        let last = *prefix.last().unwrap_or(&0);
        prefix.push(last + *v as u64);
    }

    let n = values.len();
    (0..n).map(|i| prefix[(i + width).min(n)] - prefix[i]).collect()
}
