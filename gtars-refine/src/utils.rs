use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::consts::SCORE_SCALE;
use crate::errors::RefineError;

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>, RefineError> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path).map_err(|e| {
        RefineError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to open file {}: {}", path.display(), e),
        ))
    })?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

/// Round to three decimals, the precision every score and GC fraction is kept at.
pub fn round3(value: f64) -> f64 {
    (value * SCORE_SCALE).round() / SCORE_SCALE
}

/// Integer thousandths of a value, used as an exact histogram key.
pub fn to_millis(value: f64) -> i64 {
    (value * SCORE_SCALE).round() as i64
}

pub fn from_millis(key: i64) -> f64 {
    key as f64 / SCORE_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::{BufRead, Write};

    #[rstest]
    #[case(0.12345, 0.123)]
    #[case(0.1236, 0.124)]
    #[case(-2.0004, -2.0)]
    #[case(7.0, 7.0)]
    fn test_round3(#[case] value: f64, #[case] expected: f64) {
        assert_eq!(round3(value), expected);
    }

    #[rstest]
    fn test_millis_keys() {
        assert_eq!(to_millis(1.2345), 1235);
        assert_eq!(to_millis(-0.0004), 0);
        assert_eq!(from_millis(to_millis(3.141)), 3.141);
    }

    #[rstest]
    fn test_dynamic_reader_reads_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.txt.gz");
        let file = File::create(&path).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        writeln!(encoder, "chr1\t1\t2").unwrap();
        encoder.finish().unwrap();

        let reader = get_dynamic_reader(&path).unwrap();
        let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["chr1\t1\t2".to_string()]);

        assert!(get_dynamic_reader(&dir.path().join("missing.txt")).is_err());
    }
}
