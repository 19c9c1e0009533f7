//! Run configuration for peak refinement.
//!
//! [`RefineConfig`] is what users write (in a TOML/YAML file or through CLI flags);
//! [`RefineParams`] is the validated form with every derived window constant filled in.

use std::fmt::{self, Display};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_PERMUTE;
use crate::errors::RefineError;

/// Shape of the kernel used to smooth the GC indicator track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GcType {
    #[default]
    Ladder,
    Tricube,
}

impl FromStr for GcType {
    type Err = RefineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ladder" => Ok(GcType::Ladder),
            "tricube" => Ok(GcType::Tricube),
            _ => Err(RefineError::UnknownGcType(s.to_string())),
        }
    }
}

impl Display for GcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GcType::Ladder => write!(f, "ladder"),
            GcType::Tricube => write!(f, "tricube"),
        }
    }
}

///
/// User facing configuration. Either `flank` or `peak_half_width` must be set
/// alongside `bind_width`; the other one is derived.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineConfig {
    pub bind_width: Option<u32>,
    pub peak_half_width: Option<u32>,
    pub flank: Option<u32>,
    pub permute: u32,
    pub gc_type: GcType,
    pub seed: Option<u64>,
    pub threads: Option<usize>,
    /// Draw a progress bar over the permutation rounds.
    pub progress: bool,
}

impl Default for RefineConfig {
    fn default() -> Self {
        RefineConfig {
            bind_width: None,
            peak_half_width: None,
            flank: None,
            permute: DEFAULT_PERMUTE,
            gc_type: GcType::Ladder,
            seed: None,
            threads: None,
            progress: false,
        }
    }
}

impl RefineConfig {
    ///
    /// Read a configuration file. The format is picked from the extension:
    /// `.toml`, or `.yaml`/`.yml`.
    ///
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RefineError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&raw)
                .map_err(|e| RefineError::InvalidConfig(format!("{}: {}", path.display(), e))),
            Some("yaml") | Some("yml") => serde_yaml::from_str(&raw)
                .map_err(|e| RefineError::InvalidConfig(format!("{}: {}", path.display(), e))),
            _ => Err(RefineError::InvalidConfig(format!(
                "Unsupported config file type: {}",
                path.display()
            ))),
        }
    }

    /// Validate the configuration and derive the window constants.
    pub fn resolve(&self) -> Result<RefineParams, RefineError> {
        let bind_width = match self.bind_width {
            Some(b) if b > 0 => b,
            Some(_) => {
                return Err(RefineError::InvalidConfig(
                    "bind_width must be at least 1".to_string(),
                ));
            }
            None => {
                return Err(RefineError::InvalidConfig(
                    "bind_width is required".to_string(),
                ));
            }
        };
        let half_bind = bind_width / 2;

        // an explicit flank takes precedence over the estimated half width
        let (flank, pdwh) = match (self.flank, self.peak_half_width) {
            (Some(flank), _) => (flank, flank + bind_width - half_bind),
            (None, Some(pdwh)) => {
                let flank = pdwh as i64 - bind_width as i64 + half_bind as i64;
                if flank < 0 {
                    return Err(RefineError::InvalidConfig(format!(
                        "peak_half_width {} is too small for bind_width {} (derived flank {})",
                        pdwh, bind_width, flank
                    )));
                }
                (flank as u32, pdwh)
            }
            (None, None) => {
                return Err(RefineError::InvalidConfig(
                    "one of flank or peak_half_width is required".to_string(),
                ));
            }
        };

        if self.permute == 0 {
            return Err(RefineError::InvalidConfig(
                "permute must be at least 1".to_string(),
            ));
        }

        if self.gc_type == GcType::Tricube && pdwh >= 3 * bind_width {
            warn!(
                "tricube kernel is not suited to peak_half_width ({}) >= 3 * bind_width ({})",
                pdwh, bind_width
            );
        }

        let params = RefineParams {
            bind_width,
            half_bind,
            flank,
            pdwh,
            gc_type: self.gc_type,
            permute: self.permute,
            seed: self.seed,
            progress: self.progress,
        };
        debug!("Resolved refine parameters: {:?}", params);

        Ok(params)
    }
}

///
/// Validated parameters. `B`, `H`, `F` and `P` in the window arithmetic are
/// `bind_width`, `half_bind`, `flank` and `pdwh` here.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefineParams {
    pub bind_width: u32,
    pub half_bind: u32,
    pub flank: u32,
    pub pdwh: u32,
    pub gc_type: GcType,
    pub permute: u32,
    pub seed: Option<u64>,
    pub progress: bool,
}

impl RefineParams {
    /// Distance between the region window and the core window on each side: `2H + F`.
    pub fn region_pad(&self) -> u32 {
        2 * self.half_bind + self.flank
    }

    /// Offset between consecutive scoring blocks: `H + F`.
    pub fn block_shift(&self) -> u32 {
        self.half_bind + self.flank
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Write;

    fn config(bind_width: u32, pdwh: Option<u32>, flank: Option<u32>) -> RefineConfig {
        RefineConfig {
            bind_width: Some(bind_width),
            peak_half_width: pdwh,
            flank,
            ..Default::default()
        }
    }

    #[rstest]
    #[case(20, 40, 30)]
    #[case(21, 40, 29)]
    #[case(1, 1, 0)]
    #[case(150, 200, 125)]
    fn test_flank_derived_from_half_width(
        #[case] bind_width: u32,
        #[case] pdwh: u32,
        #[case] flank: u32,
    ) {
        let params = config(bind_width, Some(pdwh), None).resolve().unwrap();
        assert_eq!(params.flank, flank);
        assert_eq!(params.pdwh, pdwh);
        assert_eq!(params.half_bind, bind_width / 2);
    }

    #[rstest]
    fn test_half_width_derived_from_flank() {
        let params = config(20, None, Some(30)).resolve().unwrap();
        assert_eq!(params.pdwh, 40);

        // flank overrides an inconsistent half width
        let params = config(20, Some(999), Some(30)).resolve().unwrap();
        assert_eq!(params.pdwh, 40);
        assert_eq!(params.flank, 30);
    }

    #[rstest]
    fn test_resolve_rejects_bad_config() {
        assert!(config(0, Some(10), None).resolve().is_err());
        assert!(config(20, Some(5), None).resolve().is_err());
        assert!(config(20, None, None).resolve().is_err());
        assert!(RefineConfig::default().resolve().is_err());

        let mut no_permute = config(20, Some(40), None);
        no_permute.permute = 0;
        assert!(matches!(
            no_permute.resolve(),
            Err(RefineError::InvalidConfig(_))
        ));
    }

    #[rstest]
    fn test_gc_type_from_str() {
        assert_eq!("ladder".parse::<GcType>().unwrap(), GcType::Ladder);
        assert_eq!("TriCube".parse::<GcType>().unwrap(), GcType::Tricube);
        assert!(matches!(
            "gaussian".parse::<GcType>(),
            Err(RefineError::UnknownGcType(_))
        ));
    }

    #[rstest]
    fn test_config_from_toml_and_yaml() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("refine.toml");
        let mut f = std::fs::File::create(&toml_path).unwrap();
        writeln!(f, "bind_width = 20\npeak_half_width = 40\ngc_type = \"tricube\"\nseed = 7").unwrap();
        let cfg = RefineConfig::from_path(&toml_path).unwrap();
        assert_eq!(cfg.bind_width, Some(20));
        assert_eq!(cfg.gc_type, GcType::Tricube);
        assert_eq!(cfg.permute, DEFAULT_PERMUTE);
        assert_eq!(cfg.seed, Some(7));

        let yaml_path = dir.path().join("refine.yaml");
        let mut f = std::fs::File::create(&yaml_path).unwrap();
        writeln!(f, "bind_width: 20\nflank: 30\npermute: 2").unwrap();
        let cfg = RefineConfig::from_path(&yaml_path).unwrap();
        assert_eq!(cfg.flank, Some(30));
        assert_eq!(cfg.permute, 2);

        let other = dir.path().join("refine.ini");
        std::fs::write(&other, "bind_width=20").unwrap();
        assert!(RefineConfig::from_path(&other).is_err());
    }
}
