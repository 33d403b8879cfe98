use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::prelude::*;

/// Output and formatting defaults shared by every figure of a run.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FigureConfig {
    pub disable_fig_save: bool,
    pub save_loc: PathBuf,
    pub save_prefix: String,
    /// Points.
    pub fontsize: f64,
    /// Inches, `(width, height)`.
    pub figsize: (f64, f64),
    pub dpi: u32,
    /// Run after saving the vector document; every `{path}` is replaced by
    /// its location.
    pub crop_command: Option<String>,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            disable_fig_save: false,
            save_loc: PathBuf::from("/tmp"),
            save_prefix: "undefined".to_string(),
            fontsize: 22.0,
            figsize: (6.0, 2.5),
            dpi: 400,
            crop_command: None,
        }
    }
}

impl FigureConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading figure config from {}", path.display());
        let content = fs::read_to_string(path)?;
        let config: FigureConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_dir(&self) -> PathBuf {
        self.save_loc.join(&self.save_prefix)
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        let dpi = self.dpi as f64;
        (
            (self.figsize.0 * dpi).round().max(1.0) as u32,
            (self.figsize.1 * dpi).round().max(1.0) as u32,
        )
    }

    pub fn font_px(&self) -> f64 {
        self.fontsize * self.dpi as f64 / 72.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_file() {
        let yaml_content = r#"
save_loc: /data/figures
save_prefix: msync
figsize: [4, 2]
dpi: 100
crop_command: "pdfcrop {path} {path}"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml_content.as_bytes()).unwrap();

        let config = FigureConfig::from_file(temp_file.path()).unwrap();
        assert!(!config.disable_fig_save);
        assert_eq!(config.save_dir(), PathBuf::from("/data/figures/msync"));
        assert_eq!(config.fontsize, 22.0);
        assert_eq!(config.pixel_size(), (400, 200));
        assert_eq!(config.crop_command.as_deref(), Some("pdfcrop {path} {path}"));
    }

    #[test]
    fn defaults() {
        let config = FigureConfig::default();
        assert_eq!(config.save_dir(), PathBuf::from("/tmp/undefined"));
        assert_eq!(config.pixel_size(), (2400, 1000));
        assert!((config.font_px() - 22.0 * 400.0 / 72.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_unknown_shapes() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"figsize: wide\n").unwrap();
        assert!(matches!(
            FigureConfig::from_file(temp_file.path()),
            Err(Error::YamlError(_))
        ));
    }
}
