use crate::detector::PlateParams;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Clone, Debug, Deserialize)]
pub struct PlateToolConfig {
    pub input: PathBuf,
    #[serde(default)]
    pub params: PlateParams,
    pub output: PlateOutputConfig,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PlateOutputConfig {
    /// Refined plate image.
    pub plate_image: Option<PathBuf>,
    /// Fragments are written as `<dir>/<n>.png`, numbered from 1.
    pub fragments_dir: Option<PathBuf>,
    pub report_json: Option<PathBuf>,
}
