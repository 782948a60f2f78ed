use crate::verify::VerifyParams;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Clone, Debug, Deserialize)]
pub struct VerifyToolConfig {
    pub scene: PathBuf,
    pub templates: Vec<PathBuf>,
    #[serde(default)]
    pub params: VerifyParams,
    pub output_json: Option<PathBuf>,
}
