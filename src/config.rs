//! Service configuration
//!
//! The boundary layer deserializes this from its own config source and
//! hands it to [`crate::api::MidiToolService::new`].

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Directory that receives all generated output files. Created on
    /// service construction if missing; relative paths are resolved
    /// against the process working directory.
    pub output_dir: PathBuf,
    /// Temporary files older than this are swept at service construction.
    pub stale_temp_max_age_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            stale_temp_max_age_secs: 3600,
        }
    }
}
