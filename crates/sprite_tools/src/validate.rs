//! Config validation.

use std::path::Path;

use ron::ser::PrettyConfig;
use sprite_core::config::PoolConfig;

use crate::{read_file, Result, ToolError};

/// Parse and validate a RON pool config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not UTF-8 RON, or holds
/// out-of-range values.
pub fn validate_config_file(path: &Path) -> Result<PoolConfig> {
    let bytes = read_file(path)?;
    let text = String::from_utf8(bytes).map_err(|e| ToolError::Io {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })?;
    Ok(PoolConfig::from_ron_str(&text)?)
}

/// Render a config with every default filled in.
pub fn to_canonical_ron(config: &PoolConfig) -> Result<String> {
    Ok(ron::ser::to_string_pretty(config, PrettyConfig::default())?)
}
