//! Configuration validation.

use super::Config;
use crate::error::{Result, ScaffoldError};

/// Validate the configuration.
///
/// The provider name is not checked here; backend selection reports
/// unknown providers as [`ScaffoldError::UnsupportedProvider`].
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    if config.source.provider.trim().is_empty() {
        return Err(ScaffoldError::Config("source.provider is required".into()));
    }
    if config.source.connection_string.is_none() {
        if config.source.host.is_empty() {
            return Err(ScaffoldError::Config(
                "source.host is required when no connection_string is set".into(),
            ));
        }
        if config.source.database.is_empty() {
            return Err(ScaffoldError::Config("source.database is required".into()));
        }
        if config.source.user.is_empty() {
            return Err(ScaffoldError::Config("source.user is required".into()));
        }
    } else if config
        .source
        .connection_string
        .as_deref()
        .is_some_and(|s| s.trim().is_empty())
    {
        return Err(ScaffoldError::Config(
            "source.connection_string cannot be empty".into(),
        ));
    }

    // Scaffold validation
    let scaffold = &config.scaffold;
    if scaffold.output_dir.trim().is_empty() {
        return Err(ScaffoldError::Config("scaffold.output_dir is required".into()));
    }
    if scaffold.namespace.trim().is_empty() {
        return Err(ScaffoldError::Config("scaffold.namespace is required".into()));
    }
    if scaffold.chunk_size == 0 {
        return Err(ScaffoldError::Config(
            "scaffold.chunk_size must be at least 1".into(),
        ));
    }
    if scaffold.separate_seed_files && scaffold.seed_folder.trim().is_empty() {
        return Err(ScaffoldError::Config(
            "scaffold.seed_folder is required with separate_seed_files".into(),
        ));
    }
    if scaffold.tables.iter().any(|t| t.trim().is_empty()) {
        return Err(ScaffoldError::Config(
            "scaffold.tables cannot contain empty names".into(),
        ));
    }

    Ok(())
}
