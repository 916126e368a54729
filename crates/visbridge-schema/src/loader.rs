//! Reading `<kind>.schema.json` files from a directory.

use std::path::Path;

use tracing::debug;
use visbridge_message::Kind;

use crate::config::RegistryConfig;
use crate::error::{Result, SchemaError};
use crate::registry::SCHEMA_FILE_SUFFIX;

/// One schema file read from disk.
pub(crate) struct SchemaFile {
    pub kind: Kind,
    pub source: String,
}

/// Collect every schema file in `dir`.
///
/// Files that do not end in `.schema.json` are skipped. A file that does but
/// names no known kind, or is larger than the configured limit, fails the
/// whole load.
pub(crate) fn read_schema_dir(dir: &Path, config: &RegistryConfig) -> Result<Vec<SchemaFile>> {
    let load_failed = |what: &dyn std::fmt::Display, err: &dyn std::fmt::Display| {
        SchemaError::LoadFailed(format!("{what}: {err}"))
    };
    let entries = std::fs::read_dir(dir).map_err(|err| load_failed(&dir.display(), &err))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| load_failed(&dir.display(), &err))?;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let Some(stem) = schema_stem(&file_name) else {
            continue;
        };

        let metadata = entry.metadata().map_err(|err| load_failed(&file_name, &err))?;
        if !metadata.is_file() {
            continue;
        }
        let kind = kind_for_stem(stem).ok_or_else(|| {
            SchemaError::LoadFailed(format!("schema file names no message kind: {file_name}"))
        })?;
        if metadata.len() > config.max_schema_file_size {
            return Err(SchemaError::LoadFailed(format!(
                "{file_name}: too large ({} bytes, max {})",
                metadata.len(),
                config.max_schema_file_size
            )));
        }

        let source =
            std::fs::read_to_string(entry.path()).map_err(|err| load_failed(&file_name, &err))?;
        debug!(%kind, file = %file_name, "schema file read");
        files.push(SchemaFile { kind, source });
    }

    Ok(files)
}

/// `graphdata.schema.json` -> `graphdata`.
fn schema_stem(file_name: &str) -> Option<&str> {
    if file_name.len() <= SCHEMA_FILE_SUFFIX.len() {
        return None;
    }
    let split = file_name.len() - SCHEMA_FILE_SUFFIX.len();
    if !file_name.is_char_boundary(split) {
        return None;
    }
    let (stem, suffix) = file_name.split_at(split);
    suffix.eq_ignore_ascii_case(SCHEMA_FILE_SUFFIX).then_some(stem)
}

/// Stems match kinds case-insensitively; `-` and `_` are ignored so that
/// `settings-request` and `ml_data` resolve too.
fn kind_for_stem(stem: &str) -> Option<Kind> {
    let folded: String = stem.chars().filter(|c| *c != '-' && *c != '_').collect();
    Kind::parse_loose(&folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems() {
        assert_eq!(schema_stem("settings.schema.json"), Some("settings"));
        assert_eq!(schema_stem("Settings.Schema.JSON"), Some("Settings"));
        assert_eq!(schema_stem(".schema.json"), None);
        assert_eq!(schema_stem("settings.json"), None);
    }

    #[test]
    fn stem_to_kind() {
        assert_eq!(kind_for_stem("graphdata"), Some(Kind::GraphData));
        assert_eq!(kind_for_stem("ml_data"), Some(Kind::MLData));
        assert_eq!(kind_for_stem("settings-request"), Some(Kind::SettingsRequest));
        assert_eq!(kind_for_stem("layout"), None);
    }
}
