use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::narration::domain::phrase_catalog::PhraseCatalog;
use crate::shared::constants::CATALOG_EXTENSIONS;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read phrase catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON phrase catalog {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid YAML phrase catalog {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("unsupported phrase catalog format: {0} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(PathBuf),
}

/// Load a phrase catalog, picking the parser from the file extension.
pub fn load(path: &Path) -> Result<PhraseCatalog, CatalogError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .filter(|e| CATALOG_EXTENSIONS.contains(&e.as_str()))
        .ok_or_else(|| CatalogError::UnsupportedFormat(path.to_path_buf()))?;

    let text = fs::read_to_string(path).map_err(|e| CatalogError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let catalog: PhraseCatalog = match ext.as_str() {
        "json" => serde_json::from_str(&text).map_err(|e| CatalogError::Json {
            path: path.to_path_buf(),
            source: e,
        })?,
        "yaml" | "yml" => serde_yaml::from_str(&text).map_err(|e| CatalogError::Yaml {
            path: path.to_path_buf(),
            source: e,
        })?,
        _ => return Err(CatalogError::UnsupportedFormat(path.to_path_buf())),
    };

    log::info!(
        "Loaded {} phrases from {}",
        catalog.phrase_count(),
        path.display()
    );
    Ok(catalog)
}
