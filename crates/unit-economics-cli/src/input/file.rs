use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

use unit_economics_core::catalog::Catalog;

/// Read a JSON file and deserialise into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let (canonical, contents) = read_file(path)?;
    let value: T = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Read an override catalog. YAML is a superset of JSON, so both parse here.
pub fn read_catalog(path: &str) -> Result<Catalog, Box<dyn std::error::Error>> {
    let (canonical, contents) = read_file(path)?;
    let catalog: Catalog = serde_yaml::from_str(&contents)
        .map_err(|e| format!("Failed to parse catalog '{}': {}", canonical.display(), e))?;
    catalog.validate()?;
    log::debug!(
        "loaded catalog from {}: {} fee profiles, {} tiers, {} scenarios",
        canonical.display(),
        catalog.fee_profiles.profiles().len(),
        catalog.pricing.tiers().len(),
        catalog.scenarios.scenarios().len()
    );
    Ok(catalog)
}

fn read_file(path: &str) -> Result<(PathBuf, String), Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    Ok((canonical, contents))
}

/// Resolve the path and make sure it names an existing file.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}
