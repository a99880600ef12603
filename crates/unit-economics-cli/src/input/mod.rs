pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Resolve a command's typed input from `--input <file>` or piped stdin.
/// Returns None when neither is present so the caller can fall back to flags.
pub fn from_file_or_stdin<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(file::read_json(path)?));
    }
    match stdin::read_stdin()? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}
