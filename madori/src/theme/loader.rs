use std::path::{Path, PathBuf};

use madori_ipc::ThemeColors;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Anything shorter cannot be a complete palette; usually a file caught mid-write.
pub const MIN_THEME_FILE_SIZE: u64 = 50;

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("theme file {0} does not exist")]
    Missing(PathBuf),
    #[error("theme file {path} is too small ({size} bytes)")]
    TooSmall { path: PathBuf, size: u64 },
    #[error("failed to read theme file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid theme file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A parsed theme file together with the bytes it was parsed from.
#[derive(Debug, Clone)]
pub struct LoadedTheme {
    pub colors: ThemeColors,
    pub hash: String,
    pub raw: Vec<u8>,
}

/// Read, size-check and parse a theme file. Colour validation happens while
/// deserialising, so a successful result is a complete, well-formed palette.
pub fn read_theme(path: &Path) -> Result<LoadedTheme, ThemeError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ThemeError::Missing(path.to_path_buf())
        } else {
            ThemeError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    if metadata.len() < MIN_THEME_FILE_SIZE {
        return Err(ThemeError::TooSmall {
            path: path.to_path_buf(),
            size: metadata.len(),
        });
    }

    let bytes = std::fs::read(path).map_err(|e| ThemeError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let colors = serde_json::from_slice(&bytes).map_err(|e| ThemeError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(LoadedTheme {
        colors,
        hash: content_hash(&bytes),
        raw: bytes,
    })
}

/// Hex SHA-256 of the raw file content.
pub fn content_hash(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Hash of the file currently on disk, if it can be read.
pub fn file_hash(path: &Path) -> Option<String> {
    std::fs::read(path).ok().map(|bytes| content_hash(&bytes))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    /// A complete theme file whose colours are derived from `seed`.
    pub fn theme_json(seed: u8) -> String {
        let colors: Vec<String> = (0..16u8)
            .map(|i| {
                format!(
                    "\"color{}\": \"#{:02x}{:02x}{:02x}\"",
                    i,
                    seed,
                    i,
                    seed.wrapping_add(i)
                )
            })
            .collect();
        format!(
            "{{\"special\": {{\"background\": \"#{:02x}0000\", \"foreground\": \"#ffffff\", \"cursor\": \"#ffffff\"}}, \"colors\": {{{}}}}}",
            seed,
            colors.join(", ")
        )
    }

    pub fn write_theme(path: &Path, seed: u8) {
        std::fs::write(path, theme_json(seed)).unwrap();
    }
}
