//! Derived assets: text templates rendered with the current palette.
//!
//! Placeholders are `{name}` where `name` is anything [`ThemeColors::lookup`]
//! understands. `{name.strip}` drops the leading `#`. `{{` and `}}` produce
//! literal braces.

use std::path::{Path, PathBuf};

use madori_ipc::ThemeColors;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTemplate {
    pub template: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("unknown placeholder {{{0}}}")]
    UnknownPlaceholder(String),
    #[error("unclosed placeholder at byte {0}")]
    Unclosed(usize),
    #[error("failed to read template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write asset {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn render(template: &str, colors: &ThemeColors) -> Result<String, AssetError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
            offset += pos + 2;
            continue;
        }
        if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
            offset += pos + 2;
            continue;
        }
        if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
            offset += pos + 1;
            continue;
        }

        let end = tail.find('}').ok_or(AssetError::Unclosed(offset + pos))?;
        let name = &tail[1..end];
        out.push_str(&resolve(name, colors)?);
        rest = &tail[end + 1..];
        offset += pos + end + 1;
    }

    out.push_str(rest);
    Ok(out)
}

fn resolve(name: &str, colors: &ThemeColors) -> Result<String, AssetError> {
    let (key, strip) = match name.strip_suffix(".strip") {
        Some(key) => (key, true),
        None => (name, false),
    };
    let value = colors
        .lookup(key.trim())
        .ok_or_else(|| AssetError::UnknownPlaceholder(name.to_string()))?;
    if strip {
        Ok(value.trim_start_matches('#').to_string())
    } else {
        Ok(value.to_string())
    }
}

/// Render one template and replace its output file atomically.
pub fn render_to_file(asset: &AssetTemplate, colors: &ThemeColors) -> Result<(), AssetError> {
    let template = std::fs::read_to_string(&asset.template).map_err(|e| AssetError::Read {
        path: asset.template.clone(),
        source: e,
    })?;
    let rendered = render(&template, colors)?;
    write_atomic(&asset.output, rendered.as_bytes()).map_err(|e| AssetError::Write {
        path: asset.output.clone(),
        source: e,
    })
}

/// Render every template; a failing template does not stop the others.
pub fn render_all(assets: &[AssetTemplate], colors: &ThemeColors) -> Vec<AssetError> {
    assets
        .iter()
        .filter_map(|asset| match render_to_file(asset, colors) {
            Ok(()) => {
                tracing::debug!("Rendered {}", asset.output.display());
                None
            }
            Err(e) => Some(e),
        })
        .collect()
}

pub(super) fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)
}
