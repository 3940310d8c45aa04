//! Remote key derivation.
//!
//! A file's remote key is its path relative to the uploads root, with `/`
//! separators and no leading slash, so `/srv/uploads/2024/05/a.png` under
//! root `/srv/uploads` becomes `2024/05/a.png`.

use std::path::{Component, Path};

use offload_core::error::AppError;
use offload_core::result::AppResult;

/// Compute the remote key of `file_path` relative to `root`.
///
/// Fails with `Validation` when the path does not live under `root`, when
/// it climbs out with `..`, or when nothing remains after the root.
pub fn remote_key_for(root: &Path, file_path: &Path) -> AppResult<String> {
    let relative = file_path.strip_prefix(root).map_err(|_| {
        AppError::validation(format!(
            "File {} is outside the uploads root {}",
            file_path.display(),
            root.display()
        ))
    })?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => {
                return Err(AppError::validation(format!(
                    "File {} escapes the uploads root",
                    file_path.display()
                )));
            }
        }
    }

    if segments.is_empty() {
        return Err(AppError::validation(format!(
            "File {} has no name below the uploads root",
            file_path.display()
        )));
    }
    Ok(segments.join("/"))
}
