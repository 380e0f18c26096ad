use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;
use wirelens_contracts::RelayError;

/// Scoped temporary copy of an uploaded subject image. Uniquely named
/// so concurrent requests never collide; owned by exactly one
/// in-flight request. Dropping it deletes the file, which makes
/// cleanup run exactly once on every exit path.
#[derive(Debug)]
pub struct StagedSubject {
    path: PathBuf,
}

impl StagedSubject {
    /// Persists the uploaded bytes under the staging directory with a
    /// fresh random name. Write failure is a storage fault.
    pub async fn stage(
        staging_dir: &Path,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<Self, RelayError> {
        tokio::fs::create_dir_all(staging_dir)
            .await
            .map_err(|err| RelayError::storage(format!("staging dir unavailable: {err}")))?;
        let path = staging_dir.join(format!(
            "subject-{}-{}",
            Uuid::new_v4(),
            sanitize_name(original_name)
        ));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|err| RelayError::storage(format!("failed staging {}: {err}", path.display())))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedSubject {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Strips path separators from an uploaded filename so it cannot
/// escape the staging directory, and substitutes a stable default for
/// an empty name.
fn sanitize_name(original: &str) -> String {
    let cleaned: String = original
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    let trimmed = cleaned.trim_matches(['.', ' ']);
    if trimmed.is_empty() {
        "upload.jpg".to_string()
    } else {
        trimmed.to_string()
    }
}
