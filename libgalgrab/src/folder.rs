use crate::errors::GrabError;
use chrono::Local;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::instrument;

/// Folder names are local wall-clock time at seconds granularity, so two
/// pages processed within the same second collide on purpose and get the
/// `_(n)` suffix instead.
const FOLDER_STAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Resolves the directory the current page's images land in. A single-page
/// run writes into `base_dir` itself; a batch run gets a fresh time-stamped
/// sub-folder per page.
pub async fn resolve_output_dir(base_dir: &Path, is_batch: bool) -> Result<PathBuf, GrabError> {
    if !is_batch {
        return Ok(base_dir.to_path_buf());
    }
    let stamp = Local::now().format(FOLDER_STAMP_FORMAT).to_string();
    create_stamped_dir(base_dir, &stamp).await
}

/// Probes `name`, `name_(1)`, `name_(2)`, ... under `base_dir` until an
/// unused name is found, then creates that directory and returns its path.
#[instrument]
async fn create_stamped_dir(base_dir: &Path, name: &str) -> Result<PathBuf, GrabError> {
    let mut dir = base_dir.join(name);
    let mut suffix = 1u32;
    while dir.exists() {
        dir = base_dir.join(format!("{name}_({suffix})"));
        suffix += 1;
    }
    if let Err(e) = fs::create_dir(&dir).await {
        tracing::error!(
            "Error creating output directory {}",
            dir.to_string_lossy().to_string()
        );
        tracing::error!("{} | {}", e, e.kind());
        return Err(GrabError::ErrorCreatingDestinationDirectory(format!(
            "{} | {}",
            e,
            e.kind()
        )));
    }
    tracing::debug!("Output directory for this page @ {}", dir.to_string_lossy());
    Ok(dir)
}
