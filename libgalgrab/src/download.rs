use crate::errors::GrabError;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs;
use url::Url;

/// Fetches the image bytes at `src` over plain HTTP and writes them verbatim
/// to `dest_dir/file_name`. The returned path is the written file.
#[tracing::instrument]
pub async fn download_image(
    client: &Client,
    src: &str,
    dest_dir: &Path,
    file_name: &str,
) -> Result<PathBuf, GrabError> {
    let src_url = match Url::parse(src) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!("Image source {} is not a fetchable url", src);
            tracing::error!("{}", e);
            return Err(GrabError::InvalidUrl(src.to_string()));
        }
    };

    let response = match client.get(src_url.to_string()).send().await {
        Err(e) => {
            tracing::error!("Error downloading image from {}", src_url.to_string());
            tracing::error!("{}", e);
            return Err(GrabError::NetworkError(e.to_string()));
        }
        Ok(r) => {
            if !r.status().is_success() {
                tracing::error!("Error status code received : {} |{}|", r.status(), src_url);
                return Err(GrabError::ErrorStatusCode {
                    status_code: r.status().to_string(),
                    url: src_url.to_string(),
                });
            }
            r
        }
    };

    let bytes = match response.bytes().await {
        Err(e) => {
            tracing::error!("Error reading image body from {}", src_url.to_string());
            tracing::error!("{}", e);
            return Err(GrabError::NetworkError(e.to_string()));
        }
        Ok(b) => b,
    };

    let dest_file = dest_dir.join(file_name);
    if let Err(e) = fs::write(&dest_file, &bytes).await {
        tracing::error!(
            "Error writing to destination file {}",
            dest_file.to_string_lossy().to_string()
        );
        tracing::error!("{} | {}", e, e.kind());
        return Err(GrabError::FileOperationError {
            file_name: dest_file.to_string_lossy().to_string(),
            message: format!("{} | {}", e, e.kind()),
        });
    }

    tracing::debug!(
        "Download completed for {}, file @ {}",
        &src_url,
        dest_file.to_string_lossy().to_string()
    );
    Ok(dest_file)
}
