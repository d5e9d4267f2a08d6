// SPDX-License-Identifier: MPL-2.0

//! Writing finished sessions to disk

use crate::backends::camera::CapturedFrame;
use crate::backends::separation::CutoutImage;
use crate::errors::{AppResult, PhotoError};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::info;

/// Files written for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSession {
    pub photo: PathBuf,
    pub cutout: Option<PathBuf>,
}

/// File stem shared by everything saved for a frame
pub fn session_stem(captured_at: &DateTime<Local>) -> String {
    format!("booth_{}", captured_at.format("%Y%m%d_%H%M%S"))
}

/// Save the captured frame and, if there is one, its cutout
///
/// Files are named after the capture time:
/// `booth_YYYYMMDD_HHMMSS_photo.<ext>` and `booth_YYYYMMDD_HHMMSS_cutout.png`.
/// A stem already used in `output_dir` gets a `_2`, `_3`, ... suffix.
pub async fn save_session(
    frame: &CapturedFrame,
    cutout: Option<&CutoutImage>,
    output_dir: &Path,
) -> AppResult<SavedSession> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| PhotoError::SaveFailed(format!("{}: {}", output_dir.display(), e)))?;

    let base = session_stem(&frame.captured_at);
    let mut attempt = 1;
    let (photo, cutout_path) = loop {
        let stem = match attempt {
            1 => base.clone(),
            n => format!("{}_{}", base, n),
        };
        let photo = output_dir.join(format!("{}_photo.{}", stem, frame.format.extension()));
        let cutout_path = output_dir.join(format!("{}_cutout.png", stem));
        if !exists(&photo).await? && !exists(&cutout_path).await? {
            break (photo, cutout_path);
        }
        attempt += 1;
    };
    write_file(&photo, &frame.data).await?;

    let cutout = match cutout {
        Some(cutout) => {
            write_file(&cutout_path, &cutout.data).await?;
            Some(cutout_path)
        }
        None => None,
    };

    Ok(SavedSession { photo, cutout })
}

async fn exists(path: &Path) -> AppResult<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| PhotoError::SaveFailed(format!("{}: {}", path.display(), e)).into())
}

async fn write_file(path: &Path, data: &[u8]) -> AppResult<()> {
    tokio::fs::write(path, data)
        .await
        .map_err(|e| PhotoError::SaveFailed(format!("{}: {}", path.display(), e)))?;
    info!(path = %path.display(), bytes = data.len(), "Image saved");
    Ok(())
}
