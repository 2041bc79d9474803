//! Video acquisition.
//!
//! A [`VideoSource`] names where a video comes from: a file already on
//! disk (an upload) or a shareable drive link. [`VideoSource::resolve`]
//! places a readable, non-empty copy at a destination path inside the
//! session workspace. Downloading drive links needs the `remote` feature.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CutlistError;

const DRIVE_DOWNLOAD_BASE: &str = "https://drive.google.com/uc?id=";

/// Where a video comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    /// A file already on local disk.
    Upload(PathBuf),
    /// A shareable drive link such as
    /// `https://drive.google.com/file/d/<id>/view`.
    DriveLink(String),
}

impl Display for VideoSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            VideoSource::Upload(path) => write!(f, "{}", path.display()),
            VideoSource::DriveLink(link) => write!(f, "{link}"),
        }
    }
}

impl VideoSource {
    /// File extension to give the resolved copy. Falls back to `mp4`.
    pub fn extension(&self) -> String {
        match self {
            VideoSource::Upload(path) => path
                .extension()
                .and_then(|extension| extension.to_str())
                .filter(|extension| !extension.is_empty())
                .map(str::to_ascii_lowercase)
                .unwrap_or_else(|| "mp4".to_string()),
            VideoSource::DriveLink(_) => "mp4".to_string(),
        }
    }

    /// Make the video available at `destination`.
    ///
    /// Uploads are copied unless they already live at `destination`. Drive
    /// links are downloaded.
    ///
    /// # Errors
    ///
    /// [`CutlistError::Acquisition`] if the source is missing, empty, cannot
    /// be copied or downloaded, or is a drive link without the `remote`
    /// feature.
    pub fn resolve(&self, destination: &Path) -> Result<PathBuf, CutlistError> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|error| self.failure(error))?;
        }

        match self {
            VideoSource::Upload(path) => {
                ensure_readable(path)?;
                if !is_same_file(path, destination) {
                    fs::copy(path, destination).map_err(|error| self.failure(error))?;
                    log::debug!(
                        "Copied upload {} to {}",
                        path.display(),
                        destination.display()
                    );
                }
            }
            VideoSource::DriveLink(link) => {
                let id = drive_file_id(link).ok_or_else(|| {
                    self.failure("link does not contain a drive file id")
                })?;
                download(&drive_download_url(&id), destination)?;
            }
        }

        ensure_readable(destination)?;
        log::info!("Acquired video from {self} at {}", destination.display());
        Ok(destination.to_path_buf())
    }

    fn failure(&self, reason: impl ToString) -> CutlistError {
        CutlistError::Acquisition {
            origin: self.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Check that `path` is an existing, non-empty regular file.
///
/// # Errors
///
/// [`CutlistError::Acquisition`] otherwise.
pub fn ensure_readable(path: &Path) -> Result<(), CutlistError> {
    let failure = |reason: &str| CutlistError::Acquisition {
        origin: path.display().to_string(),
        reason: reason.to_string(),
    };

    let metadata = fs::metadata(path).map_err(|_| failure("file does not exist"))?;
    if !metadata.is_file() {
        return Err(failure("not a regular file"));
    }
    if metadata.len() == 0 {
        return Err(failure("file is empty"));
    }
    Ok(())
}

/// Extract the file id from a drive share link.
///
/// Understands `.../d/<id>/...` paths and `id=<id>` query parameters.
///
/// ```
/// assert_eq!(
///     cutlist::drive_file_id("https://drive.google.com/file/d/1AbC-xyz_9/view?usp=sharing"),
///     Some("1AbC-xyz_9".to_string()),
/// );
/// assert_eq!(
///     cutlist::drive_file_id("https://drive.google.com/open?id=1AbC"),
///     Some("1AbC".to_string()),
/// );
/// assert_eq!(cutlist::drive_file_id("https://example.com/video.mp4"), None);
/// ```
pub fn drive_file_id(link: &str) -> Option<String> {
    let is_id_char = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';

    let from_path = link.split_once("/d/").map(|(_, rest)| rest);
    let from_query = link
        .split(['?', '&'])
        .skip(1)
        .find_map(|pair| pair.strip_prefix("id="));

    from_path
        .into_iter()
        .chain(from_query)
        .map(|candidate| {
            candidate
                .split(|c: char| !is_id_char(c))
                .next()
                .unwrap_or_default()
        })
        .find(|id| !id.is_empty())
        .map(str::to_string)
}

/// Direct download URL for a drive file id.
pub fn drive_download_url(file_id: &str) -> String {
    format!("{DRIVE_DOWNLOAD_BASE}{file_id}")
}

/// Download `url` to `destination`.
///
/// # Errors
///
/// [`CutlistError::Acquisition`] on any transport or HTTP status error, or
/// if the body cannot be written.
#[cfg(feature = "remote")]
pub fn download(url: &str, destination: &Path) -> Result<(), CutlistError> {
    use std::fs::File;
    use std::io::BufWriter;

    use reqwest::blocking::Client;

    let failure = |reason: String| CutlistError::Acquisition {
        origin: url.to_string(),
        reason,
    };

    let client = Client::builder()
        .user_agent(concat!("cutlist/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|error| failure(error.to_string()))?;

    log::debug!("Downloading {url} to {}", destination.display());
    let mut response = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .map_err(|error| failure(error.to_string()))?;

    let file = File::create(destination).map_err(|error| failure(error.to_string()))?;
    let bytes = response
        .copy_to(&mut BufWriter::new(file))
        .map_err(|error| failure(error.to_string()))?;
    log::info!("Downloaded {bytes} bytes from {url}");
    Ok(())
}

/// Download `url` to `destination`.
///
/// # Errors
///
/// Always [`CutlistError::Acquisition`]: the crate was built without the
/// `remote` feature.
#[cfg(not(feature = "remote"))]
pub fn download(url: &str, _destination: &Path) -> Result<(), CutlistError> {
    Err(CutlistError::Acquisition {
        origin: url.to_string(),
        reason: "drive downloads require the `remote` feature".to_string(),
    })
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
