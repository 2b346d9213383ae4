use thiserror::Error;

/// Failure to turn a flag URL into readable pixels.
///
/// Cloneable because one load result is shared by every caller waiting on
/// the same URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageLoadError {
    #[error("failed to read image {url}: {message}")]
    Io { url: String, message: String },
    #[error("failed to decode image {url}: {message}")]
    Decode { url: String, message: String },
    #[error("image {url} has no pixels")]
    Empty { url: String },
    /// The source lives outside the asset origin, so its pixels may not be read.
    #[error("image {url} is outside the readable asset origin")]
    OriginDenied { url: String },
}

impl ImageLoadError {
    pub fn url(&self) -> &str {
        match self {
            ImageLoadError::Io { url, .. }
            | ImageLoadError::Decode { url, .. }
            | ImageLoadError::Empty { url }
            | ImageLoadError::OriginDenied { url } => url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipError {
    #[error("cannot allocate a {width}x{height} raster canvas")]
    Canvas { width: u32, height: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("source '{0}' already exists")]
    DuplicateSource(String),
    #[error("layer '{0}' already exists")]
    DuplicateLayer(String),
    #[error("layer '{layer}' references unknown source '{source_id}'")]
    UnknownSource { layer: String, source_id: String },
}
