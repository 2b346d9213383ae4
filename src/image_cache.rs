//! Decoded flag images keyed by URL.
//!
//! Each URL has at most one load in flight; every concurrent requester awaits
//! the same shared completion. Successful loads stay cached for the process
//! lifetime, failed ones are evicted so a later render pass can retry.

use crate::error::ImageLoadError;
use futures::future::{self, BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tiny_skia::{ColorU8, Pixmap};
use tracing::{debug, warn};

/// A decoded image with premultiplied RGBA pixels
#[derive(Clone, Debug)]
pub struct ImageRecord {
    pub pixmap: Pixmap,
    pub width: u32,
    pub height: u32,
}

impl ImageRecord {
    /// Build a record from straight (non-premultiplied) RGBA8 bytes
    pub fn from_rgba(url: &str, width: u32, height: u32, rgba: &[u8]) -> Result<Self, ImageLoadError> {
        let empty = || ImageLoadError::Empty {
            url: url.to_string(),
        };
        let mut pixmap = Pixmap::new(width, height).ok_or_else(empty)?;
        if rgba.len() != width as usize * height as usize * 4 {
            return Err(ImageLoadError::Decode {
                url: url.to_string(),
                message: format!("expected {}x{} RGBA pixels, got {} bytes", width, height, rgba.len()),
            });
        }

        for (dst, px) in pixmap.pixels_mut().iter_mut().zip(rgba.chunks_exact(4)) {
            *dst = ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
        }

        Ok(Self::from_pixmap(pixmap))
    }

    pub fn from_pixmap(pixmap: Pixmap) -> Self {
        Self {
            width: pixmap.width(),
            height: pixmap.height(),
            pixmap,
        }
    }
}

/// Source of image bytes for the cache
pub trait ImageLoader: Send + Sync + 'static {
    fn load(&self, url: &str) -> BoxFuture<'static, Result<ImageRecord, ImageLoadError>>;
}

type LoadResult = Result<Arc<ImageRecord>, ImageLoadError>;
type PendingLoad = Shared<BoxFuture<'static, LoadResult>>;

pub struct ImageCache<L> {
    loader: L,
    entries: Mutex<HashMap<String, PendingLoad>>,
}

impl<L: ImageLoader> ImageCache<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, PendingLoad>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve `url`, starting a load only if none is cached or in flight
    pub async fn get_or_fetch(&self, url: &str) -> LoadResult {
        let pending = {
            let mut entries = self.entries();
            match entries.get(url) {
                Some(pending) => pending.clone(),
                None => {
                    debug!(url, "loading image");
                    let pending = self
                        .loader
                        .load(url)
                        .map(|result| result.map(Arc::new))
                        .boxed()
                        .shared();
                    entries.insert(url.to_string(), pending.clone());
                    pending
                }
            }
        };

        let result = pending.clone().await;
        if let Err(err) = &result {
            let mut entries = self.entries();
            // Only evict the load we awaited; a retry may already have replaced it
            if entries.get(url).is_some_and(|current| current.ptr_eq(&pending)) {
                warn!(url, error = %err, "image load failed");
                entries.remove(url);
            }
        }
        result
    }

    /// Resolved image for `url`, or `None` if missing, in flight or failed
    pub fn get_if_present(&self, url: &str) -> Option<Arc<ImageRecord>> {
        self.entries()
            .get(url)
            .and_then(|pending| pending.peek())
            .and_then(|result| result.as_ref().ok())
            .cloned()
    }

    /// Load every URL; fails as soon as any one load fails
    pub async fn preload_all<I>(&self, urls: I) -> Result<(), ImageLoadError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        future::try_join_all(
            urls.into_iter()
                .map(|url| async move { self.get_or_fetch(url.as_ref()).await }),
        )
        .await
        .map(|_| ())
    }

    /// Number of successfully resolved images
    pub fn len(&self) -> usize {
        self.entries()
            .values()
            .filter(|pending| matches!(pending.peek(), Some(Ok(_))))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Loads images from files under an asset root (the "origin").
///
/// URLs are root-relative paths such as `./flags/gb.png`. Anything that would
/// read outside the root is refused with [`ImageLoadError::OriginDenied`].
pub struct FileImageLoader {
    root: PathBuf,
}

impl FileImageLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a URL to a file path inside the root
    pub fn resolve(&self, url: &str) -> Result<PathBuf, ImageLoadError> {
        let denied = || ImageLoadError::OriginDenied {
            url: url.to_string(),
        };
        if url.contains("://") || url.starts_with("data:") {
            return Err(denied());
        }

        let mut path = self.root.clone();
        for component in Path::new(url).components() {
            match component {
                Component::CurDir => {}
                Component::Normal(part) => path.push(part),
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(denied())
                }
            }
        }
        Ok(path)
    }
}

impl ImageLoader for FileImageLoader {
    fn load(&self, url: &str) -> BoxFuture<'static, Result<ImageRecord, ImageLoadError>> {
        let url = url.to_string();
        let path = self.resolve(&url);

        async move {
            let path = path?;
            let bytes = tokio::fs::read(&path).await.map_err(|e| ImageLoadError::Io {
                url: url.clone(),
                message: e.to_string(),
            })?;

            let decode_url = url.clone();
            tokio::task::spawn_blocking(move || decode(&decode_url, &bytes))
                .await
                .map_err(|e| ImageLoadError::Decode {
                    url,
                    message: e.to_string(),
                })?
        }
        .boxed()
    }
}

/// Decode encoded image bytes (PNG) into a record
pub fn decode(url: &str, bytes: &[u8]) -> Result<ImageRecord, ImageLoadError> {
    let image = image::load_from_memory(bytes).map_err(|e| ImageLoadError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    let rgba = image.to_rgba8();
    ImageRecord::from_rgba(url, rgba.width(), rgba.height(), rgba.as_raw())
}
