//! Fakes shared by unit tests: an in-memory image loader with per-URL gates.

use crate::error::ImageLoadError;
use crate::image_cache::{ImageLoader, ImageRecord};
use futures::future::{BoxFuture, FutureExt};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

pub struct TestLoader {
    pub loads: Arc<AtomicUsize>,
    gates: HashMap<String, Arc<Semaphore>>,
    failing: HashSet<String>,
}

impl TestLoader {
    pub fn new() -> Self {
        Self {
            loads: Arc::new(AtomicUsize::new(0)),
            gates: HashMap::new(),
            failing: HashSet::new(),
        }
    }

    /// Hold loads of `url` until a permit is added to the returned semaphore
    pub fn gate(&mut self, url: &str) -> Arc<Semaphore> {
        self.gates
            .entry(url.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(0)))
            .clone()
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }
}

impl ImageLoader for TestLoader {
    fn load(&self, url: &str) -> BoxFuture<'static, Result<ImageRecord, ImageLoadError>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.get(url).cloned();
        let fails = self.failing.contains(url);
        let url = url.to_string();

        async move {
            if let Some(gate) = gate {
                let _permit = gate.acquire().await;
            }
            if fails {
                return Err(ImageLoadError::Io {
                    url,
                    message: "No such file or directory".to_string(),
                });
            }
            Ok(solid_image(4, 2, color_for(&url)))
        }
        .boxed()
    }
}

/// Opaque image of a single color
pub fn solid_image(width: u32, height: u32, rgb: [u8; 3]) -> ImageRecord {
    let rgba: Vec<u8> = (0..width * height)
        .flat_map(|_| [rgb[0], rgb[1], rgb[2], 255])
        .collect();
    match ImageRecord::from_rgba("test", width, height, &rgba) {
        Ok(record) => record,
        Err(err) => panic!("bad test image: {err}"),
    }
}

/// Stable per-URL color so tests can tell flags apart
pub fn color_for(url: &str) -> [u8; 3] {
    let hash = url
        .bytes()
        .fold(7u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
    [(hash & 0xff) as u8, ((hash >> 8) & 0xff) as u8, ((hash >> 16) & 0xff) as u8]
}
