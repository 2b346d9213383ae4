//! Progressive flag-layer rendering.
//!
//! A render pass resolves every country's language, preloads the needed flag
//! images, then (if no newer pass has started meanwhile) clips one overlay per
//! polygon, places them next to the previous set and finally retires that
//! previous set. Old overlays are never removed before the new ones exist, and
//! a superseded pass never touches the surface.

use crate::clip::clip;
use crate::config::{BORDERS_SOURCE, BORDER_LAYER, FILL_LAYER, OVERLAY_OPACITY};
use crate::data::Country;
use crate::error::{ImageLoadError, SurfaceError};
use crate::flags::flag_url;
use crate::image_cache::{ImageCache, ImageLoader};
use crate::map::{LayerDescriptor, LayerKind, MapSurface, SourceDescriptor};
use crate::resolver::Resolver;
use crate::selection::Selection;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tiny_skia::Pixmap;
use tracing::{debug, info, warn};

const BORDER_COLOR: [u8; 3] = [255, 255, 255];

/// One placed flag raster
#[derive(Clone, Debug)]
pub struct Overlay {
    pub id: String,
    pub raster: Arc<Pixmap>,
    pub corners: [(f64, f64); 4],
    pub generation: u64,
}

/// How a render pass ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassOutcome {
    /// The pass's overlays are now the live set
    Committed {
        generation: u64,
        overlays: usize,
        /// Countries dropped because their overlay could not be built
        skipped: usize,
    },
    /// A newer pass started while this one was preloading; nothing was placed
    Superseded { generation: u64 },
}

/// A country that will get flag overlays in this pass
struct CountryJob {
    name: String,
    url: String,
    index: usize,
}

#[derive(Default)]
struct PassState {
    generation: u64,
    live: Vec<Overlay>,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the live overlay set and the generation counter; shares the image
/// cache and the map surface with the rest of the application.
pub struct Coordinator<S, L> {
    cache: Arc<ImageCache<L>>,
    surface: Arc<Mutex<S>>,
    resolver: Arc<Resolver>,
    countries: Arc<Vec<Country>>,
    state: Arc<Mutex<PassState>>,
}

impl<S, L> Clone for Coordinator<S, L> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            surface: self.surface.clone(),
            resolver: self.resolver.clone(),
            countries: self.countries.clone(),
            state: self.state.clone(),
        }
    }
}

impl<S: MapSurface, L: ImageLoader> Coordinator<S, L> {
    pub fn new(
        cache: Arc<ImageCache<L>>,
        surface: Arc<Mutex<S>>,
        resolver: Arc<Resolver>,
        countries: Arc<Vec<Country>>,
    ) -> Self {
        Self {
            cache,
            surface,
            resolver,
            countries,
            state: Arc::new(Mutex::new(PassState::default())),
        }
    }

    pub fn surface(&self) -> &Arc<Mutex<S>> {
        &self.surface
    }

    pub fn cache(&self) -> &Arc<ImageCache<L>> {
        &self.cache
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    #[cfg(test)]
    pub fn current_generation(&self) -> u64 {
        lock(&self.state).generation
    }

    pub fn live_overlay_count(&self) -> usize {
        lock(&self.state).live.len()
    }

    /// Ids of the live overlays
    #[cfg(test)]
    pub fn live_overlay_ids(&self) -> Vec<String> {
        lock(&self.state).live.iter().map(|o| o.id.clone()).collect()
    }

    /// Register the border source with its invisible hit-test fill and the
    /// border line layer that flag overlays are stacked beneath.
    pub fn install_base_layers(&self) -> Result<(), SurfaceError> {
        let mut surface = lock(&self.surface);
        surface.add_source(BORDERS_SOURCE, SourceDescriptor::Features(self.countries.clone()))?;
        surface.add_layer(
            LayerDescriptor::new(FILL_LAYER, BORDERS_SOURCE, LayerKind::Fill { opacity: 0.0 }),
            None,
        )?;
        surface.add_layer(
            LayerDescriptor::new(BORDER_LAYER, BORDERS_SOURCE, LayerKind::Line { color: BORDER_COLOR }),
            None,
        )?;
        Ok(())
    }

    /// Run one full render pass for `selection`.
    ///
    /// Returns `Err` only when preloading a flag image fails for the current
    /// pass; the previous overlays then stay on the surface untouched. A failure
    /// in a pass that has already been superseded is reported as `Superseded`.
    pub async fn render_pass(&self, selection: Selection) -> Result<PassOutcome, ImageLoadError> {
        // Start
        let (generation, old) = {
            let mut state = lock(&self.state);
            state.generation += 1;
            let old: Vec<String> = state.live.iter().map(|o| o.id.clone()).collect();
            (state.generation, old)
        };
        debug!(generation, year = selection.year, rank = selection.rank, "render pass started");

        // Resolve
        let jobs = self.resolve_jobs(selection);

        // Collect
        let urls: BTreeSet<&str> = jobs.iter().map(|job| job.url.as_str()).collect();

        // Preload: the only suspension point
        if let Err(err) = self.cache.preload_all(&urls).await {
            let current = lock(&self.state).generation;
            if current != generation {
                debug!(generation, current, url = err.url(), error = %err, "superseded render pass failed to preload");
                return Ok(PassOutcome::Superseded { generation });
            }
            warn!(generation, url = err.url(), error = %err, "render pass aborted");
            return Err(err);
        }

        // Guard, build and commit under one lock so no other pass can interleave
        let mut state = lock(&self.state);
        if state.generation != generation {
            debug!(generation, current = state.generation, "discarding superseded render pass");
            return Ok(PassOutcome::Superseded { generation });
        }

        let mut surface = lock(&self.surface);
        let mut overlays = Vec::new();
        let mut skipped = 0;
        for job in &jobs {
            match self.build_country(&mut *surface, job, generation) {
                Ok(built) => overlays.extend(built),
                Err(err) => {
                    warn!(country = %job.name, error = %err, "skipping country");
                    skipped += 1;
                }
            }
        }

        for id in &old {
            if surface.has_layer(id) {
                surface.remove_layer(id);
            }
            if surface.has_source(id) {
                surface.remove_source(id);
            }
        }
        let count = overlays.len();
        state.live = overlays;

        info!(generation, overlays = count, retired = old.len(), skipped, "render pass committed");
        Ok(PassOutcome::Committed {
            generation,
            overlays: count,
            skipped,
        })
    }

    /// Countries with both a language and a flag for the selection
    fn resolve_jobs(&self, selection: Selection) -> Vec<CountryJob> {
        self.countries
            .iter()
            .enumerate()
            .filter_map(|(index, country)| {
                let name = country.name.as_deref()?;
                let Some(language) = self.resolver.resolve(name, selection) else {
                    debug!(country = name, year = selection.year, rank = selection.rank, "no language");
                    return None;
                };
                let url = flag_url(language)?;
                Some(CountryJob {
                    name: name.to_string(),
                    url,
                    index,
                })
            })
            .collect()
    }

    /// Clip and place one overlay per polygon of a country. On failure the
    /// country's already placed overlays are taken off again.
    fn build_country(&self, surface: &mut S, job: &CountryJob, generation: u64) -> Result<Vec<Overlay>, BuildError> {
        let image = self
            .cache
            .get_if_present(&job.url)
            .ok_or_else(|| BuildError::NotPreloaded(job.url.clone()))?;

        let mut built: Vec<Overlay> = Vec::new();
        for (i, ring) in self.countries[job.index].polygons.iter().enumerate() {
            let placed = clip(&image, ring)
                .map_err(BuildError::from)
                .and_then(|result| {
                    let overlay = Overlay {
                        id: format!("flag-{generation}-{}-{i}", job.name),
                        raster: Arc::new(result.raster),
                        corners: result.corners,
                        generation,
                    };
                    place(surface, &overlay)?;
                    Ok(overlay)
                });

            match placed {
                Ok(overlay) => built.push(overlay),
                Err(err) => {
                    for overlay in &built {
                        surface.remove_layer(&overlay.id);
                        surface.remove_source(&overlay.id);
                    }
                    return Err(err);
                }
            }
        }
        Ok(built)
    }
}

fn place<S: MapSurface>(surface: &mut S, overlay: &Overlay) -> Result<(), SurfaceError> {
    surface.add_source(
        &overlay.id,
        SourceDescriptor::Image {
            raster: overlay.raster.clone(),
            corners: overlay.corners,
        },
    )?;
    let layer = LayerDescriptor::new(
        overlay.id.clone(),
        overlay.id.clone(),
        LayerKind::Raster {
            opacity: OVERLAY_OPACITY,
        },
    );
    if let Err(err) = surface.add_layer(layer, Some(BORDER_LAYER)) {
        surface.remove_source(&overlay.id);
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
enum BuildError {
    #[error("flag {0} was not preloaded")]
    NotPreloaded(String),
    #[error(transparent)]
    Clip(#[from] crate::error::ClipError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}
