//! The narrow contract between the render pipeline and whatever displays the map.

use crate::canvas::Rgb;
use crate::data::Country;
use crate::error::SurfaceError;
use std::collections::HashMap;
use std::sync::Arc;
use tiny_skia::Pixmap;

/// Data a layer draws from
#[derive(Clone, Debug)]
pub enum SourceDescriptor {
    /// Border features
    Features(Arc<Vec<Country>>),
    /// A raster placed at four geographic corners (TL, TR, BR, BL)
    Image {
        raster: Arc<Pixmap>,
        corners: [(f64, f64); 4],
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LayerKind {
    Fill { opacity: f32 },
    Line { color: Rgb },
    Raster { opacity: f32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayerDescriptor {
    pub id: String,
    pub source: String,
    pub kind: LayerKind,
}

impl LayerDescriptor {
    pub fn new(id: impl Into<String>, source: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            kind,
        }
    }
}

/// What the render pipeline needs from a map display
pub trait MapSurface: Send + 'static {
    fn add_source(&mut self, id: &str, source: SourceDescriptor) -> Result<(), SurfaceError>;

    /// Add a layer below `before_id`, or on top when `before_id` is absent or unknown
    fn add_layer(&mut self, layer: LayerDescriptor, before_id: Option<&str>) -> Result<(), SurfaceError>;

    fn remove_layer(&mut self, id: &str);
    fn remove_source(&mut self, id: &str);
    fn has_layer(&self, id: &str) -> bool;
    fn has_source(&self, id: &str) -> bool;
}

/// Sources plus an ordered (bottom → top) layer list.
///
/// Shared bookkeeping for surface implementations.
#[derive(Default)]
pub struct LayerStack {
    sources: HashMap<String, SourceDescriptor>,
    layers: Vec<LayerDescriptor>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self, id: &str) -> Option<&SourceDescriptor> {
        self.sources.get(id)
    }

    pub fn layer(&self, id: &str) -> Option<&LayerDescriptor> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Layers bottom to top
    pub fn layers(&self) -> &[LayerDescriptor] {
        &self.layers
    }
}

impl MapSurface for LayerStack {
    fn add_source(&mut self, id: &str, source: SourceDescriptor) -> Result<(), SurfaceError> {
        if self.sources.contains_key(id) {
            return Err(SurfaceError::DuplicateSource(id.to_string()));
        }
        self.sources.insert(id.to_string(), source);
        Ok(())
    }

    fn add_layer(&mut self, layer: LayerDescriptor, before_id: Option<&str>) -> Result<(), SurfaceError> {
        if self.has_layer(&layer.id) {
            return Err(SurfaceError::DuplicateLayer(layer.id));
        }
        if !self.sources.contains_key(&layer.source) {
            return Err(SurfaceError::UnknownSource {
                layer: layer.id,
                source_id: layer.source,
            });
        }

        let position = before_id.and_then(|before| self.layers.iter().position(|l| l.id == before));
        match position {
            Some(index) => self.layers.insert(index, layer),
            None => self.layers.push(layer),
        }
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) {
        self.layers.retain(|l| l.id != id);
    }

    fn remove_source(&mut self, id: &str) {
        self.sources.remove(id);
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layer(id).is_some()
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> SourceDescriptor {
        SourceDescriptor::Features(Arc::new(Vec::new()))
    }

    fn ids(stack: &LayerStack) -> Vec<&str> {
        stack.layers().iter().map(|l| l.id.as_str()).collect()
    }

    #[test]
    fn test_before_id_ordering() {
        let mut stack = LayerStack::new();
        stack.add_source("borders", features()).unwrap();
        stack
            .add_layer(LayerDescriptor::new("fills", "borders", LayerKind::Fill { opacity: 0.0 }), None)
            .unwrap();
        stack
            .add_layer(LayerDescriptor::new("lines", "borders", LayerKind::Line { color: [255; 3] }), None)
            .unwrap();
        stack
            .add_layer(
                LayerDescriptor::new("flag-a", "borders", LayerKind::Raster { opacity: 0.85 }),
                Some("lines"),
            )
            .unwrap();
        stack
            .add_layer(
                LayerDescriptor::new("flag-b", "borders", LayerKind::Raster { opacity: 0.85 }),
                Some("missing"),
            )
            .unwrap();

        assert_eq!(ids(&stack), ["fills", "flag-a", "lines", "flag-b"]);
    }

    #[test]
    fn test_duplicates_and_unknown_sources() {
        let mut stack = LayerStack::new();
        stack.add_source("borders", features()).unwrap();
        assert_eq!(
            stack.add_source("borders", features()),
            Err(SurfaceError::DuplicateSource("borders".into()))
        );

        let layer = LayerDescriptor::new("x", "nope", LayerKind::Fill { opacity: 1.0 });
        assert!(matches!(
            stack.add_layer(layer, None),
            Err(SurfaceError::UnknownSource { .. })
        ));

        let layer = LayerDescriptor::new("x", "borders", LayerKind::Fill { opacity: 1.0 });
        stack.add_layer(layer.clone(), None).unwrap();
        assert_eq!(stack.add_layer(layer, None), Err(SurfaceError::DuplicateLayer("x".into())));
    }

    #[test]
    fn test_remove() {
        let mut stack = LayerStack::new();
        stack.add_source("s", features()).unwrap();
        stack
            .add_layer(LayerDescriptor::new("l", "s", LayerKind::Fill { opacity: 1.0 }), None)
            .unwrap();
        stack.remove_layer("l");
        stack.remove_source("s");
        assert!(!stack.has_layer("l"));
        assert!(!stack.has_source("s"));
        // Removing twice is a no-op
        stack.remove_layer("l");
        stack.remove_source("s");
        assert!(stack.layers().is_empty());
    }
}
