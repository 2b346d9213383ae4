use crate::canvas::{blend, PixelCanvas, Rgb};
use crate::data::Country;
use crate::error::SurfaceError;
use crate::geo::GeoBoundingBox;
use crate::map::geometry::draw_ring;
use crate::map::projection::{project, Viewport};
use crate::map::surface::{LayerDescriptor, LayerKind, LayerStack, MapSurface, SourceDescriptor};
use std::sync::Arc;
use tiny_skia::Pixmap;

pub const OCEAN: Rgb = [14, 22, 38];
pub const LAND: Rgb = [70, 74, 82];

/// Pointer over one or more features of a hit-test layer
#[derive(Clone, Debug, PartialEq)]
pub struct HoverEvent {
    pub features: Vec<String>,
    /// Terminal column and row
    pub pointer: (u16, u16),
}

/// A raster layer ready for per-pixel sampling
struct PlacedRaster {
    raster: Arc<Pixmap>,
    bbox: GeoBoundingBox,
    top_y: f64,
    bottom_y: f64,
    opacity: f32,
}

impl PlacedRaster {
    fn new(raster: &Arc<Pixmap>, corners: &[(f64, f64); 4], opacity: f32) -> Self {
        let [(min_lon, max_lat), _, (max_lon, min_lat), _] = *corners;
        Self {
            raster: raster.clone(),
            bbox: GeoBoundingBox {
                min_lon,
                min_lat,
                max_lon,
                max_lat,
            },
            top_y: project(0.0, max_lat).y,
            bottom_y: project(0.0, min_lat).y,
            opacity,
        }
    }

    /// Sample the raster at (lon, lat) and blend it over `dst`
    fn shade(&self, lon: f64, lat: f64, dst: Rgb) -> Rgb {
        if self.bbox.is_degenerate() || !self.bbox.contains(lon, lat) {
            return dst;
        }
        let w = self.raster.width();
        let h = self.raster.height();
        let u = (lon - self.bbox.min_lon) / (self.bbox.max_lon - self.bbox.min_lon) * w as f64;
        let v = (project(0.0, lat).y - self.top_y) / (self.bottom_y - self.top_y) * h as f64;

        let x = (u.max(0.0) as u32).min(w.saturating_sub(1));
        let y = (v.max(0.0) as u32).min(h.saturating_sub(1));
        match self.raster.pixel(x, y) {
            Some(px) if px.alpha() > 0 => {
                let c = px.demultiply();
                let alpha = c.alpha() as f32 / 255.0 * self.opacity;
                blend(dst, [c.red(), c.green(), c.blue()], alpha)
            }
            _ => dst,
        }
    }
}

/// Filled countries for a visible fill layer
struct PlacedFill {
    countries: Arc<Vec<Country>>,
    bboxes: Vec<GeoBoundingBox>,
    opacity: f32,
}

impl PlacedFill {
    fn new(countries: &Arc<Vec<Country>>, opacity: f32) -> Self {
        let bboxes = countries
            .iter()
            .map(|c| GeoBoundingBox::of_ring(&c.polygons.concat()))
            .collect();
        Self {
            countries: countries.clone(),
            bboxes,
            opacity,
        }
    }

    fn shade(&self, lon: f64, lat: f64, dst: Rgb) -> Rgb {
        let hit = self
            .countries
            .iter()
            .zip(&self.bboxes)
            .any(|(country, bbox)| bbox.contains(lon, lat) && country.contains(lon, lat));
        if hit {
            blend(dst, LAND, self.opacity)
        } else {
            dst
        }
    }
}

enum Placed {
    Raster(PlacedRaster),
    Fill(PlacedFill),
}

/// Map surface drawn into the terminal.
///
/// Owns the camera (pan/zoom) and the layer stack; the render pipeline only
/// touches it through [`MapSurface`].
pub struct TerminalSurface {
    stack: LayerStack,
    pub viewport: Viewport,
}

impl TerminalSurface {
    /// Surface covering `cols` x `rows` character cells
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            stack: LayerStack::new(),
            viewport: Viewport::world(cols, rows * 2),
        }
    }

    pub fn resize(&mut self, cols: usize, rows: usize) {
        self.viewport.width = cols;
        self.viewport.height = rows * 2;
    }

    pub fn stack(&self) -> &LayerStack {
        &self.stack
    }

    /// Number of raster layers currently placed
    #[cfg(test)]
    pub fn raster_layer_count(&self) -> usize {
        self.stack
            .layers()
            .iter()
            .filter(|l| matches!(l.kind, LayerKind::Raster { .. }))
            .count()
    }

    /// Composite every layer, bottom to top, into a canvas of `cols` x `rows` cells
    pub fn render(&self, cols: usize, rows: usize) -> PixelCanvas {
        let mut viewport = self.viewport.clone();
        viewport.width = cols;
        viewport.height = rows * 2;

        let mut canvas = PixelCanvas::new(cols, rows, OCEAN);

        // Area layers first, sampled per pixel
        let placed: Vec<Placed> = self
            .stack
            .layers()
            .iter()
            .filter_map(|layer| match (layer.kind, self.stack.source(&layer.source)?) {
                (LayerKind::Raster { opacity }, SourceDescriptor::Image { raster, corners }) => {
                    Some(Placed::Raster(PlacedRaster::new(raster, corners, opacity)))
                }
                (LayerKind::Fill { opacity }, SourceDescriptor::Features(countries)) if opacity > 0.0 => {
                    Some(Placed::Fill(PlacedFill::new(countries, opacity)))
                }
                _ => None,
            })
            .collect();

        if !placed.is_empty() {
            canvas.shade_rows(|x, y, bg| {
                let (lon, lat) = viewport.unproject(x as f64 + 0.5, y as f64 + 0.5);
                placed.iter().fold(bg, |color, item| match item {
                    Placed::Raster(r) => r.shade(lon, lat, color),
                    Placed::Fill(f) => f.shade(lon, lat, color),
                })
            });
        }

        // Then line layers on top
        for layer in self.stack.layers() {
            if let (LayerKind::Line { color }, Some(SourceDescriptor::Features(countries))) =
                (layer.kind, self.stack.source(&layer.source))
            {
                for country in countries.iter() {
                    for ring in &country.polygons {
                        draw_ring(&mut canvas, ring, &viewport, color);
                    }
                }
            }
        }

        canvas
    }

    /// Features of a fill layer under terminal cell (col, row); `None` means the pointer left
    pub fn hover(&self, layer_id: &str, col: u16, row: u16) -> Option<HoverEvent> {
        let layer = self.stack.layer(layer_id)?;
        let LayerKind::Fill { .. } = layer.kind else {
            return None;
        };
        let Some(SourceDescriptor::Features(countries)) = self.stack.source(&layer.source) else {
            return None;
        };

        let (lon, lat) = self
            .viewport
            .unproject(col as f64 + 0.5, row as f64 * 2.0 + 1.0);
        let features: Vec<String> = countries
            .iter()
            .filter(|c| c.contains(lon, lat))
            .map(|c| c.display_name().to_string())
            .collect();

        if features.is_empty() {
            None
        } else {
            Some(HoverEvent {
                features,
                pointer: (col, row),
            })
        }
    }
}

impl MapSurface for TerminalSurface {
    fn add_source(&mut self, id: &str, source: SourceDescriptor) -> Result<(), SurfaceError> {
        self.stack.add_source(id, source)
    }

    fn add_layer(&mut self, layer: LayerDescriptor, before_id: Option<&str>) -> Result<(), SurfaceError> {
        self.stack.add_layer(layer, before_id)
    }

    fn remove_layer(&mut self, id: &str) {
        self.stack.remove_layer(id);
    }

    fn remove_source(&mut self, id: &str) {
        self.stack.remove_source(id);
    }

    fn has_layer(&self, id: &str) -> bool {
        self.stack.has_layer(id)
    }

    fn has_source(&self, id: &str) -> bool {
        self.stack.has_source(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::solid_image;

    const WHITE: Rgb = [255, 255, 255];

    fn square(lon: f64, lat: f64, size: f64) -> Country {
        Country {
            name: Some(format!("sq{lon}")),
            polygons: vec![vec![(lon, lat), (lon + size, lat), (lon + size, lat + size), (lon, lat + size)]],
        }
    }

    /// 40x20 cells centered on (0, 0) at zoom 1
    fn surface() -> TerminalSurface {
        let mut s = TerminalSurface::new(40, 20);
        s.viewport = Viewport::new(0.0, 0.0, 1.0, 40, 40);
        s
    }

    #[test]
    fn test_raster_layer_is_composited() {
        let mut s = surface();
        let red = solid_image(4, 4, [255, 0, 0]).pixmap;
        s.add_source(
            "flag",
            SourceDescriptor::Image {
                raster: Arc::new(red),
                corners: [(-90.0, 60.0), (90.0, 60.0), (90.0, -60.0), (-90.0, -60.0)],
            },
        )
        .unwrap();
        s.add_layer(LayerDescriptor::new("flag", "flag", LayerKind::Raster { opacity: 1.0 }), None)
            .unwrap();

        let canvas = s.render(40, 20);
        // Center of the map is covered, the far west edge is ocean
        assert_eq!(canvas.pixel(20, 20), Some([255, 0, 0]));
        assert_eq!(canvas.pixel(0, 20), Some(OCEAN));
        assert_eq!(s.raster_layer_count(), 1);
    }

    #[test]
    fn test_raster_opacity_blends() {
        let mut s = surface();
        let white = solid_image(2, 2, WHITE).pixmap;
        s.add_source(
            "flag",
            SourceDescriptor::Image {
                raster: Arc::new(white),
                corners: [(-90.0, 60.0), (90.0, 60.0), (90.0, -60.0), (-90.0, -60.0)],
            },
        )
        .unwrap();
        s.add_layer(LayerDescriptor::new("flag", "flag", LayerKind::Raster { opacity: 0.85 }), None)
            .unwrap();

        let px = s.render(40, 20).pixel(20, 20).unwrap();
        assert_eq!(px, blend(OCEAN, WHITE, 0.85));
    }

    #[test]
    fn test_border_lines_drawn() {
        let mut s = surface();
        let countries = Arc::new(vec![square(-45.0, -30.0, 90.0)]);
        s.add_source("borders", SourceDescriptor::Features(countries)).unwrap();
        s.add_layer(LayerDescriptor::new("lines", "borders", LayerKind::Line { color: WHITE }), None)
            .unwrap();

        let canvas = s.render(40, 20);
        let (x, y) = s.viewport.project(-45.0, 0.0);
        assert_eq!(canvas.pixel(x as usize, y as usize), Some(WHITE));
        assert_eq!(canvas.pixel(20, 20), Some(OCEAN));
    }

    #[test]
    fn test_hover_reports_features() {
        let mut s = surface();
        let countries = Arc::new(vec![square(-45.0, -30.0, 90.0), square(100.0, 0.0, 10.0)]);
        s.add_source("borders", SourceDescriptor::Features(countries)).unwrap();
        s.add_layer(LayerDescriptor::new("fills", "borders", LayerKind::Fill { opacity: 0.0 }), None)
            .unwrap();

        let event = s.hover("fills", 20, 10).unwrap();
        assert_eq!(event.features, vec!["sq-45".to_string()]);
        assert_eq!(event.pointer, (20, 10));

        // Ocean: pointer left every feature
        assert_eq!(s.hover("fills", 0, 0), None);
        // Unknown layer
        assert_eq!(s.hover("nope", 20, 10), None);
    }
}
