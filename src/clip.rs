use crate::error::ClipError;
use crate::geo::{clamp_lat, GeoBoundingBox};
use crate::image_cache::ImageRecord;
use crate::map::projection::project;
use tiny_skia::{FillRule, Mask, PathBuilder, Pixmap, PixmapPaint, Transform};

/// A flag raster masked to one ring, plus where it goes on the map
pub struct RasterResult {
    pub raster: Pixmap,
    /// Top-left, top-right, bottom-right, bottom-left (lon, lat)
    pub corners: [(f64, f64); 4],
}

/// Map ring vertices into canvas pixels, with the ring's projected bounding
/// box stretched over a `width` x `height` canvas.
///
/// A degenerate box yields non-finite coordinates.
pub fn canvas_path(ring: &[(f64, f64)], bbox: &GeoBoundingBox, width: u32, height: u32) -> Vec<(f32, f32)> {
    let top_left = project(bbox.min_lon, bbox.max_lat);
    let bottom_right = project(bbox.max_lon, bbox.min_lat);
    let span = bottom_right - top_left;

    ring.iter()
        .map(|&(lon, lat)| {
            let p = project(lon, clamp_lat(lat));
            let x = (p.x - top_left.x) / span.x * width as f64;
            let y = (p.y - top_left.y) / span.y * height as f64;
            (x as f32, y as f32)
        })
        .collect()
}

/// Even-odd coverage mask for a closed canvas path; `None` when nothing can be filled
fn clip_mask(points: &[(f32, f32)], width: u32, height: u32) -> Option<Mask> {
    let (&(x0, y0), rest) = points.split_first()?;
    if rest.len() < 2 {
        return None;
    }

    let mut pb = PathBuilder::new();
    pb.move_to(x0, y0);
    for &(x, y) in rest {
        pb.line_to(x, y);
    }
    pb.close();
    let path = pb.finish()?;

    let mut mask = Mask::new(width, height)?;
    mask.fill_path(&path, FillRule::EvenOdd, true, Transform::identity());
    Some(mask)
}

/// Clip `image` to the shape of `ring`.
///
/// The canvas has the image's own pixel size and the image is stretched over
/// the ring's bounding box, so the flag's aspect ratio is not preserved.
/// Rings with fewer than 3 points or a degenerate box produce a fully
/// transparent raster.
pub fn clip(image: &ImageRecord, ring: &[(f64, f64)]) -> Result<RasterResult, ClipError> {
    let bbox = GeoBoundingBox::of_ring(ring);
    let (width, height) = (image.width, image.height);

    let mut raster = Pixmap::new(width, height).ok_or(ClipError::Canvas { width, height })?;
    let path = canvas_path(ring, &bbox, width, height);

    if let Some(mask) = clip_mask(&path, width, height) {
        raster.draw_pixmap(
            0,
            0,
            image.pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            Some(&mask),
        );
    }

    Ok(RasterResult {
        raster,
        corners: bbox.corners(),
    })
}
