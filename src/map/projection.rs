use glam::DVec2;
use std::f64::consts::PI;

/// Earth radius used by spherical Mercator, in meters
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Half the projected world width in meters
const HALF_WORLD: f64 = PI * EARTH_RADIUS;

/// Spherical Mercator projection to meters. `y` grows northward.
///
/// Latitude must already be clamped by the caller; the poles map to ±infinity.
#[inline(always)]
pub fn project(lon: f64, lat: f64) -> DVec2 {
    const DEG: f64 = PI / 180.0;
    let sin = (lat * DEG).sin();
    let x = EARTH_RADIUS * lon * DEG;
    let y = EARTH_RADIUS * ((1.0 + sin) / (1.0 - sin)).ln() / 2.0;
    DVec2::new(x, y)
}

/// Normalized Web Mercator coordinates: x in [0, 1] west→east, y in [0, 1] north→south
#[inline(always)]
fn normalized(lon: f64, lat: f64) -> DVec2 {
    let p = project(lon, lat);
    DVec2::new(0.5 + p.x / (2.0 * HALF_WORLD), 0.5 - p.y / (2.0 * HALF_WORLD))
}

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (clamped to the Mercator range)
    pub center_lat: f64,
    /// Zoom level (higher = more zoomed in)
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub const MIN_ZOOM: f64 = 1.0;
    pub const MAX_ZOOM: f64 = 256.0;

    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            width,
            height,
        }
    }

    /// Initial world view, centered slightly north like the web map
    pub fn world(width: usize, height: usize) -> Self {
        Self::new(0.0, 20.0, 1.5, width, height)
    }

    /// Pixels per normalized world unit
    fn scale(&self) -> f64 {
        self.zoom * self.width.max(1) as f64
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let center = normalized(self.center_lon, self.center_lat);
        let x = center.x + dx as f64 / self.scale();
        let y = (center.y + dy as f64 / self.scale()).clamp(0.0, 1.0);
        let (lon, lat) = Self::denormalize(x, y);

        self.center_lon = lon;
        // Wrap longitude
        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }
        self.center_lat = crate::geo::clamp_lat(lat);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(Self::MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(Self::MIN_ZOOM);
    }

    /// Zoom by factor keeping the point under (px, py) fixed
    pub fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px as f64, py as f64);
        self.zoom = (self.zoom * factor).clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);

        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    fn denormalize(x: f64, y: f64) -> (f64, f64) {
        let lon = x * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
        (lon, lat)
    }

    /// Unproject a (sub)pixel position back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: f64, py: f64) -> (f64, f64) {
        let center = normalized(self.center_lon, self.center_lat);
        let x = (px - self.width as f64 / 2.0) / self.scale() + center.x;
        let y = (py - self.height as f64 / 2.0) / self.scale() + center.y;
        Self::denormalize(x, y)
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let p = normalized(lon, crate::geo::clamp_lat(lat));
        let center = normalized(self.center_lon, self.center_lat);

        let px = ((p.x - center.x) * self.scale() + self.width as f64 / 2.0) as i32;
        let py = ((p.y - center.y) * self.scale() + self.height as f64 / 2.0) as i32;
        (px, py)
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_origin() {
        let p = project(0.0, 0.0);
        assert_eq!(p, DVec2::ZERO);
    }

    #[test]
    fn test_project_reference_point() {
        // 180° east maps to half the equator length
        let p = project(180.0, 0.0);
        assert!((p.x - HALF_WORLD).abs() < 1e-6);

        // At the Mercator limit the map is square
        let top = project(0.0, crate::geo::MAX_LAT);
        assert!((top.y - HALF_WORLD).abs() / HALF_WORLD < 1e-5);
    }

    #[test]
    fn test_project_monotonic() {
        let mut prev = project(-180.0, 30.0);
        for lon in (-179..=180).step_by(7) {
            let p = project(lon as f64, 30.0);
            assert!(p.x > prev.x);
            prev = p;
        }

        let mut prev = project(12.0, -85.0);
        for lat in (-84..=85).step_by(3) {
            let p = project(12.0, lat as f64);
            assert!(p.y > prev.y);
            prev = p;
        }
    }

    #[test]
    fn test_viewport_center() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        assert_eq!(vp.project(0.0, 0.0), (50, 50));
    }

    #[test]
    fn test_unproject_inverts_project() {
        let vp = Viewport::new(10.0, 20.0, 3.0, 200, 120);
        let (px, py) = vp.project(15.0, 25.0);
        let (lon, lat) = vp.unproject(px as f64, py as f64);
        assert!((lon - 15.0).abs() < 1.0);
        assert!((lat - 25.0).abs() < 1.0);
    }

    #[test]
    fn test_pan() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        vp.pan(10, 0);
        assert!(vp.center_lon > 0.0);
        vp.pan(0, -10);
        assert!(vp.center_lat > 0.0);
    }

    #[test]
    fn test_zoom_at_keeps_point_fixed() {
        let mut vp = Viewport::new(0.0, 0.0, 2.0, 200, 200);
        let before = vp.unproject(150.0, 60.0);
        vp.zoom_at(150, 60, 1.5);
        let after = vp.unproject(150.0, 60.0);
        assert!((before.0 - after.0).abs() < 2.0);
        assert!((before.1 - after.1).abs() < 2.0);
    }
}
