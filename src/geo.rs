/// Largest latitude Web Mercator can represent without blowing up
pub const MAX_LAT: f64 = 85.0511;

/// A geographic ring (outer polygon boundary), closed implicitly
pub type Ring = Vec<(f64, f64)>;

/// Clamp latitude into the Mercator-safe range
#[inline(always)]
pub fn clamp_lat(lat: f64) -> f64 {
    lat.clamp(-MAX_LAT, MAX_LAT)
}

/// Geographic bounding box of one ring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBoundingBox {
    /// Bounding box of a ring with latitude clamped to ±MAX_LAT.
    /// An empty ring yields an inverted (infinite) box.
    pub fn of_ring(ring: &[(f64, f64)]) -> Self {
        let mut min_lon = f64::INFINITY;
        let mut min_lat = f64::INFINITY;
        let mut max_lon = f64::NEG_INFINITY;
        let mut max_lat = f64::NEG_INFINITY;

        for &(lon, lat) in ring {
            min_lon = min_lon.min(lon);
            min_lat = min_lat.min(lat);
            max_lon = max_lon.max(lon);
            max_lat = max_lat.max(lat);
        }

        Self {
            min_lon,
            min_lat: min_lat.max(-MAX_LAT),
            max_lon,
            max_lat: max_lat.min(MAX_LAT),
        }
    }

    /// Corners in image-placement order: top-left, top-right, bottom-right, bottom-left
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.min_lon, self.max_lat),
            (self.max_lon, self.max_lat),
            (self.max_lon, self.min_lat),
            (self.min_lon, self.min_lat),
        ]
    }

    #[inline(always)]
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.max_lon > self.min_lon && self.max_lat > self.min_lat)
    }
}

/// Even-odd point-in-ring test
pub fn ring_contains(ring: &[(f64, f64)], lon: f64, lat: f64) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}
