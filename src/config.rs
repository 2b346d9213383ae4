use clap::Parser;
use std::path::PathBuf;

pub const MIN_YEAR: i32 = 2020;
pub const MAX_YEAR: i32 = 2025;
pub const DEFAULT_YEAR: i32 = 2025;
pub const DEFAULT_RANK: u8 = 1;

/// Opacity of every flag overlay
pub const OVERLAY_OPACITY: f32 = 0.85;

/// Source holding the border features
pub const BORDERS_SOURCE: &str = "borders";
/// Invisible fill layer used for hover hit-testing
pub const FILL_LAYER: &str = "country-fills";
/// Border line layer; flag overlays are inserted below it
pub const BORDER_LAYER: &str = "country-borders";

pub const DEFAULT_DATASET_FILE: &str = "duo-data.csv";
pub const DEFAULT_BORDERS_FILE: &str = "ne_110m_admin_0_countries.geojson";

#[derive(Parser, Debug, Clone)]
#[command(name = "flag-map", about = "World map tinted with the flag of each country's most-spoken language")]
pub struct Args {
    /// Directory holding the dataset, the borders and the flags/ folder
    #[arg(long, env = "FLAG_MAP_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Language dataset CSV, relative to the data directory
    #[arg(long, env = "FLAG_MAP_DATASET", default_value = DEFAULT_DATASET_FILE)]
    pub dataset: PathBuf,

    /// Country borders GeoJSON, relative to the data directory
    #[arg(long, env = "FLAG_MAP_BORDERS", default_value = DEFAULT_BORDERS_FILE)]
    pub borders: PathBuf,

    /// Initial view as a query string, e.g. "year=2023&rank=2"
    #[arg(long, env = "FLAG_MAP_QUERY", default_value = "")]
    pub query: String,

    /// Log file (the terminal is taken by the map)
    #[arg(long, env = "FLAG_MAP_LOG", default_value = "flag-map.log")]
    pub log: PathBuf,
}

impl Args {
    pub fn dataset_path(&self) -> PathBuf {
        self.data_dir.join(&self.dataset)
    }

    pub fn borders_path(&self) -> PathBuf {
        self.data_dir.join(&self.borders)
    }
}
