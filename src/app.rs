use crate::config::FILL_LAYER;
use crate::error::ImageLoadError;
use crate::image_cache::ImageLoader;
use crate::map::{HoverEvent, TerminalSurface};
use crate::render::{lock, Coordinator, PassOutcome};
use crate::selection::Selection;
use std::sync::MutexGuard;
use tracing::{debug, error, info};

/// Result of a spawned render pass, sent back to the event loop
pub type PassResult = Result<PassOutcome, ImageLoadError>;

/// Flag layer state shown in the status bar
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PassStatus {
    Loading,
    Ready { overlays: usize, skipped: usize },
    Failed(String),
}

/// Application state
pub struct App<L> {
    coordinator: Coordinator<TerminalSurface, L>,
    pub selection: Selection,
    pub hover: Option<HoverEvent>,
    pub status: PassStatus,
    /// Render passes spawned but not yet reported
    pub in_flight: usize,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
}

impl<L: ImageLoader> App<L> {
    pub fn new(coordinator: Coordinator<TerminalSurface, L>, selection: Selection) -> Self {
        Self {
            coordinator,
            selection,
            hover: None,
            status: PassStatus::Loading,
            in_flight: 0,
            should_quit: false,
            last_mouse: None,
        }
    }

    pub fn coordinator(&self) -> &Coordinator<TerminalSurface, L> {
        &self.coordinator
    }

    pub fn surface(&self) -> MutexGuard<'_, TerminalSurface> {
        lock(self.coordinator.surface())
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        // Border takes 2 columns and 2 rows, the status bar one more row
        let cols = width.saturating_sub(2) as usize;
        let rows = height.saturating_sub(3) as usize;
        self.surface().resize(cols, rows);
    }

    /// Pan the map by half-block pixels
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.surface().viewport.pan(dx, dy);
        self.hover = None;
    }

    pub fn zoom_in(&mut self) {
        self.surface().viewport.zoom_in();
        self.hover = None;
    }

    pub fn zoom_out(&mut self) {
        self.surface().viewport.zoom_out();
        self.hover = None;
    }

    /// Zoom keeping the point under a terminal cell fixed
    pub fn zoom_at(&mut self, col: u16, row: u16, factor: f64) {
        let (px, py) = to_pixel(col, row);
        self.surface().viewport.zoom_at(px, py, factor);
        self.hover = None;
    }

    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_col, last_row)) = self.last_mouse {
            let dx = last_col as i32 - col as i32;
            let dy = (last_row as i32 - row as i32) * 2;
            self.pan(dx, dy);
        }
        self.last_mouse = Some((col, row));
    }

    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    /// Hit-test the country fill layer under a terminal cell
    pub fn hover_at(&mut self, col: u16, row: u16) {
        let hover = match (col.checked_sub(1), row.checked_sub(1)) {
            (Some(c), Some(r)) => self.surface().hover(FILL_LAYER, c, r),
            _ => None,
        };
        self.hover = hover;
    }

    pub fn clear_hover(&mut self) {
        self.hover = None;
    }

    /// Tooltip for the hovered country: its name and the language at the current rank
    pub fn tooltip(&self) -> Option<(String, String)> {
        let hover = self.hover.as_ref()?;
        let name = hover.features.first()?;
        let language = self.coordinator.resolver().resolve(name, self.selection);
        Some((
            name.clone(),
            format!("#{}: {}", self.selection.rank, language.unwrap_or("N/A")),
        ))
    }

    /// Returns whether the selection changed and the flags need re-rendering
    pub fn set_year(&mut self, year: i32) -> bool {
        if !Selection::valid_year(year) || year == self.selection.year {
            return false;
        }
        self.selection.year = year;
        true
    }

    pub fn step_year(&mut self, delta: i32) -> bool {
        self.selection.step_year(delta)
    }

    pub fn set_rank(&mut self, rank: u8) -> bool {
        self.selection.set_rank(rank)
    }

    /// Mark a pass as started and hand out the selection it should render
    pub fn begin_pass(&mut self) -> Selection {
        self.in_flight += 1;
        self.status = PassStatus::Loading;
        self.selection
    }

    /// Record the outcome of a finished pass
    pub fn finish_pass(&mut self, result: PassResult) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match result {
            Ok(PassOutcome::Committed {
                generation,
                overlays,
                skipped,
            }) => {
                info!(generation, overlays, skipped, query = %self.query(), "flags rendered");
                self.status = PassStatus::Ready { overlays, skipped };
            }
            Ok(PassOutcome::Superseded { generation }) => {
                debug!(generation, "pass superseded");
            }
            Err(err) => {
                error!(url = err.url(), error = %err, "flag rendering failed");
                self.status = PassStatus::Failed(err.to_string());
            }
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Shareable query string for the current view
    pub fn query(&self) -> String {
        self.selection.to_query()
    }

    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.surface().viewport.zoom)
    }

    pub fn center_coords(&self) -> String {
        let surface = self.surface();
        let viewport = &surface.viewport;
        format!(
            "{:.1}°{}, {:.1}°{}",
            viewport.center_lat.abs(),
            if viewport.center_lat >= 0.0 { "N" } else { "S" },
            viewport.center_lon.abs(),
            if viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }
}

/// Terminal cell → half-block pixel inside the map border
fn to_pixel(col: u16, row: u16) -> (i32, i32) {
    (col.saturating_sub(1) as i32, row.saturating_sub(1) as i32 * 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Country, LanguageTable};
    use crate::image_cache::ImageCache;
    use crate::map::Viewport;
    use crate::resolver::Resolver;
    use crate::test_support::TestLoader;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::sync::{Arc, Mutex};

    const CSV: &str = "\
country,pop1_2024,pop2_2024,pop1_2025,pop2_2025
USA,English,Spanish,English,Spanish
";

    fn app() -> App<TestLoader> {
        let countries = vec![Country {
            name: Some("United States of America".into()),
            polygons: vec![vec![(-60.0, -40.0), (60.0, -40.0), (60.0, 40.0), (-60.0, 40.0)]],
        }];
        let coordinator = Coordinator::new(
            Arc::new(ImageCache::new(TestLoader::new())),
            Arc::new(Mutex::new(TerminalSurface::new(40, 20))),
            Arc::new(Resolver::new(LanguageTable::from_reader(CSV.as_bytes()).unwrap())),
            Arc::new(countries),
        );
        coordinator.install_base_layers().unwrap();

        let mut app = App::new(coordinator, Selection::default());
        app.resize(42, 23);
        app.surface().viewport = Viewport::new(0.0, 0.0, 1.0, 40, 40);
        app
    }

    #[test]
    fn test_resize_accounts_for_border_and_status_bar() {
        let mut app = app();
        app.resize(82, 33);
        let surface = app.surface();
        assert_eq!((surface.viewport.width, surface.viewport.height), (80, 60));
    }

    #[test]
    fn test_tooltip_follows_rank() {
        let mut app = app();
        app.hover_at(21, 11);
        assert_eq!(
            app.tooltip(),
            Some(("United States of America".to_string(), "#1: English".to_string()))
        );

        assert!(app.set_rank(2));
        assert_eq!(app.tooltip().map(|(_, line)| line).as_deref(), Some("#2: Spanish"));

        app.set_year(2024);
        app.selection.year = 2020;
        assert_eq!(app.tooltip().map(|(_, line)| line).as_deref(), Some("#2: N/A"));
    }

    #[test]
    fn test_hover_off_land_and_on_border() {
        let mut app = app();
        app.hover_at(1, 1);
        assert_eq!(app.hover, None);
        app.hover_at(0, 5);
        assert_eq!(app.hover, None);
        assert_eq!(app.tooltip(), None);
    }

    #[test]
    fn test_selection_changes() {
        let mut app = app();
        assert!(!app.set_year(2025));
        assert!(!app.set_year(1999));
        assert!(app.set_year(2023));
        assert_eq!(app.query(), "year=2023");

        assert!(!app.set_rank(3));
        assert!(!app.set_rank(1));
        assert!(app.set_rank(2));
        assert_eq!(app.query(), "year=2023&rank=2");

        assert!(app.step_year(2));
        assert!(!app.step_year(1));
        assert_eq!(app.selection.year, 2025);
    }

    #[test]
    fn test_zoom_and_pan_clear_hover() {
        let mut app = app();
        app.hover_at(21, 11);
        assert!(app.hover.is_some());

        app.zoom_in();
        assert!(app.hover.is_none());
        assert_eq!(app.zoom_level(), "1.5x");

        let before = app.surface().viewport.center_lon;
        app.handle_drag(20, 10);
        app.handle_drag(10, 10);
        app.end_drag();
        assert!(app.surface().viewport.center_lon > before);
        assert_eq!(app.last_mouse, None);
    }

    #[tokio::test]
    async fn test_pass_results_update_status() {
        let mut app = app();
        let selection = app.begin_pass();
        assert_eq!(app.in_flight, 1);
        assert_eq!(app.status, PassStatus::Loading);

        let result = app.coordinator().render_pass(selection).await;
        app.finish_pass(result);
        assert_eq!(app.in_flight, 0);
        assert_eq!(
            app.status,
            PassStatus::Ready {
                overlays: 1,
                skipped: 0
            }
        );
        assert_eq!(app.surface().raster_layer_count(), 1);

        app.begin_pass();
        app.finish_pass(Ok(PassOutcome::Superseded { generation: 1 }));
        assert_eq!(app.status, PassStatus::Loading);

        app.finish_pass(Err(ImageLoadError::Empty {
            url: "./flags/gb.png".into(),
        }));
        assert_eq!(app.in_flight, 0);
        assert!(matches!(app.status, PassStatus::Failed(ref msg) if msg.contains("gb.png")));
    }

    #[tokio::test]
    async fn test_status_bar_shows_live_flag_count() {
        let mut app = app();
        let selection = app.begin_pass();
        let result = app.coordinator().render_pass(selection).await;
        app.finish_pass(result);

        let mut terminal = Terminal::new(TestBackend::new(120, 23)).unwrap();
        terminal.draw(|frame| crate::ui::render(frame, &app)).unwrap();
        let buffer = terminal.backend().buffer();
        let status: String = (0..120).map(|x| buffer[(x, 22)].symbol().to_string()).collect();
        assert!(status.contains("| 1 flags |"), "{status}");
    }
}
