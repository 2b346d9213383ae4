use crate::app::{App, PassStatus};
use crate::canvas::PixelCanvas;
use crate::image_cache::ImageLoader;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};

/// Upper half block: foreground paints the top pixel, background the bottom one
const HALF_BLOCK: char = '▀';

/// Render the UI
pub fn render<L: ImageLoader>(frame: &mut Frame, app: &App<L>) {
    let area = frame.area();

    // Split into map area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_map(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
}

fn render_map<L: ImageLoader>(frame: &mut Frame, app: &App<L>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" Languages of the World · {} ", app.selection.year),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let canvas = app.surface().render(inner.width as usize, inner.height as usize);
    let tooltip = app.tooltip().zip(app.hover.as_ref().map(|h| h.pointer));

    frame.render_widget(MapWidget { canvas, tooltip }, inner);
}

/// Half-block map with the hover tooltip drawn over it
pub struct MapWidget {
    pub canvas: PixelCanvas,
    /// Tooltip lines and the cell (inside the map) the pointer is on
    pub tooltip: Option<((String, String), (u16, u16))>,
}

impl MapWidget {
    fn render_tooltip(&self, area: Rect, buf: &mut Buffer) {
        let Some(((title, detail), (col, row))) = &self.tooltip else {
            return;
        };

        let width = title.chars().count().max(detail.chars().count()) as u16 + 2;
        // Offset from the pointer, flipped to the other side near the edges
        let mut x = col + 2;
        if x + width > area.width {
            x = col.saturating_sub(width + 1);
        }
        let mut y = row + 1;
        if y + 2 > area.height {
            y = row.saturating_sub(2);
        }

        let title_style = Style::default()
            .fg(Color::White)
            .bg(Color::Black)
            .add_modifier(Modifier::BOLD);
        let detail_style = Style::default().fg(Color::Gray).bg(Color::Black);

        for (dy, (text, style)) in [(title, title_style), (detail, detail_style)].into_iter().enumerate() {
            let ty = y + dy as u16;
            if ty >= area.height {
                break;
            }
            let padded = format!(" {:<w$} ", text, w = width as usize - 2);
            for (i, ch) in padded.chars().enumerate() {
                let tx = x + i as u16;
                if tx >= area.width {
                    break;
                }
                buf[(area.x + tx, area.y + ty)].set_char(ch).set_style(style);
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            for col in 0..area.width {
                let Some((top, bottom)) = self.canvas.cell(col as usize, row as usize) else {
                    continue;
                };
                buf[(area.x + col, area.y + row)]
                    .set_char(HALF_BLOCK)
                    .set_fg(Color::Rgb(top[0], top[1], top[2]))
                    .set_bg(Color::Rgb(bottom[0], bottom[1], bottom[2]));
            }
        }

        self.render_tooltip(area, buf);
    }
}

fn render_status_bar<L: ImageLoader>(frame: &mut Frame, app: &App<L>, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);

    let (flags, flags_style) = match &app.status {
        PassStatus::Loading => ("loading flags…".to_string(), Style::default().fg(Color::Yellow)),
        PassStatus::Ready { skipped: 0, .. } => (
            format!("{} flags", app.coordinator().live_overlay_count()),
            Style::default().fg(Color::Green),
        ),
        PassStatus::Ready { skipped, .. } => (
            format!("{} flags, {skipped} skipped", app.coordinator().live_overlay_count()),
            Style::default().fg(Color::Yellow),
        ),
        PassStatus::Failed(message) => (message.clone(), Style::default().fg(Color::Red)),
    };

    let query = app.query();
    let status = Line::from(vec![
        Span::styled(" Year: ", dim),
        Span::styled(app.selection.year.to_string(), Style::default().fg(Color::Yellow)),
        Span::styled(" Rank: ", dim),
        Span::styled(format!("#{}", app.selection.rank), Style::default().fg(Color::Magenta)),
        Span::styled(" | ", dim),
        Span::styled(flags, flags_style),
        Span::styled(" | ", dim),
        Span::styled(format!("{} images", app.coordinator().cache().len()), dim),
        Span::styled(" | ", dim),
        Span::styled(
            if query.is_empty() { "?".to_string() } else { format!("?{query}") },
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(" | Zoom: ", dim),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" ", dim),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | [/]:year Home/End 1/2:rank hjkl:pan +/-:zoom q:quit", dim),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cells_use_half_blocks() {
        let mut canvas = PixelCanvas::new(3, 2, [0, 0, 0]);
        canvas.set_pixel(1, 0, [255, 0, 0]);
        canvas.set_pixel(1, 1, [0, 0, 255]);

        let area = Rect::new(0, 0, 3, 2);
        let mut buf = Buffer::empty(area);
        MapWidget { canvas, tooltip: None }.render(area, &mut buf);

        let cell = &buf[(1, 0)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(255, 0, 0));
        assert_eq!(cell.bg, Color::Rgb(0, 0, 255));
        assert_eq!(buf[(0, 1)].fg, Color::Rgb(0, 0, 0));
    }

    #[test]
    fn test_tooltip_is_drawn_next_to_pointer() {
        let canvas = PixelCanvas::new(30, 6, [0, 0, 0]);
        let area = Rect::new(0, 0, 30, 6);
        let mut buf = Buffer::empty(area);
        let tooltip = Some((("Spain".to_string(), "#1: Spanish".to_string()), (3, 1)));
        MapWidget { canvas, tooltip }.render(area, &mut buf);

        let row: String = (5..18).map(|x| buf[(x, 2)].symbol().to_string()).collect();
        assert_eq!(row, " Spain       ");
        let row: String = (5..18).map(|x| buf[(x, 3)].symbol().to_string()).collect();
        assert_eq!(row, " #1: Spanish ");
    }

    #[test]
    fn test_tooltip_flips_at_right_edge() {
        let canvas = PixelCanvas::new(20, 6, [0, 0, 0]);
        let area = Rect::new(0, 0, 20, 6);
        let mut buf = Buffer::empty(area);
        let tooltip = Some((("Peru".to_string(), "#2: N/A".to_string()), (18, 5)));
        MapWidget { canvas, tooltip }.render(area, &mut buf);

        // 9 wide, placed left of the pointer and above it
        let row: String = (8..17).map(|x| buf[(x, 3)].symbol().to_string()).collect();
        assert_eq!(row, " Peru    ");
    }
}
