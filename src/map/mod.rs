pub mod geometry;
pub mod projection;
pub mod surface;
pub mod terminal;

pub use projection::Viewport;
pub use surface::{LayerDescriptor, LayerKind, LayerStack, MapSurface, SourceDescriptor};
pub use terminal::{HoverEvent, TerminalSurface};
