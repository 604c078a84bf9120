//! Zeichenfläche: Zielmaße für Fit-to-Window und Layout-Export.

use super::geometry::Rect;
use glam::Vec2;

/// Standard-Kantenlänge der Zeichenfläche.
pub const DEFAULT_CANVAS_SIZE: f32 = 1024.0;

/// Abmessungen der Zeichenfläche.
///
/// Wird beim Import aus dem `<dimensions>`-Element des Layout-Blocks
/// übernommen und beim Export wieder hinausgeschrieben.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Die Fläche als Rechteck mit Ursprung (0,0).
    pub fn bounds(&self) -> Rect {
        Rect::new(Vec2::ZERO, Vec2::new(self.width, self.height))
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_SIZE, DEFAULT_CANVAS_SIZE)
    }
}
