mod input;
mod rendering;

use ratatui::layout::Rect;

use weft_core::coords::CanvasSize;
use weft_core::input::PointerEngine;

/// Terminal view of the sequencer grid. Mouse cells are projected onto the
/// core's fixed logical canvas, so all gesture math runs in canvas pixels
/// and is independent of the terminal size.
pub struct GridPane {
    canvas: CanvasSize,
    pub(crate) pointer: PointerEngine,
    /// Grid area of the last render, for mouse hit mapping.
    grid_area: Rect,
}

impl GridPane {
    pub fn new() -> Self {
        let canvas = CanvasSize::default();
        Self {
            canvas,
            pointer: PointerEngine::new(canvas),
            grid_area: Rect::new(0, 0, 80, 24),
        }
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    /// Center of a terminal cell in logical canvas pixels, or None when the
    /// cell is outside the grid area.
    pub(crate) fn cell_to_px(&self, column: u16, row: u16) -> Option<(f32, f32)> {
        let area = self.grid_area;
        if area.width == 0
            || area.height == 0
            || column < area.x
            || column >= area.x + area.width
            || row < area.y
            || row >= area.y + area.height
        {
            return None;
        }
        let fx = (column - area.x) as f32 + 0.5;
        let fy = (row - area.y) as f32 + 0.5;
        Some((
            fx / area.width as f32 * self.canvas.width,
            fy / area.height as f32 * self.canvas.height,
        ))
    }
}

impl Default for GridPane {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_mapping_covers_the_canvas() {
        let mut pane = GridPane::new();
        pane.grid_area = Rect::new(2, 1, 80, 20);
        let (x0, y0) = pane.cell_to_px(2, 1).unwrap();
        let (x1, y1) = pane.cell_to_px(81, 20).unwrap();
        assert!(x0 > 0.0 && y0 > 0.0);
        assert!(x1 < pane.canvas.width && y1 < pane.canvas.height);
        assert!(pane.cell_to_px(82, 5).is_none());
        assert!(pane.cell_to_px(1, 5).is_none());
    }
}
