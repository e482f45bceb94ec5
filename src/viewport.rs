use ratatui::layout::Rect;

use crate::target::{PlayArea, Point};

/// Maps terminal cells of the rendered play rectangle onto logical play-area units
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub rect: Rect,
    pub play: PlayArea,
}

impl Viewport {
    pub fn new(rect: Rect, play: PlayArea) -> Self {
        Self { rect, play }
    }

    /// Logical width and height covered by one cell
    pub fn cell_size(&self) -> (f64, f64) {
        (
            self.play.width / f64::from(self.rect.width.max(1)),
            self.play.height / f64::from(self.rect.height.max(1)),
        )
    }

    /// Centre of the cell at `column`/`row`, or `None` outside the play rectangle
    pub fn to_logical(&self, column: u16, row: u16) -> Option<Point> {
        let inside = column >= self.rect.x
            && column < self.rect.right()
            && row >= self.rect.y
            && row < self.rect.bottom();
        if !inside {
            return None;
        }

        let (cell_w, cell_h) = self.cell_size();
        Some(Point::new(
            (f64::from(column - self.rect.x) + 0.5) * cell_w,
            (f64::from(row - self.rect.y) + 0.5) * cell_h,
        ))
    }

    /// Cell holding the logical `point`, clamped to the play rectangle
    pub fn to_cell(&self, point: Point) -> (u16, u16) {
        let (cell_w, cell_h) = self.cell_size();
        let max_col = self.rect.width.saturating_sub(1);
        let max_row = self.rect.height.saturating_sub(1);

        let col = ((point.x / cell_w).floor().max(0.0) as u16).min(max_col);
        let row = ((point.y / cell_h).floor().max(0.0) as u16).min(max_row);
        (self.rect.x + col, self.rect.y + row)
    }

    /// Slack added around each target so a click anywhere in a cell it touches counts
    pub fn hit_tolerance(&self) -> f64 {
        let (cell_w, cell_h) = self.cell_size();
        cell_w.max(cell_h) / 2.0
    }
}
