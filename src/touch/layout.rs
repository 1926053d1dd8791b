/// Honeycomb layout - where each pad sits on screen
/// Odd rows are pushed right by half a hexagon so the rows interlock
use super::geometry::{Point, Rect};
use crate::pitch::GridConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoneycombLayout {
    pub num_cols: usize,
    pub num_rows: usize,
    /// Bounding box of one hexagon before clipping
    pub hex_width: f32,
    pub hex_height: f32,
    pub spacing: f32,
    pub origin: Point,
}

impl HoneycombLayout {
    pub fn new(grid: &GridConfig, hex_size: f32, spacing: f32) -> Self {
        Self {
            num_cols: grid.num_cols,
            num_rows: grid.num_rows,
            hex_width: hex_size,
            hex_height: hex_size,
            spacing,
            origin: Point::default(),
        }
    }

    pub fn with_origin(mut self, origin: Point) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.hex_width *= scale;
        self.hex_height *= scale;
        self.spacing *= scale;
        self
    }

    /// Flat-to-flat width of a pointy-top hexagon inside the bounding box
    pub fn column_width(&self) -> f32 {
        (self.hex_width / 2.0) * (std::f32::consts::PI / 6.0).cos() * 2.0
    }

    /// Rows overlap by a quarter hexagon vertically
    pub fn row_height(&self) -> f32 {
        self.hex_height * 0.75
    }

    pub fn is_offset_row(&self, row: usize) -> bool {
        row % 2 == 1
    }

    /// Number of cells, or None when the dimensions overflow
    pub fn num_cells(&self) -> Option<usize> {
        self.num_cols.checked_mul(self.num_rows)
    }

    /// Hit region of the cell at `index`, or None outside the grid
    pub fn region(&self, index: usize) -> Option<Rect> {
        if self.num_cols == 0 || index >= self.num_cells()? {
            return None;
        }

        let row = index / self.num_cols;
        let col = index % self.num_cols;

        let column_width = self.column_width();
        let shift = if self.is_offset_row(row) {
            column_width / 2.0 + self.spacing / 2.0
        } else {
            0.0
        };

        Some(Rect::new(
            self.origin.x + col as f32 * (column_width + self.spacing) + shift,
            self.origin.y + row as f32 * (self.row_height() + self.spacing),
            column_width,
            self.row_height(),
        ))
    }

    pub fn regions(&self) -> impl Iterator<Item = (usize, Rect)> + '_ {
        (0..self.num_cells().unwrap_or(0))
            .filter_map(move |index| self.region(index).map(|rect| (index, rect)))
    }

    /// Size of the area covered by every region
    pub fn total_size(&self) -> (f32, f32) {
        let column_width = self.column_width();
        let width = self.num_cols as f32 * (column_width + self.spacing)
            + if self.num_rows > 1 {
                column_width / 2.0 + self.spacing / 2.0
            } else {
                0.0
            };
        let height = self.num_rows as f32 * (self.row_height() + self.spacing);
        (width, height)
    }

    /// Six corners of the drawn hexagon for a region, pointy side up
    pub fn hexagon(&self, region: &Rect) -> [Point; 6] {
        let center = region.center();
        let radius = self.hex_width.min(self.hex_height) / 2.0;
        let mut corners = [Point::default(); 6];
        for (i, corner) in corners.iter_mut().enumerate() {
            let angle = (i as f32 * 60.0 + 90.0).to_radians();
            *corner = Point::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            );
        }
        corners
    }
}

impl Default for HoneycombLayout {
    fn default() -> Self {
        Self::new(&GridConfig::default(), 75.0, 5.0)
    }
}
