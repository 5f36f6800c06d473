/// Dashboard grid dimensions measured in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSize {
    pub cols: u16,
    pub rows: u16,
}

impl GridSize {
    /// Reference sizing used by the phone dashboard: 4 columns by 8 rows.
    pub const REFERENCE: GridSize = GridSize::new(4, 8);

    pub const fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }

    pub fn cell_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    pub fn contains_cell(&self, x: u16, y: u16) -> bool {
        x < self.cols && y < self.rows
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self::REFERENCE
    }
}

/// Rectangle of grid cells anchored at its top-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridRect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl GridRect {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x as u32 + self.width as u32
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y as u32 + self.height as u32
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn intersects(&self, other: &GridRect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        (self.x as u32) < other.right()
            && (other.x as u32) < self.right()
            && (self.y as u32) < other.bottom()
            && (other.y as u32) < self.bottom()
    }

    /// True when every cell of the rectangle lies inside `grid`.
    pub fn fits_within(&self, grid: GridSize) -> bool {
        !self.is_empty() && self.right() <= grid.cols as u32 && self.bottom() <= grid.rows as u32
    }

    /// Cells covered by the rectangle, row by row.
    pub fn cells(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        let (x0, y0) = (self.x as u32, self.y as u32);
        (y0..self.bottom())
            .flat_map(move |y| (x0..self.right()).map(move |x| (x, y)))
            .filter_map(|(x, y)| Some((u16::try_from(x).ok()?, u16::try_from(y).ok()?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_do_not_overflow() {
        let rect = GridRect::new(u16::MAX, 0, 2, 1);
        assert_eq!(rect.right(), u16::MAX as u32 + 2);
        assert!(!rect.fits_within(GridSize::REFERENCE));
    }

    #[test]
    fn touching_rects_do_not_intersect() {
        let a = GridRect::new(0, 0, 2, 1);
        let b = GridRect::new(2, 0, 2, 1);
        let c = GridRect::new(1, 0, 2, 1);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
        assert!(c.intersects(&b));
    }

    #[test]
    fn cells_walk_row_major() {
        let cells: Vec<_> = GridRect::new(1, 2, 2, 2).cells().collect();
        assert_eq!(cells, vec![(1, 2), (2, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn fits_within_respects_both_axes() {
        let grid = GridSize::new(4, 8);
        assert!(GridRect::new(0, 7, 4, 1).fits_within(grid));
        assert!(!GridRect::new(0, 7, 4, 2).fits_within(grid));
        assert!(!GridRect::new(3, 0, 2, 1).fits_within(grid));
        assert!(!GridRect::new(0, 0, 0, 1).fits_within(grid));
    }
}
