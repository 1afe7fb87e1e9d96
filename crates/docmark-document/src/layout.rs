/// Index footprint the service assigns to a freshly inserted, empty table.
///
/// The table start, every row start, and every cell start each occupy one
/// unit, and an empty cell holds a single paragraph terminator. Cell offsets
/// are therefore known from the shape alone, before any cell is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    pub rows: usize,
    pub cols: usize,
}

impl TableLayout {
    pub const TABLE_OPEN: usize = 1;
    pub const ROW_OPEN: usize = 1;
    pub const CELL_OPEN: usize = 1;
    pub const EMPTY_CELL: usize = 1;

    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    fn row_len(&self) -> usize {
        Self::ROW_OPEN + self.cols * (Self::CELL_OPEN + Self::EMPTY_CELL)
    }

    /// Units occupied by the table before any cell text is written.
    pub fn empty_len(&self) -> usize {
        Self::TABLE_OPEN + self.rows * self.row_len()
    }

    /// Index where text for cell `(row, col)` goes in an empty table that
    /// starts at `table_start`.
    pub fn cell_index(&self, table_start: usize, row: usize, col: usize) -> usize {
        table_start
            + Self::TABLE_OPEN
            + row * self.row_len()
            + Self::ROW_OPEN
            + col * (Self::CELL_OPEN + Self::EMPTY_CELL)
            + Self::CELL_OPEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_indices_follow_fixed_overhead() {
        let layout = TableLayout::new(2, 2);
        assert_eq!(layout.empty_len(), 11);
        assert_eq!(layout.cell_index(10, 0, 0), 13);
        assert_eq!(layout.cell_index(10, 0, 1), 15);
        assert_eq!(layout.cell_index(10, 1, 0), 18);
        assert_eq!(layout.cell_index(10, 1, 1), 20);
        assert!(layout.cell_index(10, 1, 1) < 10 + layout.empty_len());
    }
}
