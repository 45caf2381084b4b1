//! Occupancy-matrix bookkeeping for merged table cells.
//!
//! Building places physical cells (as they appear in HTML or OOXML rows) onto
//! the logical grid; [`TableGeometry`] answers, for rendering and export,
//! which coordinates carry a physical cell.

use crate::error::{ConvertError, Result};
use crate::model::{MergeRegion, TableCell, TableData};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    rows: usize,
    cols: usize,
    taken: Vec<bool>,
}

impl OccupancyGrid {
    pub fn new(rows: usize, cols: usize) -> Self {
        OccupancyGrid {
            rows,
            cols,
            taken: vec![false; rows * cols],
        }
    }

    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols && self.taken[row * self.cols + col]
    }

    /// First free column at or after `from` in `row`.
    pub fn next_free(&self, row: usize, from: usize) -> Option<usize> {
        (from..self.cols).find(|&c| !self.is_occupied(row, c))
    }

    /// Claims a `rowspan` × `colspan` footprint clipped to the grid and
    /// returns the clipped spans.
    pub fn claim(&mut self, row: usize, col: usize, rowspan: usize, colspan: usize) -> (usize, usize) {
        let rs = rowspan.max(1).min(self.rows.saturating_sub(row));
        let cs = colspan.max(1).min(self.cols.saturating_sub(col));
        for r in row..row + rs {
            for c in col..col + cs {
                self.taken[r * self.cols + c] = true;
            }
        }
        (rs, cs)
    }
}

/// A cell as written in source order with its requested spans.
#[derive(Debug, Clone)]
pub struct PhysicalCell<T> {
    pub rowspan: usize,
    pub colspan: usize,
    pub payload: T,
}

#[derive(Debug, Clone)]
pub struct PlacedCell<T> {
    pub row: usize,
    pub col: usize,
    pub payload: T,
}

#[derive(Debug, Clone)]
pub struct GridLayout<T> {
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<PlacedCell<T>>,
    pub merges: Vec<MergeRegion>,
    /// Cells that found no free coordinate in their row.
    pub overflow: Vec<(usize, T)>,
}

impl<T> GridLayout<T> {
    /// Coordinates claimed by no placed cell or span, row-major. Ragged
    /// source rows leave these behind.
    pub fn holes(&self) -> Vec<(usize, usize)> {
        let mut taken = vec![false; self.rows * self.cols];
        for cell in &self.cells {
            taken[cell.row * self.cols + cell.col] = true;
        }
        for region in &self.merges {
            for r in region.start.0..=region.end.0 {
                for c in region.start.1..=region.end.1 {
                    taken[r * self.cols + c] = true;
                }
            }
        }
        (0..self.rows)
            .flat_map(|r| (0..self.cols).map(move |c| (r, c)))
            .filter(|&(r, c)| !taken[r * self.cols + c])
            .collect()
    }
}

/// Column count implied by physical rows: the widest row by summed colspans.
pub fn column_count<T>(rows: &[Vec<PhysicalCell<T>>]) -> usize {
    rows.iter()
        .map(|r| r.iter().map(|c| c.colspan.max(1)).sum::<usize>())
        .max()
        .unwrap_or(0)
}

/// Places physical rows onto a `rows.len()` × `cols` grid, skipping
/// coordinates claimed by earlier spans.
pub fn layout<T>(rows: Vec<Vec<PhysicalCell<T>>>, cols: usize) -> GridLayout<T> {
    let row_count = rows.len();
    let mut grid = OccupancyGrid::new(row_count, cols);
    let mut cells = Vec::new();
    let mut merges = Vec::new();
    let mut overflow = Vec::new();

    for (r, row) in rows.into_iter().enumerate() {
        let mut cursor = 0;
        for cell in row {
            let Some(c) = grid.next_free(r, cursor) else {
                overflow.push((r, cell.payload));
                continue;
            };
            let (rs, cs) = grid.claim(r, c, cell.rowspan, cell.colspan);
            if let Some(region) = MergeRegion::new((r, c), rs, cs) {
                merges.push(region);
            }
            cells.push(PlacedCell {
                row: r,
                col: c,
                payload: cell.payload,
            });
            cursor = c + cs;
        }
    }

    GridLayout {
        rows: row_count,
        cols,
        cells,
        merges,
        overflow,
    }
}

/// What occupies one coordinate of a finished table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// A physical cell starts here.
    Master { rowspan: usize, colspan: usize },
    /// Covered by the merge region whose master is at the given coordinate.
    Covered { master: (usize, usize) },
}

/// Resolved geometry of a [`TableData`]: one slot per coordinate plus a
/// position index into its cells.
#[derive(Debug, Clone)]
pub struct TableGeometry {
    pub rows: usize,
    pub cols: usize,
    slots: Vec<Slot>,
    cells: HashMap<(usize, usize), usize>,
}

impl TableGeometry {
    pub fn new(data: &TableData) -> Self {
        let mut slots = vec![Slot::Master { rowspan: 1, colspan: 1 }; data.rows * data.cols];
        for region in &data.merge_regions {
            for r in region.start.0..=region.end.0.min(data.rows.saturating_sub(1)) {
                for c in region.start.1..=region.end.1.min(data.cols.saturating_sub(1)) {
                    let idx = r * data.cols + c;
                    slots[idx] = if (r, c) == region.master_cell {
                        Slot::Master {
                            rowspan: region.rowspan(),
                            colspan: region.colspan(),
                        }
                    } else {
                        Slot::Covered {
                            master: region.master_cell,
                        }
                    };
                }
            }
        }
        let cells = data
            .cells
            .iter()
            .enumerate()
            .map(|(i, c)| (c.position, i))
            .collect();
        TableGeometry {
            rows: data.rows,
            cols: data.cols,
            slots,
            cells,
        }
    }

    pub fn slot(&self, row: usize, col: usize) -> Slot {
        self.slots[row * self.cols + col]
    }

    pub fn cell<'a>(&self, data: &'a TableData, row: usize, col: usize) -> Option<&'a TableCell> {
        self.cells.get(&(row, col)).map(|&i| &data.cells[i])
    }
}

/// Every grid coordinate must be covered exactly once: by its own cell or by
/// one merge region whose master coordinate holds a cell.
pub fn check_coverage(table_id: &str, data: &TableData) -> Result<()> {
    let fail = |reason: String| -> Result<()> {
        Err(ConvertError::Structural(format!("table {table_id}: {reason}")))
    };
    let at = |r: usize, c: usize| r * data.cols + c;

    // Master coordinate of the region covering each slot.
    let mut region_of: Vec<Option<(usize, usize)>> = vec![None; data.rows * data.cols];
    for region in &data.merge_regions {
        if region.start.0 > region.end.0 || region.start.1 > region.end.1 {
            return fail(format!("merge region {} is reversed", region.id));
        }
        if region.end.0 >= data.rows || region.end.1 >= data.cols {
            return fail(format!("merge region {} leaves the grid", region.id));
        }
        if region.master_cell != region.start {
            return fail(format!("merge region {} master is not its start", region.id));
        }
        for r in region.start.0..=region.end.0 {
            for c in region.start.1..=region.end.1 {
                if region_of[at(r, c)].replace(region.master_cell).is_some() {
                    return fail(format!("coordinate ({r}, {c}) covered twice"));
                }
            }
        }
    }

    let mut cell_count = vec![0usize; data.rows * data.cols];
    for cell in &data.cells {
        let (r, c) = cell.position;
        if r >= data.rows || c >= data.cols {
            return fail(format!("cell ({r}, {c}) outside {}x{}", data.rows, data.cols));
        }
        if region_of[at(r, c)].is_some_and(|master| master != (r, c)) {
            return fail(format!("cell ({r}, {c}) sits inside a merge region"));
        }
        cell_count[at(r, c)] += 1;
        if cell_count[at(r, c)] > 1 {
            return fail(format!("two cells at ({r}, {c})"));
        }
    }

    for r in 0..data.rows {
        for c in 0..data.cols {
            let needs_cell = region_of[at(r, c)].map_or(true, |master| master == (r, c));
            if needs_cell && cell_count[at(r, c)] == 0 {
                return match region_of[at(r, c)] {
                    Some(_) => fail(format!("merge region at ({r}, {c}) has no master cell")),
                    None => fail(format!("coordinate ({r}, {c}) is not covered")),
                };
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellContent, MergeType};

    fn cell(rowspan: usize, colspan: usize, name: &str) -> PhysicalCell<String> {
        PhysicalCell {
            rowspan,
            colspan,
            payload: name.to_string(),
        }
    }

    #[test]
    fn rectangular_master_claims_its_footprint() {
        let rows = vec![
            vec![cell(2, 2, "a"), cell(1, 1, "b")],
            vec![cell(1, 1, "c")],
            vec![cell(1, 1, "d"), cell(1, 1, "e"), cell(1, 1, "f")],
        ];
        let cols = column_count(&rows);
        assert_eq!(cols, 3);
        let laid = layout(rows, cols);
        assert_eq!(laid.merges.len(), 1);
        assert_eq!(laid.merges[0].kind, MergeType::Rectangular);
        assert_eq!(laid.merges[0].start, (0, 0));
        assert_eq!(laid.merges[0].end, (1, 1));
        let positions: Vec<(usize, usize, &str)> = laid
            .cells
            .iter()
            .map(|c| (c.row, c.col, c.payload.as_str()))
            .collect();
        assert_eq!(
            positions,
            vec![
                (0, 0, "a"),
                (0, 2, "b"),
                (1, 2, "c"),
                (2, 0, "d"),
                (2, 1, "e"),
                (2, 2, "f")
            ]
        );
        assert!(laid.overflow.is_empty());
    }

    #[test]
    fn spans_are_clipped_to_the_grid() {
        let rows = vec![vec![cell(5, 1, "tall"), cell(1, 1, "x")], vec![cell(1, 1, "y")]];
        let laid = layout(rows, 2);
        assert_eq!(laid.merges[0].end, (1, 0));
        assert_eq!(laid.merges[0].kind, MergeType::Vertical);
    }

    #[test]
    fn extra_cells_overflow_instead_of_panicking() {
        let rows = vec![vec![cell(1, 1, "a")], vec![cell(1, 1, "b"), cell(1, 1, "c")]];
        let laid = layout(rows, 1);
        assert_eq!(laid.overflow.len(), 1);
        assert_eq!(laid.overflow[0].1, "c");
    }

    fn data_from(rows: usize, cols: usize, laid: &GridLayout<String>) -> TableData {
        TableData {
            rows,
            cols,
            cells: laid
                .cells
                .iter()
                .map(|c| TableCell {
                    position: (c.row, c.col),
                    content: CellContent {
                        text: c.payload.clone(),
                        marks: vec![],
                    },
                    style_id: None,
                })
                .collect(),
            merge_regions: laid.merges.clone(),
        }
    }

    #[test]
    fn every_coordinate_is_covered_once() {
        let rows = vec![
            vec![cell(1, 3, "wide")],
            vec![cell(2, 1, "tall"), cell(1, 1, "p"), cell(1, 1, "q")],
            vec![cell(1, 2, "r")],
        ];
        let laid = layout(rows, 3);
        let data = data_from(3, 3, &laid);
        check_coverage("t", &data).unwrap();

        let geometry = TableGeometry::new(&data);
        let mut covered = 0;
        for r in 0..3 {
            for c in 0..3 {
                match geometry.slot(r, c) {
                    Slot::Master { .. } => assert!(geometry.cell(&data, r, c).is_some()),
                    Slot::Covered { .. } => covered += 1,
                }
            }
        }
        assert_eq!(covered, 2 + 1 + 1);
    }

    #[test]
    fn coverage_check_rejects_overlaps() {
        let mut data = TableData {
            rows: 2,
            cols: 2,
            cells: vec![],
            merge_regions: vec![
                MergeRegion::new((0, 0), 2, 1).unwrap(),
                MergeRegion::new((1, 0), 1, 2).unwrap(),
            ],
        };
        assert!(check_coverage("t", &data).is_err());
        data.merge_regions.pop();
        data.cells.push(TableCell {
            position: (1, 0),
            content: CellContent::default(),
            style_id: None,
        });
        assert!(check_coverage("t", &data).is_err());
    }

    fn blank(r: usize, c: usize) -> TableCell {
        TableCell {
            position: (r, c),
            content: CellContent::default(),
            style_id: None,
        }
    }

    fn reason(data: &TableData) -> String {
        match check_coverage("t", data) {
            Err(ConvertError::Structural(msg)) => msg,
            other => panic!("expected a structural error, got {other:?}"),
        }
    }

    #[test]
    fn coverage_check_rejects_holes() {
        let data = TableData {
            rows: 2,
            cols: 2,
            cells: vec![blank(0, 0)],
            merge_regions: vec![],
        };
        assert_eq!(reason(&data), "table t: coordinate (0, 1) is not covered");
    }

    #[test]
    fn coverage_check_rejects_duplicate_cells() {
        let data = TableData {
            rows: 1,
            cols: 1,
            cells: vec![blank(0, 0), blank(0, 0)],
            merge_regions: vec![],
        };
        assert_eq!(reason(&data), "table t: two cells at (0, 0)");
    }

    #[test]
    fn coverage_check_rejects_region_without_master_cell() {
        let data = TableData {
            rows: 2,
            cols: 2,
            cells: vec![blank(1, 0), blank(1, 1)],
            merge_regions: vec![MergeRegion::new((0, 0), 1, 2).unwrap()],
        };
        assert_eq!(reason(&data), "table t: merge region at (0, 0) has no master cell");
    }

    #[test]
    fn ragged_rows_leave_holes_to_pad() {
        let rows = vec![
            vec![cell(1, 1, "a"), cell(1, 1, "b"), cell(1, 1, "c")],
            vec![cell(1, 2, "wide")],
            vec![],
        ];
        let laid = layout(rows, 3);
        assert_eq!(laid.holes(), vec![(1, 2), (2, 0), (2, 1), (2, 2)]);

        let mut data = data_from(3, 3, &laid);
        assert!(check_coverage("t", &data).is_err());
        data.cells
            .extend(laid.holes().into_iter().map(|(r, c)| blank(r, c)));
        check_coverage("t", &data).unwrap();
    }
}
