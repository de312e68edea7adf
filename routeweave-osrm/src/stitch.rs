//! Reassemble block results into full matrices.

use routeweave_core::Matrix;

use crate::BlockResult;

/// Matrices assembled from every block of a table query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StitchedTable {
    /// Full distance matrix, when requested.
    pub distances: Option<Matrix>,
    /// Full duration matrix, when requested.
    pub durations: Option<Matrix>,
}

/// Stitch `blocks` into full matrices, independent of arrival order.
///
/// Blocks are laid out by `(row, column)`: each row band is the horizontal
/// concatenation of its blocks, and bands are stacked in row order.
#[must_use]
pub fn stitch(mut blocks: Vec<BlockResult>) -> StitchedTable {
    blocks.sort_by_key(|block| (block.row, block.column));

    let mut distances = Band::default();
    let mut durations = Band::default();
    for block in blocks {
        if let Some(cells) = block.distances {
            distances.append(block.row, cells);
        }
        if let Some(cells) = block.durations {
            durations.append(block.row, cells);
        }
    }

    StitchedTable {
        distances: distances.finish(),
        durations: durations.finish(),
    }
}

/// Accumulates one matrix band by band.
#[derive(Default)]
struct Band {
    rows: Option<Matrix>,
    current_row: Option<usize>,
    band_start: usize,
}

impl Band {
    fn append(&mut self, row: usize, cells: Matrix) {
        let rows = self.rows.get_or_insert_with(Vec::new);
        if self.current_row == Some(row) {
            for (target, extra) in rows.iter_mut().skip(self.band_start).zip(cells) {
                target.extend(extra);
            }
        } else {
            self.current_row = Some(row);
            self.band_start = rows.len();
            rows.extend(cells);
        }
    }

    fn finish(self) -> Option<Matrix> {
        self.rows
    }
}
