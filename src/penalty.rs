//! Mask penalty scoring.
//!
//! Lower scores are better. The score sums four terms over the masked grid:
//! long same-colored runs in rows and columns, 2x2 same-colored blocks,
//! finder-like 1:1:3:1:1 patterns with a light margin, and the deviation of the
//! dark ratio from one half.

use crate::grid::ModuleGrid;

const PENALTY_N1: i32 = 3;
const PENALTY_N2: i32 = 3;
const PENALTY_N3: i32 = 40;
const PENALTY_N4: i32 = 10;

/// Computes the penalty score for the current state of `grid`.
pub(crate) fn penalty_score(grid: &ModuleGrid) -> i32 {
    let size: u8 = grid.size();
    let mut result: i32 = 0;

    // Adjacent modules in row having same color, and finder-like patterns
    for y in 0..size {
        result += line_penalty(size, |x| grid.get(x, y));
    }
    // Adjacent modules in column having same color, and finder-like patterns
    for x in 0..size {
        result += line_penalty(size, |y| grid.get(x, y));
    }

    for y in 0..size - 1 {
        for x in 0..size - 1 {
            let color: bool = grid.get(x, y);
            if color == grid.get(x + 1, y) && color == grid.get(x, y + 1) && color == grid.get(x + 1, y + 1) {
                result += PENALTY_N2;
            }
        }
    }

    // Smallest k >= 0 such that (45-5k)% <= dark/total <= (55+5k)%. Size is odd, so dark/total != 1/2.
    let dark = grid.dark_count() as i32;
    let total = i32::from(size) * i32::from(size);
    let k: i32 = ((dark * 20 - total * 10).abs() + total - 1) / total - 1;
    result + k * PENALTY_N4
}

fn line_penalty(size: u8, module: impl Fn(u8) -> bool) -> i32 {
    let mut result: i32 = 0;
    let mut runcolor = false;
    let mut run: i32 = 0;
    let mut runhistory = FinderPenalty::new(size);
    for i in 0..size {
        let color = module(i);
        if color == runcolor {
            run += 1;
            if run == 5 {
                result += PENALTY_N1;
            } else if run > 5 {
                result += 1;
            }
        } else {
            runhistory.add_history(run);
            if !runcolor {
                result += runhistory.count_patterns() * PENALTY_N3;
            }
            runcolor = color;
            run = 1;
        }
    }
    result + runhistory.terminate_and_count(runcolor, run) * PENALTY_N3
}

/// Run lengths of one row or column, oldest first.
///
/// A finder-like pattern only counts once seven runs are known, so a pattern
/// starting at the first module of a line never scores; only the final run is
/// extended by a light border.
struct FinderPenalty {
    qr_size: i32,
    run_history: Vec<i32>,
}

impl FinderPenalty {
    fn new(size: u8) -> Self {
        Self {
            qr_size: i32::from(size),
            run_history: Vec::with_capacity(usize::from(size) + 2),
        }
    }

    fn add_history(&mut self, currentrunlength: i32) {
        self.run_history.push(currentrunlength);
    }

    /// Only valid right after a light run was added. Returns 0, 1 or 2: one
    /// count for each side of the dark 1:1:3:1:1 core with a 4-wide light margin.
    fn count_patterns(&self) -> i32 {
        let len = self.run_history.len();
        if len < 7 {
            return 0;
        }
        let rh = &self.run_history[len - 7..];
        let n = rh[1];
        debug_assert!(n <= self.qr_size * 3);
        let core = n > 0 && rh[2] == n && rh[3] == n * 3 && rh[4] == n && rh[5] == n;
        i32::from(core && rh[0] >= n * 4 && rh[6] >= n) + i32::from(core && rh[6] >= n * 4 && rh[0] >= n)
    }

    fn terminate_and_count(mut self, currentruncolor: bool, mut currentrunlength: i32) -> i32 {
        if currentruncolor {
            self.add_history(currentrunlength);
            currentrunlength = 0;
        }
        currentrunlength += self.qr_size; // Light border after the last run
        self.add_history(currentrunlength);
        self.count_patterns()
    }
}
