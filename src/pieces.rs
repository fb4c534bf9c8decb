//! Static catalog of the seven tetromino shapes and the rotation operator.
//!
//! Wire piece types are 1-based (1 = I … 7 = Z); rotations count 90°
//! clockwise quarter turns about the anchor cell, not the centroid.

/// Number of distinct tetromino shapes.
pub const KIND_COUNT: usize = 7;

/// Every tetromino occupies exactly four cells.
pub const CELLS_PER_SHIP: usize = 4;

/// Canonical (row, col) cell offsets relative to the anchor at rotation 0.
/// Index 0 = I, 1 = O, 2 = T, 3 = J, 4 = L, 5 = S, 6 = Z.
const OFFSETS: [[(i32, i32); CELLS_PER_SHIP]; KIND_COUNT] = [
    [(0, 0), (0, 1), (0, 2), (0, 3)],   // I
    [(0, 0), (0, 1), (1, 0), (1, 1)],   // O
    [(0, 1), (1, 0), (1, 1), (1, 2)],   // T
    [(0, 0), (1, 0), (2, 0), (2, 1)],   // J
    [(0, 0), (1, 0), (2, 0), (2, -1)],  // L
    [(0, 0), (0, 1), (1, -1), (1, 0)],  // S
    [(0, -1), (0, 0), (1, 0), (1, 1)],  // Z
];

/// One 90° clockwise quarter turn about the origin: (r, c) → (−c, r).
pub fn quarter_turn((row, col): (i32, i32)) -> (i32, i32) {
    (-col, row)
}

/// The four cells occupied by piece `kind` (1..=7) after `rotation`
/// (0..=3) quarter turns, anchored at `(row, col)`.
///
/// Callers validate `kind` and `rotation` first; this is pure geometry.
/// Translation saturates so that anchors near the `i32` limits stay in
/// the out-of-bounds band instead of wrapping.
pub fn footprint(kind: u8, rotation: u8, row: i32, col: i32) -> [(i32, i32); CELLS_PER_SHIP] {
    let mut cells = OFFSETS[kind as usize - 1];
    for cell in &mut cells {
        for _ in 0..rotation {
            *cell = quarter_turn(*cell);
        }
        cell.0 = cell.0.saturating_add(row);
        cell.1 = cell.1.saturating_add(col);
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_turn_maps_row_col() {
        assert_eq!(quarter_turn((0, 1)), (-1, 0));
        assert_eq!(quarter_turn((1, 0)), (0, 1));
        assert_eq!(quarter_turn((2, -1)), (1, 2));
    }

    #[test]
    fn four_quarter_turns_are_identity() {
        for kind in 0..KIND_COUNT {
            for &offset in &OFFSETS[kind] {
                let mut turned = offset;
                for _ in 0..4 {
                    turned = quarter_turn(turned);
                }
                assert_eq!(turned, offset);
            }
        }
    }

    #[test]
    fn every_shape_has_four_distinct_cells() {
        for kind in 1..=KIND_COUNT as u8 {
            for rotation in 0..4 {
                let cells = footprint(kind, rotation, 0, 0);
                for i in 0..cells.len() {
                    for j in i + 1..cells.len() {
                        assert_ne!(cells[i], cells[j], "kind {kind} rotation {rotation}");
                    }
                }
            }
        }
    }

    #[test]
    fn footprint_translates_by_anchor() {
        assert_eq!(footprint(1, 0, 2, 3), [(2, 3), (2, 4), (2, 5), (2, 6)]);
        assert_eq!(footprint(2, 0, 8, 8), [(8, 8), (8, 9), (9, 8), (9, 9)]);
    }

    #[test]
    fn rotated_t_piece_matches_hand_computation() {
        // T offsets (0,1)(1,0)(1,1)(1,2) turned once: (-1,0)(0,1)(-1,1)(-2,1).
        assert_eq!(
            footprint(3, 1, 2, 0),
            [(1, 0), (2, 1), (1, 1), (0, 1)]
        );
    }

    #[test]
    fn extreme_anchor_saturates_instead_of_wrapping() {
        let cells = footprint(1, 0, i32::MAX, i32::MAX);
        assert!(cells.iter().all(|&(r, c)| r == i32::MAX && c == i32::MAX));
    }
}
