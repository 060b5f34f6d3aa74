use crate::edge::{descriptor_at, PieceDescriptor};
use crate::path::{edge_curve, Point, KNOB_RATIO};

/// Combined outline of every internal seam of the board, for overlaying on a
/// hint image. The outer border is omitted.
///
/// Horizontal seams are drawn left-to-right with the sign of the piece
/// *below* (its `top` value; by construction this equals the negated
/// `bottom` of the piece above). Vertical seams are drawn top-to-bottom with
/// the sign of the piece to the *right* **negated**: the curve primitive
/// bulges to the left of travel, and a top-to-bottom grid walk runs opposite
/// to the bottom-to-top left-edge walk of the piece outline. Dropping that
/// negation points every overlay knob the wrong way.
pub fn grid_overlay_path(board_size: f64, grid_size: u32, descriptors: &[PieceDescriptor]) -> String {
    let piece_size = board_size / grid_size as f64;
    let knob = piece_size * KNOB_RATIO;
    let mut path = String::new();

    // Interior horizontal seams, one contiguous line per seam row.
    for row in 1..grid_size {
        let y = row as f64 * piece_size;
        path.push_str(&format!("M {:.2} {:.2}", 0.0, y));
        for col in 0..grid_size {
            let start = Point {
                x: col as f64 * piece_size,
                y,
            };
            let end = Point {
                x: (col + 1) as f64 * piece_size,
                y,
            };
            let below = descriptor_at(descriptors, grid_size, row, col);
            path.push_str(&edge_curve(start, end, knob, below.edges.top.sign()));
        }
    }

    // Interior vertical seams.
    for col in 1..grid_size {
        let x = col as f64 * piece_size;
        path.push_str(&format!("M {:.2} {:.2}", x, 0.0));
        for row in 0..grid_size {
            let start = Point {
                x,
                y: row as f64 * piece_size,
            };
            let end = Point {
                x,
                y: (row + 1) as f64 * piece_size,
            };
            let right = descriptor_at(descriptors, grid_size, row, col);
            path.push_str(&edge_curve(start, end, knob, -right.edges.left.sign()));
        }
    }

    path
}

/// Fixed categorical palette for piece placeholders (used before the puzzle
/// image has loaded, and for the cutsheet's laid-out piece sheet). Colors
/// are stable and cycle by index.
pub fn piece_color(i: usize) -> &'static str {
    const PALETTE: [&str; 16] = [
        "red",
        "orangered",
        "orange",
        "gold",
        "yellowgreen",
        "green",
        "mediumseagreen",
        "teal",
        "deepskyblue",
        "dodgerblue",
        "blueviolet",
        "purple",
        "fuchsia",
        "hotpink",
        "peru",
        "slategray",
    ];
    PALETTE[i % PALETTE.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::generate;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_overlay_matches_piece_edge_curves() {
        let grid = 3u32;
        let board = 300.0;
        let ps = board / grid as f64;
        let knob = ps * KNOB_RATIO;
        let pieces = generate(grid, grid, &mut Pcg32::seed_from_u64(11));
        let overlay = grid_overlay_path(board, grid, &pieces);

        // Every horizontal seam segment must be the verbatim curve of the
        // below piece's top edge, in board coordinates.
        for row in 1..grid {
            for col in 0..grid {
                let below = descriptor_at(&pieces, grid, row, col);
                let expected = edge_curve(
                    Point {
                        x: col as f64 * ps,
                        y: row as f64 * ps,
                    },
                    Point {
                        x: (col + 1) as f64 * ps,
                        y: row as f64 * ps,
                    },
                    knob,
                    below.edges.top.sign(),
                );
                assert!(
                    overlay.contains(&expected),
                    "missing horizontal seam at ({row},{col})"
                );
            }
        }

        // Vertical seams carry the negated left sign of the piece to the
        // right.
        for col in 1..grid {
            for row in 0..grid {
                let right = descriptor_at(&pieces, grid, row, col);
                let expected = edge_curve(
                    Point {
                        x: col as f64 * ps,
                        y: row as f64 * ps,
                    },
                    Point {
                        x: col as f64 * ps,
                        y: (row + 1) as f64 * ps,
                    },
                    knob,
                    -right.edges.left.sign(),
                );
                assert!(
                    overlay.contains(&expected),
                    "missing vertical seam at ({row},{col})"
                );
            }
        }
    }

    #[test]
    fn test_overlay_omits_border_and_is_deterministic() {
        let pieces = generate(4, 4, &mut Pcg32::seed_from_u64(3));
        let a = grid_overlay_path(400.0, 4, &pieces);
        let b = grid_overlay_path(400.0, 4, &pieces);
        assert_eq!(a, b);
        // 3 horizontal + 3 vertical seam lines, one M apiece.
        assert_eq!(a.matches('M').count(), 6);
        // The border corners never appear as a line start.
        assert!(!a.contains("M 400.00"));
    }

    #[test]
    fn test_palette_cycles() {
        assert_eq!(piece_color(0), piece_color(16));
        assert_ne!(piece_color(0), piece_color(1));
    }
}
