//! Geometry and interaction engine for a draggable jigsaw puzzle.
//!
//! The crate is pure data and pure functions: [`edge::generate`] produces a
//! self-consistent edge-type matrix, [`path`] turns edge configurations into
//! closed knob outlines, [`overlay`] draws the matching hint seams, and
//! [`session::PuzzleSession`] runs the drag / snap / tray state machine.
//! Rendering, sound and persistence live in the frontends.

pub mod edge;
pub mod overlay;
pub mod path;
pub mod session;

pub use edge::{generate, Edges, EdgeType, PieceDescriptor};
pub use overlay::{grid_overlay_path, piece_color};
pub use path::{build_piece_path, edge_curve, PathCache, PathData, Point, KNOB_RATIO};
pub use session::{BoardRect, GameEvent, Piece, PuzzleSession, SNAP_RATIO, TRAY_SLOTS};
