/// Canvas layout constants. Values are in canvas pixels.
pub const BOARD_MARGIN: f64 = 16.0;
/// Vertical gap between the board and the tray row.
pub const TRAY_GAP: f64 = 24.0;
/// Horizontal gap between adjacent tray slots.
pub const SLOT_GAP: f64 = 12.0;
/// Scale of a piece drawn inside its tray slot; leaves room for the knob
/// overhang within the slot square.
pub const TRAY_PIECE_SCALE: f64 = 0.6;
/// Alpha of the hint image drawn under the placed pieces.
pub const HINT_ALPHA: f64 = 0.3;
