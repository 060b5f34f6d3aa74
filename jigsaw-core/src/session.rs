use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::edge::{Edges, PieceDescriptor};

/// Number of candidate pieces visible at once. Fixed at four to keep choice
/// pressure low for young players; the shuffle still exposes the whole pool
/// over a game.
pub const TRAY_SLOTS: usize = 4;

/// Per-axis snap tolerance as a fraction of piece size. Deliberately
/// generous; this is a usability choice, not a visual-overlap test.
pub const SNAP_RATIO: f64 = 0.4;

/// One unplaced or placed piece. `id` is the index into the original
/// descriptor order and joins the pool, tray and placed map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub id: usize,
    pub row: u32,
    pub col: u32,
    pub edges: Edges,
}

/// The board's rectangle in the pointer's coordinate space. Measured lazily
/// by the frontend and cached here until invalidated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoardRect {
    pub left: f64,
    pub top: f64,
    pub size: f64,
}

/// Notifications for the presentation layer (sound, celebration, drag
/// overlay). Drained with [`PuzzleSession::take_events`].
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    DragMoved { x: f64, y: f64 },
    PiecePlaced { id: usize, row: u32, col: u32 },
    PuzzleComplete,
}

/// Runtime state of one puzzle: the shuffled pool, the visible tray, the
/// placed map, and the active drag.
///
/// `pool`, the tray and `placed` are pairwise disjoint and together cover
/// the full piece set at all times. Only one piece can be dragged at a time,
/// and a dragged piece stays in its tray slot until the drop resolves.
///
/// The session owns its randomness source; tests seed it, production hands
/// in a system-seeded rng.
pub struct PuzzleSession<R: Rng> {
    rows: u32,
    cols: u32,
    descriptors: Vec<PieceDescriptor>,
    pool: Vec<Piece>,
    tray: [Option<Piece>; TRAY_SLOTS],
    placed: HashMap<(u32, u32), Piece>,
    dragging: Option<usize>, // tray slot of the active drag
    drag_pos: (f64, f64),
    drag_offset: (f64, f64),
    highlight: Option<(u32, u32)>,
    complete: bool,
    board_rect: Option<BoardRect>,
    events: Vec<GameEvent>,
    rng: R,
}

impl<R: Rng> PuzzleSession<R> {
    pub fn new(descriptors: Vec<PieceDescriptor>, rng: R) -> Self {
        let rows = descriptors.iter().map(|d| d.row + 1).max().unwrap_or(0);
        let cols = descriptors.iter().map(|d| d.col + 1).max().unwrap_or(0);
        let mut session = Self {
            rows,
            cols,
            descriptors,
            pool: Vec::new(),
            tray: [const { None }; TRAY_SLOTS],
            placed: HashMap::new(),
            dragging: None,
            drag_pos: (0.0, 0.0),
            drag_offset: (0.0, 0.0),
            highlight: None,
            complete: false,
            board_rect: None,
            events: Vec::new(),
            rng,
        };
        session.deal();
        session
    }

    /// Reshuffle everything for "play again": placed cleared, fresh pool,
    /// tray refilled from its head.
    pub fn restart(&mut self) {
        self.placed.clear();
        self.dragging = None;
        self.highlight = None;
        self.complete = false;
        self.events.clear();
        self.deal();
    }

    fn deal(&mut self) {
        let mut pieces: Vec<Piece> = self
            .descriptors
            .iter()
            .enumerate()
            .map(|(id, d)| Piece {
                id,
                row: d.row,
                col: d.col,
                edges: d.edges,
            })
            .collect();
        pieces.shuffle(&mut self.rng);
        self.pool = pieces;
        self.tray = [const { None }; TRAY_SLOTS];
        for slot in &mut self.tray {
            if self.pool.is_empty() {
                break;
            }
            *slot = Some(self.pool.remove(0));
        }
    }

    /// Begin dragging the piece in `slot`. Ignored while another drag is
    /// active or if the slot is empty. `piece_center` is the slot piece's
    /// visual center; the pointer offset from it is kept for rendering
    /// continuity, not for snap math.
    pub fn drag_start(&mut self, slot: usize, pointer: (f64, f64), piece_center: (f64, f64)) {
        if self.dragging.is_some() {
            return;
        }
        if slot >= TRAY_SLOTS || self.tray[slot].is_none() {
            return;
        }
        // Layout may have shifted since the last measurement.
        self.board_rect = None;
        self.dragging = Some(slot);
        self.drag_pos = pointer;
        self.drag_offset = (pointer.0 - piece_center.0, pointer.1 - piece_center.1);
        self.events.push(GameEvent::DragMoved {
            x: pointer.0,
            y: pointer.1,
        });
    }

    /// Update the active drag to a new pointer position and recompute the
    /// highlight cell. The frontend coalesces pointer events to at most one
    /// call per rendered frame.
    pub fn drag_move(&mut self, x: f64, y: f64) {
        let Some(slot) = self.dragging else {
            return;
        };
        self.drag_pos = (x, y);
        self.highlight = self
            .tray[slot]
            .as_ref()
            .and_then(|piece| self.snap_cell(x, y, piece))
            .filter(|cell| !self.placed.contains_key(cell));
        self.events.push(GameEvent::DragMoved { x, y });
    }

    /// Resolve the active drag at its last position. A successful snap moves
    /// the piece into the board and replenishes the tray; otherwise the
    /// piece stays in its slot. Dropping with no active drag is a no-op.
    pub fn drag_end(&mut self) {
        let Some(slot) = self.dragging.take() else {
            return;
        };
        self.highlight = None;
        let Some(piece) = self.tray[slot].as_ref() else {
            return;
        };
        let cell = self
            .snap_cell(self.drag_pos.0, self.drag_pos.1, piece)
            .filter(|cell| !self.placed.contains_key(cell));
        if let Some(cell) = cell
            && let Some(piece) = self.tray[slot].take()
        {
            self.events.push(GameEvent::PiecePlaced {
                id: piece.id,
                row: cell.0,
                col: cell.1,
            });
            self.placed.insert(cell, piece);
            self.fill_empty_slots();
            if self.placed.len() == (self.rows * self.cols) as usize {
                self.complete = true;
                self.events.push(GameEvent::PuzzleComplete);
            }
        }
    }

    /// Home-cell snap test: both axis distances from the cell center must be
    /// strictly inside the threshold. No board rect means no match.
    fn snap_cell(&self, x: f64, y: f64, piece: &Piece) -> Option<(u32, u32)> {
        let rect = self.board_rect?;
        let piece_size = rect.size / self.cols as f64;
        let rel_x = x - rect.left;
        let rel_y = y - rect.top;
        let target_x = piece.col as f64 * piece_size + piece_size / 2.0;
        let target_y = piece.row as f64 * piece_size + piece_size / 2.0;
        let threshold = piece_size * SNAP_RATIO;
        if (rel_x - target_x).abs() < threshold && (rel_y - target_y).abs() < threshold {
            Some((piece.row, piece.col))
        } else {
            None
        }
    }

    /// Fill every empty tray slot with a uniformly random draw, without
    /// replacement, from the pool. An exhausted pool leaves slots empty.
    fn fill_empty_slots(&mut self) {
        for slot in &mut self.tray {
            if slot.is_none() && !self.pool.is_empty() {
                let k = self.rng.random_range(0..self.pool.len());
                *slot = Some(self.pool.swap_remove(k));
            }
        }
    }

    pub fn set_board_rect(&mut self, rect: BoardRect) {
        self.board_rect = Some(rect);
    }

    pub fn board_rect(&self) -> Option<BoardRect> {
        self.board_rect
    }

    /// Drop the cached measurement; the next snap test will need a fresh
    /// rect. Called by the frontend on resize/scroll.
    pub fn invalidate_board_rect(&mut self) {
        self.board_rect = None;
    }

    /// Events accumulated since the last drain.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Pieces not yet placed (pool plus tray).
    pub fn remaining_count(&self) -> usize {
        self.pool.len() + self.tray.iter().flatten().count()
    }

    pub fn placed_count(&self) -> usize {
        self.placed.len()
    }

    pub fn total_pieces(&self) -> usize {
        self.descriptors.len()
    }

    pub fn tray(&self) -> &[Option<Piece>; TRAY_SLOTS] {
        &self.tray
    }

    pub fn placed(&self) -> &HashMap<(u32, u32), Piece> {
        &self.placed
    }

    pub fn piece_at(&self, row: u32, col: u32) -> Option<&Piece> {
        self.placed.get(&(row, col))
    }

    /// The piece currently being dragged, still resident in its tray slot.
    pub fn dragging_piece(&self) -> Option<&Piece> {
        self.dragging.and_then(|slot| self.tray[slot].as_ref())
    }

    pub fn dragging_slot(&self) -> Option<usize> {
        self.dragging
    }

    pub fn drag_position(&self) -> (f64, f64) {
        self.drag_pos
    }

    pub fn drag_offset(&self) -> (f64, f64) {
        self.drag_offset
    }

    pub fn highlight_cell(&self) -> Option<(u32, u32)> {
        self.highlight
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn descriptors(&self) -> &[PieceDescriptor] {
        &self.descriptors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::generate;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const BOARD: BoardRect = BoardRect {
        left: 0.0,
        top: 0.0,
        size: 300.0,
    };

    fn session(grid: u32, seed: u64) -> PuzzleSession<Pcg32> {
        let descriptors = generate(grid, grid, &mut Pcg32::seed_from_u64(seed));
        PuzzleSession::new(descriptors, Pcg32::seed_from_u64(seed.wrapping_add(1)))
    }

    /// Pool, tray and placed must partition the full piece set.
    fn assert_partition<R: Rng>(s: &PuzzleSession<R>) {
        let mut ids: Vec<usize> = s.pool.iter().map(|p| p.id).collect();
        ids.extend(s.tray.iter().flatten().map(|p| p.id));
        ids.extend(s.placed.values().map(|p| p.id));
        ids.sort_unstable();
        let expected: Vec<usize> = (0..s.total_pieces()).collect();
        assert_eq!(ids, expected);
    }

    fn home_center<R: Rng>(s: &PuzzleSession<R>, piece: &Piece) -> (f64, f64) {
        let ps = BOARD.size / s.cols() as f64;
        (
            BOARD.left + piece.col as f64 * ps + ps / 2.0,
            BOARD.top + piece.row as f64 * ps + ps / 2.0,
        )
    }

    /// Drag the piece in `slot` to its home cell center and drop it.
    fn place_from_slot<R: Rng>(s: &mut PuzzleSession<R>, slot: usize) {
        let piece = s.tray()[slot].clone().expect("slot occupied");
        let target = home_center(s, &piece);
        s.drag_start(slot, (10.0, 10.0), (10.0, 10.0));
        s.set_board_rect(BOARD);
        s.drag_move(target.0, target.1);
        s.drag_end();
    }

    #[test]
    fn test_init_4x4_splits_tray_and_pool() {
        let s = session(4, 1);
        let tray_ids: Vec<usize> = s.tray().iter().flatten().map(|p| p.id).collect();
        assert_eq!(tray_ids.len(), 4);
        let mut distinct = tray_ids.clone();
        distinct.sort_unstable();
        distinct.dedup();
        assert_eq!(distinct.len(), 4);
        assert_eq!(s.pool.len(), 12);
        assert_eq!(s.remaining_count(), 16);
        assert!(!s.is_complete());
        assert_partition(&s);
    }

    #[test]
    fn test_complete_on_ninth_placement() {
        let mut s = session(3, 2);
        for n in 1..=9 {
            {
                let slot = first_occupied_slot(&s);
                place_from_slot(&mut s, slot);
            }
            assert_eq!(s.placed_count(), n);
            assert_eq!(s.is_complete(), n == 9, "complete flag at placement {n}");
            assert_partition(&s);
        }
        let events = s.take_events();
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, GameEvent::PuzzleComplete))
                .count(),
            1
        );
        assert!(matches!(events.last(), Some(GameEvent::PuzzleComplete)));
    }

    fn first_occupied_slot<R: Rng>(s: &PuzzleSession<R>) -> usize {
        s.tray()
            .iter()
            .position(|p| p.is_some())
            .expect("tray not empty")
    }

    #[test]
    fn test_snap_threshold_is_strict() {
        // Piece size 2.5 makes the 40% threshold exactly 1.0 in f64, so the
        // strict-inequality boundary is bit-exact and not rounding luck.
        let tiny = BoardRect {
            left: 0.0,
            top: 0.0,
            size: 7.5,
        };
        let mut s = session(3, 3);
        let slot = 0;
        let piece = s.tray()[slot].clone().unwrap();
        let ps = tiny.size / 3.0;
        assert_eq!(ps * SNAP_RATIO, 1.0);
        let cx = piece.col as f64 * ps + ps / 2.0;
        let cy = piece.row as f64 * ps + ps / 2.0;

        // Exactly at the threshold: not a match.
        s.drag_start(slot, (0.0, 0.0), (0.0, 0.0));
        s.set_board_rect(tiny);
        s.drag_move(cx + 1.0, cy);
        assert_eq!(s.highlight_cell(), None);
        s.drag_end();
        assert_eq!(s.placed_count(), 0);

        // Just inside: a match.
        s.drag_start(slot, (0.0, 0.0), (0.0, 0.0));
        s.set_board_rect(tiny);
        s.drag_move(cx + 0.875, cy);
        assert_eq!(s.highlight_cell(), Some((piece.row, piece.col)));
        s.drag_end();
        assert_eq!(s.placed_count(), 1);
        assert_partition(&s);
    }

    #[test]
    fn test_drop_without_drag_is_noop() {
        let mut s = session(3, 4);
        s.drag_end();
        assert_eq!(s.placed_count(), 0);
        assert!(s.take_events().is_empty());
        assert_partition(&s);
    }

    #[test]
    fn test_missing_board_rect_means_no_match() {
        let mut s = session(3, 5);
        let slot = first_occupied_slot(&s);
        let piece = s.tray()[slot].clone().unwrap();
        let target = home_center(&s, &piece);
        s.drag_start(slot, (0.0, 0.0), (0.0, 0.0));
        // No set_board_rect: the drop must resolve as a miss, not an error.
        s.drag_move(target.0, target.1);
        assert_eq!(s.highlight_cell(), None);
        s.drag_end();
        assert_eq!(s.placed_count(), 0);
        assert!(s.tray()[slot].is_some());
    }

    #[test]
    fn test_drag_start_invalidates_board_rect() {
        let mut s = session(3, 6);
        s.set_board_rect(BOARD);
        assert!(s.board_rect().is_some());
        s.drag_start(first_occupied_slot(&s), (0.0, 0.0), (0.0, 0.0));
        assert!(s.board_rect().is_none());
    }

    #[test]
    fn test_second_drag_start_ignored() {
        let mut s = session(3, 7);
        s.drag_start(0, (5.0, 5.0), (5.0, 5.0));
        let first = s.dragging_piece().cloned();
        s.drag_start(1, (9.0, 9.0), (9.0, 9.0));
        assert_eq!(s.dragging_piece().cloned(), first);
        assert_eq!(s.dragging_slot(), Some(0));
    }

    #[test]
    fn test_occupied_cell_rejected() {
        // Duplicate home cells cannot come out of the generator, but the
        // occupancy check is a correctness invariant, so force the case.
        let mut descriptors = generate(2, 2, &mut Pcg32::seed_from_u64(8));
        descriptors[1].row = descriptors[0].row;
        descriptors[1].col = descriptors[0].col;
        let mut s = PuzzleSession::new(descriptors, Pcg32::seed_from_u64(80));

        let twins: Vec<usize> = s
            .tray()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.as_ref().is_some_and(|p| p.id < 2))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(twins.len(), 2, "both twins start in the tray");

        place_from_slot(&mut s, twins[0]);
        assert_eq!(s.placed_count(), 1);

        // The second twin's home is now occupied: silent rejection.
        let slot = s
            .tray()
            .iter()
            .position(|p| p.as_ref().is_some_and(|p| p.id < 2))
            .expect("second twin still trayed");
        place_from_slot(&mut s, slot);
        assert_eq!(s.placed_count(), 1);
        assert!(s.tray()[slot].is_some());
        assert_partition(&s);
    }

    #[test]
    fn test_slot_replenished_from_pool() {
        let mut s = session(4, 9);
        let slot = 2;
        let placed_id = s.tray()[slot].as_ref().unwrap().id;
        place_from_slot(&mut s, slot);

        let refill = s.tray()[slot].as_ref().expect("slot 2 refilled");
        assert_ne!(refill.id, placed_id);
        assert_eq!(s.pool.len(), 11);
        // The refill is not duplicated anywhere.
        let mut ids: Vec<usize> = s.tray().iter().flatten().map(|p| p.id).collect();
        ids.extend(s.placed().values().map(|p| p.id));
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 5);
        assert_partition(&s);
    }

    #[test]
    fn test_exhausted_pool_leaves_slots_empty() {
        let mut s = session(2, 10);
        assert_eq!(s.pool.len(), 0);
        for n in 1..=4 {
            {
                let slot = first_occupied_slot(&s);
                place_from_slot(&mut s, slot);
            }
            let filled = s.tray().iter().flatten().count();
            assert_eq!(filled, 4 - n);
            assert_partition(&s);
        }
        assert!(s.is_complete());
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut s = session(3, 12);
        while !s.is_complete() {
            {
                let slot = first_occupied_slot(&s);
                place_from_slot(&mut s, slot);
            }
        }
        s.restart();
        assert!(!s.is_complete());
        assert_eq!(s.placed_count(), 0);
        assert_eq!(s.tray().iter().flatten().count(), 4);
        assert_eq!(s.remaining_count(), 9);
        assert!(s.take_events().is_empty());
        assert_partition(&s);
    }

    #[test]
    fn test_events_report_placement() {
        let mut s = session(3, 13);
        let slot = first_occupied_slot(&s);
        let piece = s.tray()[slot].clone().unwrap();
        place_from_slot(&mut s, slot);
        let events = s.take_events();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::PiecePlaced { id, row, col }
                if *id == piece.id && *row == piece.row && *col == piece.col
        )));
        // Draining empties the queue.
        assert!(s.take_events().is_empty());
    }
}
