//! Browser frontend for the jigsaw engine: canvas rendering, pointer and
//! touch drag handling, hint overlay, tray, snap sound and win screen. All
//! game rules live in `jigsaw-core`; this crate only measures, draws and
//! forwards input.

use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Deserialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlElement, HtmlImageElement,
    HtmlInputElement, KeyboardEvent, MouseEvent, Path2d, TouchEvent,
};

use jigsaw_core::{
    generate, grid_overlay_path, piece_color, BoardRect, GameEvent, PathCache, Piece,
    PuzzleSession, TRAY_SLOTS,
};

mod audio;
mod canvas;
mod constants;
mod state;
mod upload;
mod utils;

use audio::SnapAudio;
use canvas::{set_fill_style, set_stroke_style};
use constants::{BOARD_MARGIN, HINT_ALPHA, SLOT_GAP, TRAY_GAP, TRAY_PIECE_SCALE};
use state::{State, STATE};
use utils::{
    asset_url, fetch_text_with_fallbacks, get_query_param, log, mouse_canvas_coords,
    sync_canvas_size, touch_canvas_coords,
};

/// Image list served next to the page, cycled by the "next puzzle" button.
#[derive(Deserialize)]
struct Manifest {
    images: Vec<String>,
}

/// Screen-space placement of the board square and the tray row, derived from
/// the current canvas size on every use. The board rect doubles as the snap
/// measurement handed to the session.
struct Layout {
    board: BoardRect,
    slot_size: f64,
    slot_left: f64,
    slot_top: f64,
}

impl Layout {
    fn slot_origin(&self, slot: usize) -> (f64, f64) {
        (
            self.slot_left + slot as f64 * (self.slot_size + SLOT_GAP),
            self.slot_top,
        )
    }

    fn slot_center(&self, slot: usize) -> (f64, f64) {
        let (x, y) = self.slot_origin(slot);
        (x + self.slot_size / 2.0, y + self.slot_size / 2.0)
    }
}

fn layout(canvas: &HtmlCanvasElement) -> Layout {
    let w = canvas.width() as f64;
    let h = canvas.height() as f64;
    let board = (w - 2.0 * BOARD_MARGIN).min(h * 0.66).max(1.0);
    let left = (w - board) / 2.0;
    let top = BOARD_MARGIN;
    let slots = TRAY_SLOTS as f64;
    let slot = ((w - 2.0 * BOARD_MARGIN - (slots - 1.0) * SLOT_GAP) / slots)
        .min(h - top - board - TRAY_GAP - BOARD_MARGIN)
        .max(1.0);
    Layout {
        board: BoardRect {
            left,
            top,
            size: board,
        },
        slot_size: slot,
        slot_left: (w - (slots * slot + (slots - 1.0) * SLOT_GAP)) / 2.0,
        slot_top: top + board + TRAY_GAP,
    }
}

/// Supply the session with a fresh board measurement if it dropped the
/// cached one.
fn ensure_board_rect(s: &mut State) {
    if s.session.board_rect().is_none() {
        s.session.set_board_rect(layout(&s.canvas).board);
    }
}

fn draw(state: &mut State) {
    sync_canvas_size(&state.canvas, &state.window);
    let width = state.canvas.width() as f64;
    let height = state.canvas.height() as f64;
    state.ctx.clear_rect(0.0, 0.0, width, height);

    let lay = layout(&state.canvas);
    let board = lay.board;
    let rows = state.session.rows();
    let cols = state.session.cols();
    if cols == 0 {
        return;
    }
    let ps = board.size / cols as f64;
    let image = if state.image_loaded {
        state.image.clone()
    } else {
        None
    };

    set_fill_style(&state.ctx, "#ffffff");
    state
        .ctx
        .fill_rect(board.left, board.top, board.size, board.size);

    if state.show_hint && !state.session.is_complete() {
        if let Some(img) = &image {
            state.ctx.save();
            state.ctx.set_global_alpha(HINT_ALPHA);
            let _ = state.ctx.draw_image_with_html_image_element_and_dw_and_dh(
                img, board.left, board.top, board.size, board.size,
            );
            state.ctx.restore();
        }
        let seams = grid_overlay_path(board.size, cols, state.session.descriptors());
        if let Ok(p) = Path2d::new_with_path_string(&seams) {
            state.ctx.save();
            let _ = state.ctx.translate(board.left, board.top);
            state.ctx.set_line_width(1.5);
            set_stroke_style(&state.ctx, "#94a3b8");
            state.ctx.stroke_with_path(&p);
            state.ctx.restore();
        }
    } else {
        // Plain cell guides so empty cells read as targets.
        set_stroke_style(&state.ctx, "#e2e8f0");
        state.ctx.set_line_width(1.0);
        for r in 0..rows {
            for c in 0..cols {
                state.ctx.stroke_rect(
                    board.left + c as f64 * ps,
                    board.top + r as f64 * ps,
                    ps,
                    ps,
                );
            }
        }
    }

    if let Some((hr, hc)) = state.session.highlight_cell() {
        set_fill_style(&state.ctx, "rgba(74, 222, 128, 0.45)");
        state.ctx.fill_rect(
            board.left + hc as f64 * ps,
            board.top + hr as f64 * ps,
            ps,
            ps,
        );
    }

    let placed: Vec<Piece> = state.session.placed().values().cloned().collect();
    for piece in &placed {
        draw_piece(
            &state.ctx,
            &mut state.cache,
            image.as_ref(),
            piece,
            ps,
            board.size,
            board.left + piece.col as f64 * ps,
            board.top + piece.row as f64 * ps,
            1.0,
        );
    }

    set_stroke_style(&state.ctx, "#334155");
    state.ctx.set_line_width(2.0);
    state
        .ctx
        .stroke_rect(board.left, board.top, board.size, board.size);

    // Tray row beneath the board.
    let k = lay.slot_size * TRAY_PIECE_SCALE / ps;
    for slot in 0..TRAY_SLOTS {
        let (sx, sy) = lay.slot_origin(slot);
        set_fill_style(&state.ctx, "#f1f5f9");
        state.ctx.fill_rect(sx, sy, lay.slot_size, lay.slot_size);
        set_stroke_style(&state.ctx, "#cbd5e1");
        state.ctx.set_line_width(1.5);
        state.ctx.stroke_rect(sx, sy, lay.slot_size, lay.slot_size);
        if state.session.dragging_slot() == Some(slot) {
            continue;
        }
        if let Some(piece) = state.session.tray()[slot].clone() {
            let (cx, cy) = lay.slot_center(slot);
            draw_piece(
                &state.ctx,
                &mut state.cache,
                image.as_ref(),
                &piece,
                ps,
                board.size,
                cx - ps * k / 2.0,
                cy - ps * k / 2.0,
                k,
            );
        }
    }

    // The active drag rides on top at full board scale.
    if let Some(piece) = state.session.dragging_piece().cloned() {
        let (px, py) = state.session.drag_position();
        let (ox, oy) = state.session.drag_offset();
        draw_piece(
            &state.ctx,
            &mut state.cache,
            image.as_ref(),
            &piece,
            ps,
            board.size,
            px - ox - ps / 2.0,
            py - oy - ps / 2.0,
            1.0,
        );
    }

    if state.session.is_complete() {
        set_fill_style(&state.ctx, "rgba(255, 255, 255, 0.75)");
        state
            .ctx
            .fill_rect(board.left, board.top, board.size, board.size);
        set_fill_style(&state.ctx, "#16a34a");
        state.ctx.set_font("bold 48px sans-serif");
        state.ctx.set_text_align("center");
        state.ctx.set_text_baseline("middle");
        let _ = state.ctx.fill_text(
            "Great job!",
            board.left + board.size / 2.0,
            board.top + board.size / 2.0,
        );
    }

    update_status_dom(state);
}

/// Draw one piece with its knob outline clipping the shared source image.
/// `(x, y)` is the screen position of the piece's nominal square top-left;
/// `scale` shrinks tray pieces while keeping one cached path per size.
#[allow(clippy::too_many_arguments)]
fn draw_piece(
    ctx: &CanvasRenderingContext2d,
    cache: &mut PathCache,
    image: Option<&HtmlImageElement>,
    piece: &Piece,
    piece_size: f64,
    board_size: f64,
    x: f64,
    y: f64,
    scale: f64,
) {
    let pd = cache.get(piece_size, piece.edges).clone();
    let Ok(outline) = Path2d::new_with_path_string(&pd.path) else {
        return;
    };
    ctx.save();
    let _ = ctx.translate(x, y);
    if scale != 1.0 {
        let _ = ctx.scale(scale, scale);
    }
    // The path places the nominal square at its internal allowance offset;
    // undo it so (x, y) is the square's top-left.
    let _ = ctx.translate(-pd.offset_x, -pd.offset_y);
    ctx.clip_with_path_2d(&outline);
    if let Some(img) = image {
        // Register the full image so this piece's home cell sits under the
        // nominal square; the clip keeps only the knob outline.
        let dx = pd.offset_x - piece.col as f64 * piece_size;
        let dy = pd.offset_y - piece.row as f64 * piece_size;
        let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
            img, dx, dy, board_size, board_size,
        );
    } else {
        set_fill_style(ctx, piece_color(piece.id));
        ctx.fill_with_path_2d(&outline);
    }
    ctx.set_line_width(1.5);
    set_stroke_style(ctx, "#475569");
    ctx.stroke_with_path(&outline);
    ctx.restore();
}

fn update_status_dom(state: &State) {
    if let Some(el) = state.document.get_element_by_id("counter")
        && let Ok(el) = el.dyn_into::<HtmlElement>()
    {
        el.set_inner_text(&format!(
            "{} / {}",
            state.session.placed_count(),
            state.session.total_pieces()
        ));
    }
}

/// Begin a drag if the press lands on an occupied tray slot.
fn press(s: &mut State, pt: (f64, f64)) {
    let lay = layout(&s.canvas);
    for slot in 0..TRAY_SLOTS {
        if s.session.tray()[slot].is_none() {
            continue;
        }
        let (sx, sy) = lay.slot_origin(slot);
        if pt.0 >= sx && pt.0 < sx + lay.slot_size && pt.1 >= sy && pt.1 < sy + lay.slot_size {
            s.session.drag_start(slot, pt, lay.slot_center(slot));
            s.pending_move = Some(pt);
            draw(s);
            break;
        }
    }
}

/// Resolve the active drag at its last coalesced position.
fn release(s: &mut State) {
    if s.session.dragging_slot().is_none() {
        return;
    }
    if let Some((x, y)) = s.pending_move.take() {
        ensure_board_rect(s);
        s.session.drag_move(x, y);
    }
    ensure_board_rect(s);
    s.session.drag_end();
    for ev in s.session.take_events() {
        if matches!(ev, GameEvent::PiecePlaced { .. }) {
            s.audio.play_snap();
        }
    }
    draw(s);
}

fn attach_ui(state: Rc<RefCell<State>>) -> Result<(), JsValue> {
    let doc = state.borrow().document.clone();
    upload::attach_image_input(state.clone())?;

    // Play again: reshuffle the same cut.
    if let Some(btn) = doc.get_element_by_id("playAgain") {
        let btn: HtmlElement = btn.dyn_into().unwrap();
        let st = state.clone();
        let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let mut s = st.borrow_mut();
            s.session.restart();
            s.pending_move = None;
            draw(&mut s);
        }));
        btn.set_onclick(Some(onclick.as_ref().unchecked_ref()));
        onclick.forget();
    }

    // Next puzzle: advance through the image manifest and reshuffle.
    if let Some(btn) = doc.get_element_by_id("nextPuzzle") {
        let btn: HtmlElement = btn.dyn_into().unwrap();
        let st = state.clone();
        let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let url = {
                let mut s = st.borrow_mut();
                if s.image_list.is_empty() {
                    None
                } else {
                    s.image_index = (s.image_index + 1) % s.image_list.len();
                    Some(s.image_list[s.image_index].clone())
                }
            };
            let Some(url) = url else {
                return;
            };
            {
                let mut s = st.borrow_mut();
                s.session.restart();
                s.pending_move = None;
                draw(&mut s);
            }
            if let Err(e) = load_image(st.clone(), &url) {
                log(&format!("Failed to load image '{url}': {e:?}"));
            }
        }));
        btn.set_onclick(Some(onclick.as_ref().unchecked_ref()));
        onclick.forget();
    }

    // Hint overlay toggle.
    if let Some(cb) = doc.get_element_by_id("hintToggle") {
        let cb: HtmlInputElement = cb.dyn_into().unwrap();
        cb.set_checked(state.borrow().show_hint);
        let st = state.clone();
        let cb_read = cb.clone();
        let onchange = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let mut s = st.borrow_mut();
            s.show_hint = cb_read.checked();
            draw(&mut s);
        }));
        cb.set_onchange(Some(onchange.as_ref().unchecked_ref()));
        onchange.forget();
    }

    // Mouse events
    {
        let st = state.clone();
        let mousedown = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |e: MouseEvent| {
            let mut s = st.borrow_mut();
            let pt = mouse_canvas_coords(&e, &s.canvas);
            press(&mut s, pt);
        }));
        state
            .borrow()
            .canvas
            .add_event_listener_with_callback("mousedown", mousedown.as_ref().unchecked_ref())?;
        mousedown.forget();
    }
    {
        let st = state.clone();
        let mousemove = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |e: MouseEvent| {
            let mut s = st.borrow_mut();
            if s.session.dragging_slot().is_some() {
                s.pending_move = Some(mouse_canvas_coords(&e, &s.canvas));
            }
        }));
        state
            .borrow()
            .window
            .add_event_listener_with_callback("mousemove", mousemove.as_ref().unchecked_ref())?;
        mousemove.forget();
    }
    {
        let st = state.clone();
        let mouseup = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |_e: MouseEvent| {
            release(&mut st.borrow_mut());
        }));
        state
            .borrow()
            .window
            .add_event_listener_with_callback("mouseup", mouseup.as_ref().unchecked_ref())?;
        mouseup.forget();
    }

    // Touch events
    {
        let st = state.clone();
        let touchstart = Closure::<dyn FnMut(TouchEvent)>::wrap(Box::new(move |e: TouchEvent| {
            if let Some(t) = e.touches().get(0) {
                e.prevent_default();
                let mut s = st.borrow_mut();
                let pt = touch_canvas_coords(&t, &s.canvas);
                press(&mut s, pt);
            }
        }));
        state
            .borrow()
            .canvas
            .add_event_listener_with_callback("touchstart", touchstart.as_ref().unchecked_ref())?;
        touchstart.forget();
    }
    {
        let st = state.clone();
        let touchmove = Closure::<dyn FnMut(TouchEvent)>::wrap(Box::new(move |e: TouchEvent| {
            let mut s = st.borrow_mut();
            if s.session.dragging_slot().is_some()
                && let Some(t) = e.touches().get(0)
            {
                e.prevent_default();
                s.pending_move = Some(touch_canvas_coords(&t, &s.canvas));
            }
        }));
        state
            .borrow()
            .window
            .add_event_listener_with_callback("touchmove", touchmove.as_ref().unchecked_ref())?;
        touchmove.forget();
    }
    {
        let st = state.clone();
        let touchend = Closure::<dyn FnMut(TouchEvent)>::wrap(Box::new(move |_e: TouchEvent| {
            release(&mut st.borrow_mut());
        }));
        state
            .borrow()
            .window
            .add_event_listener_with_callback("touchend", touchend.as_ref().unchecked_ref())?;
        touchend.forget();
    }

    // Keyboard shortcuts: h toggles the hint, r reshuffles.
    {
        let st = state.clone();
        let keydown =
            Closure::<dyn FnMut(KeyboardEvent)>::wrap(Box::new(move |e: KeyboardEvent| {
                let mut s = st.borrow_mut();
                match e.key().as_str() {
                    "h" | "H" => {
                        s.show_hint = !s.show_hint;
                        draw(&mut s);
                    }
                    "r" | "R" => {
                        s.session.restart();
                        s.pending_move = None;
                        draw(&mut s);
                    }
                    _ => {}
                }
            }));
        state
            .borrow()
            .window
            .add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        keydown.forget();
    }

    // A resize moves the board under the pointer's coordinate space.
    {
        let st = state.clone();
        let onresize = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let mut s = st.borrow_mut();
            s.session.invalidate_board_rect();
            draw(&mut s);
        }));
        state
            .borrow()
            .window
            .add_event_listener_with_callback("resize", onresize.as_ref().unchecked_ref())?;
        onresize.forget();
    }

    Ok(())
}

/// Persistent RAF loop that feeds at most one coalesced drag move per frame
/// into the session.
fn start_animation(state: Rc<RefCell<State>>) {
    type RafClosure = Closure<dyn FnMut(f64)>;
    let f: Rc<RefCell<Option<RafClosure>>> = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |_ts: f64| {
        {
            let mut s = state.borrow_mut();
            if s.session.dragging_slot().is_some()
                && let Some((x, y)) = s.pending_move.take()
            {
                ensure_board_rect(&mut s);
                s.session.drag_move(x, y);
                // Drag-progress events carry nothing the render loop does
                // not already know.
                let _ = s.session.take_events();
                draw(&mut s);
            }
        }
        let _ = web_sys::window()
            .unwrap()
            .request_animation_frame(f.borrow().as_ref().unwrap().as_ref().unchecked_ref());
    }) as Box<dyn FnMut(f64)>));
    let _ = web_sys::window()
        .unwrap()
        .request_animation_frame(g.borrow().as_ref().unwrap().as_ref().unchecked_ref());
}

/// Swap in a new puzzle image. The current pieces keep rendering as colored
/// placeholders until the load completes.
pub(crate) fn load_image(state: Rc<RefCell<State>>, url: &str) -> Result<(), JsValue> {
    let img = HtmlImageElement::new()?;
    {
        let mut s = state.borrow_mut();
        s.image = Some(img.clone());
        s.image_loaded = false;
    }
    let st = state.clone();
    let loaded = img.clone();
    let onload = Closure::<dyn FnMut()>::wrap(Box::new(move || {
        let mut s = st.borrow_mut();
        // A slow earlier request may land after a newer one; only the
        // current image counts.
        if s.image.as_ref() == Some(&loaded) {
            s.image_loaded = true;
            draw(&mut s);
        }
    }));
    img.set_onload(Some(onload.as_ref().unchecked_ref()));
    onload.forget();
    img.set_src(&asset_url(url));
    Ok(())
}

fn init_canvas(document: &Document) -> Result<(HtmlCanvasElement, CanvasRenderingContext2d), JsValue>
{
    let cv = document
        .get_element_by_id("canvas")
        .ok_or_else(|| JsValue::from_str("canvas element not found"))?
        .dyn_into::<HtmlCanvasElement>()?;
    let ctx = cv
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2D context not available"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    Ok((cv, ctx))
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;
    let (canvas, ctx) = init_canvas(&document)?;

    let search = window.location().search().unwrap_or_default();
    let grid = get_query_param(&search, "size")
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|g| (3..=5).contains(g))
        .unwrap_or(4);
    let show_hint = matches!(
        get_query_param(&search, "hint").as_deref(),
        Some("1") | Some("true")
    );
    let img_param = get_query_param(&search, "img");

    let mut rng = SmallRng::from_os_rng();
    let descriptors = generate(grid, grid, &mut rng);
    let session = PuzzleSession::new(descriptors, rng);

    let state = Rc::new(RefCell::new(State {
        window: window.clone(),
        document,
        canvas,
        ctx,
        session,
        cache: PathCache::new(),
        image: None,
        image_loaded: false,
        image_list: Vec::new(),
        image_index: 0,
        show_hint,
        pending_move: None,
        audio: SnapAudio::new(),
    }));
    STATE.with(|st| st.replace(Some(state.clone())));

    attach_ui(state.clone())?;
    start_animation(state.clone());

    if let Some(name) = &img_param {
        load_image(state.clone(), name)?;
    }
    {
        let st = state.clone();
        let win = window;
        let skip_first = img_param.is_some();
        wasm_bindgen_futures::spawn_local(async move {
            let text = fetch_text_with_fallbacks(
                &win,
                &[&asset_url("images.json"), "/images.json", "images.json"],
            )
            .await
            .unwrap_or_default();
            match serde_json::from_str::<Manifest>(&text) {
                Ok(m) if !m.images.is_empty() => {
                    let first = m.images[0].clone();
                    st.borrow_mut().image_list = m.images;
                    if !skip_first
                        && let Err(e) = load_image(st.clone(), &first)
                    {
                        log(&format!("Failed to load image '{first}': {e:?}"));
                    }
                }
                _ => log("No image manifest; drawing colored pieces"),
            }
        });
    }

    draw(&mut state.borrow_mut());
    Ok(())
}
