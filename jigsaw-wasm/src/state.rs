use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::SmallRng;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlImageElement, Window};

use jigsaw_core::{PathCache, PuzzleSession};

use crate::audio::SnapAudio;

/// Global application state stored behind an `Rc<RefCell<_>>` so it can be
/// shared across the WASM callbacks.
pub struct State {
    pub window: Window,
    pub document: Document,
    pub canvas: HtmlCanvasElement,
    pub ctx: CanvasRenderingContext2d,
    pub session: PuzzleSession<SmallRng>,
    pub cache: PathCache,
    pub image: Option<HtmlImageElement>,
    pub image_loaded: bool,
    pub image_list: Vec<String>,
    pub image_index: usize,
    pub show_hint: bool,
    // Latest pointer position of the active drag; consumed once per frame.
    pub pending_move: Option<(f64, f64)>,
    pub audio: SnapAudio,
}

/// Thread local storage for the single runtime state instance.
thread_local! {
    pub static STATE: RefCell<Option<Rc<RefCell<State>>>> = const { RefCell::new(None) };
}
