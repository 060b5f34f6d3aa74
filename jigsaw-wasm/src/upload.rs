use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Event, FileReader, HtmlInputElement};

use crate::state::State;
use crate::utils::log;

// Wires up the file input handler for using your own photo as the puzzle
// image. The file is read as a data URL and fed through the normal image
// loading path.
pub fn attach_image_input(state: Rc<RefCell<State>>) -> Result<(), JsValue> {
    let doc: Document = state.borrow().document.clone();
    if let Some(input) = doc.get_element_by_id("imageFile") {
        let input: HtmlInputElement = input.dyn_into().unwrap();
        let st = state.clone();
        let input_for_closure = input.clone();
        let onchange = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |_e: Event| {
            let Some(files) = input_for_closure.files() else {
                log("No file list on input");
                return;
            };
            if files.length() == 0 {
                log("No file selected");
                return;
            }
            let file = files.item(0).unwrap();
            let reader = FileReader::new().unwrap();
            let st2 = st.clone();
            let reader_for_closure = reader.clone();
            let onload = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |_ev: Event| {
                let url = reader_for_closure
                    .result()
                    .ok()
                    .and_then(|v| v.as_string())
                    .unwrap_or_default();
                if url.is_empty() {
                    log("Selected file is empty or unreadable");
                    return;
                }
                if let Err(e) = crate::load_image(st2.clone(), &url) {
                    log(&format!("Failed to load uploaded image: {e:?}"));
                }
            }));
            reader.set_onload(Some(onload.as_ref().unchecked_ref()));
            if let Err(e) = reader.read_as_data_url(&file) {
                log(&format!("Failed to read file: {e:?}"));
            }
            onload.forget();
        }));
        input.set_onchange(Some(onchange.as_ref().unchecked_ref()));
        onchange.forget();
    }
    Ok(())
}
