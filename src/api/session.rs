//! WASM API for the edit session
//!
//! Line ids cross the boundary as `{ index, generation }` objects; offsets in
//! input events are UTF-16 code units, every other position is a codepoint
//! index.

use wasm_bindgen::prelude::*;

use crate::api::helpers::{deserialize, engine_error, lock_session, serialize, with_session};
use crate::api::timer::{set_events_pending_listener, BrowserTimer};
use crate::config::EngineConfig;
use crate::input::InputEvent;
use crate::models::PitchSystem;
use crate::session::EditSession;
use crate::structure::LineId;
use crate::{wasm_info, wasm_log};

fn line_id(value: JsValue) -> Result<LineId, JsValue> {
    deserialize(value, "Invalid line id")
}

fn load_config(config: JsValue) -> Result<EngineConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(EngineConfig::default());
    }
    match config.as_string() {
        Some(json) => EngineConfig::from_json(&json).map_err(engine_error),
        None => {
            let config: EngineConfig = deserialize(config, "Invalid engine config")?;
            config.validate().map_err(engine_error)?;
            Ok(config)
        }
    }
}

/// Create the session from a config (object, JSON string or undefined) and
/// newline-separated initial text. Returns the line ids in row order.
#[wasm_bindgen(js_name = initEngine)]
pub fn init_engine(config: JsValue, text: &str) -> Result<JsValue, JsValue> {
    wasm_info!("initEngine called with {} char(s)", text.chars().count());

    let config = load_config(config)?;
    let lines: Vec<&str> = text.split('\n').collect();
    let session = EditSession::with_lines(config, Box::new(BrowserTimer::new()), &lines).map_err(engine_error)?;
    let ids = session.line_ids().to_vec();

    let mut guard = lock_session()?;
    if let Some(mut previous) = guard.replace(session) {
        previous.dispose();
    }
    serialize(&ids, "Failed to serialize line ids")
}

/// Switch pitch system (1 = Number, 2 = Western, 3 = Sargam); returns the
/// reparsed line ids
#[wasm_bindgen(js_name = setPitchSystem)]
pub fn set_pitch_system(pitch_system: u8) -> Result<JsValue, JsValue> {
    wasm_info!("setPitchSystem called with {}", pitch_system);
    let system = PitchSystem::from_u8(pitch_system);
    with_session(|session| serialize(&session.set_pitch_system(system), "Failed to serialize flushed lines"))
}

/// Codepoints the host may splice without consulting the engine
#[wasm_bindgen(js_name = getSimpleChars)]
pub fn get_simple_chars() -> Result<String, JsValue> {
    with_session(|session| Ok(session.classes().simple_chars().into_iter().collect()))
}

/// Codepoints that always go through the engine
#[wasm_bindgen(js_name = getCombiningChars)]
pub fn get_combining_chars() -> Result<String, JsValue> {
    with_session(|session| Ok(session.classes().combining_chars().into_iter().collect()))
}

#[wasm_bindgen(js_name = handleInput)]
pub fn handle_input(line: JsValue, event: JsValue) -> Result<JsValue, JsValue> {
    let id = line_id(line)?;
    let event: InputEvent = deserialize(event, "Invalid input event")?;
    wasm_log!("handleInput {} {:?}", id, event);

    with_session(|session| {
        let outcome = session.handle_input(id, &event).map_err(engine_error)?;
        serialize(&outcome, "Failed to serialize input outcome")
    })
}

#[wasm_bindgen(js_name = flushAll)]
pub fn flush_all() -> Result<JsValue, JsValue> {
    with_session(|session| serialize(&session.flush_all(), "Failed to serialize flushed lines"))
}

#[wasm_bindgen(js_name = getLineRenderData)]
pub fn get_line_render_data(
    line: JsValue,
    cursor_cp: Option<usize>,
    sel_start_cp: Option<usize>,
    sel_end_cp: Option<usize>,
) -> Result<JsValue, JsValue> {
    let id = line_id(line)?;
    let selection = sel_start_cp.zip(sel_end_cp);

    with_session(|session| {
        let data = session
            .line_render_data(id, cursor_cp, selection)
            .map_err(engine_error)?;
        serialize(&data, "Failed to serialize render data")
    })
}

#[wasm_bindgen(js_name = drainEvents)]
pub fn drain_events() -> Result<JsValue, JsValue> {
    with_session(|session| serialize(&session.drain_events(), "Failed to serialize events"))
}

/// Register a function called (without arguments) when a debounced flush
/// queued events; pass null to clear
#[wasm_bindgen(js_name = setEventsPendingListener)]
pub fn set_events_pending(listener: Option<js_sys::Function>) {
    set_events_pending_listener(listener);
}

#[wasm_bindgen(js_name = getLineIds)]
pub fn get_line_ids() -> Result<JsValue, JsValue> {
    with_session(|session| serialize(&session.line_ids(), "Failed to serialize line ids"))
}

#[wasm_bindgen(js_name = getLineText)]
pub fn get_line_text(line: JsValue) -> Result<String, JsValue> {
    let id = line_id(line)?;
    with_session(|session| session.line_text(id).map_err(engine_error))
}

#[wasm_bindgen(js_name = splitLine)]
pub fn split_line(line: JsValue, at_cp: usize) -> Result<JsValue, JsValue> {
    let id = line_id(line)?;
    wasm_info!("splitLine called for line {} at {}", id, at_cp);

    with_session(|session| {
        let new_id = session.split_line(id, at_cp).map_err(engine_error)?;
        serialize(&new_id, "Failed to serialize line id")
    })
}

#[wasm_bindgen(js_name = joinLines)]
pub fn join_lines(line: JsValue) -> Result<JsValue, JsValue> {
    let id = line_id(line)?;
    wasm_info!("joinLines called for line {}", id);

    with_session(|session| {
        let joined = session.join_with_previous(id).map_err(engine_error)?;
        serialize(&joined, "Failed to serialize join result")
    })
}

#[wasm_bindgen(js_name = insertLine)]
pub fn insert_line(row: usize, text: &str) -> Result<JsValue, JsValue> {
    wasm_info!("insertLine called at row {}", row);
    with_session(|session| serialize(&session.insert_line(row, text), "Failed to serialize line id"))
}

#[wasm_bindgen(js_name = removeLine)]
pub fn remove_line(line: JsValue) -> Result<(), JsValue> {
    let id = line_id(line)?;
    wasm_info!("removeLine called for line {}", id);
    with_session(|session| session.remove_line(id).map_err(engine_error))
}

#[wasm_bindgen(js_name = reorderLines)]
pub fn reorder_lines(order: JsValue) -> Result<(), JsValue> {
    let order: Vec<LineId> = deserialize(order, "Invalid line order")?;
    wasm_info!("reorderLines called with {} line(s)", order.len());
    with_session(|session| session.reorder(order).map_err(engine_error))
}

#[wasm_bindgen]
pub fn undo() -> Result<JsValue, JsValue> {
    with_session(|session| {
        let applied = session.undo().map_err(engine_error)?;
        serialize(&applied, "Failed to serialize undo patches")
    })
}

#[wasm_bindgen]
pub fn redo() -> Result<JsValue, JsValue> {
    with_session(|session| {
        let applied = session.redo().map_err(engine_error)?;
        serialize(&applied, "Failed to serialize redo patches")
    })
}

#[wasm_bindgen(js_name = selectionToSuperscript)]
pub fn selection_to_superscript(line: JsValue, start_cp: usize, end_cp: usize) -> Result<JsValue, JsValue> {
    let id = line_id(line)?;
    wasm_info!("selectionToSuperscript called for line {} [{}, {})", id, start_cp, end_cp);

    with_session(|session| {
        let applied = session.to_superscript(id, start_cp, end_cp).map_err(engine_error)?;
        serialize(&applied, "Failed to serialize patch")
    })
}

/// Cancel the pending timer and drop the session
#[wasm_bindgen(js_name = disposeEngine)]
pub fn dispose_engine() -> Result<(), JsValue> {
    wasm_info!("disposeEngine called");
    let mut guard = lock_session()?;
    if let Some(mut session) = guard.take() {
        session.dispose();
    }
    Ok(())
}
