//! Browser wiring: canvas lookup, the requestAnimationFrame loop, DOM controls
//! and the JS-facing pose input functions.
//!
//! The page owns the camera and the pose estimator. It calls
//! `push_pose_frame` / `push_no_person` from the estimator's result callback;
//! those only drop the sample into the session's mailbox. The frame loop then
//! classifies the newest sample, advances the active game with a clamped step
//! and redraws.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlInputElement, Window, window,
};

use crate::game::cricket::MAX_BALLS;
use crate::game::{ActiveGame, Arena};
use crate::pose::{LandmarkFrame, PoseSample};
use crate::profile::{DeviceClass, DeviceHints, FlappyTuning, classify_device};
use crate::render;
use crate::session::{Session, SessionEvent};
use crate::{console_log, console_warn};

const CANVAS_ID: &str = "gameCanvas";

struct App {
    session: Session,
    ctx: CanvasRenderingContext2d,
}

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
    // Camera failure reported before `start_game`; applied once the session exists.
    static PENDING_CAMERA_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn with_app<T>(f: impl FnOnce(&mut App) -> T) -> Option<T> {
    APP.with(|cell| cell.borrow_mut().as_mut().map(f))
}

fn document() -> Option<Document> {
    window().and_then(|w| w.document())
}

fn performance_now() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

/// Set up the session, hook the page controls and start the frame loop.
/// Calling it again while a session is live is a no-op.
#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    if with_app(|_| ()).is_some() {
        return Ok(());
    }
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    // Reuse the page's game canvas or create a default-sized one.
    let canvas: HtmlCanvasElement = if let Some(el) = doc.get_element_by_id(CANVAS_ID) {
        el.dyn_into()?
    } else {
        let default = Arena::default();
        let c: HtmlCanvasElement = doc.create_element("canvas")?.dyn_into()?;
        c.set_id(CANVAS_ID);
        c.set_width(default.width as u32);
        c.set_height(default.height as u32);
        let body = doc.body().ok_or_else(|| JsValue::from_str("no body"))?;
        body.append_child(&c)?;
        c
    };
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into()?;

    let arena = Arena {
        width: f64::from(canvas.width()),
        height: f64::from(canvas.height()),
    };
    let device = classify_device(&read_device_hints(&win));
    let mut session = Session::new(device, arena);
    console_log!(
        "session started: {} profile, {}x{} arena",
        device,
        arena.width,
        arena.height
    );

    if let Some(reason) = PENDING_CAMERA_ERROR.with(|cell| cell.borrow_mut().take()) {
        session.handle(SessionEvent::CameraFailed(reason));
    }

    apply_device_layout(&doc, device);
    sync_sliders(&doc, session.tuning());
    APP.with(|cell| cell.replace(Some(App { session, ctx })));

    wire_controls(&doc)?;
    wire_resize(&win)?;
    start_frame_loop();
    Ok(())
}

/// Feed one estimator result: 33 landmarks as flat `(x, y, visibility)`
/// triples, stamped with `performance.now()` at capture time.
#[wasm_bindgen]
pub fn push_pose_frame(data: &[f64], timestamp_ms: f64) {
    match LandmarkFrame::from_flat(data) {
        Ok(frame) => {
            with_app(|app| {
                app.session
                    .submit_pose(PoseSample::detected(frame, timestamp_ms))
            });
        }
        Err(err) => console_warn!("dropping pose frame: {}", err),
    }
}

/// The estimator ran but found nobody.
#[wasm_bindgen]
pub fn push_no_person(timestamp_ms: f64) {
    with_app(|app| app.session.submit_pose(PoseSample::absent(timestamp_ms)));
}

/// Camera or estimator start-up failed; the page may retry later.
#[wasm_bindgen]
pub fn report_camera_error(message: &str) {
    note_camera_error(message);
    if let Some(doc) = document() {
        set_text(
            &doc,
            "cameraState",
            "Could not access camera. Check permissions and retry.",
        );
    }
}

/// Route a camera failure to the live session, or park it until `start_game`.
/// Returns true if a session took it.
fn note_camera_error(message: &str) -> bool {
    let event = SessionEvent::CameraFailed(message.to_string());
    if with_app(|app| app.session.handle(event)).is_some() {
        return true;
    }
    console_warn!("camera error before start_game, holding it: {}", message);
    PENDING_CAMERA_ERROR.with(|cell| cell.replace(Some(message.to_string())));
    false
}

#[wasm_bindgen]
pub fn set_active_game(name: &str) -> Result<(), JsValue> {
    let game: ActiveGame = name
        .parse()
        .map_err(|err: crate::game::UnknownGame| JsValue::from_str(&err.to_string()))?;
    with_app(|app| app.session.handle(SessionEvent::SwitchGame(game)));
    Ok(())
}

#[wasm_bindgen]
pub fn reset_game() {
    with_app(|app| app.session.handle(SessionEvent::Reset));
}

fn read_device_hints(win: &Window) -> DeviceHints {
    DeviceHints {
        viewport_width: win
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(f64::INFINITY),
        coarse_pointer: win
            .match_media("(pointer: coarse)")
            .ok()
            .flatten()
            .map(|m| m.matches())
            .unwrap_or(false),
        user_agent: win.navigator().user_agent().unwrap_or_default(),
    }
}

fn start_frame_loop() {
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        if let Some(Err(err)) = with_app(|app| frame(app, ts)) {
            console_warn!("frame failed: {:?}", err);
        }
        if let (Some(w), Some(cb)) = (window(), f.borrow().as_ref()) {
            let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));
    if let (Some(w), Some(cb)) = (window(), g.borrow().as_ref()) {
        let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}

fn frame(app: &mut App, now: f64) -> Result<(), JsValue> {
    let doc = document().ok_or_else(|| JsValue::from_str("no document"))?;

    if app.session.resize_due(now) {
        if let Some(win) = window() {
            let device = classify_device(&read_device_hints(&win));
            if app.session.handle(SessionEvent::ProfileChanged(device)) {
                apply_device_layout(&doc, device);
                sync_sliders(&doc, app.session.tuning());
            }
        }
    }

    app.session.process_pose();
    app.session.tick(now);
    render::render(&app.ctx, &app.session)?;
    update_hud(&doc, &app.session);
    Ok(())
}

fn wire_controls(doc: &Document) -> Result<(), JsValue> {
    on(doc, "resetGameBtn", "click", || {
        with_app(|app| app.session.handle(SessionEvent::Reset));
    })?;
    on(doc, "tabFlappy", "click", || {
        with_app(|app| {
            app.session
                .handle(SessionEvent::SwitchGame(ActiveGame::Flappy))
        });
    })?;
    on(doc, "tabCricket", "click", || {
        with_app(|app| {
            app.session
                .handle(SessionEvent::SwitchGame(ActiveGame::Cricket))
        });
    })?;
    on(doc, "gravitySlider", "input", || {
        if let Some(value) = slider_value("gravitySlider") {
            with_app(|app| app.session.handle(SessionEvent::SetGravity(value)));
            if let Some(doc) = document() {
                set_text(&doc, "gravityValue", &value.to_string());
            }
        }
    })?;
    on(doc, "jumpSlider", "input", || {
        if let Some(value) = slider_value("jumpSlider") {
            with_app(|app| app.session.handle(SessionEvent::SetJump(value)));
            if let Some(doc) = document() {
                set_text(&doc, "jumpValue", &value.to_string());
            }
        }
    })?;
    Ok(())
}

fn wire_resize(win: &Window) -> Result<(), JsValue> {
    let closure = Closure::wrap(Box::new(move |_evt: web_sys::Event| {
        let now = performance_now();
        with_app(|app| app.session.note_resize(now));
    }) as Box<dyn FnMut(_)>);
    win.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

/// Attach `handler` to element `id` if the page has it.
fn on(
    doc: &Document,
    id: &str,
    event: &str,
    mut handler: impl FnMut() + 'static,
) -> Result<(), JsValue> {
    let Some(el) = doc.get_element_by_id(id) else {
        return Ok(());
    };
    let closure = Closure::wrap(Box::new(move |_evt: web_sys::Event| handler()) as Box<dyn FnMut(_)>);
    el.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn slider_value(id: &str) -> Option<f64> {
    let input: HtmlInputElement = document()?.get_element_by_id(id)?.dyn_into().ok()?;
    input.value().parse().ok()
}

fn set_text(doc: &Document, id: &str, text: &str) {
    if let Some(el) = doc.get_element_by_id(id) {
        el.set_text_content(Some(text));
    }
}

fn toggle_class(doc: &Document, id: &str, class: &str, enabled: bool) {
    if let Some(el) = doc.get_element_by_id(id) {
        let _ = el.class_list().toggle_with_force(class, enabled);
    }
}

fn apply_device_layout(doc: &Document, device: DeviceClass) {
    if let Some(body) = doc.body() {
        let _ = body
            .class_list()
            .toggle_with_force("mobile-mode", device.is_mobile());
    }
    toggle_class(doc, "deviceModeNotice", "hidden", false);
    set_text(doc, "deviceModeNotice", device.notice());
}

fn sync_sliders(doc: &Document, tuning: FlappyTuning) {
    for (slider, label, value) in [
        ("gravitySlider", "gravityValue", tuning.gravity),
        ("jumpSlider", "jumpValue", tuning.jump),
    ] {
        if let Some(input) = doc
            .get_element_by_id(slider)
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        {
            input.set_value(&value.to_string());
        }
        set_text(doc, label, &value.to_string());
    }
}

fn update_hud(doc: &Document, session: &Session) {
    let flappy = session.flappy();
    let cricket = session.cricket();
    let status = session.status();
    let on_flappy = session.active_game() == ActiveGame::Flappy;

    set_text(doc, "gameScore", &format!("Score: {}", flappy.score()));
    set_text(doc, "bestScore", &format!("Best: {}", flappy.best()));
    set_text(doc, "cricketRuns", &format!("Runs: {}", cricket.runs()));
    set_text(
        doc,
        "cricketBalls",
        &format!("Balls: {}/{}", cricket.balls(), MAX_BALLS),
    );
    set_text(
        doc,
        "cricketLastShot",
        &format!("Last hit: {}", cricket.last_shot()),
    );

    if let Some(el) = doc.get_element_by_id("flapStatus") {
        el.set_text_content(Some(&status.text));
        el.set_class_name(&format!("status {}", status.tone.css_class()));
    }
    set_text(doc, "flapHint", &status.hint);

    toggle_class(doc, "tabFlappy", "active", on_flappy);
    toggle_class(doc, "tabCricket", "active", !on_flappy);
    toggle_class(doc, "flappyHud", "hidden", !on_flappy);
    toggle_class(doc, "flappyControls", "hidden", !on_flappy);
    toggle_class(doc, "cricketHud", "hidden", on_flappy);
    toggle_class(doc, "cricketHint", "hidden", on_flappy);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_error_before_start_is_held() {
        assert!(!note_camera_error("NotAllowedError"));
        assert!(!note_camera_error("NotFoundError"));
        let held = PENDING_CAMERA_ERROR.with(|cell| cell.borrow_mut().take());
        assert_eq!(held.as_deref(), Some("NotFoundError"));
    }
}
