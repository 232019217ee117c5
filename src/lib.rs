//! Pose Arcade core crate.
//!
//! Two motion-controlled mini games (Flappy and Cricket) driven by upper-body
//! pose landmarks. The page runs the camera and pose estimator and pushes each
//! result in through `push_pose_frame`; everything from gesture detection to
//! simulation and drawing happens here. `start_game()` is the entry point.

use wasm_bindgen::prelude::*;

pub mod game;
pub mod gesture;
#[cfg(feature = "leaderboard")]
pub mod leaderboard;
pub mod pose;
pub mod profile;
mod render;
pub mod session;
mod web;

pub use web::{
    push_no_person, push_pose_frame, report_camera_error, reset_game, set_active_game,
    start_game,
};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

// -----------------------------------------------------------------------------
// Console logging. Native builds (unit tests) compile these away.
// -----------------------------------------------------------------------------

#[doc(hidden)]
pub fn __log(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::log_1(&JsValue::from_str(message));
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

#[doc(hidden)]
pub fn __warn(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&JsValue::from_str(message));
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => {
        $crate::__log(&format!($($t)*))
    };
}

#[macro_export]
macro_rules! console_warn {
    ($($t:tt)*) => {
        $crate::__warn(&format!($($t)*))
    };
}
