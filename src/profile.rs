//! Difficulty profiles and device classification.
//!
//! Two immutable constant bundles exist, one for desktop play and a gentler
//! one for phones/tablets. Which one applies is a pure function of viewport
//! width, pointer coarseness and the user agent string. Resizes are debounced
//! before the device class is re-evaluated.

use std::fmt;

/// Viewports at or below this width count as mobile (`max-width: 900px`).
pub const MOBILE_BREAKPOINT_PX: f64 = 900.0;
/// Only the last resize inside this window is acted upon.
pub const RESIZE_DEBOUNCE_MS: f64 = 180.0;

const MOBILE_AGENT_MARKERS: [&str; 6] = ["mobi", "android", "iphone", "ipad", "ipod", "mobile"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Desktop,
    Mobile,
}

impl DeviceClass {
    pub fn profile(self) -> &'static DifficultyProfile {
        match self {
            DeviceClass::Desktop => &DESKTOP,
            DeviceClass::Mobile => &MOBILE,
        }
    }

    pub fn is_mobile(self) -> bool {
        matches!(self, DeviceClass::Mobile)
    }

    /// Text for the device-mode notice.
    pub fn notice(self) -> &'static str {
        match self {
            DeviceClass::Desktop => "Desktop mode enabled",
            DeviceClass::Mobile => "Mobile-friendly mode enabled",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().name)
    }
}

/// Browser facts the classification looks at.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeviceHints {
    pub viewport_width: f64,
    pub coarse_pointer: bool,
    pub user_agent: String,
}

/// Any one mobile signal is enough.
pub fn classify_device(hints: &DeviceHints) -> DeviceClass {
    let agent = hints.user_agent.to_ascii_lowercase();
    let by_agent = MOBILE_AGENT_MARKERS.iter().any(|m| agent.contains(m));
    let by_screen = hints.viewport_width <= MOBILE_BREAKPOINT_PX;
    if by_agent || by_screen || hints.coarse_pointer {
        DeviceClass::Mobile
    } else {
        DeviceClass::Desktop
    }
}

/// Physics and gesture tuning for one device class. Distances are canvas
/// pixels, speeds are pixels per second, gesture thresholds are normalized
/// frame units per second.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DifficultyProfile {
    pub name: &'static str,
    pub gravity: f64,
    pub jump: f64,
    pub pipe_width: f64,
    pub pipe_gap: f64,
    pub pipe_speed: f64,
    pub pipe_spawn_interval: f64,
    pub bird_hitbox: f64,
    pub flap_threshold: f64,
    pub flap_cooldown_ms: f64,
    pub ball_speed: f64,
    pub ball_spawn_interval: f64,
    pub swing_threshold: f64,
    pub swing_cooldown_ms: f64,
    pub hit_window_x: f64,
    pub hit_window_y: f64,
    pub timing_scale: f64,
    /// Minimum visibility for wrists and elbows. Shoulders use a fixed gate.
    pub limb_visibility: f64,
}

pub static DESKTOP: DifficultyProfile = DifficultyProfile {
    name: "desktop",
    gravity: 1350.0,
    jump: 575.0,
    pipe_width: 72.0,
    pipe_gap: 214.0,
    pipe_speed: 145.0,
    pipe_spawn_interval: 1.62,
    bird_hitbox: 12.0,
    flap_threshold: 0.74,
    flap_cooldown_ms: 245.0,
    ball_speed: 205.0,
    ball_spawn_interval: 1.85,
    swing_threshold: 0.9,
    swing_cooldown_ms: 320.0,
    hit_window_x: 96.0,
    hit_window_y: 120.0,
    timing_scale: 86.0,
    limb_visibility: 0.5,
};

pub static MOBILE: DifficultyProfile = DifficultyProfile {
    name: "mobile",
    gravity: 1100.0,
    jump: 650.0,
    pipe_width: 66.0,
    pipe_gap: 240.0,
    pipe_speed: 118.0,
    pipe_spawn_interval: 2.0,
    bird_hitbox: 10.0,
    flap_threshold: 0.58,
    flap_cooldown_ms: 220.0,
    ball_speed: 165.0,
    ball_spawn_interval: 2.1,
    swing_threshold: 0.7,
    swing_cooldown_ms: 280.0,
    hit_window_x: 122.0,
    hit_window_y: 145.0,
    timing_scale: 102.0,
    limb_visibility: 0.42,
};

impl DifficultyProfile {
    /// Every constant must be a positive finite number and visibility a probability.
    pub fn is_well_formed(&self) -> bool {
        let positive = [
            self.gravity,
            self.jump,
            self.pipe_width,
            self.pipe_gap,
            self.pipe_speed,
            self.pipe_spawn_interval,
            self.bird_hitbox,
            self.flap_threshold,
            self.flap_cooldown_ms,
            self.ball_speed,
            self.ball_spawn_interval,
            self.swing_threshold,
            self.swing_cooldown_ms,
            self.hit_window_x,
            self.hit_window_y,
            self.timing_scale,
        ];
        positive.iter().all(|v| v.is_finite() && *v > 0.0)
            && (0.0..=1.0).contains(&self.limb_visibility)
    }
}

/// Live gravity/jump values. Start at the profile's values, the sliders may
/// override them until the next profile swap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlappyTuning {
    pub gravity: f64,
    pub jump: f64,
}

impl From<&DifficultyProfile> for FlappyTuning {
    fn from(profile: &DifficultyProfile) -> Self {
        Self {
            gravity: profile.gravity,
            jump: profile.jump,
        }
    }
}

/// Trailing-edge debounce for resize events, polled from the frame loop.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ResizeDebouncer {
    pending_since: Option<f64>,
}

impl ResizeDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart the quiet window.
    pub fn note(&mut self, now_ms: f64) {
        self.pending_since = Some(now_ms);
    }

    /// True exactly once, when the window has stayed quiet long enough.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        match self.pending_since {
            Some(at) if now_ms - at >= RESIZE_DEBOUNCE_MS => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }
}
