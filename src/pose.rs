//! Pose landmark intake.
//!
//! The browser-side pose estimator hands us 33 body landmarks per processed
//! video frame as a flat array of `(x, y, visibility)` triples. Frames land in a
//! single-slot mailbox; the frame loop takes the newest one and feeds it to the
//! gesture classifier. Older frames that were never consumed are dropped.

use std::fmt;

// ============================================================================
// LANDMARK INDICES (33-point body pose)
// ============================================================================

pub const LANDMARK_COUNT: usize = 33;
/// Values per landmark in the flat JS payload: x, y, visibility.
pub const VALUES_PER_LANDMARK: usize = 3;

pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_ELBOW: usize = 13;
pub const RIGHT_ELBOW: usize = 14;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;

/// A single tracked keypoint. `x`/`y` are normalized to the video frame
/// (y grows downward), `visibility` is the estimator's confidence.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub visibility: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, visibility: f64) -> Self {
        Self { x, y, visibility }
    }

    pub fn distance_to(&self, other: &Landmark) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameError {
    WrongLength { got: usize },
    NonFinite { index: usize },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::WrongLength { got } => write!(
                f,
                "invalid landmark data length: {} (expected {})",
                got,
                LANDMARK_COUNT * VALUES_PER_LANDMARK
            ),
            FrameError::NonFinite { index } => {
                write!(f, "landmark {} contains a non-finite value", index)
            }
        }
    }
}

impl std::error::Error for FrameError {}

/// One full set of body landmarks from a single processed video frame.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkFrame {
    landmarks: [Landmark; LANDMARK_COUNT],
}

impl LandmarkFrame {
    pub fn new(landmarks: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { landmarks }
    }

    /// Build a frame from the flat `[x0, y0, v0, x1, y1, v1, ...]` layout JS sends.
    pub fn from_flat(data: &[f64]) -> Result<Self, FrameError> {
        if data.len() != LANDMARK_COUNT * VALUES_PER_LANDMARK {
            return Err(FrameError::WrongLength { got: data.len() });
        }
        let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
        for (i, chunk) in data.chunks_exact(VALUES_PER_LANDMARK).enumerate() {
            if chunk.iter().any(|v| !v.is_finite()) {
                return Err(FrameError::NonFinite { index: i });
            }
            landmarks[i] = Landmark::new(chunk[0], chunk[1], chunk[2]);
        }
        Ok(Self { landmarks })
    }

    pub fn get(&self, index: usize) -> Landmark {
        self.landmarks[index]
    }

    /// The six joints the gesture rules look at.
    pub fn upper_body(&self) -> UpperBody {
        UpperBody {
            left_shoulder: self.get(LEFT_SHOULDER),
            right_shoulder: self.get(RIGHT_SHOULDER),
            left_elbow: self.get(LEFT_ELBOW),
            right_elbow: self.get(RIGHT_ELBOW),
            left_wrist: self.get(LEFT_WRIST),
            right_wrist: self.get(RIGHT_WRIST),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UpperBody {
    pub left_shoulder: Landmark,
    pub right_shoulder: Landmark,
    pub left_elbow: Landmark,
    pub right_elbow: Landmark,
    pub left_wrist: Landmark,
    pub right_wrist: Landmark,
}

impl UpperBody {
    /// Horizontal shoulder span, floored so it can be used as a divisor.
    pub fn shoulder_width(&self) -> f64 {
        (self.left_shoulder.x - self.right_shoulder.x)
            .abs()
            .max(0.001)
    }
}

/// Estimator output for one camera frame. `frame == None` means nobody was
/// detected at all.
#[derive(Clone, Debug, PartialEq)]
pub struct PoseSample {
    pub frame: Option<LandmarkFrame>,
    pub timestamp_ms: f64,
}

impl PoseSample {
    pub fn detected(frame: LandmarkFrame, timestamp_ms: f64) -> Self {
        Self {
            frame: Some(frame),
            timestamp_ms,
        }
    }

    pub fn absent(timestamp_ms: f64) -> Self {
        Self {
            frame: None,
            timestamp_ms,
        }
    }
}

/// Latest-wins mailbox between the pose callback and the frame loop.
#[derive(Debug, Default)]
pub struct FrameSlot {
    latest: Option<PoseSample>,
    dropped: u64,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a sample, replacing any unconsumed one. Returns true if a stale
    /// sample was overwritten.
    pub fn push(&mut self, sample: PoseSample) -> bool {
        let replaced = self.latest.replace(sample).is_some();
        if replaced {
            self.dropped += 1;
        }
        replaced
    }

    pub fn take(&mut self) -> Option<PoseSample> {
        self.latest.take()
    }

    /// Number of samples overwritten before the loop got to them.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Wrist positions remembered from the previous confident frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WristSample {
    pub left_y: f64,
    pub right_y: f64,
    pub right_x: f64,
    pub at_ms: f64,
}

impl WristSample {
    pub fn from_body(body: &UpperBody, at_ms: f64) -> Self {
        Self {
            left_y: body.left_wrist.y,
            right_y: body.right_wrist.y,
            right_x: body.right_wrist.x,
            at_ms,
        }
    }
}

/// Per-session tracking memory used for velocity gestures and cooldowns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoseTrackingState {
    previous: Option<WristSample>,
    last_flap_at: Option<f64>,
    last_swing_at: Option<f64>,
    last_fold_at: Option<f64>,
}

impl PoseTrackingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self) -> Option<WristSample> {
        self.previous
    }

    /// Drop the velocity baseline; the next confident frame re-baselines.
    pub fn lose_tracking(&mut self) {
        self.previous = None;
    }

    pub fn rebaseline(&mut self, body: &UpperBody, now_ms: f64) {
        self.previous = Some(WristSample::from_body(body, now_ms));
    }

    pub fn flap_ready(&self, now_ms: f64, cooldown_ms: f64) -> bool {
        cooldown_elapsed(self.last_flap_at, now_ms, cooldown_ms)
    }

    pub fn swing_ready(&self, now_ms: f64, cooldown_ms: f64) -> bool {
        cooldown_elapsed(self.last_swing_at, now_ms, cooldown_ms)
    }

    pub fn fold_ready(&self, now_ms: f64, cooldown_ms: f64) -> bool {
        cooldown_elapsed(self.last_fold_at, now_ms, cooldown_ms)
    }

    pub fn mark_flap(&mut self, now_ms: f64) {
        self.last_flap_at = Some(now_ms);
    }

    pub fn mark_swing(&mut self, now_ms: f64) {
        self.last_swing_at = Some(now_ms);
    }

    pub fn mark_fold(&mut self, now_ms: f64) {
        self.last_fold_at = Some(now_ms);
    }
}

fn cooldown_elapsed(last: Option<f64>, now_ms: f64, cooldown_ms: f64) -> bool {
    last.is_none_or(|at| now_ms - at > cooldown_ms)
}
