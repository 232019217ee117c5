//! Gesture classification from body landmarks.
//!
//! Every processed camera frame goes through [`GestureClassifier::classify`],
//! which yields at most one discrete gesture plus a status line for the
//! player. Velocity gestures (flap, swing) need two consecutive confident
//! frames; any low-confidence frame drops the baseline so stale positions can
//! never produce a velocity spike. Folding the arms resets the active game and
//! wins over anything else detected in the same frame.

use crate::game::ActiveGame;
use crate::pose::{LandmarkFrame, PoseTrackingState, UpperBody, WristSample};
use crate::profile::DifficultyProfile;

/// Shoulders are gated the same on every device.
pub const SHOULDER_VISIBILITY: f64 = 0.45;
/// Minimum spacing between two fold resets.
pub const FOLD_COOLDOWN_MS: f64 = 950.0;

// Fold-arms geometry, in shoulder widths.
const FOLD_WRIST_TO_ELBOW: f64 = 0.95;
const FOLD_WRIST_TO_MIDLINE: f64 = 0.8;
const FOLD_WRIST_TO_SHOULDER_HEIGHT: f64 = 1.15;

// Flap rules, as fractions of the profile flap threshold.
const FLAP_BOTH_HANDS: f64 = 0.75;
const FLAP_ONE_HAND: f64 = 1.25;
const FLAP_ALMOST: f64 = 0.6;
/// Wrists may sit at most this far below their elbows for a flap to count.
const FLAP_ELBOW_SLACK: f64 = 0.11;

/// The right wrist must be above shoulder height plus this slack to swing.
const SWING_HEIGHT_SLACK: f64 = 0.5;

/// Smallest elapsed time used for velocities.
const MIN_SAMPLE_SECONDS: f64 = 0.001;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gesture {
    /// Nobody detected, or a required joint below its confidence gate.
    NoTracking,
    /// First confident frame after a gap; positions recorded, nothing fired.
    Baseline,
    /// Arms folded across the chest: reset the active game.
    Fold,
    Flap,
    /// Right-hand swing; `power` already clamped to [0.2, 1.5].
    Swing { power: f64 },
    /// Confident frame, no gesture.
    Idle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Good,
    Neutral,
    Bad,
}

impl Tone {
    pub fn css_class(self) -> &'static str {
        match self {
            Tone::Good => "good",
            Tone::Neutral => "neutral",
            Tone::Bad => "bad",
        }
    }
}

/// Headline plus a hint line shown under it.
#[derive(Clone, Debug, PartialEq)]
pub struct Status {
    pub text: String,
    pub tone: Tone,
    pub hint: String,
}

impl Status {
    pub fn new(text: impl Into<String>, tone: Tone, hint: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone,
            hint: hint.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    pub gesture: Gesture,
    pub status: Status,
}

impl Classification {
    fn new(gesture: Gesture, status: Status) -> Self {
        Self { gesture, status }
    }
}

/// Holds the per-session tracking memory and turns frames into gestures.
#[derive(Clone, Debug, Default)]
pub struct GestureClassifier {
    tracking: PoseTrackingState,
}

impl GestureClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracking(&self) -> &PoseTrackingState {
        &self.tracking
    }

    /// Classify one estimator result. `frame == None` means no person.
    pub fn classify(
        &mut self,
        frame: Option<&LandmarkFrame>,
        now_ms: f64,
        game: ActiveGame,
        profile: &DifficultyProfile,
    ) -> Classification {
        let Some(frame) = frame else {
            self.tracking.lose_tracking();
            return Classification::new(
                Gesture::NoTracking,
                Status::new(
                    "No person detected",
                    Tone::Bad,
                    "Step back and keep both arms visible.",
                ),
            );
        };

        let body = frame.upper_body();
        if !is_confident(&body, profile.limb_visibility) {
            self.tracking.lose_tracking();
            return Classification::new(
                Gesture::NoTracking,
                Status::new(
                    "Hands not tracked",
                    Tone::Neutral,
                    "Keep upper body and both hands visible.",
                ),
            );
        }

        let Some(previous) = self.tracking.previous() else {
            self.tracking.rebaseline(&body, now_ms);
            return Classification::new(
                Gesture::Baseline,
                Status::new("Tracking", Tone::Neutral, "Hold still for a moment."),
            );
        };

        let dt = ((now_ms - previous.at_ms) / 1000.0).max(MIN_SAMPLE_SECONDS);
        let shoulder_width = body.shoulder_width();

        let fold_ready = self.tracking.fold_ready(now_ms, FOLD_COOLDOWN_MS);
        if fold_ready && is_folded_arms(&body, shoulder_width) {
            self.tracking.mark_fold(now_ms);
            self.tracking.rebaseline(&body, now_ms);
            let hint = match game {
                ActiveGame::Flappy => "Flap up to start. Fold arms anytime to reset.",
                ActiveGame::Cricket => "Swing to hit. Fold arms anytime to reset innings.",
            };
            return Classification::new(
                Gesture::Fold,
                Status::new("Arms folded: reset", Tone::Good, hint),
            );
        }

        let result = match game {
            ActiveGame::Flappy => self.classify_flap(&body, &previous, dt, now_ms, profile),
            ActiveGame::Cricket => self.classify_swing(&body, &previous, dt, now_ms, profile),
        };

        self.tracking.rebaseline(&body, now_ms);
        result
    }

    fn classify_flap(
        &mut self,
        body: &UpperBody,
        previous: &WristSample,
        dt: f64,
        now_ms: f64,
        profile: &DifficultyProfile,
    ) -> Classification {
        // y grows downward, so upward motion is previous - current.
        let left_up = (previous.left_y - body.left_wrist.y) / dt;
        let right_up = (previous.right_y - body.right_wrist.y) / dt;
        let mean_up = (left_up + right_up) / 2.0;
        let threshold = profile.flap_threshold;

        let arms_not_overhead = body.left_wrist.y < body.left_elbow.y + FLAP_ELBOW_SLACK
            && body.right_wrist.y < body.right_elbow.y + FLAP_ELBOW_SLACK;
        let cooldown_ready = self.tracking.flap_ready(now_ms, profile.flap_cooldown_ms);
        let both_hands =
            left_up > threshold * FLAP_BOTH_HANDS && right_up > threshold * FLAP_BOTH_HANDS;
        let one_hand_power =
            left_up > threshold * FLAP_ONE_HAND || right_up > threshold * FLAP_ONE_HAND;
        let fast_enough = mean_up > threshold || both_hands || one_hand_power;

        if cooldown_ready && arms_not_overhead && fast_enough {
            self.tracking.mark_flap(now_ms);
            Classification::new(
                Gesture::Flap,
                Status::new(
                    "Flap detected!",
                    Tone::Good,
                    "Nice. Keep flapping upward. Fold arms to reset.",
                ),
            )
        } else if mean_up > threshold * FLAP_ALMOST {
            Classification::new(
                Gesture::Idle,
                Status::new(
                    "Almost there",
                    Tone::Neutral,
                    "Good start. Raise both hands up a little faster.",
                ),
            )
        } else {
            Classification::new(
                Gesture::Idle,
                Status::new(
                    "Ready",
                    Tone::Neutral,
                    "Quick upward flaps jump. Fold arms to reset.",
                ),
            )
        }
    }

    fn classify_swing(
        &mut self,
        body: &UpperBody,
        previous: &WristSample,
        dt: f64,
        now_ms: f64,
        profile: &DifficultyProfile,
    ) -> Classification {
        let speed = ((body.right_wrist.x - previous.right_x) / dt).abs();
        let height_ok = body.right_wrist.y < body.right_shoulder.y + SWING_HEIGHT_SLACK;
        let cooldown_ready = self.tracking.swing_ready(now_ms, profile.swing_cooldown_ms);

        if speed > profile.swing_threshold && height_ok && cooldown_ready {
            self.tracking.mark_swing(now_ms);
            Classification::new(
                Gesture::Swing {
                    power: swing_power(speed, profile.swing_threshold),
                },
                Status::new(
                    "Swing detected",
                    Tone::Neutral,
                    "Good swing. Time it when the ball is near the batter.",
                ),
            )
        } else {
            Classification::new(
                Gesture::Idle,
                Status::new(
                    "Ready",
                    Tone::Neutral,
                    "Cricket mode: swing your right hand to hit. Fold arms to reset.",
                ),
            )
        }
    }
}

/// Swing strength from how far the wrist speed cleared the threshold.
pub fn swing_power(speed: f64, threshold: f64) -> f64 {
    ((speed - threshold + 0.2) / 1.4).clamp(0.2, 1.5)
}

fn is_confident(body: &UpperBody, limb_visibility: f64) -> bool {
    [
        body.left_wrist,
        body.right_wrist,
        body.left_elbow,
        body.right_elbow,
    ]
    .iter()
    .all(|l| l.visibility > limb_visibility)
        && body.left_shoulder.visibility > SHOULDER_VISIBILITY
        && body.right_shoulder.visibility > SHOULDER_VISIBILITY
}

/// Each wrist near the opposite elbow, near the torso midline and roughly at
/// shoulder height. All distances in shoulder widths.
pub fn is_folded_arms(body: &UpperBody, shoulder_width: f64) -> bool {
    let midline_x = (body.left_shoulder.x + body.right_shoulder.x) / 2.0;
    let shoulder_y = (body.left_shoulder.y + body.right_shoulder.y) / 2.0;

    let near_opposite_elbows = body.left_wrist.distance_to(&body.right_elbow) / shoulder_width
        < FOLD_WRIST_TO_ELBOW
        && body.right_wrist.distance_to(&body.left_elbow) / shoulder_width < FOLD_WRIST_TO_ELBOW;
    let near_midline = (body.left_wrist.x - midline_x).abs() / shoulder_width
        < FOLD_WRIST_TO_MIDLINE
        && (body.right_wrist.x - midline_x).abs() / shoulder_width < FOLD_WRIST_TO_MIDLINE;
    let at_chest = (body.left_wrist.y - shoulder_y).abs() / shoulder_width
        < FOLD_WRIST_TO_SHOULDER_HEIGHT
        && (body.right_wrist.y - shoulder_y).abs() / shoulder_width
            < FOLD_WRIST_TO_SHOULDER_HEIGHT;

    near_opposite_elbows && near_midline && at_chest
}
