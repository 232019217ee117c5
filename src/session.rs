//! Session controller and frame-loop driver.
//!
//! A [`Session`] owns everything mutable about one play session: both games,
//! the gesture classifier's tracking memory, the active device profile, the
//! pose mailbox and the loop clock. The browser glue keeps exactly one of
//! these and funnels every input through it, so gesture application and tick
//! advancement are serialized on the same owner.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::game::cricket::TickEvent;
use crate::game::{
    ActiveGame, Arena, CricketGame, CricketMode, FlapOutcome, FlappyGame, FlappyMode,
    FlappyPhysics, SwingOutcome,
};
use crate::gesture::{Classification, Gesture, GestureClassifier, Status, Tone};
use crate::pose::{FrameSlot, PoseSample};
use crate::profile::{DeviceClass, DifficultyProfile, FlappyTuning, ResizeDebouncer};
use crate::{console_log, console_warn};

/// Largest simulation step; longer gaps (background tab, hitches) are cut.
pub const MAX_STEP_SECONDS: f64 = 0.03;

const INNINGS_OVER_HINT: &str = "12 balls done. Fold arms or press Reset to play again.";

/// Turns wall-clock frame timestamps into clamped simulation steps.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LoopClock {
    last_ms: Option<f64>,
}

impl LoopClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds to simulate for a frame at `now_ms`, in [0, MAX_STEP_SECONDS].
    /// The first frame only primes the clock.
    pub fn step(&mut self, now_ms: f64) -> f64 {
        let dt = self
            .last_ms
            .map_or(0.0, |last| ((now_ms - last) / 1000.0).clamp(0.0, MAX_STEP_SECONDS));
        self.last_ms = Some(now_ms);
        dt
    }
}

/// Inputs other than pose frames and ticks.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    SwitchGame(ActiveGame),
    /// Reset button.
    Reset,
    /// Device class re-evaluated after a resize.
    ProfileChanged(DeviceClass),
    SetGravity(f64),
    SetJump(f64),
    /// Camera or pose estimator could not start.
    CameraFailed(String),
}

pub struct Session<R = SmallRng> {
    active: ActiveGame,
    device: DeviceClass,
    tuning: FlappyTuning,
    flappy: FlappyGame,
    cricket: CricketGame,
    classifier: GestureClassifier,
    status: Status,
    frames: FrameSlot,
    clock: LoopClock,
    resize: ResizeDebouncer,
    rng: R,
}

impl Session<SmallRng> {
    pub fn new(device: DeviceClass, arena: Arena) -> Self {
        Self::with_rng(device, arena, SmallRng::from_entropy())
    }
}

impl<R: Rng> Session<R> {
    pub fn with_rng(device: DeviceClass, arena: Arena, rng: R) -> Self {
        let profile = device.profile();
        debug_assert!(profile.is_well_formed(), "malformed profile {}", profile.name);
        Self {
            active: ActiveGame::Flappy,
            device,
            tuning: FlappyTuning::from(profile),
            flappy: FlappyGame::new(arena),
            cricket: CricketGame::new(arena),
            classifier: GestureClassifier::new(),
            status: Status::new("Ready", Tone::Neutral, guidance(ActiveGame::Flappy, device)),
            frames: FrameSlot::new(),
            clock: LoopClock::new(),
            resize: ResizeDebouncer::new(),
            rng,
        }
    }

    pub fn active_game(&self) -> ActiveGame {
        self.active
    }

    pub fn device_class(&self) -> DeviceClass {
        self.device
    }

    pub fn profile(&self) -> &'static DifficultyProfile {
        self.device.profile()
    }

    pub fn tuning(&self) -> FlappyTuning {
        self.tuning
    }

    pub fn flappy(&self) -> &FlappyGame {
        &self.flappy
    }

    pub fn cricket(&self) -> &CricketGame {
        &self.cricket
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames.dropped()
    }

    /// Apply a control event. Returns true if anything changed.
    pub fn handle(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::SwitchGame(game) => {
                if game != self.active {
                    console_log!("switching to {}", game);
                }
                self.active = game;
                self.announce_ready();
                true
            }
            SessionEvent::Reset => {
                self.reset_active();
                self.announce_ready();
                true
            }
            SessionEvent::ProfileChanged(device) => {
                if device == self.device {
                    return false;
                }
                let profile = device.profile();
                debug_assert!(profile.is_well_formed(), "malformed profile {}", profile.name);
                console_log!("device class {} -> {}", self.device, device);
                self.device = device;
                self.tuning = FlappyTuning::from(profile);
                self.reset_active();
                self.announce_ready();
                true
            }
            SessionEvent::SetGravity(gravity) if gravity.is_finite() && gravity >= 0.0 => {
                self.tuning.gravity = gravity;
                true
            }
            SessionEvent::SetJump(jump) if jump.is_finite() && jump >= 0.0 => {
                self.tuning.jump = jump;
                true
            }
            SessionEvent::SetGravity(value) | SessionEvent::SetJump(value) => {
                console_warn!("ignoring invalid tuning value {}", value);
                false
            }
            SessionEvent::CameraFailed(reason) => {
                console_warn!("camera unavailable: {}", reason);
                self.status = Status::new(
                    "Camera access required",
                    Tone::Bad,
                    "Allow camera access in browser settings.",
                );
                true
            }
        }
    }

    /// Queue an estimator result; only the newest unprocessed one is kept.
    pub fn submit_pose(&mut self, sample: PoseSample) {
        self.frames.push(sample);
    }

    /// Classify the pending pose sample, if any, and apply the gesture.
    pub fn process_pose(&mut self) -> Option<Gesture> {
        let sample = self.frames.take()?;
        let classification = self.classifier.classify(
            sample.frame.as_ref(),
            sample.timestamp_ms,
            self.active,
            self.device.profile(),
        );
        Some(self.apply(classification))
    }

    fn apply(&mut self, classification: Classification) -> Gesture {
        let Classification { gesture, status } = classification;
        self.status = status;
        match gesture {
            Gesture::Fold => self.reset_active(),
            Gesture::Flap if self.active == ActiveGame::Flappy => {
                match self.flappy.flap(self.tuning.jump) {
                    FlapOutcome::Started | FlapOutcome::Flapped => {}
                    FlapOutcome::Ignored => {
                        self.status = Status::new(
                            "Game over",
                            Tone::Bad,
                            "Fold arms or press Reset to play again.",
                        )
                    }
                }
            }
            Gesture::Swing { power } if self.active == ActiveGame::Cricket => {
                match self.cricket.swing(power, self.device.profile()) {
                    SwingOutcome::Hit {
                        innings_over: true,
                        ..
                    }
                    | SwingOutcome::InningsOver => self.announce_innings_over(),
                    SwingOutcome::Hit { runs, .. } => {
                        self.status = Status::new(
                            "Sweet swing!",
                            Tone::Good,
                            format!(
                                "Timing score: {}. Swing when ball reaches the batter.",
                                runs
                            ),
                        );
                    }
                    SwingOutcome::Whiff => {}
                }
            }
            Gesture::Idle
                if self.active == ActiveGame::Cricket
                    && self.cricket.mode() == CricketMode::Over =>
            {
                self.announce_innings_over()
            }
            Gesture::Flap
            | Gesture::Swing { .. }
            | Gesture::Idle
            | Gesture::NoTracking
            | Gesture::Baseline => {}
        }
        gesture
    }

    /// Advance the active game for a frame at `now_ms`. Returns the step used.
    pub fn tick(&mut self, now_ms: f64) -> f64 {
        let dt = self.clock.step(now_ms);
        match self.active {
            ActiveGame::Flappy => {
                let physics = FlappyPhysics::new(self.device.profile(), self.tuning);
                let before = self.flappy.mode();
                self.flappy.tick(dt, &physics, &mut self.rng);
                if before == FlappyMode::Running && self.flappy.mode() == FlappyMode::GameOver {
                    console_log!("flappy game over, score {}", self.flappy.score());
                }
            }
            ActiveGame::Cricket => {
                match self.cricket.tick(dt, self.device.profile(), &mut self.rng) {
                    TickEvent::Missed { innings_over: true } => self.announce_innings_over(),
                    TickEvent::Missed {
                        innings_over: false,
                    } => {
                        self.status = Status::new(
                            "Missed ball",
                            Tone::Bad,
                            "Swing a little later when ball reaches the batter.",
                        );
                    }
                    TickEvent::Bowled | TickEvent::Quiet => {}
                }
            }
        }
        dt
    }

    pub fn note_resize(&mut self, now_ms: f64) {
        self.resize.note(now_ms);
    }

    /// True once per burst of resizes, after it has settled.
    pub fn resize_due(&mut self, now_ms: f64) -> bool {
        self.resize.poll(now_ms)
    }

    fn reset_active(&mut self) {
        match self.active {
            ActiveGame::Flappy => self.flappy.reset(),
            ActiveGame::Cricket => self.cricket.reset(),
        }
    }

    fn announce_ready(&mut self) {
        self.status = Status::new("Ready", Tone::Neutral, guidance(self.active, self.device));
    }

    fn announce_innings_over(&mut self) {
        if self.status.text != "Innings over" {
            console_log!("innings over, {} runs", self.cricket.runs());
        }
        self.status = Status::new("Innings over", Tone::Good, INNINGS_OVER_HINT);
    }
}

/// Mode guidance shown after switching games, resets and profile swaps.
pub fn guidance(game: ActiveGame, device: DeviceClass) -> &'static str {
    match (game, device) {
        (ActiveGame::Flappy, DeviceClass::Mobile) => {
            "Mobile Flappy: quick up-flaps jump. Fold arms to reset."
        }
        (ActiveGame::Flappy, DeviceClass::Desktop) => {
            "Flappy mode: flap hands to jump. Fold arms to reset."
        }
        (ActiveGame::Cricket, DeviceClass::Mobile) => {
            "Mobile Cricket: swing right hand, 12 balls, score 1/2/3/4/6."
        }
        (ActiveGame::Cricket, DeviceClass::Desktop) => {
            "Cricket mode: 12 balls, score 1/2/3/4/6 by timing your swing."
        }
    }
}
