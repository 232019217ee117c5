//! Cricket: balls are bowled across the pitch one at a time and the player
//! swings to hit them. Runs depend only on timing. An innings is 12 balls.

use std::fmt;

use rand::Rng;

use super::Arena;
use crate::profile::DifficultyProfile;

pub const MAX_BALLS: u32 = 12;
pub const BATTER_X: f64 = 322.0;
pub const BATTER_Y: f64 = 432.0;
/// Bat resting angle (radians); the swing animates away from it and back.
pub const BAT_REST_ANGLE: f64 = -0.35;
/// Angular acceleration pulling the bat back to rest.
const BAT_RESTORE: f64 = 24.0;
const FLASH_SECONDS: f64 = 0.8;
const BALL_START_X: f64 = -20.0;
const BALL_BAND_TOP: f64 = 315.0;
const BALL_BAND_HEIGHT: f64 = 155.0;
const BALL_SPEED_JITTER: f64 = 12.0;
const BALL_DRIFT_JITTER: f64 = 26.0;
/// An unhit ball counts as a miss once it is this far past the right edge.
const BALL_EXIT_MARGIN: f64 = 30.0;

/// Timing error upper bounds and the runs they score, best first.
const TIMING_TABLE: [(f64, u8); 4] = [(0.1, 6), (0.2, 4), (0.33, 3), (0.55, 2)];

/// Runs for a normalized timing error. Anything late or early enough still
/// scores a single.
pub fn runs_for_timing(error: f64) -> u8 {
    TIMING_TABLE
        .iter()
        .find(|(bound, _)| error < *bound)
        .map(|(_, runs)| *runs)
        .unwrap_or(1)
}

pub fn timing_error(ball_x: f64, timing_scale: f64) -> f64 {
    (ball_x - BATTER_X).abs() / timing_scale
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CricketMode {
    Running,
    Over,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Transition {
    BallFaced { balls: u32 },
    Reset,
}

impl CricketMode {
    fn next(self, input: Transition) -> Option<CricketMode> {
        match (self, input) {
            (_, Transition::Reset) => Some(CricketMode::Running),
            (CricketMode::Running, Transition::BallFaced { balls }) if balls >= MAX_BALLS => {
                Some(CricketMode::Over)
            }
            (CricketMode::Running, Transition::BallFaced { .. }) => Some(CricketMode::Running),
            (CricketMode::Over, Transition::BallFaced { .. }) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ball {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub active: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LastShot {
    #[default]
    Nothing,
    Runs(u8),
    Miss,
}

impl fmt::Display for LastShot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LastShot::Nothing => f.write_str("-"),
            LastShot::Runs(1) => f.write_str("1 run"),
            LastShot::Runs(n) => write!(f, "{} runs", n),
            LastShot::Miss => f.write_str("Miss"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwingOutcome {
    /// Connected with the ball.
    Hit { runs: u8, innings_over: bool },
    /// Bat swung with nothing in the hit window.
    Whiff,
    /// Innings finished; the bat still animates.
    InningsOver,
}

/// What a tick did with the ball, if anything worth reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickEvent {
    Quiet,
    Bowled,
    Missed { innings_over: bool },
}

#[derive(Clone, Debug, PartialEq)]
pub struct CricketGame {
    arena: Arena,
    mode: CricketMode,
    runs: u32,
    balls: u32,
    last_shot: LastShot,
    ball: Option<Ball>,
    spawn_timer: f64,
    flash_timer: f64,
    flash_runs: u8,
    bat_angle: f64,
    bat_angular_velocity: f64,
}

impl CricketGame {
    pub fn new(arena: Arena) -> Self {
        Self {
            arena,
            mode: CricketMode::Running,
            runs: 0,
            balls: 0,
            last_shot: LastShot::Nothing,
            ball: None,
            spawn_timer: 0.0,
            flash_timer: 0.0,
            flash_runs: 0,
            bat_angle: BAT_REST_ANGLE,
            bat_angular_velocity: 0.0,
        }
    }

    pub fn mode(&self) -> CricketMode {
        self.mode
    }

    pub fn arena(&self) -> Arena {
        self.arena
    }

    pub fn runs(&self) -> u32 {
        self.runs
    }

    pub fn balls(&self) -> u32 {
        self.balls
    }

    pub fn last_shot(&self) -> LastShot {
        self.last_shot
    }

    pub fn ball(&self) -> Option<&Ball> {
        self.ball.as_ref()
    }

    pub fn bat_angle(&self) -> f64 {
        self.bat_angle
    }

    /// Remaining flash time and the runs it shows.
    pub fn flash(&self) -> Option<(f64, u8)> {
        (self.flash_timer > 0.0).then_some((self.flash_timer, self.flash_runs))
    }

    /// Fresh innings.
    pub fn reset(&mut self) {
        *self = Self {
            mode: self.mode.next(Transition::Reset).unwrap_or(CricketMode::Running),
            ..Self::new(self.arena)
        };
    }

    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        dt: f64,
        profile: &DifficultyProfile,
        rng: &mut R,
    ) -> TickEvent {
        self.bat_angle += self.bat_angular_velocity * dt;
        self.bat_angular_velocity += BAT_RESTORE * dt;
        if self.bat_angle > BAT_REST_ANGLE {
            self.bat_angle = BAT_REST_ANGLE;
            self.bat_angular_velocity = 0.0;
        }

        match self.mode {
            CricketMode::Over => {
                self.ball = None;
                return TickEvent::Quiet;
            }
            CricketMode::Running => {}
        }

        let mut event = TickEvent::Quiet;
        self.spawn_timer += dt;
        if self.ball.is_none() && self.spawn_timer >= profile.ball_spawn_interval {
            self.spawn_timer = 0.0;
            self.ball = Some(bowl(profile.ball_speed, rng));
            event = TickEvent::Bowled;
        }

        let exit_x = self.arena.width + BALL_EXIT_MARGIN;
        if let Some(ball) = self.ball.as_mut().filter(|b| b.active) {
            ball.x += ball.vx * dt;
            ball.y += ball.vy * dt;
            if ball.x > exit_x {
                self.ball = None;
                self.last_shot = LastShot::Miss;
                let innings_over = self.face_ball();
                event = TickEvent::Missed { innings_over };
            }
        }

        if self.flash_timer > 0.0 {
            self.flash_timer = (self.flash_timer - dt).max(0.0);
        }
        event
    }

    /// Swing the bat with `power` in [0.2, 1.5]; connects if a live ball sits
    /// inside the hit window around the batter.
    pub fn swing(&mut self, power: f64, profile: &DifficultyProfile) -> SwingOutcome {
        let power = power.clamp(0.2, 1.5);
        self.bat_angular_velocity = -8.0 - power * 8.0;

        if self.mode == CricketMode::Over {
            return SwingOutcome::InningsOver;
        }
        let in_window = self.ball.as_ref().is_some_and(|b| {
            b.active
                && (b.x - BATTER_X).abs() < profile.hit_window_x
                && (b.y - BATTER_Y).abs() < profile.hit_window_y
        });
        if !in_window {
            return SwingOutcome::Whiff;
        }
        let Some(ball) = self.ball.take() else {
            return SwingOutcome::Whiff;
        };
        let runs = runs_for_timing(timing_error(ball.x, profile.timing_scale));
        self.runs += u32::from(runs);
        self.last_shot = LastShot::Runs(runs);
        self.flash_runs = runs;
        self.flash_timer = FLASH_SECONDS;
        let innings_over = self.face_ball();
        SwingOutcome::Hit { runs, innings_over }
    }

    /// Count a resolved ball. Returns true when this ball ended the innings.
    fn face_ball(&mut self) -> bool {
        self.balls = (self.balls + 1).min(MAX_BALLS);
        match self.mode.next(Transition::BallFaced { balls: self.balls }) {
            Some(CricketMode::Over) => {
                self.mode = CricketMode::Over;
                self.ball = None;
                true
            }
            Some(mode) => {
                self.mode = mode;
                false
            }
            None => false,
        }
    }
}

fn bowl<R: Rng + ?Sized>(speed: f64, rng: &mut R) -> Ball {
    Ball {
        x: BALL_START_X,
        y: BALL_BAND_TOP + rng.gen_range(0.0..1.0) * BALL_BAND_HEIGHT,
        vx: speed + (rng.gen_range(0.0..1.0) - 0.5) * BALL_SPEED_JITTER,
        vy: (rng.gen_range(0.0..1.0) - 0.5) * BALL_DRIFT_JITTER,
        active: true,
    }
}
