//! Flappy: a bird falls under gravity, flaps upward on gesture, and threads
//! through scrolling pipe gaps.

use rand::Rng;

use super::Arena;
use crate::profile::{DifficultyProfile, FlappyTuning};

/// Bird column; the bird only moves vertically.
pub const BIRD_X: f64 = 90.0;
/// Top/bottom bound margin (bird radius).
pub const BIRD_RADIUS: f64 = 16.0;
/// Vertical padding kept clear of pipe gaps.
const GAP_PADDING: f64 = 80.0;
/// Pipes enter this far past the right edge.
const PIPE_SPAWN_OFFSET: f64 = 30.0;
/// Pipes are dropped once their trailing edge is this far left of the canvas.
const PIPE_DISCARD_X: f64 = -10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlappyMode {
    Waiting,
    Running,
    GameOver,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Transition {
    Flap,
    Collide,
    Reset,
}

impl FlappyMode {
    /// Transition table. `None` means the input is ignored in that mode.
    fn next(self, input: Transition) -> Option<FlappyMode> {
        use FlappyMode::*;
        match (self, input) {
            (_, Transition::Reset) => Some(Waiting),
            (Waiting, Transition::Flap) => Some(Running),
            (Running, Transition::Flap) => Some(Running),
            (Running, Transition::Collide) => Some(GameOver),
            (GameOver, Transition::Flap) => None,
            (Waiting, Transition::Collide) | (GameOver, Transition::Collide) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pipe {
    pub x: f64,
    pub width: f64,
    pub gap_y: f64,
    pub gap_height: f64,
    pub scored: bool,
}

impl Pipe {
    pub fn trailing_edge(&self) -> f64 {
        self.x + self.width
    }

    fn hits(&self, bird_y: f64, hitbox: f64) -> bool {
        let in_x = BIRD_X + hitbox > self.x && BIRD_X - hitbox < self.trailing_edge();
        let above_gap = bird_y - hitbox < self.gap_y;
        let below_gap = bird_y + hitbox > self.gap_y + self.gap_height;
        in_x && (above_gap || below_gap)
    }
}

/// Constants for one tick, merged from the profile and the live tuning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlappyPhysics {
    pub gravity: f64,
    pub jump: f64,
    pub pipe_width: f64,
    pub pipe_gap: f64,
    pub pipe_speed: f64,
    pub pipe_spawn_interval: f64,
    pub bird_hitbox: f64,
}

impl FlappyPhysics {
    pub fn new(profile: &DifficultyProfile, tuning: FlappyTuning) -> Self {
        Self {
            gravity: tuning.gravity,
            jump: tuning.jump,
            pipe_width: profile.pipe_width,
            pipe_gap: profile.pipe_gap,
            pipe_speed: profile.pipe_speed,
            pipe_spawn_interval: profile.pipe_spawn_interval,
            bird_hitbox: profile.bird_hitbox,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlapOutcome {
    Started,
    Flapped,
    Ignored,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FlappyGame {
    arena: Arena,
    mode: FlappyMode,
    bird_y: f64,
    bird_velocity: f64,
    score: u32,
    best: u32,
    pipes: Vec<Pipe>,
    spawn_timer: f64,
}

impl FlappyGame {
    pub fn new(arena: Arena) -> Self {
        Self {
            arena,
            mode: FlappyMode::Waiting,
            bird_y: start_y(arena),
            bird_velocity: 0.0,
            score: 0,
            best: 0,
            pipes: Vec::new(),
            spawn_timer: 0.0,
        }
    }

    pub fn mode(&self) -> FlappyMode {
        self.mode
    }

    pub fn arena(&self) -> Arena {
        self.arena
    }

    pub fn bird_y(&self) -> f64 {
        self.bird_y
    }

    pub fn bird_velocity(&self) -> f64 {
        self.bird_velocity
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn best(&self) -> u32 {
        self.best
    }

    pub fn pipes(&self) -> &[Pipe] {
        &self.pipes
    }

    /// Back to waiting. Best score survives.
    pub fn reset(&mut self) {
        self.mode = self.mode.next(Transition::Reset).unwrap_or(FlappyMode::Waiting);
        self.bird_y = start_y(self.arena);
        self.bird_velocity = 0.0;
        self.score = 0;
        self.pipes.clear();
        self.spawn_timer = 0.0;
    }

    /// Apply a flap gesture: starts the run from waiting, kicks the bird
    /// upward while running, does nothing after game over.
    pub fn flap(&mut self, jump: f64) -> FlapOutcome {
        let previous = self.mode;
        let Some(next) = self.mode.next(Transition::Flap) else {
            return FlapOutcome::Ignored;
        };
        self.mode = next;
        self.bird_velocity = -jump;
        if previous == FlappyMode::Waiting {
            FlapOutcome::Started
        } else {
            FlapOutcome::Flapped
        }
    }

    /// Advance the run by `dt` seconds. Only the running mode moves.
    pub fn tick<R: Rng + ?Sized>(&mut self, dt: f64, physics: &FlappyPhysics, rng: &mut R) {
        match self.mode {
            FlappyMode::Waiting | FlappyMode::GameOver => return,
            FlappyMode::Running => {}
        }

        self.bird_velocity += physics.gravity * dt;
        self.bird_y += self.bird_velocity * dt;

        self.spawn_timer += dt;
        if self.spawn_timer >= physics.pipe_spawn_interval {
            self.spawn_timer = 0.0;
            self.spawn_pipe(physics, rng);
        }

        for pipe in self.pipes.iter_mut() {
            pipe.x -= physics.pipe_speed * dt;
            if !pipe.scored && pipe.trailing_edge() < BIRD_X {
                pipe.scored = true;
                self.score += 1;
                self.best = self.best.max(self.score);
            }
        }
        self.pipes.retain(|p| p.trailing_edge() > PIPE_DISCARD_X);

        let out_of_bounds =
            self.bird_y < BIRD_RADIUS || self.bird_y > self.arena.height - BIRD_RADIUS;
        let hit_pipe = self
            .pipes
            .iter()
            .any(|p| p.hits(self.bird_y, physics.bird_hitbox));
        if out_of_bounds || hit_pipe {
            if let Some(next) = self.mode.next(Transition::Collide) {
                self.mode = next;
            }
        }
    }

    fn spawn_pipe<R: Rng + ?Sized>(&mut self, physics: &FlappyPhysics, rng: &mut R) {
        let span = (self.arena.height - GAP_PADDING * 2.0 - physics.pipe_gap).max(0.0);
        let gap_y = GAP_PADDING + rng.gen_range(0.0..1.0) * span;
        self.pipes.push(Pipe {
            x: self.arena.width + PIPE_SPAWN_OFFSET,
            width: physics.pipe_width,
            gap_y,
            gap_height: physics.pipe_gap,
            scored: false,
        });
    }
}

fn start_y(arena: Arena) -> f64 {
    arena.height * 0.45
}
