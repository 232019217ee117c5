// Integration tests (native) for the `pose-arcade` crate.
// These drive the session and the two simulations through their public API
// with synthetic landmark frames; nothing here needs a browser.

use pose_arcade::game::cricket::{BATTER_X, BATTER_Y};
use pose_arcade::game::{
    ActiveGame, Arena, CricketMode, FlappyGame, FlappyMode, FlappyPhysics, LastShot,
};
use pose_arcade::gesture::Gesture;
use pose_arcade::pose::{LANDMARK_COUNT, LandmarkFrame, PoseSample};
use pose_arcade::profile::{DESKTOP, DeviceClass, FlappyTuning};
use pose_arcade::session::{MAX_STEP_SECONDS, Session, SessionEvent};
use rand::SeedableRng;
use rand::rngs::SmallRng;

// (x, y) for shoulders 11/12, elbows 13/14, wrists 15/16.
type Joints = [(f64, f64); 6];

const ARMS_DOWN: Joints = [
    (0.4, 0.4),
    (0.6, 0.4),
    (0.35, 0.55),
    (0.65, 0.55),
    (0.33, 0.5),
    (0.67, 0.5),
];

const ARMS_RAISED: Joints = [
    (0.4, 0.4),
    (0.6, 0.4),
    (0.35, 0.55),
    (0.65, 0.55),
    (0.33, 0.2),
    (0.67, 0.2),
];

const ARMS_FOLDED: Joints = [
    (0.4, 0.4),
    (0.6, 0.4),
    (0.4, 0.52),
    (0.6, 0.52),
    (0.58, 0.5),
    (0.42, 0.5),
];

// Right wrist swept outward; 0.2 in 50 ms is 4/s.
const RIGHT_SWEPT: Joints = [
    (0.4, 0.4),
    (0.6, 0.4),
    (0.35, 0.55),
    (0.65, 0.55),
    (0.33, 0.5),
    (0.87, 0.5),
];

fn frame(joints: Joints, visibility: f64) -> LandmarkFrame {
    let mut flat = Vec::with_capacity(LANDMARK_COUNT * 3);
    for i in 0..LANDMARK_COUNT {
        let (x, y) = match i {
            11..=16 => joints[i - 11],
            _ => (0.5, 0.5),
        };
        flat.extend_from_slice(&[x, y, visibility]);
    }
    LandmarkFrame::from_flat(&flat).expect("well-formed frame")
}

fn pose(s: &mut Session<SmallRng>, joints: Joints, at_ms: f64) -> Option<Gesture> {
    s.submit_pose(PoseSample::detected(frame(joints, 0.99), at_ms));
    s.process_pose()
}

fn session() -> Session<SmallRng> {
    Session::with_rng(DeviceClass::Desktop, Arena::default(), SmallRng::seed_from_u64(7))
}

#[test]
fn flap_gesture_starts_flappy() {
    let mut s = session();
    assert_eq!(pose(&mut s, ARMS_DOWN, 0.0), Some(Gesture::Baseline));
    assert_eq!(pose(&mut s, ARMS_RAISED, 100.0), Some(Gesture::Flap));
    assert_eq!(s.flappy().mode(), FlappyMode::Running);
    assert_eq!(s.flappy().bird_velocity(), -DESKTOP.jump);
}

#[test]
fn low_confidence_frame_is_no_tracking_and_drops_baseline() {
    let mut s = session();
    pose(&mut s, ARMS_DOWN, 0.0);
    s.submit_pose(PoseSample::detected(frame(ARMS_DOWN, 0.1), 50.0));
    assert_eq!(s.process_pose(), Some(Gesture::NoTracking));
    // The next confident frame only re-baselines, even with a big jump.
    assert_eq!(pose(&mut s, ARMS_RAISED, 100.0), Some(Gesture::Baseline));
    assert_eq!(s.flappy().mode(), FlappyMode::Waiting);
}

#[test]
fn only_the_newest_pose_is_processed() {
    let mut s = session();
    s.submit_pose(PoseSample::absent(0.0));
    s.submit_pose(PoseSample::detected(frame(ARMS_DOWN, 0.99), 10.0));
    assert_eq!(s.process_pose(), Some(Gesture::Baseline));
    assert_eq!(s.process_pose(), None);
    assert_eq!(s.frames_dropped(), 1);
}

#[test]
fn fold_resets_the_active_game() {
    let mut s = session();
    pose(&mut s, ARMS_DOWN, 0.0);
    pose(&mut s, ARMS_RAISED, 100.0);
    s.tick(100.0);
    s.tick(130.0);
    assert_eq!(s.flappy().mode(), FlappyMode::Running);

    assert_eq!(pose(&mut s, ARMS_FOLDED, 400.0), Some(Gesture::Fold));
    assert_eq!(s.flappy().mode(), FlappyMode::Waiting);
    assert_eq!(s.flappy().score(), 0);
    assert_eq!(s.status().text, "Arms folded: reset");
}

#[test]
fn fold_in_cricket_starts_a_fresh_innings() {
    let mut s = session();
    s.handle(SessionEvent::SwitchGame(ActiveGame::Cricket));
    let mut now = 0.0;
    while s.cricket().balls() == 0 {
        s.tick(now);
        now += 30.0;
    }
    pose(&mut s, ARMS_DOWN, now);
    assert_eq!(pose(&mut s, ARMS_FOLDED, now + 100.0), Some(Gesture::Fold));
    assert_eq!(s.cricket().balls(), 0);
    assert_eq!(s.cricket().runs(), 0);
    assert!(s.cricket().ball().is_none());
}

#[test]
fn velocity_is_gravity_times_elapsed_time() {
    let tuning = FlappyTuning::from(&DESKTOP);
    let physics = FlappyPhysics::new(&DESKTOP, tuning);
    let mut rng = SmallRng::seed_from_u64(1);
    let mut game = FlappyGame::new(Arena::default());
    game.flap(tuning.jump);

    let steps = [0.016, 0.03, 0.01, 0.025, 0.03, 0.02, 0.017];
    for dt in steps {
        assert!(dt <= MAX_STEP_SECONDS);
        game.tick(dt, &physics, &mut rng);
    }
    let elapsed: f64 = steps.iter().sum();
    assert_eq!(game.mode(), FlappyMode::Running);
    let expected = -tuning.jump + tuning.gravity * elapsed;
    assert!((game.bird_velocity() - expected).abs() < 1e-9);
}

#[test]
fn session_steps_never_exceed_the_clamp() {
    let mut s = session();
    assert_eq!(s.tick(0.0), 0.0);
    assert_eq!(s.tick(16.0), 0.016);
    assert_eq!(s.tick(2_000.0), MAX_STEP_SECONDS);
}

#[test]
fn score_and_best_never_decrease() {
    let tuning = FlappyTuning::from(&DESKTOP);
    let physics = FlappyPhysics::new(&DESKTOP, tuning);
    let mut rng = SmallRng::seed_from_u64(42);
    let mut game = FlappyGame::new(Arena::default());
    let mut best = 0;

    for round in 0..5 {
        game.flap(tuning.jump);
        let mut score = 0;
        for _ in 0..2_000 {
            // Crude autopilot: flap whenever the bird sinks past mid-screen.
            if game.bird_y() > game.arena().height * (0.45 + 0.02 * f64::from(round))
                && game.bird_velocity() > 0.0
            {
                game.flap(tuning.jump);
            }
            game.tick(0.016, &physics, &mut rng);
            assert!(game.score() >= score);
            assert!(game.best() >= best);
            assert!(game.best() >= game.score());
            score = game.score();
            best = game.best();
            if game.mode() == FlappyMode::GameOver {
                break;
            }
        }
        game.reset();
        assert_eq!(game.score(), 0);
        assert_eq!(game.best(), best);
    }
}

#[test]
fn switching_games_leaves_the_other_untouched() {
    let mut s = session();
    pose(&mut s, ARMS_DOWN, 0.0);
    pose(&mut s, ARMS_RAISED, 100.0);
    let mut now = 100.0;
    for _ in 0..10 {
        s.tick(now);
        now += 30.0;
    }
    assert_eq!(s.flappy().mode(), FlappyMode::Running);
    let snapshot = s.flappy().clone();

    s.handle(SessionEvent::SwitchGame(ActiveGame::Cricket));
    for _ in 0..100 {
        s.tick(now);
        now += 30.0;
    }
    assert!(s.cricket().balls() > 0 || s.cricket().ball().is_some());
    let cricket_snapshot = s.cricket().clone();

    s.handle(SessionEvent::SwitchGame(ActiveGame::Flappy));
    assert_eq!(s.flappy(), &snapshot);
    assert_eq!(s.cricket(), &cricket_snapshot);
}

#[test]
fn innings_stops_at_twelve_balls() {
    let mut s = session();
    s.handle(SessionEvent::SwitchGame(ActiveGame::Cricket));
    let mut now = 0.0;
    for _ in 0..5_000 {
        s.tick(now);
        now += 30.0;
        assert!(s.cricket().balls() <= 12);
    }
    assert_eq!(s.cricket().balls(), 12);
    assert_eq!(s.cricket().mode(), CricketMode::Over);
    assert_eq!(s.status().text, "Innings over");
    assert!(s.cricket().ball().is_none());
}

#[test]
fn reset_after_innings_allows_a_new_one() {
    let mut s = session();
    s.handle(SessionEvent::SwitchGame(ActiveGame::Cricket));
    let mut now = 0.0;
    while s.cricket().mode() != CricketMode::Over {
        s.tick(now);
        now += 30.0;
    }
    s.handle(SessionEvent::Reset);
    assert_eq!(s.cricket().mode(), CricketMode::Running);
    assert_eq!(s.cricket().balls(), 0);
    assert_eq!(s.status().text, "Ready");
}

/// Tick the cricket session until a live ball sits in front of the batter.
/// False if the innings ends first.
fn wait_for_ball_at_bat(s: &mut Session<SmallRng>, now: &mut f64) -> bool {
    while s.cricket().mode() == CricketMode::Running {
        s.tick(*now);
        *now += 30.0;
        let at_bat = s.cricket().ball().is_some_and(|b| {
            b.active && (b.x - BATTER_X).abs() < 40.0 && (b.y - BATTER_Y).abs() < 100.0
        });
        if at_bat {
            return true;
        }
    }
    false
}

#[test]
fn timed_swings_score_runs_until_the_innings_ends() {
    let mut s = session();
    s.handle(SessionEvent::SwitchGame(ActiveGame::Cricket));
    let mut now = 0.0;
    let mut hits = 0;

    while wait_for_ball_at_bat(&mut s, &mut now) {
        let balls_before = s.cricket().balls();
        let runs_before = s.cricket().runs();

        // Fresh baseline, then the sweep.
        s.submit_pose(PoseSample::absent(now));
        s.process_pose();
        assert_eq!(pose(&mut s, ARMS_DOWN, now), Some(Gesture::Baseline));
        assert!(matches!(
            pose(&mut s, RIGHT_SWEPT, now + 50.0),
            Some(Gesture::Swing { .. })
        ));

        hits += 1;
        assert_eq!(s.cricket().balls(), balls_before + 1);
        assert!(s.cricket().runs() > runs_before);
        assert!(matches!(s.cricket().last_shot(), LastShot::Runs(_)));
        assert!(s.cricket().ball().is_none());
        if s.cricket().balls() < 12 {
            assert_eq!(s.status().text, "Sweet swing!");
        } else {
            assert_eq!(s.status().text, "Innings over");
        }
    }
    assert!(hits >= 10, "only {} balls reached the bat", hits);
    assert_eq!(s.cricket().balls(), 12);
    assert_eq!(s.cricket().mode(), CricketMode::Over);
    assert_eq!(s.status().text, "Innings over");
}

#[test]
fn unplayed_ball_reports_a_miss() {
    let mut s = session();
    s.handle(SessionEvent::SwitchGame(ActiveGame::Cricket));
    let mut now = 0.0;
    while s.cricket().balls() == 0 {
        s.tick(now);
        now += 30.0;
    }
    assert_eq!(s.cricket().last_shot(), LastShot::Miss);
    assert_eq!(s.cricket().runs(), 0);
    assert_eq!(s.status().text, "Missed ball");
}
