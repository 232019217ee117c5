//! Canvas drawing for both games. Reads session state, never mutates it.

use std::f64::consts::TAU;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::game::cricket::{BATTER_X, BATTER_Y};
use crate::game::flappy::BIRD_X;
use crate::game::{ActiveGame, CricketGame, CricketMode, FlappyGame, FlappyMode};
use crate::session::Session;

const TITLE_FONT: &str = "700 16px \"Space Grotesk\", sans-serif";
const BODY_FONT: &str = "500 14px \"IBM Plex Mono\", monospace";

pub fn render(ctx: &CanvasRenderingContext2d, session: &Session) -> Result<(), JsValue> {
    match session.active_game() {
        ActiveGame::Flappy => draw_flappy(ctx, session.flappy()),
        ActiveGame::Cricket => draw_cricket(ctx, session.cricket()),
    }
}

fn draw_flappy(ctx: &CanvasRenderingContext2d, game: &FlappyGame) -> Result<(), JsValue> {
    let arena = game.arena();
    let (w, h) = (arena.width, arena.height);
    ctx.clear_rect(0.0, 0.0, w, h);
    ctx.set_fill_style_str("#bdeefe");
    ctx.fill_rect(0.0, 0.0, w, h);

    ctx.set_fill_style_str("#2b995f");
    for pipe in game.pipes() {
        let gap_bottom = pipe.gap_y + pipe.gap_height;
        ctx.fill_rect(pipe.x, 0.0, pipe.width, pipe.gap_y);
        ctx.fill_rect(pipe.x, gap_bottom, pipe.width, h - gap_bottom);
    }

    // Bird body and eye
    ctx.set_fill_style_str("#ffcc3d");
    circle(ctx, BIRD_X, game.bird_y(), 16.0)?;
    ctx.set_fill_style_str("#2f2f2f");
    circle(ctx, BIRD_X + 6.0, game.bird_y() - 4.0, 2.3)?;

    instructions(
        ctx,
        w,
        "How To Play Flappy",
        &["1) Flap both hands UP quickly to jump", "2) Fold arms to reset"],
    )?;

    match game.mode() {
        FlappyMode::Waiting => {
            ctx.set_fill_style_str("rgba(14, 76, 110, 0.86)");
            ctx.fill_rect(44.0, h / 2.0 - 54.0, w - 88.0, 96.0);
            ctx.set_fill_style_str("#ffffff");
            ctx.set_text_align("center");
            ctx.set_font("700 24px \"Space Grotesk\", sans-serif");
            ctx.fill_text("Flap your hands to start", w / 2.0, h / 2.0 - 12.0)?;
            ctx.set_font("500 16px \"IBM Plex Mono\", monospace");
            ctx.fill_text("Keep your full upper body in frame", w / 2.0, h / 2.0 + 16.0)?;
        }
        FlappyMode::GameOver => {
            ctx.set_fill_style_str("rgba(10, 20, 30, 0.52)");
            ctx.fill_rect(0.0, 0.0, w, h);
            ctx.set_fill_style_str("#ffffff");
            ctx.set_text_align("center");
            ctx.set_font("700 36px \"Space Grotesk\", sans-serif");
            ctx.fill_text("Game Over", w / 2.0, h / 2.0 - 10.0)?;
        }
        FlappyMode::Running => {}
    }
    Ok(())
}

fn draw_cricket(ctx: &CanvasRenderingContext2d, game: &CricketGame) -> Result<(), JsValue> {
    let arena = game.arena();
    let (w, h) = (arena.width, arena.height);
    ctx.clear_rect(0.0, 0.0, w, h);

    let sky = ctx.create_linear_gradient(0.0, 0.0, 0.0, h * 0.6);
    sky.add_color_stop(0.0, "#87d9ff")?;
    sky.add_color_stop(1.0, "#d7f3ff")?;
    ctx.set_fill_style_canvas_gradient(&sky);
    ctx.fill_rect(0.0, 0.0, w, h);

    // Stands
    ctx.set_fill_style_str("#5a6672");
    for i in 0..12 {
        let x = f64::from(i) * 42.0 - 10.0;
        let stand = 48.0 + f64::from(i % 4) * 6.0;
        ctx.fill_rect(x, 120.0 - stand, 30.0, stand);
    }

    ctx.set_fill_style_str("#62b85b");
    ctx.fill_rect(0.0, h * 0.5, w, h * 0.5);

    // Pitch and creases
    ctx.set_fill_style_str("#c59b68");
    ctx.fill_rect(140.0, 205.0, 220.0, 340.0);
    ctx.set_stroke_style_str("#efddbf");
    ctx.set_line_width(3.0);
    ctx.begin_path();
    ctx.move_to(140.0, 260.0);
    ctx.line_to(360.0, 260.0);
    ctx.move_to(140.0, 500.0);
    ctx.line_to(360.0, 500.0);
    ctx.stroke();

    // Stumps
    ctx.set_fill_style_str("#f7e6ca");
    for dx in [12.0, 18.0, 24.0] {
        ctx.fill_rect(BATTER_X + dx, BATTER_Y - 30.0, 4.0, 70.0);
    }

    // Batter
    ctx.set_fill_style_str("#2f3542");
    circle(ctx, BATTER_X - 4.0, BATTER_Y - 34.0, 15.0)?;
    ctx.set_fill_style_str("#f5d2b3");
    ctx.fill_rect(BATTER_X - 15.0, BATTER_Y - 18.0, 20.0, 34.0);
    ctx.set_fill_style_str("#1f6e44");
    ctx.fill_rect(BATTER_X - 16.0, BATTER_Y + 15.0, 24.0, 55.0);

    ctx.save();
    ctx.translate(BATTER_X, BATTER_Y + 6.0)?;
    ctx.rotate(game.bat_angle())?;
    ctx.set_fill_style_str("#ddb57e");
    ctx.fill_rect(0.0, -10.0, 75.0, 14.0);
    ctx.set_fill_style_str("#b58756");
    ctx.fill_rect(0.0, -10.0, 20.0, 14.0);
    ctx.restore();

    if let Some(ball) = game.ball().filter(|b| b.active) {
        ctx.set_fill_style_str("#ffffff");
        circle(ctx, ball.x + 2.0, ball.y - 2.0, 11.0)?;
        ctx.set_fill_style_str("#d83a3a");
        circle(ctx, ball.x, ball.y, 10.0)?;
    }

    if let Some((_, runs)) = game.flash() {
        ctx.set_fill_style_str("rgba(15, 60, 20, 0.7)");
        ctx.fill_rect(0.0, 0.0, w, 88.0);
        ctx.set_fill_style_str("#ffffff");
        ctx.set_font("700 34px \"Space Grotesk\", sans-serif");
        ctx.set_text_align("center");
        ctx.fill_text(&format!("{} RUNS", runs), w / 2.0, 54.0)?;
    }

    ctx.set_fill_style_str("#1a4d2e");
    ctx.set_font("600 16px \"IBM Plex Mono\", monospace");
    ctx.set_text_align("left");
    ctx.fill_text("Runs by timing only: 1, 2, 3, 4, 6", 14.0, h - 18.0)?;

    instructions(
        ctx,
        w,
        "How To Play Cricket",
        &[
            "1) Swing RIGHT hand when ball reaches bat",
            "2) You get exactly 12 balls",
            "3) Fold arms to reset innings",
        ],
    )?;

    if game.mode() == CricketMode::Over {
        ctx.set_fill_style_str("rgba(8, 20, 18, 0.62)");
        ctx.fill_rect(0.0, 0.0, w, h);
        ctx.set_fill_style_str("#ffffff");
        ctx.set_text_align("center");
        ctx.set_font("700 34px \"Space Grotesk\", sans-serif");
        ctx.fill_text("Innings Complete", w / 2.0, h / 2.0 - 14.0)?;
        ctx.set_font("500 22px \"IBM Plex Mono\", monospace");
        ctx.fill_text(
            &format!("Final Runs: {}", game.runs()),
            w / 2.0,
            h / 2.0 + 20.0,
        )?;
    }
    Ok(())
}

/// Translucent how-to panel at the top of the canvas.
fn instructions(
    ctx: &CanvasRenderingContext2d,
    width: f64,
    title: &str,
    lines: &[&str],
) -> Result<(), JsValue> {
    let panel_height = 44.0 + lines.len() as f64 * 20.0;
    ctx.set_fill_style_str("rgba(14, 76, 110, 0.8)");
    ctx.fill_rect(10.0, 10.0, width - 20.0, panel_height);
    ctx.set_fill_style_str("#ffffff");
    ctx.set_text_align("left");
    ctx.set_font(TITLE_FONT);
    ctx.fill_text(title, 20.0, 34.0)?;
    ctx.set_font(BODY_FONT);
    for (i, line) in lines.iter().enumerate() {
        ctx.fill_text(line, 20.0, 56.0 + i as f64 * 20.0)?;
    }
    Ok(())
}

fn circle(ctx: &CanvasRenderingContext2d, x: f64, y: f64, r: f64) -> Result<(), JsValue> {
    ctx.begin_path();
    ctx.arc(x, y, r, 0.0, TAU)?;
    ctx.fill();
    Ok(())
}
