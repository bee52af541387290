//! Obstacle game painter

use super::{Canvas2d, colors};
use crate::sim::{FlappyPhase, FlappySim};

/// Decorative cap drawn at the mouth of each obstacle
const CAP_HEIGHT: f64 = 20.0;
const CAP_OVERHANG: f64 = 2.0;

fn draw_sky(surface: &Canvas2d) {
    let ctx = &surface.ctx;
    let gradient = ctx.create_linear_gradient(0.0, 0.0, 0.0, surface.height());
    let _ = gradient.add_color_stop(0.0, colors::SKY_TOP);
    let _ = gradient.add_color_stop(1.0, colors::SKY_BOTTOM);
    ctx.set_fill_style_canvas_gradient(&gradient);
    ctx.fill_rect(0.0, 0.0, surface.width(), surface.height());
}

/// Paint the idle title screen
pub fn draw_title(surface: &Canvas2d, title: &str) {
    draw_sky(surface);
    surface.caption(title, surface.height() / 3.0, "20px sans-serif");
}

pub fn draw_flappy(surface: &Canvas2d, sim: &FlappySim) {
    let ctx = &surface.ctx;
    let tuning = sim.tuning();
    let height = surface.height();
    let width = tuning.obstacle_width as f64;
    let gap = tuning.gap_size as f64;

    draw_sky(surface);

    ctx.set_line_width(3.0);
    for obstacle in sim.obstacles() {
        let x = obstacle.x as f64;
        let top = obstacle.gap_top as f64;
        let bottom = top + gap;

        ctx.set_fill_style_str(colors::OBSTACLE);
        ctx.set_stroke_style_str(colors::OBSTACLE_EDGE);
        ctx.fill_rect(x, 0.0, width, top);
        ctx.stroke_rect(x, 0.0, width, top);
        ctx.fill_rect(x, bottom, width, height - bottom);
        ctx.stroke_rect(x, bottom, width, height - bottom);

        ctx.set_fill_style_str(colors::OBSTACLE_CAP);
        let cap_width = width + CAP_OVERHANG * 2.0;
        ctx.fill_rect(x - CAP_OVERHANG, top - CAP_HEIGHT, cap_width, CAP_HEIGHT);
        ctx.fill_rect(x - CAP_OVERHANG, bottom, cap_width, CAP_HEIGHT);
    }

    let body = sim.body();
    let r = tuning.body_radius as f64;
    ctx.save();
    let _ = ctx.translate(body.pos.x as f64, body.pos.y as f64);
    let _ = ctx.rotate(body.rotation as f64);

    surface.circle(0.0, 0.0, r, colors::BODY);
    surface.circle(r * 0.4, -r * 0.4, r / 3.0, colors::EYE);
    surface.circle(r * 0.53, -r * 0.4, r / 7.5, colors::PUPIL);

    ctx.set_fill_style_str(colors::WING);
    ctx.begin_path();
    if ctx
        .ellipse(-r / 3.0, r / 3.0, r * 0.53, r / 3.0, 0.0, 0.0, std::f64::consts::TAU)
        .is_ok()
    {
        ctx.fill();
    }

    ctx.set_fill_style_str(colors::BEAK);
    ctx.begin_path();
    ctx.move_to(r * 0.67, r * 0.13);
    ctx.line_to(r * 1.33, r * 0.4);
    ctx.line_to(r * 0.67, r * 0.67);
    ctx.fill();

    ctx.restore();

    if sim.phase() == FlappyPhase::GameOver {
        surface.caption(
            &format!("Score: {}", sim.score()),
            height / 2.0,
            "bold 24px sans-serif",
        );
    } else {
        surface.caption(&sim.score().to_string(), 40.0, "bold 28px sans-serif");
    }
}
