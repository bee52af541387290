//! Snake board painter

use super::{Canvas2d, colors};
use crate::sim::{Direction, SnakeSim};

pub fn draw_snake(surface: &Canvas2d, sim: &SnakeSim) {
    let ctx = &surface.ctx;
    let size = surface.width();
    let tiles = sim.grid_size() as f64;
    let cell = size / tiles;

    ctx.set_fill_style_str(colors::BOARD);
    ctx.fill_rect(0.0, 0.0, size, surface.height());

    ctx.set_stroke_style_str(colors::GRID_LINE);
    ctx.set_line_width(1.0);
    ctx.begin_path();
    for i in 0..=sim.grid_size() {
        let p = i as f64 * cell;
        ctx.move_to(p, 0.0);
        ctx.line_to(p, size);
        ctx.move_to(0.0, p);
        ctx.line_to(size, p);
    }
    ctx.stroke();

    let center = |v: i32| v as f64 * cell + cell / 2.0;

    let food = sim.food();
    ctx.set_shadow_color(colors::FOOD);
    ctx.set_shadow_blur(15.0);
    surface.circle(center(food.x), center(food.y), cell / 2.0 - 2.0, colors::FOOD);
    ctx.set_shadow_blur(0.0);

    let len = sim.segments().len().max(1) as f64;
    for (i, seg) in sim.segments().iter().enumerate() {
        let (cx, cy) = (center(seg.x), center(seg.y));
        if i == 0 {
            surface.circle(cx, cy, cell / 2.0, colors::SNAKE_HEAD);
            draw_eyes(surface, cx, cy, cell, sim.direction());
        } else {
            // Tail fades toward the end
            let opacity = 1.0 - (i as f64 / len) * 0.6;
            let color = format!("rgba(52, 211, 153, {opacity:.2})");
            surface.circle(cx, cy, cell / 2.0 - 1.0, &color);
        }
    }
}

fn draw_eyes(surface: &Canvas2d, cx: f64, cy: f64, cell: f64, direction: Direction) {
    let eye = cell / 6.0;
    let offset = cell / 4.0;
    let delta = direction.delta();
    let (dx, dy) = (delta.x as f64, delta.y as f64);
    // Eyes sit forward of center, spread across the direction of travel
    let (fx, fy) = (cx + dx * offset * 0.5, cy + dy * offset * 0.5);
    let (px, py) = (-dy * offset, dx * offset);
    for side in [-1.0, 1.0] {
        let (ex, ey) = (fx + px * side, fy + py * side);
        surface.circle(ex, ey, eye, colors::EYE);
        surface.circle(ex, ey, eye / 2.0, colors::PUPIL);
    }
}
