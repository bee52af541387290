//! Canvas 2D rendering module
//!
//! Each surface is a plain `<canvas>` with a 2D context. Painters only read
//! simulator state; nothing here feeds back into the simulation.

pub mod flappy;
pub mod scratch;
pub mod snake;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

pub use flappy::draw_flappy;
pub use scratch::draw_cover;
pub use snake::draw_snake;

/// Colors for game elements
pub mod colors {
    pub const SKY_TOP: &str = "#f9a8d4";
    pub const SKY_BOTTOM: &str = "#6366f1";
    pub const OBSTACLE: &str = "#1e293b";
    pub const OBSTACLE_EDGE: &str = "#475569";
    pub const OBSTACLE_CAP: &str = "#334155";
    pub const BODY: &str = "#fbbf24";
    pub const WING: &str = "#f59e0b";
    pub const BEAK: &str = "#f97316";

    pub const BOARD: &str = "#1e293b";
    pub const GRID_LINE: &str = "rgba(255, 255, 255, 0.05)";
    pub const FOOD: &str = "#f43f5e";
    pub const SNAKE_HEAD: &str = "#10b981";

    pub const EYE: &str = "white";
    pub const PUPIL: &str = "black";
    pub const TEXT: &str = "white";
}

/// A canvas and its 2D context
#[derive(Clone)]
pub struct Canvas2d {
    pub canvas: HtmlCanvasElement,
    pub ctx: CanvasRenderingContext2d,
}

impl Canvas2d {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, ctx })
    }

    /// Look up a canvas element by id
    pub fn by_id(id: &str) -> Result<Self, JsValue> {
        let canvas = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
            .ok_or_else(|| JsValue::from_str(&format!("missing canvas #{id}")))?
            .dyn_into::<HtmlCanvasElement>()?;
        Self::new(canvas)
    }

    pub fn width(&self) -> f64 {
        self.canvas.width() as f64
    }

    pub fn height(&self) -> f64 {
        self.canvas.height() as f64
    }

    /// Set the backing store size; returns whether it changed
    pub fn resize(&self, width: u32, height: u32) -> bool {
        if self.canvas.width() == width && self.canvas.height() == height {
            return false;
        }
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        true
    }

    /// Layout size of the element in CSS pixels
    pub fn client_size(&self) -> (u32, u32) {
        (
            self.canvas.client_width().max(0) as u32,
            self.canvas.client_height().max(0) as u32,
        )
    }

    /// Filled circle
    pub fn circle(&self, x: f64, y: f64, r: f64, color: &str) {
        self.ctx.set_fill_style_str(color);
        self.ctx.begin_path();
        if self.ctx.arc(x, y, r, 0.0, std::f64::consts::TAU).is_ok() {
            self.ctx.fill();
        }
    }

    /// Centered caption
    pub fn caption(&self, text: &str, y: f64, font: &str) {
        self.ctx.set_fill_style_str(colors::TEXT);
        self.ctx.set_font(font);
        self.ctx.set_text_align("center");
        let _ = self.ctx.fill_text(text, self.width() / 2.0, y);
    }
}
