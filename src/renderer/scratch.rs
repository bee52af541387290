//! Scratch cover painter

use wasm_bindgen::{Clamped, JsValue};
use web_sys::ImageData;

use super::Canvas2d;
use crate::sim::ScratchCard;

/// Upload the cover mask, or clear the surface once the card is revealed
pub fn draw_cover(surface: &Canvas2d, card: &ScratchCard) -> Result<(), JsValue> {
    let ctx = &surface.ctx;
    if !card.cover_visible() {
        ctx.clear_rect(0.0, 0.0, surface.width(), surface.height());
        return Ok(());
    }
    let Some(mask) = card.mask() else {
        return Ok(());
    };
    surface.resize(mask.width() as u32, mask.height() as u32);
    let image = ImageData::new_with_u8_clamped_array_and_sh(
        Clamped(mask.as_bytes()),
        mask.width() as u32,
        mask.height() as u32,
    )?;
    ctx.put_image_data(&image, 0.0, 0.0)
}
