//! Scratch-off reveal detection
//!
//! The cover is an RGBA pixel buffer owned by the simulation. Scratching
//! erases anti-aliased discs from its alpha channel; after every erase a
//! strided subsample of the alpha channel estimates how much has been
//! removed. Crossing the threshold reveals the card for good.
//!
//! The host uploads [`CoverMask::as_bytes`] straight into an `ImageData`.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use super::collision::disc_coverage;
use super::signal::{Completion, CompletionCallback, CueQueue, SoundCue};
use crate::tuning::ScratchTuning;

/// One cover pixel, laid out as the canvas expects
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    const fn from_hex(hex: u32) -> Self {
        Self::opaque((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }
}

/// Silver foil stops along the top-left to bottom-right diagonal
const FOIL_STOPS: [(f32, Rgba); 6] = [
    (0.0, Rgba::from_hex(0x94a3b8)),
    (0.2, Rgba::from_hex(0xf8fafc)),
    (0.4, Rgba::from_hex(0xcbd5e1)),
    (0.6, Rgba::from_hex(0xe2e8f0)),
    (0.8, Rgba::from_hex(0xf1f5f9)),
    (1.0, Rgba::from_hex(0x64748b)),
];

/// Checker squares darkened by 5% black
const PATTERN_CELL: usize = 20;
const PATTERN_SQUARE: usize = 10;
const PATTERN_SHADE: f32 = 0.95;

fn foil_at(t: f32) -> Rgba {
    let t = t.clamp(0.0, 1.0);
    for pair in FOIL_STOPS.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            let f = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
            let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * f).round() as u8;
            return Rgba::opaque(lerp(c0.r, c1.r), lerp(c0.g, c1.g), lerp(c0.b, c1.b));
        }
    }
    FOIL_STOPS[FOIL_STOPS.len() - 1].1
}

/// The scratchable cover of one card
#[derive(Debug, Clone, PartialEq)]
pub struct CoverMask {
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
}

impl CoverMask {
    /// A fully painted, fully opaque cover
    pub fn painted(width: usize, height: usize) -> Self {
        let mut mask = Self {
            width,
            height,
            pixels: vec![Rgba::zeroed(); width * height],
        };
        mask.paint_cover();
        mask
    }

    /// Repaint the foil gradient and block pattern over the whole surface
    pub fn paint_cover(&mut self) {
        let (w, h) = (self.width as f32, self.height as f32);
        let norm = w * w + h * h;
        for y in 0..self.height {
            for x in 0..self.width {
                let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
                let t = if norm > 0.0 { (px * w + py * h) / norm } else { 0.0 };
                let mut color = foil_at(t);
                if Self::in_pattern(x, y) {
                    let shade = |c: u8| (c as f32 * PATTERN_SHADE).round() as u8;
                    color = Rgba::opaque(shade(color.r), shade(color.g), shade(color.b));
                }
                self.pixels[y * self.width + x] = color;
            }
        }
    }

    fn in_pattern(x: usize, y: usize) -> bool {
        let (i, j) = (x / PATTERN_CELL * PATTERN_CELL, y / PATTERN_CELL * PATTERN_CELL);
        (i + j) % (PATTERN_CELL * 2) == 0
            && x - i < PATTERN_SQUARE
            && y - j < PATTERN_SQUARE
    }

    /// Erase a disc; alpha is only ever lowered
    pub fn erase_disc(&mut self, center: Vec2, radius: f32) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let reach = radius + 1.0;
        let x0 = (center.x - reach).floor().max(0.0) as usize;
        let y0 = (center.y - reach).floor().max(0.0) as usize;
        let x1 = ((center.x + reach).ceil().max(0.0) as usize).min(self.width);
        let y1 = ((center.y + reach).ceil().max(0.0) as usize).min(self.height);

        for y in y0..y1 {
            for x in x0..x1 {
                let coverage = disc_coverage(Vec2::new(x as f32 + 0.5, y as f32 + 0.5), center, radius);
                if coverage <= 0.0 {
                    continue;
                }
                let pixel = &mut self.pixels[y * self.width + x];
                let remaining = (pixel.a as f32 * (1.0 - coverage)).floor() as u8;
                pixel.a = pixel.a.min(remaining);
            }
        }
    }

    /// Fraction of every `stride`-th pixel whose alpha is below `erased_alpha`
    pub fn erased_fraction(&self, stride: usize, erased_alpha: u8) -> f32 {
        let stride = stride.max(1);
        let mut sampled = 0usize;
        let mut erased = 0usize;
        for pixel in self.pixels.iter().step_by(stride) {
            sampled += 1;
            if pixel.a < erased_alpha {
                erased += 1;
            }
        }
        if sampled == 0 {
            0.0
        } else {
            erased as f32 / sampled as f32
        }
    }

    /// Nearest-neighbour copy at a new size
    pub fn resampled(&self, width: usize, height: usize) -> Self {
        if self.width == 0 || self.height == 0 {
            return Self::painted(width, height);
        }
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            let sy = (y * self.height / height.max(1)).min(self.height - 1);
            for x in 0..width {
                let sx = (x * self.width / width.max(1)).min(self.width - 1);
                pixels.push(self.pixels[sy * self.width + sx]);
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    /// Raw RGBA bytes, row-major
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

/// One scratch-off card
pub struct ScratchCard {
    tuning: ScratchTuning,
    mask: Option<CoverMask>,
    /// Cover fully painted; erase is allowed only after this
    ready: bool,
    revealed: bool,
    locked: bool,
    /// Pointer or touch currently held down
    pressed: bool,
    completion: Completion,
    cues: CueQueue,
}

impl ScratchCard {
    pub fn new(tuning: ScratchTuning) -> Self {
        Self {
            tuning,
            mask: None,
            ready: false,
            revealed: false,
            locked: false,
            pressed: false,
            completion: Completion::new(),
            cues: CueQueue::default(),
        }
    }

    pub fn set_on_complete(&mut self, callback: CompletionCallback) {
        self.completion.set(callback);
    }

    /// Paint the cover at the given size; false (and no change) when the
    /// surface has no area yet
    pub fn initialize(&mut self, width: usize, height: usize) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.ready = false;
        self.mask = Some(CoverMask::painted(width, height));
        self.ready = true;
        log::debug!("Scratch cover painted at {}x{}", width, height);
        true
    }

    /// Follow a layout change without losing scratch progress
    pub fn resize(&mut self, width: usize, height: usize) {
        self.ready = false;
        if width == 0 || height == 0 {
            return;
        }
        match self.mask.take() {
            Some(mask) if mask.width() == width && mask.height() == height => {
                self.mask = Some(mask);
            }
            Some(mask) => self.mask = Some(mask.resampled(width, height)),
            None => self.mask = Some(CoverMask::painted(width, height)),
        }
        self.ready = true;
    }

    pub fn press(&mut self) {
        self.pressed = true;
    }

    pub fn release(&mut self) {
        self.pressed = false;
    }

    /// Pointer moved; erases only while pressed
    pub fn stroke(&mut self, x: f32, y: f32) {
        if self.pressed {
            self.erase(x, y);
        }
    }

    /// Erase one brush disc at surface coordinates and re-check the reveal
    pub fn erase(&mut self, x: f32, y: f32) {
        if !self.ready || self.revealed || self.locked {
            return;
        }
        let Some(mask) = self.mask.as_mut() else {
            return;
        };
        mask.erase_disc(Vec2::new(x, y), self.tuning.brush_radius);

        if self.sample_erased_fraction() > self.tuning.reveal_threshold {
            self.reveal();
        }
    }

    /// Estimated erased share of the cover
    pub fn sample_erased_fraction(&self) -> f32 {
        self.mask.as_ref().map_or(0.0, |mask| {
            mask.erased_fraction(self.tuning.sample_stride, self.tuning.erased_alpha)
        })
    }

    /// Reveal without meeting the threshold (lottery "scratch all")
    pub fn force_reveal(&mut self) {
        if !self.revealed {
            self.reveal();
        }
    }

    /// Force reveal as part of a batch that plays its own cue
    pub fn reveal_quietly(&mut self) {
        if !self.revealed {
            self.reveal();
            self.cues.clear();
        }
    }

    fn reveal(&mut self) {
        self.revealed = true;
        self.pressed = false;
        self.cues.push(SoundCue::CardRevealed);
        log::info!("Card revealed");
        self.completion.fire();
    }

    /// Locked cards keep their cover but ignore erase input
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// The cover is drawn only until the card is revealed
    pub fn cover_visible(&self) -> bool {
        !self.revealed
    }

    /// Whatever sits under the card may show once a cover has been painted
    /// or the card was revealed outright
    pub fn prize_visible(&self) -> bool {
        self.mask.is_some() || self.revealed
    }

    pub fn mask(&self) -> Option<&CoverMask> {
        self.mask.as_ref()
    }

    pub fn drain_cues(&mut self) -> Vec<SoundCue> {
        self.cues.drain()
    }
}

/// Result of one layout probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitPoll {
    /// Cover painted
    Ready,
    /// Probe again after this many milliseconds
    Retry(u32),
    /// Out of attempts; the card stays uninitialized
    GaveUp,
}

/// Bounded retry for surfaces whose layout briefly reports zero size
#[derive(Debug, Clone)]
pub struct SurfaceProbe {
    attempts_left: u32,
    retry_ms: u32,
    first_delay_ms: u32,
}

impl SurfaceProbe {
    pub fn new(tuning: &ScratchTuning) -> Self {
        Self {
            attempts_left: tuning.init_attempts,
            retry_ms: tuning.init_retry_ms,
            first_delay_ms: tuning.init_delay_ms,
        }
    }

    /// Wait before the first probe
    pub fn first_delay_ms(&self) -> u32 {
        self.first_delay_ms
    }

    /// Try to initialize the card at the currently measured size
    pub fn poll(&mut self, card: &mut ScratchCard, width: usize, height: usize) -> InitPoll {
        if self.attempts_left == 0 {
            return InitPoll::GaveUp;
        }
        self.attempts_left -= 1;
        if card.initialize(width, height) {
            return InitPoll::Ready;
        }
        if self.attempts_left == 0 {
            log::debug!("Scratch surface never reported a size");
            InitPoll::GaveUp
        } else {
            InitPoll::Retry(self.retry_ms)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn ready_card(size: usize) -> ScratchCard {
        let mut card = ScratchCard::new(ScratchTuning::card());
        assert!(card.initialize(size, size));
        card
    }

    fn counted(card: &mut ScratchCard) -> Rc<Cell<u32>> {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        card.set_on_complete(Box::new(move || counter.set(counter.get() + 1)));
        calls
    }

    #[test]
    fn test_painted_cover_is_opaque() {
        let mask = CoverMask::painted(40, 30);
        assert_eq!(mask.as_bytes().len(), 40 * 30 * 4);
        assert!(mask.as_bytes().chunks(4).all(|p| p[3] == 255));
        assert_eq!(mask.erased_fraction(16, 128), 0.0);
    }

    #[test]
    fn test_cover_gradient_and_pattern() {
        let mask = CoverMask::painted(200, 200);
        // Top-left corner sits near the first stop, darkened by the pattern
        let corner = mask.pixel(0, 0).unwrap();
        assert_eq!(corner.a, 255);
        assert!(corner.r < 0x94);
        // (12, 0) is outside the pattern square
        let plain = mask.pixel(12, 0).unwrap();
        assert!(plain.r > corner.r);
        // Bottom-right corner approaches the last stop
        let far = mask.pixel(199, 199).unwrap();
        assert!(far.r.abs_diff(0x64) <= 4);
        assert!(mask.pixel(200, 0).is_none());
    }

    #[test]
    fn test_erase_disc_lowers_alpha() {
        let mut mask = CoverMask::painted(50, 50);
        mask.erase_disc(Vec2::new(25.0, 25.0), 5.0);
        assert_eq!(mask.pixel(25, 25).unwrap().a, 0);
        assert_eq!(mask.pixel(0, 0).unwrap().a, 255);
        let rim = mask.pixel(29, 25).unwrap().a;
        assert!(rim > 0 && rim < 255);
    }

    #[test]
    fn test_erase_is_clipped_at_edges() {
        let mut mask = CoverMask::painted(20, 20);
        mask.erase_disc(Vec2::new(-3.0, 25.0), 8.0);
        mask.erase_disc(Vec2::new(0.0, 0.0), 4.0);
        assert_eq!(mask.pixel(0, 0).unwrap().a, 0);
    }

    #[test]
    fn test_initialize_rejects_empty_surface() {
        let mut card = ScratchCard::new(ScratchTuning::card());
        assert!(!card.initialize(0, 120));
        assert!(!card.initialize(120, 0));
        assert!(!card.is_ready());
        assert!(card.mask().is_none());
    }

    #[test]
    fn test_erase_before_ready_is_ignored() {
        let mut card = ScratchCard::new(ScratchTuning::card());
        card.erase(10.0, 10.0);
        assert_eq!(card.sample_erased_fraction(), 0.0);
    }

    #[test]
    fn test_stroke_requires_press() {
        let mut card = ready_card(100);
        card.stroke(50.0, 50.0);
        assert_eq!(card.sample_erased_fraction(), 0.0);
        card.press();
        card.stroke(50.0, 50.0);
        assert!(card.sample_erased_fraction() > 0.0);
        card.release();
        let before = card.sample_erased_fraction();
        card.stroke(10.0, 10.0);
        assert_eq!(card.sample_erased_fraction(), before);
    }

    #[test]
    fn test_reveal_scenario_fires_once() {
        let tuning = ScratchTuning {
            brush_radius: 10.0,
            ..ScratchTuning::card()
        };
        let mut card = ScratchCard::new(tuning);
        let calls = counted(&mut card);
        assert!(card.initialize(100, 100));

        card.press();
        let mut last = 0.0;
        for row in 0..7 {
            for col in 0..=20 {
                card.stroke(col as f32 * 5.0, 5.0 + row as f32 * 15.0);
                let fraction = card.sample_erased_fraction();
                assert!(fraction >= last);
                last = fraction;
            }
        }
        assert!(card.is_revealed());
        assert_eq!(calls.get(), 1);
        assert_eq!(card.drain_cues(), vec![SoundCue::CardRevealed]);
        assert!(!card.cover_visible());

        // Input after the reveal changes nothing
        let frozen = card.sample_erased_fraction();
        card.press();
        card.stroke(95.0, 95.0);
        card.force_reveal();
        assert_eq!(card.sample_erased_fraction(), frozen);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_below_threshold_stays_covered() {
        let mut card = ready_card(100);
        card.erase(50.0, 50.0);
        assert!(card.sample_erased_fraction() < 0.35);
        assert!(!card.is_revealed());
    }

    #[test]
    fn test_force_reveal() {
        let mut card = ready_card(80);
        let calls = counted(&mut card);
        card.force_reveal();
        card.force_reveal();
        assert!(card.is_revealed());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_locked_card_ignores_erase() {
        let mut card = ready_card(100);
        card.set_locked(true);
        card.erase(50.0, 50.0);
        assert_eq!(card.sample_erased_fraction(), 0.0);
        card.set_locked(false);
        card.erase(50.0, 50.0);
        assert!(card.sample_erased_fraction() > 0.0);
    }

    #[test]
    fn test_resize_keeps_progress() {
        let mut card = ready_card(100);
        card.erase(50.0, 50.0);
        let before = card.sample_erased_fraction();
        card.resize(200, 200);
        assert!(card.is_ready());
        let mask = card.mask().unwrap();
        assert_eq!((mask.width(), mask.height()), (200, 200));
        assert_eq!(mask.pixel(100, 100).unwrap().a, 0);
        let after = card.sample_erased_fraction();
        assert!((after - before).abs() < 0.06);
    }

    #[test]
    fn test_resize_to_zero_pauses_input() {
        let mut card = ready_card(100);
        card.resize(0, 0);
        assert!(!card.is_ready());
        card.erase(50.0, 50.0);
        assert_eq!(card.sample_erased_fraction(), 0.0);
        card.resize(100, 100);
        assert!(card.is_ready());
    }

    #[test]
    fn test_surface_probe_retries_then_gives_up() {
        let tuning = ScratchTuning::card();
        let mut card = ScratchCard::new(tuning.clone());
        let mut probe = SurfaceProbe::new(&tuning);
        assert_eq!(probe.first_delay_ms(), 50);
        for _ in 0..19 {
            assert_eq!(probe.poll(&mut card, 0, 0), InitPoll::Retry(100));
        }
        assert_eq!(probe.poll(&mut card, 0, 0), InitPoll::GaveUp);
        assert_eq!(probe.poll(&mut card, 100, 100), InitPoll::GaveUp);
        assert!(!card.is_ready());
    }

    #[test]
    fn test_prize_hidden_until_cover_painted() {
        let tuning = ScratchTuning::card();
        let mut card = ScratchCard::new(tuning.clone());
        let mut probe = SurfaceProbe::new(&tuning);
        assert!(!card.prize_visible());
        assert_eq!(probe.poll(&mut card, 0, 0), InitPoll::Retry(100));
        assert!(!card.prize_visible());
        assert_eq!(probe.poll(&mut card, 120, 80), InitPoll::Ready);
        assert!(card.prize_visible());
        // A collapsed layout keeps the painted cover
        card.resize(0, 0);
        assert!(card.prize_visible());
    }

    #[test]
    fn test_prize_stays_covered_when_probe_gives_up() {
        let tuning = ScratchTuning {
            init_attempts: 3,
            ..ScratchTuning::tile()
        };
        let mut card = ScratchCard::new(tuning.clone());
        let mut probe = SurfaceProbe::new(&tuning);
        while probe.poll(&mut card, 0, 0) != InitPoll::GaveUp {}
        assert!(!card.prize_visible());
        assert!(!card.is_revealed());
        card.reveal_quietly();
        assert!(card.prize_visible());
    }

    #[test]
    fn test_reveal_quietly_fires_once_without_cue() {
        let mut card = ready_card(80);
        let calls = counted(&mut card);
        card.reveal_quietly();
        card.reveal_quietly();
        card.force_reveal();
        assert!(card.is_revealed());
        assert_eq!(calls.get(), 1);
        assert!(card.drain_cues().is_empty());
    }

    #[test]
    fn test_surface_probe_succeeds_after_layout() {
        let tuning = ScratchTuning::card();
        let mut card = ScratchCard::new(tuning.clone());
        let mut probe = SurfaceProbe::new(&tuning);
        assert_eq!(probe.poll(&mut card, 0, 0), InitPoll::Retry(100));
        assert_eq!(probe.poll(&mut card, 300, 160), InitPoll::Ready);
        assert!(card.is_ready());
    }
}
