//! Birthday Arcade entry point
//!
//! Wires the simulators to the page: canvases, input, animation frames and
//! sound. The native build runs a short headless demo instead.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, Event, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent};

    use birthday_arcade::audio::AudioManager;
    use birthday_arcade::consts::*;
    use birthday_arcade::flappy_canvas_size;
    use birthday_arcade::lottery::{LotteryRound, RoundOutcome, TILES_PER_ROUND};
    use birthday_arcade::progress::{GameKind, PRIZE_CARDS, Progress, Requirement};
    use birthday_arcade::renderer::{self, Canvas2d};
    use birthday_arcade::sim::{
        CompletionCallback, Direction, FlappyPhase, FlappySim, InitPoll, ScratchCard, SnakePhase,
        SnakeSim, SoundCue, SurfaceProbe,
    };
    use birthday_arcade::tuning::{ScratchTuning, Tuning};

    /// A scratchable surface on the page
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Slot {
        Prize(usize),
        Tile(usize),
    }

    impl Slot {
        fn canvas_id(self) -> String {
            match self {
                Slot::Prize(i) => format!("card-{i}"),
                Slot::Tile(i) => format!("lottery-tile-{i}"),
            }
        }

        /// Element under the cover that must stay hidden until it is painted
        fn layer_id(self) -> String {
            match self {
                Slot::Prize(i) => format!("card-prize-{i}"),
                Slot::Tile(i) => format!("lottery-symbol-{i}"),
            }
        }
    }

    /// Completion notifications, queued while the app is borrowed
    #[derive(Debug, Clone, Copy)]
    enum HostEvent {
        GameOver(GameKind),
        Revealed(Slot),
        LotteryWon,
    }

    type Inbox = Rc<RefCell<Vec<HostEvent>>>;

    fn notify(inbox: &Inbox, event: HostEvent) -> CompletionCallback {
        let inbox = inbox.clone();
        Box::new(move || inbox.borrow_mut().push(event))
    }

    #[derive(Debug, Clone, Copy)]
    enum ScratchAction {
        Press,
        Move,
        Release,
    }

    struct FlappyView {
        sim: FlappySim,
        surface: Canvas2d,
        raf: Option<i32>,
    }

    struct SnakeView {
        sim: SnakeSim,
        surface: Canvas2d,
        raf: Option<i32>,
    }

    struct CardView {
        slot: Slot,
        card: ScratchCard,
        surface: Canvas2d,
        probe: SurfaceProbe,
        /// Distinguishes this card from a replaced one still being probed
        generation: u32,
    }

    impl CardView {
        fn draw(&self) {
            if let Err(e) = renderer::draw_cover(&self.surface, &self.card) {
                log::warn!("Failed to draw {:?}: {:?}", self.slot, e);
            }
        }

        fn sync_layer(&self) {
            set_hidden(&self.slot.layer_id(), !self.card.prize_visible());
        }
    }

    struct LotteryView {
        round: LotteryRound,
        tiles: Vec<CardView>,
    }

    /// Pending layout probe: slot, generation, delay
    type Probe = (Slot, u32, u32);

    /// Page state holding every live simulator
    struct App {
        tuning: Tuning,
        progress: Progress,
        audio: AudioManager,
        inbox: Inbox,
        flappy: Option<FlappyView>,
        snake: Option<SnakeView>,
        cards: Vec<CardView>,
        lottery: Option<LotteryView>,
        next_generation: u32,
    }

    impl App {
        fn new(tuning: Tuning) -> Self {
            Self {
                tuning,
                progress: Progress::new(),
                audio: AudioManager::new(),
                inbox: Rc::new(RefCell::new(Vec::new())),
                flappy: None,
                snake: None,
                cards: Vec::new(),
                lottery: None,
                next_generation: 0,
            }
        }

        fn new_card(&mut self, slot: Slot, tuning: &ScratchTuning) -> Option<CardView> {
            let surface = match Canvas2d::by_id(&slot.canvas_id()) {
                Ok(surface) => surface,
                Err(e) => {
                    log::warn!("Scratch surface {:?} unavailable: {:?}", slot, e);
                    return None;
                }
            };
            let mut card = ScratchCard::new(tuning.clone());
            card.set_on_complete(notify(&self.inbox, HostEvent::Revealed(slot)));
            self.next_generation += 1;
            let view = CardView {
                slot,
                card,
                surface,
                probe: SurfaceProbe::new(tuning),
                generation: self.next_generation,
            };
            view.sync_layer();
            Some(view)
        }

        fn probe_of(view: &CardView) -> Probe {
            (view.slot, view.generation, view.probe.first_delay_ms())
        }

        fn create_prize_cards(&mut self) -> Vec<Probe> {
            let tuning = self.tuning.scratch.clone();
            for i in 0..PRIZE_CARDS {
                if let Some(view) = self.new_card(Slot::Prize(i), &tuning) {
                    self.cards.push(view);
                }
            }
            self.cards.iter().map(Self::probe_of).collect()
        }

        fn build_tiles(&mut self) -> Vec<CardView> {
            let tuning = self.tuning.lottery_tile.clone();
            (0..TILES_PER_ROUND)
                .filter_map(|i| self.new_card(Slot::Tile(i), &tuning))
                .collect()
        }

        fn card_mut(&mut self, slot: Slot) -> Option<&mut CardView> {
            match slot {
                Slot::Prize(_) => self.cards.iter_mut().find(|v| v.slot == slot),
                Slot::Tile(_) => self
                    .lottery
                    .as_mut()?
                    .tiles
                    .iter_mut()
                    .find(|v| v.slot == slot),
            }
        }

        /// Handle queued completions, then play whatever the simulators asked for
        fn after_input(&mut self) {
            loop {
                let events = std::mem::take(&mut *self.inbox.borrow_mut());
                if events.is_empty() {
                    break;
                }
                for event in events {
                    self.handle_event(event);
                }
            }
            self.flush_cues();
        }

        fn handle_event(&mut self, event: HostEvent) {
            match event {
                HostEvent::GameOver(kind) => {
                    self.progress.mark_game_played(kind);
                    self.refresh_gate();
                }
                HostEvent::Revealed(Slot::Prize(i)) => {
                    self.progress.mark_card_revealed(i);
                    self.refresh_gate();
                    if i == PRIZE_CARDS - 1 {
                        log::info!("Final prize revealed");
                        self.audio.play(SoundCue::Victory);
                        set_hidden("victory-modal", false);
                    }
                }
                HostEvent::Revealed(Slot::Tile(_)) => {
                    let outcome = self
                        .lottery
                        .as_mut()
                        .and_then(|lottery| lottery.round.tile_scratched());
                    if let Some(outcome) = outcome {
                        self.show_round_result(outcome);
                    }
                }
                HostEvent::LotteryWon => set_hidden("victory-modal", false),
            }
        }

        fn flush_cues(&mut self) {
            let mut cues = Vec::new();
            if let Some(view) = self.flappy.as_mut() {
                cues.extend(view.sim.drain_cues());
            }
            if let Some(view) = self.snake.as_mut() {
                cues.extend(view.sim.drain_cues());
            }
            for view in &mut self.cards {
                cues.extend(view.card.drain_cues());
            }
            if let Some(lottery) = self.lottery.as_mut() {
                for view in &mut lottery.tiles {
                    cues.extend(view.card.drain_cues());
                }
                cues.extend(lottery.round.drain_cues());
            }
            self.audio.play_all(&cues);
        }

        /// Lock or unlock the final card and update the hint
        fn refresh_gate(&mut self) {
            let locked = self.progress.final_card_locked();
            if let Some(view) = self.card_mut(Slot::Prize(PRIZE_CARDS - 1)) {
                view.card.set_locked(locked);
            }
            set_hidden("final-lock", !locked);
            let hint = self
                .progress
                .remaining_requirements()
                .into_iter()
                .map(|req| match req {
                    Requirement::PlayGame(game) => format!("Play {}", game.name()),
                    Requirement::RevealCard(i) => format!("Scratch card {}", i + 1),
                })
                .collect::<Vec<_>>()
                .join(" · ");
            set_text("final-lock-hint", &hint);
        }

        // === Obstacle game ===

        fn open_flappy(&mut self) {
            // Shown first so the container has a measurable width
            set_hidden("flappy-modal", false);
            if self.flappy.is_none() {
                let surface = match Canvas2d::by_id("flappy-canvas") {
                    Ok(surface) => surface,
                    Err(e) => {
                        log::warn!("Obstacle canvas unavailable: {:?}", e);
                        return;
                    }
                };
                let seed = js_sys::Date::now() as u64;
                let mut sim = FlappySim::with_seed(self.tuning.flappy.clone(), 0.0, 0.0, seed);
                sim.set_on_complete(notify(&self.inbox, HostEvent::GameOver(GameKind::Flappy)));
                let mut view = FlappyView {
                    sim,
                    surface,
                    raf: None,
                };
                fit_flappy(&mut view);
                renderer::flappy::draw_title(&view.surface, "Flappy");
                self.flappy = Some(view);
                log::info!("Obstacle game opened with seed: {}", seed);
            }
        }

        fn close_flappy(&mut self) {
            if let Some(view) = self.flappy.take() {
                if let Some(handle) = view.raf {
                    cancel_frame(handle);
                }
                log::info!("Obstacle game closed");
            }
            set_hidden("flappy-modal", true);
        }

        // === Snake ===

        fn open_snake(&mut self) {
            if self.snake.is_none() {
                let surface = match Canvas2d::by_id("snake-canvas") {
                    Ok(surface) => surface,
                    Err(e) => {
                        log::warn!("Snake canvas unavailable: {:?}", e);
                        return;
                    }
                };
                surface.resize(SNAKE_BOARD_PX, SNAKE_BOARD_PX);
                let seed = js_sys::Date::now() as u64;
                let mut sim = SnakeSim::with_seed(self.tuning.snake.clone(), seed);
                sim.set_on_complete(notify(&self.inbox, HostEvent::GameOver(GameKind::Snake)));
                renderer::draw_snake(&surface, &sim);
                self.snake = Some(SnakeView {
                    sim,
                    surface,
                    raf: None,
                });
                log::info!("Snake opened with seed: {}", seed);
            }
            set_text("snake-score", "0");
            set_hidden("snake-start", false);
            set_hidden("snake-modal", false);
        }

        fn close_snake(&mut self) {
            if let Some(view) = self.snake.take() {
                if let Some(handle) = view.raf {
                    cancel_frame(handle);
                }
                log::info!("Snake closed");
            }
            set_hidden("snake-modal", true);
        }

        // === Lottery ===

        /// Create the round on first open; returns probes for new tiles
        fn ensure_lottery(&mut self) -> Vec<Probe> {
            if self.lottery.is_some() {
                return Vec::new();
            }
            let seed = js_sys::Date::now() as u64;
            let mut round = LotteryRound::with_seed(seed);
            round.set_on_win(notify(&self.inbox, HostEvent::LotteryWon));
            let tiles = self.build_tiles();
            let probes = tiles.iter().map(Self::probe_of).collect();
            self.lottery = Some(LotteryView { round, tiles });
            probes
        }

        fn next_lottery_stage(&mut self) -> Vec<Probe> {
            let moved = self
                .lottery
                .as_mut()
                .is_some_and(|lottery| lottery.round.next_stage());
            if !moved {
                return Vec::new();
            }
            let tiles = self.build_tiles();
            let probes = tiles.iter().map(Self::probe_of).collect();
            if let Some(lottery) = self.lottery.as_mut() {
                lottery.tiles = tiles;
            }
            self.render_lottery_text();
            probes
        }

        fn scratch_all(&mut self) {
            let Some(lottery) = self.lottery.as_mut() else {
                return;
            };
            let Some(outcome) = lottery.round.scratch_all() else {
                return;
            };
            if lottery.round.reveal_all_requested() {
                // The round plays one cue for the whole board
                for view in &mut lottery.tiles {
                    view.card.reveal_quietly();
                    view.draw();
                    view.sync_layer();
                }
            }
            self.show_round_result(outcome);
        }

        fn render_lottery_text(&self) {
            let Some(lottery) = self.lottery.as_ref() else {
                return;
            };
            let stage = lottery.round.stage();
            set_text("lottery-title", stage.title);
            set_text("lottery-instruction", stage.instruction);
            for (i, symbol) in lottery.round.layout().iter().enumerate() {
                set_text(&format!("lottery-symbol-{i}"), symbol.glyph());
            }
            set_hidden("lottery-result", true);
            set_hidden("lottery-next", true);
            set_hidden("lottery-scratch-all", false);
        }

        fn show_round_result(&self, outcome: RoundOutcome) {
            let Some(lottery) = self.lottery.as_ref() else {
                return;
            };
            let stage = lottery.round.stage();
            set_text("lottery-result", stage.result_message);
            set_hidden("lottery-result", false);
            set_hidden("lottery-scratch-all", true);
            if outcome == RoundOutcome::NearMiss {
                set_text("lottery-next", stage.button_text);
                set_hidden("lottery-next", false);
            }
        }

        /// Follow layout changes on every live surface
        fn on_resize(&mut self) {
            if let Some(view) = self.flappy.as_mut() {
                if view.sim.phase() != FlappyPhase::Running {
                    fit_flappy(view);
                    renderer::draw_flappy(&view.surface, &view.sim);
                }
            }
            let lottery_tiles = self
                .lottery
                .as_mut()
                .map(|lottery| lottery.tiles.iter_mut())
                .into_iter()
                .flatten();
            for view in self.cards.iter_mut().chain(lottery_tiles) {
                if view.card.mask().is_none() {
                    continue;
                }
                let (w, h) = view.surface.client_size();
                view.card.resize(w as usize, h as usize);
                view.draw();
            }
        }
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn element(id: &str) -> Option<Element> {
        document()?.get_element_by_id(id)
    }

    fn set_hidden(id: &str, hidden: bool) {
        if let Some(el) = element(id) {
            let _ = el.class_list().toggle_with_force("hidden", hidden);
        }
    }

    fn set_text(id: &str, text: &str) {
        if let Some(el) = element(id) {
            el.set_text_content(Some(text));
        }
    }

    fn listen(target: &web_sys::EventTarget, name: &str, handler: impl FnMut(Event) + 'static) {
        let closure = Closure::<dyn FnMut(Event)>::new(handler);
        if let Err(e) = target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
        {
            log::warn!("Failed to listen for {}: {:?}", name, e);
        }
        closure.forget();
    }

    fn on_click(id: &str, handler: impl FnMut(Event) + 'static) {
        match element(id) {
            Some(el) => listen(&el, "click", handler),
            None => log::debug!("No #{} on this page", id),
        }
    }

    fn cancel_frame(handle: i32) {
        if let Some(window) = web_sys::window() {
            let _ = window.cancel_animation_frame(handle);
        }
    }

    fn read_tuning() -> Tuning {
        match element(TUNING_ELEMENT_ID).and_then(|el| el.text_content()) {
            Some(json) if !json.trim().is_empty() => Tuning::from_json_or_default(&json),
            _ => Tuning::default(),
        }
    }

    /// Size the obstacle canvas to its container and the window height
    fn fit_flappy(view: &mut FlappyView) {
        let container = view
            .surface
            .canvas
            .parent_element()
            .map(|parent| parent.client_width() as f64)
            .unwrap_or(FLAPPY_MAX_WIDTH as f64);
        let window_height = web_sys::window()
            .and_then(|w| w.inner_height().ok())
            .and_then(|h| h.as_f64())
            .unwrap_or(FLAPPY_MAX_HEIGHT as f64 / FLAPPY_HEIGHT_SHARE);
        let (w, h) = flappy_canvas_size(container, window_height);
        view.surface.resize(w, h);
        view.sim.resize(w as f32, h as f32);
    }

    /// Pointer position in canvas backing-store pixels
    fn surface_point(canvas: &HtmlCanvasElement, event: &Event) -> Option<(f32, f32)> {
        let (x, y) = if event.type_().starts_with("touch") {
            let touch = event.unchecked_ref::<TouchEvent>().touches().get(0)?;
            (touch.client_x() as f64, touch.client_y() as f64)
        } else {
            let mouse = event.dyn_ref::<MouseEvent>()?;
            (mouse.client_x() as f64, mouse.client_y() as f64)
        };
        let rect = canvas.get_bounding_client_rect();
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return None;
        }
        let sx = canvas.width() as f64 / rect.width();
        let sy = canvas.height() as f64 / rect.height();
        Some((((x - rect.left()) * sx) as f32, ((y - rect.top()) * sy) as f32))
    }

    // === Scheduling ===

    fn start_probe(app: &Rc<RefCell<App>>, (slot, generation, delay_ms): Probe) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let app = app.clone();
        let closure = Closure::once(move || poll_probe(app, slot, generation));
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            delay_ms as i32,
        );
        closure.forget();
    }

    fn poll_probe(app: Rc<RefCell<App>>, slot: Slot, generation: u32) {
        let result = {
            let mut a = app.borrow_mut();
            let Some(view) = a.card_mut(slot) else {
                return;
            };
            if view.generation != generation {
                return;
            }
            let (w, h) = view.surface.client_size();
            let result = view.probe.poll(&mut view.card, w as usize, h as usize);
            if result == InitPoll::Ready {
                view.draw();
                view.sync_layer();
            }
            if matches!(slot, Slot::Prize(_)) {
                a.refresh_gate();
            }
            result
        };
        if let InitPoll::Retry(delay_ms) = result {
            start_probe(&app, (slot, generation, delay_ms));
        }
    }

    fn schedule_flappy(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let frame_app = app.clone();
        let closure = Closure::once(move |_time: f64| flappy_frame(frame_app));
        match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            Ok(handle) => {
                if let Some(view) = app.borrow_mut().flappy.as_mut() {
                    view.raf = Some(handle);
                }
            }
            Err(e) => log::warn!("requestAnimationFrame failed: {:?}", e),
        }
        closure.forget();
    }

    fn flappy_frame(app: Rc<RefCell<App>>) {
        let running = {
            let mut a = app.borrow_mut();
            let Some(view) = a.flappy.as_mut() else {
                return;
            };
            view.raf = None;
            view.sim.advance();
            renderer::draw_flappy(&view.surface, &view.sim);
            let running = view.sim.phase() == FlappyPhase::Running;
            a.after_input();
            running
        };
        if running {
            schedule_flappy(app);
        }
    }

    fn flappy_input(app: &Rc<RefCell<App>>) {
        let start_loop = {
            let mut a = app.borrow_mut();
            a.audio.resume();
            let Some(view) = a.flappy.as_mut() else {
                return;
            };
            if view.sim.phase() == FlappyPhase::Running {
                view.sim.apply_impulse();
                false
            } else {
                fit_flappy(view);
                view.sim.start();
                true
            }
        };
        app.borrow_mut().after_input();
        if start_loop {
            schedule_flappy(app.clone());
        }
    }

    fn schedule_snake(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let frame_app = app.clone();
        let closure = Closure::once(move |time: f64| snake_frame(frame_app, time));
        match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            Ok(handle) => {
                if let Some(view) = app.borrow_mut().snake.as_mut() {
                    view.raf = Some(handle);
                }
            }
            Err(e) => log::warn!("requestAnimationFrame failed: {:?}", e),
        }
        closure.forget();
    }

    fn snake_frame(app: Rc<RefCell<App>>, time: f64) {
        let running = {
            let mut a = app.borrow_mut();
            let Some(view) = a.snake.as_mut() else {
                return;
            };
            view.raf = None;
            if view.sim.advance(time) {
                renderer::draw_snake(&view.surface, &view.sim);
                set_text("snake-score", &view.sim.score().to_string());
            }
            let running = view.sim.phase() == SnakePhase::Running;
            if !running {
                set_text("snake-start", "Play again");
                set_hidden("snake-start", false);
            }
            a.after_input();
            running
        };
        if running {
            schedule_snake(app);
        }
    }

    fn snake_start(app: &Rc<RefCell<App>>) {
        let start_loop = {
            let mut a = app.borrow_mut();
            a.audio.resume();
            let Some(view) = a.snake.as_mut() else {
                return;
            };
            if view.sim.phase() == SnakePhase::Running {
                false
            } else {
                view.sim.start();
                renderer::draw_snake(&view.surface, &view.sim);
                true
            }
        };
        if start_loop {
            set_text("snake-score", "0");
            set_hidden("snake-start", true);
            schedule_snake(app.clone());
        }
    }

    fn snake_turn(app: &Rc<RefCell<App>>, direction: Direction) {
        if let Some(view) = app.borrow_mut().snake.as_mut() {
            view.sim.set_pending_direction(direction);
        }
    }

    // === Wiring ===

    fn scratch_input(app: &Rc<RefCell<App>>, slot: Slot, action: ScratchAction, event: &Event) {
        let mut a = app.borrow_mut();
        a.audio.resume();
        let Some(view) = a.card_mut(slot) else {
            return;
        };
        let point = surface_point(&view.surface.canvas, event);
        match action {
            ScratchAction::Press => {
                view.card.press();
                if let Some((x, y)) = point {
                    view.card.stroke(x, y);
                }
            }
            ScratchAction::Move => {
                if let Some((x, y)) = point {
                    view.card.stroke(x, y);
                }
            }
            ScratchAction::Release => view.card.release(),
        }
        if view.card.is_ready() {
            view.draw();
        }
        a.after_input();
    }

    fn setup_scratch_input(app: &Rc<RefCell<App>>, slot: Slot) {
        let Some(canvas) = element(&slot.canvas_id()) else {
            return;
        };
        let bindings = [
            ("mousedown", ScratchAction::Press),
            ("mousemove", ScratchAction::Move),
            ("mouseup", ScratchAction::Release),
            ("mouseleave", ScratchAction::Release),
            ("touchstart", ScratchAction::Press),
            ("touchmove", ScratchAction::Move),
            ("touchend", ScratchAction::Release),
        ];
        for (name, action) in bindings {
            let app = app.clone();
            listen(&canvas, name, move |event: Event| {
                if event.type_().starts_with("touch") {
                    event.prevent_default();
                }
                scratch_input(&app, slot, action, &event);
            });
        }
    }

    fn setup_games(app: &Rc<RefCell<App>>) {
        {
            let app = app.clone();
            on_click("open-flappy", move |_| app.borrow_mut().open_flappy());
        }
        {
            let app = app.clone();
            on_click("close-flappy", move |_| app.borrow_mut().close_flappy());
        }
        if let Some(canvas) = element("flappy-canvas") {
            for name in ["mousedown", "touchstart"] {
                let app = app.clone();
                listen(&canvas, name, move |event: Event| {
                    event.prevent_default();
                    flappy_input(&app);
                });
            }
        }

        {
            let app = app.clone();
            on_click("open-snake", move |_| app.borrow_mut().open_snake());
        }
        {
            let app = app.clone();
            on_click("close-snake", move |_| app.borrow_mut().close_snake());
        }
        {
            let app = app.clone();
            on_click("snake-start", move |_| snake_start(&app));
        }
        let pad = [
            ("dpad-up", Direction::Up),
            ("dpad-down", Direction::Down),
            ("dpad-left", Direction::Left),
            ("dpad-right", Direction::Right),
        ];
        for (id, direction) in pad {
            let app = app.clone();
            on_click(id, move |_| snake_turn(&app, direction));
        }
    }

    fn setup_lottery(app: &Rc<RefCell<App>>) {
        {
            let app = app.clone();
            on_click("open-lottery", move |_| {
                let probes = app.borrow_mut().ensure_lottery();
                app.borrow().render_lottery_text();
                set_hidden("lottery-modal", false);
                for probe in probes {
                    start_probe(&app, probe);
                }
            });
        }
        on_click("close-lottery", move |_| set_hidden("lottery-modal", true));
        {
            let app = app.clone();
            on_click("lottery-scratch-all", move |_| {
                let mut a = app.borrow_mut();
                a.scratch_all();
                a.after_input();
            });
        }
        {
            let app = app.clone();
            on_click("lottery-next", move |_| {
                let probes = app.borrow_mut().next_lottery_stage();
                for probe in probes {
                    start_probe(&app, probe);
                }
            });
        }
        for i in 0..TILES_PER_ROUND {
            setup_scratch_input(app, Slot::Tile(i));
        }
        on_click("close-victory", move |_| set_hidden("victory-modal", true));
    }

    fn setup_keyboard(app: &Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let app = app.clone();
        listen(&window, "keydown", move |event: Event| {
            let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            let key = event.key();
            let (snake_open, flappy_open) = {
                let a = app.borrow();
                (a.snake.is_some(), a.flappy.is_some())
            };
            if snake_open {
                let direction = match key.as_str() {
                    "ArrowUp" => Some(Direction::Up),
                    "ArrowDown" => Some(Direction::Down),
                    "ArrowLeft" => Some(Direction::Left),
                    "ArrowRight" => Some(Direction::Right),
                    _ => None,
                };
                if let Some(direction) = direction {
                    event.prevent_default();
                    snake_turn(&app, direction);
                } else if key == " " {
                    event.prevent_default();
                    snake_start(&app);
                }
            } else if flappy_open && matches!(key.as_str(), " " | "ArrowUp") {
                event.prevent_default();
                flappy_input(&app);
            }
        });
    }

    fn setup_resize(app: &Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let app = app.clone();
        listen(&window, "resize", move |_| app.borrow_mut().on_resize());
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Birthday Arcade starting...");

        let tuning = read_tuning();
        let app = Rc::new(RefCell::new(App::new(tuning)));

        let probes = app.borrow_mut().create_prize_cards();
        app.borrow_mut().refresh_gate();
        for probe in probes {
            start_probe(&app, probe);
        }
        for i in 0..PRIZE_CARDS {
            setup_scratch_input(&app, Slot::Prize(i));
        }

        setup_games(&app);
        setup_lottery(&app);
        setup_keyboard(&app);
        setup_resize(&app);

        if let Some(loading) = element("loading") {
            let _ = loading.class_list().add_1("hidden");
        }

        log::info!("Birthday Arcade running!");
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_app::run()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Birthday Arcade (native) starting...");
    log::info!("The page runs in the browser - build for wasm32 with `trunk serve`");

    let seed = 2024;
    demo_flappy(seed);
    demo_snake(seed);
    demo_scratch();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Autopilot run: jump whenever the body sinks below the next opening
#[cfg(not(target_arch = "wasm32"))]
fn demo_flappy(seed: u64) {
    use birthday_arcade::sim::{FlappyPhase, FlappySim};
    use birthday_arcade::tuning::FlappyTuning;

    let mut sim = FlappySim::with_seed(FlappyTuning::classic(), 360.0, 500.0, seed);
    sim.start();
    while sim.phase() == FlappyPhase::Running && sim.frame() < 5_000 {
        let tuning = sim.tuning();
        let body = *sim.body();
        let target = sim
            .obstacles()
            .iter()
            .find(|o| o.x + tuning.obstacle_width > body.pos.x - tuning.body_radius)
            .map(|o| o.gap_top + tuning.gap_size * 0.6)
            .unwrap_or(250.0);
        if body.pos.y > target && body.velocity >= 0.0 {
            sim.apply_impulse();
        }
        sim.advance();
    }
    log::info!("Obstacle demo: score {} after {} frames", sim.score(), sim.frame());
}

/// Greedy run toward the food, never reversing
#[cfg(not(target_arch = "wasm32"))]
fn demo_snake(seed: u64) {
    use birthday_arcade::sim::{Direction, SnakePhase, SnakeSim};
    use birthday_arcade::tuning::SnakeTuning;

    let mut sim = SnakeSim::with_seed(SnakeTuning::default(), seed);
    sim.start();
    let mut steps = 0;
    while sim.phase() == SnakePhase::Running && steps < 2_000 {
        let Some(head) = sim.head() else { break };
        let food = sim.food();
        let wanted = if food.x > head.x {
            Direction::Right
        } else if food.x < head.x {
            Direction::Left
        } else if food.y > head.y {
            Direction::Down
        } else {
            Direction::Up
        };
        let safe = [wanted, Direction::Up, Direction::Right, Direction::Down, Direction::Left]
            .into_iter()
            .filter(|d| *d != sim.direction().opposite())
            .find(|d| {
                let next = head + d.delta();
                (0..sim.grid_size()).contains(&next.x)
                    && (0..sim.grid_size()).contains(&next.y)
                    && !sim.segments().contains(&next)
            });
        if let Some(direction) = safe {
            sim.set_pending_direction(direction);
        }
        sim.step();
        steps += 1;
    }
    log::info!("Snake demo: score {} after {} steps", sim.score(), steps);
}

/// Scratch rows until the card reveals itself
#[cfg(not(target_arch = "wasm32"))]
fn demo_scratch() {
    use birthday_arcade::sim::ScratchCard;
    use birthday_arcade::tuning::ScratchTuning;

    let mut card = ScratchCard::new(ScratchTuning::card());
    card.set_on_complete(Box::new(|| log::info!("Scratch demo: revealed")));
    if !card.initialize(300, 160) {
        return;
    }
    card.press();
    let mut strokes = 0;
    'rows: for row in 0..8 {
        for col in 0..=30 {
            if card.is_revealed() {
                break 'rows;
            }
            card.stroke(col as f32 * 10.0, 10.0 + row as f32 * 20.0);
            strokes += 1;
        }
    }
    card.release();
    log::info!(
        "Scratch demo: {:.0}% erased after {} strokes",
        card.sample_erased_fraction() * 100.0,
        strokes
    );
}
