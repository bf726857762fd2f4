//! Tank Siege entry point
//!
//! Browser: canvas host driving the simulation from requestAnimationFrame.
//! Native: headless autopilot round, handy for balance checks and soak runs.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::f64::consts::TAU;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::{JsFuture, spawn_local};
    use web_sys::{
        CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, HtmlImageElement, HtmlInputElement,
        KeyboardEvent, MouseEvent,
    };

    use tank_siege::assets::{self, AssetCache, SpriteKey};
    use tank_siege::audio::{AudioManager, CuePlayer};
    use tank_siege::leaderboard::{self, Board, LeaderboardRecord};
    use tank_siege::render::{DrawCmd, Surface};
    use tank_siege::services::{
        AuthContext, AuthProvider, LeaderboardService, MintService, ScoreService, ServiceFuture, ServiceRequest,
        ServiceResponse, Services,
    };
    use tank_siege::sim::{FrameClock, FrameInput, GameEvent, GamePhase, GameState, frame};
    use tank_siege::{Error, Leaderboard, Settings, TransactionLog};

    // Page-owned wallet/backend bridge. Every call tolerates a missing bridge.
    #[wasm_bindgen(inline_js = "
        function bridge() {
            const b = window.tankSiegeBridge;
            return (b && typeof b === 'object') ? b : null;
        }

        function call(name, ...args) {
            const b = bridge();
            if (!b || typeof b[name] !== 'function') {
                return Promise.reject(new Error('Backend unavailable'));
            }
            return Promise.resolve(b[name](...args)).then((reply) => JSON.stringify(reply ?? null));
        }

        export function bridge_authenticated() {
            const b = bridge();
            return !!(b && typeof b.authenticated === 'function' && b.authenticated());
        }

        export function bridge_wallet_address() {
            const b = bridge();
            const address = b && typeof b.walletAddress === 'function' ? b.walletAddress() : null;
            return address ? String(address) : undefined;
        }

        export function bridge_login() {
            const b = bridge();
            if (b && typeof b.login === 'function') {
                b.login();
            }
        }

        export function bridge_submit_score(score, isDeath, address) {
            return call('submitScore', score, isDeath, address ?? null);
        }

        export function bridge_mint(score, address) {
            return call('mint', score, address ?? null);
        }

        export function bridge_leaderboard(authenticated) {
            return call('leaderboard', authenticated ? 'authenticated' : 'guest');
        }
    ")]
    extern "C" {
        fn bridge_authenticated() -> bool;
        fn bridge_wallet_address() -> Option<String>;
        fn bridge_login();
        fn bridge_submit_score(score: f64, is_death: bool, address: Option<String>) -> js_sys::Promise;
        fn bridge_mint(score: f64, address: Option<String>) -> js_sys::Promise;
        fn bridge_leaderboard(authenticated: bool) -> js_sys::Promise;
    }

    /// Await a bridge promise that resolves to a JSON string
    async fn settle(promise: js_sys::Promise) -> Result<String, Error> {
        let value = JsFuture::from(promise).await.map_err(js_error)?;
        value
            .as_string()
            .ok_or_else(|| Error::Service("Malformed backend reply".to_string()))
    }

    fn js_error(value: JsValue) -> Error {
        let text = value
            .dyn_ref::<js_sys::Error>()
            .map(|e| String::from(e.message()))
            .or_else(|| value.as_string())
            .unwrap_or_else(|| "Unknown backend error".to_string());
        Error::Service(text)
    }

    /// `window.tankSiegeBridge` behind the service traits
    #[derive(Debug, Default, Clone, Copy)]
    struct JsBridge;

    impl AuthProvider for JsBridge {
        fn authenticated(&self) -> bool {
            bridge_authenticated()
        }

        fn login(&mut self) {
            bridge_login();
        }

        fn wallet_address(&self) -> Option<String> {
            bridge_wallet_address()
        }
    }

    impl ScoreService for JsBridge {
        fn submit(&self, score: u64, is_death: bool, auth: &AuthContext) -> ServiceFuture<ServiceResponse> {
            let promise = bridge_submit_score(score as f64, is_death, auth.wallet_address.clone());
            Box::pin(async move { ServiceResponse::from_json(&settle(promise).await?) })
        }
    }

    impl MintService for JsBridge {
        fn mint(&self, score: u64, auth: &AuthContext) -> ServiceFuture<ServiceResponse> {
            let promise = bridge_mint(score as f64, auth.wallet_address.clone());
            Box::pin(async move { ServiceResponse::from_json(&settle(promise).await?) })
        }
    }

    impl LeaderboardService for JsBridge {
        fn top(&self, board: Board) -> ServiceFuture<Vec<LeaderboardRecord>> {
            let promise = bridge_leaderboard(board == Board::Authenticated);
            Box::pin(async move { leaderboard::parse_records(&settle(promise).await?) })
        }
    }

    /// Paints draw commands onto the 2D context
    struct CanvasSurface<'a> {
        ctx: &'a CanvasRenderingContext2d,
        images: &'a AssetCache<HtmlImageElement>,
        width: f64,
        height: f64,
    }

    impl CanvasSurface<'_> {
        fn paint(&self, cmd: DrawCmd) -> Result<(), JsValue> {
            let ctx = self.ctx;
            match cmd {
                DrawCmd::Fill { color } => {
                    ctx.set_fill_style_str(color);
                    ctx.fill_rect(0.0, 0.0, self.width, self.height);
                }
                DrawCmd::Rect { x, y, w, h, color } => {
                    ctx.set_fill_style_str(color);
                    ctx.fill_rect(x.into(), y.into(), w.into(), h.into());
                }
                DrawCmd::Circle { center, radius, color } => {
                    ctx.set_fill_style_str(color);
                    ctx.begin_path();
                    ctx.arc(center.x.into(), center.y.into(), radius.into(), 0.0, TAU)?;
                    ctx.fill();
                }
                DrawCmd::Sprite {
                    key,
                    center,
                    width,
                    height,
                    rotation,
                } => {
                    let Some(image) = self.images.get(key) else {
                        return Ok(());
                    };
                    let (w, h) = (f64::from(width), f64::from(height));
                    ctx.save();
                    let drawn = ctx
                        .translate(center.x.into(), center.y.into())
                        .and_then(|_| ctx.rotate(rotation.into()))
                        .and_then(|_| {
                            ctx.draw_image_with_html_image_element_and_dw_and_dh(image, -w / 2.0, -h / 2.0, w, h)
                        });
                    // Always unwind the transform
                    ctx.restore();
                    drawn?;
                }
                DrawCmd::HealthBar { center, width, fraction } => {
                    let (x, y, w) = (f64::from(center.x - width / 2.0), f64::from(center.y), f64::from(width));
                    ctx.set_fill_style_str("#550000");
                    ctx.fill_rect(x, y, w, 5.0);
                    ctx.set_fill_style_str("#22cc44");
                    ctx.fill_rect(x, y, w * f64::from(fraction.clamp(0.0, 1.0)), 5.0);
                }
            }
            Ok(())
        }
    }

    impl Surface for CanvasSurface<'_> {
        fn draw(&mut self, cmd: DrawCmd) {
            if let Err(e) = self.paint(cmd) {
                log::warn!("Draw failed: {:?}", e);
            }
        }

        fn sprite_ready(&self, key: SpriteKey) -> bool {
            self.images.contains(key)
        }
    }

    /// Host-side work triggered by a frame
    enum Followup {
        Service(ServiceRequest),
        RefreshLeaderboard,
    }

    /// Game instance holding all state
    struct Game {
        state: GameState,
        clock: FrameClock,
        input: FrameInput,
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        images: Rc<RefCell<AssetCache<HtmlImageElement>>>,
        audio: AudioManager,
        settings: Settings,
        transactions: TransactionLog,
        leaderboard: Leaderboard,
        auth: AuthContext,
        bridge: JsBridge,
        services: Services,
    }

    impl Game {
        fn new(seed: u64, canvas: HtmlCanvasElement, ctx: CanvasRenderingContext2d) -> Self {
            let bridge = JsBridge;
            let auth = bridge.snapshot();
            Self {
                state: GameState::new(seed),
                clock: FrameClock::new(),
                input: FrameInput::default(),
                canvas,
                ctx,
                images: Rc::new(RefCell::new(AssetCache::new())),
                audio: AudioManager::new(),
                settings: Settings::load(),
                transactions: TransactionLog::load(),
                leaderboard: Leaderboard::new(auth.authenticated),
                auth,
                bridge,
                services: Services::new(Box::new(bridge), Box::new(bridge)),
            }
        }

        /// Step and paint one display frame
        fn tick(&mut self, time: f64) -> Vec<Followup> {
            self.input.now_ms = time;
            self.input.frame_multiplier = self.clock.advance(time);

            {
                let images = self.images.borrow();
                let mut surface = CanvasSurface {
                    ctx: &self.ctx,
                    images: &images,
                    width: f64::from(self.state.tuning.canvas_width),
                    height: f64::from(self.state.tuning.canvas_height),
                };
                frame(&mut self.state, &self.input, &mut surface);
            }

            let mut followups = Vec::new();
            for event in self.state.drain_events() {
                match event {
                    GameEvent::Sound(cue) => self.audio.play(cue, self.settings.sound_on, self.settings.volume),
                    GameEvent::PhaseChanged(phase) => {
                        self.show_phase(phase);
                        if phase == GamePhase::GameOver {
                            followups.push(Followup::RefreshLeaderboard);
                        }
                    }
                    GameEvent::Countdown(n) => set_text("countdown", &n.to_string()),
                    GameEvent::BuffTimer(secs) => {
                        set_visible("buff", secs > 0);
                        set_text("buff-timer", &secs.to_string());
                    }
                    other => {
                        if let Some(request) = ServiceRequest::from_event(&other) {
                            followups.push(Followup::Service(request));
                        }
                    }
                }
            }

            self.update_hud();
            followups
        }

        fn start_round(&mut self) {
            self.audio.resume();
            self.auth = self.bridge.snapshot();
            self.state.auth = self.auth.clone();
            self.input.shooting = false;
            self.clock.reset();
            self.state.start_countdown();
        }

        fn show_phase(&self, phase: GamePhase) {
            set_visible("menu", phase == GamePhase::Menu);
            set_visible("countdown", phase == GamePhase::Countdown);
            set_visible("hud", matches!(phase, GamePhase::Countdown | GamePhase::Playing));
            set_visible("game-over", phase == GamePhase::GameOver);
            if phase != GamePhase::Countdown {
                set_visible("buff", false);
            }

            if phase == GamePhase::GameOver {
                let stats = &self.state.session.stats;
                set_text("final-score", &stats.score().to_string());
                set_text("final-kills", &stats.kills().to_string());
                set_text("final-boss-kills", &stats.boss_kills().to_string());
                set_text("final-damage-given", &stats.damage_given().to_string());
                set_text("final-damage-taken", &stats.damage_taken().to_string());
                set_text("final-heals", &stats.heals_used().to_string());
                set_text("final-buffs", &stats.buffs_taken().to_string());
            }
        }

        fn update_hud(&self) {
            let stats = &self.state.session.stats;
            set_text("kills", &stats.kills().to_string());
            set_text("score", &stats.score().to_string());
            if let Some(player) = &self.state.player {
                set_text("health", &format!("{}/{}", player.health.max(0), player.max_health));
            }
            let wallet = match &self.auth.wallet_address {
                Some(address) if self.auth.authenticated => leaderboard::shorten_address(address),
                _ => "Guest".to_string(),
            };
            set_text("wallet", &wallet);
        }

        fn update_sound_controls(&self) {
            set_text("sound-btn", self.settings.sound_label());
            if let Some(slider) = element("volume").and_then(|el| el.dyn_into::<HtmlInputElement>().ok()) {
                slider.set_value(&self.settings.volume.to_string());
            }
        }

        fn save_transactions(&self) {
            if let Err(e) = self.transactions.save() {
                log::warn!("Could not save transactions: {e}");
            }
        }

        fn render_transactions(&self) {
            let Some((document, list)) = document().zip(element("tx-list")) else {
                return;
            };
            list.set_text_content(None);
            if self.transactions.is_empty() {
                list.set_text_content(Some("No transactions yet"));
                return;
            }
            for tx in self.transactions.entries() {
                let date = js_sys::Date::new(&JsValue::from_f64(tx.date));
                let time = String::from(date.to_locale_time_string("en-US"));
                let cells = [
                    Cell::Text(tx.label.clone()),
                    Cell::link_or_text(tx.status()),
                    Cell::Text(time),
                ];
                append_row(&document, &list, &cells);
            }
        }

        fn render_leaderboard(&self) {
            let Some((document, table)) = document().zip(element("leaderboard-rows")) else {
                return;
            };
            let board = self.leaderboard.active;
            set_text(
                "leaderboard-title",
                match board {
                    Board::Guest => "Guest Leaderboard",
                    Board::Authenticated => "Wallet Leaderboard",
                },
            );
            table.set_text_content(None);

            let me: Vec<&str> = self.auth.wallet_address.as_deref().into_iter().collect();
            match self.leaderboard.board(board).status_text() {
                Some(status) => table.set_text_content(Some(&status)),
                None => {
                    for row in self.leaderboard.rows(board, &me) {
                        let mut cells = vec![
                            Cell::Text(row.place.to_string()),
                            Cell::Text(row.player),
                            Cell::Text(row.score.to_string()),
                        ];
                        if let Some(total) = row.total_score {
                            cells.push(Cell::Text(total.to_string()));
                        }
                        cells.push(Cell::link_or_text(&row.transaction));
                        append_row(&document, &table, &cells);
                    }
                }
            }
        }
    }

    enum Cell {
        Text(String),
        Link(String),
    }

    impl Cell {
        fn link_or_text(value: &str) -> Self {
            if value.starts_with("http") {
                Cell::Link(value.to_string())
            } else {
                Cell::Text(value.to_string())
            }
        }
    }

    /// Build a row with text content only; backend strings never reach innerHTML
    fn append_row(document: &Document, parent: &Element, cells: &[Cell]) {
        let Ok(row) = document.create_element("div") else {
            return;
        };
        let _ = row.set_attribute("class", "row");
        for cell in cells {
            let built = match cell {
                Cell::Text(text) => document.create_element("span").map(|el| {
                    el.set_text_content(Some(text));
                    el
                }),
                Cell::Link(url) => document.create_element("a").map(|el| {
                    let _ = el.set_attribute("href", url);
                    let _ = el.set_attribute("target", "_blank");
                    let _ = el.set_attribute("rel", "noopener");
                    el.set_text_content(Some("View"));
                    el
                }),
            };
            if let Ok(el) = built {
                let _ = row.append_child(&el);
            }
        }
        let _ = parent.append_child(&row);
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn element(id: &str) -> Option<Element> {
        document()?.get_element_by_id(id)
    }

    fn set_text(id: &str, text: &str) {
        if let Some(el) = element(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(id: &str, visible: bool) {
        if let Some(el) = element(id) {
            let _ = el.class_list().toggle_with_force("hidden", !visible);
        }
    }

    /// Send a simulation request to the backend and track it in the log
    fn dispatch(game: &Rc<RefCell<Game>>, request: ServiceRequest) {
        let (id, pending) = {
            let mut guard = game.borrow_mut();
            let g = &mut *guard;
            let id = g
                .transactions
                .push_pending(request.label(), js_sys::Date::now(), g.auth.wallet_address.clone());
            g.save_transactions();
            g.render_transactions();
            log::debug!("Dispatching {}", request.label());
            (id, g.services.dispatch(request, &g.auth))
        };

        let game = game.clone();
        spawn_local(async move {
            let result = pending.await;
            let mut g = game.borrow_mut();
            if g.transactions.resolve(id, result, js_sys::Date::now()) {
                g.save_transactions();
                g.render_transactions();
            }
        });
    }

    fn refresh_leaderboard(game: &Rc<RefCell<Game>>) {
        let (board, pending) = {
            let mut g = game.borrow_mut();
            let board = g.leaderboard.active;
            g.leaderboard.begin_fetch(board);
            g.render_leaderboard();
            (board, g.bridge.top(board))
        };

        let game = game.clone();
        spawn_local(async move {
            let result = pending.await;
            let mut g = game.borrow_mut();
            g.leaderboard.finish_fetch(board, result);
            g.render_leaderboard();
        });
    }

    /// Start loading every sprite; the cache fills in as images arrive
    fn preload_sprites(images: &Rc<RefCell<AssetCache<HtmlImageElement>>>, explosion_frames: u32) {
        for key in assets::manifest(explosion_frames) {
            let Ok(image) = HtmlImageElement::new() else {
                images.borrow_mut().mark_failed(key);
                continue;
            };

            let onload = {
                let images = images.clone();
                let loaded = image.clone();
                Closure::once(move || images.borrow_mut().insert(key, loaded))
            };
            let onerror = {
                let images = images.clone();
                Closure::once(move || images.borrow_mut().mark_failed(key))
            };
            image.set_onload(Some(onload.as_ref().unchecked_ref()));
            image.set_onerror(Some(onerror.as_ref().unchecked_ref()));
            onload.forget();
            onerror.forget();

            image.set_src(&key.path());
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Tank Siege starting...");

        let Some(document) = document() else {
            log::error!("No document");
            return;
        };

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No #canvas element");
            return;
        };
        let Some(ctx) = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|obj| obj.dyn_into::<CanvasRenderingContext2d>().ok())
        else {
            log::error!("2D canvas context unavailable");
            return;
        };

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, canvas.clone(), ctx)));
        log::info!("Game initialized with seed: {}", seed);

        {
            let g = game.borrow();
            // Logical resolution; CSS scales the element to fit
            canvas.set_width(g.state.tuning.canvas_width as u32);
            canvas.set_height(g.state.tuning.canvas_height as u32);
            preload_sprites(&g.images, g.state.tuning.explosion_frame_count);
            g.show_phase(GamePhase::Menu);
            g.update_sound_controls();
            g.render_transactions();
        }

        setup_input_handlers(&canvas, game.clone());
        setup_round_buttons(game.clone());
        setup_sound_controls(game.clone());
        setup_leaderboard_controls(game.clone());

        refresh_leaderboard(&game);
        request_animation_frame(game);

        log::info!("Tank Siege running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // WASD (and arrows) movement
        for (event_name, pressed) in [("keydown", true), ("keyup", false)] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                let keys = &mut g.input.keys;
                match event.key().to_lowercase().as_str() {
                    "w" | "arrowup" => keys.up = pressed,
                    "s" | "arrowdown" => keys.down = pressed,
                    "a" | "arrowleft" => keys.left = pressed,
                    "d" | "arrowright" => keys.right = pressed,
                    _ => return,
                }
                event.prevent_default();
            });
            let _ = window.add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Aim follows the mouse, mapped to logical canvas coordinates
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                let rect = g.canvas.get_bounding_client_rect();
                if rect.width() <= 0.0 || rect.height() <= 0.0 {
                    return;
                }
                let sx = f64::from(g.state.tuning.canvas_width) / rect.width();
                let sy = f64::from(g.state.tuning.canvas_height) / rect.height();
                g.input.aim.x = ((f64::from(event.client_x()) - rect.left()) * sx) as f32;
                g.input.aim.y = ((f64::from(event.client_y()) - rect.top()) * sy) as f32;
            });
            let _ = canvas.add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                if event.button() == 0 {
                    game.borrow_mut().input.shooting = true;
                }
            });
            let _ = canvas.add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Released anywhere, including outside the canvas
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                if event.button() == 0 {
                    game.borrow_mut().input.shooting = false;
                }
            });
            let _ = window.add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn on_click(id: &str, mut handler: impl FnMut() + 'static) {
        let Some(el) = element(id) else {
            log::warn!("Missing #{id}");
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| handler());
        let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_round_buttons(game: Rc<RefCell<Game>>) {
        for id in ["play-btn", "restart-btn"] {
            let game = game.clone();
            on_click(id, move || game.borrow_mut().start_round());
        }
        {
            let game = game.clone();
            on_click("demo-btn", move || {
                let mut g = game.borrow_mut();
                g.input.autopilot = !g.input.autopilot;
                let label = if g.input.autopilot { "Demo: On" } else { "Demo: Off" };
                set_text("demo-btn", label);
                log::info!("Autopilot {}", if g.input.autopilot { "enabled" } else { "disabled" });
            });
        }
        {
            let game = game.clone();
            on_click("stop-btn", move || {
                game.borrow_mut().state.stop();
            });
        }
        {
            let game = game.clone();
            on_click("menu-btn", move || game.borrow_mut().state.return_to_menu());
        }
        on_click("login-btn", move || {
            let mut g = game.borrow_mut();
            g.bridge.login();
            g.auth = g.bridge.snapshot();
            g.leaderboard.active = Board::default_for(g.auth.authenticated);
        });
    }

    fn setup_sound_controls(game: Rc<RefCell<Game>>) {
        {
            let game = game.clone();
            on_click("sound-btn", move || {
                let mut g = game.borrow_mut();
                g.settings.toggle_sound();
                g.settings.save();
                g.update_sound_controls();
            });
        }

        let Some(slider) = element("volume") else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
            let Some(input) = event
                .target()
                .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
            else {
                return;
            };
            let Ok(volume) = input.value().parse::<i32>() else {
                return;
            };
            let mut g = game.borrow_mut();
            g.settings.set_volume(volume);
            g.settings.save();
            set_text("sound-btn", g.settings.sound_label());
        });
        let _ = slider.add_event_listener_with_callback("input", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_leaderboard_controls(game: Rc<RefCell<Game>>) {
        for (id, board) in [("board-guest", Board::Guest), ("board-wallet", Board::Authenticated)] {
            let game = game.clone();
            on_click(id, move || {
                game.borrow_mut().leaderboard.active = board;
                refresh_leaderboard(&game);
            });
        }
        {
            let game = game.clone();
            on_click("board-refresh", move || refresh_leaderboard(&game));
        }
        on_click("tx-clear", move || {
            let mut g = game.borrow_mut();
            g.transactions.clear();
            g.save_transactions();
            g.render_transactions();
        });
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        let followups = game.borrow_mut().tick(time);

        for followup in followups {
            match followup {
                Followup::Service(request) => dispatch(&game, request),
                Followup::RefreshLeaderboard => refresh_leaderboard(&game),
            }
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::fs;
    use std::path::PathBuf;

    use clap::Parser;

    use tank_siege::audio::{CuePlayer, SilentPlayer};
    use tank_siege::consts::REFERENCE_FRAME_MS;
    use tank_siege::render::DrawCmd;
    use tank_siege::services::{AuthContext, ServiceRequest};
    use tank_siege::sim::{FrameInput, GameEvent, GamePhase, GameState, frame};
    use tank_siege::{Error, Tuning};

    #[derive(Parser, Debug)]
    #[command(name = "tank-siege")]
    #[command(about = "Play a seeded Tank Siege round with the autopilot and report the stats")]
    pub struct Cli {
        #[arg(long, default_value_t = 42)]
        pub seed: u64,
        /// Frame budget at 60 Hz (default is three minutes)
        #[arg(long, default_value_t = 60 * 180)]
        pub max_frames: u32,
        /// JSON file overriding the default tuning
        #[arg(long)]
        pub tuning: Option<PathBuf>,
    }

    pub fn run(options: Cli) -> Result<(), Error> {
        let tuning = match &options.tuning {
            Some(path) => {
                let json = fs::read_to_string(path)?;
                Tuning::from_json(&json)?
            }
            None => Tuning::default(),
        };

        let mut state = GameState::with_tuning(tuning, options.seed);
        state.auth = AuthContext::guest();
        state.start_countdown();

        let mut input = FrameInput {
            frame_multiplier: 1.0,
            autopilot: true,
            ..Default::default()
        };
        let mut surface: Vec<DrawCmd> = Vec::new();
        let mut requests: Vec<ServiceRequest> = Vec::new();
        let mut frames = 0;

        while frames < options.max_frames && state.phase() != GamePhase::GameOver {
            input.now_ms = f64::from(frames) * REFERENCE_FRAME_MS;
            surface.clear();
            frame(&mut state, &input, &mut surface);
            collect(&mut state, &mut requests);
            frames += 1;
        }

        if state.stop() {
            log::info!("Time limit reached, stopping round");
            collect(&mut state, &mut requests);
        }

        let stats = &state.session.stats;
        log::info!(
            "Seed {}: {} frames, score {}, kills {} ({} boss), damage given {} taken {}, heals {}, buffs {}",
            options.seed,
            frames,
            stats.score(),
            stats.kills(),
            stats.boss_kills(),
            stats.damage_given(),
            stats.damage_taken(),
            stats.heals_used(),
            stats.buffs_taken(),
        );
        log::info!("{} backend requests would have been sent", requests.len());
        if let Some(last) = requests.last() {
            log::info!("Last request: {}", last.label());
        }
        Ok(())
    }

    fn collect(state: &mut GameState, requests: &mut Vec<ServiceRequest>) {
        for event in state.drain_events() {
            match event {
                GameEvent::Sound(cue) => SilentPlayer.play(cue, true, 100),
                GameEvent::PhaseChanged(phase) => log::info!("Phase -> {:?}", phase),
                GameEvent::Countdown(n) => log::debug!("Countdown {}", n),
                other => {
                    if let Some(request) = ServiceRequest::from_event(&other) {
                        log::debug!("Request {}", request.label());
                        requests.push(request);
                    }
                }
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Tank Siege (native) starting headless autopilot round...");

    let cli = <headless::Cli as clap::Parser>::parse();
    if let Err(e) = headless::run(cli) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
