//! Shape Swarm entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, MouseEvent, Response};

    use shape_swarm::error::EntropyError;
    use shape_swarm::random::{
        EntropyPool, PooledSource, QRNG_URL, REFILL_INTERVAL_MS, RandomSourceKind, SharedPool,
        parse_qrng_response,
    };
    use shape_swarm::renderer::CanvasSurface;
    use shape_swarm::sim::{GameMode, ModifierKind, World};
    use shape_swarm::{Session, Settings};

    /// Modifier button ids in the page, by kind
    const MODIFIER_BUTTONS: [(ModifierKind, &str); 5] = [
        (ModifierKind::Haste, "speedMod"),
        (ModifierKind::AimAssist, "aimMod"),
        (ModifierKind::Shield, "shieldMod"),
        (ModifierKind::Grow, "growMod"),
        (ModifierKind::Freeze, "freezeMod"),
    ];

    struct Game {
        session: Session,
        pool: SharedPool,
    }

    thread_local! {
        static GAME: RefCell<Option<Rc<RefCell<Game>>>> = const { RefCell::new(None) };
    }

    fn with_game<R>(f: impl FnOnce(&mut Game) -> R) -> Option<R> {
        GAME.with(|slot| slot.borrow().as_ref().map(|g| f(&mut g.borrow_mut())))
    }

    impl Game {
        fn frame(&mut self, now_ms: f64) {
            self.session.frame(now_ms);
            if !self.session.drain_events().is_empty() {
                self.update_hud();
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let world = &self.session.world;

            if let Some(el) = document.get_element_by_id("scoreBox") {
                el.set_text_content(Some(&format!("Score: {}", world.score)));
            }
            if let Some(el) = document.get_element_by_id("shapeStats") {
                let top: Vec<String> = world
                    .stats
                    .ranked()
                    .into_iter()
                    .take(3)
                    .map(|(kind, count)| format!("{}{}", kind.icon(), count))
                    .collect();
                el.set_text_content(Some(&format!("Top Shapes: {}", top.join(" "))));
            }
            for (kind, id) in MODIFIER_BUTTONS {
                if let Some(el) = document.get_element_by_id(id) {
                    el.set_text_content(Some(&format!(
                        "{}: {}",
                        kind.glyph(),
                        world.bank.count(kind)
                    )));
                }
            }
            if let Some(el) = document.get_element_by_id("modeButton") {
                let label = match world.mode {
                    GameMode::Auto => "🎮",
                    GameMode::Manual => "🤖",
                };
                el.set_text_content(Some(label));
            }
        }
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialised".into());
        }

        log::info!("Shape Swarm starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;
        let (width, height) = fit_canvas(&canvas);

        let seed = js_sys::Date::now() as u64;
        let settings = Settings::default();
        let pool = EntropyPool::shared();
        let rng = PooledSource::new(seed, settings.random_source, pool.clone());
        let world = World::new(settings, Vec2::new(width, height), Box::new(rng));

        let mut session = Session::new(world);
        match CanvasSurface::new(&canvas) {
            Ok(surface) => session.set_surface(Some(Box::new(surface))),
            // keep simulating without drawing
            Err(e) => log::warn!("Canvas unavailable: {}", e),
        }

        let game = Rc::new(RefCell::new(Game { session, pool }));
        GAME.with(|slot| *slot.borrow_mut() = Some(game.clone()));
        game.borrow().update_hud();

        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(&canvas, game.clone());
        setup_buttons(game.clone());
        setup_auto_pause(game.clone());
        wasm_bindgen_futures::spawn_local(entropy_refill_loop(game.clone()));

        request_animation_frame(game);

        log::info!("Shape Swarm running!");
        Ok(())
    }

    /// Size the canvas to the window and return the field size
    fn fit_canvas(canvas: &HtmlCanvasElement) -> (f32, f32) {
        let (w, h) = web_sys::window()
            .map(|w| {
                let width = w.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(1280.0);
                let height = w.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(720.0);
                (width, height)
            })
            .unwrap_or((1280.0, 720.0));
        canvas.set_width(w as u32);
        canvas.set_height(h as u32);
        (w as f32, h as f32)
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Pointer
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let pos = Vec2::new(event.client_x() as f32, event.client_y() as f32);
                game.borrow_mut().session.pointer_move(pos);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Click spawns a cluster
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let pos = Vec2::new(event.client_x() as f32, event.client_y() as f32);
                game.borrow_mut().session.click(pos);
            });
            let _ = canvas
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                game.borrow_mut().session.key_down(&event.key());
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                game.borrow_mut().session.key_up(&event.key());
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Resize
        {
            let canvas = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let (w, h) = fit_canvas(&canvas);
                game.borrow_mut().session.resize(w, h);
            });
            let _ = window
                .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        for (kind, id) in MODIFIER_BUTTONS {
            if let Some(btn) = document.get_element_by_id(id) {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                    let mut g = game.borrow_mut();
                    if g.session.activate_modifier(kind, js_sys::Date::now()) {
                        g.session.drain_events();
                        g.update_hud();
                    }
                });
                let _ = btn
                    .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }

        if let Some(btn) = document.get_element_by_id("modeButton") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.session.toggle_mode();
                g.update_hud();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let mut g = game.borrow_mut();
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    if g.session.is_running() {
                        g.session.pause();
                        log::info!("Auto-paused (tab hidden)");
                    }
                } else {
                    g.session.resume();
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside) and focus
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().session.pause();
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().session.resume();
            });
            let _ =
                window.add_event_listener_with_callback("focus", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |_time: f64| {
            game_loop(game);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>) {
        game.borrow_mut().frame(js_sys::Date::now());
        request_animation_frame(game);
    }

    async fn sleep(ms: f64) {
        let promise = js_sys::Promise::new(&mut |resolve, _| {
            if let Some(window) = web_sys::window() {
                let _ = window
                    .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms as i32);
            }
        });
        let _ = JsFuture::from(promise).await;
    }

    async fn fetch_entropy() -> Result<Vec<f32>, EntropyError> {
        let network = |e: JsValue| EntropyError::Network(format!("{:?}", e));
        let window = web_sys::window().ok_or(EntropyError::Network("no window".into()))?;
        let response: Response = JsFuture::from(window.fetch_with_str(QRNG_URL))
            .await
            .map_err(network)?
            .dyn_into()
            .map_err(network)?;
        if !response.ok() {
            return Err(EntropyError::Network(format!("HTTP {}", response.status())));
        }
        let body = JsFuture::from(response.text().map_err(network)?)
            .await
            .map_err(network)?
            .as_string()
            .ok_or(EntropyError::Empty)?;
        parse_qrng_response(&body)
    }

    /// Keep the entropy pool topped up while external randomness is enabled
    async fn entropy_refill_loop(game: Rc<RefCell<Game>>) {
        let pool = game.borrow().pool.clone();
        loop {
            let enabled = game.borrow().session.world.settings.random_source
                == RandomSourceKind::External;
            let wanted = pool.borrow().needs_refill();
            if enabled && wanted {
                pool.borrow_mut().begin_fetch();
                let result = fetch_entropy().await;
                pool.borrow_mut().end_fetch(result);
            }
            sleep(REFILL_INTERVAL_MS).await;
        }
    }

    // Commands for the page's buttons and settings form

    #[wasm_bindgen]
    pub fn toggle_mode() -> String {
        with_game(|g| {
            let mode = g.session.toggle_mode();
            g.update_hud();
            format!("{:?}", mode).to_lowercase()
        })
        .unwrap_or_default()
    }

    /// Accepts the glyph or the modifier's name
    #[wasm_bindgen]
    pub fn activate_modifier(kind: &str) -> bool {
        let Some(kind) = ModifierKind::parse(kind) else {
            log::warn!("Unknown modifier: {}", kind);
            return false;
        };
        with_game(|g| {
            let activated = g.session.activate_modifier(kind, js_sys::Date::now());
            g.update_hud();
            activated
        })
        .unwrap_or(false)
    }

    /// Apply settings given as JSON (camelCase keys)
    #[wasm_bindgen]
    pub fn apply_settings(json: &str) -> Result<(), JsValue> {
        let settings = Settings::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        with_game(|g| g.session.apply_settings(settings))
            .ok_or_else(|| JsValue::from_str("game not started"))?
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen]
    pub fn pause_game() {
        with_game(|g| g.session.pause());
    }

    #[wasm_bindgen]
    pub fn resume_game() {
        with_game(|g| g.session.resume());
    }

    /// HUD state as JSON
    #[wasm_bindgen]
    pub fn hud_snapshot() -> String {
        with_game(|g| serde_json::to_string(&g.session.hud_snapshot()).unwrap_or_default())
            .unwrap_or_default()
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    if let Err(e) = wasm_game::run().await {
        log::error!("Startup failed: {:?}", e);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use glam::Vec2;
    use shape_swarm::consts::{DEFAULT_FIELD_HEIGHT, DEFAULT_FIELD_WIDTH};
    use shape_swarm::renderer::RecordingSurface;
    use shape_swarm::sim::World;
    use shape_swarm::{Session, Settings};

    env_logger::init();
    log::info!("Shape Swarm (native) starting...");
    log::info!("Native mode runs headless - run with `trunk serve` for the web version");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(12345);
    let settings = match std::env::var("SHAPE_SWARM_SETTINGS") {
        Ok(json) => Settings::from_json(&json).unwrap_or_else(|e| {
            log::warn!("Ignoring SHAPE_SWARM_SETTINGS: {}", e);
            Settings::default()
        }),
        Err(_) => Settings::default(),
    };
    match settings.to_json() {
        Ok(json) => log::info!("Seed {} settings {}", seed, json),
        Err(e) => log::warn!("Could not serialise settings: {}", e),
    }

    let field = Vec2::new(DEFAULT_FIELD_WIDTH, DEFAULT_FIELD_HEIGHT);
    let mut session = Session::new(World::seeded(settings, field, seed))
        .with_surface(Box::new(RecordingSurface::default()));

    // one minute at 60 frames per second
    for frame in 0..3600u32 {
        let now = frame as f64 * 1000.0 / 60.0;
        session.frame(now);
        for event in session.drain_events() {
            log::debug!("{:?}", event);
        }
        if frame % 600 == 0 {
            let world = &session.world;
            log::info!(
                "t={:.0}s score={} enemies={} banked={} active={}",
                now / 1000.0,
                world.score,
                world.live_enemy_count(),
                world.bank.total(),
                world.active_modifiers.len()
            );
        }
    }

    match serde_json::to_string_pretty(&session.hud_snapshot()) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Could not serialise HUD: {}", e),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
