//! Game session
//!
//! Wraps the world with the frame loop concerns: pausing, failure recovery and
//! an optional drawing surface. The host calls `frame` once per animation frame.

use std::panic::{AssertUnwindSafe, catch_unwind};

use glam::Vec2;

use crate::error::SettingsError;
use crate::renderer::{Surface, build_frame};
use crate::settings::Settings;
use crate::sim::shape::{GameMode, ModifierKind};
use crate::sim::state::{GameEvent, HudSnapshot, World};
use crate::sim::tick;

pub struct Session {
    pub world: World,
    running: bool,
    surface: Option<Box<dyn Surface>>,
}

impl Session {
    pub fn new(world: World) -> Self {
        log::info!(
            "Session started on a {}x{} field",
            world.field.x,
            world.field.y
        );
        Self {
            world,
            running: true,
            surface: None,
        }
    }

    pub fn with_surface(mut self, surface: Box<dyn Surface>) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Replace or drop the drawing surface; the simulation runs either way
    pub fn set_surface(&mut self, surface: Option<Box<dyn Surface>>) {
        self.surface = surface;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pause(&mut self) {
        if self.running {
            self.running = false;
            log::info!("Paused");
        }
    }

    pub fn resume(&mut self) {
        if !self.running {
            self.running = true;
            log::info!("Resumed");
        }
    }

    /// Run one animation frame
    ///
    /// While paused only due deferred tasks run. Returns whether a tick ran.
    pub fn frame(&mut self, now_ms: f64) -> bool {
        if !self.running {
            self.world.run_due_tasks(now_ms);
            return false;
        }

        let world = &mut self.world;
        match catch_unwind(AssertUnwindSafe(|| tick::tick(world, now_ms))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                log::error!("Tick failed: {}", e);
                self.world.repair(&e);
            }
            Err(_) => {
                log::error!("Tick panicked, resuming on the next frame");
                if let Err(e) = self.world.validate() {
                    self.world.repair(&e);
                }
            }
        }

        self.render(now_ms);
        true
    }

    fn render(&mut self, now_ms: f64) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let commands = build_frame(&self.world, now_ms);
        if let Err(e) = surface.draw(&commands) {
            log::warn!("Render error: {}", e);
        }
    }

    pub fn toggle_mode(&mut self) -> GameMode {
        self.world.toggle_mode()
    }

    /// Spend a banked charge; false when none of that kind is banked
    pub fn activate_modifier(&mut self, kind: ModifierKind, now_ms: f64) -> bool {
        self.world.activate_modifier(kind, now_ms)
    }

    pub fn click(&mut self, pos: Vec2) {
        self.world.spawn_cluster(pos);
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        self.world.input.pointer = pos;
    }

    pub fn key_down(&mut self, key: &str) {
        self.world.input.keys.press(key);
    }

    pub fn key_up(&mut self, key: &str) {
        self.world.input.keys.release(key);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.world.resize(width, height);
    }

    /// Validate and apply; the world keeps its settings on rejection
    pub fn apply_settings(&mut self, settings: Settings) -> Result<(), SettingsError> {
        if let Err(e) = settings.validate() {
            log::warn!("Settings rejected: {}", e);
            return Err(e);
        }
        self.world.apply_settings(settings);
        Ok(())
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.world.drain_events()
    }

    pub fn hud_snapshot(&self) -> HudSnapshot {
        self.world.hud_snapshot()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::error::RenderError;
    use crate::random::ScriptedSource;
    use crate::renderer::{DrawCommand, RecordingSurface};

    fn session() -> Session {
        let settings = Settings {
            spawn_rate: 0.0,
            ..Settings::default()
        };
        Session::new(World::new(
            settings,
            Vec2::new(1000.0, 1000.0),
            Box::new(ScriptedSource::constant(0.5)),
        ))
    }

    struct Shared(Rc<RefCell<RecordingSurface>>);

    impl Surface for Shared {
        fn draw(&mut self, commands: &[DrawCommand]) -> Result<(), RenderError> {
            self.0.borrow_mut().draw(commands)
        }
    }

    struct Broken;

    impl Surface for Broken {
        fn draw(&mut self, _: &[DrawCommand]) -> Result<(), RenderError> {
            Err(RenderError::Backend("lost".into()))
        }
    }

    #[test]
    fn test_pause_stops_ticking() {
        let mut s = session();
        assert!(s.frame(0.0));
        s.pause();
        assert!(!s.frame(16.0));
        assert_eq!(s.world.time_ticks, 1);
        s.resume();
        assert!(s.frame(32.0));
        assert_eq!(s.world.time_ticks, 2);
    }

    #[test]
    fn test_shield_detonates_while_paused() {
        let mut s = session();
        let id = s.world.spawn_enemy(Some(Vec2::new(50.0, 50.0)));
        s.world.bank.add(ModifierKind::Shield);
        assert!(s.activate_modifier(ModifierKind::Shield, 1000.0));
        s.pause();
        s.frame(1200.0);
        assert!(s.world.shape(id).is_some());
        s.frame(1500.0);
        assert!(s.world.shape(id).is_none());
        assert_eq!(s.world.score, 1);
        assert!(!s.is_running());
    }

    #[test]
    fn test_frames_are_drawn() {
        let recorder = Rc::new(RefCell::new(RecordingSurface::default()));
        let mut s = session().with_surface(Box::new(Shared(recorder.clone())));
        s.frame(0.0);
        s.frame(16.0);
        assert_eq!(recorder.borrow().frames, 2);
        assert!(matches!(
            recorder.borrow().last.first(),
            Some(DrawCommand::Clear { .. })
        ));
    }

    #[test]
    fn test_render_errors_do_not_stop_simulation() {
        let mut s = session().with_surface(Box::new(Broken));
        for i in 0..5 {
            assert!(s.frame(i as f64 * 16.0));
        }
        assert_eq!(s.world.time_ticks, 5);
    }

    #[test]
    fn test_runs_without_surface() {
        let mut s = session();
        s.set_surface(None);
        s.world.spawn_enemy(Some(Vec2::new(500.0, 500.0)));
        s.frame(0.0);
        // hero spawned at the field centre
        assert_eq!(s.world.score, 1);
    }

    #[test]
    fn test_non_finite_shape_is_discarded() {
        let mut s = session();
        let id = s.world.spawn_enemy(Some(Vec2::new(100.0, 100.0)));
        s.world
            .shapes
            .iter_mut()
            .find(|sh| sh.id == id)
            .unwrap()
            .target = Vec2::new(f32::NAN, 0.0);
        assert!(s.frame(0.0));
        assert!(s.world.shape(id).is_none());
        assert!(s.frame(16.0));
    }

    #[test]
    fn test_rejected_settings_keep_old() {
        let mut s = session();
        let bad = Settings {
            spawn_rate: 2.0,
            ..Settings::default()
        };
        assert!(s.apply_settings(bad).is_err());
        assert_eq!(s.world.settings.spawn_rate, 0.0);
    }

    #[test]
    fn test_input_routing() {
        let mut s = session();
        s.pointer_move(Vec2::new(10.0, 20.0));
        s.key_down("ArrowUp");
        assert_eq!(s.world.input.pointer, Vec2::new(10.0, 20.0));
        assert!(s.world.input.keys.any());
        s.key_up("ArrowUp");
        assert!(!s.world.input.keys.any());
        s.click(Vec2::new(300.0, 300.0));
        assert_eq!(s.world.live_enemy_count(), 3);
    }
}
