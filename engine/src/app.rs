use std::error::Error;
use std::time::{Duration, Instant};

use log::{debug, error, warn};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, VirtualKeyCode, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use crate::graphics::Renderer2d;
use crate::pixels_renderer::PixelsRenderer2d;
use crate::surface::{Surface, SurfaceSize};
use crate::ticker::FixedTicker;

pub struct AppConfig {
    pub title: String,
    /// Logical frame buffer size; the window is `surface_size * window_scale`.
    pub surface_size: SurfaceSize,
    pub window_scale: u32,
    pub tick_interval: Duration,
    pub vsync: bool,
}

pub struct AppContext {
    pub window: Window,
}

/// A game driven by keyboard events and a fixed-interval timer.
pub trait GameApp {
    type State;
    type Action;

    fn init_state(&mut self, ctx: &mut AppContext) -> Self::State;

    fn map_key(&self, key: VirtualKeyCode) -> Option<Self::Action>;

    fn handle_action(&mut self, state: &mut Self::State, action: Self::Action, ctx: &mut AppContext);

    fn tick(&mut self, state: &mut Self::State, ctx: &mut AppContext);

    fn render(&self, state: &Self::State, gfx: &mut dyn Renderer2d);

    fn on_exit(&mut self, _state: &Self::State) {}
}

pub fn run_game<G>(config: AppConfig, mut game: G) -> Result<(), Box<dyn Error>>
where
    G: GameApp + 'static,
    G::State: 'static,
{
    let event_loop = EventLoop::new();
    let scale = config.window_scale.max(1);
    let window = WindowBuilder::new()
        .with_title(config.title)
        .with_inner_size(PhysicalSize::new(
            config.surface_size.width.saturating_mul(scale),
            config.surface_size.height.saturating_mul(scale),
        ))
        .with_resizable(false)
        .build(&event_loop)?;

    let mut renderer = PixelsRenderer2d::new(&window, config.surface_size, config.vsync)?;
    let mut ctx = AppContext { window };
    let mut state = game.init_state(&mut ctx);
    let mut ticker = FixedTicker::new(config.tick_interval);
    let mut last_frame = Instant::now();

    event_loop.run(move |event, _, control_flow| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::CloseRequested => {
                game.on_exit(&state);
                *control_flow = ControlFlow::Exit;
            }
            WindowEvent::Resized(size) => {
                if let Err(err) = renderer.resize_window(size.width, size.height) {
                    warn!("resize failed: {err}");
                }
                ctx.window.request_redraw();
            }
            WindowEvent::KeyboardInput { input, .. } => {
                if input.state != ElementState::Pressed {
                    return;
                }
                let Some(key) = input.virtual_keycode else {
                    return;
                };
                if key == VirtualKeyCode::Escape {
                    game.on_exit(&state);
                    *control_flow = ControlFlow::Exit;
                    return;
                }
                if let Some(action) = game.map_key(key) {
                    game.handle_action(&mut state, action, &mut ctx);
                    ctx.window.request_redraw();
                }
            }
            _ => {}
        },
        Event::MainEventsCleared => {
            let now = Instant::now();
            let dt = now.saturating_duration_since(last_frame);
            last_frame = now;

            let due = ticker.advance(dt);
            if due > 1 {
                debug!("event loop fell behind; running {due} ticks");
            }
            for _ in 0..due {
                game.tick(&mut state, &mut ctx);
            }
            if due > 0 {
                ctx.window.request_redraw();
            }

            if *control_flow != ControlFlow::Exit {
                *control_flow = ControlFlow::WaitUntil(now + ticker.until_next());
            }
        }
        Event::RedrawRequested(_) => {
            renderer.draw_frame(|gfx| game.render(&state, gfx));
            if let Err(err) = renderer.present() {
                error!("present failed: {err}");
                *control_flow = ControlFlow::Exit;
            }
        }
        _ => {}
    });
}
