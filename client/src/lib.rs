//! Classroom matching map: places classrooms on a wrapping Mercator map,
//! clusters them at low zoom and colors them by how well they match the
//! viewer's schedule and interests.

pub mod app;
pub mod config;
pub mod error;
pub mod map;
pub mod state;

pub use error::{Error, Result};

use app::App;
use config::MapConfig;
use map::loader::{self, Dataset};
use map::renderer::Theme;
use state::State;
use winit::event_loop::EventLoop;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Everything the viewer needs at startup
#[derive(Clone, Debug)]
pub struct AppOptions {
    pub config: MapConfig,
    pub dataset: Dataset,
    /// `None` follows the window theme
    pub theme: Option<Theme>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            config: MapConfig::default(),
            dataset: loader::demo_dataset(),
            theme: None,
        }
    }
}

/// Open the map window and run until it closes
pub fn run(options: AppOptions) -> anyhow::Result<()> {
    let event_loop = EventLoop::<State>::with_user_event().build()?;

    #[cfg(not(target_arch = "wasm32"))]
    let mut app = App::new(options);
    #[cfg(target_arch = "wasm32")]
    let mut app = App::new(options, &event_loop);

    event_loop.run_app(&mut app)?;
    Ok(())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> std::result::Result<(), wasm_bindgen::JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).unwrap_throw();
    run(AppOptions::default()).unwrap_throw();
    Ok(())
}
