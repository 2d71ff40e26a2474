#[cfg(feature = "metal")]
use gfx_backend_metal as back;

#[cfg(feature = "vulkan")]
use gfx_backend_vulkan as back;

mod app;
mod config;
mod context;
mod error;
mod render_loop;
mod renderer;
mod window;

use config::AppConfig;
use log::error;
use std::process;

fn main() {
    env_logger::init();

    let config = AppConfig::default();
    if let Err(err) = app::run(&config) {
        if let Some(line) = err.diagnostic() {
            println!("{}", line);
        }
        error!("{}", err);
        process::exit(err.exit_code());
    }
}
