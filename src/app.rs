use log::info;

use crate::config::AppConfig;
use crate::context::Context;
use crate::error::AppResult;
use crate::render_loop::{LoopState, RenderLoop};
use crate::renderer::Renderer;
use crate::window::Window;

/// Sets everything up, draws until the window is closed and tears down.
/// Resources are released in reverse order of acquisition on every path.
pub fn run(config: &AppConfig) -> AppResult<()> {
    run_with(config, Window::new, Context::new)
}

/// The driver is only touched once a window exists; a window failure
/// returns before `open_context` is called.
pub fn run_with<W, C>(config: &AppConfig, open_window: W, open_context: C) -> AppResult<()>
where
    W: FnOnce(&AppConfig) -> AppResult<Window>,
    C: FnOnce(&Window, &AppConfig) -> AppResult<Context>,
{
    let mut window = open_window(config)?;
    let mut context = open_context(&window, config)?;

    {
        let Context {
            device,
            queue_group,
            adapter,
            surface,
            ..
        } = &mut context;
        let queue = &mut queue_group.queues[0];

        let mut renderer = Renderer::new(
            &mut **surface,
            adapter,
            device,
            queue_group.family,
            config,
        )?;

        let mut render_loop = RenderLoop::new();
        render_loop.run(&mut window, || renderer.render(queue))?;
        debug_assert_eq!(render_loop.state(), LoopState::Closing);
        info!("window closed after {} frames", render_loop.frames());
    }

    info!("shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn window_failure_never_reaches_the_driver() {
        let config = AppConfig::default();
        let mut driver_touched = false;

        let result = run_with(
            &config,
            |_| Err(AppError::WindowCreation("no display".into())),
            |_, _| {
                driver_touched = true;
                Err(AppError::DriverLoad("unreachable".into()))
            },
        );

        let err = result.unwrap_err();
        assert!(matches!(err, AppError::WindowCreation(_)));
        assert_eq!(err.exit_code(), -1);
        assert_eq!(err.diagnostic(), Some("Failed to create window"));
        assert!(!driver_touched);
    }
}
