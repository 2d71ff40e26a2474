use log::{debug, info};
use winit::dpi::{PhysicalSize, Size};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::platform::desktop::EventLoopExtDesktop;
use winit::window::WindowBuilder;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::render_loop::EventPump;

/// OS window plus the event loop that feeds it.
pub struct Window {
    // dropped before the event loop
    pub window: winit::window::Window,
    event_loop: EventLoop<()>,
    close_requested: bool,
}

impl Window {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let event_loop = EventLoop::new();
        let window = WindowBuilder::new()
            .with_title(config.title)
            .with_inner_size(Size::Physical(PhysicalSize::new(
                config.dims.width,
                config.dims.height,
            )))
            .with_resizable(false)
            .build(&event_loop)
            .map_err(|e| AppError::WindowCreation(e.to_string()))?;

        info!(
            "created window \"{}\" ({}x{})",
            config.title, config.dims.width, config.dims.height
        );

        Ok(Window {
            window,
            event_loop,
            close_requested: false,
        })
    }
}

impl EventPump for Window {
    fn close_requested(&self) -> bool {
        self.close_requested
    }

    fn poll_events(&mut self) {
        let window_id = self.window.id();
        let close_requested = &mut self.close_requested;
        self.event_loop.run_return(|event, _, control_flow| {
            *control_flow = ControlFlow::Poll;
            match event {
                Event::WindowEvent {
                    window_id: id,
                    event: WindowEvent::CloseRequested,
                } if id == window_id => {
                    debug!("close requested");
                    *close_requested = true;
                }
                Event::MainEventsCleared => *control_flow = ControlFlow::Exit,
                _ => {}
            }
        });
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        info!("destroying window");
    }
}
