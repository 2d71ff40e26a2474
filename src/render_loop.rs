use log::info;
#[cfg(debug_assertions)]
use log::trace;

use crate::error::AppResult;

/// Source of window events and of the close flag.
pub trait EventPump {
    fn close_requested(&self) -> bool;
    fn poll_events(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Closing,
}

pub struct RenderLoop {
    state: LoopState,
    frames: u64,
}

impl RenderLoop {
    pub fn new() -> Self {
        RenderLoop {
            state: LoopState::Running,
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Draws one frame per iteration until the close flag is observed.
    /// The close flag is the only way out besides a frame error, which also
    /// moves the loop to `Closing`.
    pub fn run<E, F>(&mut self, events: &mut E, mut frame: F) -> AppResult<u64>
    where
        E: EventPump,
        F: FnMut() -> AppResult<()>,
    {
        #[cfg(debug_assertions)]
        let mut fps_counter = fps_counter::FPSCounter::new();

        info!("entering render loop");
        while self.state == LoopState::Running {
            if events.close_requested() {
                self.state = LoopState::Closing;
                break;
            }

            if let Err(err) = frame() {
                self.state = LoopState::Closing;
                return Err(err);
            }
            self.frames += 1;

            #[cfg(debug_assertions)]
            trace!("frame {}: {} fps", self.frames, fps_counter.tick());

            events.poll_events();
        }

        Ok(self.frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    struct ScriptedEvents {
        polls: u32,
        close_after: u32,
    }

    impl EventPump for ScriptedEvents {
        fn close_requested(&self) -> bool {
            self.polls >= self.close_after
        }

        fn poll_events(&mut self) {
            self.polls += 1;
        }
    }

    #[test]
    fn draws_one_frame_per_iteration_until_closed() {
        let mut events = ScriptedEvents {
            polls: 0,
            close_after: 5,
        };
        let mut drawn = 0;
        let mut render_loop = RenderLoop::new();

        let frames = render_loop
            .run(&mut events, || {
                drawn += 1;
                Ok(())
            })
            .unwrap();

        assert_eq!(frames, 5);
        assert_eq!(drawn, 5);
        assert_eq!(events.polls, 5);
        assert_eq!(render_loop.state(), LoopState::Closing);
    }

    #[test]
    fn closed_window_draws_nothing() {
        let mut events = ScriptedEvents {
            polls: 0,
            close_after: 0,
        };
        let mut render_loop = RenderLoop::new();

        let frames = render_loop
            .run(&mut events, || panic!("frame drawn after close"))
            .unwrap();

        assert_eq!(frames, 0);
        assert_eq!(events.polls, 0);
        assert_eq!(render_loop.state(), LoopState::Closing);
    }

    #[test]
    fn keeps_running_while_close_flag_is_clear() {
        let mut events = ScriptedEvents {
            polls: 0,
            close_after: 1000,
        };
        let mut render_loop = RenderLoop::new();

        render_loop.run(&mut events, || Ok(())).unwrap();

        assert_eq!(render_loop.frames(), 1000);
    }

    #[test]
    fn frame_error_closes_the_loop() {
        let mut events = ScriptedEvents {
            polls: 0,
            close_after: 10,
        };
        let mut render_loop = RenderLoop::new();
        let mut drawn = 0;

        let result = render_loop.run(&mut events, || {
            drawn += 1;
            if drawn == 3 {
                Err(AppError::Device("device lost".into()))
            } else {
                Ok(())
            }
        });

        assert!(matches!(result, Err(AppError::Device(_))));
        assert_eq!(render_loop.frames(), 2);
        assert_eq!(render_loop.state(), LoopState::Closing);
    }
}
