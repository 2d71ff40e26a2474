use gfx_hal::{adapter::Adapter, format as f, image as i, prelude::*, pso, window, Backend};
use log::{debug, warn};
use std::fmt;

use crate::error::{AppError, AppResult};

pub struct Swapchain<'a, B: Backend> {
    device: &'a B::Device,
    adapter: &'a Adapter<B>,
    pub viewport: pso::Viewport,
    /// Size asked of the surface on every configure.
    pub dims: window::Extent2D,
    /// Size the surface actually granted; framebuffers must match it.
    pub extent: window::Extent2D,
    pub surface: &'a mut B::Surface,
    pub format: f::Format,
}

impl<'a, B: Backend> Swapchain<'a, B> {
    pub fn new(
        device: &'a B::Device,
        surface: &'a mut B::Surface,
        adapter: &'a Adapter<B>,
        dims: window::Extent2D,
    ) -> AppResult<Self> {
        let formats = surface.supported_formats(&adapter.physical_device);
        let format = pick_format(formats.as_deref());

        let mut swapchain = Swapchain {
            device,
            surface,
            adapter,
            viewport: viewport_for(dims),
            format,
            dims,
            extent: dims,
        };

        swapchain.configure()?;
        debug!("swapchain configured with {:?}", format);
        Ok(swapchain)
    }

    pub fn recreate(&mut self) -> AppResult<()> {
        warn!("surface out of date, reconfiguring swapchain");
        self.configure()
    }

    pub fn framebuffer_extent(&self) -> i::Extent {
        framebuffer_extent(self.extent)
    }

    fn configure(&mut self) -> AppResult<()> {
        let caps = self.surface.capabilities(&self.adapter.physical_device);

        let mut swap_config = window::SwapchainConfig::from_caps(&caps, self.format, self.dims);
        swap_config.present_mode = window::PresentMode::FIFO;
        let extent = swap_config.extent;
        unsafe {
            self.surface
                .configure_swapchain(&self.device, swap_config)
                .map_err(|e| AppError::Device(format!("cannot configure swapchain: {:?}", e)))?;
        }

        if extent != self.dims {
            debug!(
                "surface granted {}x{} instead of {}x{}",
                extent.width, extent.height, self.dims.width, self.dims.height
            );
        }
        self.extent = extent;
        self.viewport = viewport_for(extent);
        Ok(())
    }
}

impl<'a, B: Backend> Drop for Swapchain<'a, B> {
    fn drop(&mut self) {
        unsafe { self.surface.unconfigure_swapchain(&self.device) }
    }
}

/// Prefers an sRGB format, then whatever the surface lists first.
fn pick_format(formats: Option<&[f::Format]>) -> f::Format {
    formats
        .and_then(|formats| {
            formats
                .iter()
                .find(|format| format.base_format().1 == f::ChannelType::Srgb)
                .or_else(|| formats.first())
                .copied()
        })
        .unwrap_or(f::Format::Rgba8Srgb)
}

fn viewport_for(extent: window::Extent2D) -> pso::Viewport {
    pso::Viewport {
        rect: pso::Rect {
            x: 0,
            y: 0,
            w: extent.width as _,
            h: extent.height as _,
        },
        depth: 0.0..1.0,
    }
}

fn framebuffer_extent(extent: window::Extent2D) -> i::Extent {
    i::Extent {
        width: extent.width,
        height: extent.height,
        depth: 1,
    }
}

/// Acquires the next image, reconfiguring once if the surface went stale.
/// A second failure is fatal, so every successful call yields an image to
/// draw into.
pub fn acquire_with_retry<S, T, E, A, R>(
    target: &mut S,
    mut acquire: A,
    mut recreate: R,
) -> AppResult<T>
where
    E: fmt::Debug,
    A: FnMut(&mut S) -> Result<T, E>,
    R: FnMut(&mut S) -> AppResult<()>,
{
    match acquire(target) {
        Ok(image) => Ok(image),
        Err(e) => {
            warn!("cannot acquire swapchain image: {:?}", e);
            recreate(target)?;
            acquire(target).map_err(|e| {
                AppError::Device(format!(
                    "cannot acquire swapchain image after reconfiguring: {:?}",
                    e
                ))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::frame::{frame_plan, FrameCommand};

    struct StaleSurface {
        stale_acquires: u32,
        acquires: u32,
        recreates: u32,
    }

    impl StaleSurface {
        fn new(stale_acquires: u32) -> Self {
            StaleSurface {
                stale_acquires,
                acquires: 0,
                recreates: 0,
            }
        }

        fn acquire(&mut self) -> Result<u32, &'static str> {
            self.acquires += 1;
            if self.acquires <= self.stale_acquires {
                Err("out of date")
            } else {
                Ok(self.acquires)
            }
        }

        fn recreate(&mut self) -> AppResult<()> {
            self.recreates += 1;
            Ok(())
        }
    }

    fn acquire(surface: &mut StaleSurface) -> AppResult<u32> {
        acquire_with_retry(surface, StaleSurface::acquire, StaleSurface::recreate)
    }

    #[test]
    fn fresh_surface_is_not_reconfigured() {
        let mut surface = StaleSurface::new(0);
        assert_eq!(acquire(&mut surface).unwrap(), 1);
        assert_eq!(surface.recreates, 0);
    }

    #[test]
    fn stale_surface_still_yields_a_full_frame() {
        let mut surface = StaleSurface::new(1);
        let image = acquire(&mut surface).unwrap();
        assert_eq!(image, 2);
        assert_eq!(surface.recreates, 1);

        let plan = frame_plan([0.07, 0.13, 0.17, 1.0]);
        let draws = plan
            .iter()
            .filter(|c| matches!(c, FrameCommand::Draw { .. }))
            .count();
        let presents = plan
            .iter()
            .filter(|c| **c == FrameCommand::Present)
            .count();
        assert_eq!((draws, presents), (1, 1));
    }

    #[test]
    fn second_failure_is_a_device_error() {
        let mut surface = StaleSurface::new(2);
        assert!(matches!(acquire(&mut surface), Err(AppError::Device(_))));
        assert_eq!(surface.recreates, 1);
        assert_eq!(surface.acquires, 2);
    }

    #[test]
    fn reconfigure_failure_is_returned() {
        let mut surface = StaleSurface::new(1);
        let result = acquire_with_retry(
            &mut surface,
            StaleSurface::acquire,
            |_: &mut StaleSurface| Err(AppError::Device("swapchain lost".into())),
        );
        assert!(matches!(result, Err(AppError::Device(_))));
        assert_eq!(surface.acquires, 1);
    }

    #[test]
    fn format_prefers_srgb() {
        let formats = [f::Format::Bgra8Unorm, f::Format::Bgra8Srgb];
        assert_eq!(pick_format(Some(&formats[..])), f::Format::Bgra8Srgb);
    }

    #[test]
    fn format_falls_back_to_first_listed() {
        let formats = [f::Format::Bgra8Unorm, f::Format::Rgba8Unorm];
        assert_eq!(pick_format(Some(&formats[..])), f::Format::Bgra8Unorm);
    }

    #[test]
    fn empty_or_missing_format_list_uses_default() {
        assert_eq!(pick_format(Some(&[][..])), f::Format::Rgba8Srgb);
        assert_eq!(pick_format(None), f::Format::Rgba8Srgb);
    }

    #[test]
    fn framebuffer_follows_granted_extent() {
        let granted = window::Extent2D {
            width: 1280,
            height: 1000,
        };
        let viewport = viewport_for(granted);
        let framebuffer = framebuffer_extent(granted);
        assert_eq!(framebuffer.width, viewport.rect.w as u32);
        assert_eq!(framebuffer.height, viewport.rect.h as u32);
        assert_eq!(framebuffer.depth, 1);
    }
}
