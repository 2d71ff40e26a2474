use gfx_hal::{
    adapter::{Adapter, Gpu},
    prelude::*,
    queue::QueueGroup,
    Backend, Features,
};
use log::{debug, info, warn};
use std::mem::ManuallyDrop;
use std::ptr;

use crate::back;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::window::Window;

type B = back::Backend;

/// Driver state bound to one window: instance, presentation surface,
/// the chosen adapter and an opened device with a single graphics queue.
pub struct Context {
    pub device: <B as Backend>::Device,
    pub queue_group: QueueGroup<B>,
    pub adapter: Adapter<B>,
    pub surface: ManuallyDrop<<B as Backend>::Surface>,
    instance: back::Instance,
}

impl Context {
    /// Resolves the driver against `window`. Must run after the window
    /// exists and before any other graphics call.
    pub fn new(window: &Window, config: &AppConfig) -> AppResult<Self> {
        let instance = back::Instance::create(config.app_name, config.api_version.encode())
            .map_err(|_| AppError::DriverLoad("graphics backend is not available".into()))?;

        let surface = unsafe { instance.create_surface(&window.window) }
            .map_err(|e| AppError::DriverLoad(format!("cannot create surface: {:?}", e)))?;

        let (adapter, mut gpu) = match Self::open_device(&instance, &surface) {
            Ok(opened) => opened,
            Err(err) => {
                unsafe { instance.destroy_surface(surface) };
                return Err(err);
            }
        };

        let queue_group = match gpu.queue_groups.pop() {
            Some(group) => group,
            None => {
                drop(gpu);
                unsafe { instance.destroy_surface(surface) };
                return Err(AppError::DriverLoad("device exposes no queue".into()));
            }
        };

        info!(
            "using adapter {} (api {}.{}, core features only)",
            adapter.info.name, config.api_version.major, config.api_version.minor
        );

        Ok(Context {
            device: gpu.device,
            queue_group,
            adapter,
            surface: ManuallyDrop::new(surface),
            instance,
        })
    }

    fn open_device(
        instance: &back::Instance,
        surface: &<B as Backend>::Surface,
    ) -> AppResult<(Adapter<B>, Gpu<B>)> {
        for adapter in instance.enumerate_adapters() {
            let family = adapter.queue_families.iter().find(|family| {
                surface.supports_queue_family(family) && family.queue_type().supports_graphics()
            });
            let family = match family {
                Some(family) => family,
                None => {
                    debug!("skipping adapter {}: cannot present", adapter.info.name);
                    continue;
                }
            };

            let gpu = unsafe {
                adapter
                    .physical_device
                    .open(&[(family, &[1.0])], Features::empty())
            }
            .map_err(|e| {
                AppError::DriverLoad(format!(
                    "cannot open device on {}: {:?}",
                    adapter.info.name, e
                ))
            })?;

            return Ok((adapter, gpu));
        }

        Err(AppError::DriverLoad(
            "no adapter can render to the window".into(),
        ))
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            warn!("device did not go idle before teardown: {:?}", e);
        }
        unsafe {
            self.instance
                .destroy_surface(ManuallyDrop::into_inner(ptr::read(&self.surface)));
        }
        info!("released graphics context");
    }
}
