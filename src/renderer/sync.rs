use gfx_hal::{command, pool, prelude::*, queue::family::QueueFamilyId, Backend};
use log::debug;
use std::mem::ManuallyDrop;
use std::ptr;

use crate::error::{AppError, AppResult};

/// Per-slot command buffers, fences and semaphores for frames in flight.
/// A slot's framebuffer lives until that slot's fence has signalled again.
pub struct FrameSync<'a, B: Backend> {
    device: &'a B::Device,
    command_pool: ManuallyDrop<B::CommandPool>,
    pub command_buffers: Vec<B::CommandBuffer>,
    pub submission_complete_semaphores: Vec<B::Semaphore>,
    pub submission_complete_fences: Vec<B::Fence>,
    framebuffers: Vec<Option<B::Framebuffer>>,
}

impl<'a, B: Backend> FrameSync<'a, B> {
    pub fn new(
        device: &'a B::Device,
        family: QueueFamilyId,
        frames_in_flight: usize,
    ) -> AppResult<Self> {
        let command_pool = unsafe {
            device.create_command_pool(family, pool::CommandPoolCreateFlags::RESET_INDIVIDUAL)
        }
        .map_err(|e| AppError::Device(format!("cannot create command pool: {:?}", e)))?;

        let mut sync: FrameSync<'a, B> = FrameSync {
            device,
            command_pool: ManuallyDrop::new(command_pool),
            command_buffers: Vec::with_capacity(frames_in_flight),
            submission_complete_semaphores: Vec::with_capacity(frames_in_flight),
            submission_complete_fences: Vec::with_capacity(frames_in_flight),
            framebuffers: Vec::with_capacity(frames_in_flight),
        };

        for _ in 0..frames_in_flight {
            sync.command_buffers
                .push(unsafe { sync.command_pool.allocate_one(command::Level::Primary) });
            sync.submission_complete_semaphores.push(
                device
                    .create_semaphore()
                    .map_err(|e| AppError::Device(format!("cannot create semaphore: {:?}", e)))?,
            );
            sync.submission_complete_fences.push(
                device
                    .create_fence(true)
                    .map_err(|e| AppError::Device(format!("cannot create fence: {:?}", e)))?,
            );
            sync.framebuffers.push(None);
        }
        debug!("prepared {} frames in flight", frames_in_flight);

        Ok(sync)
    }

    pub fn frames_in_flight(&self) -> usize {
        self.command_buffers.len()
    }

    /// Blocks until slot `idx` is free again and drops its old framebuffer.
    pub fn acquire_slot(&mut self, idx: usize) -> AppResult<()> {
        let fence = &self.submission_complete_fences[idx];
        unsafe {
            self.device
                .wait_for_fence(fence, !0)
                .map_err(|e| AppError::Device(format!("cannot wait for fence: {:?}", e)))?;
            self.device
                .reset_fence(fence)
                .map_err(|e| AppError::Device(format!("cannot reset fence: {:?}", e)))?;
            if let Some(framebuffer) = self.framebuffers[idx].take() {
                self.device.destroy_framebuffer(framebuffer);
            }
        }
        Ok(())
    }

    pub fn retire_framebuffer(&mut self, idx: usize, framebuffer: B::Framebuffer) {
        if let Some(old) = self.framebuffers[idx].replace(framebuffer) {
            unsafe { self.device.destroy_framebuffer(old) };
        }
    }
}

impl<'a, B: Backend> Drop for FrameSync<'a, B> {
    fn drop(&mut self) {
        unsafe {
            for framebuffer in self.framebuffers.drain(..).flatten() {
                self.device.destroy_framebuffer(framebuffer);
            }
            self.command_pool.free(self.command_buffers.drain(..));
            self.device
                .destroy_command_pool(ManuallyDrop::into_inner(ptr::read(&self.command_pool)));
            for s in self.submission_complete_semaphores.drain(..) {
                self.device.destroy_semaphore(s);
            }
            for f in self.submission_complete_fences.drain(..) {
                self.device.destroy_fence(f);
            }
        }
        debug!("released frame resources");
    }
}
