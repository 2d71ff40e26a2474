use gfx_hal::{
    adapter, buffer as b, command, format as f, image as i, pass, prelude::*,
    queue::{family::QueueFamilyId, Submission},
    Backend,
};
use log::{debug, info, warn};

use std::borrow::Borrow;
use std::iter;
use std::mem::ManuallyDrop;
use std::ptr;

mod buffer;
mod frame;
mod memory;
mod pipeline;
mod shader;
mod swapchain;
mod sync;
mod vertex;

use buffer::Buffer;
use frame::{frame_plan, FrameCommand};
use memory::Memory;
use pipeline::Pipeline;
pub use shader::{ShaderSource, ShaderStage};
use swapchain::{acquire_with_retry, Swapchain};
use sync::FrameSync;
use vertex::{triangle, Vertex};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// Owns every GPU object needed to draw the triangle. Fields drop in
/// declaration order, after the device has gone idle.
pub struct Renderer<'a, B: Backend> {
    frame: usize,
    device: &'a B::Device,
    plan: [FrameCommand; 5],
    sync: FrameSync<'a, B>,
    pipeline: Pipeline<'a, B>,
    memory: Memory<'a, B>,
    render_pass: RenderPass<'a, B>,
    swapchain: Swapchain<'a, B>,
}

impl<'a, B> Renderer<'a, B>
where
    B: Backend,
{
    pub fn new(
        surface: &'a mut B::Surface,
        adapter: &'a adapter::Adapter<B>,
        device: &'a B::Device,
        family: QueueFamilyId,
        config: &AppConfig,
    ) -> AppResult<Self> {
        let memory_types = adapter.physical_device.memory_properties().memory_types;
        let limits = adapter.physical_device.limits();

        let swapchain = Swapchain::new(device, surface, adapter, config.dims)?;
        let render_pass = RenderPass::new(device, swapchain.format)?;

        let pipeline = Pipeline::<B>::new(
            device,
            &ShaderSource::vertex(),
            &ShaderSource::fragment(),
            config.triangle_color,
            &render_pass.pass,
        )?;

        let vertices = triangle();
        let vertex_buffer = Buffer::new::<Vertex>(device, vertices.len(), &limits)?;
        let memory = Memory::new(vertex_buffer, &vertices, &memory_types)?;
        info!("uploaded triangle geometry ({} vertices)", vertices.len());

        let sync = FrameSync::new(device, family, config.frames_in_flight)?;

        Ok(Renderer {
            frame: 0,
            device,
            plan: frame_plan(config.clear_color),
            sync,
            pipeline,
            memory,
            render_pass,
            swapchain,
        })
    }

    /// Records and presents one frame.
    pub fn render(&mut self, queue: &mut B::CommandQueue) -> AppResult<()> {
        let (surface_image, _) = acquire_with_retry(
            &mut self.swapchain,
            |swapchain: &mut Swapchain<'a, B>| unsafe { swapchain.surface.acquire_image(!0) },
            Swapchain::recreate,
        )?;

        let frame_idx = self.frame % self.sync.frames_in_flight();
        self.sync.acquire_slot(frame_idx)?;

        let framebuffer = unsafe {
            self.device.create_framebuffer(
                &self.render_pass.pass,
                iter::once(surface_image.borrow()),
                self.swapchain.framebuffer_extent(),
            )
        }
        .map_err(|e| AppError::Device(format!("cannot create framebuffer: {:?}", e)))?;

        let mut surface_image = Some(surface_image);
        let mut presented = Ok(None);
        let cmd_buffer = &mut self.sync.command_buffers[frame_idx];
        unsafe {
            cmd_buffer.reset(false);
            cmd_buffer.begin_primary(command::CommandBufferFlags::ONE_TIME_SUBMIT);
            cmd_buffer.set_viewports(0, &[self.swapchain.viewport.clone()]);
            cmd_buffer.set_scissors(0, &[self.swapchain.viewport.rect]);

            for step in self.plan.iter() {
                match *step {
                    FrameCommand::Clear(color) => cmd_buffer.begin_render_pass(
                        &self.render_pass.pass,
                        &framebuffer,
                        self.swapchain.viewport.rect,
                        &[command::ClearValue {
                            color: command::ClearColor { float32: color },
                        }],
                        command::SubpassContents::Inline,
                    ),
                    FrameCommand::BindProgram => {
                        cmd_buffer.bind_graphics_pipeline(&self.pipeline.pipeline)
                    }
                    FrameCommand::BindGeometry => cmd_buffer.bind_vertex_buffers(
                        vertex::BINDING,
                        iter::once((&*self.memory.buffer.buf, b::SubRange::WHOLE)),
                    ),
                    FrameCommand::Draw { first, count } => {
                        cmd_buffer.draw(first..first + count, 0..1)
                    }
                    FrameCommand::Present => {
                        cmd_buffer.end_render_pass();
                        cmd_buffer.finish();

                        let submission = Submission {
                            command_buffers: iter::once(&*cmd_buffer),
                            wait_semaphores: None,
                            signal_semaphores: iter::once(
                                &self.sync.submission_complete_semaphores[frame_idx],
                            ),
                        };
                        queue.submit(
                            submission,
                            Some(&self.sync.submission_complete_fences[frame_idx]),
                        );

                        if let Some(image) = surface_image.take() {
                            presented = queue.present_surface(
                                &mut *self.swapchain.surface,
                                image,
                                Some(&self.sync.submission_complete_semaphores[frame_idx]),
                            );
                        }
                    }
                }
            }
        }

        self.sync.retire_framebuffer(frame_idx, framebuffer);
        self.frame += 1;

        match presented {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("cannot present frame: {:?}", e);
                self.swapchain.recreate()
            }
        }
    }
}

impl<'a, B: Backend> Drop for Renderer<'a, B> {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            warn!("device did not go idle before releasing resources: {:?}", e);
        }
        info!("releasing renderer after {} frames", self.frame);
    }
}

/// Single-subpass pass that clears the swapchain image and leaves it ready
/// for presentation.
struct RenderPass<'a, B: Backend> {
    device: &'a B::Device,
    pass: ManuallyDrop<B::RenderPass>,
}

impl<'a, B: Backend> RenderPass<'a, B> {
    fn new(device: &'a B::Device, format: f::Format) -> AppResult<Self> {
        let attachment = pass::Attachment {
            format: Some(format),
            samples: 1,
            ops: pass::AttachmentOps::new(
                pass::AttachmentLoadOp::Clear,
                pass::AttachmentStoreOp::Store,
            ),
            stencil_ops: pass::AttachmentOps::DONT_CARE,
            layouts: i::Layout::Undefined..i::Layout::Present,
        };

        let subpass = pass::SubpassDesc {
            colors: &[(0, i::Layout::ColorAttachmentOptimal)],
            depth_stencil: None,
            inputs: &[],
            resolves: &[],
            preserves: &[],
        };

        let render_pass = unsafe { device.create_render_pass(&[attachment], &[subpass], &[]) }
            .map_err(|e| AppError::Device(format!("cannot create render pass: {:?}", e)))?;
        debug!("created render pass");

        Ok(RenderPass {
            device,
            pass: ManuallyDrop::new(render_pass),
        })
    }
}

impl<'a, B: Backend> Drop for RenderPass<'a, B> {
    fn drop(&mut self) {
        unsafe {
            self.device
                .destroy_render_pass(ManuallyDrop::into_inner(ptr::read(&self.pass)));
        }
    }
}
