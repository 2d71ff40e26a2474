use gfx_hal::{pass::Subpass, prelude::*, pso, Backend};
use log::{debug, info};
use std::iter;
use std::mem::ManuallyDrop;
use std::ops::Range;
use std::ptr;

use super::shader::{color_specialization, ShaderSource};
use super::vertex::Vertex;
use crate::error::{AppError, AppResult};

const ENTRY_NAME: &str = "main";

/// The linked shader program: both stages baked into one graphics pipeline.
pub struct Pipeline<'a, B: Backend> {
    device: &'a B::Device,
    pub pipeline: ManuallyDrop<B::GraphicsPipeline>,
    pub pipeline_layout: ManuallyDrop<B::PipelineLayout>,
}

impl<'a, B: Backend> Pipeline<'a, B> {
    pub fn new(
        device: &'a B::Device,
        vertex: &ShaderSource,
        fragment: &ShaderSource,
        color: [f32; 4],
        render_pass: &B::RenderPass,
    ) -> AppResult<Self> {
        let vs_spirv = vertex.compile()?;
        let fs_spirv = fragment.compile()?;

        let vs_module = Self::create_module(device, vertex, &vs_spirv)?;
        let fs_module = match Self::create_module(device, fragment, &fs_spirv) {
            Ok(module) => module,
            Err(err) => {
                unsafe { device.destroy_shader_module(vs_module) };
                return Err(err);
            }
        };
        debug!("compiled vertex and fragment stages");

        let linked = Self::link(device, &vs_module, &fs_module, color, render_pass);

        // stages are no longer needed once linked, whatever the outcome
        unsafe {
            device.destroy_shader_module(vs_module);
            device.destroy_shader_module(fs_module);
        }

        let (pipeline, pipeline_layout) = linked?;
        info!("linked shader program");

        Ok(Pipeline {
            device,
            pipeline: ManuallyDrop::new(pipeline),
            pipeline_layout: ManuallyDrop::new(pipeline_layout),
        })
    }

    fn create_module(
        device: &B::Device,
        source: &ShaderSource,
        spirv: &[u32],
    ) -> AppResult<B::ShaderModule> {
        unsafe { device.create_shader_module(spirv) }
            .map_err(|e| source.compile_error(format!("{:?}", e)))
    }

    fn link(
        device: &B::Device,
        vs_module: &B::ShaderModule,
        fs_module: &B::ShaderModule,
        color: [f32; 4],
        render_pass: &B::RenderPass,
    ) -> AppResult<(B::GraphicsPipeline, B::PipelineLayout)> {
        let pipeline_layout = unsafe {
            device.create_pipeline_layout(
                iter::empty::<B::DescriptorSetLayout>(),
                iter::empty::<(pso::ShaderStageFlags, Range<u32>)>(),
            )
        }
        .map_err(|e| AppError::ShaderLink(format!("cannot create pipeline layout: {:?}", e)))?;

        let shader_entries = pso::GraphicsShaderSet {
            vertex: pso::EntryPoint {
                entry: ENTRY_NAME,
                module: vs_module,
                specialization: pso::Specialization::default(),
            },
            hull: None,
            domain: None,
            geometry: None,
            fragment: Some(pso::EntryPoint {
                entry: ENTRY_NAME,
                module: fs_module,
                specialization: color_specialization(color),
            }),
        };

        let subpass = Subpass {
            index: 0,
            main_pass: render_pass,
        };

        let mut pipeline_desc = pso::GraphicsPipelineDesc::new(
            shader_entries,
            pso::Primitive::TriangleList,
            pso::Rasterizer::FILL,
            &pipeline_layout,
            subpass,
        );
        pipeline_desc.blender.targets.push(pso::ColorBlendDesc {
            mask: pso::ColorMask::ALL,
            blend: None,
        });
        pipeline_desc.vertex_buffers.push(Vertex::buffer_desc());
        pipeline_desc.attributes.extend_from_slice(&Vertex::attributes());

        let pipeline = unsafe { device.create_graphics_pipeline(&pipeline_desc, None) };
        drop(pipeline_desc);

        match pipeline {
            Ok(pipeline) => Ok((pipeline, pipeline_layout)),
            Err(e) => {
                unsafe { device.destroy_pipeline_layout(pipeline_layout) };
                Err(AppError::ShaderLink(format!("{:?}", e)))
            }
        }
    }
}

impl<'a, B: Backend> Drop for Pipeline<'a, B> {
    fn drop(&mut self) {
        unsafe {
            self.device
                .destroy_graphics_pipeline(ManuallyDrop::into_inner(ptr::read(&self.pipeline)));
            self.device
                .destroy_pipeline_layout(ManuallyDrop::into_inner(ptr::read(
                    &self.pipeline_layout,
                )));
        }
        debug!("released shader program");
    }
}
