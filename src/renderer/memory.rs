use gfx_hal::{adapter::MemoryType, memory as m, prelude::*, Backend, MemoryTypeId};
use log::debug;
use std::iter;
use std::mem::{self, ManuallyDrop};
use std::ptr;

use super::buffer::Buffer;
use crate::error::{AppError, AppResult};

/// Host-visible allocation backing a vertex buffer. The contents are
/// written once at creation and never touched again.
pub struct Memory<'a, B: Backend> {
    pub buffer: ManuallyDrop<Buffer<'a, B>>,
    memory: ManuallyDrop<B::Memory>,
}

impl<'a, B: Backend> Memory<'a, B> {
    pub fn new<T: Copy>(
        mut buffer: Buffer<'a, B>,
        content: &[T],
        memory_types: &[MemoryType],
    ) -> AppResult<Self> {
        let memory = Self::upload(&mut buffer, content, memory_types)?;
        Ok(Memory {
            buffer: ManuallyDrop::new(buffer),
            memory: ManuallyDrop::new(memory),
        })
    }

    fn upload<T: Copy>(
        buffer: &mut Buffer<'a, B>,
        content: &[T],
        memory_types: &[MemoryType],
    ) -> AppResult<B::Memory> {
        let byte_len = mem::size_of_val(content);
        if byte_len as u64 != buffer.len {
            return Err(AppError::GeometryUpload(format!(
                "buffer holds {} bytes but {} were supplied",
                buffer.len, byte_len
            )));
        }

        let device = buffer.device;
        unsafe {
            let buffer_req = device.get_buffer_requirements(&buffer.buf);
            let upload_type = upload_type(memory_types, &buffer_req).ok_or_else(|| {
                AppError::GeometryUpload("no host-visible memory type".into())
            })?;
            let memory = device
                .allocate_memory(upload_type, buffer_req.size)
                .map_err(|e| AppError::GeometryUpload(format!("allocation failed: {:?}", e)))?;

            if let Err(err) = Self::fill(device, &memory, &mut buffer.buf, content) {
                device.free_memory(memory);
                return Err(err);
            }

            debug!("uploaded {} bytes of vertex data", byte_len);
            Ok(memory)
        }
    }

    unsafe fn fill<T: Copy>(
        device: &B::Device,
        memory: &B::Memory,
        buf: &mut B::Buffer,
        content: &[T],
    ) -> AppResult<()> {
        device
            .bind_buffer_memory(memory, 0, buf)
            .map_err(|e| AppError::GeometryUpload(format!("bind failed: {:?}", e)))?;
        let mapping = device
            .map_memory(memory, m::Segment::ALL)
            .map_err(|e| AppError::GeometryUpload(format!("map failed: {:?}", e)))?;
        ptr::copy_nonoverlapping(
            content.as_ptr() as *const u8,
            mapping,
            mem::size_of_val(content),
        );
        let flushed = device.flush_mapped_memory_ranges(iter::once((memory, m::Segment::ALL)));
        device.unmap_memory(memory);
        flushed.map_err(|e| AppError::GeometryUpload(format!("flush failed: {:?}", e)))
    }
}

fn upload_type(properties: &[MemoryType], buffer_req: &m::Requirements) -> Option<MemoryTypeId> {
    properties
        .iter()
        .enumerate()
        .position(|(id, mem_type)| {
            buffer_req.type_mask & (1 << id) != 0
                && mem_type.properties.contains(m::Properties::CPU_VISIBLE)
        })
        .map(MemoryTypeId::from)
}

impl<'a, B: Backend> Drop for Memory<'a, B> {
    fn drop(&mut self) {
        unsafe {
            ManuallyDrop::drop(&mut self.buffer);
            self.buffer
                .device
                .free_memory(ManuallyDrop::into_inner(ptr::read(&self.memory)))
        }
        debug!("released vertex memory");
    }
}
