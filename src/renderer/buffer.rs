use gfx_hal::{buffer, prelude::*, Backend, Limits};
use log::debug;
use std::mem::{self, ManuallyDrop};
use std::ptr;

use crate::error::{AppError, AppResult};

/// Vertex buffer sized for `count` elements of `T`, rounded up to the
/// device's non-coherent atom so the whole range can be flushed.
pub struct Buffer<'a, B: Backend> {
    pub device: &'a B::Device,
    pub buf: ManuallyDrop<B::Buffer>,
    pub len: u64,
}

impl<'a, B: Backend> Buffer<'a, B> {
    pub fn new<T>(device: &'a B::Device, count: usize, limits: &Limits) -> AppResult<Self> {
        let buffer_len = count as u64 * mem::size_of::<T>() as u64;
        if buffer_len == 0 {
            return Err(AppError::GeometryUpload("vertex data is empty".into()));
        }
        let memory_size = padded_size(buffer_len, limits.non_coherent_atom_size as u64);

        let buf = unsafe { device.create_buffer(memory_size, buffer::Usage::VERTEX) }
            .map_err(|e| AppError::GeometryUpload(format!("cannot create buffer: {:?}", e)))?;
        debug!("created vertex buffer: {} bytes ({} padded)", buffer_len, memory_size);

        Ok(Buffer {
            device,
            buf: ManuallyDrop::new(buf),
            len: buffer_len,
        })
    }
}

fn padded_size(len: u64, alignment: u64) -> u64 {
    if alignment <= 1 {
        return len;
    }
    ((len + alignment - 1) / alignment) * alignment
}

impl<'a, B: Backend> Drop for Buffer<'a, B> {
    fn drop(&mut self) {
        unsafe {
            self.device
                .destroy_buffer(ManuallyDrop::into_inner(ptr::read(&self.buf)))
        }
        debug!("released vertex buffer");
    }
}
