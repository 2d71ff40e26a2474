use gfx_hal::pso;
use std::fmt;
use std::io::{Cursor, Read};

use crate::error::{AppError, AppResult};

pub const VERTEX_SOURCE: &str = "#version 450
layout (location = 0) in vec3 a_pos;

void main()
{
    gl_Position = vec4(a_pos.x, a_pos.y, a_pos.z, 1.0);
}
";

pub const FRAGMENT_SOURCE: &str = "#version 450
layout (constant_id = 0) const float COLOR_R = 1.0;
layout (constant_id = 1) const float COLOR_G = 1.0;
layout (constant_id = 2) const float COLOR_B = 1.0;
layout (constant_id = 3) const float COLOR_A = 1.0;

layout (location = 0) out vec4 frag_color;

void main()
{
    frag_color = vec4(COLOR_R, COLOR_G, COLOR_B, COLOR_A);
}
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

impl ShaderStage {
    fn compiler_type(self) -> glsl_to_spirv::ShaderType {
        match self {
            ShaderStage::Vertex => glsl_to_spirv::ShaderType::Vertex,
            ShaderStage::Fragment => glsl_to_spirv::ShaderType::Fragment,
        }
    }
}

/// A GLSL stage waiting to be compiled.
#[derive(Debug, Clone, Copy)]
pub struct ShaderSource {
    pub stage: ShaderStage,
    pub code: &'static str,
}

impl ShaderSource {
    pub const fn vertex() -> Self {
        ShaderSource {
            stage: ShaderStage::Vertex,
            code: VERTEX_SOURCE,
        }
    }

    pub const fn fragment() -> Self {
        ShaderSource {
            stage: ShaderStage::Fragment,
            code: FRAGMENT_SOURCE,
        }
    }

    /// Compiles to SPIR-V words. The compiler's log is kept on failure.
    pub fn compile(&self) -> AppResult<Vec<u32>> {
        let mut file =
            glsl_to_spirv::compile(self.code, self.stage.compiler_type()).map_err(|log| {
                AppError::ShaderCompile {
                    stage: self.stage,
                    log,
                }
            })?;

        let mut bytes = vec![];
        file.read_to_end(&mut bytes)
            .map_err(|e| self.compile_error(format!("cannot read compiler output: {}", e)))?;

        pso::read_spirv(Cursor::new(&bytes[..]))
            .map_err(|e| self.compile_error(format!("compiler produced invalid SPIR-V: {}", e)))
    }

    pub fn compile_error(&self, log: String) -> AppError {
        AppError::ShaderCompile {
            stage: self.stage,
            log,
        }
    }
}

/// Packs RGBA into specialization constants 0..=3 of the fragment stage.
pub fn color_specialization(color: [f32; 4]) -> pso::Specialization<'static> {
    let constants = (0..4u16)
        .map(|i| pso::SpecializationConstant {
            id: i as u32,
            range: i * 4..(i + 1) * 4,
        })
        .collect::<Vec<_>>();
    let data = color
        .iter()
        .flat_map(|c| c.to_ne_bytes().to_vec())
        .collect::<Vec<u8>>();

    pso::Specialization {
        constants: constants.into(),
        data: data.into(),
    }
}
