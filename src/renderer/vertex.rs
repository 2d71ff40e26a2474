use gfx_hal::{format as f, pso};
use std::mem;

#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Vertex {
    pub position: [f32; 3],
}

/// Equilateral triangle centred on the origin: lower left, lower right, apex.
pub fn triangle() -> [Vertex; 3] {
    let sqrt_3 = 3f32.sqrt();
    [
        Vertex {
            position: [-0.5, -0.5 * sqrt_3 / 3.0, 0.0],
        },
        Vertex {
            position: [0.5, -0.5 * sqrt_3 / 3.0, 0.0],
        },
        Vertex {
            position: [0.0, 0.5 * sqrt_3 * 2.0 / 3.0, 0.0],
        },
    ]
}

pub const VERTEX_COUNT: u32 = 3;

pub const BINDING: u32 = 0;
pub const POSITION_LOCATION: u32 = 0;

impl Vertex {
    pub fn buffer_desc() -> pso::VertexBufferDesc {
        pso::VertexBufferDesc {
            binding: BINDING,
            stride: mem::size_of::<Vertex>() as u32,
            rate: pso::VertexInputRate::Vertex,
        }
    }

    pub fn attributes() -> [pso::AttributeDesc; 1] {
        [pso::AttributeDesc {
            location: POSITION_LOCATION,
            binding: BINDING,
            element: pso::Element {
                format: f::Format::Rgb32Sfloat,
                offset: 0,
            },
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn triangle_matches_fixed_layout() {
        let sqrt_3 = 3f32.sqrt();
        let expected = [
            [-0.5, -0.5 * sqrt_3 / 3.0, 0.0],
            [0.5, -0.5 * sqrt_3 / 3.0, 0.0],
            [0.0, 0.5 * sqrt_3 * 2.0 / 3.0, 0.0],
        ];
        for (vertex, expected) in triangle().iter().zip(expected.iter()) {
            for (got, want) in vertex.position.iter().zip(expected.iter()) {
                assert_relative_eq!(*got, *want);
            }
        }
    }

    #[test]
    fn triangle_is_equilateral() {
        let [a, b, c] = triangle();
        let dist = |p: &Vertex, q: &Vertex| {
            let dx = p.position[0] - q.position[0];
            let dy = p.position[1] - q.position[1];
            (dx * dx + dy * dy).sqrt()
        };
        assert_relative_eq!(dist(&a, &b), 1.0);
        assert_relative_eq!(dist(&b, &c), 1.0, epsilon = 1e-6);
        assert_relative_eq!(dist(&c, &a), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn geometry_is_nine_tightly_packed_floats() {
        let vertices = triangle();
        assert_eq!(vertices.len() as u32, VERTEX_COUNT);
        assert_eq!(mem::size_of_val(&vertices), 9 * mem::size_of::<f32>());
    }

    #[test]
    fn layout_describes_three_floats_at_location_zero() {
        let desc = Vertex::buffer_desc();
        assert_eq!(desc.binding, 0);
        assert_eq!(desc.stride, 3 * mem::size_of::<f32>() as u32);

        let attributes = Vertex::attributes();
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes[0].location, 0);
        assert_eq!(attributes[0].binding, desc.binding);
        assert_eq!(attributes[0].element.offset, 0);
        assert_eq!(attributes[0].element.format, f::Format::Rgb32Sfloat);
    }
}
