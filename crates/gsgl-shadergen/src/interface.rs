//! Host-side view of what generated programs consume: attribute slots, uniform blocks, images.

use bytemuck::{Pod, Zeroable};

pub const VERTEX_PARAMS_BLOCK: &str = "VertexParams";
pub const FRAGMENT_PARAMS_BLOCK: &str = "FragmentParams";
pub const TEXTURE_SAMPLER: &str = "g_texture";
pub const PALETTE_SAMPLER: &str = "g_palette";
pub const FRAMEBUFFER_IMAGE: &str = "g_framebuffer";
pub const DEPTHBUFFER_IMAGE: &str = "g_depthbuffer";

/// Vertex attribute slots shared with the vertex-supply layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeLocation {
    Position = 1,
    Depth = 2,
    Color = 3,
    TexCoord = 4,
    Fog = 5,
}

impl AttributeLocation {
    pub const PRIMITIVE: [AttributeLocation; 5] = [
        AttributeLocation::Position,
        AttributeLocation::Depth,
        AttributeLocation::Color,
        AttributeLocation::TexCoord,
        AttributeLocation::Fog,
    ];

    /// Attributes of the present/copy quads.
    pub const BLIT: [AttributeLocation; 2] =
        [AttributeLocation::Position, AttributeLocation::TexCoord];

    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            AttributeLocation::Position => "a_position",
            AttributeLocation::Depth => "a_depth",
            AttributeLocation::Color => "a_color",
            AttributeLocation::TexCoord => "a_texCoord",
            AttributeLocation::Fog => "a_fog",
        }
    }
}

/// `VertexParams` uniform block (std140). Matrices are column-major.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct VertexParams {
    pub proj_matrix: [[f32; 4]; 4],
    pub tex_matrix: [[f32; 4]; 4],
}

impl Default for VertexParams {
    fn default() -> Self {
        let identity = [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        Self {
            proj_matrix: identity,
            tex_matrix: identity,
        }
    }
}

/// `FragmentParams` uniform block (std140).
///
/// `fog_color` is a `vec3`, so `alpha_fix` packs into its fourth lane.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct FragmentParams {
    pub texture_size: [f32; 2],
    pub texel_size: [f32; 2],
    pub clamp_min: [f32; 2],
    pub clamp_max: [f32; 2],
    pub tex_a0: f32,
    pub tex_a1: f32,
    pub alpha_ref: u32,
    pub depth_mask: u32,
    pub fog_color: [f32; 3],
    pub alpha_fix: u32,
    /// Framebuffer write mask in `0xAABBGGRR` layout; a zero byte preserves that channel.
    pub color_mask: u32,
    pub _padding: [u32; 3],
}

const _: () = assert!(std::mem::size_of::<VertexParams>() == 128);
const _: () = assert!(std::mem::size_of::<FragmentParams>() == 80);

impl VertexParams {
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl FragmentParams {
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_params_std140_offsets() {
        let params = FragmentParams {
            alpha_fix: 0x80,
            color_mask: 0xFFFF_FFFF,
            ..Default::default()
        };
        let bytes = params.as_bytes();
        assert_eq!(bytes.len(), 80);
        assert_eq!(&bytes[60..64], &0x80u32.to_ne_bytes());
        assert_eq!(&bytes[64..68], &0xFFFF_FFFFu32.to_ne_bytes());
    }

    #[test]
    fn attribute_slots_are_stable() {
        let slots: Vec<(u32, &str)> = AttributeLocation::PRIMITIVE
            .iter()
            .map(|a| (a.index(), a.name()))
            .collect();
        assert_eq!(
            slots,
            vec![
                (1, "a_position"),
                (2, "a_depth"),
                (3, "a_color"),
                (4, "a_texCoord"),
                (5, "a_fog"),
            ]
        );
    }
}
