//! Vertex stage.
//!
//! Texture coordinates leave this stage un-normalized: the divide by `q` happens per fragment,
//! which is how the GS addresses textures under perspective.

use crate::caps::ShaderCaps;
use crate::options::ShaderGenOptions;
use crate::source::{Section, SectionKind, ShaderSource, ShaderStage};

/// `2^32`: depth attributes are full 32-bit fixed-point values.
pub const DEPTH_SCALE: &str = "4294967296.0";

pub fn generate(caps: &ShaderCaps, options: &ShaderGenOptions) -> ShaderSource {
    let mut source = ShaderSource::new(ShaderStage::Vertex);

    let mut decls = Section::new(SectionKind::Declarations);
    decls.line(options.glsl_version.directive());
    decls.block(
        "\
layout(std140) uniform VertexParams
{
    mat4 g_projMatrix;
    mat4 g_texMatrix;
};
in vec2 a_position;
in uint a_depth;
in vec4 a_color;
in vec3 a_texCoord;",
    );
    if caps.has_fog {
        decls.line("in float a_fog;");
    }
    decls
        .line("out float v_depth;")
        .line("out vec4 v_color;")
        .line("out vec3 v_texCoord;");
    if caps.has_fog {
        decls.line("out float v_fog;");
    }
    source.push(decls);

    let mut main = Section::new(SectionKind::Main);
    main.line("vec4 texCoord = g_texMatrix * vec4(a_texCoord, 1.0);")
        .line(format!("v_depth = float(a_depth) / {DEPTH_SCALE};"))
        .line("v_color = a_color;")
        .line("v_texCoord = texCoord.xyz;");
    if caps.has_fog {
        main.line("v_fog = a_fog;");
    }
    main.line("gl_Position = g_projMatrix * vec4(a_position, 0.0, 1.0);");
    source.push(main);

    source
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fog_interface_only_when_requested() {
        let options = ShaderGenOptions::default();
        let plain = generate(&ShaderCaps::default(), &options).render();
        assert!(!plain.contains("a_fog"));
        assert!(!plain.contains("v_fog"));

        let caps = ShaderCaps {
            has_fog: true,
            ..Default::default()
        };
        let fogged = generate(&caps, &options).render();
        assert!(fogged.contains("in float a_fog;"));
        assert!(fogged.contains("out float v_fog;"));
        assert!(fogged.contains("v_fog = a_fog;"));
    }

    #[test]
    fn depth_is_scaled_by_two_to_the_32() {
        let source = generate(&ShaderCaps::default(), &ShaderGenOptions::default());
        let main = source.section(SectionKind::Main).unwrap();
        assert!(main.contains("v_depth = float(a_depth) / 4294967296.0;"));
        assert!(main.contains("gl_Position = g_projMatrix * vec4(a_position, 0.0, 1.0);"));
        assert!(main.contains("v_texCoord = texCoord.xyz;"));
    }
}
