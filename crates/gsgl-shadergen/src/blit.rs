//! Fixed programs that move finished images around: present to screen, copy a region.

use crate::options::ShaderGenOptions;
use crate::source::{Section, SectionKind, ShaderSource, ShaderStage};

/// Vertex and fragment source of a program that is not driven by [`crate::ShaderCaps`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlitSources {
    pub vertex: ShaderSource,
    pub fragment: ShaderSource,
}

/// Samples `g_texture` over a quad, scaling coordinates by `g_texCoordScale`.
pub fn present(options: &ShaderGenOptions) -> BlitSources {
    BlitSources {
        vertex: blit_vertex(
            options,
            &["uniform vec2 g_texCoordScale;"],
            "v_texCoord = a_texCoord * g_texCoordScale;",
        ),
        fragment: sample_fragment(options),
    }
}

/// Samples the `g_srcSize` region at `g_srcPosition` (normalized) of `g_texture`.
pub fn copy(options: &ShaderGenOptions) -> BlitSources {
    BlitSources {
        vertex: blit_vertex(
            options,
            &["uniform vec2 g_srcPosition;", "uniform vec2 g_srcSize;"],
            "v_texCoord = (a_texCoord * g_srcSize) + g_srcPosition;",
        ),
        fragment: sample_fragment(options),
    }
}

fn blit_vertex(options: &ShaderGenOptions, uniforms: &[&str], texcoord: &str) -> ShaderSource {
    let mut source = ShaderSource::new(ShaderStage::Vertex);

    let mut decls = Section::new(SectionKind::Declarations);
    decls
        .line(options.glsl_version.directive())
        .line("in vec2 a_position;")
        .line("in vec2 a_texCoord;")
        .line("out vec2 v_texCoord;");
    for uniform in uniforms {
        decls.line(*uniform);
    }
    source.push(decls);

    let mut main = Section::new(SectionKind::Main);
    main.line(texcoord)
        .line("gl_Position = vec4(a_position, 0.0, 1.0);");
    source.push(main);

    source
}

fn sample_fragment(options: &ShaderGenOptions) -> ShaderSource {
    let mut source = ShaderSource::new(ShaderStage::Fragment);

    let mut decls = Section::new(SectionKind::Declarations);
    decls
        .line(options.glsl_version.directive())
        .line("precision mediump float;")
        .line("in vec2 v_texCoord;")
        .line("out vec4 fragColor;")
        .line("uniform sampler2D g_texture;");
    source.push(decls);

    let mut main = Section::new(SectionKind::Main);
    main.line("fragColor = texture(g_texture, v_texCoord);");
    source.push(main);

    source
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn present_fragment_is_a_plain_sample() {
        let sources = present(&ShaderGenOptions::default());
        assert_eq!(
            sources.fragment.render(),
            "#version 420\n\
             precision mediump float;\n\
             in vec2 v_texCoord;\n\
             out vec4 fragColor;\n\
             uniform sampler2D g_texture;\n\
             void main()\n\
             {\n    \
             fragColor = texture(g_texture, v_texCoord);\n\
             }\n"
        );
    }

    #[test]
    fn copy_offsets_and_scales_coordinates() {
        let sources = copy(&ShaderGenOptions::default());
        let vertex = sources.vertex.render();
        assert!(vertex.contains("uniform vec2 g_srcPosition;"));
        assert!(vertex.contains("v_texCoord = (a_texCoord * g_srcSize) + g_srcPosition;"));
        assert_eq!(sources.fragment, present(&ShaderGenOptions::default()).fragment);
    }
}
