//! Fragment stage: the GS pixel pipeline as an explicit read-modify-write of two images.
//!
//! The program never writes its native color output. Depth testing, depth writes, blending and
//! channel masking all happen through `imageLoad`/`imageStore` on `g_framebuffer` and
//! `g_depthbuffer`, bracketed by the ordering mode's critical section, and the invocation ends
//! with an unconditional `discard`.
//!
//! Sections are emitted in [`SectionKind`] order; each one is skipped when the descriptor makes
//! it a no-op.

use crate::caps::{
    AlphaFailResult, DepthTestMethod, ShaderCaps, TextureFunction, TextureSourceMode,
};
use crate::options::ShaderGenOptions;
use crate::ordering::OrderingMode;
use crate::snippets::{self, TexAxis};
use crate::source::{Section, SectionKind, ShaderSource, ShaderStage};
use crate::vertex::DEPTH_SCALE;

pub fn generate(
    caps: &ShaderCaps,
    ordering: OrderingMode,
    options: &ShaderGenOptions,
) -> ShaderSource {
    let mut source = ShaderSource::new(ShaderStage::Fragment);

    source.push(declarations(caps, ordering, options));
    source.push(helpers(caps));
    source.push(projection());
    source.push(texcoord_clamp(caps));
    source.push(texture_sample(caps));
    source.push(alpha_override(caps));
    source.push(combine(caps));
    source.push(alpha_test(caps));
    source.push(fog(caps));
    source.push(begin_critical_section(ordering));
    source.push(depth_test(caps));
    source.push(depth_write(caps));
    source.push(color_write(caps));
    source.push(finish(ordering));

    source
}

fn declarations(
    caps: &ShaderCaps,
    ordering: OrderingMode,
    options: &ShaderGenOptions,
) -> Section {
    let mut s = Section::new(SectionKind::Declarations);
    s.line(options.glsl_version.directive());
    for line in ordering.declarations() {
        s.line(*line);
    }
    s.line("precision mediump float;")
        .line("in highp float v_depth;")
        .line("in vec4 v_color;")
        .line("in highp vec3 v_texCoord;");
    if caps.has_fog {
        s.line("in float v_fog;");
    }
    s.block(
        "\
out vec4 fragColor;
uniform sampler2D g_texture;
uniform sampler2D g_palette;
layout(rgba8) coherent uniform image2D g_framebuffer;
layout(r32ui) coherent uniform uimage2D g_depthbuffer;
layout(std140) uniform FragmentParams
{
    vec2 g_textureSize;
    vec2 g_texelSize;
    vec2 g_clampMin;
    vec2 g_clampMax;
    float g_texA0;
    float g_texA1;
    uint g_alphaRef;
    uint g_depthMask;
    vec3 g_fogColor;
    uint g_alphaFix;
    uint g_colorMask;
};",
    );
    s
}

fn helpers(caps: &ShaderCaps) -> Section {
    let mut s = Section::new(SectionKind::Helpers);
    if caps.uses_region_repeat() {
        s.block(snippets::BITWISE_HELPERS);
    }
    s.block(snippets::COMBINE_COLORS_HELPER);

    s.line("vec4 expandAlpha(vec4 inputColor)").line("{");
    if caps.tex_use_alpha_expansion {
        s.line("    float alpha = mix(g_texA0, g_texA1, inputColor.a);");
        if caps.tex_black_is_transparent {
            s.line("    float black = inputColor.r + inputColor.g + inputColor.b;")
                .line("    if(black == 0.0) alpha = 0.0;");
        }
        s.line("    return vec4(inputColor.rgb, alpha);");
    } else {
        s.line("    return inputColor;");
    }
    s.line("}");
    s
}

fn projection() -> Section {
    let mut s = Section::new(SectionKind::Projection);
    // `v_depth` reaches 1.0 for the top depth value once rounded to float; saturate instead of
    // overflowing the conversion.
    s.line(format!(
        "uint depth = (v_depth >= 1.0) ? 0xFFFFFFFFu : uint(v_depth * {DEPTH_SCALE});"
    ))
    .line("bool depthTestFail = false;")
    .line("bool alphaTestFail = false;")
    .line("highp vec3 texCoord = v_texCoord;")
    .line("texCoord.st /= texCoord.p;");
    s
}

fn texcoord_clamp(caps: &ShaderCaps) -> Section {
    let mut s = Section::new(SectionKind::TexCoordClamp);
    if !caps.needs_texcoord_clamp() {
        return s;
    }
    s.line("texCoord.st *= g_textureSize.st;");
    for (mode, axis) in [(caps.tex_clamp_s, TexAxis::S), (caps.tex_clamp_t, TexAxis::T)] {
        if let Some(line) = snippets::clamp_section(mode, axis) {
            s.line(line);
        }
    }
    s.line("texCoord.st /= g_textureSize.st;");
    s
}

fn texture_sample(caps: &ShaderCaps) -> Section {
    let mut s = Section::new(SectionKind::TextureSample);
    match caps.tex_source_mode {
        TextureSourceMode::None => {
            s.line("vec4 textureColor = v_color;");
        }
        TextureSourceMode::Std => {
            s.line("vec4 textureColor = expandAlpha(texture(g_texture, texCoord.st));");
        }
        TextureSourceMode::Idx4 | TextureSourceMode::Idx8 => {
            let size = if caps.tex_source_mode == TextureSourceMode::Idx4 {
                "16.0"
            } else {
                "256.0"
            };
            s.line(format!("float paletteTexelBias = 0.5 / {size};"));
            let lookup = |index: &str| {
                format!(
                    "expandAlpha(texture(g_palette, vec2({index} / {size} + paletteTexelBias, 0.0)))"
                )
            };

            if caps.tex_bilinear_filter {
                // Each corner resolves through the palette before filtering; filtering raw
                // indices would blend unrelated palette entries.
                s.block(
                    "\
float tlIdx = texture(g_texture, texCoord.st).r * 255.0;
float trIdx = texture(g_texture, texCoord.st + vec2(g_texelSize.x, 0.0)).r * 255.0;
float blIdx = texture(g_texture, texCoord.st + vec2(0.0, g_texelSize.y)).r * 255.0;
float brIdx = texture(g_texture, texCoord.st + g_texelSize).r * 255.0;",
                );
                for corner in ["tl", "tr", "bl", "br"] {
                    s.line(format!("vec4 {corner} = {};", lookup(&format!("{corner}Idx"))));
                }
                s.block(
                    "\
highp vec2 f = fract(texCoord.st * g_textureSize);
vec4 tA = mix(tl, tr, f.x);
vec4 tB = mix(bl, br, f.x);
vec4 textureColor = mix(tA, tB, f.y);",
                );
            } else {
                s.line("float colorIndex = texture(g_texture, texCoord.st).r * 255.0;")
                    .line(format!("vec4 textureColor = {};", lookup("colorIndex")));
            }
        }
    }
    s
}

fn alpha_override(caps: &ShaderCaps) -> Section {
    let mut s = Section::new(SectionKind::AlphaOverride);
    if caps.is_textured() && !caps.tex_has_alpha {
        s.line("textureColor.a = 1.0;");
    }
    s
}

fn combine(caps: &ShaderCaps) -> Section {
    let mut s = Section::new(SectionKind::Combine);
    if !caps.is_textured() {
        return s;
    }

    const MODULATE_RGB: &str = "clamp(textureColor.rgb * v_color.rgb * 2.0, 0.0, 1.0)";
    match caps.tex_function {
        TextureFunction::Modulate => {
            s.line(format!("textureColor.rgb = {MODULATE_RGB};"));
            if caps.tex_has_alpha {
                s.line("textureColor.a = combineColors(textureColor.a, v_color.a);");
            } else {
                s.line("textureColor.a = v_color.a;");
            }
        }
        TextureFunction::Decal => {}
        TextureFunction::Highlight => {
            s.line(format!("textureColor.rgb = {MODULATE_RGB} + v_color.aaa;"));
            if caps.tex_has_alpha {
                s.line("textureColor.a += v_color.a;");
            } else {
                s.line("textureColor.a = v_color.a;");
            }
        }
        TextureFunction::Highlight2 => {
            s.line(format!("textureColor.rgb = {MODULATE_RGB} + v_color.aaa;"));
            if !caps.tex_has_alpha {
                s.line("textureColor.a = v_color.a;");
            }
        }
    }
    s
}

fn alpha_test(caps: &ShaderCaps) -> Section {
    let mut s = Section::new(SectionKind::AlphaTest);
    if !caps.has_alpha_test {
        return s;
    }
    for line in snippets::alpha_test_statements(caps.alpha_test_method) {
        s.line(line);
    }
    if caps.alpha_fail_result == AlphaFailResult::Keep {
        s.line("if(alphaTestFail) discard;");
    }
    s
}

fn fog(caps: &ShaderCaps) -> Section {
    let mut s = Section::new(SectionKind::Fog);
    if caps.has_fog {
        s.line("fragColor.rgb = mix(textureColor.rgb, g_fogColor, v_fog);");
    } else {
        s.line("fragColor.rgb = textureColor.rgb;");
    }
    s.line("fragColor.a = textureColor.a;");
    s
}

fn begin_critical_section(ordering: OrderingMode) -> Section {
    let mut s = Section::new(SectionKind::BeginCriticalSection);
    if let Some(begin) = ordering.begin_statement() {
        s.line(begin);
    }
    s
}

fn depth_test(caps: &ShaderCaps) -> Section {
    let mut s = Section::new(SectionKind::DepthTest);
    s.line("ivec2 coords = ivec2(gl_FragCoord.xy);");
    let fail_op = match caps.depth_test_method {
        DepthTestMethod::Always => None,
        DepthTestMethod::Never => {
            s.line("depthTestFail = true;");
            None
        }
        DepthTestMethod::GreaterEqual => Some("<"),
        DepthTestMethod::Greater => Some("<="),
    };
    if let Some(op) = fail_op {
        s.line("uint depthValue = imageLoad(g_depthbuffer, coords).r;")
            .line(format!("depthTestFail = (depth {op} depthValue);"));
    }
    s
}

/// Whether an alpha-test failure suppresses the depth write.
fn alpha_fail_blocks_depth(caps: &ShaderCaps) -> bool {
    caps.alpha_test_can_fail_late()
        && matches!(
            caps.alpha_fail_result,
            AlphaFailResult::FbOnly | AlphaFailResult::RgbOnly
        )
}

/// Whether an alpha-test failure suppresses the framebuffer write.
fn alpha_fail_blocks_color(caps: &ShaderCaps) -> bool {
    caps.alpha_test_can_fail_late() && caps.alpha_fail_result == AlphaFailResult::ZbOnly
}

fn depth_write(caps: &ShaderCaps) -> Section {
    let mut s = Section::new(SectionKind::DepthWrite);
    if !caps.depth_write_enabled {
        return s;
    }
    if alpha_fail_blocks_depth(caps) {
        s.line("if(!depthTestFail && !alphaTestFail)");
    } else {
        s.line("if(!depthTestFail)");
    }
    s.line("{")
        .line("    imageStore(g_depthbuffer, coords, uvec4(depth & g_depthMask));")
        .line("}");
    s
}

fn color_write(caps: &ShaderCaps) -> Section {
    let mut s = Section::new(SectionKind::ColorWrite);
    if alpha_fail_blocks_color(caps) {
        s.line("if(!depthTestFail && !alphaTestFail)");
    } else {
        s.line("if(!depthTestFail)");
    }
    s.line("{")
        .line("    vec4 dstColor = imageLoad(g_framebuffer, coords);");

    if caps.has_alpha_blend {
        s.line(format!(
            "    vec3 colorA = {};",
            snippets::blend_abd_operand(caps.blend_factor_a)
        ))
        .line(format!(
            "    vec3 colorB = {};",
            snippets::blend_abd_operand(caps.blend_factor_b)
        ))
        .line(format!(
            "    vec3 colorD = {};",
            snippets::blend_abd_operand(caps.blend_factor_d)
        ))
        .line(format!(
            "    float alphaC = {};",
            snippets::blend_c_operand(caps.blend_factor_c)
        ))
        .line("    fragColor.rgb = ((colorA - colorB) * alphaC * 2.0) + colorD;");
    }

    if caps.alpha_test_can_fail_late() && caps.alpha_fail_result == AlphaFailResult::RgbOnly {
        s.line("    if(alphaTestFail) fragColor.a = dstColor.a;");
    }

    s.block(
        "    if((g_colorMask & 0xFF000000u) == 0u) fragColor.a = dstColor.a;
    if((g_colorMask & 0x00FF0000u) == 0u) fragColor.b = dstColor.b;
    if((g_colorMask & 0x0000FF00u) == 0u) fragColor.g = dstColor.g;
    if((g_colorMask & 0x000000FFu) == 0u) fragColor.r = dstColor.r;
    imageStore(g_framebuffer, coords, fragColor);",
    );
    s.line("}");
    s
}

fn finish(ordering: OrderingMode) -> Section {
    let mut s = Section::new(SectionKind::Finish);
    if let Some(end) = ordering.end_statement() {
        s.line(end);
    }
    s.line("discard;");
    s
}
