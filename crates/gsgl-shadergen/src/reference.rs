//! Host-side model of what the generated programs compute.
//!
//! Mirrors the emitted helper routines and the per-pixel read-modify-write that follows texturing:
//! alpha test, fog, depth test, depth write, blend, color mask, store. It consumes fragments that
//! are already textured and combined; it is not a rasterizer.

use crate::caps::{
    AlphaFailResult, AlphaTestMethod, BlendFactorAbd, BlendFactorC, DepthTestMethod, ShaderCaps,
};
use crate::snippets::{self, AlphaFailCondition};

const DEPTH_SCALE: f32 = 4_294_967_296.0;

/// `bitAnd` helper, one bit per iteration.
pub fn bit_and(mut a: i32, mut b: i32) -> i32 {
    let mut r = 0;
    let m = i64::from(a.min(b));
    let mut k: i64 = 1;
    while k <= m {
        let (ha, hb) = (a / 2, b / 2);
        if a - ha * 2 != 0 && b - hb * 2 != 0 {
            r += k;
        }
        a = ha;
        b = hb;
        k *= 2;
    }
    r as i32
}

/// `bitOr` helper, one bit per iteration.
pub fn bit_or(mut a: i32, mut b: i32) -> i32 {
    let mut r = 0;
    let m = i64::from(a.max(b));
    let mut k: i64 = 1;
    while k <= m {
        let (ha, hb) = (a / 2, b / 2);
        if a - ha * 2 != 0 || b - hb * 2 != 0 {
            r += k;
        }
        a = ha;
        b = hb;
        k *= 2;
    }
    r as i32
}

/// `RegionRepeat` addressing of one texel coordinate.
pub fn region_repeat(coord: f32, mask: f32, fix: f32) -> f32 {
    bit_or(bit_and(coord as i32, mask as i32), fix as i32) as f32
}

/// `RegionRepeatSimple` addressing; GLSL `mod` floors, unlike `%`.
pub fn region_repeat_simple(coord: f32, size: f32, offset: f32) -> f32 {
    coord - size * (coord / size).floor() + offset
}

/// 8-bit quantization used by the alpha test and the blend unit.
pub fn quantize_alpha(alpha: f32) -> u32 {
    (alpha.clamp(0.0, 1.0) * 255.0).round() as u32
}

/// `combineColors` helper: 8-bit multiply where `0x80` is 1.0.
pub fn combine_colors(a: f32, b: f32) -> f32 {
    let a = (a * 255.0).round() as u32;
    let b = (b * 255.0).round() as u32;
    ((a * b) >> 7).min(255) as f32 / 255.0
}

/// Evaluates the emitted fail condition of `method` on a quantized alpha.
pub fn alpha_test_fails(method: AlphaTestMethod, alpha: u32, reference: u32) -> bool {
    match snippets::alpha_fail_condition(method) {
        AlphaFailCondition::Constant(fail) => fail,
        AlphaFailCondition::Compare(op) => op.eval(alpha, reference),
    }
}

/// Vertex-stage depth normalization.
pub fn encode_depth(depth: u32) -> f32 {
    depth as f32 / DEPTH_SCALE
}

/// Fragment-stage depth reconstruction; values that round up to 1.0 saturate.
pub fn decode_depth(depth: f32) -> u32 {
    if depth >= 1.0 {
        u32::MAX
    } else {
        (depth * DEPTH_SCALE) as u32
    }
}

/// Per-draw uniform values the read-modify-write depends on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawState {
    pub alpha_ref: u32,
    pub depth_mask: u32,
    pub fog_color: [f32; 3],
    pub alpha_fix: u32,
    pub color_mask: u32,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            alpha_ref: 0,
            depth_mask: u32::MAX,
            fog_color: [0.0; 3],
            alpha_fix: 0x80,
            color_mask: u32::MAX,
        }
    }
}

/// A fragment after texturing and color combine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadedFragment {
    pub color: [f32; 4],
    /// Interpolated `v_depth`.
    pub depth: f32,
    pub fog: f32,
}

impl ShadedFragment {
    pub fn opaque(color: [f32; 3], depth: u32) -> Self {
        Self {
            color: [color[0], color[1], color[2], 1.0],
            depth: encode_depth(depth),
            fog: 0.0,
        }
    }
}

/// Framebuffer and depth buffer contents at one pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pixel {
    pub color: [u8; 4],
    pub depth: u32,
}

fn unpack(color: [u8; 4]) -> [f32; 4] {
    color.map(|c| f32::from(c) / 255.0)
}

fn pack(color: [f32; 4]) -> [u8; 4] {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn abd_operand(factor: BlendFactorAbd, src: &[f32; 4], dst: &[f32; 4]) -> [f32; 3] {
    match factor {
        BlendFactorAbd::Cs => [src[0], src[1], src[2]],
        BlendFactorAbd::Cd => [dst[0], dst[1], dst[2]],
        BlendFactorAbd::Zero => [0.0; 3],
    }
}

/// Runs one fragment through the post-texturing pipeline against `pixel`.
pub fn shade_fragment(
    caps: &ShaderCaps,
    state: &DrawState,
    fragment: &ShadedFragment,
    pixel: &mut Pixel,
) {
    let depth = decode_depth(fragment.depth);

    let alpha_fail = caps.has_alpha_test
        && alpha_test_fails(
            caps.alpha_test_method,
            quantize_alpha(fragment.color[3]),
            state.alpha_ref,
        );
    if alpha_fail && caps.alpha_fail_result == AlphaFailResult::Keep {
        return;
    }

    let mut color = fragment.color;
    if caps.has_fog {
        for (c, fog) in color.iter_mut().zip(state.fog_color) {
            *c = *c * (1.0 - fragment.fog) + fog * fragment.fog;
        }
    }

    let depth_fail = match caps.depth_test_method {
        DepthTestMethod::Never => true,
        DepthTestMethod::Always => false,
        DepthTestMethod::GreaterEqual => depth < pixel.depth,
        DepthTestMethod::Greater => depth <= pixel.depth,
    };
    if depth_fail {
        return;
    }

    let (write_depth, write_color) = match caps.alpha_fail_result {
        _ if !alpha_fail => (true, true),
        AlphaFailResult::Keep => (false, false),
        AlphaFailResult::FbOnly | AlphaFailResult::RgbOnly => (false, true),
        AlphaFailResult::ZbOnly => (true, false),
    };

    if caps.depth_write_enabled && write_depth {
        pixel.depth = depth & state.depth_mask;
    }
    if !write_color {
        return;
    }

    let dst = unpack(pixel.color);
    if caps.has_alpha_blend {
        let a = abd_operand(caps.blend_factor_a, &color, &dst);
        let b = abd_operand(caps.blend_factor_b, &color, &dst);
        let d = abd_operand(caps.blend_factor_d, &color, &dst);
        let c = match caps.blend_factor_c {
            BlendFactorC::As => color[3],
            BlendFactorC::Ad => dst[3],
            BlendFactorC::Fix => state.alpha_fix as f32 / 255.0,
        };
        for i in 0..3 {
            color[i] = (a[i] - b[i]) * c * 2.0 + d[i];
        }
    }
    if alpha_fail && caps.alpha_fail_result == AlphaFailResult::RgbOnly {
        color[3] = dst[3];
    }

    // Mask bytes are 0xAABBGGRR.
    for (i, c) in color.iter_mut().enumerate() {
        if (state.color_mask >> (8 * i)) & 0xFF == 0 {
            *c = dst[i];
        }
    }
    pixel.color = pack(color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::TextureFunction;

    #[test]
    fn region_repeat_matches_integer_bit_ops() {
        for (mask, fix) in [(0x0F, 0x00), (0x3F, 0x40), (0x2B, 0x100), (0x155, 0x0A)] {
            for c in 0..1024 {
                let expected = (c & mask) | fix;
                assert_eq!(
                    region_repeat(c as f32, mask as f32, fix as f32),
                    expected as f32,
                    "coord {c} mask {mask:#x} fix {fix:#x}"
                );
            }
        }
    }

    #[test]
    fn simple_repeat_agrees_for_power_of_two_regions() {
        for (size, offset) in [(16, 0), (32, 64), (64, 128), (128, 256)] {
            for c in 0..1024 {
                let full = region_repeat(c as f32, (size - 1) as f32, offset as f32);
                let simple = region_repeat_simple(c as f32, size as f32, offset as f32);
                assert_eq!(full, simple, "coord {c} size {size} offset {offset}");
            }
        }
    }

    #[test]
    fn combine_colors_is_eight_bit_multiply() {
        let values = [0.0, 1.0 / 255.0, 0.5, 254.0 / 255.0, 1.0];
        for a in values {
            for b in values {
                let (ai, bi) = ((a * 255.0f32).round() as u32, (b * 255.0f32).round() as u32);
                let expected = ((ai * bi) >> 7).min(255);
                assert_eq!((combine_colors(a, b) * 255.0).round() as u32, expected);
            }
        }
        // 0x80 is unity.
        assert_eq!(combine_colors(128.0 / 255.0, 77.0 / 255.0), 77.0 / 255.0);
        assert_eq!(combine_colors(1.0, 1.0), 1.0);
    }

    #[test]
    fn alpha_test_truth_table() {
        let reference = 0x40;
        for alpha in [0, reference - 1, reference, reference + 1, 255] {
            for &method in AlphaTestMethod::ALL {
                let passes = match method {
                    AlphaTestMethod::Never => false,
                    AlphaTestMethod::Always => true,
                    AlphaTestMethod::Less => alpha < reference,
                    AlphaTestMethod::LessEqual => alpha <= reference,
                    AlphaTestMethod::Equal => alpha == reference,
                    AlphaTestMethod::GreaterEqual => alpha >= reference,
                    AlphaTestMethod::Greater => alpha > reference,
                    AlphaTestMethod::NotEqual => alpha != reference,
                };
                assert_eq!(
                    alpha_test_fails(method, alpha, reference),
                    !passes,
                    "{method:?} alpha {alpha}"
                );
            }
        }
    }

    #[test]
    fn depth_boundaries_round_trip() {
        for depth in [0, 1, 1 << 31, u32::MAX] {
            assert_eq!(decode_depth(encode_depth(depth)), depth);
        }
    }

    fn alpha_tested(fail: AlphaFailResult) -> ShaderCaps {
        ShaderCaps {
            has_alpha_test: true,
            alpha_test_method: AlphaTestMethod::Never,
            alpha_fail_result: fail,
            depth_write_enabled: true,
            tex_function: TextureFunction::Decal,
            ..Default::default()
        }
    }

    fn start() -> Pixel {
        Pixel {
            color: [10, 20, 30, 40],
            depth: 5,
        }
    }

    fn shade(caps: &ShaderCaps) -> Pixel {
        let mut pixel = start();
        let fragment = ShadedFragment::opaque([1.0, 1.0, 1.0], 100);
        shade_fragment(caps, &DrawState::default(), &fragment, &mut pixel);
        pixel
    }

    #[test]
    fn keep_leaves_both_buffers_unchanged() {
        assert_eq!(shade(&alpha_tested(AlphaFailResult::Keep)), start());
    }

    #[test]
    fn fb_only_writes_color_but_not_depth() {
        let pixel = shade(&alpha_tested(AlphaFailResult::FbOnly));
        assert_eq!(pixel.color, [255; 4]);
        assert_eq!(pixel.depth, 5);
    }

    #[test]
    fn zb_only_writes_depth_but_not_color() {
        let pixel = shade(&alpha_tested(AlphaFailResult::ZbOnly));
        assert_eq!(pixel.color, start().color);
        assert_eq!(pixel.depth, 100);
    }

    #[test]
    fn rgb_only_keeps_destination_alpha() {
        let pixel = shade(&alpha_tested(AlphaFailResult::RgbOnly));
        assert_eq!(pixel.color, [255, 255, 255, 40]);
        assert_eq!(pixel.depth, 5);
    }

    #[test]
    fn depth_test_rejects_farther_fragments() {
        let caps = ShaderCaps {
            depth_test_method: DepthTestMethod::GreaterEqual,
            depth_write_enabled: true,
            ..Default::default()
        };
        let mut pixel = Pixel {
            color: [0; 4],
            depth: 200,
        };
        let far = ShadedFragment::opaque([1.0, 0.0, 0.0], 100);
        shade_fragment(&caps, &DrawState::default(), &far, &mut pixel);
        assert_eq!(pixel, Pixel { color: [0; 4], depth: 200 });

        let equal = ShadedFragment::opaque([1.0, 0.0, 0.0], 200);
        shade_fragment(&caps, &DrawState::default(), &equal, &mut pixel);
        assert_eq!(pixel.color, [255, 0, 0, 255]);
    }

    #[test]
    fn blend_and_mask() {
        // (Cs - Cd) * As * 2 + Cd with As = 0x40/255 gives roughly a half mix.
        let caps = ShaderCaps {
            has_alpha_blend: true,
            ..Default::default()
        };
        let state = DrawState {
            color_mask: 0x00FF_FFFF,
            ..Default::default()
        };
        let mut pixel = Pixel {
            color: [0, 0, 0, 77],
            depth: 0,
        };
        let fragment = ShadedFragment {
            color: [1.0, 1.0, 1.0, 64.0 / 255.0],
            depth: 0.0,
            fog: 0.0,
        };
        shade_fragment(&caps, &state, &fragment, &mut pixel);
        assert_eq!(pixel.color, [128, 128, 128, 77]);
    }
}
