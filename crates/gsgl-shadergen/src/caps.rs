//! Capability descriptor: the subset of GS draw state that changes the shape of generated shaders.
//!
//! All fields are closed enums, so a `ShaderCaps` value can never carry an out-of-range mode.
//! Raw GS register encodings enter through the `from_raw` constructors or
//! [`ShaderCaps::from_key`], which reject reserved encodings with a [`CapsError`].

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CapsError {
    #[error("invalid {field} encoding: {value}")]
    InvalidField { field: &'static str, value: u32 },
    #[error("capability key {0:#x} has reserved bits set")]
    ReservedBits(u64),
}

macro_rules! gs_field_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($(#[$vmeta:meta])* $variant:ident = $raw:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $raw,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            /// Decodes the raw register/key encoding of this field.
            pub fn from_raw(value: u32) -> Result<Self, CapsError> {
                match value {
                    $($raw => Ok($name::$variant),)+
                    _ => Err(CapsError::InvalidField {
                        field: $field,
                        value,
                    }),
                }
            }

            pub fn raw(self) -> u32 {
                self as u32
            }
        }
    };
}

gs_field_enum! {
    /// Where texel colors come from.
    TextureSourceMode, "texture source mode" {
        /// Untextured primitive.
        None = 0,
        /// Direct color texture.
        Std = 1,
        /// 4-bit indices resolved through a 16-entry palette.
        Idx4 = 2,
        /// 8-bit indices resolved through a 256-entry palette.
        Idx8 = 3,
    }
}

gs_field_enum! {
    /// Per-axis texture addressing (`CLAMP_1.WMS/WMT`, with the power-of-two repeat fast path split out).
    TextureClampMode, "texture clamp mode" {
        /// Plain repeat, handled by the sampler.
        Std = 0,
        /// Clamp to edge, handled by the sampler.
        Clamp = 1,
        /// Clamp into `[MINU, MAXU]`.
        RegionClamp = 2,
        /// `(coord & UMSK) | UFIX`.
        RegionRepeat = 3,
        /// `mod(coord, size) + offset`; only valid for power-of-two regions.
        RegionRepeatSimple = 4,
    }
}

gs_field_enum! {
    /// `TEX0.TFX`: how the texel combines with the vertex color.
    TextureFunction, "texture function" {
        Modulate = 0,
        Decal = 1,
        Highlight = 2,
        Highlight2 = 3,
    }
}

gs_field_enum! {
    /// `TEST.ATST`: condition under which a fragment *passes* the alpha test.
    AlphaTestMethod, "alpha test method" {
        Never = 0,
        Always = 1,
        Less = 2,
        LessEqual = 3,
        Equal = 4,
        GreaterEqual = 5,
        Greater = 6,
        NotEqual = 7,
    }
}

gs_field_enum! {
    /// `TEST.AFAIL`: what a fragment that fails the alpha test still updates.
    AlphaFailResult, "alpha fail result" {
        /// Nothing; the fragment is discarded.
        Keep = 0,
        /// Framebuffer only.
        FbOnly = 1,
        /// Depth buffer only.
        ZbOnly = 2,
        /// Framebuffer RGB only; destination alpha and depth are preserved.
        RgbOnly = 3,
    }
}

gs_field_enum! {
    /// `TEST.ZTST`.
    DepthTestMethod, "depth test method" {
        Never = 0,
        Always = 1,
        GreaterEqual = 2,
        Greater = 3,
    }
}

gs_field_enum! {
    /// `ALPHA.A/B/D` operand selection. Raw value 3 is reserved.
    BlendFactorAbd, "alpha blend A/B/D factor" {
        /// Source (fragment) color.
        Cs = 0,
        /// Destination (framebuffer) color.
        Cd = 1,
        Zero = 2,
    }
}

gs_field_enum! {
    /// `ALPHA.C` operand selection. Raw value 3 is reserved.
    BlendFactorC, "alpha blend C factor" {
        /// Source alpha.
        As = 0,
        /// Destination alpha.
        Ad = 1,
        /// `ALPHA.FIX`.
        Fix = 2,
    }
}

/// Everything about a draw that changes the generated program.
///
/// Two descriptors that compare equal always generate byte-identical shaders, so the value (or its
/// packed [`ShaderCaps::key`]) is suitable as a program cache key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderCaps {
    pub tex_source_mode: TextureSourceMode,
    pub tex_clamp_s: TextureClampMode,
    pub tex_clamp_t: TextureClampMode,
    pub tex_bilinear_filter: bool,
    pub tex_use_alpha_expansion: bool,
    pub tex_black_is_transparent: bool,
    pub tex_has_alpha: bool,
    pub tex_function: TextureFunction,

    pub has_alpha_test: bool,
    pub alpha_test_method: AlphaTestMethod,
    pub alpha_fail_result: AlphaFailResult,

    pub has_fog: bool,

    pub depth_test_method: DepthTestMethod,
    pub depth_write_enabled: bool,

    pub has_alpha_blend: bool,
    pub blend_factor_a: BlendFactorAbd,
    pub blend_factor_b: BlendFactorAbd,
    pub blend_factor_c: BlendFactorC,
    pub blend_factor_d: BlendFactorAbd,
}

impl Default for ShaderCaps {
    /// Untextured, untested, unblended: the vertex color lands in the framebuffer as-is.
    fn default() -> Self {
        Self {
            tex_source_mode: TextureSourceMode::None,
            tex_clamp_s: TextureClampMode::Std,
            tex_clamp_t: TextureClampMode::Std,
            tex_bilinear_filter: false,
            tex_use_alpha_expansion: false,
            tex_black_is_transparent: false,
            tex_has_alpha: false,
            tex_function: TextureFunction::Modulate,
            has_alpha_test: false,
            alpha_test_method: AlphaTestMethod::Always,
            alpha_fail_result: AlphaFailResult::Keep,
            has_fog: false,
            depth_test_method: DepthTestMethod::Always,
            depth_write_enabled: false,
            has_alpha_blend: false,
            blend_factor_a: BlendFactorAbd::Cs,
            blend_factor_b: BlendFactorAbd::Cd,
            blend_factor_c: BlendFactorC::As,
            blend_factor_d: BlendFactorAbd::Cd,
        }
    }
}

// Bit layout of `ShaderCaps::key`.
const SOURCE_MODE_SHIFT: u32 = 0;
const CLAMP_S_SHIFT: u32 = 2;
const CLAMP_T_SHIFT: u32 = 5;
const BILINEAR_BIT: u32 = 8;
const ALPHA_EXPANSION_BIT: u32 = 9;
const BLACK_TRANSPARENT_BIT: u32 = 10;
const TEX_HAS_ALPHA_BIT: u32 = 11;
const TEX_FUNCTION_SHIFT: u32 = 12;
const HAS_ALPHA_TEST_BIT: u32 = 14;
const ALPHA_TEST_METHOD_SHIFT: u32 = 15;
const ALPHA_FAIL_SHIFT: u32 = 18;
const HAS_FOG_BIT: u32 = 20;
const DEPTH_TEST_SHIFT: u32 = 21;
const DEPTH_WRITE_BIT: u32 = 23;
const HAS_ALPHA_BLEND_BIT: u32 = 24;
const BLEND_A_SHIFT: u32 = 25;
const BLEND_B_SHIFT: u32 = 27;
const BLEND_D_SHIFT: u32 = 29;
const BLEND_C_SHIFT: u32 = 31;
const KEY_BITS: u32 = 33;

fn field(key: u64, shift: u32, width: u32) -> u32 {
    ((key >> shift) & ((1u64 << width) - 1)) as u32
}

fn flag(key: u64, bit: u32) -> bool {
    (key >> bit) & 1 != 0
}

impl ShaderCaps {
    pub fn is_textured(&self) -> bool {
        self.tex_source_mode != TextureSourceMode::None
    }

    pub fn is_indexed_texture_source(&self) -> bool {
        matches!(
            self.tex_source_mode,
            TextureSourceMode::Idx4 | TextureSourceMode::Idx8
        )
    }

    /// Whether the software `bitAnd`/`bitOr` helpers are needed.
    pub fn uses_region_repeat(&self) -> bool {
        self.tex_clamp_s == TextureClampMode::RegionRepeat
            || self.tex_clamp_t == TextureClampMode::RegionRepeat
    }

    /// Whether texture coordinates go through the texel-space clamp section.
    pub fn needs_texcoord_clamp(&self) -> bool {
        self.tex_clamp_s != TextureClampMode::Std || self.tex_clamp_t != TextureClampMode::Std
    }

    /// Whether alpha-test failures can be observed past the alpha test stage.
    pub fn alpha_test_can_fail_late(&self) -> bool {
        self.has_alpha_test && self.alpha_fail_result != AlphaFailResult::Keep
    }

    /// Packs the descriptor into a 33-bit key.
    pub fn key(&self) -> u64 {
        let mut key = 0u64;
        let mut put = |value: u32, shift: u32| key |= u64::from(value) << shift;

        put(self.tex_source_mode.raw(), SOURCE_MODE_SHIFT);
        put(self.tex_clamp_s.raw(), CLAMP_S_SHIFT);
        put(self.tex_clamp_t.raw(), CLAMP_T_SHIFT);
        put(self.tex_bilinear_filter as u32, BILINEAR_BIT);
        put(self.tex_use_alpha_expansion as u32, ALPHA_EXPANSION_BIT);
        put(self.tex_black_is_transparent as u32, BLACK_TRANSPARENT_BIT);
        put(self.tex_has_alpha as u32, TEX_HAS_ALPHA_BIT);
        put(self.tex_function.raw(), TEX_FUNCTION_SHIFT);
        put(self.has_alpha_test as u32, HAS_ALPHA_TEST_BIT);
        put(self.alpha_test_method.raw(), ALPHA_TEST_METHOD_SHIFT);
        put(self.alpha_fail_result.raw(), ALPHA_FAIL_SHIFT);
        put(self.has_fog as u32, HAS_FOG_BIT);
        put(self.depth_test_method.raw(), DEPTH_TEST_SHIFT);
        put(self.depth_write_enabled as u32, DEPTH_WRITE_BIT);
        put(self.has_alpha_blend as u32, HAS_ALPHA_BLEND_BIT);
        put(self.blend_factor_a.raw(), BLEND_A_SHIFT);
        put(self.blend_factor_b.raw(), BLEND_B_SHIFT);
        put(self.blend_factor_d.raw(), BLEND_D_SHIFT);
        put(self.blend_factor_c.raw(), BLEND_C_SHIFT);

        key
    }

    /// Inverse of [`ShaderCaps::key`].
    pub fn from_key(key: u64) -> Result<Self, CapsError> {
        if key >> KEY_BITS != 0 {
            return Err(CapsError::ReservedBits(key));
        }

        Ok(Self {
            tex_source_mode: TextureSourceMode::from_raw(field(key, SOURCE_MODE_SHIFT, 2))?,
            tex_clamp_s: TextureClampMode::from_raw(field(key, CLAMP_S_SHIFT, 3))?,
            tex_clamp_t: TextureClampMode::from_raw(field(key, CLAMP_T_SHIFT, 3))?,
            tex_bilinear_filter: flag(key, BILINEAR_BIT),
            tex_use_alpha_expansion: flag(key, ALPHA_EXPANSION_BIT),
            tex_black_is_transparent: flag(key, BLACK_TRANSPARENT_BIT),
            tex_has_alpha: flag(key, TEX_HAS_ALPHA_BIT),
            tex_function: TextureFunction::from_raw(field(key, TEX_FUNCTION_SHIFT, 2))?,
            has_alpha_test: flag(key, HAS_ALPHA_TEST_BIT),
            alpha_test_method: AlphaTestMethod::from_raw(field(key, ALPHA_TEST_METHOD_SHIFT, 3))?,
            alpha_fail_result: AlphaFailResult::from_raw(field(key, ALPHA_FAIL_SHIFT, 2))?,
            has_fog: flag(key, HAS_FOG_BIT),
            depth_test_method: DepthTestMethod::from_raw(field(key, DEPTH_TEST_SHIFT, 2))?,
            depth_write_enabled: flag(key, DEPTH_WRITE_BIT),
            has_alpha_blend: flag(key, HAS_ALPHA_BLEND_BIT),
            blend_factor_a: BlendFactorAbd::from_raw(field(key, BLEND_A_SHIFT, 2))?,
            blend_factor_b: BlendFactorAbd::from_raw(field(key, BLEND_B_SHIFT, 2))?,
            blend_factor_d: BlendFactorAbd::from_raw(field(key, BLEND_D_SHIFT, 2))?,
            blend_factor_c: BlendFactorC::from_raw(field(key, BLEND_C_SHIFT, 2))?,
        })
    }
}
