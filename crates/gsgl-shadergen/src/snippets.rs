//! Single-mode GLSL snippets shared by the fragment generator.

use crate::caps::{AlphaTestMethod, BlendFactorAbd, BlendFactorC, TextureClampMode};

/// Texture axis a clamp snippet applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TexAxis {
    S,
    T,
}

impl TexAxis {
    pub fn swizzle(self) -> &'static str {
        match self {
            TexAxis::S => "s",
            TexAxis::T => "t",
        }
    }
}

/// Software integer AND/OR.
///
/// Region repeat is a literal bitmask operation on the texel coordinate; these loops reproduce it
/// one bit at a time with division only, independent of native integer bit operations.
pub const BITWISE_HELPERS: &str = "\
float bitAnd(int a, int b)
{
    int r = 0;
    int m = min(a, b);
    for(int k = 1; k <= m; k *= 2)
    {
        int ha = a / 2;
        int hb = b / 2;
        if(((a - ha * 2) != 0) && ((b - hb * 2) != 0))
        {
            r += k;
        }
        a = ha;
        b = hb;
    }
    return float(r);
}
float bitOr(int a, int b)
{
    int r = 0;
    int m = max(a, b);
    for(int k = 1; k <= m; k *= 2)
    {
        int ha = a / 2;
        int hb = b / 2;
        if(((a - ha * 2) != 0) || ((b - hb * 2) != 0))
        {
            r += k;
        }
        a = ha;
        b = hb;
    }
    return float(r);
}";

/// The GS color unit multiplies 8-bit values and shifts right by 7 (`0x80` is 1.0).
pub const COMBINE_COLORS_HELPER: &str = "\
float combineColors(float a, float b)
{
    uint aInt = uint(round(a * 255.0));
    uint bInt = uint(round(b * 255.0));
    uint result = min((aInt * bInt) >> 7, 255u);
    return float(result) / 255.0;
}";

/// Texel-space clamp statement for one axis, or `None` when the sampler handles the mode.
///
/// For `RegionRepeat`, `g_clampMin`/`g_clampMax` carry `UMSK`/`UFIX`. For
/// `RegionRepeatSimple` they carry the region size and offset instead.
pub fn clamp_section(mode: TextureClampMode, axis: TexAxis) -> Option<String> {
    let c = axis.swizzle();
    match mode {
        TextureClampMode::Std | TextureClampMode::Clamp => None,
        TextureClampMode::RegionClamp => Some(format!(
            "texCoord.{c} = min(g_clampMax.{c}, max(g_clampMin.{c}, texCoord.{c}));"
        )),
        TextureClampMode::RegionRepeat => Some(format!(
            "texCoord.{c} = bitOr(int(bitAnd(int(texCoord.{c}), int(g_clampMin.{c}))), int(g_clampMax.{c}));"
        )),
        TextureClampMode::RegionRepeatSimple => Some(format!(
            "texCoord.{c} = mod(texCoord.{c}, g_clampMin.{c}) + g_clampMax.{c};"
        )),
    }
}

/// `vec3` expression for a blend A, B or D operand.
pub fn blend_abd_operand(factor: BlendFactorAbd) -> &'static str {
    match factor {
        BlendFactorAbd::Cs => "fragColor.rgb",
        BlendFactorAbd::Cd => "dstColor.rgb",
        BlendFactorAbd::Zero => "vec3(0.0)",
    }
}

/// `float` expression for the blend C operand.
pub fn blend_c_operand(factor: BlendFactorC) -> &'static str {
    match factor {
        BlendFactorC::As => "fragColor.a",
        BlendFactorC::Ad => "dstColor.a",
        BlendFactorC::Fix => "float(g_alphaFix) / 255.0",
    }
}

/// Integer comparison between the quantized alpha and `g_alphaRef`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlphaCompare {
    GreaterEqual,
    Greater,
    NotEqual,
    Less,
    LessEqual,
    Equal,
}

impl AlphaCompare {
    pub fn glsl(self) -> &'static str {
        match self {
            AlphaCompare::GreaterEqual => ">=",
            AlphaCompare::Greater => ">",
            AlphaCompare::NotEqual => "!=",
            AlphaCompare::Less => "<",
            AlphaCompare::LessEqual => "<=",
            AlphaCompare::Equal => "==",
        }
    }

    /// Host evaluation of `alpha <op> reference`.
    pub fn eval(self, alpha: u32, reference: u32) -> bool {
        match self {
            AlphaCompare::GreaterEqual => alpha >= reference,
            AlphaCompare::Greater => alpha > reference,
            AlphaCompare::NotEqual => alpha != reference,
            AlphaCompare::Less => alpha < reference,
            AlphaCompare::LessEqual => alpha <= reference,
            AlphaCompare::Equal => alpha == reference,
        }
    }
}

/// What makes a fragment *fail* the alpha test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlphaFailCondition {
    Constant(bool),
    /// `alpha <op> ref` fails the test.
    Compare(AlphaCompare),
}

/// Indexed by `AlphaTestMethod` encoding.
const ALPHA_FAIL_TABLE: [AlphaFailCondition; 8] = [
    AlphaFailCondition::Constant(true),
    AlphaFailCondition::Constant(false),
    AlphaFailCondition::Compare(AlphaCompare::GreaterEqual),
    AlphaFailCondition::Compare(AlphaCompare::Greater),
    AlphaFailCondition::Compare(AlphaCompare::NotEqual),
    AlphaFailCondition::Compare(AlphaCompare::Less),
    AlphaFailCondition::Compare(AlphaCompare::LessEqual),
    AlphaFailCondition::Compare(AlphaCompare::Equal),
];

pub fn alpha_fail_condition(method: AlphaTestMethod) -> AlphaFailCondition {
    ALPHA_FAIL_TABLE[method.raw() as usize]
}

/// Statements that set `alphaTestFail` from `textureColor.a`.
pub fn alpha_test_statements(method: AlphaTestMethod) -> Vec<String> {
    match alpha_fail_condition(method) {
        AlphaFailCondition::Constant(fail) => vec![format!("alphaTestFail = {fail};")],
        AlphaFailCondition::Compare(op) => vec![
            "uint alphaInt = uint(round(clamp(textureColor.a, 0.0, 1.0) * 255.0));".to_owned(),
            format!("alphaTestFail = (alphaInt {} g_alphaRef);", op.glsl()),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sampler_handled_modes_emit_nothing() {
        assert_eq!(clamp_section(TextureClampMode::Std, TexAxis::S), None);
        assert_eq!(clamp_section(TextureClampMode::Clamp, TexAxis::T), None);
    }

    #[test]
    fn clamp_sections_target_their_axis() {
        assert_eq!(
            clamp_section(TextureClampMode::RegionClamp, TexAxis::T).as_deref(),
            Some("texCoord.t = min(g_clampMax.t, max(g_clampMin.t, texCoord.t));")
        );
        assert_eq!(
            clamp_section(TextureClampMode::RegionRepeat, TexAxis::S).as_deref(),
            Some("texCoord.s = bitOr(int(bitAnd(int(texCoord.s), int(g_clampMin.s))), int(g_clampMax.s));")
        );
        assert_eq!(
            clamp_section(TextureClampMode::RegionRepeatSimple, TexAxis::S).as_deref(),
            Some("texCoord.s = mod(texCoord.s, g_clampMin.s) + g_clampMax.s;")
        );
    }

    #[test]
    fn alpha_fail_table_matches_gs_semantics() {
        use AlphaFailCondition::*;
        let expected = [
            (AlphaTestMethod::Never, Constant(true)),
            (AlphaTestMethod::Always, Constant(false)),
            (AlphaTestMethod::Less, Compare(AlphaCompare::GreaterEqual)),
            (AlphaTestMethod::LessEqual, Compare(AlphaCompare::Greater)),
            (AlphaTestMethod::Equal, Compare(AlphaCompare::NotEqual)),
            (AlphaTestMethod::GreaterEqual, Compare(AlphaCompare::Less)),
            (AlphaTestMethod::Greater, Compare(AlphaCompare::LessEqual)),
            (AlphaTestMethod::NotEqual, Compare(AlphaCompare::Equal)),
        ];
        for (method, condition) in expected {
            assert_eq!(alpha_fail_condition(method), condition, "{method:?}");
        }
    }

    #[test]
    fn comparison_text_matches_host_evaluation() {
        // Each operator is checked below, at and above the reference.
        let cases = [
            (AlphaCompare::GreaterEqual, ">=", [false, true, true]),
            (AlphaCompare::Greater, ">", [false, false, true]),
            (AlphaCompare::NotEqual, "!=", [true, false, true]),
            (AlphaCompare::Less, "<", [true, false, false]),
            (AlphaCompare::LessEqual, "<=", [true, true, false]),
            (AlphaCompare::Equal, "==", [false, true, false]),
        ];
        for (op, text, expected) in cases {
            assert_eq!(op.glsl(), text);
            assert_eq!([op.eval(9, 10), op.eval(10, 10), op.eval(11, 10)], expected, "{op:?}");
        }
    }

    #[test]
    fn constant_alpha_tests_skip_quantization() {
        assert_eq!(
            alpha_test_statements(AlphaTestMethod::Never),
            vec!["alphaTestFail = true;".to_owned()]
        );
        let greater = alpha_test_statements(AlphaTestMethod::Greater);
        assert_eq!(greater.len(), 2);
        assert_eq!(greater[1], "alphaTestFail = (alphaInt <= g_alphaRef);");
    }

    #[test]
    fn blend_operands() {
        assert_eq!(blend_abd_operand(BlendFactorAbd::Cs), "fragColor.rgb");
        assert_eq!(blend_abd_operand(BlendFactorAbd::Cd), "dstColor.rgb");
        assert_eq!(blend_abd_operand(BlendFactorAbd::Zero), "vec3(0.0)");
        assert_eq!(blend_c_operand(BlendFactorC::Fix), "float(g_alphaFix) / 255.0");
    }

    #[test]
    fn bitwise_helpers_text() {
        let expected = [
            "float bitAnd(int a, int b)",
            "{",
            "    int r = 0;",
            "    int m = min(a, b);",
            "    for(int k = 1; k <= m; k *= 2)",
            "    {",
            "        int ha = a / 2;",
            "        int hb = b / 2;",
            "        if(((a - ha * 2) != 0) && ((b - hb * 2) != 0))",
            "        {",
            "            r += k;",
            "        }",
            "        a = ha;",
            "        b = hb;",
            "    }",
            "    return float(r);",
            "}",
            "float bitOr(int a, int b)",
            "{",
            "    int r = 0;",
            "    int m = max(a, b);",
            "    for(int k = 1; k <= m; k *= 2)",
            "    {",
            "        int ha = a / 2;",
            "        int hb = b / 2;",
            "        if(((a - ha * 2) != 0) || ((b - hb * 2) != 0))",
            "        {",
            "            r += k;",
            "        }",
            "        a = ha;",
            "        b = hb;",
            "    }",
            "    return float(r);",
            "}",
        ];
        assert_eq!(BITWISE_HELPERS.lines().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn combine_colors_helper_text() {
        let expected = [
            "float combineColors(float a, float b)",
            "{",
            "    uint aInt = uint(round(a * 255.0));",
            "    uint bInt = uint(round(b * 255.0));",
            "    uint result = min((aInt * bInt) >> 7, 255u);",
            "    return float(result) / 255.0;",
            "}",
        ];
        assert_eq!(COMBINE_COLORS_HELPER.lines().collect::<Vec<_>>(), expected);
    }
}
