//! Generation options.
//!
//! Both knobs can be set from the environment, which is mostly useful for driver bring-up:
//! - `GSGL_GLSL_VERSION=420|450` selects the `#version` line.
//! - `GSGL_DISABLE_FRAGMENT_ORDERING=1` ignores every fragment-ordering extension the context
//!   reports, reproducing the unordered (racy) path on hardware that does support ordering.

use tracing::warn;

pub const GLSL_VERSION_ENV: &str = "GSGL_GLSL_VERSION";
pub const DISABLE_FRAGMENT_ORDERING_ENV: &str = "GSGL_DISABLE_FRAGMENT_ORDERING";

/// GLSL language version targeted by every generated stage.
///
/// Image load/store and `GL_ARB_fragment_shader_interlock` both need at least 4.20.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GlslVersion {
    #[default]
    Core420,
    Core450,
}

impl GlslVersion {
    pub fn directive(self) -> &'static str {
        match self {
            GlslVersion::Core420 => "#version 420",
            GlslVersion::Core450 => "#version 450",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "420" => Some(GlslVersion::Core420),
            "450" => Some(GlslVersion::Core450),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ShaderGenOptions {
    pub glsl_version: GlslVersion,
    /// Never select a fragment-ordering mode, even when one is available.
    pub disable_fragment_ordering: bool,
}

impl ShaderGenOptions {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();

        if let Some(raw) = lookup(GLSL_VERSION_ENV) {
            match GlslVersion::parse(&raw) {
                Some(version) => options.glsl_version = version,
                None => warn!(
                    value = raw.as_str(),
                    "ignoring unsupported {GLSL_VERSION_ENV}"
                ),
            }
        }

        options.disable_fragment_ordering = lookup(DISABLE_FRAGMENT_ORDERING_ENV)
            .map(|raw| truthy(&raw))
            .unwrap_or(false);

        options
    }
}

fn truthy(raw: &str) -> bool {
    let v = raw.trim();
    v == "1"
        || v.eq_ignore_ascii_case("true")
        || v.eq_ignore_ascii_case("yes")
        || v.eq_ignore_ascii_case("on")
}
