//! Fragment-invocation ordering.
//!
//! The framebuffer and depth buffer are plain images, so two fragments landing on the same pixel
//! race on their read-modify-write unless the driver serializes them. The extensions below turn a
//! region of the fragment shader into a per-pixel critical section that executes in primitive
//! submission order. Without any of them the race is accepted: overlapping primitives in a single
//! draw may blend or depth-test out of order.

use bitflags::bitflags;

bitflags! {
    /// Fragment-ordering extensions reported by the context.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct OrderingExtensions: u8 {
        const ARB_FRAGMENT_SHADER_INTERLOCK = 1 << 0;
        const INTEL_FRAGMENT_SHADER_ORDERING = 1 << 1;
        const NV_FRAGMENT_SHADER_INTERLOCK = 1 << 2;
    }
}

impl OrderingExtensions {
    const NAMES: [(&'static str, OrderingExtensions); 3] = [
        (
            "GL_ARB_fragment_shader_interlock",
            OrderingExtensions::ARB_FRAGMENT_SHADER_INTERLOCK,
        ),
        (
            "GL_INTEL_fragment_shader_ordering",
            OrderingExtensions::INTEL_FRAGMENT_SHADER_ORDERING,
        ),
        (
            "GL_NV_fragment_shader_interlock",
            OrderingExtensions::NV_FRAGMENT_SHADER_INTERLOCK,
        ),
    ];

    /// Collects the ordering extensions out of a full extension list. Unrelated names are ignored.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut found = Self::empty();
        for name in names {
            for (ext_name, flag) in Self::NAMES {
                if name == ext_name {
                    found |= flag;
                }
            }
        }
        found
    }
}

/// How (and whether) the fragment stage brackets its image accesses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OrderingMode {
    /// Unordered; overlapping fragments race.
    #[default]
    None,
    /// `GL_ARB_fragment_shader_interlock` with `pixel_interlock_ordered`.
    ArbInterlock,
    /// `GL_INTEL_fragment_shader_ordering`; ordering lasts until the invocation ends.
    IntelOrdering,
    /// `GL_NV_fragment_shader_interlock`. Renderable, but [`OrderingMode::select`] never picks it:
    /// drivers exposing it also expose the ARB variant.
    NvInterlock,
}

impl OrderingMode {
    /// Preference order: ARB interlock, then Intel ordering, then nothing.
    pub fn select(available: OrderingExtensions) -> Self {
        if available.contains(OrderingExtensions::ARB_FRAGMENT_SHADER_INTERLOCK) {
            OrderingMode::ArbInterlock
        } else if available.contains(OrderingExtensions::INTEL_FRAGMENT_SHADER_ORDERING) {
            OrderingMode::IntelOrdering
        } else {
            OrderingMode::None
        }
    }

    pub fn is_ordered(self) -> bool {
        self != OrderingMode::None
    }

    /// Lines emitted right after `#version`.
    pub fn declarations(self) -> &'static [&'static str] {
        match self {
            OrderingMode::None => &[],
            OrderingMode::ArbInterlock => &[
                "#extension GL_ARB_fragment_shader_interlock : enable",
                "layout(pixel_interlock_ordered) in;",
            ],
            OrderingMode::IntelOrdering => &["#extension GL_INTEL_fragment_shader_ordering : enable"],
            OrderingMode::NvInterlock => &[
                "#extension GL_NV_fragment_shader_interlock : enable",
                "layout(pixel_interlock_ordered) in;",
            ],
        }
    }

    pub fn begin_statement(self) -> Option<&'static str> {
        match self {
            OrderingMode::None => None,
            OrderingMode::ArbInterlock => Some("beginInvocationInterlockARB();"),
            OrderingMode::IntelOrdering => Some("beginFragmentShaderOrderingINTEL();"),
            OrderingMode::NvInterlock => Some("beginInvocationInterlockNV();"),
        }
    }

    /// The Intel extension has no explicit end; its ordered region closes with the invocation.
    pub fn end_statement(self) -> Option<&'static str> {
        match self {
            OrderingMode::None | OrderingMode::IntelOrdering => None,
            OrderingMode::ArbInterlock => Some("endInvocationInterlockARB();"),
            OrderingMode::NvInterlock => Some("endInvocationInterlockNV();"),
        }
    }
}
