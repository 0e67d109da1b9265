//! `gsgl-shadergen` generates GLSL programs that emulate the PS2 Graphics Synthesizer's
//! fixed-function pixel pipeline.
//!
//! Currently this crate provides:
//! - A capability descriptor ([`ShaderCaps`]) covering every draw-state switch that changes shader
//!   shape, with a compact key for program caches.
//! - Vertex and fragment generators built on a section-based source IR (see [`source`]).
//!   Depth test and blending run in the fragment stage against framebuffer/depth images, inside
//!   a fragment-ordering critical section when the context offers one (see [`ordering`]).
//! - Program assembly over a pluggable compile/link service ([`ShaderGenerator`]), with a `glow`
//!   implementation behind the `gl` feature.
//! - A host-side model of the emitted per-pixel math (see [`reference`]).

pub mod blit;
pub mod caps;
pub mod fragment;
pub mod interface;
pub mod options;
pub mod ordering;
pub mod program;
pub mod reference;
pub mod snippets;
pub mod source;
pub mod vertex;

#[cfg(feature = "gl")]
pub mod gl;

pub use caps::{CapsError, ShaderCaps};
pub use interface::{AttributeLocation, FragmentParams, VertexParams};
pub use options::{GlslVersion, ShaderGenOptions};
pub use ordering::{OrderingExtensions, OrderingMode};
pub use program::{generate_sources, ProgramError, ProgramSources, ShaderBackend, ShaderGenerator};
pub use source::{ShaderSource, ShaderStage};

#[cfg(feature = "gl")]
pub use gl::GlowBackend;
