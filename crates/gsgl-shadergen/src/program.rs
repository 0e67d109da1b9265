//! Program assembly on top of a compile/link service.

use thiserror::Error;
use tracing::{debug, error, trace, warn};

use crate::blit::{self, BlitSources};
use crate::caps::ShaderCaps;
use crate::interface::AttributeLocation;
use crate::options::ShaderGenOptions;
use crate::ordering::{OrderingExtensions, OrderingMode};
use crate::source::{ShaderSource, ShaderStage};
use crate::{fragment, vertex};

/// Compile/link service of the graphics context.
///
/// Implementations report failures with the driver's info log. They must not retry or patch
/// sources.
pub trait ShaderBackend {
    type Shader: Copy;
    type Program;

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<Self::Shader, String>;

    /// Attaches `shaders`, binds `attributes` to their fixed slots, links, and detaches the
    /// shaders again. On failure the half-built program must already be released.
    fn link_program(
        &mut self,
        shaders: &[Self::Shader],
        attributes: &[AttributeLocation],
    ) -> Result<Self::Program, String>;

    fn release_shader(&mut self, shader: Self::Shader);

    /// Fragment-ordering extensions the context exposes.
    fn ordering_extensions(&self) -> OrderingExtensions;
}

#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("{program} program: {stage} shader failed to compile: {log}")]
    Compile {
        program: &'static str,
        stage: ShaderStage,
        log: String,
    },
    #[error("{program} program failed to link: {log}")]
    Link { program: &'static str, log: String },
}

/// Vertex and fragment source for one capability descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramSources {
    pub vertex: ShaderSource,
    pub fragment: ShaderSource,
}

/// Pure part of [`ShaderGenerator::generate_shader`].
pub fn generate_sources(
    caps: &ShaderCaps,
    ordering: OrderingMode,
    options: &ShaderGenOptions,
) -> ProgramSources {
    ProgramSources {
        vertex: vertex::generate(caps, options),
        fragment: fragment::generate(caps, ordering, options),
    }
}

/// Generates and links programs through a [`ShaderBackend`].
///
/// Programs are handed to the caller; the generator keeps nothing between calls.
pub struct ShaderGenerator<B> {
    backend: B,
    options: ShaderGenOptions,
}

impl<B: ShaderBackend> ShaderGenerator<B> {
    pub fn new(backend: B, options: ShaderGenOptions) -> Self {
        let generator = Self { backend, options };
        if !generator.options.disable_fragment_ordering && !generator.ordering_mode().is_ordered() {
            warn!("no fragment ordering extension; overlapping primitives may blend out of order");
        }
        generator
    }

    pub fn options(&self) -> &ShaderGenOptions {
        &self.options
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Re-evaluated on every call; extension support does not change within a context.
    pub fn ordering_mode(&self) -> OrderingMode {
        if self.options.disable_fragment_ordering {
            return OrderingMode::None;
        }
        OrderingMode::select(self.backend.ordering_extensions())
    }

    pub fn generate_shader(&mut self, caps: &ShaderCaps) -> Result<B::Program, ProgramError> {
        let ordering = self.ordering_mode();
        debug!(key = format_args!("{:#011x}", caps.key()), ?ordering, "generating GS program");

        let sources = generate_sources(caps, ordering, &self.options);
        self.assemble(
            "gs",
            &sources.vertex,
            &sources.fragment,
            &AttributeLocation::PRIMITIVE,
        )
    }

    pub fn generate_present_program(&mut self) -> Result<B::Program, ProgramError> {
        let BlitSources { vertex, fragment } = blit::present(&self.options);
        self.assemble("present", &vertex, &fragment, &AttributeLocation::BLIT)
    }

    pub fn generate_copy_program(&mut self) -> Result<B::Program, ProgramError> {
        let BlitSources { vertex, fragment } = blit::copy(&self.options);
        self.assemble("copy", &vertex, &fragment, &AttributeLocation::BLIT)
    }

    fn assemble(
        &mut self,
        program: &'static str,
        vertex: &ShaderSource,
        fragment: &ShaderSource,
        attributes: &[AttributeLocation],
    ) -> Result<B::Program, ProgramError> {
        let vs = self.compile(program, vertex)?;
        let fs = match self.compile(program, fragment) {
            Ok(fs) => fs,
            Err(err) => {
                self.backend.release_shader(vs);
                return Err(err);
            }
        };

        let linked = self.backend.link_program(&[vs, fs], attributes);
        self.backend.release_shader(vs);
        self.backend.release_shader(fs);

        linked.map_err(|log| {
            error!(program, %log, "program link failed");
            ProgramError::Link { program, log }
        })
    }

    fn compile(
        &mut self,
        program: &'static str,
        source: &ShaderSource,
    ) -> Result<B::Shader, ProgramError> {
        let text = source.render();
        trace!(program, stage = %source.stage(), source = %text, "compiling shader");

        self.backend
            .compile_shader(source.stage(), &text)
            .map_err(|log| {
                error!(program, stage = %source.stage(), %log, "shader compilation failed");
                ProgramError::Compile {
                    program,
                    stage: source.stage(),
                    log,
                }
            })
    }
}
