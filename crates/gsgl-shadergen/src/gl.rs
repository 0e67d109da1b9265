//! [`ShaderBackend`] over a `glow` OpenGL context.

use std::sync::Arc;

use glow::HasContext;
use tracing::debug;

use crate::interface::AttributeLocation;
use crate::ordering::OrderingExtensions;
use crate::program::ShaderBackend;
use crate::source::ShaderStage;

pub struct GlowBackend {
    gl: Arc<glow::Context>,
    extensions: OrderingExtensions,
}

impl GlowBackend {
    /// Captures the context's ordering extensions.
    ///
    /// # Safety
    ///
    /// `gl` must stay current on the calling thread for as long as the backend is used.
    pub unsafe fn new(gl: Arc<glow::Context>) -> Self {
        let extensions =
            OrderingExtensions::from_names(gl.supported_extensions().iter().map(String::as_str));
        debug!(?extensions, "fragment ordering extensions");
        Self { gl, extensions }
    }

    pub fn context(&self) -> &Arc<glow::Context> {
        &self.gl
    }
}

fn gl_stage(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

impl ShaderBackend for GlowBackend {
    type Shader = glow::Shader;
    type Program = glow::Program;

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<glow::Shader, String> {
        let gl = &self.gl;
        unsafe {
            let shader = gl.create_shader(gl_stage(stage))?;
            gl.shader_source(shader, source);
            gl.compile_shader(shader);

            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                return Err(log);
            }
            Ok(shader)
        }
    }

    fn link_program(
        &mut self,
        shaders: &[glow::Shader],
        attributes: &[AttributeLocation],
    ) -> Result<glow::Program, String> {
        let gl = &self.gl;
        unsafe {
            let program = gl.create_program()?;
            for &shader in shaders {
                gl.attach_shader(program, shader);
            }
            for attribute in attributes {
                gl.bind_attrib_location(program, attribute.index(), attribute.name());
            }
            gl.link_program(program);

            for &shader in shaders {
                gl.detach_shader(program, shader);
            }

            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(log);
            }
            Ok(program)
        }
    }

    fn release_shader(&mut self, shader: glow::Shader) {
        unsafe { self.gl.delete_shader(shader) };
    }

    fn ordering_extensions(&self) -> OrderingExtensions {
        self.extensions
    }
}
