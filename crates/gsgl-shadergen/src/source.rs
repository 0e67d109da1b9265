//! Structured shader source.
//!
//! Generators build a [`ShaderSource`] out of named [`Section`]s and only render it to text at the
//! end, so tests can look at one pipeline stage without matching whole programs.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        })
    }
}

/// Pipeline stages, in the order they must appear in a program.
///
/// `Declarations` and `Helpers` live at global scope, everything else inside `main`. The vertex
/// stage and the blit programs only use `Declarations` and `Main`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SectionKind {
    Declarations,
    Helpers,
    /// Straight-line body of programs without a fragment pipeline.
    Main,
    /// Depth recovery and the perspective divide of the texture coordinate.
    Projection,
    TexCoordClamp,
    TextureSample,
    AlphaOverride,
    Combine,
    AlphaTest,
    Fog,
    BeginCriticalSection,
    DepthTest,
    DepthWrite,
    ColorWrite,
    /// Closes the critical section and drops the native fragment output.
    Finish,
}

impl SectionKind {
    pub fn is_global(self) -> bool {
        matches!(self, SectionKind::Declarations | SectionKind::Helpers)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    kind: SectionKind,
    lines: Vec<String>,
}

impl Section {
    pub fn new(kind: SectionKind) -> Self {
        Self {
            kind,
            lines: Vec::new(),
        }
    }

    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    /// Appends a multi-line block, one entry per line.
    pub fn block(&mut self, text: &str) -> &mut Self {
        self.lines.extend(text.lines().map(str::to_owned));
        self
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderSource {
    stage: ShaderStage,
    sections: Vec<Section>,
}

impl ShaderSource {
    pub fn new(stage: ShaderStage) -> Self {
        Self {
            stage,
            sections: Vec::new(),
        }
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Appends a section. Empty sections are dropped.
    ///
    /// # Panics
    ///
    /// If `section` does not come strictly after the last pushed section.
    pub fn push(&mut self, section: Section) {
        if let Some(last) = self.sections.last() {
            assert!(
                last.kind < section.kind,
                "section {:?} pushed after {:?}",
                section.kind,
                last.kind
            );
        }
        if !section.is_empty() {
            self.sections.push(section);
        }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn has_section(&self, kind: SectionKind) -> bool {
        self.section(kind).is_some()
    }

    /// Position of the first body line containing `needle`, counted across all sections.
    pub fn find_line(&self, needle: &str) -> Option<usize> {
        self.sections
            .iter()
            .flat_map(|s| s.lines.iter())
            .position(|line| line.contains(needle))
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let (globals, body): (Vec<&Section>, Vec<&Section>) =
            self.sections.iter().partition(|s| s.kind.is_global());

        for section in globals {
            for line in &section.lines {
                out.push_str(line);
                out.push('\n');
            }
        }

        out.push_str("void main()\n{\n");
        for section in body {
            for line in &section.lines {
                if !line.is_empty() {
                    out.push_str("    ");
                }
                out.push_str(line);
                out.push('\n');
            }
        }
        out.push_str("}\n");
        out
    }
}

impl fmt::Display for ShaderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
