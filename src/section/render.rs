//! Section renderers and the generator that drives them.

use std::fmt;
use std::path::Path;

use super::{MergeOutcome, MergeWarning, RenderedSections, SectionId, merge};
use crate::content::Content;
use crate::error::{Error, Result};
use crate::io::{ResourceReader, ResourceWriter};
use crate::markdown::Formatter;

/// Produces the fresh content of one section.
pub trait SectionRenderer: Send + Sync {
    fn id(&self) -> SectionId;

    /// Render the section body. Returning empty content removes the section
    /// from the document.
    fn render(&self, formatter: &Formatter) -> Result<Content>;
}

/// A section with fixed content.
#[derive(Debug, Clone)]
pub struct StaticSection {
    id: SectionId,
    content: Content,
}

impl StaticSection {
    pub fn new(id: SectionId, content: impl Into<Content>) -> Self {
        Self {
            id,
            content: content.into(),
        }
    }
}

impl SectionRenderer for StaticSection {
    fn id(&self) -> SectionId {
        self.id.clone()
    }

    fn render(&self, _formatter: &Formatter) -> Result<Content> {
        Ok(self.content.clone())
    }
}

/// A section rendered by a closure.
pub struct FnSection<F> {
    id: SectionId,
    render: F,
}

impl<F> FnSection<F>
where
    F: Fn(&Formatter) -> Result<Content> + Send + Sync,
{
    pub fn new(id: SectionId, render: F) -> Self {
        Self { id, render }
    }
}

impl<F> fmt::Debug for FnSection<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSection").field("id", &self.id).finish_non_exhaustive()
    }
}

impl<F> SectionRenderer for FnSection<F>
where
    F: Fn(&Formatter) -> Result<Content> + Send + Sync,
{
    fn id(&self) -> SectionId {
        self.id.clone()
    }

    fn render(&self, formatter: &Formatter) -> Result<Content> {
        (self.render)(formatter)
    }
}

/// Whether [`Generator::generate_resource`] may modify the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    #[default]
    Write,
    /// Compute the result and report whether it differs, without writing.
    Check,
}

/// Outcome of [`Generator::generate_resource`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateReport {
    /// The merged document differs from what was on disk.
    pub changed: bool,
    /// The target was rewritten.
    pub written: bool,
    pub warnings: Vec<MergeWarning>,
}

/// Renders registered sections and merges them into a target document.
///
/// # Examples
///
/// ```
/// use actdoc::{Content, Formatter, Generator};
/// use actdoc::section::{SectionId, StaticSection};
///
/// let generator = Generator::new(Formatter::default())
///     .with_section(StaticSection::new(SectionId::USAGE, "run it"));
/// let outcome = generator.generate(Some(&Content::from("# Title\n"))).unwrap();
/// assert_eq!(
///     outcome.content,
///     "# Title\n<!-- usage:start -->\n\nrun it\n\n<!-- usage:end -->\n"
/// );
/// ```
pub struct Generator {
    formatter: Formatter,
    renderers: Vec<Box<dyn SectionRenderer>>,
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<SectionId> = self.renderers.iter().map(|r| r.id()).collect();
        f.debug_struct("Generator")
            .field("formatter", &self.formatter)
            .field("sections", &ids)
            .finish()
    }
}

impl Generator {
    pub fn new(formatter: Formatter) -> Self {
        Self {
            formatter,
            renderers: Vec::new(),
        }
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    /// Add a renderer. A later renderer for the same id replaces the
    /// earlier one's output but keeps its position.
    pub fn register(&mut self, renderer: impl SectionRenderer + 'static) {
        self.renderers.push(Box::new(renderer));
    }

    pub fn with_section(mut self, renderer: impl SectionRenderer + 'static) -> Self {
        self.register(renderer);
        self
    }

    pub fn section_ids(&self) -> Vec<SectionId> {
        self.renderers.iter().map(|r| r.id()).collect()
    }

    /// Render every registered section, in registration order.
    pub fn render(&self) -> Result<RenderedSections> {
        let mut sections = RenderedSections::new();
        for renderer in &self.renderers {
            let id = renderer.id();
            let content = renderer.render(&self.formatter).map_err(|e| Error::Render {
                section: id.to_string(),
                message: e.to_string(),
            })?;
            sections.insert(id, content);
        }
        Ok(sections)
    }

    /// Render all sections and merge them into `existing`.
    pub fn generate(&self, existing: Option<&Content>) -> Result<MergeOutcome> {
        let sections = self.render()?;
        let outcome = merge(existing, &sections);
        for warning in &outcome.warnings {
            tracing::warn!(%warning, "merge warning");
        }
        Ok(outcome)
    }

    /// Read `path`, merge, and write it back if the result differs.
    pub fn generate_resource<R>(&self, io: &R, path: &Path, mode: WriteMode) -> Result<GenerateReport>
    where
        R: ResourceReader + ResourceWriter + ?Sized,
    {
        let existing = io.read_resource(path)?;
        let outcome = self.generate(existing.as_ref())?;

        let changed = match &existing {
            Some(current) => *current != outcome.content,
            None => !outcome.content.is_empty(),
        };
        let written = changed && mode == WriteMode::Write;
        if written {
            io.write_resource(path, &outcome.content)?;
            tracing::info!(path = %path.display(), bytes = outcome.content.len(), "updated");
        } else {
            tracing::debug!(path = %path.display(), changed, "not written");
        }

        Ok(GenerateReport {
            changed,
            written,
            warnings: outcome.warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryResources;

    fn generator() -> Generator {
        Generator::new(Formatter::default())
            .with_section(StaticSection::new(SectionId::INPUTS, "inputs table"))
            .with_section(FnSection::new(SectionId::USAGE, |f: &Formatter| {
                Ok(f.code("uses: me@v1", Some("yaml")))
            }))
    }

    #[test]
    fn test_render_collects_sections_in_order() {
        let sections = generator().render().unwrap();
        let ids: Vec<&SectionId> = sections.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![&SectionId::INPUTS, &SectionId::USAGE]);
        assert_eq!(
            sections.get(&SectionId::USAGE).unwrap(),
            "```yaml\nuses: me@v1\n```\n"
        );
    }

    #[test]
    fn test_render_error_names_section() {
        let generator = Generator::new(Formatter::default()).with_section(FnSection::new(
            SectionId::OUTPUTS,
            |_: &Formatter| Err(Error::Config("boom".into())),
        ));
        let err = generator.render().unwrap_err();
        assert!(matches!(err, Error::Render { ref section, .. } if section == "outputs"));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_generate_inserts_in_registration_order() {
        let existing = Content::from("# Action
<!-- usage:start -->
old
<!-- usage:end -->
");
        let outcome = generator().generate(Some(&existing)).unwrap();
        let text = outcome.content.to_string();
        let inputs = text.find("<!-- inputs:start -->").unwrap();
        let usage = text.find("<!-- usage:start -->").unwrap();
        assert!(text.starts_with("# Action\n"));
        assert!(inputs < usage);
        assert!(!text.contains("old"));
    }

    #[test]
    fn test_generate_resource_writes_then_is_stable() {
        let io = MemoryResources::new().with_file("README.md", "# Action\n");
        let path = Path::new("README.md");

        let first = generator().generate_resource(&io, path, WriteMode::Write).unwrap();
        assert!(first.changed && first.written);
        let written = io.get(path).unwrap();
        assert!(written.starts_with("# Action\n"));

        let second = generator().generate_resource(&io, path, WriteMode::Write).unwrap();
        assert!(!second.changed && !second.written);
        assert_eq!(io.get(path).unwrap(), written);
    }

    #[test]
    fn test_check_mode_never_writes() {
        let io = MemoryResources::new();
        let path = Path::new("README.md");
        let report = generator().generate_resource(&io, path, WriteMode::Check).unwrap();
        assert!(report.changed);
        assert!(!report.written);
        assert_eq!(io.get(path), None);
    }

    #[test]
    fn test_generate_reports_duplicate_warning() {
        let existing = Content::from(
            "<!-- inputs:start -->\na\n<!-- inputs:end -->\n<!-- inputs:start -->\nb\n<!-- inputs:end -->\n",
        );
        let outcome = generator().generate(Some(&existing)).unwrap();
        assert_eq!(outcome.warnings, vec![MergeWarning::DuplicateSection(SectionId::INPUTS)]);
    }
}
