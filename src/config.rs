//! `actdoc.toml` configuration and file-backed sections.
//!
//! ```toml
//! target = "README.md"
//! link_format = "autolink"
//!
//! [[sections]]
//! id = "description"
//! path = "docs/description.md"
//!
//! [[sections]]
//! id = "usage"
//! code = "docs/workflow.yml"
//! language = "yaml"
//!
//! [[sections]]
//! id = "inputs"
//! table = "docs/inputs.json"
//! ```
//!
//! Relative paths are resolved against the directory holding the
//! configuration file. Sections are registered in the order listed, which
//! fixes where missing sections are inserted.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::content::Content;
use crate::error::{Error, Result};
use crate::io::ResourceReader;
use crate::markdown::{Alignment, Formatter, FormatterConfig, LinkFormat, Table};
use crate::section::{Generator, SectionId, SectionRenderer};

/// Default configuration file name.
pub const CONFIG_FILE: &str = "actdoc.toml";

/// Default target document.
pub const DEFAULT_TARGET: &str = "README.md";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub target: Option<PathBuf>,
    pub link_format: Option<LinkFormat>,
    #[serde(default)]
    pub sections: Vec<SectionConfig>,
}

/// One `[[sections]]` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionConfig {
    pub id: String,
    /// Markdown file passed through as a paragraph.
    pub path: Option<PathBuf>,
    /// File rendered as a fenced code block.
    pub code: Option<PathBuf>,
    /// Info string for `code`.
    pub language: Option<String>,
    /// JSON table description.
    pub table: Option<PathBuf>,
}

/// Where a file-backed section takes its content from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionSource {
    Markdown(PathBuf),
    Code {
        path: PathBuf,
        language: Option<String>,
    },
    Table(PathBuf),
}

impl SectionSource {
    fn path(&self) -> &Path {
        match self {
            SectionSource::Markdown(path) | SectionSource::Table(path) => path,
            SectionSource::Code { path, .. } => path,
        }
    }
}

impl Config {
    /// Parse configuration text.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load `path`; relative section paths are resolved against its
    /// directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let mut config = Self::from_toml(&text)?;
        if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            for section in &mut config.sections {
                section.rebase(base);
            }
            if let Some(target) = config.target.take() {
                config.target = Some(if target.is_absolute() { target } else { base.join(target) });
            }
        }
        tracing::debug!(path = %path.display(), sections = config.sections.len(), "loaded config");
        Ok(config)
    }

    pub fn target(&self) -> &Path {
        self.target.as_deref().unwrap_or(Path::new(DEFAULT_TARGET))
    }

    pub fn formatter_config(&self) -> FormatterConfig {
        FormatterConfig::new().with_link_format(self.link_format.unwrap_or_default())
    }

    /// Build a generator with one file-backed renderer per section.
    pub fn generator(&self, reader: Arc<dyn ResourceReader>) -> Result<Generator> {
        let mut generator = Generator::new(Formatter::with_config(self.formatter_config()));
        for section in &self.sections {
            generator.register(section.renderer(Arc::clone(&reader))?);
        }
        Ok(generator)
    }
}

impl SectionConfig {
    /// A Markdown section, as given by `--section id=path`.
    pub fn markdown(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Validate the entry: a well-formed id and exactly one source.
    pub fn source(&self) -> Result<SectionSource> {
        if self.language.is_some() && self.code.is_none() {
            return Err(Error::Config(format!(
                "section `{}`: `language` only applies to `code`",
                self.id
            )));
        }
        match (&self.path, &self.code, &self.table) {
            (Some(path), None, None) => Ok(SectionSource::Markdown(path.clone())),
            (None, Some(path), None) => Ok(SectionSource::Code {
                path: path.clone(),
                language: self.language.clone(),
            }),
            (None, None, Some(path)) => Ok(SectionSource::Table(path.clone())),
            _ => Err(Error::Config(format!(
                "section `{}` needs exactly one of `path`, `code` or `table`",
                self.id
            ))),
        }
    }

    pub fn renderer(&self, reader: Arc<dyn ResourceReader>) -> Result<FileSection> {
        Ok(FileSection::new(SectionId::new(self.id.clone())?, self.source()?, reader))
    }

    fn rebase(&mut self, base: &Path) {
        for path in [&mut self.path, &mut self.code, &mut self.table].into_iter().flatten() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

/// `id=path` pairs from the command line.
pub fn parse_section_arg(arg: &str) -> std::result::Result<SectionConfig, String> {
    let (id, path) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected ID=PATH, got `{arg}`"))?;
    let id = id.trim();
    SectionId::new(id).map_err(|e| e.to_string())?;
    if path.trim().is_empty() {
        return Err(format!("missing path for section `{id}`"));
    }
    Ok(SectionConfig::markdown(id, path.trim()))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableFile {
    headers: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<String>>,
    #[serde(default)]
    align: Vec<Alignment>,
}

/// A section rendered from a file on each run.
pub struct FileSection {
    id: SectionId,
    source: SectionSource,
    reader: Arc<dyn ResourceReader>,
}

impl std::fmt::Debug for FileSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSection")
            .field("id", &self.id)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl FileSection {
    pub fn new(id: SectionId, source: SectionSource, reader: Arc<dyn ResourceReader>) -> Self {
        Self { id, source, reader }
    }

    fn read(&self) -> Result<Content> {
        let path = self.source.path();
        self.reader.read_resource(path)?.ok_or_else(|| {
            Error::Config(format!("section `{}`: {} does not exist", self.id, path.display()))
        })
    }
}

impl SectionRenderer for FileSection {
    fn id(&self) -> SectionId {
        self.id.clone()
    }

    fn render(&self, formatter: &Formatter) -> Result<Content> {
        let content = self.read()?;
        match &self.source {
            SectionSource::Markdown(_) => formatter.paragraph(content),
            SectionSource::Code { language, .. } => Ok(formatter.code(content, language.as_deref())),
            SectionSource::Table(_) => {
                let file: TableFile = serde_json::from_slice(content.as_bytes())?;
                let mut table = Table::new(file.headers).with_alignments(file.align);
                for row in file.rows {
                    table.push_row(row);
                }
                Ok(formatter.table(&table))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryResources;

    const SAMPLE: &str = r#"
target = "docs/README.md"
link_format = "full"

[[sections]]
id = "description"
path = "description.md"

[[sections]]
id = "usage"
code = "workflow.yml"
language = "yaml"

[[sections]]
id = "inputs"
table = "inputs.json"
"#;

    fn reader() -> Arc<dyn ResourceReader> {
        Arc::new(
            MemoryResources::new()
                .with_file("description.md", "See https://example.com for details.")
                .with_file("workflow.yml", "steps:\n  - uses: me@v1\n")
                .with_file(
                    "inputs.json",
                    r#"{"headers": ["Name", "Required"], "rows": [["token", "yes"]], "align": ["left", "center"]}"#,
                ),
        )
    }

    #[test]
    fn test_parse_config() {
        let config = Config::from_toml(SAMPLE).unwrap();
        assert_eq!(config.target(), Path::new("docs/README.md"));
        assert_eq!(config.link_format, Some(LinkFormat::Full));
        assert_eq!(config.sections.len(), 3);
        assert_eq!(config.sections[1].source().unwrap(), SectionSource::Code {
            path: PathBuf::from("workflow.yml"),
            language: Some("yaml".into()),
        });
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.target(), Path::new(DEFAULT_TARGET));
        assert_eq!(config.formatter_config(), FormatterConfig::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(Config::from_toml("targte = \"x\""), Err(Error::Toml(_))));
    }

    #[test]
    fn test_section_needs_one_source() {
        let both = SectionConfig {
            id: "usage".into(),
            path: Some("a.md".into()),
            code: Some("b.yml".into()),
            ..SectionConfig::default()
        };
        assert!(matches!(both.source(), Err(Error::Config(_))));
        let none = SectionConfig {
            id: "usage".into(),
            ..SectionConfig::default()
        };
        assert!(matches!(none.source(), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_section_id() {
        let section = SectionConfig::markdown("Bad Id", "a.md");
        assert!(matches!(section.renderer(reader()), Err(Error::InvalidSectionId(_))));
    }

    #[test]
    fn test_generator_renders_file_sections() {
        let config = Config::from_toml(SAMPLE).unwrap();
        let sections = config.generator(reader()).unwrap().render().unwrap();

        assert_eq!(
            sections.get(&SectionId::DESCRIPTION).unwrap(),
            "See [https://example.com](https://example.com) for details.\n"
        );
        assert_eq!(
            sections.get(&SectionId::USAGE).unwrap(),
            "```yaml\nsteps:\n  - uses: me@v1\n```\n"
        );
        assert_eq!(
            sections.get(&SectionId::INPUTS).unwrap(),
            "| Name  | Required |\n| ----- | :------: |\n| token |   yes    |\n"
        );
    }

    #[test]
    fn test_missing_file_is_render_error() {
        let section = SectionConfig::markdown("usage", "nope.md");
        let generator = Generator::new(Formatter::default())
            .with_section(section.renderer(reader()).unwrap());
        let err = generator.render().unwrap_err();
        assert!(matches!(err, Error::Render { .. }));
        assert!(err.to_string().contains("nope.md"));
    }

    #[test]
    fn test_parse_section_arg() {
        assert_eq!(
            parse_section_arg("usage=docs/usage.md").unwrap(),
            SectionConfig::markdown("usage", "docs/usage.md")
        );
        assert!(parse_section_arg("usage").is_err());
        assert!(parse_section_arg("Usage=x.md").is_err());
        assert!(parse_section_arg("usage=").is_err());
    }

    #[test]
    fn test_load_rebases_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, SAMPLE).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.target(), dir.path().join("docs/README.md"));
        assert_eq!(config.sections[0].path.as_deref(), Some(dir.path().join("description.md").as_path()));
    }
}
