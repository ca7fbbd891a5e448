//! # actdoc
//!
//! Idempotent generation of Markdown documentation for CI actions.
//!
//! ## Features
//!
//! - Markdown primitives that escape what they emit: headings, code fences
//!   sized to their content, aligned tables, links, badges and lists
//! - Marker-delimited sections that are replaced in place on every run
//! - Hand-written text outside the markers is preserved byte for byte
//! - Regenerating an up-to-date document is a no-op
//!
//! ## Quick Start
//!
//! ```
//! use actdoc::{Content, Formatter, Generator, Table};
//! use actdoc::section::{FnSection, SectionId};
//!
//! let generator = Generator::new(Formatter::default()).with_section(FnSection::new(
//!     SectionId::INPUTS,
//!     |f: &Formatter| {
//!         let table = Table::new(["Name", "Required"]).with_row(["token", "yes"]);
//!         Ok(f.table(&table))
//!     },
//! ));
//!
//! let readme = Content::from("# My Action\n\nHand-written intro.\n");
//! let first = generator.generate(Some(&readme)).unwrap().content;
//! assert!(first.starts_with("# My Action\n\nHand-written intro.\n"));
//!
//! // A second run changes nothing.
//! let second = generator.generate(Some(&first)).unwrap().content;
//! assert_eq!(first, second);
//! ```
//!
//! ## Working with Sections
//!
//! The [`section::merge`] function is the engine behind [`Generator`] and can
//! be driven directly with a [`section::RenderedSections`] map:
//!
//! ```
//! use actdoc::Content;
//! use actdoc::section::{RenderedSections, SectionId, merge};
//!
//! let existing = Content::from("intro\n<!-- usage:start -->\nstale\n<!-- usage:end -->\n");
//! let sections = RenderedSections::new().with(SectionId::USAGE, "");
//!
//! // Empty fresh content removes the section and its markers.
//! assert_eq!(merge(Some(&existing), &sections).content, "intro\n");
//! ```

pub mod content;
pub mod error;
pub mod io;
pub mod markdown;
pub mod section;

#[cfg(feature = "cli")]
pub mod config;

pub use content::Content;
pub use error::{Error, Result};
pub use io::{FsResources, MemoryResources, ResourceReader, ResourceWriter};
pub use markdown::{Formatter, FormatterConfig, LinkFormat, Table};
pub use section::{GenerateReport, Generator, MergeOutcome, SectionId, WriteMode};
