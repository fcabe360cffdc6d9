//! HTML-to-Markdown conversion with citation rewriting.
//!
//! [`generate`] pre-cleans HTML, converts it with an `htmd`-based converter
//! (or a custom [`MarkdownTransformer`]), runs the cleanup passes, and can
//! rewrite inline links into numbered citations with a reference list.

mod citations;
mod cleanup;
mod convert;
mod generator;

pub use citations::{CitationOutput, convert_to_citations, format_references};
pub use convert::{HtmdConverter, MarkdownOptions, MarkdownTransformer};
pub use generator::{MarkdownGeneratorOptions, generate};
