//! Text front end: estimate, scan, classify, type, and build the node tree.

mod classify;
mod estimate;
pub(crate) mod parser;
mod scan;
mod typer;

pub use estimate::{estimate, Estimate};

use crate::document::Document;
use crate::{Error, ErrorKind, ParseOptions, Result};

pub fn parse<'src>(input: &'src str, options: &ParseOptions) -> Result<Document<'src>> {
    let parsed = parser::parse_into(input, options)?;
    Ok(Document::from_parsed(input, parsed))
}

pub fn parse_slice<'src>(input: &'src [u8], options: &ParseOptions) -> Result<Document<'src>> {
    let text = std::str::from_utf8(input).map_err(|err| {
        Error::parse(ErrorKind::Format, format!("invalid utf-8: {err}"))
    })?;
    parse(text, options)
}
