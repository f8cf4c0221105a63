//! TML documents: an indentation-sensitive text format and its checksummed binary
//! image (BTML), both navigated through the same [`Tree`] API.
//!
//! ```
//! use tml::{Cursor, Tree};
//!
//! let doc = tml::parse("level:\n  name: demo\n  weights: 1, 2, 3\n")?;
//! let level = doc.resolve("level").unwrap();
//! assert_eq!(doc.get_str(level, "name"), Ok("demo"));
//!
//! let blob = tml::to_binary(&doc)?;
//! let loaded = tml::from_binary(&blob)?;
//! assert_eq!(loaded.get_int_array(level, "weights"), Ok(&[1, 2, 3][..]));
//! assert_eq!(loaded.child_count(Cursor::ROOT), 1);
//! # Ok::<(), tml::Error>(())
//! ```

pub mod arena;
pub mod binary;
pub mod constants;
pub mod decode;
mod document;
pub mod encode;
pub mod error;
pub mod json;
pub mod num;
pub mod options;
pub mod text;
pub mod tree;

pub use crate::binary::{load_binary_file, write_binary_file, BinaryDocument};
pub use crate::document::Document;
pub use crate::error::{Error, ErrorKind, ErrorStage, Location, LookupError};
pub use crate::json::NodeView;
pub use crate::options::{EncodeOptions, Indent, ParseOptions, WriteOptions};
pub use crate::tree::{Cursor, Tree};

pub type Result<T> = std::result::Result<T, Error>;

pub fn parse(input: &str) -> Result<Document<'_>> {
    parse_with_options(input, &ParseOptions::default())
}

pub fn parse_with_options<'src>(
    input: &'src str,
    options: &ParseOptions,
) -> Result<Document<'src>> {
    decode::parse(input, options)
}

pub fn to_binary<T: Tree + ?Sized>(tree: &T) -> Result<Vec<u8>> {
    to_binary_with_options(tree, &EncodeOptions::default())
}

pub fn to_binary_with_options<T: Tree + ?Sized>(
    tree: &T,
    options: &EncodeOptions,
) -> Result<Vec<u8>> {
    binary::encode(tree, options)
}

pub fn from_binary(bytes: &[u8]) -> Result<BinaryDocument> {
    BinaryDocument::from_bytes(bytes)
}

pub fn to_string<T: Tree + ?Sized>(tree: &T) -> Result<String> {
    to_string_with_options(tree, &WriteOptions::default())
}

pub fn to_string_with_options<T: Tree + ?Sized>(tree: &T, options: &WriteOptions) -> Result<String> {
    encode::to_string(tree, options)
}

pub fn to_value<T: Tree + ?Sized>(tree: &T) -> Result<serde_json::Value> {
    json::to_value(tree).map_err(|err| Error::encode(format!("json view failed: {err}")))
}
