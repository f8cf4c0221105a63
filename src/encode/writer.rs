use crate::constants::TRIPLE_QUOTE;
use crate::num::number::{write_float_into, write_int_into};
use crate::text::string::{common_indent, contains_triple_quote, is_bare_safe, is_quote_safe};
use crate::{Error, Result, WriteOptions};

pub(crate) struct Writer {
    buffer: Vec<u8>,
    indent_unit: String,
    indent_cache: Vec<String>,
}

impl Writer {
    pub fn new(options: &WriteOptions) -> Self {
        Self {
            buffer: Vec::new(),
            indent_unit: " ".repeat(options.indent.get_spaces()),
            indent_cache: vec![String::new()],
        }
    }

    pub fn finish(self) -> Result<String> {
        String::from_utf8(self.buffer)
            .map_err(|err| Error::encode(format!("writer produced invalid utf-8: {err}")))
    }

    pub fn write_str(&mut self, s: &str) {
        self.buffer.extend_from_slice(s.as_bytes());
    }

    pub fn write_newline(&mut self) {
        self.buffer.push(b'\n');
    }

    pub fn write_indent(&mut self, depth: usize) {
        if depth == 0 || self.indent_unit.is_empty() {
            return;
        }
        if depth >= self.indent_cache.len() {
            self.extend_indent_cache(depth);
        }
        self.buffer
            .extend_from_slice(self.indent_cache[depth].as_bytes());
    }

    /// A section name or entry key; must read back as the same name.
    pub fn write_name(&mut self, name: &str) -> Result<()> {
        let bytes = name.as_bytes();
        let readable = !name.is_empty()
            && !bytes[0].is_ascii_whitespace()
            && !bytes[bytes.len() - 1].is_ascii_whitespace()
            && !matches!(bytes[0], b'-' | b'#')
            && !bytes.iter().any(|b| matches!(b, b':' | b'=' | b'\n' | b'\r'));
        if !readable {
            return Err(Error::encode(format!("name `{name}` cannot be written")));
        }
        self.write_str(name);
        Ok(())
    }

    pub fn write_int(&mut self, value: i64) {
        write_int_into(&mut self.buffer, value);
    }

    pub fn write_float(&mut self, value: f64) -> Result<()> {
        if write_float_into(&mut self.buffer, value) {
            Ok(())
        } else {
            Err(Error::encode(format!("float {value} has no text form")))
        }
    }

    /// A scalar string: bare, quoted, or as a `"""` block, whichever reads back exactly.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        if is_bare_safe(value) {
            self.write_str(value);
        } else if is_quote_safe(value) {
            self.write_quoted(value);
        } else {
            self.write_block(value)?;
        }
        Ok(())
    }

    /// One element of a string array. Elements never go bare if they could type as numbers;
    /// quotes shield commas but nothing shields a `"` or a line break.
    pub fn write_array_string(&mut self, value: &str) -> Result<()> {
        if is_bare_safe(value) && !value.contains('"') {
            self.write_str(value);
        } else if !value.contains(&['"', '\n', '\r'][..]) {
            self.write_quoted(value);
        } else {
            return Err(Error::encode(format!(
                "array element `{}` cannot be written",
                value.escape_debug()
            )));
        }
        Ok(())
    }

    fn write_quoted(&mut self, value: &str) {
        self.buffer.push(b'"');
        self.write_str(value);
        self.buffer.push(b'"');
    }

    fn write_block(&mut self, value: &str) -> Result<()> {
        if contains_triple_quote(value.as_bytes()) {
            return Err(Error::encode("string containing `\"\"\"` cannot be written"));
        }
        if value.ends_with('\r') {
            return Err(Error::encode(
                "multi-line string ending in a carriage return cannot be written",
            ));
        }
        // Blocks are de-indented on read, so indentation shared by every line would be lost.
        if common_indent(value) > 0 {
            return Err(Error::encode(
                "multi-line string whose lines share indentation cannot be written",
            ));
        }
        self.buffer.extend_from_slice(TRIPLE_QUOTE);
        self.write_newline();
        self.write_str(value);
        self.write_newline();
        self.buffer.extend_from_slice(TRIPLE_QUOTE);
        Ok(())
    }

    fn extend_indent_cache(&mut self, depth: usize) {
        while self.indent_cache.len() <= depth {
            let next = match self.indent_cache.last() {
                Some(prev) => {
                    let mut s = String::with_capacity(prev.len() + self.indent_unit.len());
                    s.push_str(prev);
                    s.push_str(&self.indent_unit);
                    s
                }
                None => String::new(),
            };
            self.indent_cache.push(next);
        }
    }
}
