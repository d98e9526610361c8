use std::fmt;

use crate::external_sort::constants::LINE_SEPARATOR_BYTES;

/// One input line. Opaque to the engine: only equality and byte order matter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Record(String);

impl Record {
    /// Builds a record from a raw line, dropping its `\n` terminator. Any other
    /// byte, `\r` included, belongs to the record.
    pub fn from_line(line: &str) -> Self {
        Record(trim_line_ending(line).to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Encoded length plus the separator it will be written with.
    pub fn estimated_size(&self) -> usize {
        self.0.len() + LINE_SEPARATOR_BYTES
    }
}

fn trim_line_ending(line: &str) -> &str {
    line.strip_suffix('\n').unwrap_or(line)
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Record {
    fn from(value: &str) -> Self {
        Record(value.to_owned())
    }
}

impl From<String> for Record {
    fn from(value: String) -> Self {
        Record(value)
    }
}
