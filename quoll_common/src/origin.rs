//! Source locations carried by tokens, data declarations, and diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A `(file, line, column)` source location. Lines and columns are
/// 1-indexed; a default origin means "no source position".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Origin {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Origin {
            file: file.into(),
            line,
            column,
        }
    }

    pub fn none() -> Self {
        Origin::default()
    }

    pub fn is_none(&self) -> bool {
        self.file.is_empty()
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("(no origin)")
        } else {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_file_line_column() {
        let origin = Origin::new("game.src", 12, 3);
        assert_eq!(origin.to_string(), "game.src:12:3");
        assert_eq!(Origin::none().to_string(), "(no origin)");
    }
}
