// ABOUTME: Symbol type identifying variables throughout the pipeline

use std::fmt;

/// A named variable. Symbols are value-like: freely cloned, compared and
/// hashed by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Symbol(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Symbol::new(name)
    }
}

impl From<String> for Symbol {
    fn from(name: String) -> Self {
        Symbol(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_display() {
        assert_eq!(format!("{}", Symbol::new("total")), "total");
    }

    #[test]
    fn test_symbol_identity() {
        assert_eq!(Symbol::new("x"), Symbol::from("x"));
        assert_ne!(Symbol::new("x"), Symbol::new("y"));
    }
}
