//! The decoding alphabet.

use crate::core::config::ConfigError;
use crate::core::constants::DEFAULT_ALPHABET;
use std::fmt;
use std::str::FromStr;

/// Ordered characters the decoder can emit.
///
/// Index 0 is the start marker and index 1 the end marker; the characters at
/// those positions are placeholders and are never emitted. Every other index
/// maps to exactly one output character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<char>,
}

impl Alphabet {
    /// Builds an alphabet from the characters of `symbols`.
    ///
    /// # Errors
    ///
    /// Fails when fewer than two characters are given, since the start and end
    /// markers always occupy the first two indices.
    pub fn new(symbols: &str) -> Result<Self, ConfigError> {
        let symbols: Vec<char> = symbols.chars().collect();
        if symbols.len() < 2 {
            return Err(ConfigError::InvalidConfig {
                message: format!(
                    "alphabet needs at least 2 characters (start and end markers), got {}",
                    symbols.len()
                ),
            });
        }
        Ok(Self { symbols })
    }

    /// Number of indices, markers included.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Always false: a valid alphabet holds at least the two markers.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Character at `index`, or `None` if out of range.
    pub fn get(&self, index: usize) -> Option<char> {
        self.symbols.get(index).copied()
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_ALPHABET.chars().collect(),
        }
    }
}

impl FromStr for Alphabet {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.symbols.iter().try_for_each(|c| write!(f, "{}", c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_alphabet() {
        let alphabet = Alphabet::default();
        assert_eq!(alphabet.len(), 38);
        assert_eq!(alphabet.get(2), Some('0'));
        assert_eq!(alphabet.get(37), Some('z'));
        assert_eq!(alphabet.get(38), None);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let alphabet: Alphabet = "  äö".parse().unwrap();
        assert_eq!(alphabet.len(), 4);
        assert_eq!(alphabet.get(3), Some('ö'));
        assert_eq!(alphabet.to_string(), "  äö");
    }

    #[test]
    fn test_too_short_rejected() {
        assert!(Alphabet::new("A").is_err());
        assert!(Alphabet::new("").is_err());
        assert!(Alphabet::new("AB").is_ok());
    }
}
