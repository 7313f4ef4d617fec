use crate::error::DiagramError;
use std::collections::HashMap;
use tracing::trace;

/// Sequential id generator keeping one counter per prefix.
#[derive(Debug, Clone, Default)]
pub struct Guid {
    counters: HashMap<String, u64>,
}

impl Guid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next id for `prefix`, e.g. `n0`, `n1`, `n2`.
    pub fn next(&mut self, prefix: &str) -> Result<String, DiagramError> {
        validate_prefix(prefix)?;
        let counter = self.counters.entry(prefix.to_string()).or_insert(0);
        let id = format!("{prefix}{counter}");
        *counter += 1;
        trace!(id = %id, "generated id");
        Ok(id)
    }

    /// Splits an id into its prefix and numeric value.
    pub fn parse(id: &str) -> Result<(String, u64), DiagramError> {
        let digits_at = id
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| DiagramError::InvalidId(id.to_string()))?;
        let (prefix, digits) = id.split_at(digits_at);
        if prefix.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(DiagramError::InvalidId(id.to_string()));
        }
        let value = digits
            .parse::<u64>()
            .map_err(|_| DiagramError::InvalidId(id.to_string()))?;
        Ok((prefix.to_string(), value))
    }

    /// Moves the counter of the id's prefix past the id's value.
    pub fn update(&mut self, id: &str) -> Result<(), DiagramError> {
        let (prefix, value) = Self::parse(id)?;
        let counter = self.counters.entry(prefix).or_insert(0);
        *counter = (*counter).max(value + 1);
        Ok(())
    }

    pub fn peek(&self, prefix: &str) -> u64 {
        self.counters.get(prefix).copied().unwrap_or(0)
    }
}

fn validate_prefix(prefix: &str) -> Result<(), DiagramError> {
    if prefix.is_empty() || prefix.chars().any(|c| c.is_ascii_digit() || c.is_whitespace()) {
        return Err(DiagramError::InvalidPrefix(prefix.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_is_sequential_per_prefix() {
        let mut guid = Guid::new();
        assert_eq!(guid.next("n").unwrap(), "n0");
        assert_eq!(guid.next("n").unwrap(), "n1");
        assert_eq!(guid.next("e").unwrap(), "e0");
        assert_eq!(guid.next("n").unwrap(), "n2");
    }

    #[test]
    fn parses_ids() {
        let cases = [
            ("n0", Some(("n", 0))),
            ("e42", Some(("e", 42))),
            ("node17", Some(("node", 17))),
            ("n", None),
            ("42", None),
            ("n4x", None),
            ("", None),
        ];

        for (id, expected) in cases {
            let parsed = Guid::parse(id).ok();
            let expected = expected.map(|(prefix, value)| (prefix.to_string(), value));
            assert_eq!(parsed, expected, "parse({id:?})");
        }
    }

    #[test]
    fn update_skips_loaded_ids() {
        let mut guid = Guid::new();
        guid.update("n7").unwrap();
        guid.update("n3").unwrap();
        assert_eq!(guid.next("n").unwrap(), "n8");
        assert!(guid.update("bogus").is_err());
    }

    #[test]
    fn rejects_bad_prefixes() {
        let mut guid = Guid::new();
        assert_eq!(
            guid.next(""),
            Err(DiagramError::InvalidPrefix(String::new()))
        );
        assert!(guid.next("n1").is_err());
    }
}
