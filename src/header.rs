// Header index. Built once per stream when a header row is present;
// duplicate names resolve to the first ordinal.

use std::collections::HashMap;

/// Case sensitivity mode for header name lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderCase {
    Sensitive,
    InsensitiveAscii,
}

#[derive(Debug, Clone)]
pub struct HeaderIndex {
    names: Vec<String>,
    lookup: HashMap<String, usize>,
    case: HeaderCase,
}

impl HeaderIndex {
    /// Build from decoded header strings. Case-sensitive by default; the
    /// lookup map key is always stored as-is, with case folding applied at
    /// query time so the original header text (`names`) is preserved for
    /// diagnostics.
    pub fn new(names: Vec<String>) -> Self {
        Self::with_case(names, HeaderCase::Sensitive)
    }

    pub fn with_case(names: Vec<String>, case: HeaderCase) -> Self {
        let mut lookup = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            let key = match case {
                HeaderCase::Sensitive => name.clone(),
                HeaderCase::InsensitiveAscii => name.to_ascii_lowercase(),
            };
            // First occurrence wins; later duplicates remain reachable by
            // ordinal only.
            lookup.entry(key).or_insert(i);
        }
        HeaderIndex { names, lookup, case }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn ordinal(&self, name: &str) -> Option<usize> {
        let key = match self.case {
            HeaderCase::Sensitive => name.to_string(),
            HeaderCase::InsensitiveAscii => name.to_ascii_lowercase(),
        };
        self.lookup.get(&key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_headers_resolve_to_first_ordinal() {
        let idx = HeaderIndex::new(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(idx.ordinal("a"), Some(0));
    }

    #[test]
    fn lookup_is_case_sensitive_by_default() {
        let idx = HeaderIndex::new(vec!["Name".into()]);
        assert_eq!(idx.ordinal("Name"), Some(0));
        assert_eq!(idx.ordinal("name"), None);
    }

    #[test]
    fn insensitive_mode_folds_ascii_case() {
        let idx = HeaderIndex::with_case(vec!["Name".into()], HeaderCase::InsensitiveAscii);
        assert_eq!(idx.ordinal("name"), Some(0));
        assert_eq!(idx.ordinal("NAME"), Some(0));
    }
}
