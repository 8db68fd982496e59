//! Marker matching helpers.

/// A literal marker searched for in raw model text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    text: String,
}

impl Marker {
    /// Wrap a marker literal.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The marker literal.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Marker length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the marker is the empty string.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Byte index of the leftmost full occurrence in `haystack`.
    #[inline]
    pub fn find_in(&self, haystack: &str) -> Option<usize> {
        if self.text.is_empty() {
            return None;
        }
        haystack.find(self.text.as_str())
    }

    /// Length of the longest suffix of `haystack` that is a strict prefix
    /// of the marker.
    ///
    /// Only prefixes ending on a `char` boundary of the marker are
    /// considered, so `haystack[..haystack.len() - n]` is always a valid
    /// slice for the returned `n`.
    pub fn partial_suffix_len(&self, haystack: &str) -> usize {
        let max = self.text.len().saturating_sub(1).min(haystack.len());
        (1..=max)
            .rev()
            .filter(|&n| self.text.is_char_boundary(n))
            .find(|&n| haystack.ends_with(&self.text[..n]))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_leftmost() {
        let marker = Marker::new("<think>");
        assert_eq!(marker.find_in("a<think>b<think>"), Some(1));
        assert_eq!(marker.find_in("no marker"), None);
    }

    #[test]
    fn test_partial_suffix() {
        let marker = Marker::new("<think>");
        assert_eq!(marker.partial_suffix_len("ab<thi"), 4);
        assert_eq!(marker.partial_suffix_len("ab<"), 1);
        assert_eq!(marker.partial_suffix_len("ab"), 0);
        // A full marker is not a strict prefix.
        assert_eq!(marker.partial_suffix_len("<think>"), 0);
        assert_eq!(marker.partial_suffix_len("<think"), 6);
    }

    #[test]
    fn test_partial_suffix_prefers_longest() {
        let marker = Marker::new("aab");
        assert_eq!(marker.partial_suffix_len("xaa"), 2);
        assert_eq!(marker.partial_suffix_len("xa"), 1);
    }

    #[test]
    fn test_partial_suffix_respects_char_boundaries() {
        let marker = Marker::new("«思»");
        assert_eq!(marker.partial_suffix_len("text«"), "«".len());
        assert_eq!(marker.partial_suffix_len("text«思"), "«思".len());
        assert_eq!(marker.partial_suffix_len("text"), 0);
    }
}
