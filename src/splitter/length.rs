/// Measures text in the unit chunk sizes are expressed in.
pub trait LengthFunction: Send + Sync {
    fn measure(&self, text: &str) -> usize;

    /// Short name used in debug output
    fn name(&self) -> &'static str {
        "custom"
    }

    /// True when the length of joined text equals the sum of its parts.
    ///
    /// The merge step keeps a running sum for additive measures and
    /// re-measures the joined window text for everything else.
    fn is_additive(&self) -> bool {
        false
    }
}

impl<F> LengthFunction for F
where
    F: Fn(&str) -> usize + Send + Sync,
{
    fn measure(&self, text: &str) -> usize {
        self(text)
    }
}

/// Unicode scalar count (the default)
#[derive(Debug, Clone, Copy, Default)]
pub struct CharCount;

impl LengthFunction for CharCount {
    fn measure(&self, text: &str) -> usize {
        text.chars().count()
    }

    fn name(&self) -> &'static str {
        "chars"
    }

    fn is_additive(&self) -> bool {
        true
    }
}

/// UTF-8 byte count
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteCount;

impl LengthFunction for ByteCount {
    fn measure(&self, text: &str) -> usize {
        text.len()
    }

    fn name(&self) -> &'static str {
        "bytes"
    }

    fn is_additive(&self) -> bool {
        true
    }
}

/// Rough token estimate: one token per four characters, rounded up
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatedTokens;

impl LengthFunction for EstimatedTokens {
    fn measure(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }

    fn name(&self) -> &'static str {
        "estimated-tokens"
    }
}

#[cfg(test)]
mod length_tests {
    use super::*;

    #[test]
    fn test_char_count_is_unicode_aware() {
        assert_eq!(CharCount.measure("héllo"), 5);
        assert_eq!(ByteCount.measure("héllo"), 6);
    }

    #[test]
    fn test_token_estimation() {
        assert_eq!(EstimatedTokens.measure(""), 0);
        assert_eq!(EstimatedTokens.measure("test"), 1);
        assert_eq!(EstimatedTokens.measure("test test"), 3);
        assert_eq!(EstimatedTokens.measure(&"x".repeat(8000)), 2000);
    }

    #[test]
    fn test_closure_as_length_function() {
        let words = |text: &str| text.split_whitespace().count();
        assert_eq!(words.measure("one two three"), 3);
        assert_eq!(words.name(), "custom");
        assert!(!words.is_additive());
    }

    #[test]
    fn test_only_counts_are_additive() {
        assert!(CharCount.is_additive());
        assert!(ByteCount.is_additive());
        // "ab" + "c" is 1 + 1 estimated tokens, but "abc" is 1
        assert!(!EstimatedTokens.is_additive());
    }
}
