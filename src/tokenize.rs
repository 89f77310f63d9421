use crate::error::{SortError, SortResult};

/// Split `stem` on the first delimiter (in configured order) that yields at
/// least `min_tokens` tokens. Tokens are never trimmed; consecutive delimiters
/// produce empty tokens.
pub fn tokenize(stem: &str, delimiters: &[char], min_tokens: usize) -> SortResult<Vec<String>> {
    delimiters
        .iter()
        .map(|delimiter| stem.split(*delimiter).map(String::from).collect::<Vec<_>>())
        .find(|tokens| tokens.len() >= min_tokens)
        .ok_or_else(|| SortError::InsufficientTokens(stem.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_first_delimiter_wins() {
        let tokens = tokenize("Show.Name.S02E05.1080p", &['.', ' '], 3).unwrap();
        assert_eq!(tokens, vec!["Show", "Name", "S02E05", "1080p"]);
    }

    #[test]
    fn test_tokenize_falls_through_to_next_delimiter() {
        let tokens = tokenize("Show Name S02E05", &['.', ' '], 3).unwrap();
        assert_eq!(tokens, vec!["Show", "Name", "S02E05"]);
    }

    #[test]
    fn test_tokenize_keeps_surrounding_content() {
        let tokens = tokenize("Show - S01E01 - Pilot", &[' '], 3).unwrap();
        assert_eq!(tokens, vec!["Show", "-", "S01E01", "-", "Pilot"]);

        let tokens = tokenize("Show_ Name_S01E01", &['_'], 3).unwrap();
        assert_eq!(tokens, vec!["Show", " Name", "S01E01"]);
    }

    #[test]
    fn test_tokenize_empty_tokens_between_delimiters() {
        let tokens = tokenize("Show..S01E01", &['.'], 3).unwrap();
        assert_eq!(tokens, vec!["Show", "", "S01E01"]);
    }

    #[test]
    fn test_tokenize_insufficient_tokens() {
        let result = tokenize("Movie", &['.', ' ', '_'], 2);
        assert!(matches!(result, Err(SortError::InsufficientTokens(stem)) if stem == "Movie"));
    }

    #[test]
    fn test_tokenize_no_delimiters() {
        assert!(tokenize("Show.S01E01", &[], 1).is_err());
    }
}
