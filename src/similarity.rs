// 📏 Similarity Scorer - Levenshtein-based name similarity
//
// similarity(a, b) = (L - distance) / L, where L is the longer length in
// characters. Comparison is case-insensitive.

/// Similarity in [0, 1] between two strings
///
/// Example:
/// - similarity("JOHN", "john") = 1.0
/// - similarity("AMAZON", "AMAZN") ≈ 0.83
/// - similarity("ACME", "") = 0.0
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a_upper = a.to_uppercase();
    let b_upper = b.to_uppercase();

    if a_upper == b_upper {
        return 1.0;
    }

    let longest = a_upper.chars().count().max(b_upper.chars().count());
    let distance = levenshtein_distance(&a_upper, &b_upper);

    longest.saturating_sub(distance) as f64 / longest as f64
}

/// Levenshtein distance between two strings, case-insensitive
///
/// Minimum number of single-character edits (insertions, deletions,
/// substitutions) to change one string into the other.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().flat_map(char::to_uppercase).collect();
    let s2_chars: Vec<char> = s2.chars().flat_map(char::to_uppercase).collect();

    let len1 = s1_chars.len();
    let len2 = s2_chars.len();

    if len1 == 0 {
        return len2;
    }
    if len2 == 0 {
        return len1;
    }

    // Two rolling rows instead of the full matrix
    let mut previous: Vec<usize> = (0..=len2).collect();
    let mut current = vec![0; len2 + 1];

    for i in 1..=len1 {
        current[0] = i;

        for j in 1..=len2 {
            let cost = if s1_chars[i - 1] == s2_chars[j - 1] { 0 } else { 1 };

            current[j] = (previous[j] + 1) // deletion
                .min(current[j - 1] + 1) // insertion
                .min(previous[j - 1] + cost); // substitution
        }

        std::mem::swap(&mut previous, &mut current);
    }

    previous[len2]
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_basic() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("same", "same"), 0);
    }

    #[test]
    fn test_levenshtein_case_insensitive() {
        assert_eq!(levenshtein_distance("Starbucks", "STARBUCKS"), 0);
        assert_eq!(levenshtein_distance("starbucks", "STARBUCK"), 1);
    }

    #[test]
    fn test_similarity_identity() {
        assert_eq!(similarity("JOHN", "JOHN"), 1.0);
        assert_eq!(similarity("John", "JOHN"), 1.0);
    }

    #[test]
    fn test_similarity_empty() {
        assert_eq!(similarity("ACME", ""), 0.0);
        assert_eq!(similarity("", "ACME"), 0.0);
        assert_eq!(similarity("", ""), 0.0);
    }

    #[test]
    fn test_similarity_ratio() {
        // one deletion out of six characters
        let score = similarity("AMAZON", "AMAZN");
        assert!((score - 5.0 / 6.0).abs() < 1e-9);

        // nothing in common
        assert_eq!(similarity("ABC", "XYZ"), 0.0);
    }

    #[test]
    fn test_similarity_bounds() {
        let pairs = [("GUSTO", "GUSTAV"), ("A", "ABCDEFGH"), ("ÉCOLE", "ECOLE")];
        for (a, b) in pairs {
            let s = similarity(a, b);
            assert!((0.0..=1.0).contains(&s), "{} vs {} -> {}", a, b, s);
        }
    }
}
