//! Token-sequence similarity
//!
//! Tokens are atomic symbols; similarity is the longest common subsequence length
//! normalized by the longer sequence, giving a ratio in `[0, 1]`.

/// Length of the longest common subsequence of two sequences
///
/// Two-row dynamic program: `O(len_a * len_b)` time, `O(len_b)` memory.
pub fn lcs_length<T: PartialEq>(seq_a: &[T], seq_b: &[T]) -> usize {
    if seq_a.is_empty() || seq_b.is_empty() {
        return 0;
    }

    let mut previous = vec![0usize; seq_b.len() + 1];
    let mut current = vec![0usize; seq_b.len() + 1];

    for item_a in seq_a {
        for (j, item_b) in seq_b.iter().enumerate() {
            current[j + 1] = if item_a == item_b {
                previous[j] + 1
            } else {
                previous[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[seq_b.len()]
}

/// LCS ratio (0.0 - 1.0); two empty sequences are identical
pub fn similarity<T: PartialEq>(seq_a: &[T], seq_b: &[T]) -> f64 {
    let max_len = seq_a.len().max(seq_b.len());
    if max_len == 0 {
        return 1.0;
    }

    lcs_length(seq_a, seq_b) as f64 / max_len as f64
}
