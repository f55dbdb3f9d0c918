/// Positional similarity between two titles, in `[0, 1]`.
///
/// Counts the characters that are equal at the same index across the
/// shorter length and divides by the longer length, so `"Inception"` vs
/// `"Inceptio"` scores `8 / 9`. Comparison is by Unicode scalar value and
/// is case sensitive. An empty input on either side scores `0`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    if a_len == 0 || b_len == 0 {
        return 0.0;
    }

    let matching = a
        .chars()
        .zip(b.chars())
        .filter(|(left, right)| left == right)
        .count();

    matching as f64 / a_len.max(b_len) as f64
}
