//! Kubernetes label values.
//!
//! A valid value is at most 63 characters of `[A-Za-z0-9._-]`, beginning and
//! ending with an alphanumeric. Sanitizing is a fixed number of linear passes
//! with no pattern matching, so its cost is proportional to the input even
//! for adversarial strings.

pub const MAX_LABEL_LEN: usize = 63;

const fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

/// Turn an arbitrary string into a valid label value (possibly empty).
#[must_use]
pub fn sanitize_label_value(value: &str) -> String {
    let replaced: String = value
        .chars()
        .take(MAX_LABEL_LEN)
        .map(|c| if is_allowed(c) { c } else { '-' })
        .collect();

    // Every remaining char is ASCII, so byte offsets are char offsets.
    let bytes = replaced.as_bytes();
    let mut start = 0;
    while start < bytes.len() && !bytes[start].is_ascii_alphanumeric() {
        start += 1;
    }
    let mut end = bytes.len();
    while end > start && !bytes[end - 1].is_ascii_alphanumeric() {
        end -= 1;
    }
    replaced[start..end].to_string()
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("nginx", "nginx")]
    #[case("my cookbook", "my-cookbook")]
    #[case("--role::web--", "role--web")]
    #[case("über_proxy.v2", "ber_proxy.v2")]
    #[case("***", "")]
    #[case("", "")]
    fn sanitizes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_label_value(input), expected);
    }

    #[test]
    fn truncates_before_trimming() {
        let input = format!("{}!tail", "a".repeat(62));
        let out = sanitize_label_value(&input);
        assert_eq!(out, "a".repeat(62));
        assert!(out.len() <= MAX_LABEL_LEN);
    }

    #[test]
    fn is_idempotent() {
        for input in ["Web Server (prod)", "-x-", "a.b_c", &"é".repeat(100)] {
            let once = sanitize_label_value(input);
            assert_eq!(sanitize_label_value(&once), once);
        }
    }

    #[test]
    fn adversarial_input_is_fast() {
        let input = "!@#$%^&*()-_.".repeat(10_000);
        let started = Instant::now();
        let out = sanitize_label_value(&input);
        assert!(out.is_empty());
        assert!(started.elapsed() < Duration::from_millis(100));

        let long_alnum = "a".repeat(100_000);
        assert_eq!(sanitize_label_value(&long_alnum).len(), MAX_LABEL_LEN);
    }
}
