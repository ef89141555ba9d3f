// components/download_orchestrator/src/utils.rs
use once_cell::sync::Lazy;
use regex::Regex;

static VIDEO_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").expect("video id pattern is valid")
});

/// Extract the 11-character video identifier from a locator, if it has one
pub fn video_id(locator: &str) -> Option<&str> {
    VIDEO_ID
        .captures(locator)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Canonical watch URL for a locator; unrecognized input is passed through unchanged
pub fn normalize(locator: &str) -> String {
    match video_id(locator) {
        Some(id) => format!("https://www.youtube.com/watch?v={}", id),
        None => locator.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_strips_extra_parameters() {
        assert_eq!(
            normalize("https://youtube.com/watch?v=abcdEFGH12Q&t=5"),
            "https://www.youtube.com/watch?v=abcdEFGH12Q"
        );
    }

    #[rstest]
    #[case("https://youtu.be/abcdEFGH12Q")]
    #[case("https://www.youtube.com/shorts/abcdEFGH12Q?feature=share")]
    #[case("https://m.youtube.com/watch?feature=share&v=abcdEFGH12Q")]
    #[case("https://www.youtube.com/embed/abcdEFGH12Q")]
    fn test_recognized_shapes(#[case] locator: &str) {
        assert_eq!(normalize(locator), "https://www.youtube.com/watch?v=abcdEFGH12Q");
    }

    #[rstest]
    #[case("")]
    #[case("not a url")]
    #[case("https://example.com/short")]
    #[case("v=tooShort")]
    fn test_passes_through_unrecognized(#[case] locator: &str) {
        assert_eq!(normalize(locator), locator);
    }

    #[rstest]
    #[case("https://youtube.com/watch?v=abcdEFGH12Q&t=5")]
    #[case("https://youtu.be/a-b_c-d_e-f")]
    #[case("plain text")]
    #[case("https://example.com/some/longer-path-segment")]
    #[case("")]
    fn test_normalize_is_idempotent(#[case] locator: &str) {
        let once = normalize(locator);
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_video_id() {
        assert_eq!(video_id("https://youtu.be/a-b_c-d_e-f"), Some("a-b_c-d_e-f"));
        assert_eq!(video_id("nothing here"), None);
    }
}
