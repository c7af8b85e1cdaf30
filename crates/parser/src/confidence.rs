use common::models::DEFAULT_CONFIDENCE;
use once_cell::sync::Lazy;
use regex::Regex;

static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)###[ \t]*CONFIDENCE[:\s]*(\d+)",
        r"(?i)###[ \t]*MEGBÍZHATÓSÁG[:\s]*(\d+)",
        r"(?i)(\d+)[ \t]*%[ \t]*confidence",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("confidence pattern"))
    .collect()
});

/// Confidence percentage declared by the model text, or [`DEFAULT_CONFIDENCE`].
///
/// The number is taken at face value; it is a label supplied by the model, not a
/// measured probability.
pub fn extract_confidence(text: &str) -> u32 {
    PATTERNS
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(DEFAULT_CONFIDENCE)
}
