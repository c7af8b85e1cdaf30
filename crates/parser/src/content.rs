use once_cell::sync::Lazy;
use regex::Regex;

const MIN_PARAGRAPH_CHARS: usize = 20;
const MIN_SENTENCE_CHARS: usize = 10;

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"###[^#\n]*").expect("heading pattern"));

/// Short summary of the response: the first substantial paragraph with headings removed,
/// or the first two sentences when the text has no such paragraph.
pub fn extract_main_content(text: &str) -> String {
    // Heading-only paragraphs are long enough to qualify but empty once stripped.
    if let Some(paragraph) = text
        .split("\n\n")
        .filter(|p| p.trim().chars().count() > MIN_PARAGRAPH_CHARS)
        .map(|p| HEADING.replace_all(p, "").trim().to_string())
        .find(|p| !p.is_empty())
    {
        return paragraph;
    }

    let sentences: Vec<&str> = text
        .split('.')
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .take(2)
        .collect();

    if sentences.is_empty() {
        return String::new();
    }
    format!("{}.", sentences.join(". "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_long_paragraph_without_heading() {
        let text = "### SIGNAL TYPE\nBUY\n\n### REASONING\nEMA21 bounce with RSI above 50.\n\nMore text here that is long.";
        assert_eq!(extract_main_content(text), "EMA21 bounce with RSI above 50.");
    }

    #[test]
    fn test_heading_only_paragraph_is_skipped() {
        let text = "### RISK ASSESSMENT LEVEL\n\nPrice bounced off the lower band with volume.";
        assert_eq!(extract_main_content(text), "Price bounced off the lower band with volume.");
    }

    #[test]
    fn test_sentence_fallback() {
        let text = "Bullish engulfing.\n\nRSI rising fast now.\n\nOk.";
        assert_eq!(extract_main_content(text), "Bullish engulfing. RSI rising fast now.");
    }

    #[test]
    fn test_degenerate_input() {
        assert_eq!(extract_main_content(""), "");
        assert_eq!(extract_main_content("Hi. Yo."), "");
    }
}
