use common::models::MAX_DETAILS;
use once_cell::sync::Lazy;
use regex::Regex;

/// Bullets of this many characters or fewer are noise ("- ok", "* n/a").
pub const MIN_BULLET_CHARS: usize = 10;
pub const MIN_SENTENCE_CHARS: usize = 20;
pub const FALLBACK_SENTENCES: usize = 6;

const BULLET_GLYPHS: [char; 3] = ['-', '*', '•'];

static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*|__").expect("emphasis pattern"));

/// Collects bulleted lines from every `###` section, at most [`MAX_DETAILS`].
///
/// When the text has no usable bullets at all, the first sentences of the text stand in.
pub fn extract_detail_bullets(text: &str) -> Vec<String> {
    let mut details = Vec::new();

    'sections: for (index, section) in text.split("###").enumerate() {
        // Every chunk after a marker begins with its heading line.
        let heading_lines = usize::from(index > 0);

        for line in section
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .skip(heading_lines)
        {
            let Some(bullet) = clean_bullet(line) else {
                continue;
            };
            if bullet.chars().count() > MIN_BULLET_CHARS {
                details.push(bullet);
                if details.len() == MAX_DETAILS {
                    break 'sections;
                }
            }
        }
    }

    if details.is_empty() {
        return leading_sentences(text);
    }
    details
}

fn clean_bullet(line: &str) -> Option<String> {
    let rest = line.strip_prefix(BULLET_GLYPHS)?;
    let rest = EMPHASIS.replace_all(rest.trim_start(), "");
    Some(rest.trim().trim_matches('*').trim().to_string())
}

fn leading_sentences(text: &str) -> Vec<String> {
    text.split('.')
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .take(FALLBACK_SENTENCES)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_bullets_across_sections() {
        let text = "### ANALYSIS\n- **EMA9:** 174.60 (zöld vonal)\n- **RSI:** 58 (50 felett)\n\n### NOTES\n• Volume confirms the breakout\n* Watch resistance at 175.30";
        let details = extract_detail_bullets(text);
        assert_eq!(
            details,
            vec![
                "EMA9: 174.60 (zöld vonal)",
                "RSI: 58 (50 felett)",
                "Volume confirms the breakout",
                "Watch resistance at 175.30",
            ]
        );
    }

    #[test]
    fn test_discards_short_bullets() {
        let text = "### ANALYSIS\n- ok\n- exactly10c\n- long enough bullet";
        let details = extract_detail_bullets(text);
        assert_eq!(details, vec!["long enough bullet"]);
        assert!(details.iter().all(|d| d.chars().count() > MIN_BULLET_CHARS));
    }

    #[test]
    fn test_caps_at_max_details() {
        let mut text = String::from("### ANALYSIS\n");
        for i in 0..20 {
            text.push_str(&format!("- detail number {i} with padding\n"));
        }
        let details = extract_detail_bullets(&text);
        assert_eq!(details.len(), MAX_DETAILS);
        assert_eq!(details[0], "detail number 0 with padding");
    }

    #[test]
    fn test_heading_line_is_not_a_bullet() {
        let text = "### - heading that looks like a bullet\n- the real bullet here";
        assert_eq!(extract_detail_bullets(text), vec!["the real bullet here"]);
    }

    #[test]
    fn test_preamble_bullets_count() {
        let text = "- bullet before any heading\n### SIGNAL TYPE\nBUY";
        assert_eq!(extract_detail_bullets(text), vec!["bullet before any heading"]);
    }

    #[test]
    fn test_falls_back_to_sentences() {
        let text = "The price bounced off the EMA21 line. RSI stays high. \
                    Large green candle confirms buying pressure. Short.";
        let details = extract_detail_bullets(text);
        assert_eq!(
            details,
            vec![
                "The price bounced off the EMA21 line",
                "Large green candle confirms buying pressure",
            ]
        );
    }

    #[test]
    fn test_fallback_limited_to_six_sentences() {
        let text = "This sentence is long enough to count. ".repeat(10);
        assert_eq!(extract_detail_bullets(&text).len(), FALLBACK_SENTENCES);
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert!(extract_detail_bullets("").is_empty());
    }
}
