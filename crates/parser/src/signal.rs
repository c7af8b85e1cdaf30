use common::models::{SignalBasis, SignalClassification, SignalType};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::fields::signal_section_rules;

static SELL_WORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)SELL|PUT").expect("sell keywords"));
static BUY_WORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)BUY|CALL").expect("buy keywords"));

/// Decides the signal direction.
///
/// A dedicated signal-type section is authoritative. Without one, directional keywords
/// are counted over the whole text; this is a loose heuristic (it also counts words such
/// as "input" or "recall") and the returned basis says so. Ties and texts without any
/// keyword fall back to buy.
pub fn classify_signal(text: &str) -> SignalClassification {
    if let Some((_, section)) = signal_section_rules().first_match(text) {
        let section = section.to_uppercase();
        debug!(%section, "signal section found");

        let signal = if section.contains("SELL") || section.contains("PUT") {
            Some(SignalType::Sell)
        } else if section.contains("BUY") || section.contains("CALL") {
            Some(SignalType::Buy)
        } else {
            None
        };

        return match signal {
            Some(signal) => SignalClassification {
                signal,
                basis: SignalBasis::Section,
            },
            None => SignalClassification::default(),
        };
    }

    let sell = SELL_WORDS.find_iter(text).count();
    let buy = BUY_WORDS.find_iter(text).count();
    debug!(buy, sell, "no signal section, counting keywords");

    if sell == buy {
        return SignalClassification::default();
    }

    let signal = if sell > buy {
        SignalType::Sell
    } else {
        SignalType::Buy
    };

    SignalClassification {
        signal,
        basis: SignalBasis::KeywordFrequency { buy, sell },
    }
}
