use common::models::{MAX_DETAILS, ParsedAnalysis, TradeOutcome, TradingStats};
use std::fmt::Write;

const REASONING_PREVIEW: usize = 150;
const CONTENT_PREVIEW: usize = 200;

/// Cuts `text` to `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Plain-text report of one analysis.
pub fn render_analysis(parsed: &ParsedAnalysis) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Signal: {}  [{}% confidence]", parsed.signal.label(), parsed.confidence);
    if parsed.signal_basis.is_heuristic() {
        let _ = writeln!(out, "  (no signal section found, direction inferred)");
    }

    if let Some(reasoning) = &parsed.reasoning {
        let _ = writeln!(out, "\nShort explanation:\n  {}", truncate(reasoning, REASONING_PREVIEW));
    }

    if !parsed.content.is_empty() {
        let _ = writeln!(out, "\n{}", truncate(&parsed.content, CONTENT_PREVIEW));
    }

    if parsed.has_levels() {
        out.push('\n');
        for (label, value) in [
            ("Entry point", &parsed.entry_point),
            ("Target", &parsed.target_price),
            ("Stop loss", &parsed.stop_loss),
        ] {
            if let Some(value) = value {
                let _ = writeln!(out, "{label:<12} {value}");
            }
        }
    }

    if let Some(risk) = &parsed.risk_level {
        let _ = writeln!(out, "{:<12} {}", "Risk level", risk);
    }
    if let Some(timeframe) = &parsed.timeframe {
        let _ = writeln!(out, "{:<12} {}", "Timeframe", timeframe);
    }

    if !parsed.details.is_empty() {
        let _ = writeln!(out, "\nTechnical analysis:");
        for detail in parsed.details.iter().take(MAX_DETAILS) {
            let _ = writeln!(out, "  • {detail}");
        }
    }

    out
}

pub fn render_stats(stats: &TradingStats) -> String {
    format!(
        "Trades: {}  Wins: {}  Losses: {}  Win rate: {:.1}%",
        stats.total_trades, stats.wins, stats.losses, stats.win_rate
    )
}

pub fn render_outcome(outcome: TradeOutcome, stats: &TradingStats) -> String {
    let headline = match outcome {
        TradeOutcome::Win => "Winning trade!",
        TradeOutcome::Loss => "Losing trade",
    };
    format!("{headline} Statistics updated. Win rate: {:.1}%", stats.win_rate)
}
