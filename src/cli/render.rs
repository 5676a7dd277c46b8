//! Terminal painter for the results view.

use colored::{ColoredString, Colorize};

use crate::api::ModelCatalog;
use crate::chart::{ChartRegistry, DonutChart};
use crate::session::UiState;
use crate::view::{
    CardDetail, ConfidenceLevel, InsightCard, NO_INSIGHTS_MESSAGE, NO_INSIGHTS_TITLE, ResultsView,
};

const BAR_WIDTH: usize = 20;
const GAUGE_WIDTH: usize = 20;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

pub fn print_results(view: &ResultsView, charts: &ChartRegistry) {
    println!("{}", "Analysis Report".bold().cyan());
    println!("{}", "=".repeat(60));
    println!("  {}", view.file_label.bold());
    if let Some(model) = &view.model_label {
        println!("  {}", model.dimmed());
    }
    if let Some(timestamp) = &view.analysis_timestamp {
        println!("  {}", format!("Analyzed: {timestamp}").dimmed());
    }
    println!();

    println!("{}", "Executive Summary".bold().cyan());
    println!("  {}", view.executive_summary);
    println!();

    println!(
        "{} {}",
        format!("Insights ({} of {})", view.cards.len(), view.total_insights)
            .bold()
            .cyan(),
        format!(
            "filter: {} · sort: {} · {}",
            view.params.filter, view.params.sort, view.params.direction
        )
        .dimmed()
    );
    println!("{}", "-".repeat(60));

    if view.is_empty() {
        println!();
        println!("  {}", NO_INSIGHTS_TITLE.bold());
        println!("  {}", NO_INSIGHTS_MESSAGE.dimmed());
        return;
    }

    for card in &view.cards {
        println!();
        print_card(card, charts);
    }
}

fn print_card(card: &InsightCard, charts: &ChartRegistry) {
    let marker = if card.wide { "◆" } else { "◇" };
    println!(
        "{} {} {}",
        marker.cyan(),
        card.title.bold(),
        severity_badge(&card.severity.label)
    );
    println!(
        "  {}  {} {:>3}%",
        card.type_label.dimmed(),
        confidence_bar(card.confidence.width_pct, card.confidence.level),
        card.confidence.percent
    );
    println!("  {}", card.description);

    match &card.detail {
        CardDetail::Metric {
            metric_name,
            value,
            unit,
        } => {
            println!(
                "  {} {} {}",
                format!("{metric_name}:").dimmed(),
                value.bold(),
                unit.as_deref().unwrap_or("").dimmed()
            );
        }
        CardDetail::Theme { keywords, mentions } => {
            let chips: Vec<String> = keywords.iter().map(|k| format!("[{k}]")).collect();
            println!(
                "  {} {}  {} {}",
                "Keywords:".dimmed(),
                chips.join(" "),
                mentions.to_string().bold(),
                "mentions".dimmed()
            );
        }
        CardDetail::Sentiment {
            label, explanation, ..
        } => {
            let gauge = card
                .chart_id
                .as_deref()
                .and_then(|id| charts.get(id))
                .map(|instance| sentiment_gauge(&instance.chart))
                .unwrap_or_default();
            println!("  {} {} {}", "Overall Sentiment:".dimmed(), label.bold(), gauge);
            println!("  {}", explanation.dimmed());
        }
        CardDetail::Table { summary, headers } => {
            println!("  {} {}", "AI Summary:".dimmed(), summary);
            if !headers.is_empty() {
                println!("  {} {}", "Columns:".dimmed(), headers.join(", "));
            }
        }
        CardDetail::Code {
            summary,
            language,
            potential_issues,
        } => {
            match language {
                Some(language) => println!("  {} {}", format!("AI Summary ({language}):").dimmed(), summary),
                None => println!("  {} {}", "AI Summary:".dimmed(), summary),
            }
            for issue in potential_issues {
                println!("    {} {}", "•".yellow(), issue);
            }
        }
        CardDetail::Empty => {}
    }

    if let Some(grounding) = &card.grounding {
        println!("  {} \"{}\"", "│".dimmed(), grounding.snippet.italic());
        if !grounding.locations.is_empty() {
            println!("  {} {}", "@".dimmed(), grounding.locations.join(" · ").dimmed());
        }
    }
    if let Some(recommendation) = &card.recommendation {
        println!("  {} {}", "→ Recommendation:".green().bold(), recommendation);
    }
}

// ---------------------------------------------------------------------------
// Widgets
// ---------------------------------------------------------------------------

fn severity_badge(label: &str) -> ColoredString {
    let text = format!("[{label}]");
    match label {
        "Critical" => text.red().bold(),
        "High" => text.truecolor(251, 146, 60).bold(),
        "Medium" => text.yellow(),
        "Low" => text.blue(),
        _ => text.dimmed(),
    }
}

/// Horizontal confidence bar, colored by level.
pub fn confidence_bar(width_pct: f64, level: ConfidenceLevel) -> String {
    let filled = ((width_pct / 100.0) * BAR_WIDTH as f64)
        .round()
        .clamp(0.0, BAR_WIDTH as f64) as usize;
    let bar = "█".repeat(filled);
    let rest = "░".repeat(BAR_WIDTH - filled);
    let bar = match level {
        ConfidenceLevel::Low => bar.red(),
        ConfidenceLevel::Mid => bar.yellow(),
        ConfidenceLevel::High => bar.green(),
    };
    format!("{bar}{}", rest.dimmed())
}

/// The donut chart flattened into a gauge: segment, track, centered label.
pub fn sentiment_gauge(chart: &DonutChart) -> String {
    let filled = (chart.positivity.clamp(0.0, 1.0) * GAUGE_WIDTH as f64).round() as usize;
    let (r, g, b) = (chart.segment.0, chart.segment.1, chart.segment.2);
    let segment = "━".repeat(filled).truecolor(r, g, b);
    let track_text = "━".repeat(GAUGE_WIDTH - filled);
    let track = match hex_rgb(chart.palette.track) {
        Some((r, g, b)) => track_text.truecolor(r, g, b),
        None => track_text.dimmed(),
    };
    format!("{segment}{track} {}", chart.label.bold())
}

fn hex_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

// ---------------------------------------------------------------------------
// Models, state and banners
// ---------------------------------------------------------------------------

pub fn print_models(catalog: &ModelCatalog, selected: Option<&str>) {
    println!("{}", "Available Models".bold().cyan());
    println!("  {:<20} {:<40} Name", "Provider", "Value");
    println!("  {}", "-".repeat(76));
    for (provider, models) in catalog {
        for model in models {
            let line = format!(
                "  {:<20} {:<40} {}",
                truncate(provider, 20),
                truncate(&model.value, 40),
                model.name
            );
            if selected == Some(model.value.as_str()) {
                println!("{} {}", line.green(), "(selected)".green().bold());
            } else {
                println!("{line}");
            }
        }
    }
}

pub fn print_state(state: UiState) {
    let label = match state {
        UiState::Setup => "setup".blue(),
        UiState::Loading => "loading".yellow(),
        UiState::Results => "results".green(),
    };
    println!("  {} {}", "State:".bold(), label);
}

pub fn print_error_banner(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_status_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<12} {}", status, name, detail.dimmed());
}

/// Truncate to `max_len` characters, appending "…" if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Theme;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("ünïcödé", 4), "ünï…");
    }

    #[test]
    fn hex_colors_parse() {
        assert_eq!(hex_rgb("#334155"), Some((0x33, 0x41, 0x55)));
        assert_eq!(hex_rgb("334155"), None);
        assert_eq!(hex_rgb("#zzz000"), None);
    }

    #[test]
    fn bars_have_fixed_width() {
        colored::control::set_override(false);
        let bar = confidence_bar(80.0, ConfidenceLevel::High);
        assert_eq!(bar.chars().count(), BAR_WIDTH);
        assert_eq!(bar.chars().filter(|&c| c == '█').count(), 16);

        let gauge = sentiment_gauge(&DonutChart::sentiment(0.0, Theme::Dark));
        assert!(gauge.ends_with(" 50%"));
        assert_eq!(gauge.chars().filter(|&c| c == '━').count(), GAUGE_WIDTH);
    }
}
