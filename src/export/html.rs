//! HTML painter for the results view.
//!
//! The same renderer produces the standalone export (no controls, charts as
//! inline SVG) and the interactive page served by the local viewer. All
//! theme rules are inlined so an exported file looks the same offline,
//! apart from the external CSS framework and font.

use std::fmt::Write as _;

use crate::chart::ChartRegistry;
use crate::report::InsightType;
use crate::theme::Theme;
use crate::view::{
    CardDetail, InsightCard, NO_INSIGHTS_MESSAGE, NO_INSIGHTS_TITLE, ResultsView, SortDirection,
    SortKey, TypeFilter,
};

use super::ExportAssets;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlMode {
    /// Standalone file: controls removed.
    Export,
    /// Served by the viewer: filter/sort form, theme toggle, downloads.
    Interactive,
}

/// Theme stylesheet shared by every page.
pub const THEME_CSS: &str = r#"
[data-theme="dark"] {
  --bg-primary: #0f172a; --bg-secondary: #1e293b; --bg-chip: #334155;
  --text-primary: #f1f5f9; --text-secondary: #cbd5e1; --text-tertiary: #94a3b8;
  --accent: #2dd4bf; --border: #334155;
}
[data-theme="light"] {
  --bg-primary: #f1f5f9; --bg-secondary: #ffffff; --bg-chip: #e2e8f0;
  --text-primary: #1e293b; --text-secondary: #475569; --text-tertiary: #64748b;
  --accent: #0d9488; --border: #cbd5e1;
}
body { background: var(--bg-primary); color: var(--text-primary); }
.themed-card-bg { background: var(--bg-secondary); border: 1px solid var(--border); }
.themed-secondary-bg { background: var(--bg-primary); }
.themed-chip-bg { background: var(--bg-chip); }
.themed-text-primary { color: var(--text-primary); }
.themed-text-secondary { color: var(--text-secondary); }
.themed-text-tertiary { color: var(--text-tertiary); }
.themed-text-accent { color: var(--accent); }
.themed-border { border-color: var(--border); }
.themed-border-t { border-top: 1px solid var(--border); }
.insight-card { animation: fade-in-up 0.5s ease-out both; }
@keyframes fade-in-up { from { opacity: 0; transform: translateY(12px); } to { opacity: 1; transform: none; } }
.tooltip-container { position: relative; display: inline-flex; align-items: center; gap: 0.25rem; }
.tooltip-text { visibility: hidden; position: absolute; bottom: 125%; left: 0; width: 14rem; padding: 0.5rem;
  border-radius: 0.5rem; font-size: 0.75rem; background: var(--bg-chip); color: var(--text-primary); z-index: 10; }
.tooltip-container:hover .tooltip-text { visibility: visible; }
.info-icon { width: 1rem; height: 1rem; border-radius: 9999px; font-size: 0.65rem; text-align: center;
  line-height: 1rem; background: var(--bg-chip); color: var(--text-secondary); }
#no-insights-message { grid-column: 1 / -1; text-align: center; padding: 3rem; }
#no-insights-message svg { width: 3rem; height: 3rem; margin: 0 auto 1rem; color: var(--text-tertiary); }
.sentiment-chart { width: 100%; height: auto; }
"#;

const SEARCH_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" fill="none" viewBox="0 0 24 24" stroke-width="1.5" stroke="currentColor"><path stroke-linecap="round" stroke-linejoin="round" d="M21 21l-5.197-5.197m0 0A7.5 7.5 0 105.196 5.196a7.5 7.5 0 0010.607 10.607z" /></svg>"#;

/// Render the results view as a complete HTML document.
pub fn render_report(
    view: &ResultsView,
    charts: &ChartRegistry,
    theme: Theme,
    assets: &ExportAssets,
    mode: HtmlMode,
) -> String {
    let mut body = String::new();
    let _ = write!(body, r#"<section id="results-section">"#);

    // Header
    let _ = write!(
        body,
        r#"<div class="flex flex-wrap justify-between items-start gap-4 mb-6"><div><h2 class="text-3xl font-bold themed-text-primary">Analysis Report</h2><p class="themed-text-secondary mt-1">{}</p>"#,
        html_escape(&view.file_label)
    );
    if let Some(model) = &view.model_label {
        let _ = write!(
            body,
            r#"<p class="text-sm themed-text-tertiary">{}</p>"#,
            html_escape(model)
        );
    }
    if let Some(timestamp) = &view.analysis_timestamp {
        let _ = write!(
            body,
            r#"<p class="text-xs themed-text-tertiary">Analyzed: {}</p>"#,
            html_escape(timestamp)
        );
    }
    body.push_str("</div>");
    if mode == HtmlMode::Interactive {
        body.push_str(&report_actions(theme));
    }
    body.push_str("</div>");

    // Executive summary
    let _ = write!(
        body,
        r#"<div class="themed-card-bg rounded-xl p-6 mb-6"><h3 class="text-lg font-semibold themed-text-accent mb-2">Executive Summary</h3><p class="themed-text-secondary">{}</p></div>"#,
        html_escape(&view.executive_summary)
    );

    if mode == HtmlMode::Interactive {
        body.push_str(&filter_sort_controls(view));
    }

    // Cards
    body.push_str(r#"<div id="insights-grid" class="grid grid-cols-1 lg:grid-cols-2 gap-6">"#);
    if view.is_empty() {
        let _ = write!(
            body,
            r#"<div id="no-insights-message">{SEARCH_ICON}<h4 class="text-lg font-semibold themed-text-primary">{NO_INSIGHTS_TITLE}</h4><p class="themed-text-secondary">{NO_INSIGHTS_MESSAGE}</p></div>"#
        );
    } else {
        for card in &view.cards {
            body.push_str(&render_card(card, charts));
        }
    }
    body.push_str("</div></section>");

    if mode == HtmlMode::Interactive {
        body.push_str(UPLOAD_SCRIPT);
    }

    document(
        &format!("Report: {}", view.file_name),
        &body,
        theme,
        assets,
    )
}

/// Viewer page shown while no report is loaded.
pub fn render_setup_page(theme: Theme, assets: &ExportAssets, error: Option<&str>) -> String {
    let mut body = String::new();
    let _ = write!(
        body,
        r#"<section id="setup-section" class="themed-card-bg rounded-xl p-8 max-w-xl mx-auto text-center"><h2 class="text-2xl font-bold themed-text-primary mb-2">No report loaded</h2><p class="themed-text-secondary mb-6">Upload a previously exported report (JSON) to view it here.</p>"#
    );
    if let Some(error) = error {
        let _ = write!(
            body,
            r#"<div id="error-container" class="bg-red-500/20 text-red-400 border border-red-500/30 rounded-lg p-3 mb-4">{}</div>"#,
            html_escape(error)
        );
    }
    body.push_str(&upload_input());
    body.push_str(&theme_toggle(theme));
    body.push_str("</section>");
    body.push_str(UPLOAD_SCRIPT);

    document("docinsight", &body, theme, assets)
}

fn document(title: &str, body: &str, theme: Theme, assets: &ExportAssets) -> String {
    format!(
        r#"<!DOCTYPE html><html lang="en" data-theme="{theme}"><head><meta charset="UTF-8"><meta name="viewport" content="width=device-width, initial-scale=1"><title>{title}</title><script src="{css}"></script><link href="{font}" rel="stylesheet"><style>body{{font-family:"Inter",sans-serif;padding:2rem;}}{THEME_CSS}</style></head><body><div class="w-full max-w-7xl mx-auto">{body}</div></body></html>"#,
        title = html_escape(title),
        css = html_escape(&assets.css_framework_url),
        font = html_escape(&assets.font_url),
    )
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

fn render_card(card: &InsightCard, charts: &ChartRegistry) -> String {
    let mut html = String::new();
    let wide = if card.wide { " lg:col-span-2" } else { "" };
    let _ = write!(
        html,
        r#"<div class="insight-card themed-card-bg rounded-xl p-6 flex flex-col gap-4{wide}" style="animation-delay: {delay}ms" data-insight-type="{kind}">"#,
        delay = card.animation_delay_ms,
        kind = html_escape(&card.type_label),
    );

    // Title row with severity badge
    let _ = write!(
        html,
        r#"<div class="flex justify-between items-start gap-3"><h3 class="insight-title text-xl font-semibold themed-text-primary">{title}</h3><div class="tooltip-container"><span class="insight-severity text-xs font-semibold px-2.5 py-1 rounded-full border {classes}">{label}</span><div class="tooltip-text insight-severity-tooltip">{tooltip}</div></div></div>"#,
        title = html_escape(&card.title),
        classes = card.severity.classes,
        label = html_escape(&card.severity.label),
        tooltip = card.severity.tooltip,
    );

    // Type and confidence
    let _ = write!(
        html,
        r#"<div class="flex justify-between items-center text-sm"><span class="insight-type themed-text-tertiary">{kind}</span><div class="flex items-center gap-2"><span class="themed-text-tertiary">Confidence</span><div class="w-24 h-2 themed-chip-bg rounded-full overflow-hidden"><div class="insight-confidence-bar h-2 rounded-full {bar}" style="width: {width}%"></div></div><span class="insight-confidence-text themed-text-secondary">{percent}%</span></div></div>"#,
        kind = html_escape(&card.type_label),
        bar = card.confidence.level.css_class(),
        width = card.confidence.width_pct,
        percent = card.confidence.percent,
    );

    let _ = write!(
        html,
        r#"<p class="insight-description themed-text-secondary">{}</p>"#,
        html_escape(&card.description)
    );
    let _ = write!(
        html,
        r#"<div class="insight-details">{}</div>"#,
        detail_html(card, charts)
    );

    if let Some(grounding) = &card.grounding {
        let locations: String = grounding
            .locations
            .iter()
            .map(|loc| {
                format!(
                    r#"<span class="inline-block themed-chip-bg themed-text-tertiary text-xs font-medium mr-2 mb-2 px-2.5 py-1 rounded-lg">{}</span>"#,
                    html_escape(loc)
                )
            })
            .collect();
        let _ = write!(
            html,
            r#"<div class="insight-grounding"><p class="text-sm font-semibold themed-text-secondary mb-2">Grounding Evidence</p><blockquote class="themed-secondary-bg border-l-4 themed-border pl-4 py-2 rounded-r-lg mb-3"><p class="themed-text-secondary italic">"{snippet}"</p></blockquote><div class="flex flex-wrap">{locations}</div></div>"#,
            snippet = html_escape(&grounding.snippet),
        );
    }

    if let Some(recommendation) = &card.recommendation {
        let _ = write!(
            html,
            r#"<div class="insight-recommendation themed-border-t pt-3"><p class="text-sm font-semibold themed-text-accent mb-2">Actionable Recommendation</p><p class="themed-text-secondary">{}</p></div>"#,
            html_escape(recommendation)
        );
    }

    html.push_str("</div>");
    html
}

fn detail_html(card: &InsightCard, charts: &ChartRegistry) -> String {
    let label = |text: &str| {
        format!(
            r#"<p class="text-sm themed-text-secondary mb-1">{}</p>"#,
            html_escape(text)
        )
    };
    let chips = |items: &[String]| -> String {
        items
            .iter()
            .map(|item| {
                format!(
                    r#"<span class="themed-chip-bg themed-text-secondary text-xs font-medium mr-2 px-2.5 py-0.5 rounded-full">{}</span>"#,
                    html_escape(item)
                )
            })
            .collect()
    };

    match &card.detail {
        CardDetail::Metric {
            metric_name,
            value,
            unit,
        } => format!(
            r#"<div class="themed-secondary-bg p-4 rounded-lg">{}<p class="text-3xl font-bold themed-text-primary">{}<span class="text-xl themed-text-secondary ml-1">{}</span></p></div>"#,
            label(metric_name),
            html_escape(value),
            html_escape(unit.as_deref().unwrap_or("")),
        ),
        CardDetail::Theme { keywords, mentions } => format!(
            r#"<div class="themed-secondary-bg p-4 rounded-lg flex justify-between items-center"><div>{}<div class="mt-1">{}</div></div><div class="text-center"><p class="text-3xl font-bold themed-text-primary">{mentions}</p><p class="text-xs themed-text-secondary">Mentions</p></div></div>"#,
            label("Keywords"),
            chips(keywords),
        ),
        CardDetail::Sentiment {
            label: sentiment,
            explanation,
            ..
        } => {
            let chart = card
                .chart_id
                .as_deref()
                .and_then(|id| charts.get(id))
                .map(|instance| instance.chart.to_svg())
                .unwrap_or_default();
            format!(
                r#"<div class="themed-secondary-bg p-4 rounded-lg"><div class="flex items-center space-x-4"><div class="w-24 h-24 flex-shrink-0" id="{id}">{chart}</div><div class="flex-1"><div class="tooltip-container mb-1"><p class="text-sm themed-text-secondary">Overall Sentiment</p><div class="info-icon">i</div><div class="tooltip-text">{hint}</div></div><p class="text-lg font-bold themed-text-primary">{sentiment}</p><p class="text-xs themed-text-secondary mt-1">{explanation}</p></div></div></div>"#,
                id = card.chart_id.as_deref().unwrap_or_default(),
                hint = CardDetail::SENTIMENT_HINT,
                sentiment = html_escape(sentiment),
                explanation = html_escape(explanation),
            )
        }
        CardDetail::Table { summary, headers } => {
            let mut inner = format!(
                r#"{}<p class="themed-text-secondary">{}</p>"#,
                label("AI Summary"),
                html_escape(summary)
            );
            if !headers.is_empty() {
                let _ = write!(
                    inner,
                    r#"<div class="mt-3">{}{}</div>"#,
                    label("Columns"),
                    chips(headers)
                );
            }
            format!(r#"<div class="themed-secondary-bg p-4 rounded-lg">{inner}</div>"#)
        }
        CardDetail::Code {
            summary,
            language,
            potential_issues,
        } => {
            let mut inner = String::new();
            let title = match language {
                Some(language) => format!("AI Summary ({language})"),
                None => "AI Summary".to_string(),
            };
            inner.push_str(&label(&title));
            let _ = write!(
                inner,
                r#"<p class="themed-text-secondary">{}</p>"#,
                html_escape(summary)
            );
            if !potential_issues.is_empty() {
                inner.push_str(&label("Potential Issues"));
                inner.push_str(r#"<ul class="list-disc pl-5 themed-text-secondary">"#);
                for issue in potential_issues {
                    let _ = write!(inner, "<li>{}</li>", html_escape(issue));
                }
                inner.push_str("</ul>");
            }
            format!(r#"<div class="themed-secondary-bg p-4 rounded-lg">{inner}</div>"#)
        }
        CardDetail::Empty => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Interactive controls
// ---------------------------------------------------------------------------

fn report_actions(theme: Theme) -> String {
    format!(
        r#"<div id="report-actions" class="flex flex-wrap items-center gap-3"><a href="/download/json" class="themed-chip-bg themed-text-primary px-4 py-2 rounded-lg text-sm">Download JSON</a><a href="/download/html" class="themed-chip-bg themed-text-primary px-4 py-2 rounded-lg text-sm">Download HTML</a>{upload}{toggle}</div>"#,
        upload = upload_input(),
        toggle = theme_toggle(theme),
    )
}

fn theme_toggle(theme: Theme) -> String {
    let icons = theme.icons();
    let hidden = |visible: bool| if visible { "" } else { "hidden" };
    format!(
        r#"<form method="post" action="/theme/toggle" class="inline"><button type="submit" id="theme-toggle" class="themed-chip-bg themed-text-primary px-3 py-2 rounded-lg" title="Toggle theme"><span id="theme-icon-sun" class="{sun}">☀</span><span id="theme-icon-moon" class="{moon}">☾</span></button></form>"#,
        sun = hidden(icons.sun_visible),
        moon = hidden(icons.moon_visible),
    )
}

fn upload_input() -> String {
    r#"<label class="themed-chip-bg themed-text-primary px-4 py-2 rounded-lg text-sm cursor-pointer">Load Report<input type="file" id="report-upload" accept=".json,application/json" class="hidden"></label>"#
        .to_string()
}

fn filter_sort_controls(view: &ResultsView) -> String {
    let option = |value: &str, label: &str, selected: bool| {
        format!(
            r#"<option value="{value}"{sel}>{label}</option>"#,
            value = html_escape(value),
            label = html_escape(label),
            sel = if selected { " selected" } else { "" },
        )
    };

    let mut filters = option("All", "All Types", view.params.filter == TypeFilter::All);
    for kind in InsightType::ALL {
        filters.push_str(&option(
            kind.label(),
            kind.label(),
            view.params.filter == TypeFilter::Only(kind),
        ));
    }

    let sorts: String = SortKey::ALL
        .into_iter()
        .map(|key| {
            let label = match key {
                SortKey::Default => "Default Order",
                SortKey::Severity => "Severity",
                SortKey::Confidence => "Confidence",
            };
            option(key.as_str(), label, view.params.sort == key)
        })
        .collect();

    let directions: String = [SortDirection::Desc, SortDirection::Asc]
        .into_iter()
        .map(|dir| {
            let label = match dir {
                SortDirection::Desc => "Descending",
                SortDirection::Asc => "Ascending",
            };
            option(dir.as_str(), label, view.params.direction == dir)
        })
        .collect();

    format!(
        r#"<form id="filter-sort-controls" method="get" action="/" class="flex flex-wrap items-center gap-3 mb-6"><span class="themed-text-secondary text-sm">{shown} of {total} insights</span><select name="filter" class="themed-chip-bg themed-text-primary rounded-lg px-3 py-2">{filters}</select><select name="sort" class="themed-chip-bg themed-text-primary rounded-lg px-3 py-2">{sorts}</select><select name="dir" class="themed-chip-bg themed-text-primary rounded-lg px-3 py-2">{directions}</select><button type="submit" class="themed-chip-bg themed-text-accent rounded-lg px-4 py-2">Apply</button></form>"#,
        shown = view.cards.len(),
        total = view.total_insights,
    )
}

const UPLOAD_SCRIPT: &str = r#"<script>
document.getElementById("report-upload")?.addEventListener("change", async (event) => {
  const file = event.target.files[0];
  if (!file) return;
  const response = await fetch("/api/report", { method: "POST", body: await file.text() });
  if (response.ok) { window.location.href = "/"; return; }
  const body = await response.json().catch(() => ({}));
  alert(`Failed to load report: ${body.detail || response.status}`);
});
</script>"#;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Escape text for HTML element content and attribute values.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::parse_report;
    use crate::view::ViewParams;

    const REPORT: &str = r#"{
        "file_name": "board <minutes>.txt",
        "file_type_detected": "Text",
        "executive_summary": "Board approved the budget.",
        "model_used": "openai:gpt-4o",
        "insights": [
            {
                "title": "Tone",
                "description": "Positive.",
                "insight_type": "Sentiment Analysis",
                "severity": "Informational",
                "confidence_score": 0.9,
                "sentiment": {"label": "Positive", "score": 0.5, "explanation": "Upbeat."}
            },
            {
                "title": "Budget",
                "description": "Approved amount.",
                "insight_type": "Quantitative Metric",
                "severity": "Critical",
                "confidence_score": 0.4,
                "metric_name": "Budget",
                "value": 1.5,
                "unit": "M",
                "representative_snippet": "approved 1.5M",
                "locations": [{"location": "Section 2"}],
                "actionable_recommendation": "Track spend monthly."
            }
        ]
    }"#;

    fn render(mode: HtmlMode, params: ViewParams) -> String {
        let report = parse_report(REPORT).unwrap();
        let view = ResultsView::build(&report, params);
        let mut charts = ChartRegistry::new(Theme::Light);
        charts.rebuild(view.chart_entries());
        render_report(&view, &charts, Theme::Light, &ExportAssets::default(), mode)
    }

    #[test]
    fn export_has_theme_and_no_controls() {
        let html = render(HtmlMode::Export, ViewParams::default());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"data-theme="light""#));
        assert!(html.contains("https://cdn.tailwindcss.com"));
        assert!(!html.contains("report-actions"));
        assert!(!html.contains("filter-sort-controls"));
        assert!(html.contains("<svg class=\"sentiment-chart\""));
        assert!(html.contains("board &lt;minutes&gt;.txt"));
        assert!(html.contains("Actionable Recommendation"));
    }

    #[test]
    fn interactive_page_has_controls() {
        let html = render(HtmlMode::Interactive, ViewParams::default());
        assert!(html.contains(r#"id="report-actions""#));
        assert!(html.contains(r#"id="filter-sort-controls""#));
        assert!(html.contains(r#"<option value="default" selected>"#));
    }

    #[test]
    fn empty_filter_renders_placeholder() {
        let params = ViewParams {
            filter: TypeFilter::Only(InsightType::CodeAnalysis),
            ..ViewParams::default()
        };
        let html = render(HtmlMode::Export, params);
        assert!(html.contains(NO_INSIGHTS_TITLE));
        assert!(html.contains(NO_INSIGHTS_MESSAGE));
    }

    #[test]
    fn setup_page_shows_error() {
        let html = render_setup_page(Theme::Dark, &ExportAssets::default(), Some("bad <json>"));
        assert!(html.contains("bad &lt;json&gt;"));
        assert!(html.contains(r#"data-theme="dark""#));
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(html_escape(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }
}
