//! Sentiment donut charts.
//!
//! A [`DonutChart`] is a fully resolved drawing for one sentiment score
//! under one theme. The [`ChartRegistry`] tracks the charts of the current
//! results view so they can be destroyed when the view is rebuilt and
//! recreated with fresh colors when the theme changes.

use std::f64::consts::PI;
use std::fmt::Write as _;
use std::sync::mpsc::Receiver;

use crate::theme::{Theme, ThemeManager};

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn css(self) -> String {
        format!("rgb({}, {}, {})", self.0, self.1, self.2)
    }
}

pub const POSITIVE: Rgb = Rgb(52, 211, 153);
pub const NEGATIVE: Rgb = Rgb(248, 113, 113);
pub const NEUTRAL: Rgb = Rgb(250, 204, 21);

/// Scores beyond ±0.2 count as clearly positive or negative.
const SENTIMENT_THRESHOLD: f64 = 0.2;

/// Segment color for a sentiment score.
pub fn segment_color(score: f64) -> Rgb {
    if score > SENTIMENT_THRESHOLD {
        POSITIVE
    } else if score < -SENTIMENT_THRESHOLD {
        NEGATIVE
    } else {
        NEUTRAL
    }
}

/// Theme-dependent chart colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartPalette {
    pub track: &'static str,
    pub border: &'static str,
    pub label: &'static str,
}

impl ChartPalette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                track: "#334155",
                border: "#0f172a",
                label: "#f1f5f9",
            },
            Theme::Light => Self {
                track: "#e2e8f0",
                border: "#f1f5f9",
                label: "#1e293b",
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Donut chart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DonutChart {
    pub score: f64,
    /// Share of the ring filled by the segment, `(score + 1) / 2`.
    pub positivity: f64,
    pub segment: Rgb,
    pub palette: ChartPalette,
    pub theme: Theme,
    /// Centered label, e.g. `"70%"`.
    pub label: String,
    /// Inner radius as a percentage of the outer radius.
    pub cutout_pct: u8,
}

impl DonutChart {
    pub fn sentiment(score: f64, theme: Theme) -> Self {
        let positivity = (score + 1.0) / 2.0;
        Self {
            score,
            positivity,
            segment: segment_color(score),
            palette: ChartPalette::for_theme(theme),
            theme,
            label: format!("{}%", (positivity * 100.0).round() as i64),
            cutout_pct: 70,
        }
    }

    /// Static SVG rendering, used by the HTML painters.
    pub fn to_svg(&self) -> String {
        const OUTER: f64 = 48.0;
        let inner = OUTER * f64::from(self.cutout_pct) / 100.0;
        let radius = (OUTER + inner) / 2.0;
        let width = OUTER - inner;
        let circumference = 2.0 * PI * radius;
        let filled = circumference * self.positivity.clamp(0.0, 1.0);

        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg class="sentiment-chart" data-theme="{theme}" viewBox="0 0 100 100" width="100%" role="img" aria-label="Positivity {label}" xmlns="http://www.w3.org/2000/svg">"#,
            theme = self.theme,
            label = self.label,
        );
        let _ = write!(
            svg,
            r#"<circle cx="50" cy="50" r="{radius:.2}" fill="none" stroke="{track}" stroke-width="{width:.2}"/>"#,
            track = self.palette.track,
        );
        let _ = write!(
            svg,
            r#"<circle cx="50" cy="50" r="{radius:.2}" fill="none" stroke="{color}" stroke-width="{width:.2}" stroke-dasharray="{filled:.2} {circumference:.2}" transform="rotate(-90 50 50)"/>"#,
            color = self.segment.css(),
        );
        for edge in [OUTER, inner] {
            let _ = write!(
                svg,
                r#"<circle cx="50" cy="50" r="{edge:.2}" fill="none" stroke="{border}" stroke-width="2"/>"#,
                border = self.palette.border,
            );
        }
        let _ = write!(
            svg,
            r#"<text x="50" y="50" text-anchor="middle" dominant-baseline="middle" font-family="Inter, sans-serif" font-weight="bold" font-size="16" fill="{fill}">{label}</text></svg>"#,
            fill = self.palette.label,
            label = self.label,
        );
        svg
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// A chart attached to one rendered card.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartInstance {
    pub id: String,
    pub score: f64,
    pub chart: DonutChart,
}

#[derive(Debug)]
pub struct ChartRegistry {
    theme: Theme,
    updates: Option<Receiver<Theme>>,
    charts: Vec<ChartInstance>,
}

impl ChartRegistry {
    /// A registry with a fixed theme.
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            updates: None,
            charts: Vec::new(),
        }
    }

    /// A registry that follows every change made through `manager`.
    pub fn subscribed(manager: &mut ThemeManager) -> Self {
        Self {
            theme: manager.current(),
            updates: Some(manager.subscribe()),
            charts: Vec::new(),
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn create(&mut self, id: impl Into<String>, score: f64) -> &ChartInstance {
        let index = self.charts.len();
        self.charts.push(ChartInstance {
            id: id.into(),
            score,
            chart: DonutChart::sentiment(score, self.theme),
        });
        &self.charts[index]
    }

    pub fn destroy_all(&mut self) {
        self.charts.clear();
    }

    /// Destroy every chart and create one per `(id, score)`.
    pub fn rebuild<I>(&mut self, charts: I)
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        self.destroy_all();
        for (id, score) in charts {
            self.create(id, score);
        }
    }

    /// Apply pending theme notifications. Returns true when charts were redrawn.
    pub fn refresh(&mut self) -> bool {
        let latest = match &self.updates {
            Some(updates) => updates.try_iter().last(),
            None => None,
        };
        match latest {
            Some(theme) if theme != self.theme => {
                self.redraw(theme);
                true
            }
            _ => false,
        }
    }

    /// Recreate every chart with its original score under `theme`.
    pub fn redraw(&mut self, theme: Theme) {
        self.theme = theme;
        let previous: Vec<(String, f64)> = self
            .charts
            .drain(..)
            .map(|chart| (chart.id, chart.score))
            .collect();
        self.rebuild(previous);
    }

    pub fn get(&self, id: &str) -> Option<&ChartInstance> {
        self.charts.iter().find(|chart| chart.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChartInstance> {
        self.charts.iter()
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::MemoryThemeStore;

    #[test]
    fn segment_color_thresholds() {
        assert_eq!(segment_color(0.5), POSITIVE);
        assert_eq!(segment_color(0.2), NEUTRAL);
        assert_eq!(segment_color(0.0), NEUTRAL);
        assert_eq!(segment_color(-0.2), NEUTRAL);
        assert_eq!(segment_color(-0.21), NEGATIVE);
    }

    #[test]
    fn positivity_label() {
        assert_eq!(DonutChart::sentiment(0.4, Theme::Dark).label, "70%");
        assert_eq!(DonutChart::sentiment(-1.0, Theme::Dark).label, "0%");
        assert_eq!(DonutChart::sentiment(1.0, Theme::Dark).label, "100%");
    }

    #[test]
    fn palette_follows_theme() {
        let dark = DonutChart::sentiment(0.0, Theme::Dark);
        let light = DonutChart::sentiment(0.0, Theme::Light);
        assert_eq!(dark.palette.track, "#334155");
        assert_eq!(light.palette.track, "#e2e8f0");
        assert_eq!(light.palette.label, "#1e293b");
    }

    #[test]
    fn svg_contains_segment_and_label() {
        let svg = DonutChart::sentiment(0.6, Theme::Light).to_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("rgb(52, 211, 153)"));
        assert!(svg.contains(">80%</text>"));
        assert!(svg.contains("#e2e8f0"));
    }

    #[test]
    fn rebuild_replaces_previous_charts() {
        let mut registry = ChartRegistry::new(Theme::Dark);
        registry.create("chart-0", 0.1);
        registry.rebuild(vec![("chart-3".to_string(), -0.5)]);
        assert_eq!(registry.len(), 1);
        assert!(registry.get("chart-0").is_none());
        assert_eq!(registry.get("chart-3").unwrap().chart.segment, NEGATIVE);
    }

    #[test]
    fn theme_change_recreates_charts_with_same_scores() {
        let mut manager = ThemeManager::initialize(Box::new(MemoryThemeStore::default()));
        let mut registry = ChartRegistry::subscribed(&mut manager);
        registry.create("chart-0", 0.4);
        registry.create("chart-2", -0.9);

        assert!(!registry.refresh());
        manager.toggle().unwrap();
        assert!(registry.refresh());

        assert_eq!(registry.theme(), Theme::Light);
        let first = registry.get("chart-0").unwrap();
        assert_eq!(first.score, 0.4);
        assert_eq!(first.chart.palette, ChartPalette::for_theme(Theme::Light));
        assert_eq!(registry.get("chart-2").unwrap().score, -0.9);
        assert_eq!(registry.len(), 2);
    }
}
