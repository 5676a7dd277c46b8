/// Theme manager and chart registry tests.
use anyhow::{Result, bail};
use docinsight::chart::{ChartPalette, ChartRegistry, NEGATIVE, NEUTRAL, POSITIVE, segment_color};
use docinsight::theme::{MemoryThemeStore, Theme, ThemeManager, ThemeStore};

struct ReadOnlyStore;

impl ThemeStore for ReadOnlyStore {
    fn load(&self) -> Option<Theme> {
        Some(Theme::Light)
    }

    fn save(&self, _theme: Theme) -> Result<()> {
        bail!("read-only file system")
    }
}

#[test]
fn toggle_persists_and_flips_icons() {
    let store = MemoryThemeStore::default();
    let mut manager = ThemeManager::initialize(Box::new(store.clone()));
    assert_eq!(manager.current(), Theme::Dark);
    assert!(manager.current().icons().sun_visible);

    assert_eq!(manager.toggle().unwrap(), Theme::Light);
    assert_eq!(store.load(), Some(Theme::Light));
    let icons = manager.current().icons();
    assert!(icons.moon_visible);
    assert!(!icons.sun_visible);

    // A fresh manager over the same store starts from the saved choice.
    let restored = ThemeManager::initialize(Box::new(store));
    assert_eq!(restored.current(), Theme::Light);
}

#[test]
fn every_subscriber_is_notified() {
    let mut manager = ThemeManager::initialize(Box::new(MemoryThemeStore::default()));
    let first = manager.subscribe();
    let second = manager.subscribe();

    manager.toggle().unwrap();
    manager.set(Theme::Dark).unwrap();

    assert_eq!(first.try_iter().collect::<Vec<_>>(), vec![Theme::Light, Theme::Dark]);
    assert_eq!(second.try_iter().collect::<Vec<_>>(), vec![Theme::Light, Theme::Dark]);
}

#[test]
fn failed_save_still_switches_the_session() {
    let mut manager = ThemeManager::initialize(Box::new(ReadOnlyStore));
    let updates = manager.subscribe();

    let err = manager.toggle().unwrap_err();
    assert!(format!("{err:#}").contains("failed to persist theme preference"));
    assert_eq!(manager.current(), Theme::Dark);
    assert_eq!(updates.try_recv().unwrap(), Theme::Dark);
}

#[test]
fn charts_are_recreated_with_new_colors_and_same_score() {
    let mut manager = ThemeManager::initialize(Box::new(MemoryThemeStore::default()));
    let mut registry = ChartRegistry::subscribed(&mut manager);
    registry.create("chart-0", 0.45);
    registry.create("chart-3", -0.6);
    let before = registry.get("chart-0").unwrap().chart.clone();
    assert_eq!(before.palette, ChartPalette::for_theme(Theme::Dark));

    manager.toggle().unwrap();
    assert!(registry.refresh());

    assert_eq!(registry.theme(), Theme::Light);
    assert_eq!(registry.len(), 2);
    let after = &registry.get("chart-0").unwrap().chart;
    assert_eq!(after.palette, ChartPalette::for_theme(Theme::Light));
    assert_ne!(after.palette, before.palette);
    assert_eq!(after.score, before.score);
    assert_eq!(after.segment, before.segment);
    assert_eq!(after.label, before.label);
    assert_eq!(registry.get("chart-3").unwrap().score, -0.6);

    // Nothing pending: no redraw.
    assert!(!registry.refresh());
}

#[test]
fn segment_color_thresholds() {
    assert_eq!(segment_color(0.45), POSITIVE);
    assert_eq!(segment_color(0.2), NEUTRAL);
    assert_eq!(segment_color(0.0), NEUTRAL);
    assert_eq!(segment_color(-0.2), NEUTRAL);
    assert_eq!(segment_color(-0.21), NEGATIVE);
}

#[test]
fn chart_svg_carries_theme_and_label() {
    let mut registry = ChartRegistry::new(Theme::Light);
    let svg = registry.create("chart-1", 0.5).chart.to_svg();
    assert!(svg.contains(r#"data-theme="light""#));
    assert!(svg.contains("75%"));
}
