#![forbid(unsafe_code)]

//! Screen configuration.
//!
//! # Environment Variables
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `WEFT_DOCK_BORDERS` | Merge touching borders (`1/0/true/false/yes/no/on/off`) |
//! | `WEFT_SCROLL_OPTIMIZE` | Enable scroll-region detection |
//! | `WEFT_SCROLL_MAX_SHIFT` | Largest shift tried, in rows |
//! | `WEFT_TAB_WIDTH` | Tab stop distance |
//!
//! Unparseable values are ignored.

use weft_render::scroll::ScrollConfig;

const ENV_DOCK_BORDERS: &str = "WEFT_DOCK_BORDERS";
const ENV_SCROLL_OPTIMIZE: &str = "WEFT_SCROLL_OPTIMIZE";
const ENV_SCROLL_MAX_SHIFT: &str = "WEFT_SCROLL_MAX_SHIFT";
const ENV_TAB_WIDTH: &str = "WEFT_TAB_WIDTH";

/// Per-screen settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenConfig {
    /// Merge touching borders of bordered nodes.
    pub dock_borders: bool,
    /// Scroll-region detection.
    pub scroll: ScrollConfig,
    /// Treat the whole screen as one scroll candidate every pass.
    pub full_screen_scroll: bool,
    /// Tab stop distance used when expanding content.
    pub tab_width: usize,
    /// Interned grapheme count above which the pool is collected after a pass.
    pub pool_gc_threshold: usize,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            dock_borders: false,
            scroll: ScrollConfig::default(),
            full_screen_scroll: false,
            tab_width: 8,
            pool_gc_threshold: 4096,
        }
    }
}

impl ScreenConfig {
    /// Defaults overridden from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Defaults overridden through a custom environment lookup (for tests).
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = env_bool(&get_env, ENV_DOCK_BORDERS) {
            config.dock_borders = v;
        }
        if let Some(v) = env_bool(&get_env, ENV_SCROLL_OPTIMIZE) {
            config.scroll.enabled = v;
        }
        if let Some(v) = get_env(ENV_SCROLL_MAX_SHIFT).and_then(|s| s.trim().parse::<u16>().ok()) {
            config.scroll.max_shift = Some(v);
        }
        if let Some(v) = get_env(ENV_TAB_WIDTH).and_then(|s| s.trim().parse::<usize>().ok()) {
            config.tab_width = v;
        }
        config
    }

    #[must_use]
    pub fn dock_borders(mut self, enabled: bool) -> Self {
        self.dock_borders = enabled;
        self
    }

    #[must_use]
    pub fn scroll(mut self, scroll: ScrollConfig) -> Self {
        self.scroll = scroll;
        self
    }

    #[must_use]
    pub fn full_screen_scroll(mut self, enabled: bool) -> Self {
        self.full_screen_scroll = enabled;
        self
    }

    #[must_use]
    pub fn tab_width(mut self, width: usize) -> Self {
        self.tab_width = width;
        self
    }

    #[must_use]
    pub fn pool_gc_threshold(mut self, threshold: usize) -> Self {
        self.pool_gc_threshold = threshold;
        self
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_bool<F>(get_env: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    get_env(key).and_then(|value| parse_bool(&value))
}
