use std::time::Duration;

use crate::css::DEFAULT_OVERLAY_SELECTORS;
use crate::layout::{ReceiptWidth, StaticLayoutResolver};

/// Minimum number of animation frames awaited before printing
pub const MIN_SETTLE_FRAMES: u32 = 2;

/// Print pipeline configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | PRINT_FALLBACK_DELAY_MS | 0 | Release fallback delay after the print trigger |
/// | PRINT_SETTLE_FRAMES | 2 | Animation frames awaited before printing (at least 2) |
/// | PRINT_FONT_WAIT_MS | 3000 | Upper bound on the font readiness wait |
/// | PRINT_DEFAULT_RECEIPT_WIDTH_MM | 80 | Receipt width when the request has no hint |
/// | PRINT_DEFAULT_TITLE | print | Document title when the request has none |
/// | PRINT_OVERLAY_SELECTORS | .print-overlay,[data-print-decoration],.watermark | Layers hidden on receipts |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintConfig {
    /// Delay of the release fallback (milliseconds)
    pub fallback_delay_ms: u64,
    /// Animation frames to await once mounted
    pub settle_frames: u32,
    /// Font readiness wait bound (milliseconds)
    pub font_wait_ms: u64,
    /// Used by the reference layout policy
    pub default_receipt_width: ReceiptWidth,
    pub default_title: String,
    /// Selectors hidden on thermal output
    pub overlay_selectors: Vec<String>,
}

impl PrintConfig {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            fallback_delay_ms: env_parse("PRINT_FALLBACK_DELAY_MS")
                .unwrap_or(defaults.fallback_delay_ms),
            settle_frames: env_parse("PRINT_SETTLE_FRAMES")
                .unwrap_or(defaults.settle_frames)
                .max(MIN_SETTLE_FRAMES),
            font_wait_ms: env_parse("PRINT_FONT_WAIT_MS").unwrap_or(defaults.font_wait_ms),
            default_receipt_width: env_parse("PRINT_DEFAULT_RECEIPT_WIDTH_MM")
                .and_then(ReceiptWidth::from_mm)
                .unwrap_or(defaults.default_receipt_width),
            default_title: std::env::var("PRINT_DEFAULT_TITLE")
                .ok()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(defaults.default_title),
            overlay_selectors: std::env::var("PRINT_OVERLAY_SELECTORS")
                .ok()
                .map(|v| parse_selectors(&v))
                .unwrap_or(defaults.overlay_selectors),
        }
    }

    pub fn with_fallback_delay(mut self, delay: Duration) -> Self {
        self.fallback_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_settle_frames(mut self, frames: u32) -> Self {
        self.settle_frames = frames.max(MIN_SETTLE_FRAMES);
        self
    }

    pub fn with_font_wait(mut self, wait: Duration) -> Self {
        self.font_wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = title.into();
        self
    }

    pub fn with_overlay_selectors(mut self, selectors: Vec<String>) -> Self {
        self.overlay_selectors = selectors;
        self
    }

    pub fn fallback_delay(&self) -> Duration {
        Duration::from_millis(self.fallback_delay_ms)
    }

    pub fn font_wait(&self) -> Duration {
        Duration::from_millis(self.font_wait_ms)
    }

    pub fn settle_frames(&self) -> u32 {
        self.settle_frames.max(MIN_SETTLE_FRAMES)
    }

    /// Reference layout policy using this configuration's defaults
    pub fn layout_resolver(&self) -> StaticLayoutResolver {
        StaticLayoutResolver::new(self.default_receipt_width)
    }
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            fallback_delay_ms: 0,
            settle_frames: MIN_SETTLE_FRAMES,
            font_wait_ms: 3000,
            default_receipt_width: ReceiptWidth::Mm80,
            default_title: "print".into(),
            overlay_selectors: DEFAULT_OVERLAY_SELECTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_selectors(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PrintConfig::default();
        assert_eq!(config.fallback_delay(), Duration::ZERO);
        assert_eq!(config.settle_frames(), 2);
        assert_eq!(config.default_receipt_width, ReceiptWidth::Mm80);
        assert_eq!(config.overlay_selectors.len(), 3);
    }

    #[test]
    fn test_settle_frames_clamped() {
        let config = PrintConfig::default().with_settle_frames(0);
        assert_eq!(config.settle_frames(), MIN_SETTLE_FRAMES);
        let config = PrintConfig::default().with_settle_frames(5);
        assert_eq!(config.settle_frames(), 5);
    }

    #[test]
    fn test_huge_durations_saturate() {
        let config = PrintConfig::default()
            .with_fallback_delay(Duration::MAX)
            .with_font_wait(Duration::from_secs(u64::MAX));
        assert_eq!(config.fallback_delay_ms, u64::MAX);
        assert_eq!(config.font_wait_ms, u64::MAX);
    }

    #[test]
    fn test_parse_selectors() {
        assert_eq!(
            parse_selectors(" .a , ,[data-x] "),
            vec![".a".to_string(), "[data-x]".to_string()]
        );
    }
}
