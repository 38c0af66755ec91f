//! Persisted theme color, restored at startup.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::AppError;
use crate::storage::{KeyValueStore, THEME_COLOR_KEY, get_json, set_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeColor {
    pub name: &'static str,
    pub rgb: &'static str,
}

pub const PALETTE: [ThemeColor; 5] = [
    ThemeColor { name: "pink", rgb: "rgb(187, 134, 252)" },
    ThemeColor { name: "teal", rgb: "rgb(0, 191, 165)" },
    ThemeColor { name: "indigo", rgb: "rgb(61, 90, 254)" },
    ThemeColor { name: "red", rgb: "rgb(255, 82, 82)" },
    ThemeColor { name: "green", rgb: "rgb(100, 221, 23)" },
];

impl ThemeColor {
    /// Accepts either the color name or its rgb code.
    pub fn lookup(value: &str) -> Option<Self> {
        let value = value.trim();
        PALETTE
            .iter()
            .copied()
            .find(|c| c.name.eq_ignore_ascii_case(value) || c.rgb == value)
    }
}

impl fmt::Display for ThemeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.rgb)
    }
}

pub struct Theme {
    storage: Arc<dyn KeyValueStore>,
}

impl Theme {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// The saved color; unknown saved values are ignored.
    pub async fn current(&self) -> Result<Option<ThemeColor>, AppError> {
        let saved: Option<String> = get_json(self.storage.as_ref(), THEME_COLOR_KEY).await?;
        Ok(saved.and_then(|rgb| {
            let color = ThemeColor::lookup(&rgb);
            if color.is_none() {
                warn!("ignoring unknown theme color {}", rgb);
            }
            color
        }))
    }

    pub async fn select(&self, value: &str) -> Result<ThemeColor, AppError> {
        let color = ThemeColor::lookup(value)
            .ok_or_else(|| AppError::Validation(format!("unknown theme color: {}", value)))?;
        set_json(self.storage.as_ref(), THEME_COLOR_KEY, color.rgb).await?;
        info!("theme color set to {}", color.name);
        Ok(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_lookup_by_name_or_rgb() {
        assert_eq!(ThemeColor::lookup("Teal").map(|c| c.rgb), Some("rgb(0, 191, 165)"));
        assert_eq!(ThemeColor::lookup("rgb(255, 82, 82)").map(|c| c.name), Some("red"));
        assert!(ThemeColor::lookup("mauve").is_none());
    }

    #[tokio::test]
    async fn test_select_persists_rgb() {
        let storage = Arc::new(MemoryStorage::new());
        let theme = Theme::new(storage.clone());
        assert!(theme.current().await.unwrap().is_none());

        theme.select("indigo").await.unwrap();
        assert_eq!(
            storage.get(THEME_COLOR_KEY).await.unwrap().as_deref(),
            Some("\"rgb(61, 90, 254)\"")
        );
        assert_eq!(theme.current().await.unwrap().map(|c| c.name), Some("indigo"));
    }

    #[tokio::test]
    async fn test_select_unknown_color_keeps_previous() {
        let theme = Theme::new(Arc::new(MemoryStorage::new()));
        theme.select("green").await.unwrap();
        assert!(matches!(theme.select("mauve").await, Err(AppError::Validation(_))));
        assert_eq!(theme.current().await.unwrap().map(|c| c.name), Some("green"));
    }
}
