use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CollapseConfig {
    #[serde(default = "default_expand_label")]
    pub expand_label: String,
    #[serde(default = "default_shrink_label")]
    pub shrink_label: String,
    #[serde(default = "default_expanded_colspan")]
    pub expanded_colspan: u32,
    #[serde(default = "default_collapsed_colspan")]
    pub collapsed_colspan: u32,
}

impl Default for CollapseConfig {
    fn default() -> Self {
        Self {
            expand_label: default_expand_label(),
            shrink_label: default_shrink_label(),
            expanded_colspan: default_expanded_colspan(),
            collapsed_colspan: default_collapsed_colspan(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PresentationConfig {
    #[serde(default = "default_row_height")]
    pub row_height: f32,
    #[serde(default = "default_progress_every_lines")]
    pub progress_every_lines: u64,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            row_height: default_row_height(),
            progress_every_lines: default_progress_every_lines(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridConfig {
    /// Sortable header `n` compares the cell at `n + sort_cell_offset`.
    #[serde(default = "default_sort_cell_offset")]
    pub sort_cell_offset: usize,
    /// Year for date-like cells when neither the table nor the page names one.
    /// Falls back to the current year.
    #[serde(default)]
    pub reference_year: Option<i32>,
    #[serde(default)]
    pub collapse: CollapseConfig,
    #[serde(default)]
    pub presentation: PresentationConfig,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            sort_cell_offset: default_sort_cell_offset(),
            reference_year: None,
            collapse: CollapseConfig::default(),
            presentation: PresentationConfig::default(),
        }
    }
}

fn default_sort_cell_offset() -> usize {
    1
}

fn default_expand_label() -> String {
    "tap to expand".to_string()
}

fn default_shrink_label() -> String {
    "tap to shrink".to_string()
}

fn default_expanded_colspan() -> u32 {
    3
}

fn default_collapsed_colspan() -> u32 {
    1
}

fn default_row_height() -> f32 {
    24.0
}

fn default_progress_every_lines() -> u64 {
    100
}

/// Reads `config.toml` from the feed's folder, or defaults when there is none.
pub fn load_grid_config(feed_folder: &Path) -> Result<GridConfig> {
    let config_path = feed_folder.join("config.toml");
    if !config_path.exists() {
        info!(
            "config.toml not found next to feed, using defaults: {}",
            config_path.display()
        );
        return Ok(GridConfig::default());
    }

    let raw = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config.toml at {}", config_path.display()))?;

    parse_grid_config(&raw)
        .with_context(|| format!("Failed to parse config.toml at {}", config_path.display()))
}

pub fn parse_grid_config(raw: &str) -> Result<GridConfig> {
    Ok(toml::from_str::<GridConfig>(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse_grid_config("").unwrap();
        assert_eq!(config.sort_cell_offset, 1);
        assert_eq!(config.reference_year, None);
        assert_eq!(config.collapse, CollapseConfig::default());
        assert_eq!(config.presentation.progress_every_lines, 100);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = parse_grid_config(
            r#"
            reference_year = 2024
            sort_cell_offset = 2

            [collapse]
            expand_label = "Tap to expand"
            "#,
        )
        .unwrap();
        assert_eq!(config.reference_year, Some(2024));
        assert_eq!(config.sort_cell_offset, 2);
        assert_eq!(config.collapse.expand_label, "Tap to expand");
        assert_eq!(config.collapse.shrink_label, "tap to shrink");
        assert_eq!(config.collapse.expanded_colspan, 3);
    }

    #[test]
    fn wrong_types_are_reported() {
        assert!(parse_grid_config("sort_cell_offset = \"one\"").is_err());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = std::env::temp_dir().join("scoregrid-config-missing");
        let config = load_grid_config(&dir).unwrap();
        assert_eq!(config.sort_cell_offset, 1);
    }
}
