//! Map tunables, loadable from a TOML file

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Bounds any configured zoom range must stay inside
pub const ZOOM_LIMITS: (f32, f32) = (1.0, 4.0);

/// Smallest grid cell at zoom 1, in pixels
pub const MIN_GRID_SPACING: f32 = 4.0;

/// Engine configuration. Every field has a default, so a partial file works.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Zoom multiplier for one wheel step toward the map
    pub zoom_in_factor: f32,
    /// Zoom multiplier for one wheel step away from the map
    pub zoom_out_factor: f32,

    /// Above this zoom every marker is drawn on its own
    pub cluster_max_zoom: f32,
    /// Clustering distance at zoom 1, in pixels. Divided by zoom.
    pub cluster_distance: f32,
    pub cluster_base_radius: f32,
    pub cluster_radius_scale: f32,

    /// Extra slack around a cluster circle when hovering
    pub cluster_hit_slack: f32,
    /// Pick radius for single markers (hover and click)
    pub marker_hit_radius: f32,

    pub marker_radius: f32,
    pub marker_hover_radius: f32,
    pub marker_selected_radius: f32,

    /// Grid cell size at zoom 1, in pixels
    pub grid_spacing: f32,
    pub show_legend: bool,

    /// Max memoized relevance results
    pub relevance_cache_size: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            min_zoom: 1.0,
            max_zoom: 4.0,
            zoom_in_factor: 1.1,
            zoom_out_factor: 0.9,
            cluster_max_zoom: 2.5,
            cluster_distance: 100.0,
            cluster_base_radius: 14.0,
            cluster_radius_scale: 6.0,
            cluster_hit_slack: 5.0,
            marker_hit_radius: 12.0,
            marker_radius: 6.0,
            marker_hover_radius: 8.0,
            marker_selected_radius: 10.0,
            grid_spacing: 50.0,
            show_legend: true,
            relevance_cache_size: 1024,
        }
    }
}

impl MapConfig {
    /// Load from a TOML file and validate
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        log::info!("Loaded map config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: MapConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(ZOOM_LIMITS.0..=ZOOM_LIMITS.1).contains(&self.min_zoom)
            || !(ZOOM_LIMITS.0..=ZOOM_LIMITS.1).contains(&self.max_zoom)
        {
            return Err(Error::InvalidConfig(format!(
                "zoom range {}..{} must lie within {}..{}",
                self.min_zoom, self.max_zoom, ZOOM_LIMITS.0, ZOOM_LIMITS.1
            )));
        }
        if self.max_zoom < self.min_zoom {
            return Err(Error::InvalidConfig(format!(
                "max_zoom {} is below min_zoom {}",
                self.max_zoom, self.min_zoom
            )));
        }
        let zoom_out_ok = self.zoom_out_factor > 0.0 && self.zoom_out_factor < 1.0;
        if !(self.zoom_in_factor > 1.0) || !zoom_out_ok {
            return Err(Error::InvalidConfig(
                "zoom_in_factor must be > 1 and zoom_out_factor in (0, 1)".into(),
            ));
        }
        let positive = [
            ("cluster_distance", self.cluster_distance),
            ("marker_hit_radius", self.marker_hit_radius),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if !(self.grid_spacing >= MIN_GRID_SPACING) {
            return Err(Error::InvalidConfig(format!(
                "grid_spacing must be at least {MIN_GRID_SPACING}, got {}",
                self.grid_spacing
            )));
        }
        if self.cluster_hit_slack < 0.0 {
            return Err(Error::InvalidConfig("cluster_hit_slack must not be negative".into()));
        }
        Ok(())
    }
}
