use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub charts: ChartsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub data_csv: PathBuf,
    pub boundaries: PathBuf,
    #[serde(default = "default_boundary_name_property")]
    pub boundary_name_property: String,
    #[serde(default = "default_data_source_url")]
    pub data_source_url: String, // Displayed only, never fetched
}

fn default_boundary_name_property() -> String {
    "ADMIN".to_string()
}

fn default_data_source_url() -> String {
    "https://public.opendatasoft.com/explore/dataset/significant-volcanic-eruption-database/table/"
        .to_string()
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8501 }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ChartsConfig {
    pub static_map: StaticMapConfig,
    pub interactive: InteractiveMapConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StaticMapConfig {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u32,
    pub alpha: f64,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub marker_color: String, // Hex code
    pub outline_color: String,
    pub marker_radius: u32,
    pub max_marker_radius: u32,
}

impl Default for StaticMapConfig {
    fn default() -> Self {
        Self {
            width_in: 10.0,
            height_in: 8.0,
            dpi: 100,
            alpha: 0.7,
            title: "Volcano Locations Around the Globe".to_string(),
            x_label: "Longitude".to_string(),
            y_label: "Latitude".to_string(),
            marker_color: "#1f77b4".to_string(),
            outline_color: "#c8c8c8".to_string(),
            marker_radius: 3,
            max_marker_radius: 12,
        }
    }
}

impl StaticMapConfig {
    pub fn pixel_size(&self) -> (u32, u32) {
        let dpi = self.dpi as f64;
        (
            (self.width_in * dpi).round() as u32,
            (self.height_in * dpi).round() as u32,
        )
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InteractiveMapConfig {
    pub title: String,
    pub title_font_size: u32,
    pub title_color: String,
    pub title_font_family: String,
    pub title_x: f64,
    pub title_y: f64,
    pub height: u32,
    pub width: u32,
    pub zoom: f64,
    pub map_style: String,
    pub legend_title: String,
    pub marker_size: f64,
    pub max_marker_size: f64,
    pub plotly_js_url: String,
}

impl Default for InteractiveMapConfig {
    fn default() -> Self {
        Self {
            title: "<b>'Volcanoes Around the Globe'</b>".to_string(),
            title_font_size: 32,
            title_color: "Navy".to_string(),
            title_font_family: "Times Roman, sans-serif".to_string(),
            title_x: 0.38,
            title_y: 0.95,
            height: 1500,
            width: 2300,
            zoom: 1.5,
            map_style: "open-street-map".to_string(),
            legend_title: "Volcano Type".to_string(),
            marker_size: 6.0,
            max_marker_size: 20.0,
            plotly_js_url: "https://cdn.plot.ly/plotly-2.35.2.min.js".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}
