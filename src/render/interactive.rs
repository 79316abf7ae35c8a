use super::{max_population, population_scale, TypePalette};
use crate::config::InteractiveMapConfig;
use crate::types::{PopulationDisplay, VolcanoRecord};
use anyhow::{Context, Result};
use serde::Serialize;

const HOVER_TEMPLATE: &str = "<b>%{hovertext}</b><br><br>\
Type=%{customdata[0]}<br>Country=%{customdata[1]}<br>\
Region=%{customdata[2]}<br>Status=%{customdata[3]}<br>\
Latitude=%{lat}<br>Longitude=%{lon}<extra></extra>";

/// Plotly figure: one `scattermapbox` trace per volcano type.
#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<MapTrace>,
    pub layout: Layout,
    #[serde(skip)]
    plotly_js_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapTrace {
    #[serde(rename = "type")]
    pub trace_type: &'static str,
    pub mode: &'static str,
    pub name: String,
    pub legendgroup: String,
    pub showlegend: bool,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub hovertext: Vec<String>,
    pub customdata: Vec<[String; 4]>,
    pub hovertemplate: &'static str,
    pub marker: Marker,
}

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub color: &'static str,
    pub size: MarkerSize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizemode: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MarkerSize {
    Uniform(f64),
    PerPoint(Vec<f64>),
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub title: Title,
    pub height: u32,
    pub width: u32,
    pub autosize: bool,
    pub hovermode: &'static str,
    pub mapbox: Mapbox,
    pub legend: Legend,
}

#[derive(Debug, Clone, Serialize)]
pub struct Title {
    pub text: String,
    pub font: Font,
    pub x: f64,
    pub xanchor: &'static str,
    pub y: f64,
    pub yanchor: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Font {
    pub size: u32,
    pub color: String,
    pub family: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Mapbox {
    pub style: String,
    pub zoom: f64,
    pub center: LatLon,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Legend {
    pub title: LegendTitle,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegendTitle {
    pub text: String,
}

pub fn build_figure(
    subset: &[&VolcanoRecord],
    palette: &TypePalette,
    population: PopulationDisplay,
    config: &InteractiveMapConfig,
) -> Figure {
    let largest = if population.enabled() {
        max_population(subset.iter().copied())
    } else {
        0.0
    };

    // 1. One trace per type, in order of first appearance
    let mut traces: Vec<MapTrace> = Vec::new();
    let mut sizes: Vec<Vec<f64>> = Vec::new();

    for record in subset {
        let index = match traces.iter().position(|t| t.name == record.volcano_type) {
            Some(i) => i,
            None => {
                traces.push(empty_trace(&record.volcano_type, palette, config));
                sizes.push(Vec::new());
                traces.len() - 1
            }
        };

        let trace = &mut traces[index];
        trace.lat.push(record.latitude);
        trace.lon.push(record.longitude);
        trace.hovertext.push(record.name.clone());
        trace.customdata.push([
            record.volcano_type.clone(),
            record.country.clone(),
            record.region.clone(),
            record.status.clone(),
        ]);
        sizes[index].push(population_scale(
            record.population,
            largest,
            config.marker_size,
            config.max_marker_size,
        ));
    }

    // 2. Switch to per-point sizes when population display is on
    if population.enabled() {
        for (trace, trace_sizes) in traces.iter_mut().zip(sizes) {
            trace.marker.size = MarkerSize::PerPoint(trace_sizes);
            trace.marker.sizemode = Some("diameter");
        }
    }

    Figure {
        data: traces,
        layout: build_layout(subset, config),
        plotly_js_url: config.plotly_js_url.clone(),
    }
}

fn empty_trace(volcano_type: &str, palette: &TypePalette, config: &InteractiveMapConfig) -> MapTrace {
    MapTrace {
        trace_type: "scattermapbox",
        mode: "markers",
        name: volcano_type.to_string(),
        legendgroup: volcano_type.to_string(),
        showlegend: true,
        lat: Vec::new(),
        lon: Vec::new(),
        hovertext: Vec::new(),
        customdata: Vec::new(),
        hovertemplate: HOVER_TEMPLATE,
        marker: Marker {
            color: palette.color_for(volcano_type),
            size: MarkerSize::Uniform(config.marker_size),
            sizemode: None,
        },
    }
}

fn build_layout(subset: &[&VolcanoRecord], config: &InteractiveMapConfig) -> Layout {
    Layout {
        title: Title {
            text: config.title.clone(),
            font: Font {
                size: config.title_font_size,
                color: config.title_color.clone(),
                family: config.title_font_family.clone(),
            },
            x: config.title_x,
            xanchor: "center",
            y: config.title_y,
            yanchor: "bottom",
        },
        height: config.height,
        width: config.width,
        autosize: true,
        hovermode: "closest",
        mapbox: Mapbox {
            style: config.map_style.clone(),
            zoom: config.zoom,
            center: mean_center(subset),
        },
        legend: Legend {
            title: LegendTitle {
                text: config.legend_title.clone(),
            },
        },
    }
}

fn mean_center(subset: &[&VolcanoRecord]) -> LatLon {
    if subset.is_empty() {
        return LatLon { lat: 0.0, lon: 0.0 };
    }
    let n = subset.len() as f64;
    LatLon {
        lat: subset.iter().map(|r| r.latitude).sum::<f64>() / n,
        lon: subset.iter().map(|r| r.longitude).sum::<f64>() / n,
    }
}

impl Figure {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize figure")
    }

    pub fn to_script_json(&self) -> Result<String> {
        // Keep "</script>" inside strings from closing the element
        Ok(self.to_json()?.replace("</", "<\\/"))
    }

    pub fn plotly_js_url(&self) -> &str {
        &self.plotly_js_url
    }

    pub fn embed(&self, target: &str) -> Result<String> {
        Ok(format!(
            "<div id=\"{target}\"></div>\n\
             <script>\n\
             const figure = {json};\n\
             Plotly.newPlot(\"{target}\", figure.data, figure.layout);\n\
             </script>",
            json = self.to_script_json()?,
        ))
    }

    pub fn to_html(&self) -> Result<String> {
        Ok(format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
             <title>Volcanoes Around the Globe</title>\n\
             <script src=\"{url}\"></script>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
            url = self.plotly_js_url,
            body = self.embed("volcano-map")?,
        ))
    }
}
