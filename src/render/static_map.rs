use super::{hex_to_rgb, max_population, population_scale};
use crate::config::StaticMapConfig;
use crate::normalize::GeoBoundary;
use crate::types::{PopulationDisplay, VolcanoRecord};
use anyhow::{Context, Result};
use plotters::prelude::*;

/// A rendered single-panel scatter plot.
#[derive(Debug, Clone)]
pub struct StaticChart {
    pub svg: String,
    pub width: u32,
    pub height: u32,
}

/// Longitude/latitude scatter of `subset` over the country outlines in `boundary`.
pub fn render_static(
    subset: &[&VolcanoRecord],
    boundary: &GeoBoundary,
    population: PopulationDisplay,
    config: &StaticMapConfig,
) -> Result<StaticChart> {
    let (width, height) = config.pixel_size();
    let mut svg = String::new();

    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        root.fill(&WHITE).context("Failed to clear static chart")?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&config.title, ("sans-serif", 24).into_font())
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(-180f64..180f64, -90f64..90f64)
            .context("Failed to build chart axes")?;

        chart
            .configure_mesh()
            .x_desc(config.x_label.clone())
            .y_desc(config.y_label.clone())
            .draw()
            .context("Failed to draw chart mesh")?;

        let outline = hex_to_rgb(&config.outline_color).stroke_width(1);
        chart
            .draw_series(boundary.outlines().map(|ring| PathElement::new(ring, outline)))
            .context("Failed to draw country outlines")?;

        let marker = hex_to_rgb(&config.marker_color).mix(config.alpha).filled();
        let base = config.marker_radius as f64;
        let largest = if population.enabled() {
            max_population(subset.iter().copied())
        } else {
            0.0
        };
        chart
            .draw_series(subset.iter().map(|r| {
                let radius = population_scale(r.population, largest, base, config.max_marker_radius as f64);
                Circle::new((r.longitude, r.latitude), radius.round() as u32, marker)
            }))
            .context("Failed to draw volcano markers")?;

        root.present().context("Failed to finish static chart")?;
    }

    Ok(StaticChart { svg, width, height })
}
