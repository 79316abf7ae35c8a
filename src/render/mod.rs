pub mod interactive;
pub mod static_map;

use plotters::style::RGBColor;
use std::collections::HashMap;

pub use interactive::{build_figure, Figure};
pub use static_map::{render_static, StaticChart};

/// Plotly's default qualitative colour sequence.
pub const QUALITATIVE_PALETTE: [&str; 10] = [
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A",
    "#19D3F3", "#FF6692", "#B6E880", "#FF97FF", "#FECB52",
];

/// Colour per volcano type, fixed by the type's position in the sorted type list.
#[derive(Debug, Clone, Default)]
pub struct TypePalette {
    colors: HashMap<String, &'static str>,
}

impl TypePalette {
    /// `types` is the selector option list; the "All" entry is ignored.
    pub fn new(types: &[String]) -> Self {
        let colors = types
            .iter()
            .filter(|t| t.as_str() != crate::types::ALL_TYPES)
            .enumerate()
            .map(|(i, t)| (t.clone(), QUALITATIVE_PALETTE[i % QUALITATIVE_PALETTE.len()]))
            .collect();
        Self { colors }
    }

    pub fn color_for(&self, volcano_type: &str) -> &'static str {
        self.colors
            .get(volcano_type)
            .copied()
            .unwrap_or(QUALITATIVE_PALETTE[0])
    }
}

pub fn hex_to_rgb(hex: &str) -> RGBColor {
    let hex = hex.trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .unwrap_or(0)
    };
    RGBColor(channel(0..2), channel(2..4), channel(4..6))
}

/// `sqrt(population / max)` scaled into `[base, max_size]`; rows without population keep `base`.
pub(crate) fn population_scale(population: Option<f64>, max_population: f64, base: f64, max_size: f64) -> f64 {
    match population {
        Some(p) if p > 0.0 && max_population > 0.0 => {
            base + (max_size - base) * (p / max_population).sqrt()
        }
        _ => base,
    }
}

pub(crate) fn max_population<'a>(records: impl IntoIterator<Item = &'a crate::types::VolcanoRecord>) -> f64 {
    records
        .into_iter()
        .filter_map(|r| r.population)
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_is_positional_and_cycles() {
        let types: Vec<String> = std::iter::once("All".to_string())
            .chain((0..11).map(|i| format!("T{:02}", i)))
            .collect();
        let palette = TypePalette::new(&types);

        assert_eq!(palette.color_for("T00"), "#636EFA");
        assert_eq!(palette.color_for("T01"), "#EF553B");
        assert_eq!(palette.color_for("T10"), "#636EFA");
    }

    #[test]
    fn hex_parsing_tolerates_bad_input() {
        assert_eq!(hex_to_rgb("#1f77b4"), RGBColor(31, 119, 180));
        assert_eq!(hex_to_rgb("zz"), RGBColor(0, 0, 0));
    }

    #[test]
    fn population_scale_bounds() {
        assert_eq!(population_scale(None, 100.0, 3.0, 12.0), 3.0);
        assert_eq!(population_scale(Some(100.0), 100.0, 3.0, 12.0), 12.0);
        assert_eq!(population_scale(Some(25.0), 100.0, 3.0, 13.0), 8.0);
        assert_eq!(population_scale(Some(5.0), 0.0, 3.0, 12.0), 3.0);
    }
}
