use crate::config::AppConfig;
use crate::data::DatasetCache;
use crate::filter::{distinct_types, filter_by_type};
use crate::normalize::{normalize_countries, GeoBoundary};
use crate::render::{build_figure, render_static, Figure, StaticChart, TypePalette};
use crate::types::{FilterSelection, PlotBackend, PopulationDisplay, VolcanoDataset, VolcanoRecord};
use anyhow::{Context, Result};
use std::fmt::Write;
use tracing::debug;

#[derive(Debug, Clone)]
pub enum ChartOutput {
    Static(StaticChart),
    Interactive(Figure),
}

/// Everything the page shows for one selection.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub selection: FilterSelection,
    pub type_options: Vec<String>,
    /// Normalized dataset, present when the raw-data checkbox is ticked.
    pub table: Option<VolcanoDataset>,
    pub matched_rows: usize,
    pub chart: ChartOutput,
    pub data_source_url: String,
}

/// One pass of the dashboard: cached load, country normalization, then [`build_view`].
pub fn run_pipeline(
    cache: &mut DatasetCache,
    boundary: &GeoBoundary,
    config: &AppConfig,
    selection: &FilterSelection,
) -> Result<DashboardView> {
    let raw = cache
        .get_or_load(&config.input.data_csv)
        .with_context(|| format!("Failed to load volcano data from {:?}", config.input.data_csv))?;
    let working = normalize_countries(&raw);
    build_view(&working, boundary, selection, config)
}

pub fn build_view(
    working: &[VolcanoRecord],
    boundary: &GeoBoundary,
    selection: &FilterSelection,
    config: &AppConfig,
) -> Result<DashboardView> {
    let type_options = distinct_types(working);
    let subset = filter_by_type(working, &selection.type_filter);
    debug!(
        "Selection '{}' matched {} of {} rows",
        selection.type_filter,
        subset.len(),
        working.len()
    );

    let chart = match selection.backend {
        PlotBackend::Matplotlib => ChartOutput::Static(render_static(
            &subset,
            boundary,
            selection.population,
            &config.charts.static_map,
        )?),
        PlotBackend::Plotly => ChartOutput::Interactive(build_figure(
            &subset,
            &TypePalette::new(&type_options),
            selection.population,
            &config.charts.interactive,
        )),
    };

    Ok(DashboardView {
        selection: selection.clone(),
        matched_rows: subset.len(),
        table: selection.show_data.then(|| working.to_vec()),
        type_options,
        chart,
        data_source_url: config.input.data_source_url.clone(),
    })
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = "body{font-family:sans-serif;margin:2rem;}\
.controls{display:flex;gap:2rem;align-items:flex-start;}\
fieldset{border:none;padding:0;}\
.table{max-height:24rem;overflow:auto;margin:1rem 0;}\
table{border-collapse:collapse;font-size:0.85rem;}\
th,td{border:1px solid #ddd;padding:0.2rem 0.5rem;text-align:left;}";

/// Full HTML page for `view`. Every control resubmits the form on change.
pub fn render_page(view: &DashboardView) -> Result<String> {
    let mut html = String::new();
    let plotly_script = match &view.chart {
        ChartOutput::Interactive(figure) => {
            format!("<script src=\"{}\"></script>\n", escape_html(figure.plotly_js_url()))
        }
        ChartOutput::Static(_) => String::new(),
    };

    write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Volcanoes Around the World</title>\n{plotly_script}<style>{STYLE}</style>\n\
         </head>\n<body>\n<h1>Volcanoes Around the World</h1>\n"
    )?;

    html.push_str("<form method=\"get\" action=\"/\">\n");
    write!(
        html,
        "<label><input type=\"checkbox\" name=\"show_data\" value=\"on\"{} onchange=\"this.form.submit()\"> Show Volcano Data</label>\n",
        checked(view.selection.show_data)
    )?;

    html.push_str("<div class=\"controls\">\n<label>Choose a Type <select name=\"type\" onchange=\"this.form.submit()\">\n");
    for option in &view.type_options {
        write!(
            html,
            "<option value=\"{0}\"{1}>{0}</option>\n",
            escape_html(option),
            if option == view.selection.type_filter.label() { " selected" } else { "" }
        )?;
    }
    html.push_str("</select></label>\n");

    html.push_str("<fieldset><legend>Show Population</legend>\n");
    for choice in [PopulationDisplay::Yes, PopulationDisplay::No] {
        radio(&mut html, "population", choice.label(), view.selection.population == choice)?;
    }
    html.push_str("</fieldset>\n<fieldset><legend>Choose Plot Type</legend>\n");
    for backend in PlotBackend::ALL {
        radio(&mut html, "backend", backend.label(), view.selection.backend == backend)?;
    }
    html.push_str("</fieldset>\n</div>\n</form>\n");

    if let Some(table) = &view.table {
        html.push_str("<h3>This is my volcanoes dataset:</h3>\n");
        write_table(&mut html, table)?;
    }

    let url = escape_html(&view.data_source_url);
    write!(html, "<p>Data Source: <a href=\"{url}\">{url}</a></p>\n")?;
    write!(
        html,
        "<p>{} volcanoes of type {}</p>\n",
        view.matched_rows,
        escape_html(view.selection.type_filter.label())
    )?;

    match &view.chart {
        ChartOutput::Static(chart) => {
            html.push_str("<h2>Matplotlib Map</h2>\n");
            html.push_str(&chart.svg);
            html.push('\n');
        }
        ChartOutput::Interactive(figure) => {
            html.push_str("<h2>Plotly Map</h2>\n");
            html.push_str(&figure.embed("volcano-map")?);
            html.push('\n');
        }
    }

    html.push_str("</body>\n</html>\n");
    Ok(html)
}

fn checked(on: bool) -> &'static str {
    if on { " checked" } else { "" }
}

fn radio(html: &mut String, name: &str, value: &str, on: bool) -> std::fmt::Result {
    write!(
        html,
        "<label><input type=\"radio\" name=\"{name}\" value=\"{value}\"{} onchange=\"this.form.submit()\"> {value}</label>\n",
        checked(on)
    )
}

fn write_table(html: &mut String, records: &[VolcanoRecord]) -> std::fmt::Result {
    html.push_str("<div class=\"table\"><table>\n<tr><th>Volcano Name</th><th>Type</th><th>Country</th>\
<th>Region</th><th>Status</th><th>Latitude</th><th>Longitude</th><th>Population</th></tr>\n");
    for r in records {
        write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&r.name),
            escape_html(&r.volcano_type),
            escape_html(&r.country),
            escape_html(&r.region),
            escape_html(&r.status),
            r.latitude,
            r.longitude,
            r.population.map(|p| p.to_string()).unwrap_or_default(),
        )?;
    }
    html.push_str("</table></div>\n");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeFilter;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn config_for(csv: PathBuf) -> AppConfig {
        let mut config = AppConfig::from_toml(
            r#"
            [input]
            data_csv = "unused.csv"
            boundaries = "unused.geojson"
            "#,
        )
        .unwrap();
        config.input.data_csv = csv;
        config
    }

    fn record(name: &str, volcano_type: &str, country: &str) -> VolcanoRecord {
        VolcanoRecord {
            name: name.to_string(),
            volcano_type: volcano_type.to_string(),
            country: country.to_string(),
            region: "Region".to_string(),
            status: "Holocene".to_string(),
            latitude: 10.0,
            longitude: 20.0,
            population: Some(1000.0),
        }
    }

    fn sample() -> Vec<VolcanoRecord> {
        vec![
            record("Rainier", "Stratovolcano", "United States of America"),
            record("Kilimanjaro", "Shield", "United Republic of Tanzania"),
            record("Etna", "Stratovolcano", "Italy"),
        ]
    }

    #[test]
    fn backend_choice_selects_exactly_one_chart() {
        let config = config_for(PathBuf::from("unused.csv"));
        let data = sample();

        let mut selection = FilterSelection::default();
        let view = build_view(&data, &GeoBoundary::default(), &selection, &config).unwrap();
        assert!(matches!(view.chart, ChartOutput::Static(_)));
        assert!(view.table.is_none());

        selection.backend = PlotBackend::Plotly;
        selection.type_filter = TypeFilter::from("Stratovolcano");
        let view = build_view(&data, &GeoBoundary::default(), &selection, &config).unwrap();
        match &view.chart {
            ChartOutput::Interactive(figure) => {
                assert_eq!(figure.data.len(), 1);
                assert_eq!(figure.data[0].hovertext, vec!["Rainier", "Etna"]);
            }
            ChartOutput::Static(_) => panic!("expected interactive chart"),
        }
        assert_eq!(view.matched_rows, 2);
        assert_eq!(view.type_options, vec!["All", "Shield", "Stratovolcano"]);
    }

    #[test]
    fn raw_table_lists_full_dataset_when_requested() {
        let config = config_for(PathBuf::from("unused.csv"));
        let data = sample();
        let selection = FilterSelection {
            type_filter: TypeFilter::from("Shield"),
            show_data: true,
            ..FilterSelection::default()
        };

        let view = build_view(&data, &GeoBoundary::default(), &selection, &config).unwrap();

        assert_eq!(view.table.as_ref().map(Vec::len), Some(3));
        assert_eq!(view.matched_rows, 1);
        let page = render_page(&view).unwrap();
        assert!(page.contains("This is my volcanoes dataset:"));
        assert!(page.contains("<td>Kilimanjaro</td>"));
        assert!(page.contains("<option value=\"Shield\" selected>Shield</option>"));
        assert!(page.contains("value=\"Matplotlib\" checked"));
        assert!(page.contains("<h2>Matplotlib Map</h2>"));
    }

    #[test]
    fn page_escapes_dataset_text() {
        let config = config_for(PathBuf::from("unused.csv"));
        let data = vec![record("<img src=x>", "A & B", "Chile")];
        let selection = FilterSelection {
            show_data: true,
            ..FilterSelection::default()
        };

        let page = render_page(&build_view(&data, &GeoBoundary::default(), &selection, &config).unwrap()).unwrap();

        assert!(!page.contains("<img src=x>"));
        assert!(page.contains("&lt;img src=x&gt;"));
        assert!(page.contains("<option value=\"A &amp; B\">A &amp; B</option>"));
    }

    #[test]
    fn interactive_page_loads_plotly() {
        let config = config_for(PathBuf::from("unused.csv"));
        let selection = FilterSelection {
            backend: PlotBackend::Plotly,
            ..FilterSelection::default()
        };

        let page = render_page(&build_view(&sample(), &GeoBoundary::default(), &selection, &config).unwrap()).unwrap();

        assert!(page.contains("cdn.plot.ly"));
        assert!(page.contains("<h2>Plotly Map</h2>"));
        assert!(page.contains("Plotly.newPlot(\"volcano-map\""));
    }

    #[test]
    fn pipeline_normalizes_cached_data() {
        let temp = tempdir().unwrap();
        let csv = temp.path().join("volcanoes.csv");
        std::fs::write(
            &csv,
            "Volcano Name,Type,Country,Region,Status,Latitude,Longitude,Population\n\
             Rainier,Stratovolcano,United States,Cascades,Historical,46.85,-121.76,12000\n\
             Kilimanjaro,Shield,Tanzania,Africa,Holocene,-3.07,37.35,\n",
        )
        .unwrap();
        let config = config_for(csv);
        let mut cache = DatasetCache::new();
        let selection = FilterSelection {
            show_data: true,
            ..FilterSelection::default()
        };

        let view = run_pipeline(&mut cache, &GeoBoundary::default(), &config, &selection).unwrap();
        let table = view.table.unwrap();
        assert_eq!(table[0].country, "United States of America");
        assert_eq!(table[1].country, "United Republic of Tanzania");

        // The cached copy stays raw.
        let raw = cache.get_or_load(&config.input.data_csv).unwrap();
        assert_eq!(raw[0].country, "United States");
    }

    #[test]
    fn pipeline_surfaces_load_failure() {
        let temp = tempdir().unwrap();
        let config = config_for(temp.path().join("missing.csv"));

        let err = run_pipeline(&mut DatasetCache::new(), &GeoBoundary::default(), &config, &FilterSelection::default())
            .unwrap_err();
        assert!(err.to_string().contains("Failed to load volcano data"));
    }
}
