use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Label of the passthrough entry in the type selector.
pub const ALL_TYPES: &str = "All";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolcanoRecord {
    #[serde(rename = "Volcano Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub volcano_type: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
    // Empty cells deserialize to None
    #[serde(rename = "Population", alias = "Population (2020)", default)]
    pub population: Option<f64>,
}

pub type VolcanoDataset = Vec<VolcanoRecord>;

/// Which rows of the dataset the user wants to see.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Only(String),
}

impl TypeFilter {
    pub fn matches(&self, record: &VolcanoRecord) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Only(t) => record.volcano_type == *t,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            TypeFilter::All => ALL_TYPES,
            TypeFilter::Only(t) => t,
        }
    }
}

impl From<&str> for TypeFilter {
    fn from(value: &str) -> Self {
        if value == ALL_TYPES {
            TypeFilter::All
        } else {
            TypeFilter::Only(value.to_string())
        }
    }
}

impl fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum PopulationDisplay {
    #[default]
    Yes,
    No,
}

impl PopulationDisplay {
    pub fn enabled(self) -> bool {
        self == PopulationDisplay::Yes
    }

    pub fn label(self) -> &'static str {
        match self {
            PopulationDisplay::Yes => "Yes",
            PopulationDisplay::No => "No",
        }
    }
}

/// Rendering backend; the labels keep the names shown in the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum PlotBackend {
    /// Static SVG scatter plot.
    #[default]
    Matplotlib,
    /// Interactive tile-backed map.
    Plotly,
}

impl PlotBackend {
    pub const ALL: [PlotBackend; 2] = [PlotBackend::Matplotlib, PlotBackend::Plotly];

    pub fn label(self) -> &'static str {
        match self {
            PlotBackend::Matplotlib => "Matplotlib",
            PlotBackend::Plotly => "Plotly",
        }
    }
}

impl FromStr for PlotBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "matplotlib" | "static" => Ok(PlotBackend::Matplotlib),
            "plotly" | "interactive" => Ok(PlotBackend::Plotly),
            other => Err(format!("unknown plot backend '{}'", other)),
        }
    }
}

impl FromStr for PopulationDisplay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yes" => Ok(PopulationDisplay::Yes),
            "no" => Ok(PopulationDisplay::No),
            other => Err(format!("expected yes or no, got '{}'", other)),
        }
    }
}

// Query strings and the CLI share one parser
impl TryFrom<String> for PlotBackend {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for PopulationDisplay {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// UI state captured from the controls on every interaction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterSelection {
    pub type_filter: TypeFilter,
    pub population: PopulationDisplay,
    pub backend: PlotBackend,
    pub show_data: bool,
}
