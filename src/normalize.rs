use crate::errors::LoadError;
use crate::types::{VolcanoDataset, VolcanoRecord};
use geo::MultiPolygon;
use geojson::GeoJson;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

/// Raw country label -> label used by the boundary document.
pub const COUNTRY_NAME_MAP: [(&str, &str); 6] = [
    ("United States", "United States of America"),
    ("Tanzania", "United Republic of Tanzania"),
    ("Martinique", "Martinique"),
    ("Sao Tome & Principe", "Sao Tome and Principe"),
    ("Guadeloupe", "Guadeloupe"),
    ("Wallis & Futuna", "Wallis and Futuna"),
];

pub fn canonical_country(name: &str) -> &str {
    COUNTRY_NAME_MAP
        .iter()
        .find(|(raw, _)| *raw == name)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(name)
}

pub fn normalize_countries(records: &[VolcanoRecord]) -> VolcanoDataset {
    records
        .iter()
        .map(|record| {
            let mut record = record.clone();
            let canonical = canonical_country(&record.country);
            if canonical != record.country {
                record.country = canonical.to_string();
            }
            record
        })
        .collect()
}

/// Country outlines keyed by country name.
#[derive(Debug, Clone, Default)]
pub struct GeoBoundary {
    countries: BTreeMap<String, MultiPolygon<f64>>,
}

impl GeoBoundary {
    pub fn contains(&self, country: &str) -> bool {
        self.countries.contains_key(country)
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    // (lon, lat) exterior rings
    pub fn outlines(&self) -> impl Iterator<Item = Vec<(f64, f64)>> + '_ {
        self.countries.values().flat_map(|mp| {
            mp.iter()
                .map(|poly| poly.exterior().coords().map(|c| (c.x, c.y)).collect())
        })
    }

    fn insert(&mut self, name: String, geometry: MultiPolygon<f64>) {
        match self.countries.get_mut(&name) {
            Some(existing) => existing.0.extend(geometry.0),
            None => {
                self.countries.insert(name, geometry);
            }
        }
    }
}

impl FromIterator<(String, MultiPolygon<f64>)> for GeoBoundary {
    fn from_iter<I: IntoIterator<Item = (String, MultiPolygon<f64>)>>(iter: I) -> Self {
        let mut boundary = GeoBoundary::default();
        for (name, geometry) in iter {
            boundary.insert(name, geometry);
        }
        boundary
    }
}

pub fn load_boundaries(path: &Path, name_property: &str) -> Result<GeoBoundary, LoadError> {
    let boundary_err = |reason: String| LoadError::Boundary {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| LoadError::from_open(path, e))?;
    let reader = BufReader::new(file);
    let geojson = GeoJson::from_reader(reader).map_err(|e| boundary_err(e.to_string()))?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(boundary_err("expected a FeatureCollection".to_string())),
    };

    let mut boundary = GeoBoundary::default();
    let mut skipped = 0usize;

    for feature in collection.features {
        let name = feature.properties.as_ref().and_then(|props| {
            props
                .get(name_property)
                .or_else(|| props.get("name"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        });

        let (Some(name), Some(geometry)) = (name, feature.geometry) else {
            skipped += 1;
            continue;
        };

        let geometry: geo::Geometry<f64> = geometry
            .value
            .try_into()
            .map_err(|e| boundary_err(format!("bad geometry for '{}': {:?}", name, e)))?;

        match geometry {
            geo::Geometry::MultiPolygon(mp) => boundary.insert(name, mp),
            geo::Geometry::Polygon(p) => boundary.insert(name, MultiPolygon::new(vec![p])),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!("Skipped {} boundary features without a name or polygon", skipped);
    }
    info!("Loaded boundaries for {} countries from {:?}", boundary.len(), path);
    Ok(boundary)
}

pub fn unmatched_countries(records: &[VolcanoRecord], boundary: &GeoBoundary) -> BTreeSet<String> {
    records
        .iter()
        .filter(|r| !boundary.contains(&r.country))
        .map(|r| r.country.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(volcano_type: &str, country: &str) -> VolcanoRecord {
        VolcanoRecord {
            name: format!("{} peak", country),
            volcano_type: volcano_type.to_string(),
            country: country.to_string(),
            region: "Somewhere".to_string(),
            status: "Historical".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            population: None,
        }
    }

    const BOUNDARIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"ADMIN": "Italy"},
             "geometry": {"type": "Polygon", "coordinates": [[[6,36],[19,36],[19,47],[6,47],[6,36]]]}},
            {"type": "Feature", "properties": {"ADMIN": "United States of America"},
             "geometry": {"type": "MultiPolygon", "coordinates": [
                [[[-125,25],[-67,25],[-67,49],[-125,49],[-125,25]]],
                [[[-160,19],[-154,19],[-154,22],[-160,22],[-160,19]]]]}},
            {"type": "Feature", "properties": {"name": "Iceland"},
             "geometry": {"type": "Polygon", "coordinates": [[[-24,63],[-13,63],[-13,67],[-24,67],[-24,63]]]}},
            {"type": "Feature", "properties": {"ADMIN": "Point Nemo"},
             "geometry": {"type": "Point", "coordinates": [-123.4, -48.9]}},
            {"type": "Feature", "properties": {},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}}
        ]
    }"#;

    #[test]
    fn rewrites_mapped_countries_and_keeps_the_rest() {
        let raw = vec![
            record("Stratovolcano", "United States"),
            record("Shield", "Tanzania"),
            record("Caldera", "Sao Tome & Principe"),
            record("Shield", "Iceland"),
        ];

        let working = normalize_countries(&raw);

        assert_eq!(working[0].country, "United States of America");
        assert_eq!(working[1].country, "United Republic of Tanzania");
        assert_eq!(working[2].country, "Sao Tome and Principe");
        assert_eq!(working[3].country, "Iceland");
        assert_eq!(raw[0].country, "United States");
    }

    #[test]
    fn normalization_is_idempotent() {
        let raw: Vec<VolcanoRecord> = COUNTRY_NAME_MAP
            .iter()
            .map(|(country, _)| record("Shield", country))
            .chain([record("Shield", "Japan")])
            .collect();

        let once = normalize_countries(&raw);
        let twice = normalize_countries(&once);

        assert_eq!(once, twice);
    }

    #[test]
    fn loads_named_polygons() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("countries.geojson");
        std::fs::write(&path, BOUNDARIES).unwrap();

        let boundary = load_boundaries(&path, "ADMIN").unwrap();

        assert_eq!(boundary.len(), 3);
        assert!(boundary.contains("Iceland"));
        assert!(!boundary.contains("Point Nemo"));
        assert!(boundary.contains("United States of America"));
        // Italy + two US polygons + Iceland
        assert_eq!(boundary.outlines().count(), 4);
    }

    #[test]
    fn boundary_failures_are_classified() {
        let temp = tempdir().unwrap();

        let missing = load_boundaries(&temp.path().join("absent.geojson"), "ADMIN");
        assert!(matches!(missing, Err(LoadError::NotFound { .. })));

        let garbage = temp.path().join("garbage.geojson");
        std::fs::write(&garbage, "{ not json").unwrap();
        assert!(matches!(
            load_boundaries(&garbage, "ADMIN"),
            Err(LoadError::Boundary { .. })
        ));

        let single = temp.path().join("single.geojson");
        std::fs::write(
            &single,
            r#"{"type": "Feature", "properties": {}, "geometry": null}"#,
        )
        .unwrap();
        assert!(matches!(
            load_boundaries(&single, "ADMIN"),
            Err(LoadError::Boundary { .. })
        ));
    }

    #[test]
    fn reports_countries_without_outline() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("countries.geojson");
        std::fs::write(&path, BOUNDARIES).unwrap();
        let boundary = load_boundaries(&path, "ADMIN").unwrap();

        let raw = vec![
            record("Shield", "United States"),
            record("Shield", "Italy"),
            record("Shield", "Tanzania"),
            record("Shield", "Tanzania"),
        ];

        let before = unmatched_countries(&raw, &boundary);
        assert!(before.contains("United States"));

        let after = unmatched_countries(&normalize_countries(&raw), &boundary);
        assert_eq!(
            after.into_iter().collect::<Vec<_>>(),
            vec!["United Republic of Tanzania".to_string()]
        );
    }
}
