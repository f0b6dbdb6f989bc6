use geojson::{feature::Id, Feature, GeoJson, Value as GeoJsonValue};
use serde_json::Value;

use crate::errors::ParserError;
use crate::model::WellElevation;

/// Property names used to read well features.
#[derive(Debug, Clone)]
pub struct ElevationKeys<'a> {
    pub well_id: &'a str,
    pub elevation: &'a str,
}

impl Default for ElevationKeys<'_> {
    fn default() -> Self {
        Self {
            well_id: "well_id",
            elevation: "elevation_m",
        }
    }
}

/// Reads a GeoJSON FeatureCollection of wells. The elevation comes from the named property
/// or, failing that, the third coordinate of a Point geometry.
pub fn parse_well_elevations(
    content: &str,
    keys: &ElevationKeys<'_>,
) -> Result<Vec<WellElevation>, ParserError> {
    let geojson = content
        .parse::<GeoJson>()
        .map_err(|err| ParserError::GeoJson(err.to_string()))?;

    let features = match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            return Err(ParserError::GeoJson(
                "expected a FeatureCollection of wells, found a bare geometry".to_string(),
            ))
        }
    };

    features
        .iter()
        .enumerate()
        .map(|(idx, feature)| {
            let well_id = feature_well_id(feature, keys.well_id).ok_or_else(|| {
                ParserError::GeoJson(format!("feature {idx} has no '{}' property", keys.well_id))
            })?;
            let elevation_m = feature_elevation(feature, keys.elevation).ok_or_else(|| {
                ParserError::GeoJson(format!(
                    "well '{well_id}' has neither an '{}' property nor a Point z coordinate",
                    keys.elevation
                ))
            })?;
            Ok(WellElevation {
                well_id,
                elevation_m,
            })
        })
        .collect()
}

fn feature_well_id(feature: &Feature, key: &str) -> Option<String> {
    let from_property = feature
        .properties
        .as_ref()
        .and_then(|props| props.get(key))
        .and_then(|value| match value {
            Value::String(text) => Some(text.trim().to_string()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        });

    from_property.or_else(|| match feature.id.as_ref()? {
        Id::String(text) => Some(text.clone()),
        Id::Number(number) => Some(number.to_string()),
    })
}

fn feature_elevation(feature: &Feature, key: &str) -> Option<f64> {
    let from_property = feature
        .properties
        .as_ref()
        .and_then(|props| props.get(key))
        .and_then(|value| match value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        });

    from_property.or_else(|| match &feature.geometry.as_ref()?.value {
        GeoJsonValue::Point(position) => position.get(2).copied(),
        _ => None,
    })
}
