//! GeoJSON rendering of route plans and the file sink.

use std::fs;
use std::path::{Path, PathBuf};

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;
use tracing::{info, warn};

use crate::error::Error;
use crate::itinerary::{property_sale_itinerary, Stop, PROPERTY_SALE};
use crate::polyline::Polyline;
use crate::router::{FallbackReason, RoutePlan, SegmentPath};

const STRAIGHT_LINE_NOTE: &str = "straight-line approximation";

/// Converts a routed itinerary to a feature collection: line features for
/// every segment, then one point per stop, plus a `metadata` member.
pub fn plan_to_geojson(plan: &RoutePlan) -> FeatureCollection {
    let mut features = Vec::new();

    for segment in &plan.segments {
        let origin = &plan.stops[segment.index];
        let destination = &plan.stops[segment.index + 1];

        match &segment.path {
            SegmentPath::Computed { edges, .. } => {
                for edge in edges {
                    features.push(line_feature(
                        &edge.geometry,
                        json!({
                            "kind": "computed",
                            "segment": segment.index + 1,
                            "origin": origin.name,
                            "destination": destination.name,
                            "street": edge.street_name,
                            "road_type": edge.road_type,
                            "distance_m": round_to(edge.length_m, 1),
                            "seq": edge.seq,
                        }),
                    ));
                }
            }
            SegmentPath::Fallback { geometry, reason } => {
                features.push(line_feature(
                    geometry,
                    json!({
                        "kind": "fallback",
                        "segment": segment.index + 1,
                        "origin": origin.name,
                        "destination": destination.name,
                        "distance_m": round_to(segment.direct_m, 1),
                        "reason": reason_tag(reason),
                        "note": STRAIGHT_LINE_NOTE,
                    }),
                ));
            }
        }
    }

    for (position, stop) in plan.stops.iter().enumerate() {
        features.push(stop_feature(position, stop));
    }

    let mut metadata = JsonObject::new();
    metadata.insert(
        "metadata".to_string(),
        json!({
            "procedure": PROPERTY_SALE,
            "algorithm": "pgr_dijkstra with straight-line fallback",
            "steps": plan.stops.len(),
            "categories": plan.stops.iter().map(|stop| stop.kind.as_str()).collect::<Vec<_>>(),
            "estimated_minutes": plan.total_minutes,
            "walking_minutes": plan.walking_minutes,
            "handling_minutes": plan.handling_minutes,
            "total_distance_km": round_to(plan.total_distance_m / 1000.0, 2),
            "fallback_segments": plan.fallback_count(),
            "note": "Times are estimates.",
        }),
    );

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(metadata),
    }
}

/// Minimal two-segment straight-line route written when routing could not
/// run at all.
pub fn last_resort_geojson(error: &str) -> FeatureCollection {
    let stops = property_sale_itinerary();
    let features = stops
        .windows(2)
        .enumerate()
        .map(|(index, pair)| {
            line_feature(
                &Polyline::straight(pair[0].location(), pair[1].location()),
                json!({
                    "kind": "total_fallback",
                    "segment": index + 1,
                    "origin": pair[0].name,
                    "destination": pair[1].name,
                    "note": STRAIGHT_LINE_NOTE,
                }),
            )
        })
        .collect();

    let mut metadata = JsonObject::new();
    metadata.insert(
        "metadata".to_string(),
        json!({
            "procedure": PROPERTY_SALE,
            "algorithm": "none",
            "error": error,
        }),
    );

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(metadata),
    }
}

/// Writes `collection` to `out_dir/file_name` and mirrors it into
/// `web_data_dir` when that directory exists.
pub fn write_geojson(
    collection: &FeatureCollection,
    out_dir: &Path,
    file_name: &str,
    web_data_dir: Option<&Path>,
) -> Result<PathBuf, Error> {
    fs::create_dir_all(out_dir)?;
    let out_file = out_dir.join(file_name);
    fs::write(&out_file, serde_json::to_string_pretty(collection)?)?;
    info!(path = %out_file.display(), features = collection.features.len(), "Wrote route GeoJSON");

    match web_data_dir {
        Some(web_dir) if web_dir.is_dir() => {
            let target = web_dir.join(file_name);
            fs::copy(&out_file, &target)?;
            info!(path = %target.display(), "Copied route to web data directory");
        }
        Some(web_dir) => {
            warn!(path = %web_dir.display(), "Web data directory missing, skipping copy");
        }
        None => {}
    }

    Ok(out_file)
}

fn line_feature(geometry: &Polyline, properties: serde_json::Value) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::LineString(geometry.to_positions()))),
        id: None,
        properties: into_object(properties),
        foreign_members: None,
    }
}

fn stop_feature(position: usize, stop: &Stop) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![stop.lng, stop.lat]))),
        id: None,
        properties: into_object(json!({
            "kind": "stop",
            "order": position + 1,
            "name": stop.name,
            "address": stop.address,
            "category": stop.kind.as_str(),
            "handling_minutes": stop.handling_minutes,
            "documents": stop.documents,
        })),
        foreign_members: None,
    }
}

fn into_object(value: serde_json::Value) -> Option<JsonObject> {
    match value {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    }
}

fn reason_tag(reason: &FallbackReason) -> &'static str {
    match reason {
        FallbackReason::VertexNotFound => "vertex_not_found",
        FallbackReason::NoPath => "no_path",
        FallbackReason::OracleError(_) => "oracle_error",
        FallbackReason::Implausible { .. } => "implausible_path",
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_resort_has_two_straight_segments() {
        let collection = last_resort_geojson("connection refused");
        assert_eq!(collection.features.len(), 2);
        for feature in &collection.features {
            let props = feature.properties.as_ref().expect("properties");
            assert_eq!(props["kind"], "total_fallback");
            match &feature.geometry.as_ref().expect("geometry").value {
                Value::LineString(coords) => assert_eq!(coords.len(), 2),
                other => panic!("unexpected geometry {:?}", other),
            }
        }
        let metadata = &collection.foreign_members.as_ref().expect("metadata")["metadata"];
        assert_eq!(metadata["error"], "connection refused");
    }

    #[test]
    fn last_resort_starts_at_the_notary() {
        let collection = last_resort_geojson("down");
        match &collection.features[0].geometry.as_ref().expect("geometry").value {
            Value::LineString(coords) => assert_eq!(coords[0], vec![-70.6545, -33.4420]),
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn round_to_decimals() {
        assert_eq!(round_to(0.59218, 2), 0.59);
        assert_eq!(round_to(447.1928, 1), 447.2);
    }

    #[test]
    fn write_copies_into_existing_web_dir() {
        let out = tempfile::tempdir().expect("tempdir");
        let web = tempfile::tempdir().expect("tempdir");
        let collection = last_resort_geojson("down");

        let path = write_geojson(&collection, &out.path().join("nested"), "route.geojson", Some(web.path()))
            .expect("write");

        assert!(path.exists());
        let copied = fs::read_to_string(web.path().join("route.geojson")).expect("copy");
        let parsed: serde_json::Value = serde_json::from_str(&copied).expect("valid json");
        assert_eq!(parsed["type"], "FeatureCollection");
        assert_eq!(parsed["features"].as_array().map(Vec::len), Some(2));
        assert!(parsed["metadata"].is_object());
    }

    #[test]
    fn write_skips_missing_web_dir() {
        let out = tempfile::tempdir().expect("tempdir");
        let missing = out.path().join("does-not-exist");
        let collection = last_resort_geojson("down");

        write_geojson(&collection, out.path(), "route.geojson", Some(&missing)).expect("write");
        assert!(!missing.exists());
    }
}
