//! Santiago Centro locations and a hand-built street grid.
#![allow(dead_code)]

use ruteo_resiliente::haversine::haversine_m;
use ruteo_resiliente::itinerary::{Stop, StopKind};
use ruteo_resiliente::memory_graph::{MemoryGraph, StreetSegment};
use ruteo_resiliente::polyline::Polyline;

pub const NOTARY: (f64, f64) = (-33.4420, -70.6545);
pub const REGISTRAR: (f64, f64) = (-33.4380, -70.6540);
pub const TAX_OFFICE: (f64, f64) = (-33.4370, -70.6530);

/// Straight-line distances between the property-sale offices.
pub const NOTARY_TO_REGISTRAR_M: f64 = 447.19;
pub const REGISTRAR_TO_TAX_OFFICE_M: f64 = 144.83;

pub fn stop(name: &str, kind: StopKind, location: (f64, f64), handling_minutes: u32) -> Stop {
    Stop {
        name: name.to_string(),
        kind,
        address: format!("{} address", name),
        lat: location.0,
        lng: location.1,
        handling_minutes,
        documents: vec!["Cédula de identidad".to_string()],
    }
}

/// The three-office itinerary with handling times 60, 90 and 45 minutes.
pub fn property_sale_stops() -> Vec<Stop> {
    vec![
        stop("Notaría", StopKind::Notary, NOTARY, 60),
        stop("Conservador", StopKind::PropertyRegistrar, REGISTRAR, 90),
        stop("SII", StopKind::TaxOffice, TAX_OFFICE, 45),
    ]
}

fn street(source: i64, target: i64, from: (f64, f64), to: (f64, f64), name: Option<&str>) -> StreetSegment {
    StreetSegment {
        source,
        target,
        length_m: haversine_m(from, to),
        street_name: name.map(str::to_string),
        road_type: Some("residential".to_string()),
        geometry: Polyline::straight(from, to),
    }
}

/// Vertices on each office plus one corner, with a disconnected island.
///
/// Notary (1) → corner (2) → registrar (3) → tax office (4).
pub const CORNER: (f64, f64) = (-33.4380, -70.6545);
pub const ISLAND_A: (f64, f64) = (-33.4600, -70.6700);
pub const ISLAND_B: (f64, f64) = (-33.4601, -70.6701);

pub fn santiago_grid() -> MemoryGraph {
    let vertices = [
        (1, NOTARY),
        (2, CORNER),
        (3, REGISTRAR),
        (4, TAX_OFFICE),
        (20, ISLAND_A),
        (21, ISLAND_B),
    ];
    let segments = vec![
        street(1, 2, NOTARY, CORNER, Some("Bandera")),
        street(2, 3, CORNER, REGISTRAR, Some("Compañía")),
        street(3, 4, REGISTRAR, TAX_OFFICE, None),
        street(20, 21, ISLAND_A, ISLAND_B, Some("Isla")),
    ];
    MemoryGraph::new(&vertices, segments).expect("grid")
}
