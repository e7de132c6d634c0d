//! Stops of a multi-office procedure.

use serde::{Deserialize, Serialize};

/// Category of office visited at a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopKind {
    Notary,
    PropertyRegistrar,
    TaxOffice,
    CivilRegistry,
    #[serde(other)]
    Other,
}

impl StopKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopKind::Notary => "notary",
            StopKind::PropertyRegistrar => "property_registrar",
            StopKind::TaxOffice => "tax_office",
            StopKind::CivilRegistry => "civil_registry",
            StopKind::Other => "other",
        }
    }
}

/// An ordered waypoint of the procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub name: String,
    pub kind: StopKind,
    #[serde(default)]
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    /// Time spent at the office, in minutes.
    pub handling_minutes: u32,
    #[serde(default)]
    pub documents: Vec<String>,
}

impl Stop {
    pub fn location(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

/// Name of the built-in procedure.
pub const PROPERTY_SALE: &str = "Compraventa de Inmueble";

/// Built-in itinerary for a property sale in Santiago Centro:
/// notary, then the real-estate registrar, then the tax office.
pub fn property_sale_itinerary() -> Vec<Stop> {
    vec![
        Stop {
            name: "Primera Notaría de Santiago".to_string(),
            kind: StopKind::Notary,
            address: "Moneda 975".to_string(),
            lat: -33.4420,
            lng: -70.6545,
            handling_minutes: 60,
            documents: vec![
                "Cédula de identidad de comprador y vendedor".to_string(),
                "Borrador de escritura de compraventa".to_string(),
                "Certificado de dominio vigente".to_string(),
            ],
        },
        Stop {
            name: "Conservador de Bienes Raíces de Santiago".to_string(),
            kind: StopKind::PropertyRegistrar,
            address: "Morandé 440".to_string(),
            lat: -33.4380,
            lng: -70.6540,
            handling_minutes: 90,
            documents: vec![
                "Copia autorizada de la escritura".to_string(),
                "Certificado de hipotecas y gravámenes".to_string(),
                "Formulario de inscripción".to_string(),
            ],
        },
        Stop {
            name: "SII Santiago Centro".to_string(),
            kind: StopKind::TaxOffice,
            address: "Teatinos 120".to_string(),
            lat: -33.4370,
            lng: -70.6530,
            handling_minutes: 45,
            documents: vec![
                "Inscripción conservatoria".to_string(),
                "Formulario 2890 de modificación de rol".to_string(),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_sale_visits_three_offices_in_order() {
        let stops = property_sale_itinerary();
        let kinds: Vec<_> = stops.iter().map(|stop| stop.kind).collect();
        assert_eq!(
            kinds,
            vec![StopKind::Notary, StopKind::PropertyRegistrar, StopKind::TaxOffice]
        );
        assert_eq!(stops.iter().map(|s| s.handling_minutes).sum::<u32>(), 195);
    }

    #[test]
    fn unknown_kind_deserializes_as_other() {
        let stop: Stop = serde_yaml::from_str(
            "name: Registro Civil\nkind: hospital\nlat: -33.44\nlng: -70.65\nhandling_minutes: 20\n",
        )
        .expect("valid stop");
        assert_eq!(stop.kind, StopKind::Other);
        assert!(stop.documents.is_empty());
        assert_eq!(stop.location(), (-33.44, -70.65));
    }
}
