//! Static reference ranges, one row per analyte kind.

use serde::Serialize;

use crate::cartridge::Analyte;

/// Normal-range bounds and display unit for one analyte.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferenceRange {
    pub min: f64,
    pub max: f64,
    pub unit: &'static str,
}

impl Analyte {
    /// Reference range used by the classifier for this analyte.
    pub const fn reference(self) -> ReferenceRange {
        match self {
            Analyte::Glucose => ReferenceRange {
                min: 70.0,
                max: 100.0,
                unit: "mg/dL",
            },
            Analyte::Cholesterol => ReferenceRange {
                min: 0.0,
                max: 200.0,
                unit: "mg/dL",
            },
            Analyte::Ketone => ReferenceRange {
                min: 0.0,
                max: 0.6,
                unit: "mmol/L",
            },
            Analyte::Radon => ReferenceRange {
                min: 0.0,
                max: 148.0,
                unit: "Bq/m³",
            },
            Analyte::CarbonDioxide => ReferenceRange {
                min: 0.0,
                max: 1000.0,
                unit: "ppm",
            },
            Analyte::Vocs => ReferenceRange {
                min: 0.0,
                max: 150.0,
                unit: "ppb",
            },
            Analyte::Water => ReferenceRange {
                min: 6.5,
                max: 8.5,
                unit: "pH",
            },
            Analyte::Food => ReferenceRange {
                min: 0.0,
                max: 100.0,
                unit: "CFU/g",
            },
        }
    }
}
