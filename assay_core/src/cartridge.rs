//! Test cartridge identity and minting.

use assay_traits::Entropy;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Analyte a cartridge measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Analyte {
    Glucose,
    Cholesterol,
    Ketone,
    Radon,
    CarbonDioxide,
    Vocs,
    Water,
    Food,
}

impl Analyte {
    pub const ALL: [Analyte; 8] = [
        Analyte::Glucose,
        Analyte::Cholesterol,
        Analyte::Ketone,
        Analyte::Radon,
        Analyte::CarbonDioxide,
        Analyte::Vocs,
        Analyte::Water,
        Analyte::Food,
    ];

    /// Display name shown on the cartridge label.
    pub const fn label(self) -> &'static str {
        match self {
            Analyte::Glucose => "Blood Glucose Test Cartridge",
            Analyte::Cholesterol => "Cholesterol Test Cartridge",
            Analyte::Ketone => "Ketone Test Cartridge",
            Analyte::Radon => "Radon Test Cartridge",
            Analyte::CarbonDioxide => "CO2 Test Cartridge",
            Analyte::Vocs => "VOCs Test Cartridge",
            Analyte::Water => "Water Quality Test Cartridge",
            Analyte::Food => "Food Safety Test Cartridge",
        }
    }
}

/// Shelf life stamped on freshly detected cartridges.
const SHELF_LIFE_DAYS: i64 = 180;
/// Inclusive bounds for the minted remaining-uses counter.
const USES_MIN: u64 = 5;
const USES_MAX: u64 = 15;

const LOT_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A detected test cartridge. Attached to at most one active session;
/// `uses_remaining` is consumed one unit per started stream and a depleted
/// cartridge cannot start another.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cartridge {
    pub id: String,
    pub kind: Analyte,
    pub name: &'static str,
    pub expires_at: DateTime<Utc>,
    pub uses_remaining: u32,
    pub lot: String,
    pub calibration_code: String,
}

impl Cartridge {
    /// Mint the cartridge a detection pass reports.
    ///
    /// Draw order is fixed (kind, uses, lot, calibration code) so scripted
    /// entropy sources can steer individual fields.
    pub fn mint(entropy: &dyn Entropy, now: DateTime<Utc>) -> Self {
        let kind = Analyte::ALL[entropy.pick(Analyte::ALL.len())];
        let uses_remaining = entropy.uniform_u64(USES_MIN, USES_MAX) as u32;
        let lot = format!("LOT-{}", entropy.token(LOT_ALPHABET, 8));
        let calibration_code = entropy.token(LOT_ALPHABET, 6);
        Self {
            id: format!("cart-{}", now.timestamp_millis()),
            kind,
            name: kind.label(),
            expires_at: now + Duration::days(SHELF_LIFE_DAYS),
            uses_remaining,
            lot,
            calibration_code,
        }
    }

    #[inline]
    pub fn is_depleted(&self) -> bool {
        self.uses_remaining == 0
    }
}
