use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Container sizes sold on the marketplace, in millilitres.
pub const ALLOWED_VOLUMES_ML: [u32; 17] = [
    250,    // small bottle
    269,    // small can
    275,    // small long neck
    310,    // long neck
    330,    // standard can / long neck
    350,    // can
    355,    // imported
    473,    // tall can
    500,    // bottle
    550,    // large bottle
    600,    // returnable bottle
    1000,   // litre
    2000,   // two litres
    5000,   // 5 L keg
    20000,  // 20 L keg
    30000,  // 30 L keg
    50000,  // 50 L keg
];

/// A container volume from the allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Volume(u32);

impl Volume {
    pub fn from_ml(millilitres: u32) -> Result<Self, ValidationError> {
        if !ALLOWED_VOLUMES_ML.contains(&millilitres) {
            return Err(ValidationError::InvalidVolume { millilitres });
        }
        Ok(Self(millilitres))
    }

    pub fn ml(&self) -> u32 {
        self.0
    }

    pub fn in_liters(&self) -> f64 {
        f64::from(self.0) / 1000.0
    }
}

impl TryFrom<u32> for Volume {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_ml(value)
    }
}

impl From<Volume> for u32 {
    fn from(volume: Volume) -> Self {
        volume.0
    }
}

impl std::fmt::Display for Volume {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ml", self.0)
    }
}
