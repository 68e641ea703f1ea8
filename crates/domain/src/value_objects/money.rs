use serde::{Deserialize, Serialize};

use super::Volume;

/// A price in integer cents. Sign is not checked here; the entities that
/// hold prices decide which amounts they accept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// This amount, paid for `volume`, scaled to one litre. Rounds half up
    /// to the nearest cent. `None` when the result does not fit in cents.
    pub fn per_liter(&self, volume: Volume) -> Option<Money> {
        let ml = i64::from(volume.ml());
        self.0
            .checked_mul(1000)
            .and_then(|scaled| scaled.checked_add(ml / 2))
            .map(|scaled| Money(scaled / ml))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}
