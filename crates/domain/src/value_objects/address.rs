use serde::{Deserialize, Serialize};

/// Postal address of a vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub number: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl Address {
    /// Case-insensitive match on the state code.
    pub fn in_state(&self, state: &str) -> bool {
        self.state.trim().eq_ignore_ascii_case(state.trim())
    }

    /// Case-insensitive match on the city name.
    pub fn in_city(&self, city: &str) -> bool {
        self.city.trim().to_lowercase() == city.trim().to_lowercase()
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {} - {}/{} {}",
            self.street, self.number, self.city, self.state, self.zip
        )
    }
}
