//! Area types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlannerError;

/// Coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Named zone of the city, the unit of granularity for distance lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Area {
    Satellite,
    Bopal,
    Vastrapur,
    Paldi,
    Thaltej,
    Navrangpura,
    Bodakdev,
    Gota,
    Maninagar,
    Chandkheda,
}

impl Area {
    pub const ALL: [Area; 10] = [
        Area::Satellite,
        Area::Bopal,
        Area::Vastrapur,
        Area::Paldi,
        Area::Thaltej,
        Area::Navrangpura,
        Area::Bodakdev,
        Area::Gota,
        Area::Maninagar,
        Area::Chandkheda,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Area::Satellite => "Satellite",
            Area::Bopal => "Bopal",
            Area::Vastrapur => "Vastrapur",
            Area::Paldi => "Paldi",
            Area::Thaltej => "Thaltej",
            Area::Navrangpura => "Navrangpura",
            Area::Bodakdev => "Bodakdev",
            Area::Gota => "Gota",
            Area::Maninagar => "Maninagar",
            Area::Chandkheda => "Chandkheda",
        }
    }

    /// Approximate centre of the area
    pub const fn centroid(self) -> Coordinates {
        let (lat, lng) = match self {
            Area::Satellite => (23.0225, 72.5714),
            Area::Bopal => (23.0343, 72.4721),
            Area::Vastrapur => (23.0460, 72.5292),
            Area::Paldi => (23.0117, 72.5625),
            Area::Thaltej => (23.0545, 72.5029),
            Area::Navrangpura => (23.0365, 72.5611),
            Area::Bodakdev => (23.0465, 72.5095),
            Area::Gota => (23.0995, 72.5286),
            Area::Maninagar => (22.9987, 72.6154),
            Area::Chandkheda => (23.1209, 72.5769),
        };
        Coordinates { lat, lng }
    }

    /// Find the first area whose name appears in a free-form address
    #[cfg(test)]
    pub fn find_in(address: &str) -> Option<Area> {
        let lowered = address.to_lowercase();
        Area::ALL
            .into_iter()
            .find(|area| lowered.contains(&area.as_str().to_lowercase()))
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Area {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Area::ALL
            .into_iter()
            .find(|area| area.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| PlannerError::InvalidArea(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("paldi".parse::<Area>().unwrap(), Area::Paldi);
        assert_eq!(" Gota ".parse::<Area>().unwrap(), Area::Gota);
        assert!("Downtown".parse::<Area>().is_err());
    }

    #[test]
    fn finds_area_in_address() {
        let address = "Opposite Dharnidhar Derasar, Paldi, Ahmedabad - 380007";
        assert_eq!(Area::find_in(address), Some(Area::Paldi));
        assert_eq!(Area::find_in("Somewhere else"), None);
    }

    #[test]
    fn centroids_are_inside_the_city() {
        for area in Area::ALL {
            let c = area.centroid();
            assert!(c.lat > 22.9 && c.lat < 23.2, "{} lat {}", area, c.lat);
            assert!(c.lng > 72.4 && c.lng < 72.7, "{} lng {}", area, c.lng);
        }
    }
}
