//! Static inter-area distance table
//!
//! The only cost metric used for route ordering. Lookups are symmetric;
//! two stops in the same area are one short intra-area leg apart.

use std::collections::HashMap;

use serde::Serialize;

use crate::types::Area;

/// Travel distance and duration between two places
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Leg {
    pub distance_km: f64,
    pub duration_minutes: u32,
}

impl Leg {
    pub const fn new(distance_km: f64, duration_minutes: u32) -> Self {
        Self {
            distance_km,
            duration_minutes,
        }
    }

    pub const ZERO: Leg = Leg::new(0.0, 0);

    pub fn text_distance(&self) -> String {
        format!("{:.1} km", self.distance_km)
    }

    pub fn text_duration(&self) -> String {
        format!("{} mins", self.duration_minutes)
    }
}

/// Between two stops in the same area
pub const INTRA_AREA_LEG: Leg = Leg::new(2.3, 8);

/// Used when a pair is missing from the table
pub const FALLBACK_LEG: Leg = Leg::new(12.5, 30);

/// Endpoint of a leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Place {
    Depot,
    Area(Area),
}

/// Symmetric lookup of area pair → leg, plus the depot's own row
#[derive(Debug, Clone)]
pub struct AreaDistanceTable {
    pairs: HashMap<(Area, Area), Leg>,
    depot_area: Area,
    depot_overrides: HashMap<Area, Leg>,
}

fn key(a: Area, b: Area) -> (Area, Area) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Road distances between the Ahmedabad areas (km, minutes)
const AHMEDABAD_PAIRS: &[(Area, Area, f64, u32)] = &[
    (Area::Satellite, Area::Bopal, 9.2, 21),
    (Area::Satellite, Area::Vastrapur, 3.8, 12),
    (Area::Satellite, Area::Paldi, 7.3, 18),
    (Area::Satellite, Area::Thaltej, 4.4, 14),
    (Area::Satellite, Area::Navrangpura, 5.7, 16),
    (Area::Satellite, Area::Bodakdev, 3.5, 12),
    (Area::Satellite, Area::Gota, 11.6, 26),
    (Area::Satellite, Area::Maninagar, 14.1, 32),
    (Area::Satellite, Area::Chandkheda, 16.3, 38),
    (Area::Bopal, Area::Vastrapur, 6.7, 18),
    (Area::Bopal, Area::Paldi, 11.8, 28),
    (Area::Bopal, Area::Thaltej, 8.3, 20),
    (Area::Bopal, Area::Navrangpura, 10.4, 24),
    (Area::Bopal, Area::Bodakdev, 8.1, 20),
    (Area::Bopal, Area::Gota, 9.8, 22),
    (Area::Bopal, Area::Maninagar, 18.2, 40),
    (Area::Bopal, Area::Chandkheda, 21.4, 45),
    (Area::Vastrapur, Area::Paldi, 5.2, 15),
    (Area::Vastrapur, Area::Thaltej, 3.8, 13),
    (Area::Vastrapur, Area::Navrangpura, 3.6, 12),
    (Area::Vastrapur, Area::Bodakdev, 1.9, 8),
    (Area::Vastrapur, Area::Gota, 10.4, 25),
    (Area::Vastrapur, Area::Maninagar, 12.6, 30),
    (Area::Vastrapur, Area::Chandkheda, 15.7, 35),
    (Area::Paldi, Area::Thaltej, 7.9, 22),
    (Area::Paldi, Area::Navrangpura, 3.8, 14),
    (Area::Paldi, Area::Bodakdev, 6.8, 18),
    (Area::Paldi, Area::Gota, 14.5, 34),
    (Area::Paldi, Area::Maninagar, 7.5, 20),
    (Area::Paldi, Area::Chandkheda, 16.8, 38),
    (Area::Thaltej, Area::Navrangpura, 6.4, 18),
    (Area::Thaltej, Area::Bodakdev, 2.3, 10),
    (Area::Thaltej, Area::Gota, 7.2, 18),
    (Area::Thaltej, Area::Maninagar, 15.3, 35),
    (Area::Thaltej, Area::Chandkheda, 12.4, 28),
    (Area::Navrangpura, Area::Bodakdev, 5.1, 15),
    (Area::Navrangpura, Area::Gota, 12.8, 30),
    (Area::Navrangpura, Area::Maninagar, 9.2, 24),
    (Area::Navrangpura, Area::Chandkheda, 13.6, 32),
    (Area::Bodakdev, Area::Gota, 8.7, 22),
    (Area::Bodakdev, Area::Maninagar, 14.8, 34),
    (Area::Bodakdev, Area::Chandkheda, 14.3, 32),
    (Area::Gota, Area::Maninagar, 21.3, 48),
    (Area::Gota, Area::Chandkheda, 11.2, 24),
    (Area::Maninagar, Area::Chandkheda, 22.6, 52),
];

impl AreaDistanceTable {
    /// Empty table; every lookup falls back until pairs are added
    pub fn empty(depot_area: Area) -> Self {
        Self {
            pairs: HashMap::new(),
            depot_area,
            depot_overrides: HashMap::new(),
        }
    }

    /// Built-in Ahmedabad table with the depot located in `depot_area`
    pub fn ahmedabad(depot_area: Area) -> Self {
        let mut table = Self::empty(depot_area);
        for &(a, b, km, minutes) in AHMEDABAD_PAIRS {
            table.set(a, b, Leg::new(km, minutes));
        }
        table
    }

    pub fn set(&mut self, a: Area, b: Area, leg: Leg) {
        self.pairs.insert(key(a, b), leg);
    }

    /// Override the depot → area leg instead of deriving it from the depot's area
    #[cfg(test)]
    pub fn with_depot_leg(mut self, area: Area, leg: Leg) -> Self {
        self.depot_overrides.insert(area, leg);
        self
    }

    #[cfg(test)]
    pub fn contains(&self, a: Area, b: Area) -> bool {
        a == b || self.pairs.contains_key(&key(a, b))
    }

    fn between_areas(&self, a: Area, b: Area) -> Leg {
        if a == b {
            return INTRA_AREA_LEG;
        }
        self.pairs.get(&key(a, b)).copied().unwrap_or(FALLBACK_LEG)
    }

    fn from_depot(&self, area: Area) -> Leg {
        self.depot_overrides
            .get(&area)
            .copied()
            .unwrap_or_else(|| self.between_areas(self.depot_area, area))
    }

    /// Symmetric leg lookup
    pub fn between(&self, from: Place, to: Place) -> Leg {
        match (from, to) {
            (Place::Depot, Place::Depot) => Leg::ZERO,
            (Place::Depot, Place::Area(area)) | (Place::Area(area), Place::Depot) => {
                self.from_depot(area)
            }
            (Place::Area(a), Place::Area(b)) => self.between_areas(a, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_table_covers_every_pair() {
        let table = AreaDistanceTable::ahmedabad(Area::Satellite);
        for a in Area::ALL {
            for b in Area::ALL {
                assert!(table.contains(a, b), "missing {} - {}", a, b);
            }
        }
        assert_eq!(AHMEDABAD_PAIRS.len(), 45);
    }

    #[test]
    fn lookups_are_symmetric() {
        let table = AreaDistanceTable::ahmedabad(Area::Satellite);
        for a in Area::ALL {
            for b in Area::ALL {
                assert_eq!(
                    table.between(Place::Area(a), Place::Area(b)),
                    table.between(Place::Area(b), Place::Area(a))
                );
            }
        }
    }

    #[test]
    fn same_area_uses_intra_leg() {
        let table = AreaDistanceTable::ahmedabad(Area::Satellite);
        assert_eq!(
            table.between(Place::Area(Area::Gota), Place::Area(Area::Gota)),
            INTRA_AREA_LEG
        );
    }

    #[test]
    fn depot_row_follows_its_area() {
        let table = AreaDistanceTable::ahmedabad(Area::Satellite);
        assert_eq!(table.between(Place::Depot, Place::Area(Area::Satellite)), INTRA_AREA_LEG);
        assert_eq!(
            table.between(Place::Depot, Place::Area(Area::Paldi)),
            Leg::new(7.3, 18)
        );
        assert_eq!(table.between(Place::Depot, Place::Depot), Leg::ZERO);
    }

    #[test]
    fn depot_overrides_take_precedence() {
        let table = AreaDistanceTable::ahmedabad(Area::Satellite)
            .with_depot_leg(Area::Paldi, Leg::new(6.1, 17));
        assert_eq!(table.between(Place::Area(Area::Paldi), Place::Depot), Leg::new(6.1, 17));
    }

    #[test]
    fn missing_pairs_fall_back() {
        let table = AreaDistanceTable::empty(Area::Satellite);
        assert_eq!(
            table.between(Place::Area(Area::Bopal), Place::Area(Area::Gota)),
            FALLBACK_LEG
        );
    }

    #[test]
    fn legs_render_as_text() {
        let leg = Leg::new(4.1, 12);
        assert_eq!(leg.text_distance(), "4.1 km");
        assert_eq!(leg.text_duration(), "12 mins");
    }
}
