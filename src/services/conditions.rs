//! Real-time conditions feed
//!
//! Weather, traffic and festival information shown next to the route. The
//! default provider simulates plausible values; a provider failure yields a
//! calm static report instead of an error.

use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::warn;

use super::resilience::ExternalGuard;
use crate::types::Area;

/// Which part of the feed a client wants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionsKind {
    All,
    Weather,
    Traffic,
    Festivals,
}

impl ConditionsKind {
    fn wants_weather(self) -> bool {
        matches!(self, Self::All | Self::Weather)
    }

    fn wants_traffic(self) -> bool {
        matches!(self, Self::All | Self::Traffic)
    }

    fn wants_festivals(self) -> bool {
        matches!(self, Self::All | Self::Festivals)
    }
}

impl FromStr for ConditionsKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "weather" => Ok(Self::Weather),
            "traffic" => Ok(Self::Traffic),
            "festival" | "festivals" => Ok(Self::Festivals),
            other => anyhow::bail!("unknown conditions type '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Temperature {
    pub current: f64,
    pub feels_like: f64,
    pub units: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Precipitation {
    pub chance: u8,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Weather {
    pub temperature: Temperature,
    pub conditions: &'static str,
    pub precipitation: Precipitation,
    pub humidity: u8,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AreaTraffic {
    pub congestion_level: u8,
    pub delay_minutes: u32,
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Traffic {
    pub overall_city_congestion: u8,
    pub status: &'static str,
    pub peak_areas: Vec<Area>,
    pub areas: BTreeMap<Area, AreaTraffic>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Festival {
    pub name: &'static str,
    pub date: NaiveDate,
    pub traffic_impact: &'static str,
    pub affected_areas: Vec<Area>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Festivals {
    pub festivals: Vec<Festival>,
    pub has_festival_today: bool,
}

/// One report from the feed
#[derive(Debug, Clone, Serialize)]
pub struct Conditions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<Weather>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic: Option<Traffic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub festivals: Option<Festivals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub festival_summary: Option<String>,
    pub timestamp: NaiveDateTime,
    pub source: &'static str,
}

impl Conditions {
    /// Static report used when the provider cannot answer
    pub fn calm(kind: ConditionsKind, now: NaiveDateTime) -> Self {
        let weather = kind.wants_weather().then(|| Weather {
            temperature: Temperature {
                current: 30.0,
                feels_like: 32.0,
                units: "C",
            },
            conditions: "Clear",
            precipitation: Precipitation {
                chance: 0,
                kind: "none",
            },
            humidity: 40,
            warnings: Vec::new(),
        });
        let traffic = kind.wants_traffic().then(|| Traffic {
            overall_city_congestion: 0,
            status: "Unknown",
            peak_areas: Vec::new(),
            areas: BTreeMap::new(),
        });
        let festivals = kind.wants_festivals().then(|| Festivals {
            festivals: Vec::new(),
            has_festival_today: false,
        });
        Self::summarised(weather, traffic, festivals, now, "static")
    }

    fn summarised(
        weather: Option<Weather>,
        traffic: Option<Traffic>,
        festivals: Option<Festivals>,
        timestamp: NaiveDateTime,
        source: &'static str,
    ) -> Self {
        Self {
            weather_summary: weather.as_ref().map(|w| {
                format!(
                    "{}, {:.0}°C, {}% chance of {}",
                    w.conditions, w.temperature.current, w.precipitation.chance, w.precipitation.kind
                )
            }),
            traffic_summary: traffic.as_ref().map(|t| {
                if t.peak_areas.is_empty() {
                    format!("{} traffic across the city", t.status)
                } else {
                    let names: Vec<&str> = t.peak_areas.iter().map(|a| a.as_str()).collect();
                    format!("{} traffic, busiest in {}", t.status, names.join(", "))
                }
            }),
            festival_summary: festivals.as_ref().map(|f| match f.festivals.first() {
                Some(next) if f.has_festival_today => {
                    format!("{} today, expect {} delays", next.name, next.traffic_impact.to_lowercase())
                }
                Some(next) => format!("Next festival: {} on {}", next.name, next.date.format("%d %b")),
                None => "No festivals in the next month".to_string(),
            }),
            weather,
            traffic,
            festivals,
            timestamp,
            source,
        }
    }
}

/// Source of real-time conditions
#[async_trait]
pub trait ConditionsProvider: Send + Sync {
    async fn fetch(&self, kind: ConditionsKind, now: NaiveDateTime) -> Result<Conditions>;

    fn name(&self) -> &'static str;
}

// ==========================================================================
// Simulated provider
// ==========================================================================

/// Fixed-date festivals with their effect on traffic
const FESTIVALS: &[(&str, u32, u32, &str, &[Area])] = &[
    ("Uttarayan", 1, 14, "High", &[Area::Satellite, Area::Paldi, Area::Navrangpura]),
    ("Holi", 3, 14, "Moderate", &[Area::Maninagar, Area::Paldi]),
    ("Janmashtami", 8, 26, "Moderate", &[Area::Vastrapur, Area::Bodakdev]),
    ("Navratri", 10, 3, "Severe", &[Area::Satellite, Area::Bopal, Area::Gota, Area::Thaltej]),
    ("Diwali", 10, 31, "High", &[Area::Navrangpura, Area::Maninagar, Area::Chandkheda]),
];

const FESTIVAL_LOOKAHEAD_DAYS: i64 = 30;

/// Plausible random conditions, heavier traffic at rush hours
pub struct SimulatedConditions;

impl SimulatedConditions {
    fn weather<R: Rng>(rng: &mut R, now: NaiveDateTime) -> Weather {
        let monsoon = (6..=9).contains(&now.month());
        let current: f64 = rng.gen_range(24.0..40.0);
        let chance: u8 = if monsoon {
            rng.gen_range(40..=90)
        } else {
            rng.gen_range(0..=20)
        };
        let conditions = match chance {
            0..=15 => "Clear",
            16..=40 => "Partly Cloudy",
            41..=70 => "Cloudy",
            _ => "Rain",
        };
        let mut warnings = Vec::new();
        if current > 38.0 {
            warnings.push("Heat advisory: carry water".to_string());
        }
        if chance > 70 {
            warnings.push("Heavy rain likely: protect parcels".to_string());
        }
        Weather {
            temperature: Temperature {
                current: (current * 10.0).round() / 10.0,
                feels_like: ((current + rng.gen_range(0.0..4.0)) * 10.0).round() / 10.0,
                units: "C",
            },
            conditions,
            precipitation: Precipitation {
                chance,
                kind: if chance > 15 { "rain" } else { "none" },
            },
            humidity: if monsoon {
                rng.gen_range(65..=95)
            } else {
                rng.gen_range(20..=55)
            },
            warnings,
        }
    }

    fn traffic<R: Rng>(rng: &mut R, now: NaiveDateTime) -> Traffic {
        let rush = matches!(now.hour(), 8..=10 | 17..=20);
        let mut areas = BTreeMap::new();
        for area in Area::ALL {
            let congestion: u8 = if rush {
                rng.gen_range(55..=95)
            } else {
                rng.gen_range(10..=60)
            };
            areas.insert(
                area,
                AreaTraffic {
                    congestion_level: congestion,
                    delay_minutes: u32::from(congestion) / 5,
                    status: congestion_status(congestion),
                },
            );
        }
        let overall = (areas.values().map(|t| u32::from(t.congestion_level)).sum::<u32>()
            / areas.len() as u32) as u8;
        let peak_areas = areas
            .iter()
            .filter(|(_, t)| t.congestion_level >= 75)
            .map(|(area, _)| *area)
            .collect();
        Traffic {
            overall_city_congestion: overall,
            status: congestion_status(overall),
            peak_areas,
            areas,
        }
    }

    fn festivals(today: NaiveDate) -> Festivals {
        let mut upcoming: Vec<Festival> = FESTIVALS
            .iter()
            .filter_map(|&(name, month, day, impact, areas)| {
                let this_year = NaiveDate::from_ymd_opt(today.year(), month, day)?;
                let date = if this_year < today {
                    NaiveDate::from_ymd_opt(today.year() + 1, month, day)?
                } else {
                    this_year
                };
                ((date - today).num_days() <= FESTIVAL_LOOKAHEAD_DAYS).then(|| Festival {
                    name,
                    date,
                    traffic_impact: impact,
                    affected_areas: areas.to_vec(),
                })
            })
            .collect();
        upcoming.sort_by_key(|f| f.date);
        Festivals {
            has_festival_today: upcoming.first().map_or(false, |f| f.date == today),
            festivals: upcoming,
        }
    }
}

fn congestion_status(level: u8) -> &'static str {
    match level {
        0..=30 => "Light",
        31..=60 => "Moderate",
        61..=80 => "Heavy",
        _ => "Severe",
    }
}

#[async_trait]
impl ConditionsProvider for SimulatedConditions {
    async fn fetch(&self, kind: ConditionsKind, now: NaiveDateTime) -> Result<Conditions> {
        let mut rng = StdRng::from_entropy();
        let weather = kind.wants_weather().then(|| Self::weather(&mut rng, now));
        let traffic = kind.wants_traffic().then(|| Self::traffic(&mut rng, now));
        let festivals = kind.wants_festivals().then(|| Self::festivals(now.date()));
        Ok(Conditions::summarised(weather, traffic, festivals, now, self.name()))
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

/// Guarded provider with the calm fallback
pub struct ConditionsService {
    provider: Box<dyn ConditionsProvider>,
    guard: ExternalGuard,
}

impl ConditionsService {
    pub fn new(provider: Box<dyn ConditionsProvider>, guard: ExternalGuard) -> Self {
        Self { provider, guard }
    }

    pub async fn current(&self, kind: ConditionsKind, now: NaiveDateTime) -> Conditions {
        match self.guard.call(|| self.provider.fetch(kind, now)).await {
            Ok(conditions) => conditions,
            Err(e) => {
                warn!("Conditions feed unavailable ({}), using static report", e);
                Conditions::calm(kind, now)
            }
        }
    }
}
