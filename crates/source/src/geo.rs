//! Coarse geo enrichment for sessions that arrive with coordinates only.

use funnel_core::Session;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoLocation {
    pub country: Option<String>,
    pub city: Option<String>,
}

/// Resolves a tracker's raw `"lat,lng"` string to a country and city.
pub trait GeoResolver: Send + Sync {
    fn resolve(&self, raw_location: &str) -> GeoLocation;

    /// Fills `country`/`city` on a session that lacks them. Values already
    /// present are left untouched.
    fn enrich(&self, session: &mut Session) {
        if session.country.is_some() && session.city.is_some() {
            return;
        }
        let resolved = self.resolve(&session.raw_location);
        if session.country.is_none() {
            session.country = resolved.country;
        }
        if session.city.is_none() {
            session.city = resolved.city;
        }
    }
}

/// Latitude/longitude rectangle, bounds inclusive.
struct Region {
    name: &'static str,
    lat: (f64, f64),
    lng: (f64, f64),
}

impl Region {
    fn contains(&self, lat: f64, lng: f64) -> bool {
        (self.lat.0..=self.lat.1).contains(&lat) && (self.lng.0..=self.lng.1).contains(&lng)
    }
}

// Checked in order; the first match wins.
const COUNTRIES: &[Region] = &[
    Region {
        name: "India",
        lat: (8.4, 37.6),
        lng: (68.7, 97.25),
    },
    Region {
        name: "United States",
        lat: (24.396308, 49.384358),
        lng: (-125.0, -66.93457),
    },
    Region {
        name: "Canada",
        lat: (49.16209, 60.847059),
        lng: (-141.003, -52.6480987209),
    },
    Region {
        name: "Europe",
        lat: (35.0, 71.0),
        lng: (-10.0, 40.0),
    },
];

const CITIES: &[Region] = &[
    Region {
        name: "New Delhi",
        lat: (28.4, 28.9),
        lng: (77.0, 77.4),
    },
    Region {
        name: "Mumbai",
        lat: (19.0, 19.3),
        lng: (72.7, 73.0),
    },
    Region {
        name: "New York",
        lat: (40.6, 40.9),
        lng: (-74.1, -73.9),
    },
    Region {
        name: "London",
        lat: (51.4, 51.6),
        lng: (-0.2, 0.1),
    },
];

/// Fixed bounding boxes for the markets the funnel runs in. Anything outside
/// them stays unresolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundingBoxResolver;

impl BoundingBoxResolver {
    fn parse(raw: &str) -> Option<(f64, f64)> {
        let (lat, lng) = raw.split_once(',')?;
        let lat = lat.trim().parse::<f64>().ok()?;
        let lng = lng.trim().parse::<f64>().ok()?;
        (lat.is_finite() && lng.is_finite()).then_some((lat, lng))
    }

    fn lookup(regions: &[Region], lat: f64, lng: f64) -> Option<String> {
        regions
            .iter()
            .find(|r| r.contains(lat, lng))
            .map(|r| r.name.to_string())
    }
}

impl GeoResolver for BoundingBoxResolver {
    fn resolve(&self, raw_location: &str) -> GeoLocation {
        match Self::parse(raw_location) {
            Some((lat, lng)) => GeoLocation {
                country: Self::lookup(COUNTRIES, lat, lng),
                city: Self::lookup(CITIES, lat, lng),
            },
            None => GeoLocation::default(),
        }
    }
}
