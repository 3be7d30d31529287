//! Fixed station catalog: for each traded city, the NWS forecast-office
//! site code and CLI product station identifier used by
//! [`crate::nws::fetch_cli_text`]. A closed four-entry table, not a remote
//! lookup — these never change at runtime.

use common::City;

#[derive(Debug, Clone, Copy)]
pub struct StationInfo {
    pub lat: f64,
    pub lon: f64,
    pub cli_site: &'static str,
    pub cli_station: &'static str,
}

pub fn station_for(city: City) -> StationInfo {
    match city {
        City::Nyc => StationInfo { lat: 40.7128, lon: -74.0060, cli_site: "OKX", cli_station: "NYC" },
        City::Chi => StationInfo { lat: 41.8781, lon: -87.6298, cli_site: "LOT", cli_station: "ORD" },
        City::Mia => StationInfo { lat: 25.7617, lon: -80.1918, cli_site: "MFL", cli_station: "MIA" },
        City::Aus => StationInfo { lat: 30.2672, lon: -97.7431, cli_site: "EWX", cli_station: "AUS" },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_city_has_a_station_entry() {
        for city in City::ALL {
            let info = station_for(city);
            assert!(!info.cli_site.is_empty());
            assert!(!info.cli_station.is_empty());
        }
    }
}
