//! Regions: coarse geographic tags assigned to jobs by city-name substring matching.

pub mod assignment;
pub mod handlers;

/// City → region table. Lookup walks it in order; the first match wins.
const CITY_REGIONS: &[(&str, &str)] = &[
    // 209: Central Valley
    ("stockton", "209"),
    ("modesto", "209"),
    ("tracy", "209"),
    ("manteca", "209"),
    ("lodi", "209"),
    ("turlock", "209"),
    ("merced", "209"),
    ("ceres", "209"),
    ("lathrop", "209"),
    ("ripon", "209"),
    ("oakdale", "209"),
    ("riverbank", "209"),
    ("patterson", "209"),
    ("escalon", "209"),
    ("galt", "209"),
    ("atwater", "209"),
    ("los banos", "209"),
    ("sonora", "209"),
    ("angels camp", "209"),
    // 916: Sacramento
    ("sacramento", "916"),
    ("elk grove", "916"),
    ("roseville", "916"),
    ("folsom", "916"),
    ("rancho cordova", "916"),
    ("citrus heights", "916"),
    ("davis", "916"),
    // 510: East Bay
    ("oakland", "510"),
    ("berkeley", "510"),
    ("fremont", "510"),
    ("hayward", "510"),
    ("richmond", "510"),
    ("san leandro", "510"),
    // 925: Tri-Valley / Contra Costa
    ("walnut creek", "925"),
    ("concord", "925"),
    ("pleasanton", "925"),
    ("livermore", "925"),
    ("san ramon", "925"),
    ("antioch", "925"),
    // 559: Fresno
    ("fresno", "559"),
    ("clovis", "559"),
    ("visalia", "559"),
    ("madera", "559"),
];

/// Returns the region for a free-form location string, if any city matches.
pub fn region_for_location(location: &str) -> Option<&'static str> {
    let location = location.to_lowercase();
    CITY_REGIONS
        .iter()
        .find(|(city, _)| location.contains(city))
        .map(|(_, region)| *region)
}

/// Whether `name` is exactly one of the known cities, ignoring case.
pub fn is_known_city(name: &str) -> bool {
    let name = name.trim().to_lowercase();
    CITY_REGIONS.iter().any(|(city, _)| *city == name)
}

/// City substrings that belong to a region, used as the search allow-list.
pub fn cities_for_region(region: &str) -> Vec<&'static str> {
    CITY_REGIONS
        .iter()
        .filter(|(_, r)| *r == region)
        .map(|(city, _)| *city)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_lookup_is_case_insensitive() {
        assert_eq!(region_for_location("Stockton, CA"), Some("209"));
        assert_eq!(region_for_location("downtown MODESTO"), Some("209"));
        assert_eq!(region_for_location("Los Banos"), Some("209"));
        assert_eq!(region_for_location("Elk Grove, California"), Some("916"));
    }

    #[test]
    fn test_known_city_requires_whole_name() {
        assert!(is_known_city("Stockton"));
        assert!(is_known_city("elk grove"));
        assert!(!is_known_city("Stockton forklift"));
        assert!(!is_known_city("elk"));
    }

    #[test]
    fn test_unknown_location_has_no_region() {
        assert_eq!(region_for_location("Austin, TX"), None);
        assert_eq!(region_for_location(""), None);
    }

    #[test]
    fn test_cities_for_region() {
        let cities = cities_for_region("209");
        assert!(cities.contains(&"stockton"));
        assert!(cities.contains(&"modesto"));
        assert!(!cities.contains(&"fresno"));
        assert!(cities_for_region("999").is_empty());
    }
}
