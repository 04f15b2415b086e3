//! Coordinate shortcuts for pasted map links.

use std::sync::LazyLock;

use radar_core::Coordinates;
use regex::Regex;

static DESKTOP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@(-?\d+\.\d+),(-?\d+\.\d+)").expect("valid desktop link regex")
});
static MOBILE_LAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!3d(-?\d+\.\d+)").expect("valid mobile lat regex"));
static MOBILE_LNG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!4d(-?\d+\.\d+)").expect("valid mobile lng regex"));

fn capture_f64(re: &Regex, text: &str, group: usize) -> Option<f64> {
    re.captures(text)?.get(group)?.as_str().parse().ok()
}

/// Extracts a coordinate embedded in a map link.
///
/// An `@lat,lng` pair wins; otherwise both a `!3d<lat>` and a `!4d<lng>`
/// token must be present. Returns `None` for plain addresses.
#[must_use]
pub fn coordinates_from_link(input: &str) -> Option<Coordinates> {
    if let (Some(lat), Some(lng)) = (
        capture_f64(&DESKTOP_RE, input, 1),
        capture_f64(&DESKTOP_RE, input, 2),
    ) {
        return Some(Coordinates::new(lat, lng));
    }
    let lat = capture_f64(&MOBILE_LAT_RE, input, 1)?;
    let lng = capture_f64(&MOBILE_LNG_RE, input, 1)?;
    Some(Coordinates::new(lat, lng))
}
