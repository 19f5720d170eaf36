/// Checks whether the location reported by the monitoring system matches the
/// expected location derived from the template. The comparison ignores case
/// and surrounding whitespace; an empty value on either side is never
/// compliant.
pub fn is_location_compliant(location: &str, expected: &str) -> bool {
    let location = location.trim();
    let expected = expected.trim();
    if location.is_empty() || expected.is_empty() {
        return false;
    }
    location.eq_ignore_ascii_case(expected)
}
