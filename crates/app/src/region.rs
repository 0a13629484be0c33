use model::Region;

/// Maps the upstream's free-text region label to `Region`. Neither §3 nor
/// the upstream contract pins the exact casing/spelling upstream sends;
/// matching is case-insensitive and unrecognised values fall back to
/// `Europe` with a warning rather than failing the whole server listing.
pub fn region_for(raw: &str) -> Region {
    match raw.to_ascii_uppercase().as_str() {
        "ASIA" => Region::Asia,
        "EUROPE" => Region::Europe,
        "US_NORTH" | "USNORTH" | "US-NORTH" => Region::UsNorth,
        other => {
            tracing::warn!(region = other, "unrecognised upstream region, defaulting to Europe");
            Region::Europe
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_known_regions_case_insensitively() {
        assert_eq!(region_for("asia"), Region::Asia);
        assert_eq!(region_for("EUROPE"), Region::Europe);
        assert_eq!(region_for("us-north"), Region::UsNorth);
    }

    #[test]
    fn unknown_region_defaults_to_europe() {
        assert_eq!(region_for("atlantis"), Region::Europe);
    }
}
