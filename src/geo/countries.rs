//! ISO country code display names.

/// Maps an ISO country code to an English display name for the region-grouped
/// reports. Codes without a mapping pass through unchanged, which also covers
/// the `"Unknown"` sentinel.
pub fn country_name(code: &str) -> &str {
    match code {
        // North America
        "US" => "United States",
        "CA" => "Canada",
        "MX" => "Mexico",
        "CR" => "Costa Rica",
        "GT" => "Guatemala",
        "PA" => "Panama",
        "CU" => "Cuba",
        "JM" => "Jamaica",
        "DO" => "Dominican Republic",
        // South America
        "BR" => "Brazil",
        "AR" => "Argentina",
        "CL" => "Chile",
        "CO" => "Colombia",
        "PE" => "Peru",
        "VE" => "Venezuela",
        "UY" => "Uruguay",
        "PY" => "Paraguay",
        "BO" => "Bolivia",
        "EC" => "Ecuador",
        // Europe
        "GB" | "UK" => "United Kingdom",
        "FR" => "France",
        "DE" => "Germany",
        "IT" => "Italy",
        "ES" => "Spain",
        "NL" => "Netherlands",
        "RU" => "Russia",
        "SE" => "Sweden",
        "CH" => "Switzerland",
        "BE" => "Belgium",
        "AT" => "Austria",
        "IS" => "Iceland",
        "PL" => "Poland",
        "DK" => "Denmark",
        "NO" => "Norway",
        "FI" => "Finland",
        "PT" => "Portugal",
        "IE" => "Ireland",
        "UA" => "Ukraine",
        "CZ" => "Czechia",
        "GR" => "Greece",
        "HU" => "Hungary",
        "RO" => "Romania",
        "TR" => "Turkey",
        "BG" => "Bulgaria",
        "LT" => "Lithuania",
        "LV" => "Latvia",
        "EE" => "Estonia",
        "LU" => "Luxembourg",
        "SI" => "Slovenia",
        "SK" => "Slovakia",
        "MT" => "Malta",
        "HR" => "Croatia",
        "RS" => "Serbia",
        "MD" => "Moldova",
        "GE" => "Georgia",
        "AM" => "Armenia",
        "AZ" => "Azerbaijan",
        "CY" => "Cyprus",
        // Asia
        "CN" => "China",
        "HK" => "Hong Kong",
        "TW" => "Taiwan",
        "MO" => "Macao",
        "JP" => "Japan",
        "KR" => "South Korea",
        "SG" => "Singapore",
        "IN" => "India",
        "ID" => "Indonesia",
        "MY" => "Malaysia",
        "TH" => "Thailand",
        "PH" => "Philippines",
        "VN" => "Vietnam",
        "PK" => "Pakistan",
        "BD" => "Bangladesh",
        "KZ" => "Kazakhstan",
        "IL" => "Israel",
        "SA" => "Saudi Arabia",
        "AE" => "United Arab Emirates",
        "QA" => "Qatar",
        "OM" => "Oman",
        "KW" => "Kuwait",
        "BH" => "Bahrain",
        "IQ" => "Iraq",
        "IR" => "Iran",
        "UZ" => "Uzbekistan",
        "MN" => "Mongolia",
        "NP" => "Nepal",
        "LK" => "Sri Lanka",
        "MM" => "Myanmar",
        "LA" => "Laos",
        "KH" => "Cambodia",
        "BN" => "Brunei",
        // Oceania
        "AU" => "Australia",
        "NZ" => "New Zealand",
        "FJ" => "Fiji",
        "PG" => "Papua New Guinea",
        // Africa
        "ZA" => "South Africa",
        "EG" => "Egypt",
        "NG" => "Nigeria",
        "KE" => "Kenya",
        "ET" => "Ethiopia",
        "GH" => "Ghana",
        "TZ" => "Tanzania",
        "UG" => "Uganda",
        "DZ" => "Algeria",
        "MA" => "Morocco",
        "TN" => "Tunisia",
        "LY" => "Libya",
        "SD" => "Sudan",
        "RW" => "Rwanda",
        "ZM" => "Zambia",
        "ZW" => "Zimbabwe",
        "BW" => "Botswana",
        "NA" => "Namibia",
        "MZ" => "Mozambique",
        "MG" => "Madagascar",
        "MU" => "Mauritius",
        "SN" => "Senegal",
        "CI" => "Ivory Coast",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_map_to_names() {
        assert_eq!(country_name("US"), "United States");
        assert_eq!(country_name("JP"), "Japan");
        assert_eq!(country_name("DE"), "Germany");
        // Both spellings of the United Kingdom appear in source lists.
        assert_eq!(country_name("GB"), "United Kingdom");
        assert_eq!(country_name("UK"), "United Kingdom");
    }

    #[test]
    fn test_unknown_codes_pass_through() {
        assert_eq!(country_name("ZZ"), "ZZ");
        assert_eq!(country_name("Unknown"), "Unknown");
    }
}
