//! Label tables for the coded values found in 2D-Doc certificates.

use std::collections::HashMap;

use once_cell::sync::Lazy;

pub const UNKNOWN: &str = "Unknown";
pub const UNDETERMINED: &str = "Undetermined";

static CERTIFICATE_AUTHORITIES: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| {
        [
            ("FR01", "AriadNEXT"),
            ("FR02", "LEX PERSONA"),
            ("FR03", "Dhimyotis"),
            ("FR04", "AriadNEXT"),
            ("FR05", "ANTS"),
        ]
        .iter()
        .copied()
        .collect()
    });

static PUBLIC_KEYS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("AHP1", "APHP"),
        ("AHP2", "APHP"),
        ("AV01", "CNAM"),
        ("AV02", "CNAM"),
    ]
    .iter()
    .copied()
    .collect()
});

pub fn certificate_authority(id: &str) -> &'static str {
    CERTIFICATE_AUTHORITIES.get(id).copied().unwrap_or(UNKNOWN)
}

pub fn public_key(id: &str) -> &'static str {
    PUBLIC_KEYS.get(id).copied().unwrap_or(UNKNOWN)
}

pub fn sex(code: &str) -> &'static str {
    match code {
        "M" => "Men",
        "F" => "Women",
        _ => UNKNOWN,
    }
}

pub fn analysis_result(code: &str) -> &'static str {
    match code {
        "P" => "Positive",
        "N" => "Negative",
        "X" => "Non-compliant sample",
        _ => UNDETERMINED,
    }
}
