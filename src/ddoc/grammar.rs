//! Field catalogs and the anchored pattern built from them.

use once_cell::sync::Lazy;
use regex::Regex;

/// Document type that carries a test result; any other type is read as a
/// vaccination certificate.
pub const TEST_DOCUMENT_TYPE: &str = "B2";

/// Byte between the signed data and the signature.
pub const UNIT_SEPARATOR: char = '\x1F';

/// Either byte may close a variable-length field.
const FIELD_TERMINATOR: &str = r"[\x1D\x1E]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Alpha,
    AlphaNumeric,
    Numeric,
    Date,
}

impl FieldKind {
    fn char_class(self) -> &'static str {
        match self {
            FieldKind::Alpha => r"A-Z\-./ ",
            FieldKind::AlphaNumeric => r"0-9A-Z\-./ ",
            FieldKind::Numeric | FieldKind::Date => "0-9",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub code: &'static str,
    pub name: &'static str,
    pub min_len: usize,
    pub max_len: usize,
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn new(
        code: &'static str,
        name: &'static str,
        min_len: usize,
        max_len: usize,
        kind: FieldKind,
    ) -> Self {
        FieldSpec {
            code,
            name,
            min_len,
            max_len,
            kind,
        }
    }

    pub fn is_variable(&self) -> bool {
        self.min_len != self.max_len
    }

    pub fn pattern(&self) -> String {
        let terminator = if self.is_variable() {
            FIELD_TERMINATOR
        } else {
            ""
        };
        format!(
            "{}(?P<{}>[{}]{{{},{}}}){}",
            self.code,
            self.name,
            self.kind.char_class(),
            self.min_len,
            self.max_len,
            terminator
        )
    }
}

use FieldKind::*;

pub const TEST_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("F0", "tested_first_name", 0, 60, Alpha),
    FieldSpec::new("F1", "tested_last_name", 0, 38, Alpha),
    FieldSpec::new("F2", "tested_birth_date", 8, 8, Date),
    FieldSpec::new("F3", "sex", 1, 1, Alpha),
    FieldSpec::new("F4", "analysis_code", 3, 7, AlphaNumeric),
    FieldSpec::new("F5", "analysis_result", 1, 1, Alpha),
    FieldSpec::new("F6", "analysis_datetime", 12, 12, Date),
];

pub const VACCINE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("L0", "vaccinated_last_name", 0, 80, Alpha),
    FieldSpec::new("L1", "vaccinated_first_name", 0, 80, Alpha),
    FieldSpec::new("L2", "vaccinated_birth_date", 8, 8, Date),
    FieldSpec::new("L3", "disease", 0, 30, AlphaNumeric),
    FieldSpec::new("L4", "prophylactic_agent", 5, 15, AlphaNumeric),
    FieldSpec::new("L5", "vaccine", 5, 30, AlphaNumeric),
    FieldSpec::new("L6", "vaccine_maker", 5, 30, AlphaNumeric),
    FieldSpec::new("L7", "doses_received", 1, 1, Numeric),
    FieldSpec::new("L8", "doses_expected", 1, 1, Numeric),
    FieldSpec::new("L9", "last_dose_date", 8, 8, Date),
    FieldSpec::new("LA", "cycle_state", 2, 2, Alpha),
];

/// Selects the body catalog for a header `document_type`.
pub fn catalog_for(document_type: &str) -> &'static [FieldSpec] {
    if document_type == TEST_DOCUMENT_TYPE {
        TEST_FIELDS
    } else {
        VACCINE_FIELDS
    }
}

pub fn body_pattern(fields: &[FieldSpec]) -> String {
    fields.iter().map(FieldSpec::pattern).collect()
}

const HEADER_PATTERN: &str = concat!(
    "DC",
    "(?P<document_version>[0-9]{2})",
    "(?P<certificate_authority_id>[A-Z0-9]{4})",
    "(?P<public_key_id>[A-Z0-9]{4})",
    "(?P<creation_date>[0-9A-F]{4})",
    "(?P<signature_date>[0-9A-F]{4})",
    "(?P<document_type>[A-Z0-9]{2})",
    "(?P<document_perimeter>[A-Z0-9]{2})",
    "(?P<document_country>[A-Z]{2})"
);

const SIGNATURE_PATTERN: &str = r"(?P<signature>[A-Za-z0-9\-_=]+)";

pub fn document_pattern() -> String {
    format!(
        "^(?P<data>{}(?:{}|{})){}{}$",
        HEADER_PATTERN,
        body_pattern(VACCINE_FIELDS),
        body_pattern(TEST_FIELDS),
        regex::escape(&UNIT_SEPARATOR.to_string()),
        SIGNATURE_PATTERN
    )
}

pub static DOCUMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&document_pattern()).expect("2D-Doc grammar must compile")
});
