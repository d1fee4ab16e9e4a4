use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use log::debug;
use regex::Captures;

use super::grammar::{self, FieldKind, FieldSpec, DOCUMENT, TEST_FIELDS};
use super::info::{project, CommonCertificateInfo};
use super::{Certificate2DDoc, DDocBody, DDocHeader, TestFields, VaccineFields};
use crate::dates;
use crate::error::{CertificateError, Result};

#[derive(Debug, Clone, PartialEq)]
enum FieldValue {
    Text(String),
    Number(u32),
    Date(NaiveDateTime),
}

/// Body values keyed by field name, as read through a catalog.
#[derive(Debug, Default)]
struct Fields(BTreeMap<&'static str, FieldValue>);

impl Fields {
    fn extract(catalog: &[FieldSpec], caps: &Captures<'_>) -> Result<Self> {
        let mut fields = Fields::default();
        for spec in catalog {
            let raw = caps
                .name(spec.name)
                .ok_or(CertificateError::MissingField(spec.name))?
                .as_str();
            fields.0.insert(spec.name, parse_value(spec, raw)?);
        }
        Ok(fields)
    }

    fn get(&self, name: &'static str) -> Result<&FieldValue> {
        self.0.get(name).ok_or(CertificateError::MissingField(name))
    }

    fn text(&self, name: &'static str) -> Result<String> {
        match self.get(name)? {
            FieldValue::Text(s) => Ok(s.clone()),
            other => Err(kind_mismatch(name, "text", other)),
        }
    }

    fn number(&self, name: &'static str) -> Result<u32> {
        match self.get(name)? {
            FieldValue::Number(n) => Ok(*n),
            other => Err(kind_mismatch(name, "number", other)),
        }
    }

    fn date(&self, name: &'static str) -> Result<NaiveDateTime> {
        match self.get(name)? {
            FieldValue::Date(d) => Ok(*d),
            other => Err(kind_mismatch(name, "date", other)),
        }
    }
}

fn kind_mismatch(name: &str, expected: &str, found: &FieldValue) -> CertificateError {
    CertificateError::InvalidFormat(format!(
        "field {} should hold a {}, found {:?}",
        name, expected, found
    ))
}

fn parse_value(spec: &FieldSpec, raw: &str) -> Result<FieldValue> {
    match spec.kind {
        FieldKind::Alpha | FieldKind::AlphaNumeric => {
            Ok(FieldValue::Text(raw.trim().to_string()))
        }
        FieldKind::Numeric => raw.parse().map(FieldValue::Number).map_err(|e| {
            CertificateError::InvalidFormat(format!("field {}: {}", spec.name, e))
        }),
        FieldKind::Date => dates::body_date(raw).map(FieldValue::Date).ok_or_else(|| {
            CertificateError::InvalidFormat(format!(
                "field {}: {:?} is not a valid date",
                spec.name, raw
            ))
        }),
    }
}

impl VaccineFields {
    fn from_fields(f: &Fields) -> Result<Self> {
        Ok(VaccineFields {
            vaccinated_last_name: f.text("vaccinated_last_name")?,
            vaccinated_first_name: f.text("vaccinated_first_name")?,
            vaccinated_birth_date: f.date("vaccinated_birth_date")?,
            disease: f.text("disease")?,
            prophylactic_agent: f.text("prophylactic_agent")?,
            vaccine: f.text("vaccine")?,
            vaccine_maker: f.text("vaccine_maker")?,
            doses_received: f.number("doses_received")?,
            doses_expected: f.number("doses_expected")?,
            last_dose_date: f.date("last_dose_date")?,
            cycle_state: f.text("cycle_state")?,
        })
    }
}

impl TestFields {
    fn from_fields(f: &Fields) -> Result<Self> {
        Ok(TestFields {
            tested_first_name: f.text("tested_first_name")?,
            tested_last_name: f.text("tested_last_name")?,
            tested_birth_date: f.date("tested_birth_date")?,
            sex: f.text("sex")?,
            analysis_code: f.text("analysis_code")?,
            analysis_result: f.text("analysis_result")?,
            analysis_datetime: f.date("analysis_datetime")?,
        })
    }
}

fn header_text(caps: &Captures<'_>, name: &'static str) -> Result<String> {
    caps.name(name)
        .map(|m| m.as_str().to_string())
        .ok_or(CertificateError::MissingField(name))
}

fn parse_header(raw: &str, caps: &Captures<'_>) -> Result<DDocHeader> {
    Ok(DDocHeader {
        code: raw.to_string(),
        creation_date: dates::header_date(&header_text(caps, "creation_date")?),
        signature_date: dates::header_date(&header_text(caps, "signature_date")?),
        certificate_authority_id: header_text(caps, "certificate_authority_id")?,
        public_key_id: header_text(caps, "public_key_id")?,
        document_version: header_text(caps, "document_version")?,
        document_type: header_text(caps, "document_type")?,
        document_perimeter: header_text(caps, "document_perimeter")?,
        document_country: header_text(caps, "document_country")?,
    })
}

/// Matches a whole 2D-Doc against the grammar and builds the typed record.
pub fn parse_document(raw: &str) -> Result<Certificate2DDoc> {
    let caps = DOCUMENT.captures(raw).ok_or_else(|| {
        CertificateError::InvalidFormat("input does not match the 2D-Doc grammar".into())
    })?;

    let header = parse_header(raw, &caps)?;
    let catalog = grammar::catalog_for(&header.document_type);
    debug!(
        "2D-Doc document type {} read with {} fields",
        header.document_type,
        catalog.len()
    );

    let fields = Fields::extract(catalog, &caps)?;
    let body = if catalog == TEST_FIELDS {
        DDocBody::Test(TestFields::from_fields(&fields)?)
    } else {
        DDocBody::Vaccine(VaccineFields::from_fields(&fields)?)
    };

    Ok(Certificate2DDoc {
        header,
        body,
        signed_data: header_text(&caps, "data")?,
        signature: header_text(&caps, "signature")?,
    })
}

pub fn parse(raw: &str) -> Result<CommonCertificateInfo> {
    parse_document(raw).map(project)
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ddoc::grammar::UNIT_SEPARATOR;

    pub const VACCINE_HEADER: &str = "DC04FR03AV011E821E82L101FR";
    pub const TEST_HEADER: &str = "DC04FR03AV011E821E82B201FR";
    pub const SIGNATURE: &str = "RZTTN5QVDLJ7ELZ5WYJ2XUHPO4NR6VJIGBMOIRZ5LWQZ6ZPMNKCNXMNAK2WQOTAVTR6XW5BP4LYGUSKZ2RZZEJA4XLLFPBALCV5NNFY";

    pub fn vaccine_body() -> String {
        [
            "L0DUPONT\x1D",
            "L1JEAN PIERRE\x1D",
            "L201021970",
            "L3COVID-19\x1D",
            "L4J07BX03\x1D",
            "L5COMIRNATY\x1D",
            "L6PFIZER/BIONTECH\x1D",
            "L72",
            "L82",
            "L912052021",
            "LATE",
        ]
        .concat()
    }

    pub fn test_body() -> String {
        [
            "F0MARIE\x1D",
            "F1MARTIN\x1D",
            "F215081985",
            "F3F",
            "F494558-4\x1D",
            "F5N",
            "F6240520211435",
        ]
        .concat()
    }

    pub fn document(header: &str, body: &str) -> String {
        format!("{}{}{}{}", header, body, UNIT_SEPARATOR, SIGNATURE)
    }

    fn noon(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn parses_vaccine_document() {
        let raw = document(VACCINE_HEADER, &vaccine_body());
        let cert = parse_document(&raw).unwrap();

        assert_eq!(cert.header.code, raw);
        assert_eq!(cert.header.document_version, "04");
        assert_eq!(cert.header.certificate_authority_id, "FR03");
        assert_eq!(cert.header.public_key_id, "AV01");
        assert_eq!(cert.header.document_type, "L1");
        assert_eq!(cert.header.document_perimeter, "01");
        assert_eq!(cert.header.document_country, "FR");
        assert_eq!(
            cert.header.creation_date,
            NaiveDate::from_ymd_opt(2021, 5, 20)
        );
        assert_eq!(cert.signature, SIGNATURE);
        assert_eq!(cert.signed_data, format!("{}{}", VACCINE_HEADER, vaccine_body()));

        let expected = VaccineFields {
            vaccinated_last_name: "DUPONT".to_string(),
            vaccinated_first_name: "JEAN PIERRE".to_string(),
            vaccinated_birth_date: noon(1970, 2, 1),
            disease: "COVID-19".to_string(),
            prophylactic_agent: "J07BX03".to_string(),
            vaccine: "COMIRNATY".to_string(),
            vaccine_maker: "PFIZER/BIONTECH".to_string(),
            doses_received: 2,
            doses_expected: 2,
            last_dose_date: noon(2021, 5, 12),
            cycle_state: "TE".to_string(),
        };
        assert_eq!(cert.body, DDocBody::Vaccine(expected));
    }

    #[test]
    fn parses_test_document() {
        let cert = parse_document(&document(TEST_HEADER, &test_body())).unwrap();
        match cert.body {
            DDocBody::Test(t) => {
                assert_eq!(t.tested_first_name, "MARIE");
                assert_eq!(t.tested_last_name, "MARTIN");
                assert_eq!(t.analysis_code, "94558-4");
                assert_eq!(t.result_label(), "Negative");
                assert_eq!(t.sex_label(), "Women");
                assert_eq!(
                    t.analysis_datetime,
                    NaiveDate::from_ymd_opt(2021, 5, 24)
                        .unwrap()
                        .and_hms_opt(14, 35, 0)
                        .unwrap()
                );
            }
            other => panic!("expected a test body, got {:?}", other),
        }
    }

    #[test]
    fn parsing_is_idempotent() {
        let raw = document(VACCINE_HEADER, &vaccine_body());
        assert_eq!(parse_document(&raw).unwrap(), parse_document(&raw).unwrap());
    }

    #[test]
    fn document_type_alone_selects_schema() {
        // Same test body, only the document type differs: B2 reads the
        // test catalog, anything else looks for vaccine fields.
        let as_test = parse_document(&document(TEST_HEADER, &test_body()));
        assert!(matches!(as_test, Ok(Certificate2DDoc { body: DDocBody::Test(_), .. })));

        let as_vaccine = parse_document(&document(VACCINE_HEADER, &test_body()));
        assert!(matches!(
            as_vaccine,
            Err(CertificateError::MissingField("vaccinated_last_name"))
        ));
    }

    #[test]
    fn extra_characters_are_rejected() {
        let raw = document(VACCINE_HEADER, &vaccine_body());
        for bad in [
            format!("{}\n", raw),
            format!("{} ", raw),
            format!("{}!", raw),
            format!(" {}", raw),
            format!("X{}", raw),
        ]
        .iter()
        {
            assert!(
                matches!(parse_document(bad), Err(CertificateError::InvalidFormat(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn other_separator_before_signature_is_rejected() {
        let raw = format!("{}{}\x1E{}", VACCINE_HEADER, vaccine_body(), SIGNATURE);
        assert!(matches!(
            parse_document(&raw),
            Err(CertificateError::InvalidFormat(_))
        ));
    }

    #[test]
    fn missing_signature_is_rejected() {
        let raw = format!("{}{}", VACCINE_HEADER, vaccine_body());
        assert!(matches!(
            parse_document(&raw),
            Err(CertificateError::InvalidFormat(_))
        ));
    }

    #[test]
    fn impossible_body_date_is_invalid() {
        let body = vaccine_body().replace("L912052021", "L931022021");
        match parse_document(&document(VACCINE_HEADER, &body)) {
            Err(CertificateError::InvalidFormat(reason)) => {
                assert!(reason.contains("last_dose_date"))
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn unknown_header_dates_are_absent() {
        let header = VACCINE_HEADER.replace("1E821E82", "FFFF1E82");
        let cert = parse_document(&document(&header, &vaccine_body())).unwrap();
        assert_eq!(cert.header.creation_date, None);
        assert_eq!(
            cert.header.signature_date,
            NaiveDate::from_ymd_opt(2021, 5, 20)
        );
    }
}
