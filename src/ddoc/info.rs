use chrono::NaiveDateTime;
use serde_derive::Serialize;

use super::{Certificate2DDoc, DDocBody};
use crate::PassType;

/// What a 2D-Doc attests, reduced to the values every card shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CertificateDetails {
    Vaccination {
        vaccination_date: NaiveDateTime,
        prophylactic_agent: String,
        doses_received: u32,
        doses_expected: u32,
    },
    Test {
        test_date: NaiveDateTime,
        is_negative: bool,
        is_inconclusive: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommonCertificateInfo {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDateTime,
    pub code: String,
    #[serde(flatten)]
    pub details: CertificateDetails,
    pub source: Certificate2DDoc,
}

impl CommonCertificateInfo {
    pub fn pass_type(&self) -> PassType {
        match self.details {
            CertificateDetails::Vaccination { .. } => PassType::Vaccination,
            CertificateDetails::Test { .. } => PassType::Test,
        }
    }
}

pub fn project(cert: Certificate2DDoc) -> CommonCertificateInfo {
    let (first_name, last_name, date_of_birth, details) = match &cert.body {
        DDocBody::Vaccine(v) => (
            v.vaccinated_first_name.clone(),
            v.vaccinated_last_name.clone(),
            v.vaccinated_birth_date,
            CertificateDetails::Vaccination {
                vaccination_date: v.last_dose_date,
                prophylactic_agent: v.prophylactic_agent.clone(),
                doses_received: v.doses_received,
                doses_expected: v.doses_expected,
            },
        ),
        DDocBody::Test(t) => (
            t.tested_first_name.clone(),
            t.tested_last_name.clone(),
            t.tested_birth_date,
            CertificateDetails::Test {
                test_date: t.analysis_datetime,
                is_negative: t.analysis_result == "N",
                is_inconclusive: t.analysis_result == "X",
            },
        ),
    };

    CommonCertificateInfo {
        first_name,
        last_name,
        date_of_birth,
        code: cert.header.code.clone(),
        details,
        source: cert,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ddoc::parser::tests::{
        document, test_body, vaccine_body, TEST_HEADER, VACCINE_HEADER,
    };
    use crate::ddoc::parse;

    #[test]
    fn vaccine_projection() {
        let raw = document(VACCINE_HEADER, &vaccine_body());
        let info = parse(&raw).unwrap();

        assert_eq!(info.pass_type(), PassType::Vaccination);
        assert_eq!(info.first_name, "JEAN PIERRE");
        assert_eq!(info.last_name, "DUPONT");
        assert_eq!(info.code, raw);
        assert_eq!(info.source.header.document_country, "FR");
        assert_eq!(info.source.header.document_type, "L1");
        assert_eq!(info.source.header.certificate_authority(), "Dhimyotis");
        assert_eq!(info.source.header.public_key_owner(), "CNAM");
        match &info.details {
            CertificateDetails::Vaccination {
                doses_received,
                doses_expected,
                prophylactic_agent,
                ..
            } => {
                assert_eq!(*doses_received, 2);
                assert_eq!(*doses_expected, 2);
                assert_eq!(prophylactic_agent, "J07BX03");
            }
            other => panic!("expected vaccination details, got {:?}", other),
        }
    }

    #[test]
    fn test_projection_derives_result_flags() {
        let info = parse(&document(TEST_HEADER, &test_body())).unwrap();
        assert_eq!(info.pass_type(), PassType::Test);
        assert_eq!(
            info.details,
            CertificateDetails::Test {
                test_date: match &info.source.body {
                    DDocBody::Test(t) => t.analysis_datetime,
                    _ => unreachable!(),
                },
                is_negative: true,
                is_inconclusive: false,
            }
        );

        let inconclusive = test_body().replace("F5N", "F5X");
        let info = parse(&document(TEST_HEADER, &inconclusive)).unwrap();
        assert!(matches!(
            info.details,
            CertificateDetails::Test {
                is_negative: false,
                is_inconclusive: true,
                ..
            }
        ));
    }

    #[test]
    fn serializes_with_type_tag() {
        let info = parse(&document(VACCINE_HEADER, &vaccine_body())).unwrap();
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["type"], "vaccination");
        assert_eq!(json["doses_received"], 2);
        assert_eq!(json["source"]["document_country"], "FR");
        assert_eq!(json["source"]["body"]["schema"], "vaccine");
    }
}
