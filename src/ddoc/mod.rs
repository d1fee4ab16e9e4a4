//! French 2D-Doc certificates: a DC header, a field-tagged body and a
//! detached signature after a unit separator.

use chrono::{NaiveDate, NaiveDateTime};
use serde_derive::Serialize;

use crate::codes;

pub mod grammar;
pub mod info;
pub mod parser;

pub use info::{project, CertificateDetails, CommonCertificateInfo};
pub use parser::{parse, parse_document};

pub const DDOC_PREFIX: &str = "DC";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DDocHeader {
    pub code: String,
    pub creation_date: Option<NaiveDate>,
    pub signature_date: Option<NaiveDate>,
    pub certificate_authority_id: String,
    pub public_key_id: String,
    pub document_version: String,
    pub document_type: String,
    pub document_perimeter: String,
    pub document_country: String,
}

impl DDocHeader {
    pub fn certificate_authority(&self) -> &'static str {
        codes::certificate_authority(&self.certificate_authority_id)
    }

    pub fn public_key_owner(&self) -> &'static str {
        codes::public_key(&self.public_key_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VaccineFields {
    pub vaccinated_last_name: String,
    pub vaccinated_first_name: String,
    pub vaccinated_birth_date: NaiveDateTime,
    pub disease: String,
    pub prophylactic_agent: String,
    pub vaccine: String,
    pub vaccine_maker: String,
    pub doses_received: u32,
    pub doses_expected: u32,
    pub last_dose_date: NaiveDateTime,
    pub cycle_state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestFields {
    pub tested_first_name: String,
    pub tested_last_name: String,
    pub tested_birth_date: NaiveDateTime,
    pub sex: String,
    pub analysis_code: String,
    pub analysis_result: String,
    pub analysis_datetime: NaiveDateTime,
}

impl TestFields {
    pub fn sex_label(&self) -> &'static str {
        codes::sex(&self.sex)
    }

    pub fn result_label(&self) -> &'static str {
        codes::analysis_result(&self.analysis_result)
    }
}

/// Body of a 2D-Doc, chosen by the header's document type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "schema", rename_all = "lowercase")]
pub enum DDocBody {
    Vaccine(VaccineFields),
    Test(TestFields),
}

/// A fully parsed 2D-Doc.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Certificate2DDoc {
    #[serde(flatten)]
    pub header: DDocHeader,
    pub body: DDocBody,
    /// Header and body, i.e. the bytes the signature covers.
    pub signed_data: String,
    pub signature: String,
}
