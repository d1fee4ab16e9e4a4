//! Decoders for the health certificates found in COVID pass barcodes.
//!
//! Two unrelated formats are handled:
//!
//! * EU Digital COVID Certificates (`HC1:` prefix): base45 text wrapping a
//!   compressed COSE_Sign1 message whose CWT payload holds the claims.
//! * French 2D-Doc certificates (`DC` prefix): a fixed header and a
//!   field-tagged body followed by a detached signature.
//!
//! Signatures are surfaced as opaque data and never verified.

use std::fmt;

use log::debug;
use serde_derive::Serialize;

pub mod claims;
pub mod codes;
pub mod config;
pub mod dates;
pub mod ddoc;
pub mod error;
pub mod eudcc;

pub use claims::{ClaimEntry, ClaimSet, HealthCertificate};
pub use ddoc::{Certificate2DDoc, CommonCertificateInfo};
pub use error::{CertificateError, DecodeStage, Result};
pub use eudcc::DecodedEudcc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PassType {
    Vaccination,
    Test,
    Recovery,
}

impl fmt::Display for PassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PassType::Vaccination => "VACCINATION",
            PassType::Test => "TEST",
            PassType::Recovery => "RECOVERY",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "format", content = "certificate", rename_all = "lowercase")]
pub enum DecodedCertificate {
    Eudcc(DecodedEudcc),
    #[serde(rename = "2ddoc")]
    DDoc(CommonCertificateInfo),
}

impl DecodedCertificate {
    pub fn pass_type(&self) -> Result<PassType> {
        match self {
            DecodedCertificate::Eudcc(eudcc) => eudcc.entry().map(|e| e.pass_type()),
            DecodedCertificate::DDoc(info) => Ok(info.pass_type()),
        }
    }
}

/// Routes `raw` to the decoder its prefix names.
pub fn decode(raw: &str) -> Result<DecodedCertificate> {
    if raw.starts_with(eudcc::HC1_FIELD) {
        debug!("decoding EU Digital COVID Certificate");
        eudcc::decode(raw).map(DecodedCertificate::Eudcc)
    } else if raw.starts_with(ddoc::DDOC_PREFIX) {
        debug!("decoding 2D-Doc");
        ddoc::parse(raw).map(DecodedCertificate::DDoc)
    } else {
        Err(CertificateError::Format(format!(
            "data must start with {} or {}",
            eudcc::HC1_FIELD,
            ddoc::DDOC_PREFIX
        )))
    }
}

/// Decodes every non-blank line of `text` on its own; a bad line never
/// hides the others.
pub fn decode_all(text: &str) -> Vec<(usize, Result<DecodedCertificate>)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(n, line)| (n, decode(line)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ddoc::parser::tests::{document, test_body, vaccine_body, TEST_HEADER, VACCINE_HEADER};

    #[test]
    fn dispatches_2ddoc() {
        let decoded = decode(&document(VACCINE_HEADER, &vaccine_body())).unwrap();
        assert!(matches!(decoded, DecodedCertificate::DDoc(_)));
        assert_eq!(decoded.pass_type().unwrap(), PassType::Vaccination);
    }

    #[test]
    fn unknown_prefix_fails_closed() {
        for raw in ["", "hello", "HC2:ABC", "dc04"].iter() {
            assert!(matches!(decode(raw), Err(CertificateError::Format(_))));
        }
    }

    #[test]
    fn eudcc_prefix_goes_to_eudcc_decoder() {
        assert!(matches!(
            decode("HC1:!!"),
            Err(CertificateError::Decode {
                stage: DecodeStage::Base45,
                ..
            })
        ));
    }

    #[test]
    fn batch_isolates_failures() {
        let text = format!(
            "{}\n\nnot a certificate\n  {}  \nDC00\n",
            document(VACCINE_HEADER, &vaccine_body()),
            document(TEST_HEADER, &test_body())
        );
        let results = decode_all(&text);

        let lines: Vec<usize> = results.iter().map(|(n, _)| *n).collect();
        assert_eq!(lines, vec![1, 3, 4, 5]);
        assert!(results[0].1.is_ok());
        assert!(matches!(results[1].1, Err(CertificateError::Format(_))));
        assert_eq!(
            results[2].1.as_ref().unwrap().pass_type().unwrap(),
            PassType::Test
        );
        assert!(matches!(
            results[3].1,
            Err(CertificateError::InvalidFormat(_))
        ));
    }

    #[test]
    fn pass_type_labels() {
        assert_eq!(PassType::Recovery.to_string(), "RECOVERY");
        assert_eq!(
            serde_json::to_value(PassType::Vaccination).unwrap(),
            "VACCINATION"
        );
    }
}
