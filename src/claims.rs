//! The health-certificate claim object carried under CWT claim -260/1.

use log::warn;
use ring::digest;
use serde_derive::{Deserialize, Serialize};

use crate::error::{CertificateError, Result};
use crate::PassType;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Name {
    #[serde(rename = "fn")]
    pub fn_: Option<String>,
    pub fnt: String,
    pub gn: Option<String>,
    pub gnt: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct VaccinationEntry {
    pub tg: String,
    pub vp: String,
    pub mp: String,
    pub ma: String,
    pub dn: u32,
    pub sd: u32,
    pub dt: String,
    pub co: String,
    pub is: String,
    pub ci: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TestEntry {
    pub tg: String,
    pub tt: String,
    pub nm: Option<String>,
    pub ma: Option<String>,
    pub sc: String,
    pub tr: String,
    pub tc: Option<String>,
    pub co: String,
    pub is: String,
    pub ci: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RecoveryEntry {
    pub tg: String,
    pub fr: String,
    pub co: String,
    pub is: String,
    pub df: String,
    pub du: String,
    pub ci: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct HealthCertificate {
    pub ver: String,
    pub nam: Name,
    pub dob: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub v: Option<Vec<VaccinationEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<Vec<TestEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r: Option<Vec<RecoveryEntry>>,
}

/// The claim group a certificate carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClaimSet<'a> {
    Vaccination(&'a [VaccinationEntry]),
    Test(&'a [TestEntry]),
    Recovery(&'a [RecoveryEntry]),
}

/// The single entry a card is built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClaimEntry<'a> {
    Vaccination(&'a VaccinationEntry),
    Test(&'a TestEntry),
    Recovery(&'a RecoveryEntry),
}

impl HealthCertificate {
    /// Vaccination wins over test, test over recovery, if an issuer ever
    /// sets more than one group.
    pub fn claims(&self) -> Result<ClaimSet<'_>> {
        let present = [self.v.is_some(), self.t.is_some(), self.r.is_some()]
            .iter()
            .filter(|p| **p)
            .count();
        if present > 1 {
            warn!("certificate carries {} claim groups, using the first", present);
        }

        if let Some(v) = &self.v {
            Ok(ClaimSet::Vaccination(v))
        } else if let Some(t) = &self.t {
            Ok(ClaimSet::Test(t))
        } else if let Some(r) = &self.r {
            Ok(ClaimSet::Recovery(r))
        } else {
            Err(CertificateError::Unsupported(
                "no vaccination, test or recovery group".into(),
            ))
        }
    }
}

impl<'a> ClaimSet<'a> {
    pub fn pass_type(&self) -> PassType {
        match self {
            ClaimSet::Vaccination(_) => PassType::Vaccination,
            ClaimSet::Test(_) => PassType::Test,
            ClaimSet::Recovery(_) => PassType::Recovery,
        }
    }

    pub fn first(&self) -> Option<ClaimEntry<'a>> {
        match *self {
            ClaimSet::Vaccination(v) => v.first().map(ClaimEntry::Vaccination),
            ClaimSet::Test(t) => t.first().map(ClaimEntry::Test),
            ClaimSet::Recovery(r) => r.first().map(ClaimEntry::Recovery),
        }
    }
}

pub fn select_entry(hcert: &HealthCertificate) -> Result<ClaimEntry<'_>> {
    let claims = hcert.claims()?;
    claims.first().ok_or_else(|| {
        CertificateError::Unsupported(format!(
            "{} group holds no entry",
            claims.pass_type()
        ))
    })
}

impl<'a> ClaimEntry<'a> {
    pub fn pass_type(&self) -> PassType {
        match self {
            ClaimEntry::Vaccination(_) => PassType::Vaccination,
            ClaimEntry::Test(_) => PassType::Test,
            ClaimEntry::Recovery(_) => PassType::Recovery,
        }
    }

    /// Unique certificate identifier.
    pub fn ci(&self) -> &'a str {
        match *self {
            ClaimEntry::Vaccination(e) => &e.ci,
            ClaimEntry::Test(e) => &e.ci,
            ClaimEntry::Recovery(e) => &e.ci,
        }
    }

    pub fn co(&self) -> &'a str {
        match *self {
            ClaimEntry::Vaccination(e) => &e.co,
            ClaimEntry::Test(e) => &e.co,
            ClaimEntry::Recovery(e) => &e.co,
        }
    }

    pub fn is(&self) -> &'a str {
        match *self {
            ClaimEntry::Vaccination(e) => &e.is,
            ClaimEntry::Test(e) => &e.is,
            ClaimEntry::Recovery(e) => &e.is,
        }
    }

    /// SHA-256 of the upper-cased country followed by the certificate id.
    pub fn fingerprint(&self) -> String {
        let data = format!("{}{}", self.co().to_uppercase(), self.ci());
        digest::digest(&digest::SHA256, data.as_bytes())
            .as_ref()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}
