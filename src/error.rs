use std::fmt;

use thiserror::Error;

/// Stage of the EUDCC pipeline that rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStage {
    Base45,
    Inflate,
    Envelope,
    ProtectedHeader,
    Payload,
    HealthCertificate,
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DecodeStage::Base45 => "base45",
            DecodeStage::Inflate => "inflate",
            DecodeStage::Envelope => "COSE envelope",
            DecodeStage::ProtectedHeader => "protected header",
            DecodeStage::Payload => "CWT payload",
            DecodeStage::HealthCertificate => "health certificate",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("{0}")]
    Format(String),
    #[error("can't decode the {stage}: {reason}")]
    Decode { stage: DecodeStage, reason: String },
    #[error("invalid 2D-Doc format: {0}")]
    InvalidFormat(String),
    #[error("missing data for field {0}")]
    MissingField(&'static str),
    #[error("unsupported or empty certificate: {0}")]
    Unsupported(String),
}

impl CertificateError {
    pub(crate) fn decode(stage: DecodeStage, reason: impl fmt::Display) -> Self {
        CertificateError::Decode {
            stage,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CertificateError>;
