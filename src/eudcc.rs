use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::io::Read;

use chrono::{DateTime, TimeZone, Utc};
use flate2::read::{DeflateDecoder, ZlibDecoder};
use log::debug;
use serde::Serializer;
use serde_cbor::value::from_value;
use serde_cbor::{from_slice, Value};
use serde_derive::Serialize;

use crate::claims::{self, ClaimEntry, HealthCertificate};
use crate::error::{CertificateError, DecodeStage, Result};

pub const HC1_FIELD: &str = "HC1:";

const HCERT_CLAIM_KEY: i128 = -260;
const DCC: i128 = 1;

const COSE_ALG: i128 = 1;
const COSE_KID: i128 = 4;

const CWT_ISS: i128 = 1;
const CWT_EXP: i128 = 4;
const CWT_IAT: i128 = 6;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoseHeader {
    pub alg: i64,
    /// Key identifier, base64 encoded.
    pub kid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    pub iss: Option<String>,
    pub iat: Option<DateTime<Utc>>,
    pub exp: Option<DateTime<Utc>>,
    pub hcert: HealthCertificate,
    /// The claim map exactly as decoded, including keys `hcert` does not model.
    #[serde(skip)]
    pub raw_hcert: Value,
}

/// A decoded EU Digital COVID Certificate. The signature is carried as is
/// and never checked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedEudcc {
    pub header: CoseHeader,
    pub payload: Payload,
    #[serde(serialize_with = "as_base64")]
    pub signature: Vec<u8>,
}

impl DecodedEudcc {
    pub fn entry(&self) -> Result<ClaimEntry<'_>> {
        claims::select_entry(&self.payload.hcert)
    }

    pub fn signature_base64(&self) -> String {
        base64::encode(&self.signature)
    }
}

fn as_base64<T, S>(bytes: &T, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    serializer.serialize_str(&base64::encode(bytes.as_ref()))
}

fn has_zlib_header(data: &[u8]) -> bool {
    match data {
        [cmf, flg, ..] => {
            (cmf & 0x0f) == 8 && ((u16::from(*cmf) << 8) | u16::from(*flg)) % 31 == 0
        }
        _ => false,
    }
}

fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut cbor_data = Vec::new();
    let read = if has_zlib_header(data) {
        ZlibDecoder::new(data).read_to_end(&mut cbor_data)
    } else {
        debug!("no zlib header, inflating as raw deflate");
        DeflateDecoder::new(data).read_to_end(&mut cbor_data)
    };
    read.map_err(|e| CertificateError::decode(DecodeStage::Inflate, e))?;
    Ok(cbor_data)
}

fn untag(value: Value) -> Value {
    match value {
        Value::Tag(_, inner) => untag(*inner),
        other => other,
    }
}

fn map_get(value: &Value, key: i128) -> Option<&Value> {
    match value {
        Value::Map(m) => m.get(&Value::Integer(key)),
        _ => None,
    }
}

struct Envelope {
    protected: Vec<u8>,
    unprotected: Value,
    payload: Vec<u8>,
    signature: Vec<u8>,
}

fn split_envelope(cbor_data: &[u8]) -> Result<Envelope> {
    let envelope_error =
        |reason: String| CertificateError::decode(DecodeStage::Envelope, reason);

    let envelope: Value = from_slice(cbor_data)
        .map_err(|e| CertificateError::decode(DecodeStage::Envelope, e))?;
    let items = match untag(envelope) {
        Value::Array(items) => items,
        other => {
            return Err(envelope_error(format!(
                "expected a COSE_Sign1 array, found {:?}",
                other
            )))
        }
    };
    if items.len() != 4 {
        return Err(envelope_error(format!(
            "COSE_Sign1 must have 4 elements, found {}",
            items.len()
        )));
    }

    let mut items = items.into_iter();
    match (items.next(), items.next(), items.next(), items.next()) {
        (
            Some(Value::Bytes(protected)),
            Some(unprotected @ Value::Map(_)),
            Some(Value::Bytes(payload)),
            Some(Value::Bytes(signature)),
        ) => Ok(Envelope {
            protected,
            unprotected,
            payload,
            signature,
        }),
        _ => Err(envelope_error(
            "expected [bstr, map, bstr, bstr] (detached payloads are not supported)".into(),
        )),
    }
}

fn read_header(protected: &[u8], unprotected: &Value) -> Result<CoseHeader> {
    let header_error =
        |reason: String| CertificateError::decode(DecodeStage::ProtectedHeader, reason);

    let protected: Value = if protected.is_empty() {
        Value::Map(BTreeMap::new())
    } else {
        from_slice(protected).map_err(|e| header_error(e.to_string()))?
    };
    if !matches!(protected, Value::Map(_)) {
        return Err(header_error("protected header is not a map".into()));
    }

    let lookup = |key: i128| {
        map_get(&protected, key).or_else(|| {
            let found = map_get(unprotected, key);
            if found.is_some() {
                debug!("COSE header {} read from the unprotected bucket", key);
            }
            found
        })
    };

    let alg = match lookup(COSE_ALG) {
        Some(Value::Integer(alg)) => i64::try_from(*alg)
            .map_err(|_| header_error(format!("alg {} out of range", alg)))?,
        Some(other) => {
            return Err(header_error(format!("alg is not an integer: {:?}", other)))
        }
        None => return Err(header_error("missing alg".into())),
    };
    let kid = match lookup(COSE_KID) {
        Some(Value::Bytes(kid)) => Some(base64::encode(kid)),
        Some(other) => {
            return Err(header_error(format!("kid is not a byte string: {:?}", other)))
        }
        None => None,
    };

    Ok(CoseHeader { alg, kid })
}

fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let secs = match value {
        Value::Integer(secs) => i64::try_from(*secs).ok()?,
        Value::Float(secs) => *secs as i64,
        _ => return None,
    };
    Utc.timestamp_opt(secs, 0).single()
}

fn read_payload(payload: &[u8]) -> Result<Payload> {
    let claims: Value = from_slice(payload)
        .map_err(|e| CertificateError::decode(DecodeStage::Payload, e))?;
    if !matches!(claims, Value::Map(_)) {
        return Err(CertificateError::decode(
            DecodeStage::Payload,
            "CWT claims are not a map",
        ));
    }

    let iss = match map_get(&claims, CWT_ISS) {
        Some(Value::Text(iss)) => Some(iss.clone()),
        _ => None,
    };
    let iat = map_get(&claims, CWT_IAT).and_then(timestamp);
    let exp = map_get(&claims, CWT_EXP).and_then(timestamp);

    let eudcc = map_get(&claims, HCERT_CLAIM_KEY)
        .and_then(|hcert| map_get(hcert, DCC))
        .ok_or_else(|| {
            CertificateError::decode(
                DecodeStage::HealthCertificate,
                "no EU Digital COVID Certificate under claim -260/1",
            )
        })?;
    let raw_hcert = eudcc.clone();
    let hcert: HealthCertificate = from_value(raw_hcert.clone())
        .map_err(|e| CertificateError::decode(DecodeStage::HealthCertificate, e))?;

    Ok(Payload {
        iss,
        iat,
        exp,
        hcert,
        raw_hcert,
    })
}

pub fn decode(data: &str) -> Result<DecodedEudcc> {
    let base45_data = data.trim_end().strip_prefix(HC1_FIELD).ok_or_else(|| {
        CertificateError::Format(format!("data must start with {} prefix", HC1_FIELD))
    })?;

    let base45_decoded = base45::decode(base45_data)
        .map_err(|e| CertificateError::decode(DecodeStage::Base45, e))?;
    let cbor_data = inflate(&base45_decoded)?;
    debug!(
        "inflated {} base45 bytes into {} CBOR bytes",
        base45_decoded.len(),
        cbor_data.len()
    );

    let envelope = split_envelope(&cbor_data)?;
    let header = read_header(&envelope.protected, &envelope.unprotected)?;
    let payload = read_payload(&envelope.payload)?;

    Ok(DecodedEudcc {
        header,
        payload,
        signature: envelope.signature,
    })
}
