//! On-disk envelope record and the canonical MAC input.
//!
//! A `secret.json` file holds one JSON object:
//!
//! ```text
//! {"v":1,"kdf":"scrypt","n":16384,"r":8,"p":1,"iters":null,
//!  "salt":"<b64>","nonce":"<b64>","ct":"<b64>","hmac":"<b64>"}
//! ```
//!
//! - **v**: format version (currently `1`); anything else is rejected.
//! - **kdf**: `"scrypt"` (with `n`/`r`/`p`) or `"pbkdf2"` (with `iters`).
//! - **salt**, **nonce**: 16 bytes each.
//! - **ct**: AES-256-CTR ciphertext, same length as the secret.
//! - **hmac**: HMAC-SHA256 over [`mac_input`].
//!
//! Cost fields that do not belong to the recorded algorithm may be absent
//! or `null`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::envelope::{Envelope, TAG_LEN};
use crate::crypto::ctr::NONCE_LEN;
use crate::crypto::kdf::{KdfParams, SALT_LEN};
use crate::errors::{Result, WgKeyError};

/// Current envelope format version.
pub const CURRENT_VERSION: u32 = 1;

/// The JSON shape of a stored envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeRecord {
    pub v: u32,

    pub kdf: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iters: Option<u32>,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub nonce: Vec<u8>,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub ct: Vec<u8>,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub hmac: Vec<u8>,
}

impl From<&Envelope> for EnvelopeRecord {
    fn from(envelope: &Envelope) -> Self {
        let (n, r, p, iters) = match envelope.kdf {
            KdfParams::Scrypt { n, r, p } => (Some(n), Some(r), Some(p), None),
            KdfParams::Pbkdf2 { iterations } => (None, None, None, Some(iterations)),
        };
        Self {
            v: envelope.version,
            kdf: envelope.kdf.algorithm().to_string(),
            n,
            r,
            p,
            iters,
            salt: envelope.salt.to_vec(),
            nonce: envelope.nonce.to_vec(),
            ct: envelope.ciphertext.clone(),
            hmac: envelope.tag.to_vec(),
        }
    }
}

impl TryFrom<EnvelopeRecord> for Envelope {
    type Error = WgKeyError;

    fn try_from(record: EnvelopeRecord) -> Result<Self> {
        if record.v != CURRENT_VERSION {
            return Err(WgKeyError::Corrupt(format!(
                "unsupported version {}, expected {CURRENT_VERSION}",
                record.v
            )));
        }

        let kdf = match record.kdf.as_str() {
            "scrypt" => KdfParams::Scrypt {
                n: required(record.n, "n")?,
                r: required(record.r, "r")?,
                p: required(record.p, "p")?,
            },
            "pbkdf2" => KdfParams::Pbkdf2 {
                iterations: required(record.iters, "iters")?,
            },
            other => {
                return Err(WgKeyError::Corrupt(format!("unknown kdf '{other}'")));
            }
        };
        kdf.validate()
            .map_err(|e| WgKeyError::Corrupt(e.to_string()))?;

        Ok(Envelope {
            version: record.v,
            kdf,
            salt: fixed::<SALT_LEN>(&record.salt, "salt")?,
            nonce: fixed::<NONCE_LEN>(&record.nonce, "nonce")?,
            ciphertext: record.ct,
            tag: fixed::<TAG_LEN>(&record.hmac, "hmac")?,
        })
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| WgKeyError::Corrupt(format!("missing field '{field}'")))
}

fn fixed<const N: usize>(bytes: &[u8], field: &str) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| {
        WgKeyError::Corrupt(format!(
            "field '{field}' must be {N} bytes, got {}",
            bytes.len()
        ))
    })
}

/// Serialize an envelope to its JSON text form.
pub fn encode(envelope: &Envelope) -> Result<String> {
    serde_json::to_string(&EnvelopeRecord::from(envelope))
        .map_err(|e| WgKeyError::Serialization(format!("envelope: {e}")))
}

/// Parse the JSON text form.  Every structural problem is `Corrupt`.
pub fn decode(data: &[u8]) -> Result<Envelope> {
    let record: EnvelopeRecord = serde_json::from_slice(data)
        .map_err(|e| WgKeyError::Corrupt(format!("envelope JSON: {e}")))?;
    Envelope::try_from(record)
}

/// The byte string the authentication tag covers.
///
/// `<kdf>|<params...>|` followed by raw salt, nonce and ciphertext.  Scrypt
/// parameters are written in `n|r|p` order; PBKDF2 writes its iteration
/// count.
pub fn mac_input(kdf: &KdfParams, salt: &[u8], nonce: &[u8], ciphertext: &[u8]) -> Vec<u8> {
    let meta = match *kdf {
        KdfParams::Scrypt { n, r, p } => format!("scrypt|{n}|{r}|{p}"),
        KdfParams::Pbkdf2 { iterations } => format!("pbkdf2|{iterations}"),
    };

    let mut buf = Vec::with_capacity(meta.len() + 1 + salt.len() + nonce.len() + ciphertext.len());
    buf.extend_from_slice(meta.as_bytes());
    buf.push(b'|');
    buf.extend_from_slice(salt);
    buf.extend_from_slice(nonce);
    buf.extend_from_slice(ciphertext);
    buf
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&BASE64.encode(data))
}

fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(kdf: KdfParams) -> Envelope {
        Envelope {
            version: CURRENT_VERSION,
            kdf,
            salt: [1u8; SALT_LEN],
            nonce: [2u8; NONCE_LEN],
            ciphertext: b"ciphertext".to_vec(),
            tag: [3u8; TAG_LEN],
        }
    }

    fn record_json(kdf: KdfParams) -> serde_json::Value {
        serde_json::from_str(&encode(&sample(kdf)).unwrap()).unwrap()
    }

    #[test]
    fn scrypt_record_has_cost_fields() {
        let json = record_json(KdfParams::scrypt(16384, 8, 1));
        assert_eq!(json["v"], 1);
        assert_eq!(json["kdf"], "scrypt");
        assert_eq!(json["n"], 16384);
        assert_eq!(json["r"], 8);
        assert_eq!(json["p"], 1);
        assert!(json.get("iters").is_none());
        assert_eq!(json["salt"], BASE64.encode([1u8; SALT_LEN]));
        assert_eq!(json["ct"], BASE64.encode(b"ciphertext"));
    }

    #[test]
    fn pbkdf2_record_has_iteration_count() {
        let json = record_json(KdfParams::pbkdf2(200_000));
        assert_eq!(json["kdf"], "pbkdf2");
        assert_eq!(json["iters"], 200_000);
        assert!(json.get("n").is_none());
    }

    #[test]
    fn decode_accepts_null_cost_fields() {
        let text = format!(
            r#"{{"v":1,"kdf":"scrypt","n":16384,"r":8,"p":1,"iters":null,
                "salt":"{s}","nonce":"{s}","ct":"","hmac":"{t}"}}"#,
            s = BASE64.encode([0u8; 16]),
            t = BASE64.encode([0u8; 32]),
        );
        let envelope = decode(text.as_bytes()).unwrap();
        assert_eq!(envelope.kdf, KdfParams::scrypt(16384, 8, 1));
        assert!(envelope.ciphertext.is_empty());
    }

    #[test]
    fn decode_rejects_unknown_version() {
        let mut envelope = sample(KdfParams::default());
        envelope.version = 2;
        let text = encode(&envelope).unwrap();
        assert!(matches!(
            decode(text.as_bytes()),
            Err(WgKeyError::Corrupt(msg)) if msg.contains("version")
        ));
    }

    #[test]
    fn decode_rejects_unknown_kdf_and_missing_params() {
        let mut json = record_json(KdfParams::default());
        json["kdf"] = "argon2".into();
        assert!(matches!(
            decode(json.to_string().as_bytes()),
            Err(WgKeyError::Corrupt(_))
        ));

        let mut json = record_json(KdfParams::default());
        json.as_object_mut().unwrap().remove("n");
        assert!(matches!(
            decode(json.to_string().as_bytes()),
            Err(WgKeyError::Corrupt(msg)) if msg.contains("'n'")
        ));
    }

    #[test]
    fn decode_rejects_wrong_lengths_and_bad_base64() {
        let mut json = record_json(KdfParams::default());
        json["nonce"] = BASE64.encode([0u8; 12]).into();
        assert!(matches!(
            decode(json.to_string().as_bytes()),
            Err(WgKeyError::Corrupt(_))
        ));

        let mut json = record_json(KdfParams::default());
        json["ct"] = "***not base64***".into();
        assert!(matches!(
            decode(json.to_string().as_bytes()),
            Err(WgKeyError::Corrupt(_))
        ));

        assert!(matches!(decode(b"not json"), Err(WgKeyError::Corrupt(_))));
    }

    #[test]
    fn decode_rejects_unbounded_costs() {
        let mut json = record_json(KdfParams::default());
        json["n"] = (1u64 << 40).into();
        assert!(matches!(
            decode(json.to_string().as_bytes()),
            Err(WgKeyError::Corrupt(_))
        ));

        let mut json = record_json(KdfParams::default());
        json["n"] = 2.into();
        json["r"] = 1.into();
        json["p"] = ((1u64 << 30) - 1).into();
        assert!(matches!(
            decode(json.to_string().as_bytes()),
            Err(WgKeyError::Corrupt(_))
        ));

        let mut json = record_json(KdfParams::default());
        json["n"] = (1u64 << 20).into();
        json["r"] = 1.into();
        assert!(matches!(
            decode(json.to_string().as_bytes()),
            Err(WgKeyError::Corrupt(_))
        ));

        let mut json = record_json(KdfParams::pbkdf2(200_000));
        json["iters"] = (u32::MAX).into();
        assert!(matches!(
            decode(json.to_string().as_bytes()),
            Err(WgKeyError::Corrupt(_))
        ));
    }

    #[test]
    fn mac_input_layout() {
        let input = mac_input(&KdfParams::scrypt(16384, 8, 1), b"S", b"N", b"C");
        assert_eq!(input, b"scrypt|16384|8|1|SNC");

        let input = mac_input(&KdfParams::pbkdf2(200_000), b"S", b"N", b"");
        assert_eq!(input, b"pbkdf2|200000|SN");
    }
}
