//! Encrypted envelope for direct requests
//!
//! Flat boilers do not accept plaintext commands. The command JSON is
//! encrypted with AES-256-CBC and PKCS#7 padding, base64-encoded, and sent as
//! `{"Msg": "<ciphertext>"}`.
//!
//! WARNING: the vendor protocol uses a key baked into the official client and
//! an all-zero IV. This gives no confidentiality against anyone who has the
//! client, and identical commands always produce identical ciphertexts. It is
//! reproduced here for wire compatibility only. Swap the key through
//! [`Envelope::new`] if the vendor ever rotates it.

use std::fmt;

use aes::Aes256;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::command::Command;
use crate::error::{ProtocolError, ProtocolResult};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// Key shipped in the vendor's mobile client
const VENDOR_KEY: [u8; 32] = [
    57, 16, 127, 45, 31, 100, 201, 53, 0, 217, 254, 8, 193, 76, 91, 123, 213, 1, 175, 72, 28, 44,
    30, 12, 84, 3, 8, 14, 105, 228, 19, 47,
];

const ZERO_IV: [u8; BLOCK_SIZE] = [0; BLOCK_SIZE];

/// Wire wrapper substituted for a plaintext command body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedMessage {
    #[serde(rename = "Msg")]
    pub msg: String,
}

/// Symmetric envelope used for encrypted device families
#[derive(Clone)]
pub struct Envelope {
    key: [u8; 32],
    iv: [u8; BLOCK_SIZE],
}

impl Envelope {
    /// Envelope with a custom key and IV
    pub fn new(key: [u8; 32], iv: [u8; BLOCK_SIZE]) -> Self {
        Self { key, iv }
    }

    /// Envelope matching the vendor relay
    pub fn vendor() -> Self {
        Self::new(VENDOR_KEY, ZERO_IV)
    }

    /// Serialize a value to compact JSON and encrypt it
    pub fn encrypt<T: Serialize + ?Sized>(&self, payload: &T) -> ProtocolResult<String> {
        let json = serde_json::to_string(payload)?;
        Ok(self.encrypt_text(&json))
    }

    /// Encrypt already-serialized text
    pub fn encrypt_text(&self, plaintext: &str) -> String {
        let ciphertext = Aes256CbcEnc::new(&self.key.into(), &self.iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        BASE64.encode(ciphertext)
    }

    /// Encrypt a command and wrap it for the wire
    pub fn seal(&self, command: &Command) -> SealedMessage {
        SealedMessage {
            msg: self.encrypt_text(&command.to_json()),
        }
    }

    /// Decrypt base64 ciphertext back to its plaintext
    pub fn decrypt_text(&self, ciphertext: &str) -> ProtocolResult<String> {
        let bytes = BASE64
            .decode(ciphertext.trim())
            .map_err(|e| ProtocolError::decryption(format!("invalid base64: {}", e)))?;

        if bytes.is_empty() || bytes.len() % BLOCK_SIZE != 0 {
            return Err(ProtocolError::decryption(format!(
                "ciphertext length {} is not a positive multiple of {}",
                bytes.len(),
                BLOCK_SIZE
            )));
        }

        let plaintext = Aes256CbcDec::new(&self.key.into(), &self.iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&bytes)
            .map_err(|_| ProtocolError::decryption("invalid padding"))?;

        String::from_utf8(plaintext)
            .map_err(|e| ProtocolError::decryption(format!("plaintext is not UTF-8: {}", e)))
    }

    /// Decrypt base64 ciphertext and parse the JSON inside
    pub fn decrypt(&self, ciphertext: &str) -> ProtocolResult<Value> {
        self.decrypt_as(ciphertext)
    }

    /// Decrypt and deserialize into a typed value
    pub fn decrypt_as<T: DeserializeOwned>(&self, ciphertext: &str) -> ProtocolResult<T> {
        let text = self.decrypt_text(ciphertext)?;
        serde_json::from_str(&text)
            .map_err(|e| ProtocolError::decryption(format!("plaintext is not valid JSON: {}", e)))
    }

    /// Decrypt a response body from an encrypted device family
    ///
    /// Accepts the `{"Msg": ...}` wrapper, a JSON string, or bare base64 text.
    /// A JSON object without `Msg` is a plaintext reply and is returned as is.
    pub fn open(&self, body: &str) -> ProtocolResult<Value> {
        let body = body.trim();
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => match map.get("Msg") {
                Some(Value::String(msg)) => self.decrypt(msg),
                Some(other) => Err(ProtocolError::decryption(format!(
                    "encrypted message is not a string: {}",
                    other
                ))),
                None => Ok(Value::Object(map)),
            },
            Ok(Value::String(ciphertext)) => self.decrypt(&ciphertext),
            Ok(other) => Err(ProtocolError::decryption(format!(
                "unexpected encrypted response: {}",
                other
            ))),
            Err(_) => self.decrypt(body),
        }
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::vendor()
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    // Captured from the vendor client talking to a flat boiler
    const CAPTURED_ON: &str =
        "cXEdGfPnzi2BKP93KDtaHELl3Rfcp1EdeGLGPm3lIkH/eEfL1cV3KsaYpYQVUmM1h1ox4EaqC0yBk4u4WvBaQA==";
    const CAPTURED_POWERFULL: &str = "cXEdGfPnzi2BKP93KDtaHELl3Rfcp1EdeGLGPm3lIkH/qVHRFecJV3wGPNbMxvsbKH8MtcU3Pe8JDw3ikdxL+/LX1k54uo0dnSnnnTA41yw=";

    #[test]
    fn test_seal_matches_captured_traffic() {
        let envelope = Envelope::vendor();

        let on = Command::builder("ZqeZWqyVU12LAPGk", "On").build();
        assert_eq!(envelope.seal(&on).msg, CAPTURED_ON);

        let powerful = Command::builder("ZqeZWqyVU12LAPGk", "Powerfull").build();
        assert_eq!(envelope.seal(&powerful).msg, CAPTURED_POWERFULL);
    }

    #[test]
    fn test_decrypt_captured_traffic() {
        let value = Envelope::vendor().decrypt(CAPTURED_POWERFULL).unwrap();
        assert_eq!(
            value,
            json!({"ID": "ZqeZWqyVU12LAPGk", "Req": "Powerfull", "CID": "1", "CRC": "EF8916E9"})
        );
    }

    #[test]
    fn test_round_trip() {
        let envelope = Envelope::vendor();
        let payload = json!({
            "ID": "abc",
            "nested": {"list": [1, 2, 3], "flag": true},
            "text": "žluťoučký kůň",
            "empty": null
        });

        let ciphertext = envelope.encrypt(&payload).unwrap();
        assert_eq!(envelope.decrypt(&ciphertext).unwrap(), payload);
    }

    #[test]
    fn test_block_aligned_plaintext_gets_full_padding_block() {
        let envelope = Envelope::vendor();
        // 16 bytes of JSON
        let payload = json!("0123456789abcd");
        let ciphertext = envelope.encrypt(&payload).unwrap();
        assert_eq!(BASE64.decode(&ciphertext).unwrap().len(), 32);
        assert_eq!(envelope.decrypt(&ciphertext).unwrap(), payload);
    }

    #[test]
    fn test_decrypt_rejects_non_base64() {
        let err = Envelope::vendor().decrypt("not base64!!").unwrap_err();
        assert!(matches!(err, ProtocolError::DecryptionFailed(_)));
    }

    #[test]
    fn test_decrypt_rejects_wrong_length() {
        let err = Envelope::vendor().decrypt("AAAA").unwrap_err();
        assert!(matches!(err, ProtocolError::DecryptionFailed(_)));

        let err = Envelope::vendor().decrypt("").unwrap_err();
        assert!(matches!(err, ProtocolError::DecryptionFailed(_)));
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails_cleanly() {
        let other = Envelope::new([7; 32], ZERO_IV);
        let ciphertext = other.encrypt(&json!({"Req": "GetStatus"})).unwrap();
        let err = Envelope::vendor().decrypt(&ciphertext).unwrap_err();
        assert!(matches!(err, ProtocolError::DecryptionFailed(_)));
    }

    #[test]
    fn test_open_response_variants() {
        let envelope = Envelope::vendor();
        let expected = json!({"Res": "On", "Code": "0"});
        let ciphertext = envelope.encrypt(&expected).unwrap();

        let wrapped = serde_json::to_string(&SealedMessage {
            msg: ciphertext.clone(),
        })
        .unwrap();
        assert_eq!(envelope.open(&wrapped).unwrap(), expected);
        assert_eq!(envelope.open(&format!("\"{}\"", ciphertext)).unwrap(), expected);
        assert_eq!(envelope.open(&ciphertext).unwrap(), expected);
    }

    #[test]
    fn test_open_passes_plaintext_object_through() {
        let value = Envelope::vendor()
            .open(r#"{"Res":"Smart","Code":"0","Type":"OK","Reason":"SUCCESS"}"#)
            .unwrap();
        assert_eq!(
            value,
            json!({"Res": "Smart", "Code": "0", "Type": "OK", "Reason": "SUCCESS"})
        );
    }

    #[test]
    fn test_open_rejects_undecodable_message() {
        let envelope = Envelope::vendor();

        let err = envelope.open(r#"{"Msg":"not base64!!"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::DecryptionFailed(_)));

        let err = envelope.open(r#"{"Msg":42}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::DecryptionFailed(_)));

        let err = envelope.open(r#""AAAA""#).unwrap_err();
        assert!(matches!(err, ProtocolError::DecryptionFailed(_)));

        let err = envelope.open("AAAA").unwrap_err();
        assert!(matches!(err, ProtocolError::DecryptionFailed(_)));
    }

    #[test]
    fn test_debug_hides_key() {
        let rendered = format!("{:?}", Envelope::vendor());
        assert!(!rendered.contains("57"));
    }
}
