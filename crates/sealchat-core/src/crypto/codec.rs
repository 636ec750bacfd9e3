//! Key serialization to and from the stored text form.
//!
//! Keys persist as a JSON Web Key object, the same self-describing shape
//! the storage already holds for existing installations:
//!
//! ```json
//! {"kty":"oct","alg":"A256GCM","k":"<base64url>","key_ops":["encrypt","decrypt"],"ext":true}
//! ```
//!
//! Import is lenient about extra members but strict about `kty`, `alg`,
//! and the key length.

use crate::crypto::key::{SecretKey, KEY_SIZE};
use crate::error::{Error, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;
use zeroize::Zeroizing;

/// JWK key type for symmetric keys.
const JWK_KTY: &str = "oct";

/// JWK algorithm identifier for AES-256-GCM.
const JWK_ALG: &str = "A256GCM";

/// The subset of JWK members import validates.
#[derive(Deserialize)]
struct JsonWebKey {
    kty: String,
    alg: String,
    k: String,
}

/// Serialize a key to its stored text form.
///
/// Deterministic and lossless; a valid in-memory key has no failure path.
pub fn export_key(key: &SecretKey) -> String {
    serde_json::json!({
        "kty": JWK_KTY,
        "alg": JWK_ALG,
        "k": URL_SAFE_NO_PAD.encode(key.as_bytes()),
        "key_ops": ["encrypt", "decrypt"],
        "ext": true,
    })
    .to_string()
}

/// Deserialize a key from its stored text form.
///
/// Fails with [`Error::MalformedKey`] if the string is not a valid JWK for
/// a 256-bit symmetric key, or [`Error::UnsupportedAlgorithm`] if the
/// declared algorithm is not AES-256-GCM.
pub fn import_key(serialized: &str) -> Result<SecretKey> {
    let jwk: JsonWebKey = serde_json::from_str(serialized)
        .map_err(|_| Error::MalformedKey("not a JWK object".into()))?;

    if jwk.kty != JWK_KTY {
        return Err(Error::MalformedKey(format!("unexpected kty {:?}", jwk.kty)));
    }
    if jwk.alg != JWK_ALG {
        return Err(Error::UnsupportedAlgorithm(jwk.alg));
    }

    let bytes = Zeroizing::new(
        URL_SAFE_NO_PAD
            .decode(jwk.k.as_bytes())
            .map_err(|_| Error::MalformedKey("invalid key encoding".into()))?,
    );
    let bytes: [u8; KEY_SIZE] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| Error::MalformedKey("wrong key length".into()))?;

    Ok(SecretKey::from_bytes(bytes))
}
