//! # Authkit
//!
//! Password verifier encoding for Postgres, matching the server's own
//! `pg_md5_encrypt()` and `scram_build_verifier()` output byte for byte.
//! The resulting strings are suitable as the PASSWORD in `CREATE USER`.
//!
//! Two schemes are supported:
//!
//! - `md5`: the literal prefix `md5` followed by the lowercase hex digest
//!   of `MD5(password || username)`
//! - `scram-sha-256`:
//!   `SCRAM-SHA-256$<iterations>:<b64 salt>$<b64 StoredKey>:<b64 ServerKey>`

mod error;

pub use error::{Error, Result};

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha2::Sha256;

/// Iteration count used by Postgres for SCRAM verifiers
pub const SCRAM_ITERATIONS: u32 = 4096;

const SCRAM_SALT_LEN: usize = 16;

/// Encode a password under the named scheme
///
/// `username` is required only for `md5`. Unknown schemes fail with
/// [`Error::UnrecognizedScheme`].
pub fn encrypted_password(scheme: &str, password: &str, username: Option<&str>) -> Result<String> {
    match scheme {
        "scram-sha-256" => Ok(scram_password(password)),
        "md5" => {
            let username = username.ok_or(Error::MissingUsername)?;
            Ok(md5_password(password, username))
        }
        other => Err(Error::UnrecognizedScheme(other.to_string())),
    }
}

/// `md5` || md5_hex(password || username), as computed by pg_md5_encrypt()
pub fn md5_password(password: &str, username: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(password.as_bytes());
    hasher.update(username.as_bytes());
    format!("md5{}", hex(&hasher.finalize()))
}

/// Build a SCRAM-SHA-256 verifier with a random 16-byte salt
pub fn scram_password(password: &str) -> String {
    use rand::RngCore;
    let mut salt = [0u8; SCRAM_SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    scram_password_with_salt(password, &salt, SCRAM_ITERATIONS)
}

/// Build a SCRAM-SHA-256 verifier from an explicit salt and iteration count
///
/// `SaltedPassword = PBKDF2-HMAC-SHA256(password, salt, iterations)`,
/// `StoredKey = SHA256(HMAC(SaltedPassword, "Client Key"))`,
/// `ServerKey = HMAC(SaltedPassword, "Server Key")`. Deterministic, which is
/// what lets a verifier be checked by re-deriving from its embedded salt.
pub fn scram_password_with_salt(password: &str, salt: &[u8], iterations: u32) -> String {
    let mut salted = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut salted);

    let client_key = hmac_sha256(&salted, b"Client Key");
    let server_key = hmac_sha256(&salted, b"Server Key");
    let stored_key = Sha256::digest(client_key);

    format!(
        "SCRAM-SHA-256${}:{}${}:{}",
        iterations,
        B64.encode(salt),
        B64.encode(stored_key),
        B64.encode(server_key)
    )
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(message);
    mac.finalize().into_bytes().into()
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
