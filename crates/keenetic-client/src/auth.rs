//! Keenetic challenge/response authentication.
//!
//! `GET /auth` answers 401 with a realm and a one-time challenge. The client
//! proves the password with
//! `sha256_hex(challenge + md5_hex("login:realm:password"))` and the router
//! sets a session cookie.

use md5::{Digest as _, Md5};
use sha2::Sha256;

pub const REALM_HEADER: &str = "X-NDM-Realm";
pub const CHALLENGE_HEADER: &str = "X-NDM-Challenge";

/// Password proof sent in the `POST /auth` body.
pub fn password_hash(login: &str, password: &str, realm: &str, challenge: &str) -> String {
    let credentials = Md5::digest(format!("{}:{}:{}", login, realm, password).as_bytes());

    let mut proof = Sha256::new();
    proof.update(challenge.as_bytes());
    proof.update(hex::encode(credentials).as_bytes());
    hex::encode(proof.finalize())
}
