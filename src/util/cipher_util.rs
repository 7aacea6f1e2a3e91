use actix_web::cookie::Key;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256, Sha512};

use crate::models::User;

pub fn get_salt<const N: usize>() -> [u8; N] {
    let mut salt = [0u8; N];
    OsRng.fill_bytes(&mut salt);
    salt
}

fn salted_digest(password: &str, token: &str, salt: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(token);
    hasher.update(password);
    hasher.update(salt);
    hasher.finalize().into()
}

/// Returns `(salt, digest)`, both hex encoded.
pub fn gen_salted_password(password: &str, token: &str) -> (String, String) {
    let salt = get_salt::<32>();
    let digest = salted_digest(password, token, &salt);
    (hex::encode(salt), hex::encode(digest))
}

pub fn check_salted_password<'a>(
    user: &'a User,
    password_input: &str,
    token: &str,
) -> Option<&'a User> {
    let mut salt = [0u8; 32];
    hex::decode_to_slice(&user.salt, &mut salt).ok()?;

    let mut expected_hash = [0u8; 32];
    hex::decode_to_slice(&user.password, &mut expected_hash).ok()?;

    (salted_digest(password_input, token, &salt) == expected_hash).then_some(user)
}

pub fn gen_cookie_key(cookie_token: &str) -> Key {
    let mut hasher = Sha512::new();
    hasher.update(cookie_token);
    Key::from(hasher.finalize().as_slice())
}
