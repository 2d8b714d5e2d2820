use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// The lower-case hex HMAC-SHA512 of `data`, keyed with `secret`. This is how Paystack signs webhook bodies.
pub fn calculate_hmac(secret: &str, data: &[u8]) -> String {
    // HMAC accepts keys of any length, so this never fails
    let mut mac = match HmacSha512::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return String::default(),
    };
    mac.update(data);
    hex::encode(mac.finalize().into_bytes())
}

/// Checks a hex signature over the exact bytes of a request body. The comparison is constant-time.
pub fn verify_signature(secret: &str, data: &[u8], signature: &str) -> bool {
    if secret.is_empty() {
        warn!("🔐️ No webhook secret is configured. Refusing to accept any signature.");
        return false;
    }
    let Ok(expected) = hex::decode(signature.trim()) else {
        debug!("🔐️ Signature is not valid hex");
        return false;
    };
    let Ok(mut mac) = HmacSha512::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(data);
    mac.verify_slice(&expected).is_ok()
}
