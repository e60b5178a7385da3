//! PKCE and state helpers.
//!
//! <https://datatracker.ietf.org/doc/html/rfc7636#section-4.1>

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::{CryptoRng, RngCore, rngs::ThreadRng};
use sha2::{Digest, Sha256};
use smol_str::SmolStr;

/// Fresh code verifier: 32 random bytes, base64url without padding.
pub fn generate_verifier() -> SmolStr {
    URL_SAFE_NO_PAD
        .encode(get_random_values::<_, 32>(&mut ThreadRng::default()))
        .into()
}

/// `base64url_nopad(sha256(verifier))`
pub fn code_challenge(verifier: &str) -> SmolStr {
    URL_SAFE_NO_PAD
        .encode(Sha256::digest(verifier.as_bytes()))
        .into()
}

/// Returns `(challenge, verifier)`.
pub fn generate_pkce() -> (SmolStr, SmolStr) {
    let verifier = generate_verifier();
    (code_challenge(&verifier), verifier)
}

/// Opaque value for the `state` parameter.
pub fn generate_state() -> SmolStr {
    URL_SAFE_NO_PAD
        .encode(get_random_values::<_, 16>(&mut ThreadRng::default()))
        .into()
}

pub fn get_random_values<R, const LEN: usize>(rng: &mut R) -> [u8; LEN]
where
    R: RngCore + CryptoRng,
{
    let mut bytes = [0u8; LEN];
    rng.fill_bytes(&mut bytes);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc7636_appendix_b() {
        assert_eq!(
            code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn verifier_shape() {
        let verifier = generate_verifier();
        assert_eq!(verifier.len(), 43);
        assert!(
            verifier
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        );
        assert_ne!(verifier, generate_verifier());
    }

    #[test]
    fn pair_is_consistent() {
        let (challenge, verifier) = generate_pkce();
        assert_eq!(challenge, code_challenge(&verifier));
        assert_eq!(challenge.len(), 43);
    }

    #[test]
    fn state_is_random() {
        assert_eq!(generate_state().len(), 22);
        assert_ne!(generate_state(), generate_state());
    }
}
