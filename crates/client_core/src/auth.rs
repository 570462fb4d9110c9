use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use shared::domain::UserId;

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// Reads the `sub` claim of a bearer token without checking its signature.
/// The backend stays the authority on whether the token is valid.
pub fn token_subject(token: &str) -> Option<UserId> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
    let sub = data.claims.sub.trim();
    (!sub.is_empty()).then(|| UserId::new(sub))
}

/// First characters of a token, for log lines.
pub fn token_hint(token: &str) -> String {
    let prefix: String = token.chars().take(8).collect();
    format!("{prefix}…")
}
