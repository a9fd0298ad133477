use chrono::Utc;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;

/// Values browsers and careless serializers leave behind in place of a real token
const SENTINEL_TOKENS: [&str; 2] = ["undefined", "null"];

/// Bearer-style credential read from session storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    token_type: String,
}

#[derive(Debug, Deserialize)]
struct ExpiryClaim {
    exp: Option<i64>,
}

impl Credential {
    /// Returns `None` for tokens that must not be sent
    pub fn parse(token: &str, token_type: Option<&str>) -> Option<Self> {
        if !is_usable(token) {
            return None;
        }
        let token_type = match token_type.map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => "Bearer".to_string(),
        };
        Some(Self { token: token.trim().to_string(), token_type })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Value for the `Authorization` header. The scheme is normalized to `Bearer`
    /// whatever case the server used in `token_type`.
    pub fn authorization_header(&self) -> String {
        if self.token_type.eq_ignore_ascii_case("bearer") {
            format!("Bearer {}", self.token)
        } else {
            format!("{} {}", self.token_type, self.token)
        }
    }
}

/// A token is usable when it is present, not a sentinel, and not an expired JWT.
/// Tokens that do not parse as JWTs are treated as opaque and accepted.
pub fn is_usable(token: &str) -> bool {
    let token = token.trim();
    if token.is_empty() || SENTINEL_TOKENS.contains(&token) {
        return false;
    }
    match jwt_expiry(token) {
        Some(exp) => exp > Utc::now().timestamp(),
        None => true,
    }
}

/// Read the `exp` claim without verifying the signature; the server does that.
fn jwt_expiry(token: &str) -> Option<i64> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<ExpiryClaim>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()
        .and_then(|data| data.claims.exp)
}
