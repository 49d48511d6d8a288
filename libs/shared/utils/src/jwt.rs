use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use shared_models::auth::{JwtClaims, JwtHeader, User};

type HmacSha256 = Hmac<Sha256>;

/// Builds HS256 claims for `subject` that expire `ttl_hours` from now.
pub fn build_claims(subject: &str, email: Option<&str>, role: Option<&str>, ttl_hours: i64) -> JwtClaims {
    let now = Utc::now();
    let exp = now + Duration::hours(ttl_hours);

    JwtClaims {
        sub: subject.to_string(),
        exp: Some(exp.timestamp().max(0) as u64),
        email: email.map(str::to_string),
        role: role.map(str::to_string),
        aud: Some("authenticated".to_string()),
        iat: Some(now.timestamp().max(0) as u64),
    }
}

pub fn issue_token(claims: &JwtClaims, jwt_secret: &str) -> Result<String, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let header = JwtHeader {
        alg: "HS256".to_string(),
        typ: "JWT".to_string(),
    };
    let header = serde_json::to_string(&header)
        .map_err(|e| format!("Failed to encode header: {}", e))?;
    let payload = serde_json::to_string(claims)
        .map_err(|e| format!("Failed to encode claims: {}", e))?;

    let header_b64 = URL_SAFE_NO_PAD.encode(header);
    let claims_b64 = URL_SAFE_NO_PAD.encode(payload);
    let signing_input = format!("{}.{}", header_b64, claims_b64);

    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(signing_input.as_bytes());
    let signature_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", signing_input, signature_b64))
}

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<User, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let header: Option<JwtHeader> = URL_SAFE_NO_PAD
        .decode(header_b64)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok());
    match header {
        Some(header) if header.alg == "HS256" => {}
        Some(header) => {
            debug!("Rejecting token signed with {}", header.alg);
            return Err("Unsupported token algorithm".to_string());
        }
        None => return Err("Invalid token header".to_string()),
    }

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    let signature_string = format!("{}.{}", header_b64, claims_b64);

    let mut mac = match HmacSha256::new_from_slice(jwt_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return Err("Failed to create HMAC".to_string()),
    };

    mac.update(signature_string.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    let claims_json = match URL_SAFE_NO_PAD.decode(claims_b64) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    let claims: JwtClaims = match serde_json::from_str(&claims_json) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            return Err("Invalid claims format".to_string());
        }
    };

    if let Some(exp) = claims.exp {
        let now = Utc::now().timestamp().max(0) as u64;
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err("Token expired".to_string());
        }
    }

    let created_at = claims.iat
        .and_then(|timestamp| Utc.timestamp_opt(timestamp as i64, 0).single());

    let user = User {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
        created_at,
    };

    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn issued_token_validates_with_same_secret() {
        let claims = build_claims("doctor@clinic.com", Some("doctor@clinic.com"), Some("doctor"), 1);
        let token = issue_token(&claims, SECRET).unwrap();

        let user = validate_token(&token, SECRET).unwrap();
        assert_eq!(user.id, "doctor@clinic.com");
        assert_eq!(user.role.as_deref(), Some("doctor"));
        assert!(user.created_at.is_some());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = build_claims("someone", None, None, 1);
        let token = issue_token(&claims, SECRET).unwrap();

        assert_eq!(validate_token(&token, "other-secret").unwrap_err(), "Invalid token signature");
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = build_claims("someone", None, None, -2);
        let token = issue_token(&claims, SECRET).unwrap();

        assert_eq!(validate_token(&token, SECRET).unwrap_err(), "Token expired");
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert_eq!(validate_token("not-a-jwt", SECRET).unwrap_err(), "Invalid token format");
        assert!(issue_token(&build_claims("x", None, None, 1), "").is_err());
    }

    #[test]
    fn unsigned_algorithm_is_rejected() {
        let claims = build_claims("someone", None, None, 1);
        let token = issue_token(&claims, SECRET).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let none_header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        parts[0] = &none_header;

        assert_eq!(
            validate_token(&parts.join("."), SECRET).unwrap_err(),
            "Unsupported token algorithm"
        );
    }
}
