use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::errors::JwtError;

/// JWT token handler for issuing and verifying session tokens.
///
/// Uses HS256 (HMAC with SHA-256). The secret is fixed at construction;
/// replacing it invalidates every outstanding token.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validation: Validation,
}

impl JwtHandler {
    /// Create a new JWT handler with a secret key.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens (should be stored securely)
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: &[u8]) -> Self {
        let algorithm = Algorithm::HS256;

        // Expiry is checked against a single clock reading in `verify_at`.
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
            validation,
        }
    }

    /// Issue a signed token for `subject`, valid for `ttl` from now.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue(&self, subject: impl ToString, ttl: Duration) -> Result<String, JwtError> {
        let claims = Claims::new(subject, Utc::now().timestamp(), ttl);
        self.encode(&claims)
    }

    /// Encode claims into a JWT token.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode(&self, claims: &Claims) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Verify a token against the current time.
    ///
    /// # Errors
    /// * `Malformed` - Token is not a decodable JWT or lacks required claims
    /// * `InvalidSignature` - Token was not signed with this handler's secret
    /// * `TokenExpired` - Token expiry is in the past
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify a token against the Unix timestamp `now`.
    ///
    /// Signature and structure are checked first, then expiry against `now`.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, JwtError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(JwtError::from_decode)?;

        if token_data.claims.is_expired(now) {
            return Err(JwtError::TokenExpired);
        }

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"my_secret_key_at_least_32_bytes_long!";

    #[test]
    fn test_issue_and_verify() {
        let handler = JwtHandler::new(SECRET);

        let token = handler
            .issue("user123", Duration::hours(1))
            .expect("Failed to issue token");
        assert!(!token.is_empty());

        let claims = handler.verify(&token).expect("Failed to verify token");
        assert_eq!(claims.subject(), "user123");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_verify_expired_token() {
        let handler = JwtHandler::new(SECRET);

        let claims = Claims::new("user123", 1_000, Duration::seconds(60));
        let token = handler.encode(&claims).expect("Failed to encode token");

        assert!(handler.verify_at(&token, 1_060).is_ok());
        assert_eq!(
            handler.verify_at(&token, 1_061),
            Err(JwtError::TokenExpired)
        );
        assert_eq!(handler.verify(&token), Err(JwtError::TokenExpired));
    }

    #[test]
    fn test_verify_malformed_token() {
        let handler = JwtHandler::new(SECRET);

        let result = handler.verify("invalid.token.here");
        assert!(matches!(result, Err(JwtError::Malformed(_))));

        let result = handler.verify("");
        assert!(matches!(result, Err(JwtError::Malformed(_))));
    }

    #[test]
    fn test_verify_with_wrong_secret() {
        let handler1 = JwtHandler::new(b"secret1_at_least_32_bytes_long_key!");
        let handler2 = JwtHandler::new(b"secret2_at_least_32_bytes_long_key!");

        let token = handler1
            .issue("user123", Duration::hours(1))
            .expect("Failed to issue token");

        assert_eq!(handler2.verify(&token), Err(JwtError::InvalidSignature));
    }

    #[test]
    fn test_signature_checked_before_expiry() {
        let handler1 = JwtHandler::new(b"secret1_at_least_32_bytes_long_key!");
        let handler2 = JwtHandler::new(b"secret2_at_least_32_bytes_long_key!");

        let claims = Claims::new("user123", 1_000, Duration::seconds(60));
        let token = handler1.encode(&claims).expect("Failed to encode token");

        assert_eq!(
            handler2.verify_at(&token, 5_000),
            Err(JwtError::InvalidSignature)
        );
    }

    #[test]
    fn test_verify_tampered_payload() {
        let handler = JwtHandler::new(SECRET);
        let genuine = handler
            .issue("user123", Duration::hours(1))
            .expect("Failed to issue token");
        let forged = handler
            .encode(&Claims::new("admin", 1_000, Duration::hours(1)))
            .expect("Failed to encode token");

        // Graft the forged payload onto the genuine signature.
        let genuine_parts: Vec<&str> = genuine.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let spliced = format!(
            "{}.{}.{}",
            genuine_parts[0], forged_parts[1], genuine_parts[2]
        );

        assert_eq!(handler.verify(&spliced), Err(JwtError::InvalidSignature));
    }
}
