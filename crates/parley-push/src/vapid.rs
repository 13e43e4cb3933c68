use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Url;
use serde::Serialize;

use crate::error::PushError;

/// VAPID token lifetime. Push services cap this at 24 hours.
const TOKEN_TTL_HOURS: i64 = 12;

#[derive(Serialize)]
struct VapidClaims {
    aud: String,
    exp: usize,
    sub: String,
}

/// VAPID key pair plus contact subject. Built once at startup; absence of
/// the keys disables push entirely rather than erroring.
pub struct VapidConfig {
    /// Base64url public key, served verbatim to subscribing clients and
    /// echoed in the `k=` parameter of the Authorization header.
    pub public_key: String,
    signing_key: EncodingKey,
    subject: String,
}

impl VapidConfig {
    /// `private_key_pem` is the PKCS#8 PEM encoding of the VAPID P-256
    /// private key; `subject` is a `mailto:` or `https:` contact URI.
    pub fn new(
        public_key: String,
        private_key_pem: &str,
        subject: String,
    ) -> Result<Self, PushError> {
        let signing_key = EncodingKey::from_ec_pem(private_key_pem.as_bytes())?;
        Ok(Self {
            public_key,
            signing_key,
            subject,
        })
    }

    /// `Authorization: vapid t=<jwt>, k=<public key>` for a given endpoint.
    pub fn authorization(&self, endpoint: &Url) -> Result<String, PushError> {
        let claims = VapidClaims {
            aud: vapid_audience(endpoint),
            exp: (chrono::Utc::now() + chrono::Duration::hours(TOKEN_TTL_HOURS)).timestamp()
                as usize,
            sub: self.subject.clone(),
        };

        let token = encode(&Header::new(Algorithm::ES256), &claims, &self.signing_key)?;
        Ok(format!("vapid t={}, k={}", token, self.public_key))
    }
}

/// The VAPID audience is the origin of the push endpoint, not the full URL.
fn vapid_audience(endpoint: &Url) -> String {
    endpoint.origin().ascii_serialization()
}

#[cfg(test)]
mod tests {
    use super::vapid_audience;
    use reqwest::Url;

    #[test]
    fn audience_is_endpoint_origin() {
        let url = Url::parse("https://fcm.googleapis.com/fcm/send/abc123").unwrap();
        assert_eq!(vapid_audience(&url), "https://fcm.googleapis.com");
    }

    #[test]
    fn audience_keeps_non_default_port() {
        let url = Url::parse("https://push.example.org:8443/ep/1").unwrap();
        assert_eq!(vapid_audience(&url), "https://push.example.org:8443");
    }
}
