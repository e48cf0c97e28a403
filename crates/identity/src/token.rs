use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct FederatedTokenConfig {
    pub issuer: String,
    pub secret: String,
    pub ttl_seconds: i64,
}

impl Default for FederatedTokenConfig {
    fn default() -> Self {
        Self {
            issuer: "splitease-dev-idp".into(),
            secret: "devsecret".into(),
            ttl_seconds: 3600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederatedClaims {
    pub iss: String,
    pub sub: String,
    pub email: String,
    pub email_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

pub fn mint_federated_token(
    cfg: &FederatedTokenConfig,
    subject: &str,
    email: &str,
    display_name: Option<&str>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let exp = now + Duration::seconds(cfg.ttl_seconds);
    let claims = FederatedClaims {
        iss: cfg.issuer.clone(),
        sub: subject.to_string(),
        email: email.to_string(),
        email_verified: true,
        name: display_name.map(str::to_string),
        picture: None,
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.secret.as_bytes()),
    )
}

pub fn verify_federated_token(
    cfg: &FederatedTokenConfig,
    token: &str,
) -> Result<FederatedClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[cfg.issuer.as_str()]);
    let data = decode::<FederatedClaims>(
        token,
        &DecodingKey::from_secret(cfg.secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}
