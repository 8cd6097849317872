use std::time::{SystemTime, UNIX_EPOCH};

use crate::{model::user::User, models::Claims};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or_default()
}

pub fn generate_access_token(user: &User, secret: &str, ttl: usize) -> Result<String, Error> {
    let claims = Claims {
        user_id: user.id,
        sub: user.email.clone(),
        role: user.role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;

    fn manager() -> User {
        User {
            id: 5,
            name: "Boss".into(),
            email: "boss@company.com".into(),
            role: Role::Manager,
            employee_code: "EMP001".into(),
            department: "Ops".into(),
            password_hash: String::new(),
        }
    }

    #[test]
    fn token_round_trips_identity() {
        let token = generate_access_token(&manager(), "secret", 60).unwrap();

        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.user_id, 5);
        assert_eq!(claims.sub, "boss@company.com");
        assert_eq!(claims.role, Role::Manager);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = generate_access_token(&manager(), "secret", 60).unwrap();

        assert!(verify_token(&token, "other").is_err());
    }
}
