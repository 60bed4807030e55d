use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::password::MAX_PASSWORD_BYTES;
use crate::db::User;
use crate::error::FieldErrors;
use crate::validation::{Checker, Validate, MISSING_FIELD};

pub const MAX_NAME_LEN: usize = 128;

pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^\S+$").expect("static regex");
    }
    USERNAME_RE.is_match(username)
}

fn check_password(c: &mut Checker, password: Option<&str>) {
    match password {
        None => c.add("password", MISSING_FIELD),
        Some("") => c.add("password", "Field may not be blank."),
        Some(p) if p.len() > MAX_PASSWORD_BYTES => c.add(
            "password",
            format!("Longer than maximum length {MAX_PASSWORD_BYTES}."),
        ),
        Some(_) => {}
    }
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub default_currency_id: Option<String>,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut c = Checker::new();
        c.name("username", self.username.as_deref(), MAX_NAME_LEN);
        if let Some(u) = self.username.as_deref() {
            if !u.trim().is_empty() && !is_valid_username(u) {
                c.add("username", "Username may not contain whitespace.");
            }
        }
        check_password(&mut c, self.password.as_deref());
        c.finish()
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut c = Checker::new();
        c.name("username", self.username.as_deref(), MAX_NAME_LEN);
        check_password(&mut c, self.password.as_deref());
        c.finish()
    }
}

/// Response returned after login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(is_valid_username("alice"));
        assert!(is_valid_username("a.b-c_d@x"));
        assert!(!is_valid_username("has space"));
        assert!(!is_valid_username(""));
    }

    #[test]
    fn overlong_username_reports_only_length() {
        let req = RegisterRequest {
            username: Some("x".repeat(MAX_NAME_LEN + 1)),
            password: Some("pw1".into()),
            default_currency_id: None,
        };
        let errors = req.validate().unwrap_err();
        assert_eq!(
            errors["username"],
            vec![format!("Longer than maximum length {MAX_NAME_LEN}.")]
        );
    }

    #[test]
    fn username_with_space_reports_whitespace() {
        let req = RegisterRequest {
            username: Some("has space".into()),
            password: Some("pw1".into()),
            default_currency_id: None,
        };
        let errors = req.validate().unwrap_err();
        assert_eq!(
            errors["username"],
            vec!["Username may not contain whitespace.".to_string()]
        );
    }

    #[test]
    fn register_requires_username_and_password() {
        let req: RegisterRequest = serde_json::from_str("{}").unwrap();
        let errors = req.validate().unwrap_err();
        assert_eq!(errors["username"], vec![MISSING_FIELD.to_string()]);
        assert_eq!(errors["password"], vec![MISSING_FIELD.to_string()]);
    }

    #[test]
    fn register_accepts_short_password() {
        let req: RegisterRequest =
            serde_json::from_str(r#"{"username":"alice","password":"pw1"}"#).unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn overlong_password_is_rejected() {
        let req = LoginRequest {
            username: Some("alice".into()),
            password: Some("p".repeat(MAX_PASSWORD_BYTES + 1)),
        };
        assert!(req.validate().unwrap_err().contains_key("password"));
    }

    #[test]
    fn auth_response_never_carries_password_hash() {
        let resp = AuthResponse {
            access_token: "t".into(),
            user: User {
                id: "1".into(),
                username: "alice".into(),
                password_hash: "$argon2id$secret".into(),
                default_currency_id: None,
            },
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("alice"));
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }
}
