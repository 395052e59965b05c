//! Authentication service.
//!
//! Username/password signup and login. Passwords are hashed with Argon2id.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use robo_shop_core::{Email, Role, Username};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Passwords rejected outright, compared case-insensitively.
const COMMON_PASSWORDS: &[&str] = &[
    "password",
    "password1",
    "password123",
    "12345678",
    "123456789",
    "1234567890",
    "qwertyuiop",
    "qwerty123",
    "azertyuiop",
    "iloveyou",
    "sunshine",
    "princess",
    "football",
    "baseball",
    "welcome1",
    "admin123",
    "letmein1",
    "trustno1",
    "11111111",
    "00000000",
];

const REQUIRED: &str = "This field is required.";

/// Raw signup form fields as submitted.
#[derive(Debug, Clone, Default)]
pub struct SignupInput {
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
    pub role: String,
}

/// Per-field validation messages for the signup form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupErrors {
    pub username: Vec<String>,
    pub email: Vec<String>,
    pub password1: Vec<String>,
    pub password2: Vec<String>,
    pub role: Vec<String>,
}

impl SignupErrors {
    /// Whether no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username.is_empty()
            && self.email.is_empty()
            && self.password1.is_empty()
            && self.password2.is_empty()
            && self.role.is_empty()
    }
}

/// A signup form that passed validation.
#[derive(Debug, Clone)]
pub struct ValidSignup {
    pub username: Username,
    pub email: Email,
    pub password: String,
    pub role: Role,
}

/// Validate the signup form.
///
/// # Errors
///
/// Returns every failing field's messages at once, so the form can show
/// them all on re-render.
pub fn validate_signup(input: &SignupInput) -> Result<ValidSignup, SignupErrors> {
    let mut errors = SignupErrors::default();

    let username = if input.username.trim().is_empty() {
        errors.username.push(REQUIRED.to_string());
        None
    } else {
        Username::parse(&input.username)
            .map_err(|e| errors.username.push(e.to_string()))
            .ok()
    };

    let email = if input.email.trim().is_empty() {
        errors.email.push(REQUIRED.to_string());
        None
    } else {
        Email::parse(&input.email)
            .map_err(|_| errors.email.push("Enter a valid email address.".to_string()))
            .ok()
    };

    let role = if input.role.trim().is_empty() {
        errors.role.push(REQUIRED.to_string());
        None
    } else {
        input
            .role
            .parse::<Role>()
            .map_err(|_| {
                errors.role.push(format!(
                    "Select a valid choice. {} is not one of the available choices.",
                    input.role.trim()
                ));
            })
            .ok()
    };

    if input.password1.is_empty() {
        errors.password1.push(REQUIRED.to_string());
    }
    if input.password2.is_empty() {
        errors.password2.push(REQUIRED.to_string());
    } else if !input.password1.is_empty() && input.password1 != input.password2 {
        errors
            .password2
            .push("The two password fields didn't match.".to_string());
    } else if !input.password1.is_empty() {
        errors
            .password2
            .extend(password_problems(&input.password1, username.as_ref(), email.as_ref()));
    }

    match (username, email, role) {
        (Some(username), Some(email), Some(role)) if errors.is_empty() => Ok(ValidSignup {
            username,
            email,
            password: input.password1.clone(),
            role,
        }),
        _ => Err(errors),
    }
}

/// Strength problems with a password, empty when acceptable.
#[must_use]
pub fn password_problems(
    password: &str,
    username: Option<&Username>,
    email: Option<&Email>,
) -> Vec<String> {
    let mut problems = Vec::new();
    let lower = password.to_lowercase();

    let similar_to = |attribute: &str| {
        let attribute = attribute.to_lowercase();
        attribute.len() >= 3 && (lower.contains(&attribute) || attribute.contains(&lower))
    };
    if let Some(username) = username
        && similar_to(username.as_str())
    {
        problems.push("The password is too similar to the username.".to_string());
    } else if let Some(email) = email
        && email
            .as_str()
            .split_once('@')
            .is_some_and(|(local, _)| similar_to(local))
    {
        problems.push("The password is too similar to the email address.".to_string());
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        problems.push(format!(
            "This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
        ));
    }

    if COMMON_PASSWORDS.contains(&lower.as_str()) {
        problems.push("This password is too common.".to_string());
    }

    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }

    problems
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user. Sellers get their seller profile in the same
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Invalid` with per-field messages if the form is
    /// invalid or the username is taken.
    pub async fn signup(&self, input: &SignupInput) -> Result<User, AuthError> {
        let signup = validate_signup(input).map_err(AuthError::Invalid)?;

        let password_hash = hash_password(&signup.password)?;

        self.users
            .create_with_password(&signup.username, &signup.email, &password_hash, signup.role)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::Invalid(SignupErrors {
                    username: vec!["A user with that username already exists.".to_string()],
                    ..SignupErrors::default()
                }),
                other => AuthError::Repository(other),
            })
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(username: &str, password1: &str, password2: &str, role: &str) -> SignupInput {
        SignupInput {
            username: username.to_string(),
            email: "buyer@example.dz".to_string(),
            password1: password1.to_string(),
            password2: password2.to_string(),
            role: role.to_string(),
        }
    }

    #[test]
    fn test_valid_signup() {
        let valid = validate_signup(&input("karim", "Tr0ub4dor&3x", "Tr0ub4dor&3x", "seller")).unwrap();
        assert_eq!(valid.username.as_str(), "karim");
        assert_eq!(valid.role, Role::Seller);
    }

    #[test]
    fn test_password_mismatch() {
        let errors = validate_signup(&input("karim", "Tr0ub4dor&3x", "Tr0ub4dor&3y", "buyer")).unwrap_err();
        assert_eq!(errors.password2, vec!["The two password fields didn't match.".to_string()]);
    }

    #[test]
    fn test_short_numeric_password() {
        let errors = validate_signup(&input("karim", "1234567", "1234567", "buyer")).unwrap_err();
        assert!(errors.password2.iter().any(|m| m.contains("too short")));
        assert!(errors.password2.iter().any(|m| m.contains("entirely numeric")));
    }

    #[test]
    fn test_password_similar_to_username() {
        let errors =
            validate_signup(&input("robotics", "robotics99", "robotics99", "buyer")).unwrap_err();
        assert!(errors.password2.iter().any(|m| m.contains("similar to the username")));
    }

    #[test]
    fn test_common_password() {
        let problems = password_problems("Password123", None, None);
        assert_eq!(problems, vec!["This password is too common.".to_string()]);
    }

    #[test]
    fn test_invalid_role_and_username() {
        let errors = validate_signup(&input("bad name", "Tr0ub4dor&3x", "Tr0ub4dor&3x", "admin")).unwrap_err();
        assert_eq!(errors.username.len(), 1);
        assert_eq!(errors.role.len(), 1);
        assert!(errors.password2.is_empty());
    }

    #[test]
    fn test_required_fields() {
        let errors = validate_signup(&SignupInput::default()).unwrap_err();
        for field in [
            &errors.username,
            &errors.email,
            &errors.password1,
            &errors.password2,
            &errors.role,
        ] {
            assert_eq!(field, &vec![REQUIRED.to_string()]);
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Tr0ub4dor&3x").unwrap();
        assert!(verify_password("Tr0ub4dor&3x", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong-password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
