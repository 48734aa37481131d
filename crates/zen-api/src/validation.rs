//! Boundary checks on request bodies plus the two domain rules the
//! handlers enforce: minimum age at registration and profile ownership.

use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

use zen_types::api::{
    CreateCommunityRequest, CreateReplyRequest, CreateTopicRequest, LoginRequest,
    RegisterRequest, SendMessageRequest, UpdateProfileRequest,
};

use crate::error::ApiError;
use crate::password::MAX_PASSWORD_BYTES;

pub const MIN_AGE: i32 = 16;
pub const MIN_PASSWORD_BYTES: usize = 8;

/// Implemented by every request body; run by [`crate::extract::ValidJson`].
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

/// Age in full years on `today`. A year only counts once the birth
/// month/day has been reached.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let years = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years - 1
    } else {
        years
    }
}

pub fn ensure_min_age(birth: NaiveDate, today: NaiveDate) -> Result<(), ApiError> {
    if birth > today {
        return Err(ApiError::validation("Data de nascimento inválida"));
    }
    if age_on(birth, today) < MIN_AGE {
        return Err(ApiError::validation(
            "Você deve ter pelo menos 16 anos para se registrar",
        ));
    }
    Ok(())
}

/// Only the owner may modify a profile.
pub fn ensure_owner(caller: Uuid, target: Uuid) -> Result<(), ApiError> {
    if caller != target {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

fn required(value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation("Todos os campos são obrigatórios"));
    }
    Ok(())
}

fn max_chars(value: &str, max: usize, field: &str) -> Result<(), ApiError> {
    if value.chars().count() > max {
        return Err(ApiError::validation(format!(
            "O campo {} deve ter no máximo {} caracteres",
            field, max
        )));
    }
    Ok(())
}

fn valid_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn valid_username(username: &str) -> bool {
    let username = username.trim();
    (3..=32).contains(&username.chars().count())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ApiError> {
        for field in [
            &self.first_name,
            &self.last_name,
            &self.email,
            &self.username,
            &self.password,
        ] {
            required(field)?;
        }
        max_chars(&self.first_name, 100, "nome")?;
        max_chars(&self.last_name, 100, "sobrenome")?;
        max_chars(&self.email, 254, "e-mail")?;

        if !valid_email(&self.email) {
            return Err(ApiError::validation("E-mail inválido"));
        }
        if !valid_username(&self.username) {
            return Err(ApiError::validation(
                "O nome de usuário deve ter de 3 a 32 caracteres (letras, números, '_' ou '.')",
            ));
        }
        if self.password.len() < MIN_PASSWORD_BYTES || self.password.len() > MAX_PASSWORD_BYTES {
            return Err(ApiError::validation(
                "A senha deve ter entre 8 e 72 bytes (letras acentuadas ocupam 2 bytes)",
            ));
        }
        Ok(())
    }
}

impl Validate for LoginRequest {
    // Blank input fails exactly like a wrong password.
    fn validate(&self) -> Result<(), ApiError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(ApiError::InvalidCredentials);
        }
        Ok(())
    }
}

impl Validate for UpdateProfileRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(bio) = &self.bio {
            max_chars(bio, 500, "bio")?;
        }
        if let Some(url) = &self.avatar_url {
            max_chars(url, 2048, "avatarUrl")?;
        }
        Ok(())
    }
}

impl Validate for SendMessageRequest {
    fn validate(&self) -> Result<(), ApiError> {
        required(&self.content)?;
        max_chars(&self.content, 2000, "conteúdo")
    }
}

impl Validate for CreateCommunityRequest {
    fn validate(&self) -> Result<(), ApiError> {
        required(&self.name)?;
        max_chars(&self.name, 100, "nome")?;
        if let Some(description) = &self.description {
            max_chars(description, 1000, "descrição")?;
        }
        Ok(())
    }
}

impl Validate for CreateTopicRequest {
    fn validate(&self) -> Result<(), ApiError> {
        required(&self.title)?;
        required(&self.content)?;
        max_chars(&self.title, 200, "título")?;
        max_chars(&self.content, 10_000, "conteúdo")
    }
}

impl Validate for CreateReplyRequest {
    fn validate(&self) -> Result<(), ApiError> {
        required(&self.content)?;
        max_chars(&self.content, 10_000, "conteúdo")
    }
}
