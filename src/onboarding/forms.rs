//! Client-side form validation for the onboarding screens.
//!
//! Forms hold raw text as typed by the user. `validate` either yields the
//! typed request body or a `ValidationError`; nothing here touches the
//! network.

use crate::api::{NewPet, ProfileUpdate};
use crate::error::ValidationError;

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_all(&[
            ("username", &self.username),
            ("email", &self.email),
            ("password", &self.password),
            ("confirm_password", &self.confirm_password),
        ])?;
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_all(&[("email", &self.email), ("password", &self.password)])
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub fullname: String,
    pub phone: String,
    pub address: String,
}

impl ProfileForm {
    /// All three fields are required; the body is sent trimmed.
    pub fn validate(&self) -> Result<ProfileUpdate, ValidationError> {
        require_all(&[
            ("fullname", &self.fullname),
            ("phone", &self.phone),
            ("address", &self.address),
        ])?;
        Ok(ProfileUpdate {
            fullname: self.fullname.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address: self.address.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PetForm {
    pub name: String,
    pub species: String,
    pub age: String,
    pub chip_number: String,
    pub weight: String,
}

impl PetForm {
    /// Checks fields in form order and reports the first bad one.
    pub fn validate(&self) -> Result<NewPet, ValidationError> {
        let name = required("name", &self.name)?;
        let species = required("species", &self.species)?;
        let age = parse_age(&self.age)?;
        let chip_number = required("chip_number", &self.chip_number)?;
        let weight = parse_weight(&self.weight)?;
        Ok(NewPet {
            name,
            species,
            age,
            chip_number,
            weight,
        })
    }
}

fn require_all(fields: &[(&'static str, &String)]) -> Result<(), ValidationError> {
    let missing: Vec<&'static str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::IncompleteFields { missing })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::InvalidField {
            field,
            reason: "required".to_string(),
        });
    }
    Ok(value.to_string())
}

fn parse_age(raw: &str) -> Result<u32, ValidationError> {
    let invalid = || ValidationError::InvalidField {
        field: "age",
        reason: "must be a positive whole number".to_string(),
    };
    match raw.trim().parse::<u32>() {
        Ok(age) if age > 0 => Ok(age),
        _ => Err(invalid()),
    }
}

fn parse_weight(raw: &str) -> Result<f64, ValidationError> {
    match raw.trim().parse::<f64>() {
        Ok(weight) if weight.is_finite() && weight > 0.0 => Ok(weight),
        _ => Err(ValidationError::InvalidField {
            field: "weight",
            reason: "must be a positive number".to_string(),
        }),
    }
}
