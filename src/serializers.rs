//! Transfer representation: turns submitted payloads into validated writes.
//!
//! Output is the entity structs themselves (their `Serialize` impls list every
//! wire field explicitly). Input goes through the serializers below, which check
//! every writable field and report all failures at once.

use serde_json::Value;

use crate::{
    error::{ApiError, FieldErrors, incorrect_pk_type, invalid_pk},
    models::{
        Field, MAX_NAME_LENGTH, NewStudent, NewUniversity, StudentChanges, StudentPayload,
        UniversityChanges, UniversityPayload,
    },
    nesting::StudentScope,
    repository::Repository,
};

pub const REQUIRED: &str = "This field is required.";
pub const NOT_NULL: &str = "This field may not be null.";
pub const NOT_BLANK: &str = "This field may not be blank.";
pub const NOT_A_STRING: &str = "Not a valid string.";
pub const NULL_CHARACTERS: &str = "Null characters are not allowed.";

pub fn too_long(max: usize) -> String {
    format!("Ensure this field has no more than {} characters.", max)
}

/// How much of the payload must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Create and PUT: every writable field is required.
    Full,
    /// PATCH: only supplied fields are validated and applied.
    Partial,
}

impl Mode {
    fn required(self) -> bool {
        self == Mode::Full
    }
}

/// Text form of a submitted value. Numbers are accepted in their JSON spelling.
fn as_text(value: Value) -> Result<String, &'static str> {
    match value {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        Value::Null => Err(NOT_NULL),
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => Err(NOT_A_STRING),
    }
}

/// Trims and bounds a text field.
fn char_field(
    errors: &mut FieldErrors,
    name: &'static str,
    value: Field<Value>,
    mode: Mode,
) -> Option<String> {
    let raw = match value {
        Field::Missing => {
            if mode.required() {
                errors.add(name, REQUIRED);
            }
            return None;
        }
        Field::Null => {
            errors.add(name, NOT_NULL);
            return None;
        }
        Field::Present(value) => match as_text(value) {
            Ok(raw) => raw,
            Err(message) => {
                errors.add(name, message);
                return None;
            }
        },
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        errors.add(name, NOT_BLANK);
        return None;
    }

    let mut valid = true;
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        errors.add(name, too_long(MAX_NAME_LENGTH));
        valid = false;
    }
    if trimmed.contains('\0') {
        errors.add(name, NULL_CHARACTERS);
        valid = false;
    }
    valid.then(|| trimmed.to_string())
}

/// Primary key named by a submitted reference. Integer strings are accepted.
fn primary_key(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(number) => match number.as_i64() {
            Some(id) => Ok(id),
            None if number.is_f64() => Err(incorrect_pk_type("float")),
            // Integers beyond i64 cannot name a stored row.
            None => Err(invalid_pk(number)),
        },
        Value::String(text) => text
            .trim()
            .parse()
            .map_err(|_| incorrect_pk_type("str")),
        Value::Bool(_) => Err(incorrect_pk_type("bool")),
        Value::Array(_) => Err(incorrect_pk_type("list")),
        Value::Object(_) => Err(incorrect_pk_type("dict")),
        Value::Null => Err(NOT_NULL.to_string()),
    }
}

/// UniversitySerializer
pub struct UniversitySerializer;

impl UniversitySerializer {
    fn validate(payload: UniversityPayload, mode: Mode) -> (FieldErrors, UniversityChanges) {
        let mut errors = FieldErrors::new();
        let name = char_field(&mut errors, "name", payload.name, mode);
        (errors, UniversityChanges { name })
    }

    /// Validates a create or PUT body.
    pub fn validate_full(payload: UniversityPayload) -> Result<NewUniversity, ApiError> {
        match Self::validate(payload, Mode::Full) {
            (_, UniversityChanges { name: Some(name) }) => Ok(NewUniversity { name }),
            (errors, _) => Err(ApiError::Validation(errors)),
        }
    }

    /// Validates a PATCH body.
    pub fn validate_partial(payload: UniversityPayload) -> Result<UniversityChanges, ApiError> {
        let (errors, changes) = Self::validate(payload, Mode::Partial);
        errors.into_result()?;
        Ok(changes)
    }
}

/// StudentSerializer
///
/// Bound to the request's `StudentScope`. Under a university scope the
/// `university` attribute comes from the scope and the body value is dropped.
pub struct StudentSerializer {
    scope: StudentScope,
}

impl StudentSerializer {
    pub fn new(scope: StudentScope) -> Self {
        Self { scope }
    }

    /// Resolves the submitted `university` reference. A scoped parent that has
    /// disappeared since the route layer resolved it is a 404.
    async fn university(
        &self,
        errors: &mut FieldErrors,
        value: Field<Value>,
        mode: Mode,
        repo: &dyn Repository,
    ) -> Result<Option<i64>, ApiError> {
        if let Some(parent) = self.scope.university() {
            return match repo.get_university(parent).await? {
                Some(found) => Ok(Some(found.id)),
                None => Err(ApiError::NotFound),
            };
        }

        let id = match value {
            Field::Missing => {
                if mode.required() {
                    errors.add("university", REQUIRED);
                }
                return Ok(None);
            }
            Field::Null => {
                errors.add("university", NOT_NULL);
                return Ok(None);
            }
            Field::Present(value) => match primary_key(&value) {
                Ok(id) => id,
                Err(message) => {
                    errors.add("university", message);
                    return Ok(None);
                }
            },
        };

        match repo.get_university(id).await? {
            Some(found) => Ok(Some(found.id)),
            None => {
                errors.add("university", invalid_pk(id));
                Ok(None)
            }
        }
    }

    async fn validate(
        &self,
        payload: StudentPayload,
        mode: Mode,
        repo: &dyn Repository,
    ) -> Result<(FieldErrors, StudentChanges), ApiError> {
        let mut errors = FieldErrors::new();

        let university = self
            .university(&mut errors, payload.university, mode, repo)
            .await?;
        let first_name = char_field(&mut errors, "first_name", payload.first_name, mode);
        let last_name = char_field(&mut errors, "last_name", payload.last_name, mode);

        Ok((
            errors,
            StudentChanges {
                university,
                first_name,
                last_name,
            },
        ))
    }

    /// Validates a create or PUT body.
    pub async fn validate_full(
        &self,
        payload: StudentPayload,
        repo: &dyn Repository,
    ) -> Result<NewStudent, ApiError> {
        match self.validate(payload, Mode::Full, repo).await? {
            (
                _,
                StudentChanges {
                    university: Some(university),
                    first_name: Some(first_name),
                    last_name: Some(last_name),
                },
            ) => Ok(NewStudent {
                university,
                first_name,
                last_name,
            }),
            (errors, _) => Err(ApiError::Validation(errors)),
        }
    }

    /// Validates a PATCH body.
    pub async fn validate_partial(
        &self,
        payload: StudentPayload,
        repo: &dyn Repository,
    ) -> Result<StudentChanges, ApiError> {
        let (errors, changes) = self.validate(payload, Mode::Partial, repo).await?;
        errors.into_result()?;
        Ok(changes)
    }
}
