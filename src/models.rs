use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

/// Upper bound on every text attribute, in characters.
pub const MAX_NAME_LENGTH: usize = 50;

// --- Persisted Entities (Wire Representations) ---

/// University
///
/// A record of the `universities` table. Owns its students: deleting a
/// university removes every student that references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct University {
    #[ts(type = "number")]
    pub id: i64,
    #[schema(example = "Aristotle University of Thessaloniki", max_length = 50)]
    pub name: String,
}

/// Student
///
/// A record of the `students` table. `university` is the id of the owning
/// university; `created_at` is assigned once at insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Student {
    #[ts(type = "number")]
    pub id: i64,

    /// Stored as the `university_id` foreign key column.
    #[sqlx(rename = "university_id")]
    #[ts(type = "number")]
    pub university: i64,

    #[schema(max_length = 50)]
    pub first_name: String,
    #[schema(max_length = 50)]
    pub last_name: String,

    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// Field
///
/// A writable body attribute as submitted: absent, explicitly `null`, or
/// carrying a value. Absent and `null` fail validation differently.
///
/// Payloads hold raw JSON values so that a value of the wrong type is reported
/// against its own field by the serializers instead of failing the whole body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Missing,
    Null,
    Present(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Missing
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Field::Present(value)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Only reached when the key is present; absent keys take `Default`.
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Field::Present(value),
            None => Field::Null,
        })
    }
}

/// UniversityPayload
///
/// Body of POST/PUT/PATCH on `/universities/`. `id` and unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UniversityPayload {
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "University of Macedonia")]
    pub name: Field<Value>,
}

/// StudentPayload
///
/// Body of POST/PUT/PATCH on the student collections. On nested routes the
/// `university` value here is discarded in favour of the path.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct StudentPayload {
    #[serde(default)]
    #[schema(value_type = Option<i64>, example = 1)]
    pub university: Field<Value>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "Eleni")]
    pub first_name: Field<Value>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "Papadopoulou")]
    pub last_name: Field<Value>,
}

// --- Validated Writes (Repository Inputs) ---

/// NewUniversity
///
/// Validated attributes for inserting or fully replacing a university.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUniversity {
    pub name: String,
}

/// UniversityChanges
///
/// Validated partial update: `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniversityChanges {
    pub name: Option<String>,
}

impl From<NewUniversity> for UniversityChanges {
    fn from(new: NewUniversity) -> Self {
        Self {
            name: Some(new.name),
        }
    }
}

/// NewStudent
///
/// Validated attributes for inserting or fully replacing a student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub university: i64,
    pub first_name: String,
    pub last_name: String,
}

/// StudentChanges
///
/// Validated partial update. `created_at` is never part of a change set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentChanges {
    pub university: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl From<NewStudent> for StudentChanges {
    fn from(new: NewStudent) -> Self {
        Self {
            university: Some(new.university),
            first_name: Some(new.first_name),
            last_name: Some(new.last_name),
        }
    }
}
