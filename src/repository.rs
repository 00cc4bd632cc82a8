use crate::models::{
    NewStudent, NewUniversity, Student, StudentChanges, University, UniversityChanges,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;

/// RepositoryError
///
/// Failures a write or read against the store can surface.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// A student write referenced a university that does not exist.
    #[error("university {0} does not exist")]
    UnknownUniversity(i64),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// Persistence contract for universities and students. Every write is atomic:
/// it either fully applies or leaves the store untouched.
///
/// Student operations take an optional `university` scope. `Some(id)` restricts
/// the operation to students of that university; `None` sees every student.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Universities ---
    async fn list_universities(&self) -> RepositoryResult<Vec<University>>;
    async fn get_university(&self, id: i64) -> RepositoryResult<Option<University>>;
    async fn create_university(&self, new: NewUniversity) -> RepositoryResult<University>;
    // Returns None when the university does not exist.
    async fn update_university(
        &self,
        id: i64,
        changes: UniversityChanges,
    ) -> RepositoryResult<Option<University>>;
    // Cascades to the university's students. Returns false when nothing was deleted.
    async fn delete_university(&self, id: i64) -> RepositoryResult<bool>;

    // --- Students ---
    async fn list_students(&self, university: Option<i64>) -> RepositoryResult<Vec<Student>>;
    async fn get_student(
        &self,
        id: i64,
        university: Option<i64>,
    ) -> RepositoryResult<Option<Student>>;
    async fn create_student(&self, new: NewStudent) -> RepositoryResult<Student>;
    async fn update_student(
        &self,
        id: i64,
        university: Option<i64>,
        changes: StudentChanges,
    ) -> RepositoryResult<Option<Student>>;
    async fn delete_student(&self, id: i64, university: Option<i64>) -> RepositoryResult<bool>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const STUDENT_COLUMNS: &str = "id, university_id, first_name, last_name, created_at";

/// Tables backing the two resources. `ON DELETE CASCADE` carries the ownership rule.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS universities (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(50) NOT NULL
);
CREATE TABLE IF NOT EXISTS students (
    id BIGSERIAL PRIMARY KEY,
    university_id BIGINT NOT NULL REFERENCES universities (id) ON DELETE CASCADE,
    first_name VARCHAR(50) NOT NULL,
    last_name VARCHAR(50) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE INDEX IF NOT EXISTS students_university_id_idx ON students (university_id);
"#;

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// ensure_schema
    ///
    /// Creates the tables if they are missing. Used for local development only;
    /// deployed databases are provisioned out of band.
    pub async fn ensure_schema(&self) -> RepositoryResult<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

/// Maps a foreign key violation on `students.university_id` to `UnknownUniversity`.
fn reference_error(err: sqlx::Error, university: i64) -> RepositoryError {
    match err.as_database_error() {
        Some(db) if db.is_foreign_key_violation() => RepositoryError::UnknownUniversity(university),
        _ => RepositoryError::Database(err),
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_universities(&self) -> RepositoryResult<Vec<University>> {
        let universities =
            sqlx::query_as::<_, University>("SELECT id, name FROM universities ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(universities)
    }

    async fn get_university(&self, id: i64) -> RepositoryResult<Option<University>> {
        let university =
            sqlx::query_as::<_, University>("SELECT id, name FROM universities WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(university)
    }

    async fn create_university(&self, new: NewUniversity) -> RepositoryResult<University> {
        let university = sqlx::query_as::<_, University>(
            "INSERT INTO universities (name) VALUES ($1) RETURNING id, name",
        )
        .bind(new.name)
        .fetch_one(&self.pool)
        .await?;
        Ok(university)
    }

    /// update_university
    ///
    /// Uses `COALESCE` so that a `None` in `changes` keeps the stored column.
    async fn update_university(
        &self,
        id: i64,
        changes: UniversityChanges,
    ) -> RepositoryResult<Option<University>> {
        let university = sqlx::query_as::<_, University>(
            "UPDATE universities SET name = COALESCE($2, name) WHERE id = $1 RETURNING id, name",
        )
        .bind(id)
        .bind(changes.name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(university)
    }

    async fn delete_university(&self, id: i64) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM universities WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// list_students
    ///
    /// The query-by-parent operation when `university` is set.
    async fn list_students(&self, university: Option<i64>) -> RepositoryResult<Vec<Student>> {
        let query = format!(
            "SELECT {STUDENT_COLUMNS} FROM students \
             WHERE ($1::BIGINT IS NULL OR university_id = $1) ORDER BY id"
        );
        let students = sqlx::query_as::<_, Student>(&query)
            .bind(university)
            .fetch_all(&self.pool)
            .await?;
        Ok(students)
    }

    async fn get_student(
        &self,
        id: i64,
        university: Option<i64>,
    ) -> RepositoryResult<Option<Student>> {
        let query = format!(
            "SELECT {STUDENT_COLUMNS} FROM students \
             WHERE id = $1 AND ($2::BIGINT IS NULL OR university_id = $2)"
        );
        let student = sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .bind(university)
            .fetch_optional(&self.pool)
            .await?;
        Ok(student)
    }

    /// create_student
    ///
    /// `created_at` is filled by the column default; the foreign key rejects
    /// references to missing universities.
    async fn create_student(&self, new: NewStudent) -> RepositoryResult<Student> {
        let query = format!(
            "INSERT INTO students (university_id, first_name, last_name) \
             VALUES ($1, $2, $3) RETURNING {STUDENT_COLUMNS}"
        );
        sqlx::query_as::<_, Student>(&query)
            .bind(new.university)
            .bind(new.first_name)
            .bind(new.last_name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| reference_error(e, new.university))
    }

    /// update_student
    ///
    /// Runs in a transaction: the target row is locked, the new university (if
    /// any) is checked, then the row is rewritten. `created_at` is never touched.
    async fn update_student(
        &self,
        id: i64,
        university: Option<i64>,
        changes: StudentChanges,
    ) -> RepositoryResult<Option<Student>> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM students \
             WHERE id = $1 AND ($2::BIGINT IS NULL OR university_id = $2) FOR UPDATE",
        )
        .bind(id)
        .bind(university)
        .fetch_optional(&mut *tx)
        .await?;

        if locked.is_none() {
            return Ok(None);
        }

        if let Some(target) = changes.university {
            let exists = sqlx::query_scalar::<_, i64>(
                "SELECT id FROM universities WHERE id = $1 FOR SHARE",
            )
            .bind(target)
            .fetch_optional(&mut *tx)
            .await?;
            if exists.is_none() {
                return Err(RepositoryError::UnknownUniversity(target));
            }
        }

        let query = format!(
            "UPDATE students \
             SET university_id = COALESCE($2, university_id), \
                 first_name = COALESCE($3, first_name), \
                 last_name = COALESCE($4, last_name) \
             WHERE id = $1 RETURNING {STUDENT_COLUMNS}"
        );
        let student = sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .bind(changes.university)
            .bind(changes.first_name)
            .bind(changes.last_name)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(student))
    }

    async fn delete_student(&self, id: i64, university: Option<i64>) -> RepositoryResult<bool> {
        let result = sqlx::query(
            "DELETE FROM students WHERE id = $1 AND ($2::BIGINT IS NULL OR university_id = $2)",
        )
        .bind(id)
        .bind(university)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
