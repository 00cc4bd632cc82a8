use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::models::{
    NewStudent, NewUniversity, Student, StudentChanges, University, UniversityChanges,
};
use crate::repository::{Repository, RepositoryError, RepositoryResult};

/// InMemoryRepository
///
/// A `Repository` held entirely in process memory. Used for local runs without
/// `DATABASE_URL` and throughout the test suite.
///
/// Every write takes the single write lock for its whole read-modify-write, which
/// gives the same atomicity the Postgres implementation gets from transactions.
/// Ids come from per-table counters and are never reused.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    universities: BTreeMap<i64, University>,
    students: BTreeMap<i64, Student>,
    last_university_id: i64,
    last_student_id: i64,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn in_scope(student: &Student, university: Option<i64>) -> bool {
    university.is_none_or(|id| student.university == id)
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list_universities(&self) -> RepositoryResult<Vec<University>> {
        let tables = self.tables.read().await;
        Ok(tables.universities.values().cloned().collect())
    }

    async fn get_university(&self, id: i64) -> RepositoryResult<Option<University>> {
        let tables = self.tables.read().await;
        Ok(tables.universities.get(&id).cloned())
    }

    async fn create_university(&self, new: NewUniversity) -> RepositoryResult<University> {
        let mut tables = self.tables.write().await;
        tables.last_university_id += 1;
        let university = University {
            id: tables.last_university_id,
            name: new.name,
        };
        tables.universities.insert(university.id, university.clone());
        Ok(university)
    }

    async fn update_university(
        &self,
        id: i64,
        changes: UniversityChanges,
    ) -> RepositoryResult<Option<University>> {
        let mut tables = self.tables.write().await;
        let Some(university) = tables.universities.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            university.name = name;
        }
        Ok(Some(university.clone()))
    }

    async fn delete_university(&self, id: i64) -> RepositoryResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.universities.remove(&id).is_none() {
            return Ok(false);
        }
        // Cascade.
        tables.students.retain(|_, student| student.university != id);
        Ok(true)
    }

    async fn list_students(&self, university: Option<i64>) -> RepositoryResult<Vec<Student>> {
        let tables = self.tables.read().await;
        Ok(tables
            .students
            .values()
            .filter(|student| in_scope(student, university))
            .cloned()
            .collect())
    }

    async fn get_student(
        &self,
        id: i64,
        university: Option<i64>,
    ) -> RepositoryResult<Option<Student>> {
        let tables = self.tables.read().await;
        Ok(tables
            .students
            .get(&id)
            .filter(|student| in_scope(student, university))
            .cloned())
    }

    async fn create_student(&self, new: NewStudent) -> RepositoryResult<Student> {
        let mut tables = self.tables.write().await;
        if !tables.universities.contains_key(&new.university) {
            return Err(RepositoryError::UnknownUniversity(new.university));
        }
        tables.last_student_id += 1;
        let student = Student {
            id: tables.last_student_id,
            university: new.university,
            first_name: new.first_name,
            last_name: new.last_name,
            created_at: Utc::now(),
        };
        tables.students.insert(student.id, student.clone());
        Ok(student)
    }

    async fn update_student(
        &self,
        id: i64,
        university: Option<i64>,
        changes: StudentChanges,
    ) -> RepositoryResult<Option<Student>> {
        let mut tables = self.tables.write().await;
        if let Some(target) = changes.university {
            if !tables.universities.contains_key(&target) {
                // Absence of the student still wins over a bad reference.
                if !tables.students.get(&id).is_some_and(|s| in_scope(s, university)) {
                    return Ok(None);
                }
                return Err(RepositoryError::UnknownUniversity(target));
            }
        }
        let Some(student) = tables
            .students
            .get_mut(&id)
            .filter(|student| in_scope(student, university))
        else {
            return Ok(None);
        };
        if let Some(target) = changes.university {
            student.university = target;
        }
        if let Some(first_name) = changes.first_name {
            student.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            student.last_name = last_name;
        }
        Ok(Some(student.clone()))
    }

    async fn delete_student(&self, id: i64, university: Option<i64>) -> RepositoryResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.students.get(&id).is_some_and(|s| in_scope(s, university)) {
            return Ok(false);
        }
        tables.students.remove(&id);
        Ok(true)
    }
}
