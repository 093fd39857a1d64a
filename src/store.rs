use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use crate::models::*;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("a record for this key already exists")]
    Duplicate,
}

pub type CourseEdit = Box<dyn FnOnce(&mut Course) + Send>;
pub type EnrollmentEdit = Box<dyn FnOnce(&mut Enrollment) -> ProgressOutcome + Send>;

#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Every course, in id order.
    async fn all(&self) -> Vec<Course>;

    async fn get(&self, id: CourseId) -> Option<Course>;

    /// Stores `course` under a freshly assigned id (one past the largest id,
    /// or 1 for an empty catalog) and returns the stored record.
    async fn insert(&self, course: Course) -> Course;

    /// Applies `edit` atomically. `None` when no course has this id.
    async fn modify(&self, id: CourseId, edit: CourseEdit) -> Option<Course>;

    async fn remove(&self, id: CourseId) -> Option<Course>;
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// The user's enrollments in storage order.
    async fn list_for_user(&self, user_id: UserId) -> Vec<Enrollment>;

    async fn find(&self, user_id: UserId, course_id: CourseId) -> Option<Enrollment>;

    async fn exists(&self, user_id: UserId, course_id: CourseId) -> bool;

    /// Assigns the next id and stores the enrollment unless the user already
    /// holds one for the same course.
    async fn insert_unique(&self, enrollment: Enrollment) -> Result<Enrollment, StoreError>;

    /// Applies `edit` to the enrollment `id` owned by `user_id`, holding only
    /// that enrollment's lock. Returns the updated record and what changed.
    async fn modify(
        &self,
        id: EnrollmentId,
        user_id: UserId,
        edit: EnrollmentEdit,
    ) -> Option<(Enrollment, ProgressOutcome)>;
}

#[derive(Default)]
pub struct MemoryCourseRepository {
    courses: RwLock<BTreeMap<CourseId, Course>>,
}

impl MemoryCourseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog preloaded with courses that already carry their ids.
    pub fn with_courses(courses: impl IntoIterator<Item = Course>) -> Self {
        Self {
            courses: RwLock::new(courses.into_iter().map(|c| (c.id, c)).collect()),
        }
    }
}

#[async_trait]
impl CourseRepository for MemoryCourseRepository {
    async fn all(&self) -> Vec<Course> {
        self.courses.read().await.values().cloned().collect()
    }

    async fn get(&self, id: CourseId) -> Option<Course> {
        self.courses.read().await.get(&id).cloned()
    }

    async fn insert(&self, mut course: Course) -> Course {
        let mut courses = self.courses.write().await;
        course.id = courses.keys().next_back().map_or(1, |max| max + 1);
        courses.insert(course.id, course.clone());
        course
    }

    async fn modify(&self, id: CourseId, edit: CourseEdit) -> Option<Course> {
        let mut courses = self.courses.write().await;
        let course = courses.get_mut(&id)?;
        edit(&mut *course);
        Some(course.clone())
    }

    async fn remove(&self, id: CourseId) -> Option<Course> {
        self.courses.write().await.remove(&id)
    }
}

#[derive(Default)]
struct EnrollmentTable {
    next_id: EnrollmentId,
    rows: BTreeMap<EnrollmentId, Arc<Mutex<Enrollment>>>,
    by_user_course: HashMap<(UserId, CourseId), EnrollmentId>,
}

/// Enrollments keyed by id. The table lock guards membership and the
/// (user, course) index; each enrollment and its lesson progress sit behind
/// their own mutex so progress writes only serialize per enrollment.
#[derive(Default)]
pub struct MemoryEnrollmentRepository {
    table: RwLock<EnrollmentTable>,
}

impl MemoryEnrollmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn row(&self, id: EnrollmentId) -> Option<Arc<Mutex<Enrollment>>> {
        self.table.read().await.rows.get(&id).cloned()
    }
}

#[async_trait]
impl EnrollmentRepository for MemoryEnrollmentRepository {
    async fn list_for_user(&self, user_id: UserId) -> Vec<Enrollment> {
        let rows: Vec<_> = self.table.read().await.rows.values().cloned().collect();
        let mut out = Vec::new();
        for row in rows {
            let e = row.lock().await;
            if e.user_id == user_id {
                out.push(e.clone());
            }
        }
        out
    }

    async fn find(&self, user_id: UserId, course_id: CourseId) -> Option<Enrollment> {
        let row = {
            let table = self.table.read().await;
            let id = table.by_user_course.get(&(user_id, course_id))?;
            table.rows.get(id).cloned()?
        };
        let e = row.lock().await;
        Some(e.clone())
    }

    async fn exists(&self, user_id: UserId, course_id: CourseId) -> bool {
        self.table
            .read()
            .await
            .by_user_course
            .contains_key(&(user_id, course_id))
    }

    async fn insert_unique(&self, mut enrollment: Enrollment) -> Result<Enrollment, StoreError> {
        let mut table = self.table.write().await;
        let key = (enrollment.user_id, enrollment.course_id);
        if table.by_user_course.contains_key(&key) {
            return Err(StoreError::Duplicate);
        }
        table.next_id += 1;
        enrollment.id = table.next_id;
        table.by_user_course.insert(key, enrollment.id);
        table
            .rows
            .insert(enrollment.id, Arc::new(Mutex::new(enrollment.clone())));
        Ok(enrollment)
    }

    async fn modify(
        &self,
        id: EnrollmentId,
        user_id: UserId,
        edit: EnrollmentEdit,
    ) -> Option<(Enrollment, ProgressOutcome)> {
        let row = self.row(id).await?;
        let mut e = row.lock().await;
        if e.user_id != user_id {
            return None;
        }
        let outcome = edit(&mut *e);
        Some((e.clone(), outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::course;
    use chrono::Utc;

    #[tokio::test]
    async fn first_course_id_in_empty_catalog_is_one() {
        let repo = MemoryCourseRepository::new();
        let stored = repo.insert(course(99, 0)).await;
        assert_eq!(stored.id, 1);
        assert_eq!(repo.insert(course(0, 0)).await.id, 2);
    }

    #[tokio::test]
    async fn course_ids_continue_after_largest() {
        let repo = MemoryCourseRepository::with_courses([course(3, 0), course(7, 0)]);
        assert_eq!(repo.insert(course(0, 0)).await.id, 8);

        repo.remove(8).await;
        assert_eq!(repo.insert(course(0, 0)).await.id, 8);
    }

    #[tokio::test]
    async fn modify_missing_course_is_none() {
        let repo = MemoryCourseRepository::new();
        assert!(repo.modify(1, Box::new(|c: &mut Course| c.title.clear())).await.is_none());
    }

    #[tokio::test]
    async fn duplicate_enrollment_rejected() {
        let repo = MemoryEnrollmentRepository::new();
        let c = course(1, 4);
        let first = repo.insert_unique(Enrollment::start(7, &c, Utc::now())).await.unwrap();
        assert_eq!(first.id, 1);

        let again = repo.insert_unique(Enrollment::start(7, &c, Utc::now())).await;
        assert_eq!(again.unwrap_err(), StoreError::Duplicate);

        let other_user = repo.insert_unique(Enrollment::start(8, &c, Utc::now())).await.unwrap();
        assert_eq!(other_user.id, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_enrolls_insert_once() {
        let repo = Arc::new(MemoryEnrollmentRepository::new());
        let c = course(1, 4);
        let mut handles = Vec::new();
        for _ in 0..16 {
            let repo = repo.clone();
            let c = c.clone();
            handles.push(tokio::spawn(async move {
                repo.insert_unique(Enrollment::start(7, &c, Utc::now())).await.is_ok()
            }));
        }
        let mut wins = 0;
        for h in handles {
            if h.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(repo.list_for_user(7).await.len(), 1);
    }

    #[tokio::test]
    async fn modify_checks_owner() {
        let repo = MemoryEnrollmentRepository::new();
        let e = repo
            .insert_unique(Enrollment::start(7, &course(1, 4), Utc::now()))
            .await
            .unwrap();

        let touch: EnrollmentEdit = Box::new(|e: &mut Enrollment| e.record_progress(1, 10.0, false, Utc::now()));
        assert!(repo.modify(e.id, 8, touch).await.is_none());

        let touch: EnrollmentEdit = Box::new(|e: &mut Enrollment| e.record_progress(1, 10.0, false, Utc::now()));
        let (updated, outcome) = repo.modify(e.id, 7, touch).await.unwrap();
        assert_eq!(outcome, ProgressOutcome::Recorded);
        assert_eq!(updated.current_lesson_id, Some(1));
        assert_eq!(repo.find(7, 1).await.unwrap().current_lesson_id, Some(1));
    }
}
