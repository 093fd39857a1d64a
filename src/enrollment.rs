use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::dto::{
    ActivityKind, DashboardStats, EnrollmentDetail, EnrollmentSummary, RecentActivity,
    UpdateProgress,
};
use crate::error::{ServiceError, ServiceResult};
use crate::models::*;
use crate::store::{CourseRepository, EnrollmentRepository};
use crate::util::hours;

const CONTINUE_LEARNING_LIMIT: usize = 3;
const ENROLLED_EVENT_SOURCES: usize = 5;
const RECENT_ACTIVITY_LIMIT: usize = 10;

pub struct EnrollmentService {
    enrollments: Arc<dyn EnrollmentRepository>,
    courses: Arc<dyn CourseRepository>,
}

impl EnrollmentService {
    /// `courses` is only read, to snapshot a course at enrollment time.
    pub fn new(enrollments: Arc<dyn EnrollmentRepository>, courses: Arc<dyn CourseRepository>) -> Self {
        Self { enrollments, courses }
    }

    pub async fn list_for_user(&self, user_id: UserId) -> Vec<EnrollmentSummary> {
        self.enrollments
            .list_for_user(user_id)
            .await
            .iter()
            .map(EnrollmentSummary::from)
            .collect()
    }

    pub async fn detail(&self, user_id: UserId, course_id: CourseId) -> ServiceResult<EnrollmentDetail> {
        self.enrollments
            .find(user_id, course_id)
            .await
            .map(|e| EnrollmentDetail::from(&e))
            .ok_or_else(|| ServiceError::NotFound("Enrollment not found".into()))
    }

    pub async fn enroll(&self, user_id: UserId, course_id: CourseId) -> ServiceResult<EnrollmentSummary> {
        let course = self
            .courses
            .get(course_id)
            .await
            .ok_or_else(|| ServiceError::NotFound("Course not found".into()))?;

        let enrollment = self
            .enrollments
            .insert_unique(Enrollment::start(user_id, &course, Utc::now()))
            .await
            .map_err(|e| {
                warn!(user_id, course_id, "duplicate enrollment");
                ServiceError::from(e)
            })?;
        info!(enrollment_id = enrollment.id, user_id, course_id, "enrolled");
        Ok(EnrollmentSummary::from(&enrollment))
    }

    /// Records lesson progress. Callers re-fetch the enrollment to see the
    /// recomputed totals.
    pub async fn update_progress(&self, user_id: UserId, req: UpdateProgress) -> ServiceResult<()> {
        let UpdateProgress {
            enrollment_id,
            lesson_id,
            watched_percentage,
            mark_as_completed,
        } = req;
        let now = Utc::now();
        let (enrollment, outcome) = self
            .enrollments
            .modify(
                enrollment_id,
                user_id,
                Box::new(move |e: &mut Enrollment| {
                    e.record_progress(lesson_id, watched_percentage, mark_as_completed, now)
                }),
            )
            .await
            .ok_or_else(|| ServiceError::NotFound("Enrollment not found".into()))?;

        match outcome {
            ProgressOutcome::CourseCompleted => info!(
                enrollment_id,
                user_id,
                course_id = enrollment.course_id,
                certificate = enrollment.certificate_id.as_deref().unwrap_or_default(),
                "course completed"
            ),
            ProgressOutcome::LessonCompleted => info!(
                enrollment_id,
                lesson_id,
                progress = enrollment.progress_percentage,
                "lesson completed"
            ),
            ProgressOutcome::Recorded => debug!(enrollment_id, lesson_id, watched_percentage, "progress recorded"),
        }
        Ok(())
    }

    pub async fn dashboard(&self, user_id: UserId) -> DashboardStats {
        build_dashboard(&self.enrollments.list_for_user(user_id).await)
    }

    pub async fn is_enrolled(&self, user_id: UserId, course_id: CourseId) -> bool {
        self.enrollments.exists(user_id, course_id).await
    }
}

/// Aggregates one user's enrollments into dashboard figures.
pub fn build_dashboard(enrollments: &[Enrollment]) -> DashboardStats {
    let count = |status: EnrollmentStatus| enrollments.iter().filter(|e| e.status == status).count();
    let completed = count(EnrollmentStatus::Completed);

    let average_progress = if enrollments.is_empty() {
        0.0
    } else {
        enrollments.iter().map(|e| e.progress_percentage).sum::<f64>() / enrollments.len() as f64
    };

    let mut active: Vec<&Enrollment> = enrollments
        .iter()
        .filter(|e| e.status == EnrollmentStatus::Active)
        .collect();
    active.sort_by(|a, b| b.last_accessed_at.cmp(&a.last_accessed_at));

    DashboardStats {
        enrolled_courses: enrollments.len(),
        completed_courses: completed,
        in_progress_courses: count(EnrollmentStatus::Active),
        certificates: completed,
        total_learning_hours: hours(enrollments.iter().map(Enrollment::watched_duration).sum()),
        total_lessons_completed: enrollments.iter().map(|e| e.completed_lessons).sum(),
        average_progress,
        recent_activities: recent_activities(enrollments),
        continue_learning: active
            .into_iter()
            .take(CONTINUE_LEARNING_LIMIT)
            .map(EnrollmentSummary::from)
            .collect(),
    }
}

// Only enrollment events are tracked so far.
fn recent_activities(enrollments: &[Enrollment]) -> Vec<RecentActivity> {
    let mut newest: Vec<&Enrollment> = enrollments.iter().collect();
    newest.sort_by(|a, b| b.enrolled_at.cmp(&a.enrolled_at));

    let mut activities: Vec<RecentActivity> = newest
        .into_iter()
        .take(ENROLLED_EVENT_SOURCES)
        .map(|e| RecentActivity {
            kind: ActivityKind::Enrolled,
            title: "Enrolled in course".into(),
            description: e.course.title.clone(),
            timestamp: e.enrolled_at,
            course_id: Some(e.course_id),
            lesson_id: None,
        })
        .collect();
    activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    activities.truncate(RECENT_ACTIVITY_LIMIT);
    activities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::course;
    use crate::store::{MemoryCourseRepository, MemoryEnrollmentRepository};
    use chrono::Duration as ChronoDuration;

    fn service() -> EnrollmentService {
        let courses = MemoryCourseRepository::with_courses([course(1, 10), course(2, 4), course(3, 0)]);
        EnrollmentService::new(Arc::new(MemoryEnrollmentRepository::new()), Arc::new(courses))
    }

    fn progress(enrollment_id: EnrollmentId, lesson_id: LessonId, done: bool) -> UpdateProgress {
        UpdateProgress {
            enrollment_id,
            lesson_id,
            watched_percentage: 100.0,
            mark_as_completed: done,
        }
    }

    #[tokio::test]
    async fn enroll_then_conflict() {
        let svc = service();
        assert!(!svc.is_enrolled(7, 1).await);

        let e = svc.enroll(7, 1).await.unwrap();
        assert_eq!(e.course_id, 1);
        assert_eq!(e.status, EnrollmentStatus::Active);
        assert_eq!(e.progress_percentage, 0.0);
        assert_eq!(e.total_lessons, 10);
        assert_eq!(e.course_title, "Course 1");
        assert!(svc.is_enrolled(7, 1).await);

        let again = svc.enroll(7, 1).await.unwrap_err();
        assert!(matches!(again, ServiceError::Conflict(_)));
        assert_eq!(svc.list_for_user(7).await.len(), 1);
    }

    #[tokio::test]
    async fn enroll_unknown_course_is_not_found() {
        let err = service().enroll(7, 99).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_keeps_storage_order_per_user() {
        let svc = service();
        svc.enroll(1, 2).await.unwrap();
        svc.enroll(2, 1).await.unwrap();
        svc.enroll(1, 1).await.unwrap();

        let ids: Vec<_> = svc.list_for_user(1).await.iter().map(|e| e.course_id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(svc.list_for_user(3).await.is_empty());
    }

    #[tokio::test]
    async fn first_completion_counts_ten_percent() {
        let svc = service();
        let e = svc.enroll(7, 1).await.unwrap();

        svc.update_progress(7, progress(e.id, 5, true)).await.unwrap();
        svc.update_progress(7, progress(e.id, 5, true)).await.unwrap();

        let detail = svc.detail(7, 1).await.unwrap();
        assert_eq!(detail.summary.completed_lessons, 1);
        assert_eq!(detail.summary.progress_percentage, 10.0);
        assert_eq!(detail.summary.status, EnrollmentStatus::Active);
        assert_eq!(detail.summary.current_lesson_id, Some(5));
        assert!(!detail.has_certificate);
        assert_eq!(detail.lesson_progresses.len(), 1);
        assert_eq!(detail.lesson_progresses[0].lesson_title, "Lesson title 5");
    }

    #[tokio::test]
    async fn completing_all_lessons_completes_enrollment() {
        let svc = service();
        let e = svc.enroll(7, 2).await.unwrap();
        for lesson in 1..=4 {
            svc.update_progress(7, progress(e.id, lesson, true)).await.unwrap();
        }

        let detail = svc.detail(7, 2).await.unwrap();
        assert_eq!(detail.summary.status, EnrollmentStatus::Completed);
        assert_eq!(detail.summary.progress_percentage, 100.0);
        assert!(detail.completed_at.is_some());
        assert!(detail.has_certificate);
        assert!(detail.certificate_id.is_some());
    }

    #[tokio::test]
    async fn progress_on_someone_elses_enrollment_fails() {
        let svc = service();
        let e = svc.enroll(7, 1).await.unwrap();

        let err = svc.update_progress(8, progress(e.id, 1, true)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        let err = svc.update_progress(7, progress(e.id + 100, 1, true)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        assert_eq!(svc.detail(7, 1).await.unwrap().summary.completed_lessons, 0);
    }

    #[tokio::test]
    async fn snapshot_survives_course_deletion() {
        let courses = Arc::new(MemoryCourseRepository::with_courses([course(1, 10)]));
        let svc = EnrollmentService::new(Arc::new(MemoryEnrollmentRepository::new()), courses.clone());
        svc.enroll(7, 1).await.unwrap();

        courses.remove(1).await;
        let listed = svc.list_for_user(7).await;
        assert_eq!(listed[0].course_title, "Course 1");
        assert_eq!(listed[0].total_lessons, 10);
    }

    #[tokio::test]
    async fn dashboard_for_new_user_is_empty() {
        let stats = service().dashboard(404).await;
        assert_eq!(stats.enrolled_courses, 0);
        assert_eq!(stats.average_progress, 0.0);
        assert!(stats.recent_activities.is_empty());
        assert!(stats.continue_learning.is_empty());
    }

    #[tokio::test]
    async fn dashboard_sums_lessons_and_averages_progress() {
        let svc = service();
        let a = svc.enroll(7, 1).await.unwrap();
        let b = svc.enroll(7, 2).await.unwrap();
        svc.enroll(7, 3).await.unwrap();

        svc.update_progress(7, progress(a.id, 1, true)).await.unwrap();
        svc.update_progress(7, progress(a.id, 2, true)).await.unwrap();
        for lesson in 1..=4 {
            svc.update_progress(7, progress(b.id, lesson, true)).await.unwrap();
        }

        let stats = svc.dashboard(7).await;
        assert_eq!(stats.enrolled_courses, 3);
        assert_eq!(stats.completed_courses, 1);
        assert_eq!(stats.certificates, 1);
        assert_eq!(stats.in_progress_courses, 2);
        assert_eq!(stats.total_lessons_completed, 6);
        assert!((stats.average_progress - (20.0 + 100.0 + 0.0) / 3.0).abs() < 1e-9);
        // six fully watched ten-minute lessons
        assert!((stats.total_learning_hours - 1.0).abs() < 1e-9);
        assert_eq!(stats.recent_activities.len(), 3);
        assert!(stats.continue_learning.iter().all(|e| e.status == EnrollmentStatus::Active));
    }

    #[test]
    fn continue_learning_and_activity_ordering() {
        let base = Utc::now();
        let enrollments: Vec<Enrollment> = (1..=8)
            .map(|i| {
                let mut e = Enrollment::start(7, &course(i, 5), base + ChronoDuration::minutes(i as i64));
                e.id = i;
                // access order is the reverse of enrollment order
                e.last_accessed_at = base + ChronoDuration::hours(10 - i as i64);
                if i == 1 {
                    e.status = EnrollmentStatus::Cancelled;
                }
                e
            })
            .collect();

        let stats = build_dashboard(&enrollments);
        let cont: Vec<_> = stats.continue_learning.iter().map(|e| e.id).collect();
        assert_eq!(cont, vec![2, 3, 4]);

        let recent: Vec<_> = stats.recent_activities.iter().map(|a| a.course_id).collect();
        assert_eq!(recent, vec![Some(8), Some(7), Some(6), Some(5), Some(4)]);
        assert!(stats
            .recent_activities
            .iter()
            .all(|a| a.kind == ActivityKind::Enrolled && a.lesson_id.is_none()));
        assert_eq!(stats.in_progress_courses, 7);
        assert_eq!(stats.enrolled_courses, 8);
    }
}
