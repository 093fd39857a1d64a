use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub type CourseId = u32;
pub type LessonId = u32;
pub type EnrollmentId = u32;
pub type UserId = u32;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub short_description: String,
    pub image_url: String,
    pub instructor_id: Option<UserId>,
    pub instructor_name: String,
    pub instructor_avatar: String,
    pub price: Decimal,
    pub category: String,
    pub level: String, // Beginner, Intermediate, Advanced
    pub rating: f64,
    pub rating_count: u32,
    pub enrollment_count: u32,
    pub total_lessons: u32,
    pub total_duration: Duration,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_published: bool,
    pub tags: Vec<String>,
    pub requirements: Vec<String>,
    pub what_you_will_learn: Vec<String>,
    pub lessons: Vec<Lesson>,
}

impl Course {
    pub fn is_free(&self) -> bool {
        self.price.is_zero()
    }

    /// Lessons in display order.
    pub fn ordered_lessons(&self) -> Vec<&Lesson> {
        let mut lessons: Vec<&Lesson> = self.lessons.iter().collect();
        lessons.sort_by_key(|l| l.order);
        lessons
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Lesson {
    pub id: LessonId,
    pub course_id: CourseId,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub duration: Duration,
    pub order: u32,
    pub lesson_type: LessonType,
    pub is_free_preview: bool,
    pub quiz: Option<Quiz>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonType {
    Video,
    Article,
    Quiz,
    Assignment,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Quiz {
    pub id: u32,
    pub lesson_id: LessonId,
    pub title: String,
    pub description: String,
    pub passing_score: u32, // percentage
    pub time_limit_minutes: u32, // 0 = no limit
    pub allow_retake: bool,
    pub max_attempts: u32, // 0 = unlimited
    pub questions: Vec<QuizQuestion>,
}

impl Quiz {
    pub fn total_points(&self) -> u32 {
        self.questions.iter().map(|q| q.points).sum()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QuizQuestion {
    pub id: u32,
    pub prompt: String,
    pub kind: QuestionType,
    pub options: Vec<QuizOption>,
    pub explanation: Option<String>,
    pub points: u32,
    pub order: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QuizOption {
    pub id: u32,
    pub text: String,
    pub is_correct: bool,
}

/// Enrollment lifecycle. Only `Active -> Completed` is driven by this service;
/// `Expired` and `Cancelled` are set by external processes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Expired,
    Cancelled,
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EnrollmentStatus::Active => "Active",
            EnrollmentStatus::Completed => "Completed",
            EnrollmentStatus::Expired => "Expired",
            EnrollmentStatus::Cancelled => "Cancelled",
        };
        f.write_str(s)
    }
}

/// Course data copied into an enrollment when it is created.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CourseSnapshot {
    pub title: String,
    pub image_url: String,
    pub instructor_name: String,
    pub total_lessons: u32,
    pub lessons: Vec<LessonSnapshot>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LessonSnapshot {
    pub id: LessonId,
    pub title: String,
    pub duration: Duration,
}

impl CourseSnapshot {
    pub fn of(course: &Course) -> Self {
        Self {
            title: course.title.clone(),
            image_url: course.image_url.clone(),
            instructor_name: course.instructor_name.clone(),
            total_lessons: course.total_lessons,
            lessons: course
                .ordered_lessons()
                .into_iter()
                .map(|l| LessonSnapshot {
                    id: l.id,
                    title: l.title.clone(),
                    duration: l.duration,
                })
                .collect(),
        }
    }

    pub fn lesson(&self, id: LessonId) -> Option<&LessonSnapshot> {
        self.lessons.iter().find(|l| l.id == id)
    }

    pub fn lesson_title(&self, id: LessonId) -> String {
        self.lesson(id)
            .map(|l| l.title.clone())
            .unwrap_or_else(|| format!("Lesson {}", id))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: EnrollmentStatus,
    pub progress_percentage: f64,
    pub completed_lessons: u32,
    pub last_accessed_at: DateTime<Utc>,
    pub current_lesson_id: Option<LessonId>,
    pub certificate_id: Option<String>,
    pub course: CourseSnapshot,
    pub lesson_progress: Vec<LessonProgress>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LessonProgress {
    pub id: u32, // scoped to the enrollment
    pub lesson_id: LessonId,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub watched_percentage: f64,
    pub watched_duration: Duration,
    pub last_watched_at: Option<DateTime<Utc>>,
}

/// What a progress update changed on the enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressOutcome {
    Recorded,
    LessonCompleted,
    CourseCompleted,
}

impl Enrollment {
    /// New active enrollment. The id is assigned by the repository.
    pub fn start(user_id: UserId, course: &Course, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            user_id,
            course_id: course.id,
            enrolled_at: now,
            completed_at: None,
            status: EnrollmentStatus::Active,
            progress_percentage: 0.0,
            completed_lessons: 0,
            last_accessed_at: now,
            current_lesson_id: None,
            certificate_id: None,
            course: CourseSnapshot::of(course),
            lesson_progress: Vec::new(),
        }
    }

    pub fn has_certificate(&self) -> bool {
        self.status == EnrollmentStatus::Completed
    }

    pub fn watched_duration(&self) -> Duration {
        self.lesson_progress.iter().map(|p| p.watched_duration).sum()
    }

    /// Records a watch event for one lesson and recomputes the aggregate
    /// progress. Completing a lesson counts once no matter how often it is
    /// marked complete.
    pub fn record_progress(
        &mut self,
        lesson_id: LessonId,
        watched_percentage: f64,
        mark_completed: bool,
        now: DateTime<Utc>,
    ) -> ProgressOutcome {
        let watched_percentage = if watched_percentage.is_finite() {
            watched_percentage.clamp(0.0, 100.0)
        } else {
            0.0
        };
        let lesson_duration = self.course.lesson(lesson_id).map(|l| l.duration);

        let idx = match self.lesson_progress.iter().position(|p| p.lesson_id == lesson_id) {
            Some(idx) => idx,
            None => {
                let id = self.lesson_progress.len() as u32 + 1;
                self.lesson_progress.push(LessonProgress {
                    id,
                    lesson_id,
                    is_completed: false,
                    completed_at: None,
                    watched_percentage: 0.0,
                    watched_duration: Duration::ZERO,
                    last_watched_at: None,
                });
                self.lesson_progress.len() - 1
            }
        };

        let mut outcome = ProgressOutcome::Recorded;
        let progress = &mut self.lesson_progress[idx];
        progress.watched_percentage = watched_percentage;
        progress.last_watched_at = Some(now);
        if let Some(duration) = lesson_duration {
            progress.watched_duration = duration.mul_f64(watched_percentage / 100.0);
        }
        if mark_completed && !progress.is_completed {
            progress.is_completed = true;
            progress.completed_at = Some(now);
            self.completed_lessons += 1;
            outcome = ProgressOutcome::LessonCompleted;
        }

        let total = self.course.total_lessons;
        if total > 0 {
            self.progress_percentage =
                (f64::from(self.completed_lessons) / f64::from(total) * 100.0).min(100.0);
            if self.progress_percentage >= 100.0 && self.status == EnrollmentStatus::Active {
                self.status = EnrollmentStatus::Completed;
                self.completed_at = Some(now);
                self.certificate_id = Some(crate::util::certificate_number(now));
                outcome = ProgressOutcome::CourseCompleted;
            }
        }

        self.last_accessed_at = now;
        self.current_lesson_id = Some(lesson_id);
        outcome
    }
}
