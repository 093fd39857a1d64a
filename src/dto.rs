// Request and response shapes. Everything on the wire is camelCase.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::models::*;
use crate::util::format_duration;

pub const DEFAULT_PAGE_SIZE: i32 = 12;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Option<T>,
    pub errors: Vec<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            errors: Vec::new(),
        }
    }

    pub fn ok_with(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok(data)
        }
    }

    pub fn failure(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            errors,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: usize,
    pub page_number: i32,
    pub page_size: i32,
    pub total_pages: i32,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: usize, page_number: i32, page_size: i32) -> Self {
        let size = page_size.max(1) as usize;
        let total_pages = total_count.div_ceil(size) as i32;
        Self {
            items,
            total_count,
            page_number,
            page_size,
            total_pages,
            has_previous_page: page_number > 1,
            has_next_page: page_number < total_pages,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseFilter {
    pub search_term: Option<String>,
    pub category: Option<String>,
    pub level: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_free: Option<bool>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_rating: Option<f64>,
    pub sort_by: Option<String>,
    pub page_number: i32,
    pub page_size: i32,
}

impl Default for CourseFilter {
    fn default() -> Self {
        Self {
            search_term: None,
            category: None,
            level: None,
            is_free: None,
            min_price: None,
            max_price: None,
            min_rating: None,
            sort_by: None,
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Accepts JSON booleans as well as `true`/`false`/`1`/`0` strings in any
/// case, as sent by query strings. An empty string means "not set".
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    struct LenientBool;

    impl<'de> de::Visitor<'de> for LenientBool {
        type Value = Option<bool>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a boolean")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            match v.trim().to_ascii_lowercase().as_str() {
                "" => Ok(None),
                "true" | "1" => Ok(Some(true)),
                "false" | "0" => Ok(Some(false)),
                _ => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
            }
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(LenientBool)
        }
    }

    deserializer.deserialize_any(LenientBool)
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CountQuery {
    #[serde(default = "default_count")]
    pub count: usize,
}

fn default_count() -> usize {
    6
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: CourseId,
    pub title: String,
    pub short_description: String,
    pub image_url: String,
    pub instructor_name: String,
    pub price: Decimal,
    pub is_free: bool,
    pub category: String,
    pub level: String,
    pub rating: f64,
    pub rating_count: u32,
    pub enrollment_count: u32,
    pub total_lessons: u32,
    pub total_duration: String,
    pub tags: Vec<String>,
}

impl From<&Course> for CourseSummary {
    fn from(c: &Course) -> Self {
        Self {
            id: c.id,
            title: c.title.clone(),
            short_description: c.short_description.clone(),
            image_url: c.image_url.clone(),
            instructor_name: c.instructor_name.clone(),
            price: c.price,
            is_free: c.is_free(),
            category: c.category.clone(),
            level: c.level.clone(),
            rating: c.rating,
            rating_count: c.rating_count,
            enrollment_count: c.enrollment_count,
            total_lessons: c.total_lessons,
            total_duration: format_duration(c.total_duration),
            tags: c.tags.clone(),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetail {
    #[serde(flatten)]
    pub summary: CourseSummary,
    pub description: String,
    pub instructor_avatar: String,
    pub requirements: Vec<String>,
    pub what_you_will_learn: Vec<String>,
    pub updated_at: DateTime<Utc>,
    pub lessons: Vec<LessonView>,
}

impl From<&Course> for CourseDetail {
    fn from(c: &Course) -> Self {
        Self {
            summary: CourseSummary::from(c),
            description: c.description.clone(),
            instructor_avatar: c.instructor_avatar.clone(),
            requirements: c.requirements.clone(),
            what_you_will_learn: c.what_you_will_learn.clone(),
            updated_at: c.updated_at,
            lessons: c.ordered_lessons().into_iter().map(LessonView::from).collect(),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LessonView {
    pub id: LessonId,
    pub course_id: CourseId,
    pub title: String,
    pub description: String,
    pub duration: String,
    pub order: u32,
    #[serde(rename = "type")]
    pub lesson_type: LessonType,
    pub is_free_preview: bool,
    pub has_quiz: bool,
}

impl From<&Lesson> for LessonView {
    fn from(l: &Lesson) -> Self {
        Self {
            id: l.id,
            course_id: l.course_id,
            title: l.title.clone(),
            description: l.description.clone(),
            duration: format_duration(l.duration),
            order: l.order,
            lesson_type: l.lesson_type,
            is_free_preview: l.is_free_preview,
            has_quiz: l.quiz.is_some(),
        }
    }
}

/// Mutable course fields shared by create and update.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseInput {
    pub title: String,
    pub description: String,
    pub short_description: String,
    pub image_url: String,
    pub price: Decimal,
    pub category: String,
    pub level: String,
    pub tags: Vec<String>,
    pub requirements: Vec<String>,
    pub what_you_will_learn: Vec<String>,
}

impl Default for CourseInput {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            short_description: String::new(),
            image_url: String::new(),
            price: Decimal::ZERO,
            category: String::new(),
            level: "Beginner".into(),
            tags: Vec::new(),
            requirements: Vec::new(),
            what_you_will_learn: Vec::new(),
        }
    }
}

impl CourseInput {
    pub fn apply_to(self, course: &mut Course) {
        course.title = self.title;
        course.description = self.description;
        course.short_description = self.short_description;
        course.image_url = self.image_url;
        course.price = self.price;
        course.category = self.category;
        course.level = self.level;
        course.tags = self.tags;
        course.requirements = self.requirements;
        course.what_you_will_learn = self.what_you_will_learn;
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourse {
    pub id: CourseId,
    #[serde(default)]
    pub is_published: bool,
    #[serde(flatten)]
    pub fields: CourseInput,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentSummary {
    pub id: EnrollmentId,
    pub course_id: CourseId,
    pub course_title: String,
    pub course_image: String,
    pub instructor_name: String,
    pub enrolled_at: DateTime<Utc>,
    pub progress_percentage: f64,
    pub completed_lessons: u32,
    pub total_lessons: u32,
    pub status: EnrollmentStatus,
    pub last_accessed_at: DateTime<Utc>,
    pub current_lesson_id: Option<LessonId>,
}

impl From<&Enrollment> for EnrollmentSummary {
    fn from(e: &Enrollment) -> Self {
        Self {
            id: e.id,
            course_id: e.course_id,
            course_title: e.course.title.clone(),
            course_image: e.course.image_url.clone(),
            instructor_name: e.course.instructor_name.clone(),
            enrolled_at: e.enrolled_at,
            progress_percentage: e.progress_percentage,
            completed_lessons: e.completed_lessons,
            total_lessons: e.course.total_lessons,
            status: e.status,
            last_accessed_at: e.last_accessed_at,
            current_lesson_id: e.current_lesson_id,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentDetail {
    #[serde(flatten)]
    pub summary: EnrollmentSummary,
    pub completed_at: Option<DateTime<Utc>>,
    pub has_certificate: bool,
    pub certificate_id: Option<String>,
    pub lesson_progresses: Vec<LessonProgressView>,
}

impl From<&Enrollment> for EnrollmentDetail {
    fn from(e: &Enrollment) -> Self {
        Self {
            summary: EnrollmentSummary::from(e),
            completed_at: e.completed_at,
            has_certificate: e.has_certificate(),
            certificate_id: e.certificate_id.clone(),
            lesson_progresses: e
                .lesson_progress
                .iter()
                .map(|p| LessonProgressView {
                    lesson_id: p.lesson_id,
                    lesson_title: e.course.lesson_title(p.lesson_id),
                    is_completed: p.is_completed,
                    completed_at: p.completed_at,
                    watched_percentage: p.watched_percentage,
                })
                .collect(),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgressView {
    pub lesson_id: LessonId,
    pub lesson_title: String,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub watched_percentage: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    pub course_id: CourseId,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgress {
    pub enrollment_id: EnrollmentId,
    pub lesson_id: LessonId,
    pub watched_percentage: f64,
    #[serde(default)]
    pub mark_as_completed: bool,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Enrolled,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub title: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub course_id: Option<CourseId>,
    pub lesson_id: Option<LessonId>,
}

#[derive(Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub enrolled_courses: usize,
    pub completed_courses: usize,
    pub in_progress_courses: usize,
    pub certificates: usize,
    pub total_learning_hours: f64,
    pub total_lessons_completed: u32,
    pub average_progress: f64,
    pub recent_activities: Vec<RecentActivity>,
    pub continue_learning: Vec<EnrollmentSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_metadata() {
        let p = Page::new(vec![1, 2, 3], 25, 2, 12);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_previous_page);
        assert!(p.has_next_page);

        let last = Page::<u8>::new(vec![], 24, 2, 12);
        assert_eq!(last.total_pages, 2);
        assert!(!last.has_next_page);

        let empty = Page::<u8>::new(vec![], 0, 1, 12);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_previous_page);
        assert!(!empty.has_next_page);
    }

    #[test]
    fn page_metadata_with_zero_size_counts_one_per_page() {
        let p = Page::<u8>::new(vec![], 3, 1, 0);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.page_size, 0);
    }

    #[test]
    fn is_free_accepts_any_case_and_json_bools() {
        let f: CourseFilter = serde_json::from_str(r#"{"isFree":"True"}"#).unwrap();
        assert_eq!(f.is_free, Some(true));
        let f: CourseFilter = serde_json::from_str(r#"{"isFree":"FALSE"}"#).unwrap();
        assert_eq!(f.is_free, Some(false));
        let f: CourseFilter = serde_json::from_str(r#"{"isFree":false}"#).unwrap();
        assert_eq!(f.is_free, Some(false));
        let f: CourseFilter = serde_json::from_str(r#"{"isFree":null}"#).unwrap();
        assert_eq!(f.is_free, None);
        assert!(serde_json::from_str::<CourseFilter>(r#"{"isFree":"maybe"}"#).is_err());
    }

    #[test]
    fn failure_envelope_shape() {
        let body = serde_json::to_value(ApiResponse::<()>::failure("Course not found", vec![])).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Course not found");
        assert!(body["data"].is_null());
        assert_eq!(body["errors"], serde_json::json!([]));
    }

    #[test]
    fn filter_defaults_from_empty_json() {
        let f: CourseFilter = serde_json::from_str("{}").unwrap();
        assert_eq!(f.page_number, 1);
        assert_eq!(f.page_size, DEFAULT_PAGE_SIZE);
        assert!(f.sort_by.is_none());
    }

    #[test]
    fn update_body_flattens_course_fields() {
        let body = r#"{"id":4,"isPublished":true,"title":"Rust","price":0,"tags":["systems"]}"#;
        let u: UpdateCourse = serde_json::from_str(body).unwrap();
        assert_eq!(u.id, 4);
        assert!(u.is_published);
        assert_eq!(u.fields.title, "Rust");
        assert_eq!(u.fields.level, "Beginner");
        assert_eq!(u.fields.tags, vec!["systems".to_string()]);
    }
}
