use chrono::Utc;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::dto::{CourseDetail, CourseFilter, CourseInput, CourseSummary, Page, UpdateCourse};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Course, CourseId, UserId};
use crate::store::CourseRepository;

/// Orderings accepted by `sortBy`. Anything unrecognised sorts newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Newest,
    Popular,
    Rating,
    PriceLow,
    PriceHigh,
    Title,
}

impl SortKey {
    pub fn parse(v: Option<&str>) -> Self {
        match v.map(str::to_ascii_lowercase).as_deref() {
            Some("popular") => SortKey::Popular,
            Some("rating") => SortKey::Rating,
            Some("price-low") => SortKey::PriceLow,
            Some("price-high") => SortKey::PriceHigh,
            Some("title") => SortKey::Title,
            _ => SortKey::Newest,
        }
    }

    fn compare(self, a: &Course, b: &Course) -> Ordering {
        match self {
            SortKey::Newest => b.created_at.cmp(&a.created_at),
            SortKey::Popular => b.enrollment_count.cmp(&a.enrollment_count),
            SortKey::Rating => b.rating.total_cmp(&a.rating),
            SortKey::PriceLow => a.price.cmp(&b.price),
            SortKey::PriceHigh => b.price.cmp(&a.price),
            SortKey::Title => a.title.cmp(&b.title),
        }
    }
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

/// True when `course` satisfies every criterion present in `filter`.
pub fn matches(filter: &CourseFilter, course: &Course) -> bool {
    if let Some(term) = non_empty(&filter.search_term) {
        let term = term.to_lowercase();
        let hit = course.title.to_lowercase().contains(&term)
            || course.description.to_lowercase().contains(&term)
            || course.tags.iter().any(|t| t.to_lowercase().contains(&term));
        if !hit {
            return false;
        }
    }
    if let Some(category) = non_empty(&filter.category) {
        if course.category.to_lowercase() != category.to_lowercase() {
            return false;
        }
    }
    if let Some(level) = non_empty(&filter.level) {
        if course.level.to_lowercase() != level.to_lowercase() {
            return false;
        }
    }
    if let Some(free) = filter.is_free {
        let keep = if free {
            course.is_free()
        } else {
            course.price > Decimal::ZERO
        };
        if !keep {
            return false;
        }
    }
    if filter.min_price.is_some_and(|min| course.price < min) {
        return false;
    }
    if filter.max_price.is_some_and(|max| course.price > max) {
        return false;
    }
    if filter.min_rating.is_some_and(|min| course.rating < min) {
        return false;
    }
    true
}

pub struct CatalogService {
    courses: Arc<dyn CourseRepository>,
    max_page_size: i32,
}

impl CatalogService {
    pub fn new(courses: Arc<dyn CourseRepository>, max_page_size: i32) -> Self {
        Self {
            courses,
            max_page_size: max_page_size.max(1),
        }
    }

    async fn published(&self) -> Vec<Course> {
        self.courses
            .all()
            .await
            .into_iter()
            .filter(|c| c.is_published)
            .collect()
    }

    pub async fn query(&self, filter: &CourseFilter) -> Page<CourseSummary> {
        let page_number = filter.page_number.max(1);
        let page_size = filter.page_size.clamp(1, self.max_page_size);
        let sort = SortKey::parse(filter.sort_by.as_deref());

        let mut found: Vec<Course> = self
            .published()
            .await
            .into_iter()
            .filter(|c| matches(filter, c))
            .collect();
        found.sort_by(|a, b| sort.compare(a, b));

        let total = found.len();
        let skip = (page_number as usize - 1).saturating_mul(page_size as usize);
        let items: Vec<CourseSummary> = found
            .iter()
            .skip(skip)
            .take(page_size as usize)
            .map(CourseSummary::from)
            .collect();
        debug!(?sort, total, page_number, page_size, returned = items.len(), "course query");

        Page::new(items, total, page_number, page_size)
    }

    /// Any course by id, published or not.
    pub async fn get_by_id(&self, id: CourseId) -> ServiceResult<CourseDetail> {
        self.courses
            .get(id)
            .await
            .map(|c| CourseDetail::from(&c))
            .ok_or_else(course_not_found)
    }

    pub async fn featured(&self, count: usize) -> Vec<CourseSummary> {
        let mut courses = self.published().await;
        courses.sort_by(|a, b| {
            b.rating
                .total_cmp(&a.rating)
                .then_with(|| b.enrollment_count.cmp(&a.enrollment_count))
        });
        courses.iter().take(count).map(CourseSummary::from).collect()
    }

    pub async fn popular(&self, count: usize) -> Vec<CourseSummary> {
        let mut courses = self.published().await;
        courses.sort_by(|a, b| SortKey::Popular.compare(a, b));
        courses.iter().take(count).map(CourseSummary::from).collect()
    }

    pub async fn categories(&self) -> Vec<String> {
        self.published()
            .await
            .into_iter()
            .map(|c| c.category)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// New courses start as unpublished drafts.
    pub async fn create(&self, input: CourseInput, instructor_id: UserId) -> ServiceResult<CourseSummary> {
        check_price(&input)?;
        let now = Utc::now();
        let mut draft = Course {
            id: 0,
            title: String::new(),
            description: String::new(),
            short_description: String::new(),
            image_url: String::new(),
            instructor_id: Some(instructor_id),
            instructor_name: "Instructor".into(),
            instructor_avatar: String::new(),
            price: Decimal::ZERO,
            category: String::new(),
            level: String::new(),
            rating: 0.0,
            rating_count: 0,
            enrollment_count: 0,
            total_lessons: 0,
            total_duration: Duration::ZERO,
            created_at: now,
            updated_at: now,
            is_published: false,
            tags: Vec::new(),
            requirements: Vec::new(),
            what_you_will_learn: Vec::new(),
            lessons: Vec::new(),
        };
        input.apply_to(&mut draft);

        let course = self.courses.insert(draft).await;
        info!(course_id = course.id, instructor_id, title = %course.title, "course created");
        Ok(CourseSummary::from(&course))
    }

    /// Replaces every mutable field of course `id`. `id` must match the id in
    /// the body; a mismatch is rejected without touching storage.
    pub async fn update(&self, id: CourseId, input: UpdateCourse) -> ServiceResult<CourseSummary> {
        if id != input.id {
            warn!(path_id = id, body_id = input.id, "course update id mismatch");
            return Err(ServiceError::Validation("ID mismatch".into()));
        }
        check_price(&input.fields)?;

        let UpdateCourse {
            is_published,
            fields,
            ..
        } = input;
        let course = self
            .courses
            .modify(
                id,
                Box::new(move |c: &mut Course| {
                    fields.apply_to(c);
                    c.is_published = is_published;
                    c.updated_at = Utc::now();
                }),
            )
            .await
            .ok_or_else(course_not_found)?;
        info!(course_id = id, is_published, "course updated");
        Ok(CourseSummary::from(&course))
    }

    /// Removes the course. Existing enrollments keep their snapshot.
    pub async fn delete(&self, id: CourseId) -> ServiceResult<()> {
        self.courses.remove(id).await.ok_or_else(course_not_found)?;
        info!(course_id = id, "course deleted");
        Ok(())
    }
}

fn check_price(input: &CourseInput) -> ServiceResult<()> {
    if input.price < Decimal::ZERO {
        warn!(price = %input.price, "negative course price rejected");
        return Err(ServiceError::Validation("Price cannot be negative".into()));
    }
    Ok(())
}

fn course_not_found() -> ServiceError {
    ServiceError::NotFound("Course not found".into())
}
