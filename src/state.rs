use std::sync::Arc;

use crate::catalog::CatalogService;
use crate::config::Config;
use crate::enrollment::EnrollmentService;
use crate::models::UserId;
use crate::seed;
use crate::store::{CourseRepository, MemoryCourseRepository, MemoryEnrollmentRepository};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub enrollments: Arc<EnrollmentService>,
    pub default_user_id: UserId,
    pub default_instructor_id: UserId,
}

impl AppState {
    /// Wires both services over fresh in-memory stores.
    pub fn in_memory(config: &Config) -> Self {
        let courses: Arc<dyn CourseRepository> = if config.seed_sample_data {
            Arc::new(MemoryCourseRepository::with_courses(seed::sample_courses()))
        } else {
            Arc::new(MemoryCourseRepository::new())
        };
        let enrollments = Arc::new(MemoryEnrollmentRepository::new());

        Self {
            catalog: Arc::new(CatalogService::new(courses.clone(), config.max_page_size)),
            enrollments: Arc::new(EnrollmentService::new(enrollments, courses)),
            default_user_id: config.default_user_id,
            default_instructor_id: config.default_instructor_id,
        }
    }
}
