use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    routing::{get, post},
    Json, Router,
};

use crate::{
    dto::*,
    error::ServiceError,
    models::{CourseId, UserId},
    state::AppState,
};

pub const USER_HEADER: &str = "x-user-id";

type ApiResult<T> = Result<Json<ApiResponse<T>>, ServiceError>;

pub fn router(state: AppState) -> Router {
    Router::new()
        // catalog
        .route("/api/courses", get(list_courses).post(create_course))
        .route("/api/courses/featured", get(featured_courses))
        .route("/api/courses/popular", get(popular_courses))
        .route("/api/courses/categories", get(categories))
        .route(
            "/api/courses/:id",
            get(get_course).put(update_course).delete(delete_course),
        )
        // enrollments
        .route("/api/enrollments", get(my_enrollments).post(enroll))
        .route("/api/enrollments/course/:course_id", get(enrollment_detail))
        .route("/api/enrollments/progress", post(update_progress))
        .route("/api/enrollments/dashboard", get(dashboard))
        .route("/api/enrollments/check/:course_id", get(check_enrollment))
        .with_state(state)
}

// Body, query and path extractors whose rejections use the API envelope.

#[derive(FromRequest)]
#[from_request(via(Json), rejection(ServiceError))]
pub struct Payload<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ServiceError))]
pub struct Params<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ServiceError))]
pub struct Id<T>(pub T);

/// Caller identity taken from the `x-user-id` header. Requests without the
/// header act as the configured default user.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserId);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match parts.headers.get(USER_HEADER) {
            None => Ok(CurrentUser(state.default_user_id)),
            Some(raw) => raw
                .to_str()
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .map(CurrentUser)
                .ok_or_else(|| e400("Invalid x-user-id header")),
        }
    }
}

// --- catalog ---

async fn list_courses(
    State(st): State<AppState>,
    Params(filter): Params<CourseFilter>,
) -> ApiResult<Page<CourseSummary>> {
    Ok(Json(ApiResponse::ok(st.catalog.query(&filter).await)))
}

async fn get_course(State(st): State<AppState>, Id(id): Id<CourseId>) -> ApiResult<CourseDetail> {
    let course = st.catalog.get_by_id(id).await?;
    Ok(Json(ApiResponse::ok(course)))
}

async fn featured_courses(
    State(st): State<AppState>,
    Params(q): Params<CountQuery>,
) -> ApiResult<Vec<CourseSummary>> {
    Ok(Json(ApiResponse::ok(st.catalog.featured(q.count).await)))
}

async fn popular_courses(
    State(st): State<AppState>,
    Params(q): Params<CountQuery>,
) -> ApiResult<Vec<CourseSummary>> {
    Ok(Json(ApiResponse::ok(st.catalog.popular(q.count).await)))
}

async fn categories(State(st): State<AppState>) -> ApiResult<Vec<String>> {
    Ok(Json(ApiResponse::ok(st.catalog.categories().await)))
}

async fn create_course(
    State(st): State<AppState>,
    Payload(input): Payload<CourseInput>,
) -> Result<(StatusCode, Json<ApiResponse<CourseSummary>>), ServiceError> {
    let course = st.catalog.create(input, st.default_instructor_id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(course))))
}

async fn update_course(
    State(st): State<AppState>,
    Id(id): Id<CourseId>,
    Payload(input): Payload<UpdateCourse>,
) -> ApiResult<CourseSummary> {
    let course = st.catalog.update(id, input).await?;
    Ok(Json(ApiResponse::ok(course)))
}

async fn delete_course(State(st): State<AppState>, Id(id): Id<CourseId>) -> ApiResult<bool> {
    st.catalog.delete(id).await?;
    Ok(Json(ApiResponse::ok_with(true, "Course deleted successfully")))
}

// --- enrollments ---

async fn my_enrollments(
    State(st): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Vec<EnrollmentSummary>> {
    Ok(Json(ApiResponse::ok(st.enrollments.list_for_user(user).await)))
}

async fn enrollment_detail(
    State(st): State<AppState>,
    CurrentUser(user): CurrentUser,
    Id(course_id): Id<CourseId>,
) -> ApiResult<EnrollmentDetail> {
    let detail = st.enrollments.detail(user, course_id).await?;
    Ok(Json(ApiResponse::ok(detail)))
}

async fn enroll(
    State(st): State<AppState>,
    CurrentUser(user): CurrentUser,
    Payload(req): Payload<EnrollRequest>,
) -> ApiResult<EnrollmentSummary> {
    let enrollment = st.enrollments.enroll(user, req.course_id).await?;
    Ok(Json(ApiResponse::ok_with(enrollment, "Successfully enrolled in the course")))
}

async fn update_progress(
    State(st): State<AppState>,
    CurrentUser(user): CurrentUser,
    Payload(req): Payload<UpdateProgress>,
) -> ApiResult<bool> {
    st.enrollments.update_progress(user, req).await?;
    Ok(Json(ApiResponse::ok_with(true, "Progress updated")))
}

async fn dashboard(State(st): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<DashboardStats> {
    Ok(Json(ApiResponse::ok(st.enrollments.dashboard(user).await)))
}

async fn check_enrollment(
    State(st): State<AppState>,
    CurrentUser(user): CurrentUser,
    Id(course_id): Id<CourseId>,
) -> ApiResult<bool> {
    Ok(Json(ApiResponse::ok(st.enrollments.is_enrolled(user, course_id).await)))
}

// --- helpers ---
fn e400<T: Into<String>>(msg: T) -> ServiceError {
    ServiceError::Validation(msg.into())
}
