pub mod category;
pub mod course;
pub mod enrollment;
pub mod lecture;
pub mod payment;
pub mod progress;
pub mod topic;
pub mod user;

pub use category::{Category, CategoryRequest, CategorySummary};
pub use course::{
    Course, CourseDetails, CourseLevel, CoursePage, CourseQuery, CourseSort, Faq,
    NewCourseRequest, PricingModel, RateCourseRequest, RatingSummary, RatingView, SortOrder, UpdateCourseRequest,
};
pub use enrollment::{Enrollment, EnrollmentStatus};
pub use lecture::{Lecture, LectureRequest, LectureWithTopics};
pub use payment::{PaymentVerification, VerifyPaymentRequest};
pub use progress::{
    LectureCompletion, OverallProgress, ProgressTopUp, StudentProgress, StudentSearch, TopicCompletion,
    UserProgress,
};
pub use topic::{ResourceType, Topic, TopicRequest, TopicWithCompletion, ValidTopic};
pub use user::{AuthResponse, LoginRequest, RegisterRequest, Role, User};

/// Returns the trimmed value, or a validation error naming the field when it is blank.
pub(crate) fn required(value: &str, field: &str) -> Result<String, crate::error::AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::error::AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}
