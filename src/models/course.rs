use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;
use crate::models::required;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum CourseLevel {
    #[default]
    #[sqlx(rename = "All Level")]
    #[serde(rename = "All Level")]
    AllLevel,
    Beginner,
    Intermediate,
    Advance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PricingModel {
    Free,
    Paid,
}

impl PricingModel {
    pub fn for_price(price: f64) -> Self {
        if price > 0.0 { PricingModel::Paid } else { PricingModel::Free }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub category_id: String,
    pub level: CourseLevel,
    pub language: Option<String>,
    pub featured: bool,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub discount_enabled: bool,
    pub course_image: Option<String>,
    pub video_url: Option<String>,
    pub instructor_id: String,
    pub pricing_model: PricingModel,
    pub average_rating: f64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RatingView {
    pub user_id: String,
    pub user_name: String,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct CourseDetails {
    #[serde(flatten)]
    pub course: Course,
    pub enrolled_count: i64,
    pub ratings: Vec<RatingView>,
    pub faqs: Vec<Faq>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCourseRequest {
    #[serde(default)]
    pub title: String,
    pub short_description: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: String,
    pub level: Option<CourseLevel>,
    pub language: Option<String>,
    pub featured: Option<bool>,
    pub price: Option<f64>,
    pub discount_price: Option<f64>,
    pub discount_enabled: Option<bool>,
    pub course_image: Option<String>,
    pub video_url: Option<String>,
    #[serde(default)]
    pub faqs: Vec<Faq>,
}

impl NewCourseRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() || self.category_id.trim().is_empty() {
            return Err(AppError::Validation("Title and category are required".to_string()));
        }
        validate_price(self.price, self.discount_price)?;
        validate_faqs(&self.faqs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub level: Option<CourseLevel>,
    pub language: Option<String>,
    pub featured: Option<bool>,
    pub price: Option<f64>,
    pub discount_price: Option<f64>,
    pub discount_enabled: Option<bool>,
    pub course_image: Option<String>,
    pub video_url: Option<String>,
    pub faqs: Option<Vec<Faq>>,
}

impl UpdateCourseRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            required(title, "Title")?;
        }
        validate_price(self.price, self.discount_price)?;
        if let Some(faqs) = &self.faqs {
            validate_faqs(faqs)?;
        }
        Ok(())
    }

    /// Applies the provided fields onto `course`, leaving the rest untouched.
    pub fn apply(self, course: &mut Course) {
        if let Some(title) = self.title {
            course.title = title.trim().to_string();
        }
        if self.short_description.is_some() {
            course.short_description = self.short_description;
        }
        if self.description.is_some() {
            course.description = self.description;
        }
        if let Some(category_id) = self.category_id {
            course.category_id = category_id;
        }
        if let Some(level) = self.level {
            course.level = level;
        }
        if self.language.is_some() {
            course.language = self.language;
        }
        if let Some(featured) = self.featured {
            course.featured = featured;
        }
        if let Some(price) = self.price {
            course.price = price;
        }
        if let Some(enabled) = self.discount_enabled {
            course.discount_enabled = enabled;
        }
        if self.discount_price.is_some() {
            course.discount_price = self.discount_price;
        }
        if !course.discount_enabled {
            course.discount_price = None;
        }
        if self.course_image.is_some() {
            course.course_image = self.course_image;
        }
        if self.video_url.is_some() {
            course.video_url = self.video_url;
        }
        course.pricing_model = PricingModel::for_price(course.price);
    }
}

fn validate_price(price: Option<f64>, discount_price: Option<f64>) -> Result<(), AppError> {
    if price.is_some_and(|p| !p.is_finite() || p < 0.0) {
        return Err(AppError::Validation("Price must be a non-negative number".to_string()));
    }
    if discount_price.is_some_and(|p| !p.is_finite() || p < 0.0) {
        return Err(AppError::Validation(
            "Discount price must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

fn validate_faqs(faqs: &[Faq]) -> Result<(), AppError> {
    if faqs
        .iter()
        .any(|f| f.question.trim().is_empty() || f.answer.trim().is_empty())
    {
        return Err(AppError::Validation("FAQ question and answer are required".to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateCourseRequest {
    #[serde(default)]
    pub rating: i64,
    pub comment: Option<String>,
}

impl RateCourseRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(1..=5).contains(&self.rating) {
            return Err(AppError::Validation("Rating must be between 1 and 5".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingSummary {
    pub course_id: String,
    pub average_rating: f64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseSort {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
    Price,
}

impl CourseSort {
    pub fn column(&self) -> &'static str {
        match self {
            CourseSort::CreatedAt => "c.created_at",
            CourseSort::UpdatedAt => "c.updated_at",
            CourseSort::Title => "c.title",
            CourseSort::Price => "c.price",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
    pub level: Option<CourseLevel>,
    #[serde(default)]
    pub sort: CourseSort,
    #[serde(default)]
    pub order: SortOrder,
}

impl CourseQuery {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct CoursePage {
    pub courses: Vec<Course>,
    pub total_pages: u32,
    pub current_page: u32,
    pub total_courses: i64,
}
