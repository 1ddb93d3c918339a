use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::auth::Identity;
use crate::db::{begin_write, categories, courses, enrollments, new_id, now};
use crate::error::AppError;
use crate::models::{
    Course, CourseDetails, CoursePage, CourseQuery, NewCourseRequest, PricingModel, RateCourseRequest,
    RatingSummary, Role, UpdateCourseRequest, User,
};

pub struct CourseService {
    db: SqlitePool,
}

impl CourseService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn list(&self, query: &CourseQuery) -> Result<CoursePage, AppError> {
        let (courses, total) = courses::list_courses(&self.db, query).await?;
        let limit = i64::from(query.limit());
        Ok(CoursePage {
            courses,
            total_pages: ((total + limit - 1) / limit) as u32,
            current_page: query.page(),
            total_courses: total,
        })
    }

    pub async fn details(&self, course_id: &str) -> Result<CourseDetails, AppError> {
        let course = courses::find_course_by_id(&self.db, course_id)
            .await?
            .ok_or_else(|| AppError::not_found("Course"))?;

        Ok(CourseDetails {
            enrolled_count: enrollments::count_enrollments_for_course(&self.db, course_id).await?,
            ratings: courses::list_ratings(&self.db, course_id).await?,
            faqs: courses::list_faqs(&self.db, course_id).await?,
            course,
        })
    }

    /// Creates a course with the caller as its instructor.
    pub async fn create(&self, caller: &Identity, req: NewCourseRequest) -> Result<Course, AppError> {
        caller.require_role(Role::Admin)?;
        req.validate()?;

        let category_id = req.category_id.trim().to_string();
        categories::find_category_by_id(&self.db, &category_id)
            .await?
            .ok_or_else(|| AppError::not_found("Category"))?;

        let price = req.price.unwrap_or(0.0);
        let discount_enabled = req.discount_enabled.unwrap_or(false);
        let timestamp = now();
        let course = Course {
            id: new_id(),
            title: req.title.trim().to_string(),
            short_description: req.short_description,
            description: req.description,
            category_id,
            level: req.level.unwrap_or_default(),
            language: req.language,
            featured: req.featured.unwrap_or(false),
            price,
            discount_price: req.discount_price.filter(|_| discount_enabled),
            discount_enabled,
            course_image: req.course_image,
            video_url: req.video_url,
            instructor_id: caller.user_id.clone(),
            pricing_model: PricingModel::for_price(price),
            average_rating: 0.0,
            created_at: timestamp.clone(),
            updated_at: timestamp,
        };

        let mut tx = begin_write(&self.db).await?;
        courses::insert_course(&mut *tx, &course).await?;
        courses::replace_faqs(&mut *tx, &course.id, &req.faqs).await?;
        tx.commit().await?;

        info!("course {} created by {}", course.id, caller.user_id);
        Ok(course)
    }

    pub async fn update(
        &self,
        caller: &Identity,
        course_id: &str,
        req: UpdateCourseRequest,
    ) -> Result<Course, AppError> {
        req.validate()?;
        let mut course = self.owned_course(caller, course_id).await?;

        if let Some(category_id) = req.category_id.as_deref() {
            categories::find_category_by_id(&self.db, category_id)
                .await?
                .ok_or_else(|| AppError::not_found("Category"))?;
        }

        let faqs = req.faqs.clone();
        req.apply(&mut course);
        course.updated_at = now();

        let mut tx = begin_write(&self.db).await?;
        courses::update_course(&mut *tx, &course).await?;
        if let Some(faqs) = faqs {
            courses::replace_faqs(&mut *tx, &course.id, &faqs).await?;
        }
        tx.commit().await?;

        info!("course {} updated", course.id);
        Ok(course)
    }

    pub async fn delete(&self, caller: &Identity, course_id: &str) -> Result<(), AppError> {
        self.owned_course(caller, course_id).await?;

        let mut tx = begin_write(&self.db).await?;
        courses::delete_course_tree(&mut *tx, course_id).await?;
        tx.commit().await?;

        info!("course {} deleted by {}", course_id, caller.user_id);
        Ok(())
    }

    /// Enrolled courses for a student, taught courses for an admin.
    pub async fn mine(&self, caller: &Identity) -> Result<Vec<Course>, AppError> {
        let courses = match caller.role {
            Role::Student => courses::list_courses_for_student(&self.db, &caller.user_id).await?,
            Role::Admin => courses::list_courses_by_instructor(&self.db, &caller.user_id).await?,
        };
        Ok(courses)
    }

    pub async fn students(&self, caller: &Identity, course_id: &str) -> Result<Vec<User>, AppError> {
        self.owned_course(caller, course_id).await?;
        Ok(courses::list_enrolled_students(&self.db, course_id).await?)
    }

    /// Records or replaces the caller's rating. Only enrolled students may rate.
    pub async fn rate(
        &self,
        caller: &Identity,
        course_id: &str,
        req: RateCourseRequest,
    ) -> Result<RatingSummary, AppError> {
        req.validate()?;
        courses::find_course_by_id(&self.db, course_id)
            .await?
            .ok_or_else(|| AppError::not_found("Course"))?;

        if enrollments::find_enrollment(&self.db, &caller.user_id, course_id)
            .await?
            .is_none()
        {
            return Err(AppError::Forbidden("Only enrolled students can rate this course".to_string()));
        }

        let comment = req.comment.as_deref().map(str::trim).filter(|c| !c.is_empty());
        courses::upsert_rating(&self.db, course_id, &caller.user_id, req.rating, comment, &now()).await?;

        let course = courses::find_course_by_id(&self.db, course_id)
            .await?
            .ok_or_else(|| AppError::not_found("Course"))?;
        Ok(RatingSummary {
            course_id: course.id,
            average_rating: course.average_rating,
        })
    }

    async fn owned_course(&self, caller: &Identity, course_id: &str) -> Result<Course, AppError> {
        let course = courses::find_course_by_id(&self.db, course_id)
            .await?
            .ok_or_else(|| AppError::not_found("Course"))?;

        if course.instructor_id != caller.user_id {
            warn!(user_id = %caller.user_id, course_id, "not the course instructor");
            return Err(AppError::Forbidden("Only the course instructor can do this".to_string()));
        }
        Ok(course)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connect_in_memory, fixtures};
    use crate::models::{CourseLevel, Faq};
    use crate::services::EnrollmentService;

    fn identity(user: &User) -> Identity {
        Identity {
            user_id: user.id.clone(),
            role: user.role,
        }
    }

    fn new_course(category_id: &str) -> NewCourseRequest {
        NewCourseRequest {
            title: "  Async Rust ".to_string(),
            short_description: None,
            description: Some("Futures and executors".to_string()),
            category_id: category_id.to_string(),
            level: Some(CourseLevel::Intermediate),
            language: Some("en".to_string()),
            featured: None,
            price: Some(25.0),
            discount_price: Some(10.0),
            discount_enabled: None,
            course_image: None,
            video_url: None,
            faqs: vec![Faq {
                question: "Prerequisites?".to_string(),
                answer: "The book".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn test_create_course_makes_caller_instructor() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let admin = fixtures::admin(&pool).await;
        let category = categories::insert_category(&pool, "Programming").await.unwrap();

        let service = CourseService::new(pool.clone());
        let course = service
            .create(&identity(&admin), new_course(&category.id))
            .await
            .expect("create course");

        assert_eq!(course.title, "Async Rust");
        assert_eq!(course.instructor_id, admin.id);
        assert_eq!(course.pricing_model, PricingModel::Paid);
        assert_eq!(course.discount_price, None);

        let details = service.details(&course.id).await.unwrap();
        assert_eq!(details.faqs.len(), 1);
        assert_eq!(details.enrolled_count, 0);
    }

    #[tokio::test]
    async fn test_create_course_requires_admin_and_category() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let admin = fixtures::admin(&pool).await;
        let ada = fixtures::student(&pool, "Ada").await;

        let service = CourseService::new(pool.clone());
        let err = service.create(&identity(&ada), new_course("x")).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let err = service.create(&identity(&admin), new_course("missing")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_only_instructor_updates() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let admin = fixtures::admin(&pool).await;
        let other = fixtures::user(&pool, "Other Admin", Role::Admin).await;
        let course = fixtures::course(&pool, &admin.id, "Rust").await;

        let service = CourseService::new(pool.clone());
        let req = UpdateCourseRequest {
            title: Some("Rust 2".to_string()),
            price: Some(0.0),
            ..Default::default()
        };
        let err = service.update(&identity(&other), &course.id, req.clone()).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let updated = service.update(&identity(&admin), &course.id, req).await.unwrap();
        assert_eq!(updated.title, "Rust 2");
        assert_eq!(updated.pricing_model, PricingModel::Free);
    }

    #[tokio::test]
    async fn test_rating_requires_enrollment() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let admin = fixtures::admin(&pool).await;
        let ada = fixtures::student(&pool, "Ada").await;
        let course = fixtures::course(&pool, &admin.id, "Rust").await;

        let service = CourseService::new(pool.clone());
        let rating = RateCourseRequest { rating: 4, comment: None };
        let err = service.rate(&identity(&ada), &course.id, rating.clone()).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        EnrollmentService::new(pool.clone())
            .enroll(&identity(&ada), &course.id)
            .await
            .expect("enroll");
        let summary = service.rate(&identity(&ada), &course.id, rating).await.unwrap();
        assert!((summary.average_rating - 4.0).abs() < f64::EPSILON);

        let mine = service.mine(&identity(&ada)).await.unwrap();
        assert_eq!(mine.len(), 1);
        let taught = service.mine(&identity(&admin)).await.unwrap();
        assert_eq!(taught.len(), 1);
    }
}
