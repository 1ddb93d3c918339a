pub mod auth_service;
pub mod category_service;
pub mod course_service;
pub mod curriculum_service;
pub mod enrollment_service;
pub mod progress_service;
pub mod reconcile_service;
pub mod student_service;

pub use auth_service::AuthService;
pub use category_service::CategoryService;
pub use course_service::CourseService;
pub use curriculum_service::CurriculumService;
pub use enrollment_service::EnrollmentService;
pub use progress_service::ProgressService;
pub use reconcile_service::{ReconcileService, ReconcileStats};
pub use student_service::{StudentRemoval, StudentService};
