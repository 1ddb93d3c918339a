use sqlx::SqlitePool;
use tracing::info;

use crate::auth::Identity;
use crate::db::{begin_write, categories};
use crate::error::AppError;
use crate::models::{Category, CategoryRequest, CategorySummary, Role, required};

pub struct CategoryService {
    db: SqlitePool,
}

impl CategoryService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<CategorySummary>, AppError> {
        Ok(categories::list_category_summaries(&self.db).await?)
    }

    pub async fn create(&self, caller: &Identity, req: CategoryRequest) -> Result<Category, AppError> {
        caller.require_role(Role::Admin)?;
        let name = required(&req.name, "Category name")?;

        if categories::name_taken(&self.db, &name, None).await? {
            return Err(AppError::Conflict("Category already exists".to_string()));
        }
        let category = categories::insert_category(&self.db, &name).await?;
        info!("category {} created", category.name);
        Ok(category)
    }

    pub async fn update(&self, caller: &Identity, id: &str, req: CategoryRequest) -> Result<Category, AppError> {
        caller.require_role(Role::Admin)?;
        let name = required(&req.name, "Category name")?;

        categories::find_category_by_id(&self.db, id)
            .await?
            .ok_or_else(|| AppError::not_found("Category"))?;
        if categories::name_taken(&self.db, &name, Some(id)).await? {
            return Err(AppError::Conflict("Category already exists".to_string()));
        }

        categories::rename_category(&self.db, id, &name).await?;
        categories::find_category_by_id(&self.db, id)
            .await?
            .ok_or_else(|| AppError::not_found("Category"))
    }

    /// Refuses while any course is filed under the category.
    pub async fn delete(&self, caller: &Identity, id: &str) -> Result<(), AppError> {
        caller.require_role(Role::Admin)?;

        let mut tx = begin_write(&self.db).await?;
        categories::find_category_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("Category"))?;

        let in_use = categories::count_courses_in_category(&mut *tx, id).await?;
        if in_use > 0 {
            return Err(AppError::Conflict(format!(
                "Category is used by {} course(s)",
                in_use
            )));
        }

        categories::delete_category(&mut *tx, id).await?;
        tx.commit().await?;

        info!("category {} deleted", id);
        Ok(())
    }
}
