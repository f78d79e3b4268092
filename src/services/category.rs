use crate::{
    error::{AppError, AppResult},
    models::{category, discussion, Category, CategoryModel, Discussion},
    services::cache::{CacheService, CATEGORIES_KEY, CATEGORIES_TTL_SECS},
    utils::slugify,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};

#[derive(Debug, Clone)]
pub struct CategoryInput {
    pub name: String,
    pub slug: Option<String>,
    pub description: String,
    pub sort_order: i32,
}

impl CategoryInput {
    fn resolved_slug(&self) -> AppResult<String> {
        let source = self.slug.as_deref().unwrap_or(&self.name);
        let slug = slugify(source);
        if slug.is_empty() {
            return Err(AppError::Validation(
                "Category slug must contain letters or digits".to_string(),
            ));
        }
        Ok(slug)
    }
}

pub struct CategoryService {
    db: DatabaseConnection,
    cache: Option<CacheService>,
}

impl CategoryService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db, cache: None }
    }

    pub fn with_cache(mut self, cache: Option<CacheService>) -> Self {
        self.cache = cache;
        self
    }

    pub async fn list(&self) -> AppResult<Vec<CategoryModel>> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get::<Vec<CategoryModel>>(CATEGORIES_KEY).await {
                return Ok(cached);
            }
        }

        let categories = Category::find()
            .order_by_asc(category::Column::SortOrder)
            .order_by_asc(category::Column::Name)
            .all(&self.db)
            .await?;

        if let Some(cache) = &self.cache {
            cache
                .set(CATEGORIES_KEY, &categories, CATEGORIES_TTL_SECS)
                .await;
        }
        Ok(categories)
    }

    pub async fn get_by_slug(&self, slug: &str) -> AppResult<CategoryModel> {
        Category::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<CategoryModel> {
        Category::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(&self, input: CategoryInput) -> AppResult<CategoryModel> {
        let slug = input.resolved_slug()?;
        let name = input.name.trim().to_string();
        self.ensure_unique(&name, &slug, None).await?;

        let now = chrono::Utc::now().naive_utc();
        let created = category::ActiveModel {
            name: Set(name),
            slug: Set(slug),
            description: Set(input.description.trim().to_string()),
            sort_order: Set(input.sort_order),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        self.invalidate().await;
        Ok(created)
    }

    pub async fn update(&self, id: i32, input: CategoryInput) -> AppResult<CategoryModel> {
        let existing = self.get_by_id(id).await?;
        let slug = input.resolved_slug()?;
        let name = input.name.trim().to_string();
        self.ensure_unique(&name, &slug, Some(id)).await?;

        let mut active: category::ActiveModel = existing.into();
        active.name = Set(name);
        active.slug = Set(slug);
        active.description = Set(input.description.trim().to_string());
        active.sort_order = Set(input.sort_order);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        let updated = active.update(&self.db).await?;

        self.invalidate().await;
        Ok(updated)
    }

    /// Only empty categories can be removed.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.get_by_id(id).await?;

        let discussions = Discussion::find()
            .filter(discussion::Column::CategoryId.eq(id))
            .count(&self.db)
            .await?;
        if discussions > 0 {
            return Err(AppError::Conflict(format!(
                "Category still has {} discussions",
                discussions
            )));
        }

        Category::delete_by_id(id).exec(&self.db).await?;
        self.invalidate().await;
        Ok(())
    }

    async fn ensure_unique(&self, name: &str, slug: &str, except: Option<i32>) -> AppResult<()> {
        let mut query = Category::find().filter(
            Condition::any()
                .add(category::Column::Name.eq(name))
                .add(category::Column::Slug.eq(slug)),
        );
        if let Some(id) = except {
            query = query.filter(category::Column::Id.ne(id));
        }
        if query.count(&self.db).await? > 0 {
            return Err(AppError::Conflict(
                "A category with this name or slug already exists".to_string(),
            ));
        }
        Ok(())
    }

    async fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate(CATEGORIES_KEY).await;
        }
    }
}
