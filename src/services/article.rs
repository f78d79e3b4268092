use crate::{
    error::{AppError, AppResult},
    models::{article, Article, ArticleModel, ArticleStatus},
    services::contains_ci,
    utils::{render_plain_excerpt, slugify},
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

const EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct ArticleInput {
    pub title: String,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image_url: Option<String>,
}

impl ArticleInput {
    fn excerpt(&self) -> String {
        self.excerpt
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| render_plain_excerpt(&self.content, EXCERPT_CHARS))
    }
}

pub struct ArticleService {
    db: DatabaseConnection,
}

impl ArticleService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        status: Option<ArticleStatus>,
        search: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ArticleModel>, u64)> {
        let mut query = Article::find();
        if let Some(status) = status {
            query = query.filter(article::Column::Status.eq(status));
        }
        if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(contains_ci::<Article>(article::Column::Title, term));
        }

        let query = match status {
            Some(ArticleStatus::Published) => query.order_by_desc(article::Column::PublishedAt),
            _ => query.order_by_desc(article::Column::UpdatedAt),
        };
        let paginator = query
            .order_by_desc(article::Column::Id)
            .paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Public fetch: drafts are not found. Counts the view.
    pub async fn view_published(&self, slug: &str) -> AppResult<ArticleModel> {
        let result = Article::update_many()
            .col_expr(
                article::Column::ViewsCount,
                Expr::col(article::Column::ViewsCount).add(1),
            )
            .filter(article::Column::Slug.eq(slug))
            .filter(article::Column::Status.eq(ArticleStatus::Published))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Article::find()
            .filter(article::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<ArticleModel> {
        Article::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// New articles start as drafts.
    pub async fn create(&self, author_id: i32, input: ArticleInput) -> AppResult<ArticleModel> {
        let slug = self
            .available_slug(input.slug.as_deref().unwrap_or(&input.title), None)
            .await?;
        let now = chrono::Utc::now().naive_utc();

        let created = article::ActiveModel {
            author_id: Set(author_id),
            title: Set(input.title.trim().to_string()),
            slug: Set(slug),
            excerpt: Set(Some(input.excerpt())),
            content: Set(input.content.clone()),
            cover_image_url: Set(input.cover_image_url.clone()),
            status: Set(ArticleStatus::Draft),
            published_at: Set(None),
            views_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        tracing::info!(article_id = created.id, author_id, "Article drafted");
        Ok(created)
    }

    pub async fn update(&self, id: i32, input: ArticleInput) -> AppResult<ArticleModel> {
        let existing = self.get_by_id(id).await?;
        let slug = match input.slug.as_deref() {
            Some(requested) => self.available_slug(requested, Some(id)).await?,
            None => existing.slug.clone(),
        };

        let mut active: article::ActiveModel = existing.into();
        active.title = Set(input.title.trim().to_string());
        active.slug = Set(slug);
        active.excerpt = Set(Some(input.excerpt()));
        active.content = Set(input.content.clone());
        active.cover_image_url = Set(input.cover_image_url.clone());
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        Ok(active.update(&self.db).await?)
    }

    /// Flips draft/published. `published_at` records the first publication
    /// and survives unpublishing.
    pub async fn toggle_published(&self, id: i32) -> AppResult<ArticleModel> {
        let existing = self.get_by_id(id).await?;
        let now = chrono::Utc::now().naive_utc();
        let (status, published_at) = match existing.status {
            ArticleStatus::Draft => (
                ArticleStatus::Published,
                existing.published_at.or(Some(now)),
            ),
            ArticleStatus::Published => (ArticleStatus::Draft, existing.published_at),
        };

        let mut active: article::ActiveModel = existing.into();
        active.status = Set(status);
        active.published_at = Set(published_at);
        active.updated_at = Set(now);
        Ok(active.update(&self.db).await?)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = Article::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    /// Slugified `source`, suffixed `-2`, `-3`, ... until unused.
    async fn available_slug(&self, source: &str, except: Option<i32>) -> AppResult<String> {
        let base = slugify(source);
        if base.is_empty() {
            return Err(AppError::Validation(
                "Article slug must contain letters or digits".to_string(),
            ));
        }

        let mut candidate = base.clone();
        for n in 2u32.. {
            let mut query = Article::find().filter(article::Column::Slug.eq(candidate.as_str()));
            if let Some(id) = except {
                query = query.filter(article::Column::Id.ne(id));
            }
            if query.count(&self.db).await? == 0 {
                return Ok(candidate);
            }
            candidate = format!("{}-{}", base, n);
        }
        Err(AppError::Conflict("No free slug available".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_falls_back_to_content() {
        let input = ArticleInput {
            title: "Kabar Alumni".into(),
            slug: None,
            excerpt: Some("  ".into()),
            content: "**Selamat** kepada wisudawan".into(),
            cover_image_url: None,
        };
        assert_eq!(input.excerpt(), "Selamat kepada wisudawan");
    }
}
