/// Recipe model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE recipes (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL CHECK (title <> ''),
///     time_minutes INTEGER NOT NULL CHECK (time_minutes >= 0),
///     price NUMERIC(5, 2) NOT NULL CHECK (price >= 0),
///     link VARCHAR(255) NOT NULL DEFAULT '',
///     image VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Tags and ingredients hang off `recipe_tags` / `recipe_ingredients`; see
/// [`super::attribute`].
///
/// # Example
///
/// ```no_run
/// use recipe_shared::models::recipe::{CreateRecipe, Recipe, RecipeFilter};
/// use rust_decimal::Decimal;
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, user_id: i64, tag_id: i64) -> Result<(), sqlx::Error> {
/// Recipe::create(&pool, CreateRecipe {
///     user_id,
///     title: "Spaghetti".to_string(),
///     time_minutes: 25,
///     price: Decimal::new(500, 2),
///     link: String::new(),
///     tags: vec![tag_id],
///     ingredients: vec![],
/// })
/// .await?;
///
/// let tagged = Recipe::list_for_user(&pool, user_id, &RecipeFilter {
///     tags: Some(vec![tag_id]),
///     ingredients: None,
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::attribute::{Attribute, AttributeKind};

const RECIPE_COLUMNS: &str = "r.id, r.user_id, r.title, r.time_minutes, r.price, r.link, r.image, \
                              r.created_at, r.updated_at";

/// A recipe row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Recipe {
    pub id: i64,

    /// Owner; set on insert and never updated
    pub user_id: i64,

    pub title: String,

    pub time_minutes: i32,

    /// Two decimal places, below 1000
    pub price: Decimal,

    /// External link, empty when unset
    pub link: String,

    /// Media-relative path of the uploaded image
    pub image: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a recipe
#[derive(Debug, Clone)]
pub struct CreateRecipe {
    pub user_id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<i64>,
    pub ingredients: Vec<i64>,
}

/// Changes to a recipe; `None` leaves the column or association as is
///
/// `Some(vec![])` for `tags`/`ingredients` detaches everything.
#[derive(Debug, Clone, Default)]
pub struct UpdateRecipe {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<i64>>,
}

/// Association filters for recipe listings
///
/// A recipe matches a filter when it is attached to any of its ids; both
/// filters must match when both are set.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<i64>>,
}

impl RecipeFilter {
    fn by_kind(&self) -> [(AttributeKind, Option<&Vec<i64>>); 2] {
        [
            (AttributeKind::Tag, self.tags.as_ref()),
            (AttributeKind::Ingredient, self.ingredients.as_ref()),
        ]
    }
}

impl Recipe {
    /// Inserts a recipe and its associations in one transaction
    pub async fn create(pool: &PgPool, data: CreateRecipe) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO recipes AS r (user_id, title, time_minutes, price, link)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {RECIPE_COLUMNS}"
        );

        let recipe = sqlx::query_as::<_, Recipe>(&query)
            .bind(data.user_id)
            .bind(data.title)
            .bind(data.time_minutes)
            .bind(data.price)
            .bind(data.link)
            .fetch_one(&mut *tx)
            .await?;

        Attribute::replace_for_recipe(&mut tx, AttributeKind::Tag, recipe.id, &data.tags).await?;
        Attribute::replace_for_recipe(
            &mut tx,
            AttributeKind::Ingredient,
            recipe.id,
            &data.ingredients,
        )
        .await?;

        tx.commit().await?;

        Ok(recipe)
    }

    /// Looks up a recipe owned by `user_id`
    pub async fn find_for_user(
        pool: &PgPool,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.id = $1 AND r.user_id = $2");

        sqlx::query_as::<_, Recipe>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// The user's recipes, newest id first, narrowed by `filter`
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: i64,
        filter: &RecipeFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.user_id = "));
        builder.push_bind(user_id);

        for (kind, ids) in filter.by_kind() {
            let Some(ids) = ids else { continue };

            builder.push(format!(
                " AND EXISTS (SELECT 1 FROM {} l WHERE l.recipe_id = r.id AND l.{} = ANY(",
                kind.link_table(),
                kind.link_column(),
            ));
            builder.push_bind(ids.clone());
            builder.push("))");
        }

        builder.push(" ORDER BY r.id DESC");

        builder.build_query_as::<Recipe>().fetch_all(pool).await
    }

    /// Every recipe regardless of owner, for the admin listing
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {RECIPE_COLUMNS} FROM recipes r ORDER BY r.id");

        sqlx::query_as::<_, Recipe>(&query).fetch_all(pool).await
    }

    /// Applies `data` to a recipe owned by `user_id`
    ///
    /// Returns `None` (and changes nothing) when no such recipe exists.
    pub async fn update_for_user(
        pool: &PgPool,
        id: i64,
        user_id: i64,
        data: UpdateRecipe,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE recipes AS r
             SET title = COALESCE($3, r.title),
                 time_minutes = COALESCE($4, r.time_minutes),
                 price = COALESCE($5, r.price),
                 link = COALESCE($6, r.link),
                 updated_at = NOW()
             WHERE r.id = $1 AND r.user_id = $2
             RETURNING {RECIPE_COLUMNS}"
        );

        let recipe = sqlx::query_as::<_, Recipe>(&query)
            .bind(id)
            .bind(user_id)
            .bind(data.title)
            .bind(data.time_minutes)
            .bind(data.price)
            .bind(data.link)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(recipe) = recipe else {
            return Ok(None);
        };

        if let Some(tags) = data.tags {
            Attribute::replace_for_recipe(&mut tx, AttributeKind::Tag, recipe.id, &tags).await?;
        }
        if let Some(ingredients) = data.ingredients {
            Attribute::replace_for_recipe(&mut tx, AttributeKind::Ingredient, recipe.id, &ingredients)
                .await?;
        }

        tx.commit().await?;

        Ok(Some(recipe))
    }

    /// Points a recipe owned by `user_id` at a newly stored image
    ///
    /// Returns the updated row and the path it replaced. The row is locked
    /// between reading the old path and writing the new one, so concurrent
    /// uploads each get back the path their own write displaced.
    pub async fn set_image(
        pool: &PgPool,
        id: i64,
        user_id: i64,
        image: &str,
    ) -> Result<Option<(Self, Option<String>)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let previous: Option<Option<String>> = sqlx::query_scalar(
            "SELECT image FROM recipes WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(previous) = previous else {
            return Ok(None);
        };

        let query = format!(
            "UPDATE recipes AS r SET image = $2, updated_at = NOW()
             WHERE r.id = $1
             RETURNING {RECIPE_COLUMNS}"
        );

        let recipe = sqlx::query_as::<_, Recipe>(&query)
            .bind(id)
            .bind(image)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some((recipe, previous)))
    }

    /// Deletes a recipe owned by `user_id`, returning the deleted row
    pub async fn delete_for_user(
        pool: &PgPool,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "DELETE FROM recipes AS r WHERE r.id = $1 AND r.user_id = $2 RETURNING {RECIPE_COLUMNS}"
        );

        sqlx::query_as::<_, Recipe>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }
}
