/// Tags and ingredients
///
/// Both are user-owned named labels attached to recipes through a join
/// table, with identical columns and queries. `AttributeKind` selects the
/// tables; everything else is shared.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tags (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL CHECK (name <> ''),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE recipe_tags (
///     recipe_id BIGINT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
///     tag_id BIGINT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
///     PRIMARY KEY (recipe_id, tag_id)
/// );
/// ```
///
/// `ingredients` / `recipe_ingredients` are the same with `ingredient_id`.
///
/// # Example
///
/// ```no_run
/// use recipe_shared::models::attribute::{Attribute, AttributeKind, CreateAttribute};
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, user_id: i64) -> Result<(), sqlx::Error> {
/// Attribute::create(&pool, AttributeKind::Tag, CreateAttribute {
///     user_id,
///     name: "Vegan".to_string(),
/// })
/// .await?;
///
/// // Only tags used by one of the user's recipes
/// let used = Attribute::list_for_user(&pool, AttributeKind::Tag, user_id, true).await?;
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

/// Which attribute table to work on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    Tag,
    Ingredient,
}

impl AttributeKind {
    /// Entity table
    pub fn table(self) -> &'static str {
        match self {
            AttributeKind::Tag => "tags",
            AttributeKind::Ingredient => "ingredients",
        }
    }

    /// Recipe join table
    pub fn link_table(self) -> &'static str {
        match self {
            AttributeKind::Tag => "recipe_tags",
            AttributeKind::Ingredient => "recipe_ingredients",
        }
    }

    /// Foreign key column in the join table
    pub fn link_column(self) -> &'static str {
        match self {
            AttributeKind::Tag => "tag_id",
            AttributeKind::Ingredient => "ingredient_id",
        }
    }

    /// Field name used in request payloads and error details
    pub fn field(self) -> &'static str {
        match self {
            AttributeKind::Tag => "tags",
            AttributeKind::Ingredient => "ingredients",
        }
    }
}

/// A tag or ingredient row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attribute {
    pub id: i64,

    /// Owner; set on insert and never updated
    pub user_id: i64,

    pub name: String,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a tag or ingredient
#[derive(Debug, Clone)]
pub struct CreateAttribute {
    pub user_id: i64,

    /// Must be non-empty; the table enforces it too
    pub name: String,
}

impl Attribute {
    pub async fn create(
        pool: &PgPool,
        kind: AttributeKind,
        data: CreateAttribute,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO {} (user_id, name) VALUES ($1, $2)
             RETURNING id, user_id, name, created_at",
            kind.table()
        );

        sqlx::query_as::<_, Attribute>(&query)
            .bind(data.user_id)
            .bind(data.name)
            .fetch_one(pool)
            .await
    }

    /// The user's rows, name descending
    ///
    /// With `assigned_only`, keeps only rows attached to at least one of the
    /// user's own recipes. `EXISTS` keeps each row once no matter how many
    /// recipes reference it.
    pub async fn list_for_user(
        pool: &PgPool,
        kind: AttributeKind,
        user_id: i64,
        assigned_only: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = format!(
            "SELECT a.id, a.user_id, a.name, a.created_at FROM {} a WHERE a.user_id = $1",
            kind.table()
        );

        if assigned_only {
            query.push_str(&format!(
                " AND EXISTS (
                    SELECT 1 FROM {link} l
                    JOIN recipes r ON r.id = l.recipe_id
                    WHERE l.{column} = a.id AND r.user_id = $1
                  )",
                link = kind.link_table(),
                column = kind.link_column(),
            ));
        }

        query.push_str(" ORDER BY a.name DESC, a.id DESC");

        sqlx::query_as::<_, Attribute>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Every row regardless of owner, for the admin listing
    pub async fn list_all(pool: &PgPool, kind: AttributeKind) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT id, user_id, name, created_at FROM {} ORDER BY id",
            kind.table()
        );

        sqlx::query_as::<_, Attribute>(&query).fetch_all(pool).await
    }

    /// Ids from `ids` that match no row, in request order without repeats
    ///
    /// Ownership is not checked: any existing row may be attached to a recipe.
    pub async fn missing_ids(
        pool: &PgPool,
        kind: AttributeKind,
        ids: &[i64],
    ) -> Result<Vec<i64>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!("SELECT id FROM {} WHERE id = ANY($1)", kind.table());
        let found: Vec<i64> = sqlx::query_scalar(&query)
            .bind(ids)
            .fetch_all(pool)
            .await?;

        let mut missing = Vec::new();
        for id in ids {
            if !found.contains(id) && !missing.contains(id) {
                missing.push(*id);
            }
        }

        Ok(missing)
    }

    /// Rows attached to one recipe, id ascending
    pub async fn list_for_recipe(
        pool: &PgPool,
        kind: AttributeKind,
        recipe_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT a.id, a.user_id, a.name, a.created_at
             FROM {table} a
             JOIN {link} l ON l.{column} = a.id
             WHERE l.recipe_id = $1
             ORDER BY a.id",
            table = kind.table(),
            link = kind.link_table(),
            column = kind.link_column(),
        );

        sqlx::query_as::<_, Attribute>(&query)
            .bind(recipe_id)
            .fetch_all(pool)
            .await
    }

    /// Attached ids grouped by recipe, for rendering recipe lists
    ///
    /// Recipes with no attachments have no entry in the map.
    pub async fn ids_by_recipe(
        pool: &PgPool,
        kind: AttributeKind,
        recipe_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<i64>>, sqlx::Error> {
        if recipe_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = format!(
            "SELECT recipe_id, {column} FROM {link}
             WHERE recipe_id = ANY($1)
             ORDER BY recipe_id, {column}",
            link = kind.link_table(),
            column = kind.link_column(),
        );

        let rows: Vec<(i64, i64)> = sqlx::query_as(&query)
            .bind(recipe_ids)
            .fetch_all(pool)
            .await?;

        Ok(group_pairs(rows))
    }

    /// Replaces a recipe's attachments with `ids`
    ///
    /// Runs on the caller's connection so it can share a transaction with
    /// the recipe write.
    pub(crate) async fn replace_for_recipe(
        conn: &mut PgConnection,
        kind: AttributeKind,
        recipe_id: i64,
        ids: &[i64],
    ) -> Result<(), sqlx::Error> {
        let delete = format!("DELETE FROM {} WHERE recipe_id = $1", kind.link_table());
        sqlx::query(&delete).bind(recipe_id).execute(&mut *conn).await?;

        if ids.is_empty() {
            return Ok(());
        }

        let insert = format!(
            "INSERT INTO {link} (recipe_id, {column})
             SELECT $1, UNNEST($2::BIGINT[])
             ON CONFLICT DO NOTHING",
            link = kind.link_table(),
            column = kind.link_column(),
        );
        sqlx::query(&insert)
            .bind(recipe_id)
            .bind(ids)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}

fn group_pairs(rows: Vec<(i64, i64)>) -> HashMap<i64, Vec<i64>> {
    let mut grouped: HashMap<i64, Vec<i64>> = HashMap::new();
    for (recipe_id, id) in rows {
        grouped.entry(recipe_id).or_default().push(id);
    }
    grouped
}
