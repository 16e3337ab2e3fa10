use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};

use crate::id::new_uuid_v7;
use crate::model::{Ingredient, IngredientInput};
use crate::repo::wrap_unexpected;
use crate::time::now_ms;
use crate::AppResult;

fn deserialize_ingredient(row: SqliteRow) -> AppResult<Ingredient> {
    Ok(Ingredient {
        id: row.get("id"),
        recipe_id: row.get("recipe_id"),
        name: row.get("name"),
        grams: row.get("grams"),
        position: row.get("position"),
        created_at: row.get("created_at"),
    })
}

pub async fn list_for_recipe(pool: &SqlitePool, recipe_id: &str) -> AppResult<Vec<Ingredient>> {
    let rows = sqlx::query(
        "SELECT id, recipe_id, name, grams, position, created_at \
         FROM ingredients WHERE recipe_id = ? ORDER BY position ASC, created_at ASC, id ASC",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|err| wrap_unexpected(err.into(), "ingredients_list"))?;

    rows.into_iter().map(deserialize_ingredient).collect()
}

/// All ingredients across one user's recipes, in one query; the caller
/// groups them by `recipe_id`.
pub async fn list_for_user(pool: &SqlitePool, user_id: &str) -> AppResult<Vec<Ingredient>> {
    let rows = sqlx::query(
        "SELECT i.id, i.recipe_id, i.name, i.grams, i.position, i.created_at \
         FROM ingredients i JOIN recipes r ON r.id = i.recipe_id \
         WHERE r.user_id = ? ORDER BY i.position ASC, i.created_at ASC, i.id ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|err| wrap_unexpected(err.into(), "ingredients_list_for_user"))?;

    rows.into_iter().map(deserialize_ingredient).collect()
}

pub(crate) async fn list_in_conn(
    conn: &mut SqliteConnection,
    recipe_id: &str,
) -> AppResult<Vec<Ingredient>> {
    let rows = sqlx::query(
        "SELECT id, recipe_id, name, grams, position, created_at \
         FROM ingredients WHERE recipe_id = ? ORDER BY position ASC, created_at ASC, id ASC",
    )
    .bind(recipe_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(|err| wrap_unexpected(err.into(), "ingredients_list"))?;

    rows.into_iter().map(deserialize_ingredient).collect()
}

/// Insert the rows in order inside the caller's transaction. `position`
/// preserves presentation order even when the batch lands within one
/// millisecond.
pub(crate) async fn insert_batch(
    conn: &mut SqliteConnection,
    recipe_id: &str,
    items: &[IngredientInput],
) -> AppResult<()> {
    let now = now_ms();
    for (index, item) in items.iter().enumerate() {
        sqlx::query(
            "INSERT INTO ingredients (id, recipe_id, name, grams, position, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(new_uuid_v7())
        .bind(recipe_id)
        .bind(&item.name)
        .bind(item.grams)
        .bind(index as i64)
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(|err| wrap_unexpected(err.into(), "ingredients_insert"))?;
    }
    Ok(())
}

/// Swap a recipe's ingredient list for `items` inside the caller's
/// transaction, so a failure part-way leaves the old rows untouched.
pub(crate) async fn replace(
    conn: &mut SqliteConnection,
    recipe_id: &str,
    items: &[IngredientInput],
) -> AppResult<()> {
    sqlx::query("DELETE FROM ingredients WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await
        .map_err(|err| wrap_unexpected(err.into(), "ingredients_replace_clear"))?;

    insert_batch(conn, recipe_id, items).await
}
