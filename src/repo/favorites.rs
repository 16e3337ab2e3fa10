use std::collections::HashSet;

use sqlx::SqlitePool;

use crate::id::new_uuid_v7;
use crate::repo::wrap_unexpected;
use crate::time::now_ms;
use crate::AppResult;

pub async fn is_favorite(pool: &SqlitePool, user_id: &str, recipe_id: &str) -> AppResult<bool> {
    let row = sqlx::query("SELECT 1 FROM favorites WHERE user_id = ? AND recipe_id = ?")
        .bind(user_id)
        .bind(recipe_id)
        .fetch_optional(pool)
        .await
        .map_err(|err| wrap_unexpected(err.into(), "favorites_lookup"))?;
    Ok(row.is_some())
}

pub async fn ids_for_user(pool: &SqlitePool, user_id: &str) -> AppResult<HashSet<String>> {
    let ids = sqlx::query_scalar::<_, String>("SELECT recipe_id FROM favorites WHERE user_id = ?")
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|err| wrap_unexpected(err.into(), "favorites_list"))?;
    Ok(ids.into_iter().collect())
}

/// Marking an already-favorited recipe is a no-op.
pub async fn add(pool: &SqlitePool, user_id: &str, recipe_id: &str) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO favorites (id, user_id, recipe_id, created_at) VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT(user_id, recipe_id) DO NOTHING",
    )
    .bind(new_uuid_v7())
    .bind(user_id)
    .bind(recipe_id)
    .bind(now_ms())
    .execute(pool)
    .await
    .map_err(|err| wrap_unexpected(err.into(), "favorites_add"))?;
    Ok(())
}

/// Removing an absent favorite is a no-op.
pub async fn remove(pool: &SqlitePool, user_id: &str, recipe_id: &str) -> AppResult<()> {
    sqlx::query("DELETE FROM favorites WHERE user_id = ? AND recipe_id = ?")
        .bind(user_id)
        .bind(recipe_id)
        .execute(pool)
        .await
        .map_err(|err| wrap_unexpected(err.into(), "favorites_remove"))?;
    Ok(())
}
