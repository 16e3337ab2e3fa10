use std::collections::HashMap;

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::db::run_in_tx;
use crate::id::new_uuid_v7;
use crate::model::{
    Ingredient, IngredientInput, MealKind, Recipe, RecipeInput, RecipeWithIngredients,
    RECIPES_INVALID_MEAL_KIND, RECIPES_NOT_FOUND,
};
use crate::repo::{favorites, ingredients, wrap_unexpected};
use crate::time::now_ms;
use crate::{AppError, AppResult};

fn deserialize_recipe(row: SqliteRow) -> AppResult<Recipe> {
    let kind_raw: String = row.get("meal_kind");
    let meal_kind = kind_raw.parse::<MealKind>().map_err(|err| {
        AppError::new(
            RECIPES_INVALID_MEAL_KIND,
            "Recipe has an unrecognised meal kind.",
        )
        .with_context("value", err.value().to_string())
    })?;

    Ok(Recipe {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        instructions: row.get("instructions"),
        meal_kind,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Newest first; the id tiebreak keeps rows created in the same
/// millisecond in insertion order.
pub async fn list(pool: &SqlitePool, user_id: &str) -> AppResult<Vec<Recipe>> {
    let rows = sqlx::query(
        "SELECT id, user_id, title, instructions, meal_kind, created_at, updated_at \
         FROM recipes WHERE user_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|err| wrap_unexpected(err.into(), "recipes_list"))?;

    rows.into_iter().map(deserialize_recipe).collect()
}

/// `None` when the recipe does not exist or belongs to someone else;
/// the two cases are indistinguishable on purpose.
pub async fn get(pool: &SqlitePool, user_id: &str, id: &str) -> AppResult<Option<Recipe>> {
    let row = sqlx::query(
        "SELECT id, user_id, title, instructions, meal_kind, created_at, updated_at \
         FROM recipes WHERE id = ? AND user_id = ?",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(|err| wrap_unexpected(err.into(), "recipes_get"))?;

    row.map(deserialize_recipe).transpose()
}

/// The whole journal in three queries: recipes, every ingredient for the
/// user, and the favorite set.
pub async fn list_with_ingredients(
    pool: &SqlitePool,
    user_id: &str,
) -> AppResult<Vec<RecipeWithIngredients>> {
    let (recipes, all_ingredients, favorite_ids) = futures::try_join!(
        list(pool, user_id),
        ingredients::list_for_user(pool, user_id),
        favorites::ids_for_user(pool, user_id),
    )?;

    let mut by_recipe: HashMap<String, Vec<Ingredient>> = HashMap::new();
    for ingredient in all_ingredients {
        by_recipe
            .entry(ingredient.recipe_id.clone())
            .or_default()
            .push(ingredient);
    }

    Ok(recipes
        .into_iter()
        .map(|recipe| {
            let ingredients = by_recipe.remove(&recipe.id).unwrap_or_default();
            let is_favorite = favorite_ids.contains(&recipe.id);
            RecipeWithIngredients {
                recipe,
                ingredients,
                is_favorite,
            }
        })
        .collect())
}

pub async fn get_with_ingredients(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
) -> AppResult<Option<RecipeWithIngredients>> {
    let Some(recipe) = get(pool, user_id, id).await? else {
        return Ok(None);
    };

    let (items, is_favorite) = futures::try_join!(
        ingredients::list_for_recipe(pool, id),
        favorites::is_favorite(pool, user_id, id),
    )?;

    Ok(Some(RecipeWithIngredients {
        recipe,
        ingredients: items,
        is_favorite,
    }))
}

/// Insert the recipe and its ingredient rows in one transaction and read
/// the result back before committing.
pub async fn create(
    pool: &SqlitePool,
    user_id: &str,
    input: &RecipeInput,
    items: &[IngredientInput],
) -> AppResult<RecipeWithIngredients> {
    let id = new_uuid_v7();
    let now = now_ms();

    let mut tx = pool
        .begin()
        .await
        .map_err(|err| wrap_unexpected(err.into(), "recipes_create_begin"))?;

    sqlx::query(
        "INSERT INTO recipes (id, user_id, title, instructions, meal_kind, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(&id)
    .bind(user_id)
    .bind(&input.title)
    .bind(&input.instructions)
    .bind(input.meal_kind.as_str())
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|err| wrap_unexpected(err.into(), "recipes_create"))?;

    ingredients::insert_batch(&mut *tx, &id, items).await?;

    let row = sqlx::query(
        "SELECT id, user_id, title, instructions, meal_kind, created_at, updated_at \
         FROM recipes WHERE id = ?",
    )
    .bind(&id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|err| wrap_unexpected(err.into(), "recipes_create_fetch"))?;

    let recipe = deserialize_recipe(row)?;
    let stored = ingredients::list_in_conn(&mut *tx, &id).await?;

    tx.commit()
        .await
        .map_err(|err| wrap_unexpected(err.into(), "recipes_create_commit"))?;

    Ok(RecipeWithIngredients {
        recipe,
        ingredients: stored,
        is_favorite: false,
    })
}

/// Update the recipe fields and swap its ingredient list atomically. The
/// old ingredients survive any failure because the delete and re-insert
/// share the update's transaction.
pub async fn update_with_ingredients(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
    input: &RecipeInput,
    items: &[IngredientInput],
) -> AppResult<RecipeWithIngredients> {
    let owned_user = user_id.to_string();
    let owned_id = id.to_string();
    let owned_input = input.clone();
    let owned_items = items.to_vec();

    let (recipe, stored) = run_in_tx(pool, move |tx| {
        Box::pin(async move {
            let now = now_ms();
            let result = sqlx::query(
                "UPDATE recipes SET title = ?1, instructions = ?2, meal_kind = ?3, updated_at = ?4 \
                 WHERE id = ?5 AND user_id = ?6",
            )
            .bind(&owned_input.title)
            .bind(&owned_input.instructions)
            .bind(owned_input.meal_kind.as_str())
            .bind(now)
            .bind(&owned_id)
            .bind(&owned_user)
            .execute(&mut **tx)
            .await
            .map_err(|err| wrap_unexpected(err.into(), "recipes_update"))?;

            if result.rows_affected() == 0 {
                return Err(AppError::new(RECIPES_NOT_FOUND, "Recipe not found.")
                    .with_context("id", owned_id.clone()));
            }

            ingredients::replace(&mut **tx, &owned_id, &owned_items).await?;

            let row = sqlx::query(
                "SELECT id, user_id, title, instructions, meal_kind, created_at, updated_at \
                 FROM recipes WHERE id = ?",
            )
            .bind(&owned_id)
            .fetch_one(&mut **tx)
            .await
            .map_err(|err| wrap_unexpected(err.into(), "recipes_update_fetch"))?;

            let recipe = deserialize_recipe(row)?;
            let stored = ingredients::list_in_conn(&mut **tx, &owned_id).await?;
            Ok((recipe, stored))
        })
    })
    .await?;

    let is_favorite = favorites::is_favorite(pool, user_id, id).await?;

    Ok(RecipeWithIngredients {
        recipe,
        ingredients: stored,
        is_favorite,
    })
}

/// Returns whether a row was removed. Ingredients and favorites go with
/// the recipe via the cascading foreign keys.
pub async fn delete(pool: &SqlitePool, user_id: &str, id: &str) -> AppResult<bool> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|err| wrap_unexpected(err.into(), "recipes_delete_begin"))?;

    let result = sqlx::query("DELETE FROM recipes WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|err| wrap_unexpected(err.into(), "recipes_delete"))?;

    tx.commit()
        .await
        .map_err(|err| wrap_unexpected(err.into(), "recipes_delete_commit"))?;

    Ok(result.rows_affected() > 0)
}
