use anyhow::Result;
use ladle_lib::model::{IngredientInput, MealKind, RecipeInput};
use ladle_lib::repo::{favorites, recipes};
use ladle_lib::{AppState, Loaded, RecipeDetail, Route, UserIdentity};

#[path = "util.rs"]
mod util;

fn identity(user_id: &str) -> UserIdentity {
    UserIdentity {
        user_id: user_id.to_string(),
        email: "cook@example.com".to_string(),
    }
}

async fn seed_recipe(state: &AppState, user_id: &str) -> Result<String> {
    let input = RecipeInput {
        title: "Bread".into(),
        instructions: "Mix, rest, bake.".into(),
        meal_kind: MealKind::MainCourse,
    };
    let items = vec![IngredientInput {
        name: "Flour".into(),
        grams: 500,
    }];
    let created = recipes::create(&state.pool, user_id, &input, &items).await?;
    Ok(created.recipe.id)
}

async fn load_ready(state: AppState, user: UserIdentity, recipe_id: &str) -> Result<RecipeDetail> {
    match RecipeDetail::load(state, user, recipe_id).await? {
        Loaded::Ready(detail) => Ok(detail),
        Loaded::Redirect(route) => panic!("expected detail, got redirect to {route:?}"),
    }
}

#[tokio::test]
async fn load_shows_the_recipe_with_its_ingredients() -> Result<()> {
    let state = util::memory_state().await?;
    let user = util::seed_user(&state.pool, "cook@example.com").await?;
    let recipe_id = seed_recipe(&state, &user).await?;

    let detail = load_ready(state, identity(&user), &recipe_id).await?;
    assert_eq!(detail.recipe().recipe.title, "Bread");
    assert_eq!(detail.recipe().ingredients.len(), 1);
    assert!(!detail.recipe().is_favorite);
    assert!(!detail.confirming_delete());
    Ok(())
}

#[tokio::test]
async fn loading_an_unowned_recipe_redirects_to_the_list() -> Result<()> {
    let state = util::memory_state().await?;
    let alice = util::seed_user(&state.pool, "alice@example.com").await?;
    let bob = util::seed_user(&state.pool, "bob@example.com").await?;
    let recipe_id = seed_recipe(&state, &alice).await?;

    let loaded = RecipeDetail::load(state, identity(&bob), &recipe_id).await?;
    assert!(matches!(loaded, Loaded::Redirect(Route::Recipes)));
    Ok(())
}

#[tokio::test]
async fn toggle_favorite_round_trips() -> Result<()> {
    let state = util::memory_state().await?;
    let user = util::seed_user(&state.pool, "cook@example.com").await?;
    let recipe_id = seed_recipe(&state, &user).await?;
    let pool = state.pool.clone();

    let mut detail = load_ready(state, identity(&user), &recipe_id).await?;

    detail.toggle_favorite().await?;
    assert!(detail.recipe().is_favorite);
    assert!(favorites::is_favorite(&pool, &user, &recipe_id).await?);

    detail.toggle_favorite().await?;
    assert!(!detail.recipe().is_favorite);
    assert!(!favorites::is_favorite(&pool, &user, &recipe_id).await?);
    Ok(())
}

#[tokio::test]
async fn failed_toggle_reverts_the_star() -> Result<()> {
    let state = util::memory_state().await?;
    let user = util::seed_user(&state.pool, "cook@example.com").await?;
    let recipe_id = seed_recipe(&state, &user).await?;
    let pool = state.pool.clone();

    let mut detail = load_ready(state, identity(&user), &recipe_id).await?;
    pool.close().await;

    detail
        .toggle_favorite()
        .await
        .expect_err("closed pool fails the toggle");
    assert!(!detail.recipe().is_favorite, "star reverted after failure");
    Ok(())
}

#[tokio::test]
async fn delete_requires_an_explicit_confirmation() -> Result<()> {
    let state = util::memory_state().await?;
    let user = util::seed_user(&state.pool, "cook@example.com").await?;
    let recipe_id = seed_recipe(&state, &user).await?;
    let pool = state.pool.clone();

    let mut detail = load_ready(state.clone(), identity(&user), &recipe_id).await?;

    // Without a pending confirmation nothing happens.
    assert_eq!(detail.confirm_delete().await?, None);
    assert!(recipes::get(&pool, &user, &recipe_id).await?.is_some());

    detail.request_delete();
    assert!(detail.confirming_delete());
    assert_eq!(detail.confirm_delete().await?, Some(Route::Recipes));
    assert!(recipes::get(&pool, &user, &recipe_id).await?.is_none());

    // Revisiting the deleted recipe falls back to the list.
    let reloaded = RecipeDetail::load(state, identity(&user), &recipe_id).await?;
    assert!(matches!(reloaded, Loaded::Redirect(Route::Recipes)));
    Ok(())
}

#[tokio::test]
async fn cancelling_the_confirmation_keeps_the_recipe() -> Result<()> {
    let state = util::memory_state().await?;
    let user = util::seed_user(&state.pool, "cook@example.com").await?;
    let recipe_id = seed_recipe(&state, &user).await?;
    let pool = state.pool.clone();

    let mut detail = load_ready(state, identity(&user), &recipe_id).await?;
    detail.request_delete();
    detail.cancel_delete();
    assert!(!detail.confirming_delete());

    assert_eq!(detail.confirm_delete().await?, None);
    assert!(recipes::get(&pool, &user, &recipe_id).await?.is_some());
    Ok(())
}
