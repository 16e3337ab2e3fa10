use tracing::{info, warn};

use crate::guard::ensure_db_writable;
use crate::model::RecipeWithIngredients;
use crate::repo;
use crate::routes::Route;
use crate::session::UserIdentity;
use crate::state::AppState;
use crate::view::Loaded;
use crate::AppResult;

/// A single recipe's screen, including the two-step delete flow.
pub struct RecipeDetail {
    state: AppState,
    user: UserIdentity,
    recipe: RecipeWithIngredients,
    confirming_delete: bool,
}

impl RecipeDetail {
    /// A missing or someone else's recipe lands back on the list.
    pub async fn load(
        state: AppState,
        user: UserIdentity,
        recipe_id: &str,
    ) -> AppResult<Loaded<Self>> {
        let Some(recipe) =
            repo::recipes::get_with_ingredients(&state.pool, &user.user_id, recipe_id).await?
        else {
            return Ok(Loaded::Redirect(Route::Recipes));
        };

        Ok(Loaded::Ready(RecipeDetail {
            state,
            user,
            recipe,
            confirming_delete: false,
        }))
    }

    pub fn recipe(&self) -> &RecipeWithIngredients {
        &self.recipe
    }

    pub fn confirming_delete(&self) -> bool {
        self.confirming_delete
    }

    /// Flip the star immediately, then persist. A store failure puts the
    /// star back before the error reaches the caller.
    pub async fn toggle_favorite(&mut self) -> AppResult<()> {
        let _guard = ensure_db_writable(&self.state)?;

        let target = !self.recipe.is_favorite;
        self.recipe.is_favorite = target;

        let result = if target {
            repo::favorites::add(&self.state.pool, &self.user.user_id, &self.recipe.recipe.id).await
        } else {
            repo::favorites::remove(&self.state.pool, &self.user.user_id, &self.recipe.recipe.id)
                .await
        };

        if let Err(err) = result {
            self.recipe.is_favorite = !target;
            warn!(
                target: "ladle",
                event = "favorite_toggle_reverted",
                id = %self.recipe.recipe.id
            );
            return Err(err);
        }
        Ok(())
    }

    pub fn request_delete(&mut self) {
        self.confirming_delete = true;
    }

    pub fn cancel_delete(&mut self) {
        self.confirming_delete = false;
    }

    /// Second step of the delete flow; does nothing unless
    /// [`RecipeDetail::request_delete`] came first.
    pub async fn confirm_delete(&mut self) -> AppResult<Option<Route>> {
        if !self.confirming_delete {
            return Ok(None);
        }

        let _guard = ensure_db_writable(&self.state)?;
        let removed =
            repo::recipes::delete(&self.state.pool, &self.user.user_id, &self.recipe.recipe.id)
                .await?;
        self.confirming_delete = false;
        info!(
            target: "ladle",
            event = "recipe_deleted",
            id = %self.recipe.recipe.id,
            removed
        );
        Ok(Some(Route::Recipes))
    }
}
