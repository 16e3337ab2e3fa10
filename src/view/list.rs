use tracing::{info, warn};

use crate::guard::ensure_db_writable;
use crate::model::{
    MealKind, RecipeWithIngredients, GENERIC_FAIL, GENERIC_FAIL_MESSAGE, RECIPES_NOT_FOUND,
};
use crate::repo;
use crate::session::UserIdentity;
use crate::state::AppState;
use crate::{AppError, AppResult};

const LOAD_ATTEMPTS: u32 = 2;

/// Client-side filter over an already-loaded journal. All three criteria
/// must hold for a row to show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub search: String,
    pub kind: Option<MealKind>,
    pub favorites_only: bool,
}

impl ListFilter {
    pub fn matches(&self, row: &RecipeWithIngredients) -> bool {
        let needle = self.search.trim().to_lowercase();
        if !needle.is_empty() && !row.recipe.title.to_lowercase().contains(&needle) {
            return false;
        }
        if let Some(kind) = self.kind {
            if row.recipe.meal_kind != kind {
                return false;
            }
        }
        if self.favorites_only && !row.is_favorite {
            return false;
        }
        true
    }
}

#[derive(Debug)]
pub enum ListState {
    Idle,
    Loading,
    Ready(Vec<RecipeWithIngredients>),
    Error(AppError),
}

/// The journal screen: owns the loaded rows, the filter, and the
/// mutations reachable from list cards.
pub struct RecipeListView {
    state: AppState,
    user: UserIdentity,
    list_state: ListState,
    filter: ListFilter,
}

impl RecipeListView {
    pub fn new(state: AppState, user: UserIdentity) -> Self {
        RecipeListView {
            state,
            user,
            list_state: ListState::Idle,
            filter: ListFilter::default(),
        }
    }

    /// Fetch the user's journal, retrying transient store failures once
    /// before settling on the error state.
    pub async fn load(&mut self) {
        self.list_state = ListState::Loading;
        let mut last_error: Option<AppError> = None;

        for attempt in 1..=LOAD_ATTEMPTS {
            match repo::recipes::list_with_ingredients(&self.state.pool, &self.user.user_id).await {
                Ok(rows) => {
                    info!(
                        target: "ladle",
                        event = "recipes_list_loaded",
                        count = rows.len(),
                        attempt
                    );
                    self.list_state = ListState::Ready(rows);
                    return;
                }
                Err(err) => {
                    warn!(
                        target: "ladle",
                        event = "recipes_list_load_failed",
                        attempt,
                        error = %err
                    );
                    last_error = Some(err);
                }
            }
        }

        self.list_state = ListState::Error(
            last_error.unwrap_or_else(|| AppError::new(GENERIC_FAIL, GENERIC_FAIL_MESSAGE)),
        );
    }

    pub fn state(&self) -> &ListState {
        &self.list_state
    }

    pub fn filter(&self) -> &ListFilter {
        &self.filter
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filter.search = search.into();
    }

    pub fn set_kind(&mut self, kind: Option<MealKind>) {
        self.filter.kind = kind;
    }

    pub fn set_favorites_only(&mut self, favorites_only: bool) {
        self.filter.favorites_only = favorites_only;
    }

    /// Rows passing the current filter; empty unless the list is ready.
    pub fn filtered(&self) -> Vec<&RecipeWithIngredients> {
        match &self.list_state {
            ListState::Ready(rows) => rows.iter().filter(|row| self.filter.matches(row)).collect(),
            _ => Vec::new(),
        }
    }

    /// Flip the favorite mark on a loaded row, then reload so the list
    /// reflects the store either way.
    pub async fn toggle_favorite(&mut self, recipe_id: &str) -> AppResult<()> {
        let _guard = ensure_db_writable(&self.state)?;

        let is_favorite = match &self.list_state {
            ListState::Ready(rows) => rows
                .iter()
                .find(|row| row.recipe.id == recipe_id)
                .map(|row| row.is_favorite),
            _ => None,
        };
        let Some(is_favorite) = is_favorite else {
            return Err(AppError::new(RECIPES_NOT_FOUND, "Recipe not found.")
                .with_context("id", recipe_id.to_string()));
        };

        let result = if is_favorite {
            repo::favorites::remove(&self.state.pool, &self.user.user_id, recipe_id).await
        } else {
            repo::favorites::add(&self.state.pool, &self.user.user_id, recipe_id).await
        };

        self.load().await;
        result
    }

    /// Remove a recipe from a list card. The shell asks the user first;
    /// this goes straight to the store and reloads.
    pub async fn delete_recipe(&mut self, recipe_id: &str) -> AppResult<bool> {
        let _guard = ensure_db_writable(&self.state)?;
        let removed = repo::recipes::delete(&self.state.pool, &self.user.user_id, recipe_id).await?;
        self.load().await;
        Ok(removed)
    }
}
