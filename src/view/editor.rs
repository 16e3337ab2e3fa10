use thiserror::Error;
use tracing::{error, info};

use crate::guard::ensure_db_writable;
use crate::model::{
    IngredientInput, MealKind, RecipeInput, GENERIC_FAIL, VALIDATION_INGREDIENT_GRAMS,
    VALIDATION_INGREDIENT_NAME, VALIDATION_TITLE_REQUIRED,
};
use crate::repo;
use crate::routes::Route;
use crate::session::UserIdentity;
use crate::state::AppState;
use crate::view::Loaded;
use crate::{AppError, AppResult};

const SAVE_FAILED_MESSAGE: &str = "Failed to save recipe. Please try again.";
const INGREDIENT_MESSAGE: &str = "All ingredients must have a name and valid grams.";

/// One editable ingredient row. Grams stay optional here so a cleared
/// field is representable before validation runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngredientDraft {
    pub name: String,
    pub grams: Option<i64>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("ingredient row {0} does not exist")]
    RowOutOfRange(usize),
    #[error("a recipe needs at least one ingredient row")]
    LastRow,
}

/// In-progress form state; nothing here touches the store until
/// [`RecipeEditor::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDraft {
    pub title: String,
    pub meal_kind: MealKind,
    pub instructions: String,
    pub ingredients: Vec<IngredientDraft>,
}

impl Default for RecipeDraft {
    fn default() -> Self {
        RecipeDraft {
            title: String::new(),
            meal_kind: MealKind::MainCourse,
            instructions: String::new(),
            ingredients: vec![IngredientDraft::default()],
        }
    }
}

impl RecipeDraft {
    pub fn add_ingredient(&mut self) {
        self.ingredients.push(IngredientDraft::default());
    }

    /// Remove a row, keeping the relative order of the rest. The final
    /// row cannot be removed.
    pub fn remove_ingredient(&mut self, index: usize) -> Result<(), DraftError> {
        if index >= self.ingredients.len() {
            return Err(DraftError::RowOutOfRange(index));
        }
        if self.ingredients.len() == 1 {
            return Err(DraftError::LastRow);
        }
        self.ingredients.remove(index);
        Ok(())
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_instructions(&mut self, instructions: impl Into<String>) {
        self.instructions = instructions.into();
    }

    pub fn set_meal_kind(&mut self, kind: MealKind) {
        self.meal_kind = kind;
    }

    pub fn set_ingredient_name(
        &mut self,
        index: usize,
        name: impl Into<String>,
    ) -> Result<(), DraftError> {
        let row = self
            .ingredients
            .get_mut(index)
            .ok_or(DraftError::RowOutOfRange(index))?;
        row.name = name.into();
        Ok(())
    }

    pub fn set_ingredient_grams(
        &mut self,
        index: usize,
        grams: Option<i64>,
    ) -> Result<(), DraftError> {
        let row = self
            .ingredients
            .get_mut(index)
            .ok_or(DraftError::RowOutOfRange(index))?;
        row.grams = grams;
        Ok(())
    }
}

fn validate_draft(draft: &RecipeDraft) -> AppResult<(RecipeInput, Vec<IngredientInput>)> {
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(AppError::new(
            VALIDATION_TITLE_REQUIRED,
            "Give the recipe a title.",
        ));
    }

    let mut items = Vec::with_capacity(draft.ingredients.len());
    for (index, row) in draft.ingredients.iter().enumerate() {
        let name = row.name.trim();
        if name.is_empty() {
            return Err(AppError::new(VALIDATION_INGREDIENT_NAME, INGREDIENT_MESSAGE)
                .with_context("row", index.to_string()));
        }
        let grams = match row.grams {
            Some(grams) if grams > 0 => grams,
            _ => {
                return Err(
                    AppError::new(VALIDATION_INGREDIENT_GRAMS, INGREDIENT_MESSAGE)
                        .with_context("row", index.to_string()),
                );
            }
        };
        items.push(IngredientInput {
            name: name.to_string(),
            grams,
        });
    }

    Ok((
        RecipeInput {
            title: title.to_string(),
            instructions: draft.instructions.clone(),
            meal_kind: draft.meal_kind,
        },
        items,
    ))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit { recipe_id: String },
}

/// The create/edit form screen. Validation failures and store failures
/// land in `error` while the draft stays put for another attempt.
pub struct RecipeEditor {
    state: AppState,
    user: UserIdentity,
    mode: EditorMode,
    draft: RecipeDraft,
    error: Option<AppError>,
}

impl RecipeEditor {
    /// A blank form for a new recipe.
    pub fn create(state: AppState, user: UserIdentity) -> Self {
        RecipeEditor {
            state,
            user,
            mode: EditorMode::Create,
            draft: RecipeDraft::default(),
            error: None,
        }
    }

    /// An edit form populated from the stored recipe. Asking for a
    /// recipe the user does not own lands back on the list.
    pub async fn for_recipe(
        state: AppState,
        user: UserIdentity,
        recipe_id: &str,
    ) -> AppResult<Loaded<Self>> {
        let Some(existing) =
            repo::recipes::get_with_ingredients(&state.pool, &user.user_id, recipe_id).await?
        else {
            return Ok(Loaded::Redirect(Route::Recipes));
        };

        let mut ingredients: Vec<IngredientDraft> = existing
            .ingredients
            .iter()
            .map(|item| IngredientDraft {
                name: item.name.clone(),
                grams: Some(item.grams),
            })
            .collect();
        if ingredients.is_empty() {
            ingredients.push(IngredientDraft::default());
        }

        Ok(Loaded::Ready(RecipeEditor {
            state,
            user,
            mode: EditorMode::Edit {
                recipe_id: existing.recipe.id.clone(),
            },
            draft: RecipeDraft {
                title: existing.recipe.title.clone(),
                meal_kind: existing.recipe.meal_kind,
                instructions: existing.recipe.instructions.clone(),
                ingredients,
            },
            error: None,
        }))
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn draft(&self) -> &RecipeDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut RecipeDraft {
        &mut self.draft
    }

    pub fn last_error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }

    pub fn validate(&self) -> AppResult<(RecipeInput, Vec<IngredientInput>)> {
        validate_draft(&self.draft)
    }

    /// Persist the draft. Returns the route to navigate to on success;
    /// on any failure the error is recorded and the draft is untouched.
    pub async fn save(&mut self) -> Option<Route> {
        let (input, items) = match validate_draft(&self.draft) {
            Ok(validated) => validated,
            Err(err) => {
                self.error = Some(err);
                return None;
            }
        };

        let _guard = match ensure_db_writable(&self.state) {
            Ok(guard) => guard,
            Err(err) => {
                self.error = Some(err);
                return None;
            }
        };

        let result = match &self.mode {
            EditorMode::Create => {
                repo::recipes::create(&self.state.pool, &self.user.user_id, &input, &items).await
            }
            EditorMode::Edit { recipe_id } => {
                repo::recipes::update_with_ingredients(
                    &self.state.pool,
                    &self.user.user_id,
                    recipe_id,
                    &input,
                    &items,
                )
                .await
            }
        };

        match result {
            Ok(saved) => {
                let mode = match &self.mode {
                    EditorMode::Create => "create",
                    EditorMode::Edit { .. } => "edit",
                };
                info!(
                    target: "ladle",
                    event = "recipe_saved",
                    id = %saved.recipe.id,
                    mode
                );
                self.error = None;
                Some(Route::Recipes)
            }
            Err(err) => {
                error!(target: "ladle", event = "recipe_save_failed", error = %err);
                self.error = Some(AppError::new(GENERIC_FAIL, SAVE_FAILED_MESSAGE).with_cause(err));
                None
            }
        }
    }
}
