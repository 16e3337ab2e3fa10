use serde::Serialize;

/// Navigation target produced by the view layer.
///
/// Views never perform navigation themselves; they hand one of these back to
/// the shell, which owns the actual transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum Route {
    Login,
    Recipes,
    RecipeNew,
    RecipeDetail { id: String },
    RecipeEdit { id: String },
}

impl Route {
    pub fn recipe_detail(id: impl Into<String>) -> Self {
        Route::RecipeDetail { id: id.into() }
    }

    pub fn recipe_edit(id: impl Into<String>) -> Self {
        Route::RecipeEdit { id: id.into() }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Recipes => "/recipes".to_string(),
            Route::RecipeNew => "/recipes/new".to_string(),
            Route::RecipeDetail { id } => format!("/recipes/{id}"),
            Route::RecipeEdit { id } => format!("/recipes/{id}/edit"),
        }
    }
}
