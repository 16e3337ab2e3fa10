use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const RECIPES_NOT_FOUND: &str = "RECIPES/NOT_FOUND";
pub const RECIPES_INVALID_MEAL_KIND: &str = "RECIPES/INVALID_MEAL_KIND";
pub const GENERIC_FAIL: &str = "GENERIC/FAIL";
pub const GENERIC_FAIL_MESSAGE: &str = "Something went wrong. Please try again.";

pub const VALIDATION_TITLE_REQUIRED: &str = "VALIDATION/TITLE_REQUIRED";
pub const VALIDATION_INGREDIENT_NAME: &str = "VALIDATION/INGREDIENT_NAME";
pub const VALIDATION_INGREDIENT_GRAMS: &str = "VALIDATION/INGREDIENT_GRAMS";

/// Canonical meal categories; each recipe belongs to exactly one.
///
/// The slugs double as the storage encoding, so the list can only grow
/// behind a schema migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealKind {
    Appetizer,
    MainCourse,
    SecondCourse,
    Dessert,
}

impl MealKind {
    pub const ALL: [MealKind; 4] = [
        MealKind::Appetizer,
        MealKind::MainCourse,
        MealKind::SecondCourse,
        MealKind::Dessert,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            MealKind::Appetizer => "appetizer",
            MealKind::MainCourse => "main_course",
            MealKind::SecondCourse => "second_course",
            MealKind::Dessert => "dessert",
        }
    }

    /// Display label for selectors and detail views.
    pub const fn label(self) -> &'static str {
        match self {
            MealKind::Appetizer => "Appetizer",
            MealKind::MainCourse => "Main Course",
            MealKind::SecondCourse => "Second Course",
            MealKind::Dessert => "Dessert",
        }
    }

    pub fn iter() -> impl Iterator<Item = MealKind> {
        Self::ALL.into_iter()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid meal kind: {value}")]
pub struct MealKindError {
    value: String,
}

impl MealKindError {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl FromStr for MealKind {
    type Err = MealKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "appetizer" => Ok(MealKind::Appetizer),
            "main_course" => Ok(MealKind::MainCourse),
            "second_course" => Ok(MealKind::SecondCourse),
            "dessert" => Ok(MealKind::Dessert),
            other => Err(MealKindError::new(other)),
        }
    }
}

impl fmt::Display for MealKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub instructions: String,
    pub meal_kind: MealKind,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: String,
    pub recipe_id: String,
    pub name: String,
    pub grams: i64,
    pub position: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: String,
    pub user_id: String,
    pub recipe_id: String,
    pub created_at: i64,
}

/// Read-side composite used by the list and detail views; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeWithIngredients {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredients: Vec<Ingredient>,
    pub is_favorite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeInput {
    pub title: String,
    pub instructions: String,
    pub meal_kind: MealKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientInput {
    pub name: String,
    pub grams: i64,
}
