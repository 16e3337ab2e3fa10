use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, warn};

pub mod db;
pub mod error;
pub mod guard;
pub mod id;
pub mod logging;
pub mod migrate;
pub mod model;
pub mod repo;
pub mod routes;
pub mod session;
pub mod state;
pub mod time;
pub mod view;

pub use error::{AppError, AppResult};
pub use model::{
    Favorite, Ingredient, IngredientInput, MealKind, Recipe, RecipeInput, RecipeWithIngredients,
    User,
};
pub use routes::Route;
pub use session::{require_user, sign_out, SessionHandle, UserIdentity};
pub use state::AppState;
pub use view::{
    detail::RecipeDetail,
    editor::{DraftError, EditorMode, IngredientDraft, RecipeDraft, RecipeEditor},
    list::{ListFilter, ListState, RecipeListView},
    Loaded,
};

/// Filename of the journal database inside the data directory.
pub const DB_FILENAME: &str = "ladle.sqlite3";

/// Where the journal database lives. `LADLE_FAKE_APPDATA` overrides the
/// platform data directory so tests can point at a tempdir.
pub fn default_db_path() -> anyhow::Result<PathBuf> {
    if let Ok(fake) = std::env::var("LADLE_FAKE_APPDATA") {
        return Ok(PathBuf::from(fake).join(DB_FILENAME));
    }

    let base = dirs::data_dir()
        .or_else(|| std::env::current_dir().ok())
        .ok_or_else(|| anyhow::anyhow!("failed to resolve application data directory"))?;
    Ok(base.join("ladle").join(DB_FILENAME))
}

/// Open the database, bring the schema up to date, and capture the
/// startup health report. This is the composition root a shell calls
/// once before constructing views.
pub async fn bootstrap(db_path: &Path) -> anyhow::Result<AppState> {
    let pool = db::open_sqlite_pool(db_path).await?;
    migrate::apply_migrations(&pool)
        .await
        .context("apply database migrations")?;

    let report = db::health::run_health_checks(&pool)
        .await
        .context("run startup health checks")?;
    if !matches!(report.status, db::health::DbHealthStatus::Ok) {
        warn!(
            target: "ladle",
            event = "startup_health_failed",
            status = ?report.status,
            offenders = report.offenders.len()
        );
    }

    let state = AppState::new(pool, SessionHandle::in_memory(), report);
    info!(target: "ladle", event = "app_ready", db = %db_path.display());
    Ok(state)
}
