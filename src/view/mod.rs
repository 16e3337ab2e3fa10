pub mod detail;
pub mod editor;
pub mod list;

use crate::routes::Route;

/// Outcome of loading a screen for a recipe id the user may not own:
/// either the populated view or the route to fall back to.
#[derive(Debug)]
pub enum Loaded<T> {
    Ready(T),
    Redirect(Route),
}
