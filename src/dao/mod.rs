/// Catalog loading and authoring lint.
pub mod catalog;
/// Serde models of the content file.
pub mod models;
/// Authoring validation helpers.
pub mod validation;
