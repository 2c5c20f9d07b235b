pub mod api;
pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod validators;
