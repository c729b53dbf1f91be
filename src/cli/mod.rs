pub mod admin;
pub mod convert;
pub mod market;
pub mod setup;
pub mod ui;
