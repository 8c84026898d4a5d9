pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod leads;
pub mod models;
pub mod nav;
pub mod snackbar;
pub mod state;
