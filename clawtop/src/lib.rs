//! Terminal front end for clawtop: settings, filters, event loop and panels.

pub mod app;
pub mod config;
pub mod filters;
pub mod history;
pub mod ui;
