//! UI module root: exposes drawing functions for individual panels.

pub mod crons;
pub mod events;
pub mod header;
pub mod host;
pub mod sessions;
pub mod theme;
pub mod tokens;
pub mod util;
