//! Local meme library: a SQLite metadata store, an on-disk image store with
//! thumbnails, and a terminal UI over both.

pub mod app;
pub mod assets;
pub mod clipboard;
pub mod config;
pub mod db;
pub mod logging;
pub mod ui;
