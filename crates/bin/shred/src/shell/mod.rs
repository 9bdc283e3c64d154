//! Shells drive the session core against a real terminal

pub mod tui;
