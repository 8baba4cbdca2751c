//! Proton Mail Tray Library
//!
//! Core process-lifecycle logic shared by the tray binary: path resolution,
//! process-table inspection, launch / terminate control and the exit watcher.

pub mod config;
pub mod error;
pub mod monitor;
pub mod paths;
pub mod process;
pub mod tray;
