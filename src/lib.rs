// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Ulrim: Personal Quotes Library
//!
//! Stores the quotes you collect alongside a bundled set of defaults, picks
//! a quote of the day, feeds home-screen widgets and renders share cards.

pub mod config;
pub mod daily;
pub mod db;
pub mod error;
pub mod library;
pub mod prefs;
pub mod share;
pub mod sync;
pub mod web;
pub mod widget;

pub use config::AppConfig;
pub use error::{Result, UlrimError};
