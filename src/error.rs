// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for Ulrim

use thiserror::Error;

/// Result type alias for Ulrim operations
pub type Result<T> = std::result::Result<T, UlrimError>;

/// Ulrim error types
#[derive(Error, Debug)]
pub enum UlrimError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Preference error: {0}")]
    Preferences(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Quote not found: {0}")]
    NotFound(i64),
}
