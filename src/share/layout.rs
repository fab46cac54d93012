// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Greedy word wrap and card text placement

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use serde::Serialize;

use crate::config::ShareConfig;

/// Measures the rendered width of a run of text
pub trait TextMeasure {
    fn measure(&self, text: &str) -> f32;
}

/// Every character advances by the same amount
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvance(pub f32);

impl TextMeasure for FixedAdvance {
    fn measure(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.0
    }
}

/// Glyph advances and kerning of a real font at a pixel size
#[derive(Clone)]
pub struct FontMeasure {
    font: FontArc,
    scale: PxScale,
}

impl FontMeasure {
    pub fn new(font: FontArc, px: f32) -> Self {
        Self {
            font,
            scale: PxScale::from(px),
        }
    }
}

impl TextMeasure for FontMeasure {
    fn measure(&self, text: &str) -> f32 {
        let scaled = self.font.as_scaled(self.scale);
        let mut width = 0.0;
        let mut previous = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        width
    }
}

/// Break `text` into lines no wider than `max_width`.
///
/// Words are separated by single spaces and packed greedily. A word that is
/// wider than `max_width` on its own gets a line to itself and is not split.
/// Newlines in the text force a break.
pub fn wrap_text(text: &str, measure: &dyn TextMeasure, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split(' ') {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };

            if measure.measure(&candidate) > max_width && !current.is_empty() {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            } else {
                current = candidate;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

/// One line of card text and the y coordinate of its baseline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardLine {
    pub text: String,
    pub baseline: f32,
}

/// Where the quote text goes on a card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardLayout {
    pub lines: Vec<CardLine>,
    pub max_width: f32,
    pub watermark_baseline: f32,
}

/// Wrap the quote and place its lines as a block just below centre
pub fn layout_card(text: &str, measure: &dyn TextMeasure, config: &ShareConfig) -> CardLayout {
    let max_width = config.text_width();
    let wrapped = wrap_text(text, measure, max_width);

    let block_height = wrapped.len() as f32 * config.line_height;
    let start = (config.height as f32 - block_height) / 2.0 + config.text_offset;

    let lines = wrapped
        .into_iter()
        .enumerate()
        .map(|(i, text)| CardLine {
            text,
            baseline: start + i as f32 * config.line_height,
        })
        .collect();

    CardLayout {
        lines,
        max_width,
        watermark_baseline: config.height as f32 - config.watermark_margin,
    }
}
