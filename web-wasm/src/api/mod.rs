//! リモートAPI

pub mod gemini;
