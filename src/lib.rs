//! LessonLens CLI

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod files;
pub mod gemini;
pub mod interactive;
pub mod logging;
pub mod wav;
