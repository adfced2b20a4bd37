//! SCSS compilation for the Atelier theme pipeline.
//!
//! Copyright (c) 2026 Atelier Contributors
//!
//! This crate provides:
//! - The `CompilerEngine` capability trait the build orchestrator compiles
//!   through (variant-agnostic: `scss` today, others later)
//! - `ScssEngine`, the grass-backed SCSS variant
//! - `ImportResolver`, the ordered, partial-aware import search
//! - The variable/function registry injected ahead of every compile

mod engine;
mod error;
mod functions;
mod import;
mod scss;

pub use engine::{CompileOutput, CompilerEngine, CompilerVariant, OutputMode};
pub use error::EngineError;
pub use functions::{FunctionRegistry, SassFunction, render_variables};
pub use import::ImportResolver;
pub use scss::ScssEngine;
