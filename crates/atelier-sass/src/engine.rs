//! The compiler engine capability contract.
//!
//! Copyright (c) 2026 Atelier Contributors
//!
//! The build orchestrator never talks to a concrete compiler. It holds a
//! `Box<dyn CompilerEngine>` and drives it through this trait, so adding a
//! second stylesheet language means adding a variant, not touching the
//! pipeline.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::EngineError;
use crate::functions::SassFunction;

/// Which language back-end an engine wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerVariant {
    /// SCSS via the grass compiler
    Scss,
}

impl CompilerVariant {
    /// Stable identifier persisted in metadata records.
    pub fn name(self) -> &'static str {
        match self {
            CompilerVariant::Scss => "scss",
        }
    }
}

/// Output mode for a compile run.
///
/// The mode affects formatting and source-map emission only, never the
/// semantic content of the produced CSS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Minified output, no source map
    #[default]
    Production,
    /// Expanded output with an inline source map
    Development,
}

/// Result of one compile run.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// Raw compiler output, including any inline source-map comment
    pub css: String,
    /// Physical paths of every source file read during the compile
    pub loaded_sources: Vec<PathBuf>,
    /// Warnings surfaced by the engine during this run
    pub warnings: Vec<String>,
}

/// Capability set every language back-end implements.
///
/// State set through this trait (import paths, variables, functions, mode)
/// lives only until `reset` is called; the orchestrator resets engines
/// before and after every compile so nothing bleeds between unrelated
/// builds.
pub trait CompilerEngine {
    /// The language variant this engine wraps.
    fn variant(&self) -> CompilerVariant;

    /// Select production or development output.
    fn set_output_mode(&mut self, mode: OutputMode);

    /// Replace the ordered logical include paths searched for imports.
    fn set_import_paths(&mut self, paths: Vec<String>);

    /// The currently configured include paths.
    fn import_paths(&self) -> &[String];

    /// Replace the variables injected ahead of the next compile.
    fn set_variables(&mut self, variables: BTreeMap<String, String>);

    /// Register a function made available to compiled source.
    fn register_function(&mut self, function: SassFunction);

    /// Remove a previously registered function.
    fn unregister_function(&mut self, name: &str);

    /// Clear all injected state (variables, functions, import paths, mode).
    fn reset(&mut self);

    /// Compile the given entry specifier.
    ///
    /// `deadline` is a best-effort execution budget; an engine that cannot
    /// interrupt its back-end mid-run still reports an overrun as
    /// `EngineError::DeadlineExceeded`.
    fn compile(
        &mut self,
        entry: &str,
        deadline: Option<Duration>,
    ) -> Result<CompileOutput, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_name_is_stable() {
        assert_eq!(CompilerVariant::Scss.name(), "scss");
    }

    #[test]
    fn test_default_mode_is_production() {
        assert_eq!(OutputMode::default(), OutputMode::Production);
    }
}
