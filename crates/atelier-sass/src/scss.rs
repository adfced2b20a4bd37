//! SCSS back-end using the grass crate.
//!
//! Copyright (c) 2026 Atelier Contributors
//!
//! Key components:
//! - `LocatorFs`: adapter implementing `grass::Fs` over the resource
//!   locator, so every import lookup goes through the overlay namespace
//! - `ScssEngine`: the `CompilerEngine` variant for SCSS
//!
//! grass produces no source maps of its own. In development mode the
//! engine synthesizes a version-3 map whose `sources` is the set of files
//! actually read during the compile, and appends it as an inline comment
//! for the pipeline to extract and rewrite.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use grass::{Options, OutputStyle};
use grass_compiler::codemap::SpanLoc;
use once_cell::sync::Lazy;
use regex::Regex;

use atelier_locator::ResourceLocator;
use atelier_source_map::{SourceMapDocument, inline_map_comment};

use crate::engine::{CompileOutput, CompilerEngine, CompilerVariant, OutputMode};
use crate::error::EngineError;
use crate::functions::{FunctionRegistry, SassFunction, render_variables};

/// Pulls the offending specifier out of a grass unresolved-import error.
///
/// grass renders the source line in its error output, e.g.
/// `1 | @import "foo/bar";`, which is the only place the specifier appears.
static IMPORT_SPECIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"@(?:import|use)\s+"([^"]+)""#).unwrap());

/// Adapter that implements `grass::Fs` through a `ResourceLocator`.
///
/// grass hands us paths built by joining a load path with an import
/// candidate; both halves are logical, so the joined path is looked up
/// through the locator's overlay search. Successful reads are recorded so
/// the engine can report which physical files fed the compile.
struct LocatorFs {
    locator: Arc<dyn ResourceLocator>,
    loaded: Mutex<Vec<PathBuf>>,
}

impl LocatorFs {
    fn new(locator: Arc<dyn ResourceLocator>) -> Self {
        Self {
            locator,
            loaded: Mutex::new(Vec::new()),
        }
    }

    /// The physical paths read during compilation, in read order.
    fn into_loaded(self) -> Vec<PathBuf> {
        self.loaded.into_inner().unwrap_or_default()
    }

    fn logical(path: &Path) -> String {
        path.to_string_lossy().replace('\\', "/")
    }
}

impl Debug for LocatorFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocatorFs")
            .field("locator", &"<ResourceLocator>")
            .finish()
    }
}

impl grass::Fs for LocatorFs {
    fn is_dir(&self, path: &Path) -> bool {
        self.locator.find_directory(&Self::logical(path)).is_some()
    }

    fn is_file(&self, path: &Path) -> bool {
        self.locator.find_resource(&Self::logical(path)).is_some()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let physical = self
            .locator
            .find_resource(&Self::logical(path))
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no such resource: {}", path.display()),
                )
            })?;
        let contents = std::fs::read(&physical)?;
        if let Ok(mut loaded) = self.loaded.lock() {
            if !loaded.contains(&physical) {
                loaded.push(physical);
            }
        }
        Ok(contents)
    }
}

/// Captures `@warn` and `@debug` messages emitted during a compile.
///
/// grass logs through `Options::logger` (to stderr by default); routing
/// them here is what lets the pipeline retain warnings per artifact.
#[derive(Debug, Default)]
struct RecordingLogger {
    messages: Mutex<Vec<String>>,
}

impl RecordingLogger {
    fn into_messages(self) -> Vec<String> {
        self.messages.into_inner().unwrap_or_default()
    }

    fn record(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}

impl grass::Logger for RecordingLogger {
    fn debug(&self, _location: SpanLoc, message: &str) {
        self.record(message);
    }

    fn warn(&self, _location: SpanLoc, message: &str) {
        self.record(message);
    }
}

/// The SCSS variant of the compiler engine.
///
/// Holds only per-compile state; the orchestrator constructs a fresh engine
/// (or calls `reset`) for every artifact so nothing bleeds between builds.
pub struct ScssEngine {
    locator: Arc<dyn ResourceLocator>,
    mode: OutputMode,
    import_paths: Vec<String>,
    variables: BTreeMap<String, String>,
    functions: FunctionRegistry,
}

impl ScssEngine {
    pub fn new(locator: Arc<dyn ResourceLocator>) -> Self {
        Self {
            locator,
            mode: OutputMode::default(),
            import_paths: Vec::new(),
            variables: BTreeMap::new(),
            functions: FunctionRegistry::new(),
        }
    }

    /// Assemble the source handed to grass: injected variables, then
    /// registered functions, then the entry import.
    ///
    /// Variables precede the import so they win over the theme's `!default`
    /// declarations; functions precede it so rules can call them.
    ///
    /// The entry's `.scss` extension is stripped: grass resolves
    /// extension-qualified imports only against the importing file's
    /// directory and never consults its load paths, so the bare specifier
    /// is the form that searches the include paths (and the `_partial`
    /// convention) through `LocatorFs`.
    fn assemble(&self, entry: &str) -> String {
        let specifier = entry.strip_suffix(".scss").unwrap_or(entry);
        let mut source = render_variables(&self.variables);
        source.push_str(&self.functions.render());
        source.push_str(&format!("@import \"{}\";\n", specifier));
        source
    }

    fn classify(message: String) -> EngineError {
        if message.contains("Can't find stylesheet") {
            if let Some(captures) = IMPORT_SPECIFIER.captures(&message) {
                return EngineError::UnresolvedImport {
                    specifier: captures[1].to_string(),
                };
            }
        }
        EngineError::CompilationFailed { message }
    }
}

impl CompilerEngine for ScssEngine {
    fn variant(&self) -> CompilerVariant {
        CompilerVariant::Scss
    }

    fn set_output_mode(&mut self, mode: OutputMode) {
        self.mode = mode;
    }

    fn set_import_paths(&mut self, paths: Vec<String>) {
        self.import_paths = paths;
    }

    fn import_paths(&self) -> &[String] {
        &self.import_paths
    }

    fn set_variables(&mut self, variables: BTreeMap<String, String>) {
        self.variables = variables;
    }

    fn register_function(&mut self, function: SassFunction) {
        self.functions.register(function);
    }

    fn unregister_function(&mut self, name: &str) {
        self.functions.unregister(name);
    }

    fn reset(&mut self) {
        self.mode = OutputMode::default();
        self.import_paths.clear();
        self.variables.clear();
        self.functions.clear();
    }

    fn compile(
        &mut self,
        entry: &str,
        deadline: Option<Duration>,
    ) -> Result<CompileOutput, EngineError> {
        let started = Instant::now();
        let fs = LocatorFs::new(self.locator.clone());
        let logger = RecordingLogger::default();
        let load_paths: Vec<PathBuf> = self.import_paths.iter().map(PathBuf::from).collect();

        let style = match self.mode {
            OutputMode::Production => OutputStyle::Compressed,
            OutputMode::Development => OutputStyle::Expanded,
        };

        let source = self.assemble(entry);
        let options = Options::default()
            .fs(&fs)
            .logger(&logger)
            .load_paths(&load_paths)
            .style(style);

        let result = grass::from_string(source.as_str(), &options);

        if let Some(limit) = deadline {
            if started.elapsed() > limit {
                return Err(EngineError::DeadlineExceeded { limit });
            }
        }

        let mut css = result.map_err(|e| Self::classify(e.to_string()))?;
        let loaded_sources = fs.into_loaded();
        let warnings = logger.into_messages();

        if self.mode == OutputMode::Development {
            let sources = loaded_sources
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
            let map = SourceMapDocument {
                version: 3,
                file: None,
                sources,
                sources_content: None,
                names: Vec::new(),
                mappings: String::new(),
            };
            match inline_map_comment(&map) {
                Ok(comment) => {
                    css.push_str("\n\n");
                    css.push_str(&comment);
                    css.push('\n');
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to render inline source map");
                }
            }
        }

        tracing::debug!(
            entry,
            sources = loaded_sources.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scss compile finished"
        );

        Ok(CompileOutput {
            css,
            loaded_sources,
            warnings,
        })
    }
}
