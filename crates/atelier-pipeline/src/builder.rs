//! The `compile_file` build orchestrator.
//!
//! Copyright (c) 2026 Atelier Contributors
//!
//! One compile runs synchronously inside the request that triggered it:
//!
//! 1. resolve the output path (creating parent directories)
//! 2. attempt the non-blocking artifact lock; contention means another
//!    process owns this artifact and the outcome is `Skipped`
//! 3. build a fresh compiler engine and inject the current configuration
//! 4. compile; engine failures release the lock and surface as
//!    `BuildError::Compilation`
//! 5. post-process: empty-entry placeholder, source-map extraction and
//!    rewriting, checksum line or development banner
//! 6. persist atomically, record metadata, release the lock

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use atelier_locator::ResourceLocator;
use atelier_sass::{
    CompilerEngine, ImportResolver, OutputMode, SassFunction, ScssEngine,
};
use atelier_source_map::{
    MapExtraction, extract_inline_map, external_map_reference, rewrite_sources,
};

use crate::checksum::{Checksum, MetadataRecord, MetadataStore};
use crate::error::BuildError;
use crate::lock::{ArtifactLock, LockAttempt};
use crate::write::atomic_write;

/// Policy: a missing or empty entry stylesheet produces a placeholder
/// comment instead of failing the build.
///
/// Inherited behavior: the serving layer treats "theme defines no custom
/// stylesheet" as normal, so the pipeline must not hard-fail on it. Kept as
/// a named policy so the soft failure is visible and testable rather than
/// implicit.
pub const EMPTY_IMPORT_IS_NOT_AN_ERROR: bool = true;

/// Banner prepended to development-mode output.
pub const DEVELOPMENT_BANNER: &str = "/* DEVELOPMENT MODE ENABLED.
 *
 * WARNING: This file is generated automatically. Any modifications to it
 * will be lost the next time the stylesheet is rebuilt!
 *
 * Style changes belong in the theme's SCSS sources.
 */";

/// Constructor for per-compile engines.
///
/// The orchestrator never holds a concrete engine type; a fresh engine is
/// built for every compile so no state can bleed between artifacts.
type EngineFactory =
    Box<dyn Fn(Arc<dyn ResourceLocator>) -> Box<dyn CompilerEngine> + Send + Sync>;

/// Configuration handed to the builder at construction.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Production (minified + checksum line) or development (expanded +
    /// banner + source map)
    pub output_mode: OutputMode,
    /// Logical directory compiled artifacts are written under
    pub css_namespace: String,
    /// Ordered logical include paths searched for imports
    pub include_paths: Vec<String>,
    /// Public URL prefix for rewritten source-map entries
    pub public_base: String,
    /// Best-effort execution budget for a single compile
    pub deadline: Option<Duration>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_mode: OutputMode::Production,
            css_namespace: "compiled/css".to_string(),
            include_paths: Vec::new(),
            public_base: "/".to_string(),
            deadline: None,
        }
    }
}

/// Soft outcome of a compile request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// A new artifact was written
    Written { checksum: Checksum },
    /// Another process holds the artifact lock; nothing was written and the
    /// caller should serve the previous artifact
    Skipped,
}

impl CompileOutcome {
    pub fn was_written(&self) -> bool {
        matches!(self, CompileOutcome::Written { .. })
    }
}

/// Orchestrates stylesheet compilation against a resource locator.
///
/// All collaborators are injected: the locator at construction, engine
/// state per compile. Nothing reads ambient global state.
pub struct StylesheetBuilder {
    locator: Arc<dyn ResourceLocator>,
    config: BuildConfig,
    engine_factory: EngineFactory,
    variables: BTreeMap<String, String>,
    functions: Vec<SassFunction>,
    warnings: HashMap<String, Vec<String>>,
}

impl StylesheetBuilder {
    /// Create a builder compiling SCSS.
    pub fn new(locator: Arc<dyn ResourceLocator>, config: BuildConfig) -> Self {
        Self {
            locator,
            config,
            engine_factory: Box::new(|locator| Box::new(ScssEngine::new(locator))),
            variables: BTreeMap::new(),
            functions: Vec::new(),
            warnings: HashMap::new(),
        }
    }

    /// Swap the compiler variant. The pipeline itself is variant-agnostic.
    pub fn with_engine_factory(
        mut self,
        factory: impl Fn(Arc<dyn ResourceLocator>) -> Box<dyn CompilerEngine> + Send + Sync + 'static,
    ) -> Self {
        self.engine_factory = Box::new(factory);
        self
    }

    /// Replace the variables injected into the next compile.
    ///
    /// Injected state lasts for exactly one compile: `compile_file`
    /// consumes it up front, whether the build succeeds or fails, so theme
    /// configurations cannot leak into each other. A `Skipped` outcome
    /// leaves it in place for the retry.
    pub fn set_variables(&mut self, variables: BTreeMap<String, String>) {
        self.variables = variables;
    }

    /// Register a function for the next compile.
    pub fn register_function(&mut self, function: SassFunction) {
        self.functions.retain(|f| f.name() != function.name());
        self.functions.push(function);
    }

    /// Remove a previously registered function.
    pub fn unregister_function(&mut self, name: &str) {
        self.functions.retain(|f| f.name() != name);
    }

    /// Warnings recorded by the most recent compile of `name`.
    pub fn warnings(&self, name: &str) -> &[String] {
        self.warnings.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `name` needs rebuilding for content with the given checksum.
    ///
    /// This is the cheap pre-check the serving layer runs before invoking
    /// `compile_file` at all.
    pub fn should_recompile(&self, name: &str, current: &Checksum) -> bool {
        match self.locator.find_resource(&self.output_logical(name)) {
            Some(path) => MetadataStore::should_recompile(&path, current),
            None => true,
        }
    }

    /// Compile the stylesheet with the given logical name.
    ///
    /// Returns `Written` when a new artifact (plus map and metadata) was
    /// persisted, `Skipped` when another process already holds the
    /// artifact's lock. Compiler and filesystem failures are hard errors;
    /// in every case the lock is released before returning.
    pub fn compile_file(&mut self, name: &str) -> Result<CompileOutcome, BuildError> {
        let out_logical = self.output_logical(name);
        let path = self.locator.find_or_create_resource(&out_logical)?;

        // At most one concurrent compile per artifact, across processes.
        let _guard = match ArtifactLock::acquire(&path)? {
            LockAttempt::Locked(guard) => guard,
            LockAttempt::Contended => {
                tracing::debug!(name, "artifact is being compiled elsewhere, skipping");
                return Ok(CompileOutcome::Skipped);
            }
        };

        // Injected state is single-use: taken here so it cannot reach a
        // later build even when this compile fails.
        let variables = std::mem::take(&mut self.variables);
        let functions = std::mem::take(&mut self.functions);

        // Fresh engine per compile; reset first so no state survives.
        let mut engine = (self.engine_factory)(self.locator.clone());
        engine.reset();
        engine.set_output_mode(self.config.output_mode);
        engine.set_import_paths(self.config.include_paths.clone());
        engine.set_variables(variables);
        for function in functions {
            engine.register_function(function);
        }

        let entry = format!("{}.scss", name);
        let mut warnings = Vec::new();

        let resolver =
            ImportResolver::new(self.locator.clone(), self.config.include_paths.clone());
        let raw = if resolver.resolve(&entry).is_none() && EMPTY_IMPORT_IS_NOT_AN_ERROR {
            tracing::warn!(name, "entry stylesheet not found, writing placeholder");
            warnings.push(format!("entry stylesheet \"{}\" not found", entry));
            format!("/* @import \"{}\" */", entry)
        } else {
            let output = engine
                .compile(&entry, self.config.deadline)
                .map_err(|source| BuildError::Compilation {
                    name: name.to_string(),
                    source,
                })?;
            warnings.extend(output.warnings);

            // A compiler that passes the entry import through unchanged is
            // signalling an empty source; neutralize it into a comment. The
            // engine emits the entry without its extension, so match the
            // bare form.
            let import_statement = format!("@import \"{}\"", name);
            if output.css.trim_start().starts_with(&import_statement) {
                format!("/* @import \"{}\" */", entry)
            } else {
                output.css
            }
        };

        let mut css = self.detach_source_map(&raw, &path, &mut warnings)?;

        let final_css = match self.config.output_mode {
            OutputMode::Production => {
                let body_checksum = Checksum::from_bytes(css.as_bytes());
                format!("{}\n{}", body_checksum.embedded_line(), css)
            }
            OutputMode::Development => {
                if !css.ends_with('\n') {
                    css.push('\n');
                }
                format!("{}\n\n{}", DEVELOPMENT_BANNER, css)
            }
        };

        atomic_write(&path, final_css.as_bytes())?;

        let checksum = Checksum::from_bytes(final_css.as_bytes());
        MetadataStore::record(
            &path,
            &MetadataRecord::new(checksum.clone(), engine.variant().name()),
        )?;

        tracing::debug!(name, checksum = %checksum, "stylesheet compiled");
        self.warnings.insert(name.to_string(), warnings);

        Ok(CompileOutcome::Written { checksum })
    }

    /// Remove every compiled artifact, map and metadata record.
    ///
    /// The host calls this after theme changes. Only the writable cache
    /// namespace is touched.
    pub fn reset_cache(&mut self) -> Result<(), BuildError> {
        let mut dir = self.locator.writable_root().to_path_buf();
        for segment in self.config.css_namespace.split('/') {
            if !segment.is_empty() && segment != "." {
                dir.push(segment);
            }
        }
        if dir.is_dir() {
            std::fs::remove_dir_all(&dir)?;
        }
        self.warnings.clear();
        Ok(())
    }

    fn output_logical(&self, name: &str) -> String {
        format!("{}/{}.css", self.config.css_namespace, name)
    }

    /// Extract an inline source map from `raw`, rewrite its sources to
    /// public URLs and persist it as `<output>.map`, returning the
    /// stylesheet with the inline comment replaced by an external
    /// reference. Decode failures are soft: the artifact proceeds without
    /// a map.
    fn detach_source_map(
        &self,
        raw: &str,
        path: &Path,
        warnings: &mut Vec<String>,
    ) -> Result<String, BuildError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (mut css, extraction) = extract_inline_map(raw);
        match extraction {
            MapExtraction::Absent => {}
            MapExtraction::Invalid { reason } => {
                warnings.push(format!("source map discarded: {}", reason));
            }
            MapExtraction::Extracted(mut doc) => {
                doc.file = Some(file_name.clone());
                rewrite_sources(&mut doc, |physical| {
                    self.locator
                        .relativize(Path::new(physical))
                        .map(|logical| self.public_url(&logical))
                });

                let map_basename = format!("{}.map", file_name);
                let map_path = path.with_file_name(&map_basename);
                atomic_write(&map_path, &serde_json::to_vec_pretty(&doc)?)?;

                css.push_str("\n\n");
                css.push_str(&external_map_reference(&map_basename));
                css.push('\n');
            }
        }
        Ok(css)
    }

    fn public_url(&self, logical: &str) -> String {
        format!(
            "{}/{}",
            self.config.public_base.trim_end_matches('/'),
            logical
        )
    }
}
