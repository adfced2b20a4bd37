//! Variable and function injection.
//!
//! Copyright (c) 2026 Atelier Contributors
//!
//! Theme configuration injects dynamic state into each compile: a map of
//! SCSS variables and a set of named functions. Both are rendered as an
//! SCSS prelude placed ahead of the entry import. Variables declared before
//! a theme's `!default` declarations take precedence, which is exactly the
//! override semantics the host needs.
//!
//! Registered functions are SCSS-source definitions (signature plus body)
//! rather than host callbacks; the registry only guarantees name-keyed
//! registration, unregistration and a full reset between unrelated builds.

use std::collections::BTreeMap;

/// A named SCSS function made available to compiled source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SassFunction {
    name: String,
    /// Full call signature, e.g. `theme-url($path)`
    signature: String,
    /// Function body, e.g. `@return url("/media/#{$path}");`
    body: String,
}

impl SassFunction {
    /// Define a function from its name, argument list and body.
    pub fn new(
        name: impl Into<String>,
        args: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let signature = format!("{}({})", name, args.into());
        Self {
            name,
            signature,
            body: body.into(),
        }
    }

    /// The function's registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render the definition as SCSS source.
    fn render(&self) -> String {
        format!("@function {} {{\n  {}\n}}\n", self.signature, self.body)
    }
}

/// Name-keyed registry of injected functions.
///
/// Backed by a `BTreeMap` so the rendered prelude is deterministic for a
/// given set of registrations, independent of registration order.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, SassFunction>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function, replacing any previous definition of the name.
    pub fn register(&mut self, function: SassFunction) {
        self.functions.insert(function.name.clone(), function);
    }

    /// Remove a function by name. Unknown names are ignored.
    pub fn unregister(&mut self, name: &str) {
        self.functions.remove(name);
    }

    /// Drop every registration.
    pub fn clear(&mut self) {
        self.functions.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Render all registered functions as an SCSS prelude block.
    pub fn render(&self) -> String {
        self.functions.values().map(SassFunction::render).collect()
    }
}

/// Render a variable map as SCSS declarations, one per line.
///
/// The map is ordered, so identical variable sets always render the same
/// prelude (required for idempotent rebuilds).
pub fn render_variables(variables: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (name, value) in variables {
        out.push_str(&format!("${}: {};\n", name, value));
    }
    out
}
