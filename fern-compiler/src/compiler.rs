use anyhow::{Context, Result};
use fern_support::located_error;
use serde::{Deserialize, Serialize};

use crate::ast::{module_stem, Block, ContextModule, ImportNamespace, Module};
use crate::collisions::collisions;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::{Depth, DEFAULT_MAX_NESTING_DEPTH};
use crate::lexer::tokenize;
use crate::parser::parse_block_with_depth;
use crate::segment::{into_blocks, UnparsedBlock};
use crate::typechecker::{get_values_in_top_level_scope, ScopedValues, TypeChecker};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Deepest bracket or expression nesting accepted before a block is rejected.
    pub max_nesting_depth: usize,
    pub type_check: bool,
    pub detect_collisions: bool,
    /// Emit each block's tokens as `trace` events.
    pub dump_tokens: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            type_check: true,
            detect_collisions: true,
            dump_tokens: false,
        }
    }
}

impl CompileOptions {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid compile options")
    }
}

#[derive(Debug, Default)]
pub struct Compiler {
    diagnostics: Diagnostics,
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            diagnostics: Diagnostics::new(),
            options,
        }
    }

    /// Everything reported by this compiler so far, across modules.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn parse(&mut self, source: &str, name: &str) -> Module {
        self.parse_with_context(source, name).into_module()
    }

    pub fn parse_with_context(&mut self, source: &str, name: &str) -> ContextModule {
        let span = tracing::debug_span!("parse", module = %name);
        let _entered = span.enter();

        let unparsed = into_blocks(source);
        tracing::debug!(blocks = unparsed.len(), "segmented module");

        let mut module = ContextModule {
            name: name.to_string(),
            body: Vec::new(),
            unparsed_body: Vec::new(),
            errors: Vec::new(),
        };
        let mut diagnostics = Diagnostics::new();
        let depth = Depth::new(self.options.max_nesting_depth);

        for block in unparsed {
            if self.options.dump_tokens {
                let tokens = tokenize(&block.text());
                tracing::trace!(line = block.line_start, ?tokens, "block tokens");
            }
            match parse_block_with_depth(&block, depth) {
                Ok(parsed) => {
                    module.body.push(parsed);
                    module.unparsed_body.push(block);
                }
                Err(err) => {
                    tracing::debug!(line = block.line_start, error = %err, "parse error");
                    diagnostics.push(
                        DiagnosticKind::Syntax,
                        located_error(block.line_start, &block.lines, &err),
                        block.line_start,
                    );
                }
            }
        }

        if self.options.type_check {
            let imports = module.imports().cloned().collect::<Vec<_>>();
            let scope = get_values_in_top_level_scope(&module.body);
            let checker = TypeChecker::new(&module.body, &imports);
            diagnostics.extend(type_errors(&checker, &module, &scope));
        }

        if self.options.detect_collisions {
            diagnostics.extend(collision_errors(&module));
        }

        tracing::debug!(errors = diagnostics.len(), "parsed module");
        module.errors = diagnostics.messages();
        self.diagnostics.extend(diagnostics);
        module
    }

    /// Re-checks `module` with the declarations it imports from `siblings` and appends any
    /// new errors.
    pub fn add_type_errors(
        &mut self,
        mut module: ContextModule,
        siblings: &[ContextModule],
    ) -> ContextModule {
        let span = tracing::debug_span!("add_type_errors", module = %module.name);
        let _entered = span.enter();

        let imports = module.imports().cloned().collect::<Vec<_>>();
        let mut typed_blocks = module
            .body
            .iter()
            .filter(|block| block.is_typed())
            .cloned()
            .collect::<Vec<_>>();
        let mut scope = get_values_in_top_level_scope(&module.body);

        for import in imports
            .iter()
            .filter(|import| import.namespace == ImportNamespace::Relative)
        {
            let Some(sibling) = siblings
                .iter()
                .find(|sibling| module_stem(&sibling.name) == import.stem())
            else {
                continue;
            };
            tracing::debug!(sibling = %sibling.name, "merging imported declarations");
            let exposed = sibling
                .body
                .iter()
                .filter(|block| exposes(block, &import.exposing))
                .cloned()
                .collect::<Vec<_>>();
            for (name, ty) in get_values_in_top_level_scope(&exposed) {
                scope.entry(name).or_insert(ty);
            }
            typed_blocks.extend(exposed);
        }

        let checker = TypeChecker::new(&typed_blocks, &imports);
        let mut diagnostics = Diagnostics::new();
        for diagnostic in type_errors(&checker, &module, &scope).entries() {
            if !module.errors.contains(&diagnostic.message) {
                diagnostics.push_unique(diagnostic.clone());
            }
        }

        tracing::debug!(added = diagnostics.len(), "cross-module type errors");
        module.errors.extend(diagnostics.messages());
        self.diagnostics.extend(diagnostics);
        module
    }
}

/// Whether an imported block is visible through `exposing`. Unions are visible when any of
/// their tags is.
fn exposes(block: &Block, exposing: &[String]) -> bool {
    let is_exposed = |name: &str| exposing.iter().any(|exposed| exposed == name);
    match block {
        Block::UnionType(union) => {
            is_exposed(&union.type_.name) || union.tags.iter().any(|tag| is_exposed(&tag.name))
        }
        other => other.declared_name().is_some_and(is_exposed),
    }
}

fn type_errors(
    checker: &TypeChecker<'_>,
    module: &ContextModule,
    scope: &ScopedValues,
) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    for (block, unparsed) in module.body.iter().zip(&module.unparsed_body) {
        if !block.is_typed() {
            continue;
        }
        if let Err(err) = checker.validate(block, scope) {
            tracing::debug!(line = unparsed.line_start, error = %err, "type error");
            diagnostics.push(
                DiagnosticKind::Type,
                located_error(unparsed.line_start, &unparsed.lines, &err),
                unparsed.line_start,
            );
        }
    }
    diagnostics
}

fn collision_errors(module: &ContextModule) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    for collision in collisions(&module.body) {
        let locations = collision
            .indexes
            .iter()
            .filter_map(|&index| module.unparsed_body.get(index))
            .collect::<Vec<&UnparsedBlock>>();
        let Some(first) = locations.first() else {
            continue;
        };
        let mut message = format!(
            "The name `{}` has been used for different things.",
            collision.name
        );
        for location in &locations {
            message.push('\n');
            message.push_str(&located_error(
                location.line_start,
                &location.lines,
                format!("`{}` is introduced here", collision.name),
            ));
        }
        diagnostics.push_unique(Diagnostic {
            message,
            kind: DiagnosticKind::Collision,
            line: Some(first.line_start),
        });
    }
    diagnostics
}

/// Parses a module with the default options.
pub fn parse(source: &str, name: &str) -> Module {
    Compiler::default().parse(source, name)
}

pub fn parse_with_context(source: &str, name: &str) -> ContextModule {
    Compiler::default().parse_with_context(source, name)
}

pub fn add_type_errors(module: ContextModule, siblings: &[ContextModule]) -> ContextModule {
    Compiler::default().add_type_errors(module, siblings)
}
