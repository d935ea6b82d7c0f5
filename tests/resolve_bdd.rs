//! BDD scenarios for the resolution pipeline.

mod support;

use std::cell::RefCell;

use copynet_config::{ComponentRegistry, ConfigError, ResolvedExperiment};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use support::{document, workspace, Workspace};

#[derive(Default)]
struct ResolveContext {
    workspace: RefCell<Option<Workspace>>,
    document: RefCell<Option<String>>,
    result: RefCell<Option<Result<ResolvedExperiment, ConfigError>>>,
}

#[fixture]
fn resolve_context() -> ResolveContext {
    ResolveContext::default()
}

fn stash(ctx: &ResolveContext, doc: String, workspace: Workspace) {
    ctx.document.replace(Some(doc));
    ctx.workspace.replace(Some(workspace));
}

#[given("a consistent experiment document")]
fn given_consistent(#[from(resolve_context)] ctx: &ResolveContext) {
    let workspace = workspace();
    let doc = document(&workspace);
    stash(ctx, doc, workspace);
}

#[given("a document whose encoder input size disagrees with its embedders")]
fn given_narrowed_encoder(#[from(resolve_context)] ctx: &ResolveContext) {
    let workspace = workspace();
    let doc = document(&workspace).replace("\"input_size\": 100", "\"input_size\": 99");
    stash(ctx, doc, workspace);
}

#[given("a document whose attention dimensions disagree with the encoder")]
fn given_mismatched_attention(#[from(resolve_context)] ctx: &ResolveContext) {
    let workspace = workspace();
    let doc = document(&workspace)
        .replace("\"vector_dim\": 200", "\"vector_dim\": 100")
        .replace("\"matrix_dim\": 200", "\"matrix_dim\": 150");
    stash(ctx, doc, workspace);
}

#[given("a document whose beam size is zero")]
fn given_zero_beam(#[from(resolve_context)] ctx: &ResolveContext) {
    let workspace = workspace();
    let doc = document(&workspace).replace("\"beam_size\": 5", "\"beam_size\": 0");
    stash(ctx, doc, workspace);
}

#[when("the document is resolved")]
fn when_resolved(#[from(resolve_context)] ctx: &ResolveContext) {
    let binding = ctx.document.borrow();
    let doc = binding
        .as_ref()
        .unwrap_or_else(|| panic!("document to be set"));
    let registry = ComponentRegistry::default();
    ctx.result
        .replace(Some(copynet_config::resolve_experiment(doc, &registry)));
}

#[then("resolution succeeds")]
fn then_succeeds(#[from(resolve_context)] ctx: &ResolveContext) {
    let binding = ctx.result.borrow();
    let result = binding.as_ref().unwrap_or_else(|| panic!("result to be set"));
    assert!(result.is_ok(), "expected success, got {result:?}");
}

#[then("resolution fails with {count:usize} consistency violations")]
fn then_fails_with_violations(count: usize, #[from(resolve_context)] ctx: &ResolveContext) {
    let binding = ctx.result.borrow();
    let result = binding.as_ref().unwrap_or_else(|| panic!("result to be set"));
    let Err(ConfigError::Consistency(consistency)) = result else {
        panic!("expected a consistency error, got {result:?}");
    };
    assert_eq!(consistency.violations.len(), count);
}

#[scenario(path = "tests/features/resolve.feature", index = 0)]
fn consistent_document(resolve_context: ResolveContext) {
    let _ = resolve_context;
}

#[scenario(path = "tests/features/resolve.feature", index = 1)]
fn narrowed_encoder_input(resolve_context: ResolveContext) {
    let _ = resolve_context;
}

#[scenario(path = "tests/features/resolve.feature", index = 2)]
fn mismatched_attention(resolve_context: ResolveContext) {
    let _ = resolve_context;
}

#[scenario(path = "tests/features/resolve.feature", index = 3)]
fn zero_beam_size(resolve_context: ResolveContext) {
    let _ = resolve_context;
}
