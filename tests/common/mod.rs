//! Shared helpers for the integration tests.
#![allow(dead_code)]
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use json_shape::ast::{
    self, Annotations, Ast, AstKind, DeclareFn, Element, Leaf, Property,
};
use json_shape::{ParseResult, format_errors, parser};
use serde_json::Value;

/// Yields once before resolving, like a real asynchronous check would.
pub async fn sleep() {
    tokio::task::yield_now().await;
}

/// Refinement check that suspends before accepting its input.
pub fn sleepy_leaf() -> Leaf {
    Leaf::new(|input, _options, _owner| {
        ParseResult::pending(async move {
            sleep().await;
            Ok(input)
        })
    })
}

/// Like [`sleepy_leaf`], but records that its body actually ran.
pub fn flagged_leaf(ran: Arc<AtomicBool>) -> Leaf {
    Leaf::new(move |input, _options, _owner| {
        let ran = ran.clone();
        ParseResult::pending(async move {
            ran.store(true, Ordering::SeqCst);
            sleep().await;
            Ok(input)
        })
    })
}

/// Rebuilds `ast` so every primitive leaf and declaration goes through an
/// asynchronous step. The accepted values do not change.
pub fn effectify(ast: &Arc<Ast>) -> Arc<Ast> {
    match &ast.kind {
        AstKind::Declaration(d) => {
            let type_parameters = d.type_parameters.iter().map(effectify).collect();
            ast::declare_with_id(
                d.id,
                type_parameters,
                suspend_declare(d.decode.clone()),
                suspend_declare(d.encode.clone()),
                ast.annotations.clone(),
            )
        }
        AstKind::Tuple(t) => ast::tuple(
            t.elements
                .iter()
                .map(|el| Element { ast: effectify(&el.ast), optional: el.optional })
                .collect(),
            t.rest.as_ref().map(effectify),
        ),
        AstKind::Struct(s) => ast::struct_(
            s.properties
                .iter()
                .map(|(k, p)| (k.clone(), Property { ast: effectify(&p.ast), optional: p.optional })),
        ),
        AstKind::Record(r) => ast::record(effectify(&r.key), effectify(&r.value)),
        AstKind::Union(u) => ast::union(u.members().iter().map(effectify).collect()),
        AstKind::Lazy(s) => {
            let s = s.clone();
            ast::lazy(move || effectify(s.force()))
        }
        AstKind::Refinement(r) => ast::refinement_with(
            effectify(&r.from),
            r.check.clone(),
            r.reversed,
            ast.annotations.clone(),
        ),
        AstKind::Transform(t) => ast::transform_result(
            effectify(&t.from),
            effectify(&t.to),
            t.decode.clone(),
            t.encode.clone(),
        ),
        AstKind::Literal(_) | AstKind::Keyword(_) => {
            ast::refinement(ast.clone(), sleepy_leaf(), Annotations::default())
        }
    }
}

fn suspend_declare(inner: DeclareFn) -> DeclareFn {
    DeclareFn::new(move |params| {
        let leaf = inner.call(params);
        Leaf::new(move |input, options, owner| {
            let leaf = leaf.clone();
            let options = *options;
            let owner = owner.clone();
            ParseResult::pending(async move {
                sleep().await;
                leaf.call(input, &options, &owner).resolve().await
            })
        })
    })
}

pub fn expect_message(ast: &Arc<Ast>, input: Value, message: &str) {
    let err = parser::decode_sync(ast, input).expect_err("expected a failed parse");
    assert_eq!(format_errors(&err.errors), message);
}
