//! Structural rewrites of a whole schema.
//!
//! - `to_side`: the decoded ("type") side. Transforms collapse to their `to`
//!   node; refinements are kept.
//! - `from_side`: the encoded side. Transforms collapse to their `from` node
//!   and refinements are dropped.
//! - `reverse`: a schema whose decoding is the original's encoding.
use std::sync::Arc;

use super::{
    Ast, AstKind, Declaration, Element, Property, Record, Refinement, Struct, Suspended, Transform,
    Tuple, Union,
};

pub fn to_side(ast: &Arc<Ast>) -> Arc<Ast> {
    match &ast.kind {
        AstKind::Transform(t) => to_side(&t.to),
        AstKind::Refinement(r) => rebuild(
            ast,
            AstKind::Refinement(Refinement {
                from: to_side(&r.from),
                check: r.check.clone(),
                reversed: r.reversed,
            }),
        ),
        AstKind::Lazy(s) => {
            let s = s.clone();
            rebuild(ast, AstKind::Lazy(Suspended::new(move || to_side(s.force()))))
        }
        _ => map_children(ast, to_side),
    }
}

pub fn from_side(ast: &Arc<Ast>) -> Arc<Ast> {
    match &ast.kind {
        AstKind::Transform(t) => from_side(&t.from),
        AstKind::Refinement(r) => from_side(&r.from),
        AstKind::Lazy(s) => {
            let s = s.clone();
            rebuild(ast, AstKind::Lazy(Suspended::new(move || from_side(s.force()))))
        }
        _ => map_children(ast, from_side),
    }
}

pub fn reverse(ast: &Arc<Ast>) -> Arc<Ast> {
    match &ast.kind {
        AstKind::Transform(t) => rebuild(
            ast,
            AstKind::Transform(Transform {
                from: reverse(&t.to),
                to: reverse(&t.from),
                decode: t.encode.clone(),
                encode: t.decode.clone(),
            }),
        ),
        AstKind::Refinement(r) => rebuild(
            ast,
            AstKind::Refinement(Refinement {
                from: reverse(&r.from),
                check: r.check.clone(),
                reversed: !r.reversed,
            }),
        ),
        AstKind::Declaration(d) => rebuild(
            ast,
            AstKind::Declaration(Declaration {
                id: d.id,
                type_parameters: d.type_parameters.iter().map(reverse).collect(),
                decode: d.encode.clone(),
                encode: d.decode.clone(),
            }),
        ),
        AstKind::Lazy(s) => {
            let s = s.clone();
            rebuild(ast, AstKind::Lazy(Suspended::new(move || reverse(s.force()))))
        }
        _ => map_children(ast, reverse),
    }
}

fn rebuild(original: &Arc<Ast>, kind: AstKind) -> Arc<Ast> {
    Arc::new(Ast { kind, annotations: original.annotations.clone() })
}

/// Applies `f` to the direct children of a composite node. Leaves are shared.
fn map_children(ast: &Arc<Ast>, f: fn(&Arc<Ast>) -> Arc<Ast>) -> Arc<Ast> {
    let kind = match &ast.kind {
        AstKind::Declaration(d) => AstKind::Declaration(Declaration {
            id: d.id,
            type_parameters: d.type_parameters.iter().map(f).collect(),
            decode: d.decode.clone(),
            encode: d.encode.clone(),
        }),
        AstKind::Tuple(t) => AstKind::Tuple(Tuple {
            elements: t
                .elements
                .iter()
                .map(|el| Element { ast: f(&el.ast), optional: el.optional })
                .collect(),
            rest: t.rest.as_ref().map(f),
        }),
        AstKind::Struct(s) => AstKind::Struct(Struct {
            properties: s
                .properties
                .iter()
                .map(|(k, p)| (k.clone(), Property { ast: f(&p.ast), optional: p.optional }))
                .collect(),
        }),
        AstKind::Record(r) => AstKind::Record(Record { key: f(&r.key), value: f(&r.value) }),
        AstKind::Union(u) => AstKind::Union(Union::new(u.members().iter().map(f).collect())),
        AstKind::Literal(_)
        | AstKind::Keyword(_)
        | AstKind::Lazy(_)
        | AstKind::Refinement(_)
        | AstKind::Transform(_) => return ast.clone(),
    };
    rebuild(ast, kind)
}
