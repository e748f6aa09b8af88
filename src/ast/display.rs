//! Human-readable rendering of a node, used as the "expected" half of
//! `Type` error messages.
use std::fmt;

use super::{Ast, AstKind};

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = self.annotations.label() {
            return f.write_str(label);
        }
        match &self.kind {
            AstKind::Declaration(_) => f.write_str("<declaration schema>"),
            AstKind::Literal(lit) => write!(f, "{}", lit.to_value()),
            AstKind::Keyword(kw) => f.write_str(kw.name()),
            AstKind::Tuple(t) => {
                if t.elements.is_empty() {
                    return match &t.rest {
                        Some(rest) => write!(f, "array<{rest}>"),
                        None => f.write_str("[]"),
                    };
                }
                f.write_str("[")?;
                for (i, el) in t.elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}{}", el.ast, if el.optional { "?" } else { "" })?;
                }
                if let Some(rest) = &t.rest {
                    write!(f, ", ...array<{rest}>")?;
                }
                f.write_str("]")
            }
            AstKind::Struct(s) => {
                if s.properties.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                for (i, (key, prop)) in s.properties.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{key}{}: {}", if prop.optional { "?" } else { "" }, prop.ast)?;
                }
                f.write_str(" }")
            }
            AstKind::Record(r) => write!(f, "{{ [x: {}]: {} }}", r.key, r.value),
            AstKind::Union(u) => {
                for (i, member) in u.members().iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
            // never forced here: a recursive schema would not terminate
            AstKind::Lazy(_) => f.write_str("<suspended schema>"),
            AstKind::Refinement(r) => write!(f, "<refinement of {}>", r.from),
            AstKind::Transform(t) => write!(f, "({} <-> {})", t.from, t.to),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;

    #[test]
    fn renders_structural_shapes() {
        let t = tuple(
            vec![Element::required(string()), Element::optional(number())],
            Some(boolean()),
        );
        assert_eq!(t.to_string(), "[string, number?, ...array<boolean>]");

        let s = struct_([
            ("a", Property::required(string())),
            ("b", Property::optional(literal("x"))),
        ]);
        assert_eq!(s.to_string(), r#"{ a: string; b?: "x" }"#);

        let u = union(vec![literal(1i64), null()]);
        assert_eq!(u.to_string(), "1 | null");

        assert_eq!(record(string(), number()).to_string(), "{ [x: string]: number }");
        assert_eq!(array(string()).to_string(), "array<string>");
    }

    #[test]
    fn label_wins_over_structure() {
        let s = annotate(&string(), Annotations::identifier("Name"));
        assert_eq!(s.to_string(), "Name");
    }
}
