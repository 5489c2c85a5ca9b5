//! Type emitter.
//!
//! Lowers type-position expressions by threading the declarator text through
//! the recursion: pointers prepend `*`, arrays append `[n]`, function types
//! append `(params)`, and a declarator that already begins with `*` is
//! parenthesised before a suffix is attached. That realises the C split
//! between base type and per-name declarator without an intermediate C AST.

use super::{escape_ident, is_type_head, shape_of, CWriter, QUALIFIERS};
use crate::ast::*;
use crate::error::LowerError;

const PRIMITIVES: &[&str] = &["int", "char", "float", "double", "long", "short", "void"];

fn join_type(base: &str, declarator: &str) -> String {
    if declarator.is_empty() {
        base.to_string()
    } else {
        format!("{} {}", base, declarator)
    }
}

fn paren_if_pointer(declarator: &str) -> String {
    if declarator.starts_with('*') {
        format!("({})", declarator)
    } else {
        declarator.to_string()
    }
}

/// True for subscripts whose head is a type keyword rather than an array
/// element type.
fn is_special_subscript(expr: &Expr) -> bool {
    matches!(
        &expr.kind,
        ExprKind::Subscript { value, .. }
            if matches!(&value.kind, ExprKind::Name { id } if is_type_head(id))
    )
}

impl<'m> CWriter<'m> {
    /// Lower a type expression, attaching `declarator` (a name, `*name`,
    /// `name[n]`, or empty for abstract types) in the right position.
    pub(crate) fn type_text(
        &mut self,
        ty: &'m Expr,
        declarator: &str,
    ) -> Result<String, LowerError> {
        match &ty.kind {
            ExprKind::Name { id } => {
                self.check_reserved(id, ty.span)?;
                // Sentinel heads are not complete types on their own
                let sentinel = is_type_head(id) || matches!(id.as_str(), "sizeof" | "static_assert");
                if sentinel && !PRIMITIVES.contains(&id.as_str()) {
                    return Err(LowerError::UnrecognisedPattern {
                        span: ty.span,
                        expected: "type expression",
                        found: format!("bare `{}`", id),
                    });
                }
                if let Some(info) = self.tags.get(id) {
                    if !info.typedefd {
                        return Err(LowerError::UnrecognisedPattern {
                            span: ty.span,
                            expected: "typedef name or type[...] tag reference",
                            found: format!("bare tag `{}`", id),
                        });
                    }
                }
                Ok(join_type(&escape_ident(id), declarator))
            }

            // Pointer: -X, recursively
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand,
            } => self.type_text(operand, &format!("*{}", declarator)),

            // Pointer-to-array: +X[n]
            ExprKind::Unary {
                op: UnaryOp::Pos,
                operand,
            } => {
                let array_like = matches!(operand.kind, ExprKind::Subscript { .. })
                    && !is_special_subscript(operand);
                if !array_like {
                    return Err(LowerError::UnrecognisedPattern {
                        span: operand.span,
                        expected: "array type after unary +",
                        found: shape_of(operand).to_string(),
                    });
                }
                self.type_text(operand, &format!("*{}", declarator))
            }

            ExprKind::Subscript { value, index } => {
                self.subscript_type(ty, value, index, declarator)
            }

            ExprKind::Call {
                func,
                args,
                keywords,
            } => {
                if !keywords.is_empty() {
                    return Err(LowerError::UnrecognisedPattern {
                        span: ty.span,
                        expected: "type expression",
                        found: "call with keyword arguments".to_string(),
                    });
                }
                if let ExprKind::Tuple { elts } = &func.kind {
                    // (P1, ...)(R): function type
                    let [ret] = args.as_slice() else {
                        return Err(LowerError::UnrecognisedPattern {
                            span: ty.span,
                            expected: "single return type after parameter tuple",
                            found: format!("{} arguments", args.len()),
                        });
                    };
                    let params = self.type_param_list(elts)?;
                    let decl = format!("{}({})", paren_if_pointer(declarator), params);
                    self.type_text(ret, &decl)
                } else {
                    // R(P1, ...): pointer to function returning R
                    let params = self.type_param_list(args)?;
                    self.type_text(func, &format!("(*{})({})", declarator, params))
                }
            }

            _ => Err(LowerError::UnrecognisedPattern {
                span: ty.span,
                expected: "type expression",
                found: shape_of(ty).to_string(),
            }),
        }
    }

    fn type_param_list(&mut self, params: &'m [Expr]) -> Result<String, LowerError> {
        if params.is_empty() {
            return Ok("void".to_string());
        }
        let mut parts = Vec::with_capacity(params.len());
        for param in params {
            parts.push(self.type_text(param, "")?);
        }
        Ok(parts.join(", "))
    }

    fn subscript_type(
        &mut self,
        ty: &'m Expr,
        value: &'m Expr,
        index: &'m [Expr],
        declarator: &str,
    ) -> Result<String, LowerError> {
        if let ExprKind::Name { id } = &value.kind {
            match id.as_str() {
                // Tag references
                "type" | "enum" | "union" => {
                    let [tag] = index else {
                        return Err(LowerError::UnrecognisedPattern {
                            span: ty.span,
                            expected: "single tag name",
                            found: format!("{} subscript arguments", index.len()),
                        });
                    };
                    let ExprKind::Name { id: tag_name } = &tag.kind else {
                        return Err(LowerError::UnrecognisedPattern {
                            span: tag.span,
                            expected: "tag name",
                            found: shape_of(tag).to_string(),
                        });
                    };
                    let keyword = if id == "type" { "struct" } else { id.as_str() };
                    let base = format!("{} {}", keyword, escape_ident(tag_name));
                    return Ok(join_type(&base, declarator));
                }

                // Qualifiers and storage classes nest left-to-right
                q if QUALIFIERS.contains(&q) => {
                    let [inner] = index else {
                        return Err(LowerError::UnrecognisedPattern {
                            span: ty.span,
                            expected: "single qualified type",
                            found: format!("{} subscript arguments", index.len()),
                        });
                    };
                    let inner = self.type_text(inner, declarator)?;
                    return Ok(format!("{} {}", q, inner));
                }

                "atomic" => {
                    let [inner] = index else {
                        return Err(LowerError::UnrecognisedPattern {
                            span: ty.span,
                            expected: "single atomic base type",
                            found: format!("{} subscript arguments", index.len()),
                        });
                    };
                    let inner = self.type_text(inner, declarator)?;
                    return Ok(format!("_Atomic {}", inner));
                }

                "thread_local" => {
                    let [inner] = index else {
                        return Err(LowerError::UnrecognisedPattern {
                            span: ty.span,
                            expected: "single thread-local base type",
                            found: format!("{} subscript arguments", index.len()),
                        });
                    };
                    let inner = self.type_text(inner, declarator)?;
                    return Ok(format!("_Thread_local {}", inner));
                }

                "alignas" => {
                    let [alignment, inner] = index else {
                        return Err(LowerError::UnrecognisedPattern {
                            span: ty.span,
                            expected: "alignas[alignment, type]",
                            found: format!("{} subscript arguments", index.len()),
                        });
                    };
                    let alignment = self.expr_text(alignment)?;
                    let inner = self.type_text(inner, declarator)?;
                    return Ok(format!("_Alignas({}) {}", alignment, inner));
                }

                "list" => {
                    return match index {
                        [elem, extent] => {
                            let extent = self.expr_text(extent)?;
                            let decl = format!("{}[{}]", paren_if_pointer(declarator), extent);
                            self.type_text(elem, &decl)
                        }
                        // list[T] is the flexible member; only the struct
                        // field emitter accepts it
                        [_] => Err(LowerError::AnnotationMismatch {
                            span: ty.span,
                            message:
                                "flexible array member is only valid as the last field of a struct"
                                    .to_string(),
                        }),
                        _ => Err(LowerError::UnrecognisedPattern {
                            span: ty.span,
                            expected: "list[type] or list[type, extent]",
                            found: format!("{} subscript arguments", index.len()),
                        }),
                    };
                }

                "bit" => {
                    return Err(LowerError::AnnotationMismatch {
                        span: ty.span,
                        message: "bitfields are only valid inside a struct or union".to_string(),
                    });
                }

                "cast" | "alignof" => {
                    return Err(LowerError::UnrecognisedPattern {
                        span: ty.span,
                        expected: "type expression",
                        found: format!("`{}` form", id),
                    });
                }

                _ => {}
            }
        }

        // Plain array: collect extents outermost-in, emit innermost-first
        let mut extents = Vec::new();
        let mut element = ty;
        while let ExprKind::Subscript { value, index } = &element.kind {
            if is_special_subscript(element) {
                break;
            }
            let [extent] = index.as_slice() else {
                return Err(LowerError::UnrecognisedPattern {
                    span: element.span,
                    expected: "single array extent",
                    found: format!("{} subscript arguments", index.len()),
                });
            };
            extents.push(extent);
            element = value;
        }
        extents.reverse();

        let mut decl = paren_if_pointer(declarator);
        for extent in extents {
            let extent = self.expr_text(extent)?;
            decl.push('[');
            decl.push_str(&extent);
            decl.push(']');
        }
        self.type_text(element, &decl)
    }
}
