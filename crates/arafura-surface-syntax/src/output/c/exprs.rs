//! Expression emitter.
//!
//! Value-position lowering, including every wildcard form. Recognition is
//! always a direct shape check on the node and, where needed, one child -
//! never a lookahead or a scope lookup.

use super::tags::TagKind;
use super::{escape_ident, is_type_head, shape_of, CWriter, WILDCARD};
use crate::ast::*;
use crate::error::LowerError;

/// Type of one brace-init element, given the type of the whole initialiser:
/// arrays peel one layer, everything else passes through.
fn element_type(ty: &Expr) -> &Expr {
    match &ty.kind {
        ExprKind::Subscript { value, index } => {
            if let ExprKind::Name { id } = &value.kind {
                if id == "list" && !index.is_empty() {
                    return &index[0];
                }
                if is_type_head(id) {
                    return ty;
                }
            }
            value
        }
        _ => ty,
    }
}

impl<'m> CWriter<'m> {
    pub(crate) fn expr_text(&mut self, expr: &'m Expr) -> Result<String, LowerError> {
        match &expr.kind {
            ExprKind::Name { id } => {
                self.check_reserved(id, expr.span)?;
                Ok(escape_ident(id))
            }

            ExprKind::Num { text } => Ok(text.clone()),
            ExprKind::Str { value } => Ok(format!("\"{}\"", value)),
            ExprKind::Bool { value } => Ok(if *value { "1" } else { "0" }.to_string()),
            ExprKind::NoneLit => Ok("NULL".to_string()),

            ExprKind::Binary { left, op, right } => self.binary_text(expr, left, *op, right),

            ExprKind::Unary { op, operand } => {
                let token = match op {
                    UnaryOp::Not => "!",
                    UnaryOp::Neg => "-",
                    UnaryOp::Pos => "+",
                    UnaryOp::Invert => "~",
                };
                let operand = self.expr_text(operand)?;
                Ok(format!("{}{}", token, operand))
            }

            ExprKind::Boolean { op, values } => {
                let token = match op {
                    BoolOp::And => " && ",
                    BoolOp::Or => " || ",
                };
                let mut parts = Vec::with_capacity(values.len());
                for value in values {
                    parts.push(format!("({})", self.expr_text(value)?));
                }
                Ok(format!("({})", parts.join(token)))
            }

            ExprKind::Compare {
                left,
                ops,
                comparators,
            } => {
                let ([op], [right]) = (ops.as_slice(), comparators.as_slice()) else {
                    return Err(LowerError::UnrecognisedPattern {
                        span: expr.span,
                        expected: "binary comparison",
                        found: "chained comparison".to_string(),
                    });
                };
                let token = match op {
                    CmpOp::Eq => "==",
                    CmpOp::Ne => "!=",
                    CmpOp::Lt => "<",
                    CmpOp::Le => "<=",
                    CmpOp::Gt => ">",
                    CmpOp::Ge => ">=",
                };
                let left = self.expr_text(left)?;
                let right = self.expr_text(right)?;
                Ok(format!("{} {} {}", left, token, right))
            }

            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                let test = self.expr_text(test)?;
                let consequent = self.expr_text(consequent)?;
                let alternate = self.expr_text(alternate)?;
                Ok(format!("({} ? {} : {})", test, consequent, alternate))
            }

            ExprKind::Walrus { target, value } => {
                self.check_reserved(target, expr.span)?;
                let value = self.expr_text(value)?;
                Ok(format!("({} = {})", escape_ident(target), value))
            }

            ExprKind::Attribute { value, attr } => self.attribute_text(expr, value, attr),

            ExprKind::Subscript { value, index } => self.subscript_text(expr, value, index),

            ExprKind::Call {
                func,
                args,
                keywords,
            } => self.call_text(expr, func, args, keywords),

            ExprKind::Tuple { elts } => {
                let mut parts = Vec::with_capacity(elts.len());
                for elt in elts {
                    parts.push(self.expr_text(elt)?);
                }
                Ok(parts.join(", "))
            }

            ExprKind::List { elts } => {
                let element_ctx = self.ctx.last().copied().map(element_type);
                if let Some(ty) = element_ctx {
                    self.ctx.push(ty);
                }
                let mut parts = Vec::with_capacity(elts.len());
                let mut result = Ok(());
                for elt in elts {
                    match self.expr_text(elt) {
                        Ok(text) => parts.push(text),
                        Err(err) => {
                            result = Err(err);
                            break;
                        }
                    }
                }
                if element_ctx.is_some() {
                    self.ctx.pop();
                }
                result?;
                Ok(format!("{{{}}}", parts.join(", ")))
            }

            ExprKind::Dict { items } => {
                let element_ctx = self.ctx.last().copied().map(element_type);
                if let Some(ty) = element_ctx {
                    self.ctx.push(ty);
                }
                let mut parts = Vec::with_capacity(items.len());
                let mut result = Ok(());
                for (key, value) in items {
                    let item = self
                        .expr_text(key)
                        .and_then(|k| Ok((k, self.expr_text(value)?)));
                    match item {
                        Ok((k, v)) => parts.push(format!("[{}] = {}", k, v)),
                        Err(err) => {
                            result = Err(err);
                            break;
                        }
                    }
                }
                if element_ctx.is_some() {
                    self.ctx.pop();
                }
                result?;
                Ok(format!("{{{}}}", parts.join(", ")))
            }
        }
    }

    fn binary_text(
        &mut self,
        expr: &'m Expr,
        left: &'m Expr,
        op: BinOp,
        right: &'m Expr,
    ) -> Result<String, LowerError> {
        // ** and // are the increment/decrement encodings; nothing else
        if matches!(op, BinOp::Pow | BinOp::FloorDiv) {
            let (pre, post) = match op {
                BinOp::Pow => ("++", "++"),
                _ => ("--", "--"),
            };
            if right.is_name(WILDCARD) {
                let left = self.expr_text(left)?;
                return Ok(format!("{}{}", left, post));
            }
            if left.is_name(WILDCARD) {
                let right = self.expr_text(right)?;
                return Ok(format!("{}{}", pre, right));
            }
            return Err(LowerError::UnrecognisedPattern {
                span: expr.span,
                expected: "wildcard increment/decrement operand",
                found: if op == BinOp::Pow {
                    "arithmetic `**`".to_string()
                } else {
                    "arithmetic `//`".to_string()
                },
            });
        }

        let token = match op {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Pow | BinOp::FloorDiv => unreachable!("handled above"),
        };
        let left = self.expr_text(left)?;
        let right = self.expr_text(right)?;
        Ok(format!("({} {} {})", left, token, right))
    }

    fn attribute_text(
        &mut self,
        expr: &'m Expr,
        value: &'m Expr,
        attr: &'m str,
    ) -> Result<String, LowerError> {
        // e.W: dereference
        if attr == WILDCARD {
            let value = self.expr_text(value)?;
            return Ok(format!("(*{})", value));
        }

        // p.W.x: pointer member access, one recognised form
        if let ExprKind::Attribute {
            value: base,
            attr: mid,
        } = &value.kind
        {
            if mid == WILDCARD {
                let base = self.expr_text(base)?;
                return Ok(format!("{}->{}", base, escape_ident(attr)));
            }
        }

        // W.x: address-of the attribute chain
        if value.is_name(WILDCARD) {
            return Ok(format!("&{}", escape_ident(attr)));
        }

        self.check_reserved(attr, expr.span)?;
        let value = self.expr_text(value)?;
        Ok(format!("{}.{}", value, escape_ident(attr)))
    }

    fn subscript_text(
        &mut self,
        expr: &'m Expr,
        value: &'m Expr,
        index: &'m [Expr],
    ) -> Result<String, LowerError> {
        if let ExprKind::Name { id } = &value.kind {
            if id == "alignof" {
                let [ty] = index else {
                    return Err(LowerError::UnrecognisedPattern {
                        span: expr.span,
                        expected: "alignof[type]",
                        found: format!("{} subscript arguments", index.len()),
                    });
                };
                let ty = self.type_text(ty, "")?;
                return Ok(format!("_Alignof({})", ty));
            }
            if is_type_head(id) {
                return Err(LowerError::UnrecognisedPattern {
                    span: expr.span,
                    expected: "value expression",
                    found: format!("`{}` type form", id),
                });
            }
        }

        let [idx] = index else {
            return Err(LowerError::UnrecognisedPattern {
                span: expr.span,
                expected: "single subscript index",
                found: format!("{} subscript arguments", index.len()),
            });
        };
        let value = self.expr_text(value)?;
        let idx = self.expr_text(idx)?;
        Ok(format!("{}[{}]", value, idx))
    }

    fn call_text(
        &mut self,
        expr: &'m Expr,
        func: &'m Expr,
        args: &'m [Expr],
        keywords: &'m [Keyword],
    ) -> Result<String, LowerError> {
        // Cast: [T](e)
        if let ExprKind::List { elts } = &func.kind {
            let ([ty], [arg]) = (elts.as_slice(), args) else {
                return Err(LowerError::UnrecognisedPattern {
                    span: expr.span,
                    expected: "cast [type](expression)",
                    found: shape_of(expr).to_string(),
                });
            };
            let ty = self.type_text(ty, "")?;
            let arg = self.expr_text(arg)?;
            return Ok(format!("(({})({}))", ty, arg));
        }

        // Cast: cast[T](e)
        if let ExprKind::Subscript { value, index } = &func.kind {
            if value.is_name("cast") {
                let ([ty], [arg]) = (index.as_slice(), args) else {
                    return Err(LowerError::UnrecognisedPattern {
                        span: expr.span,
                        expected: "cast[type](expression)",
                        found: shape_of(expr).to_string(),
                    });
                };
                let ty = self.type_text(ty, "")?;
                let arg = self.expr_text(arg)?;
                return Ok(format!("(({})({}))", ty, arg));
            }
        }

        if let ExprKind::Name { id } = &func.kind {
            match id.as_str() {
                "sizeof" if args.len() == 1 && keywords.is_empty() => {
                    return self.sizeof_text(&args[0]);
                }

                "static_assert" => {
                    let mut parts = Vec::with_capacity(args.len());
                    for arg in args {
                        parts.push(self.expr_text(arg)?);
                    }
                    return Ok(format!("_Static_assert({})", parts.join(", ")));
                }

                // W(k=v, ...): compound literal from the contextual type
                WILDCARD => {
                    if keywords.is_empty() || !args.is_empty() {
                        return Err(LowerError::UnrecognisedPattern {
                            span: expr.span,
                            expected: "designated initialiser keywords on the wildcard",
                            found: "positional arguments".to_string(),
                        });
                    }
                    let Some(ctx_ty) = self.ctx.last().copied() else {
                        return Err(LowerError::MissingContext { span: expr.span });
                    };
                    let ty = self.type_text(ctx_ty, "")?;
                    let fields = self.designated_fields(keywords)?;
                    return Ok(format!("({}){{{}}}", ty, fields));
                }

                _ => {
                    // Struct constructor: compound literal with an explicit cast
                    if self.tags.get(id).is_some() {
                        let ty = self.tag_type_text(id);
                        let braces = self.ctor_braces(expr.span, args, keywords)?;
                        return Ok(format!("({}){}", ty, braces));
                    }
                }
            }
        }

        // Plain call
        if !keywords.is_empty() {
            return Err(LowerError::UnrecognisedPattern {
                span: expr.span,
                expected: "positional call arguments",
                found: "keyword arguments".to_string(),
            });
        }
        let func = self.expr_text(func)?;
        let mut parts = Vec::with_capacity(args.len());
        for arg in args {
            parts.push(self.expr_text(arg)?);
        }
        Ok(format!("{}({})", func, parts.join(", ")))
    }

    fn sizeof_text(&mut self, arg: &'m Expr) -> Result<String, LowerError> {
        match &arg.kind {
            // Bare name: typedef'd tags by their typedef name, unqualified
            // tags are an error, anything else passes through
            ExprKind::Name { id } => {
                if let Some(info) = self.tags.get(id) {
                    if !info.typedefd {
                        return Err(LowerError::UnrecognisedPattern {
                            span: arg.span,
                            expected: "typedef name or type[...] tag reference",
                            found: format!("bare tag `{}`", id),
                        });
                    }
                }
                self.check_reserved(id, arg.span)?;
                Ok(format!("sizeof({})", escape_ident(id)))
            }
            // Subscripts are type forms (type[F], arrays, qualifiers)
            ExprKind::Subscript { value, .. } if !value.is_name("alignof") => {
                let ty = self.type_text(arg, "")?;
                Ok(format!("sizeof({})", ty))
            }
            // Pointer types
            ExprKind::Unary {
                op: UnaryOp::Neg | UnaryOp::Pos,
                ..
            } => {
                let ty = self.type_text(arg, "")?;
                Ok(format!("sizeof({})", ty))
            }
            // Value expression
            _ => {
                let value = self.expr_text(arg)?;
                Ok(format!("sizeof({})", value))
            }
        }
    }

    fn designated_fields(&mut self, keywords: &'m [Keyword]) -> Result<String, LowerError> {
        let mut parts = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            let value = self.expr_text(&keyword.value)?;
            parts.push(format!(".{} = {}", escape_ident(&keyword.name), value));
        }
        Ok(parts.join(", "))
    }

    /// Brace initialiser for a struct-constructor call: designated from
    /// keywords, positional otherwise.
    pub(super) fn ctor_braces(
        &mut self,
        span: Span,
        args: &'m [Expr],
        keywords: &'m [Keyword],
    ) -> Result<String, LowerError> {
        if !keywords.is_empty() {
            if !args.is_empty() {
                return Err(LowerError::UnrecognisedPattern {
                    span,
                    expected: "all-positional or all-keyword initialiser",
                    found: "mixed arguments".to_string(),
                });
            }
            let fields = self.designated_fields(keywords)?;
            return Ok(format!("{{{}}}", fields));
        }
        let mut parts = Vec::with_capacity(args.len());
        for arg in args {
            parts.push(self.expr_text(arg)?);
        }
        Ok(format!("{{{}}}", parts.join(", ")))
    }

    /// C type text for a tag referenced by bare name: the typedef name when
    /// typedef'd, the tagged form otherwise.
    pub(super) fn tag_type_text(&self, id: &str) -> String {
        match self.tags.get(id) {
            Some(info) if info.typedefd => escape_ident(id),
            Some(info) => format!("{} {}", info.kind.keyword(), escape_ident(id)),
            None => escape_ident(id),
        }
    }

    /// Tag kind helper used by the declaration emitter.
    pub(super) fn tag_kind(&self, id: &str) -> Option<TagKind> {
        self.tags.get(id).map(|info| info.kind)
    }
}
