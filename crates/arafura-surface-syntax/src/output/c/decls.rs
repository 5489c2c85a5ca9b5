//! Declaration emitter: annotated assignments, composite types, functions,
//! function-like macros and type aliases.

use super::tags::TagKind;
use super::{escape_ident, shape_of, CWriter, WILDCARD};
use crate::ast::*;
use crate::error::LowerError;

impl<'m> CWriter<'m> {
    /// `NAME: T` / `NAME: T = E`, plus the `label`, `macro` and
    /// designated-initialiser annotation forms.
    pub(super) fn write_ann_assign(
        &mut self,
        span: Span,
        target: &'m str,
        annotation: &'m Expr,
        value: Option<&'m Expr>,
    ) -> Result<(), LowerError> {
        // NAME: label
        if annotation.is_name("label") {
            if value.is_some() {
                return Err(LowerError::AnnotationMismatch {
                    span,
                    message: "a label cannot take a value".to_string(),
                });
            }
            self.check_reserved(target, span)?;
            self.raw_line(&format!("{}:", escape_ident(target)));
            return Ok(());
        }

        // NAME: macro = E
        if annotation.is_name("macro") {
            let Some(value) = value else {
                return Err(LowerError::AnnotationMismatch {
                    span,
                    message: "a macro definition needs a value".to_string(),
                });
            };
            self.check_reserved(target, span)?;
            let text = self.expr_text(value)?;
            self.line(&format!("#define {} {}", escape_ident(target), text));
            return Ok(());
        }

        self.check_reserved(target, span)?;

        // NAME: Tag(k=v, ...) - declaration with a designated initialiser
        if let ExprKind::Call {
            func,
            args,
            keywords,
        } = &annotation.kind
        {
            if let ExprKind::Name { id } = &func.kind {
                if !keywords.is_empty() && self.tag_kind(id).is_some() {
                    if !args.is_empty() {
                        return Err(LowerError::UnrecognisedPattern {
                            span,
                            expected: "all-keyword initialiser annotation",
                            found: "mixed arguments".to_string(),
                        });
                    }
                    if value.is_some() {
                        return Err(LowerError::AnnotationMismatch {
                            span,
                            message: "an initialiser annotation cannot also take a value"
                                .to_string(),
                        });
                    }
                    let ty = self.tag_type_text(id);
                    let braces = self.ctor_braces(span, args, keywords)?;
                    self.line(&format!("{} {} = {};", ty, escape_ident(target), braces));
                    return Ok(());
                }
            }
        }

        let decl = self.type_text(annotation, &escape_ident(target))?;
        match value {
            Some(value) => {
                self.ctx.push(annotation);
                let init = self.init_text(value);
                self.ctx.pop();
                self.line(&format!("{} = {};", decl, init?));
            }
            None => self.line(&format!("{};", decl)),
        }
        Ok(())
    }

    /// Initialiser of a declaration: struct constructors emit bare braces
    /// here (the declared type already names them); everything else is a
    /// plain expression.
    fn init_text(&mut self, value: &'m Expr) -> Result<String, LowerError> {
        if let ExprKind::Call {
            func,
            args,
            keywords,
        } = &value.kind
        {
            if let ExprKind::Name { id } = &func.kind {
                if self.tag_kind(id).is_some() {
                    return self.ctor_braces(value.span, args, keywords);
                }
            }
        }
        self.expr_text(value)
    }

    pub(super) fn write_class(
        &mut self,
        span: Span,
        class: &'m ClassDef,
        nested: bool,
    ) -> Result<(), LowerError> {
        let mut typedef_name: Option<String> = None;
        let mut var_names: Vec<String> = Vec::new();

        for decorator in &class.decorators {
            match decorator.name.as_str() {
                "Typedef" => {
                    let [arg] = decorator.args.as_slice() else {
                        return Err(LowerError::AnnotationMismatch {
                            span: decorator.span,
                            message: "Typedef takes exactly one name".to_string(),
                        });
                    };
                    let ExprKind::Name { id } = &arg.kind else {
                        return Err(LowerError::UnrecognisedPattern {
                            span: arg.span,
                            expected: "typedef name",
                            found: shape_of(arg).to_string(),
                        });
                    };
                    self.check_reserved(id, arg.span)?;
                    typedef_name = Some(escape_ident(id));
                }
                "Var" => {
                    if decorator.args.is_empty() {
                        return Err(LowerError::AnnotationMismatch {
                            span: decorator.span,
                            message: "Var needs at least one declarator name".to_string(),
                        });
                    }
                    for arg in &decorator.args {
                        let ExprKind::Name { id } = &arg.kind else {
                            return Err(LowerError::UnrecognisedPattern {
                                span: arg.span,
                                expected: "declarator name",
                                found: shape_of(arg).to_string(),
                            });
                        };
                        self.check_reserved(id, arg.span)?;
                        var_names.push(escape_ident(id));
                    }
                }
                other => {
                    return Err(LowerError::UnknownDecorator {
                        span: decorator.span,
                        name: other.to_string(),
                    });
                }
            }
        }

        let kind = match class.bases.as_slice() {
            [] => TagKind::Struct,
            [b] if b == "object" => TagKind::Struct,
            [b] if b == "Union" => TagKind::Union,
            [b] if b == "Enum" => TagKind::Enum,
            bases => {
                return Err(LowerError::UnrecognisedPattern {
                    span,
                    expected: "no base, object, Union or Enum",
                    found: bases.join(", "),
                });
            }
        };

        let anonymous = class.name == WILDCARD;
        if !anonymous {
            self.check_reserved(&class.name, span)?;
        }
        if anonymous && typedef_name.is_some() {
            return Err(LowerError::AnnotationMismatch {
                span,
                message: "an anonymous type cannot be typedef'd".to_string(),
            });
        }
        if anonymous && var_names.is_empty() && !nested {
            return Err(LowerError::AnnotationMismatch {
                span,
                message: "a top-level anonymous type needs Var(...) declarators".to_string(),
            });
        }

        let keyword = kind.keyword();
        if typedef_name.is_some() {
            self.line(&format!("typedef {} {} {{", keyword, escape_ident(&class.name)));
        } else if anonymous {
            self.line(&format!("{} {{", keyword));
        } else {
            self.line(&format!("{} {} {{", keyword, escape_ident(&class.name)));
        }
        self.indent += 1;

        match kind {
            TagKind::Enum => self.write_enumerators(&class.body)?,
            TagKind::Struct | TagKind::Union => self.write_fields(&class.body)?,
        }

        self.indent -= 1;
        match (typedef_name, var_names.is_empty()) {
            (Some(name), true) => self.line(&format!("}} {};", name)),
            (Some(name), false) => {
                self.line(&format!("}} {};", name));
                self.line(&format!("{} {};", name, var_names.join(", ")));
            }
            (None, false) => self.line(&format!("}} {};", var_names.join(", "))),
            (None, true) => self.line("};"),
        }
        Ok(())
    }

    fn write_enumerators(&mut self, body: &'m [Stmt]) -> Result<(), LowerError> {
        for stmt in body {
            match &stmt.kind {
                StmtKind::Assign { target, value } => {
                    let ExprKind::Name { id } = &target.kind else {
                        return Err(LowerError::UnrecognisedPattern {
                            span: stmt.span,
                            expected: "enumerator name",
                            found: shape_of(target).to_string(),
                        });
                    };
                    self.check_reserved(id, stmt.span)?;
                    let value = self.expr_text(value)?;
                    self.line(&format!("{} = {},", escape_ident(id), value));
                }
                // Bare enumerator without an explicit value
                StmtKind::Expr { value } if matches!(value.kind, ExprKind::Name { .. }) => {
                    let name = self.expr_text(value)?;
                    self.line(&format!("{},", name));
                }
                _ => {
                    return Err(LowerError::UnrecognisedPattern {
                        span: stmt.span,
                        expected: "enumerator",
                        found: "statement".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn write_fields(&mut self, body: &'m [Stmt]) -> Result<(), LowerError> {
        let last = body.len().saturating_sub(1);
        for (i, stmt) in body.iter().enumerate() {
            match &stmt.kind {
                StmtKind::AnnAssign {
                    target,
                    annotation,
                    value: None,
                } => self.write_field(stmt.span, target, annotation, i == last)?,

                StmtKind::AnnAssign { value: Some(_), .. } => {
                    return Err(LowerError::AnnotationMismatch {
                        span: stmt.span,
                        message: "fields cannot have initialisers".to_string(),
                    });
                }

                // Nested composite definition
                StmtKind::Class(class) => self.write_class(stmt.span, class, true)?,

                _ => {
                    return Err(LowerError::UnrecognisedPattern {
                        span: stmt.span,
                        expected: "field declaration",
                        found: "statement".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn write_field(
        &mut self,
        span: Span,
        name: &'m str,
        annotation: &'m Expr,
        is_last: bool,
    ) -> Result<(), LowerError> {
        if name == WILDCARD {
            return Err(LowerError::ReservedMisuse {
                span,
                name: name.to_string(),
            });
        }

        if let ExprKind::Subscript { value, index } = &annotation.kind {
            if let ExprKind::Name { id } = &value.kind {
                match (id.as_str(), index.as_slice()) {
                    // Bitfield: bit[T, width]
                    ("bit", [base, width]) => {
                        let decl = self.type_text(base, &escape_ident(name))?;
                        let width = self.expr_text(width)?;
                        self.line(&format!("{} : {};", decl, width));
                        return Ok(());
                    }
                    // Flexible array member: list[T], last field only
                    ("list", [elem]) => {
                        if !is_last {
                            return Err(LowerError::AnnotationMismatch {
                                span,
                                message: "flexible array member must be the last field"
                                    .to_string(),
                            });
                        }
                        let decl =
                            self.type_text(elem, &format!("{}[]", escape_ident(name)))?;
                        self.line(&format!("{};", decl));
                        return Ok(());
                    }
                    _ => {}
                }
            }
        }

        let decl = self.type_text(annotation, &escape_ident(name))?;
        self.line(&format!("{};", decl));
        Ok(())
    }

    /// `def` is a C function when fully annotated and a function-like macro
    /// when not annotated at all; anything in between is a mistake.
    pub(super) fn write_function(
        &mut self,
        span: Span,
        func: &'m FunctionDef,
    ) -> Result<(), LowerError> {
        if let Some(decorator) = func.decorators.first() {
            return Err(LowerError::UnknownDecorator {
                span: decorator.span,
                name: decorator.name.clone(),
            });
        }
        self.check_reserved(&func.name, span)?;

        let fully_annotated = func.params.iter().all(|p| p.annotation.is_some());
        let none_annotated = func.params.iter().all(|p| p.annotation.is_none());

        if func.returns.is_some() && fully_annotated {
            if func.vararg.is_some() {
                return Err(LowerError::AnnotationMismatch {
                    span,
                    message: "variadic parameters are only valid in macros".to_string(),
                });
            }
            return self.write_c_function(span, func);
        }
        if func.returns.is_none() && none_annotated {
            return self.write_macro(func);
        }

        Err(LowerError::AnnotationMismatch {
            span,
            message: format!(
                "`{}` mixes annotated and unannotated parameters; a function needs all, a macro none",
                func.name
            ),
        })
    }

    fn write_c_function(
        &mut self,
        span: Span,
        func: &'m FunctionDef,
    ) -> Result<(), LowerError> {
        let mut params = Vec::with_capacity(func.params.len());
        for param in &func.params {
            self.check_reserved(&param.name, param.span)?;
            if let Some(annotation) = &param.annotation {
                params.push(self.type_text(annotation, &escape_ident(&param.name))?);
            }
        }
        let params = if params.is_empty() {
            "void".to_string()
        } else {
            params.join(", ")
        };

        let Some(returns) = &func.returns else {
            return Err(LowerError::AnnotationMismatch {
                span,
                message: "a function needs a return annotation".to_string(),
            });
        };
        let signature =
            self.type_text(returns, &format!("{}({})", escape_ident(&func.name), params))?;

        self.line(&format!("{} {{", signature));
        self.indent += 1;
        for stmt in &func.body {
            self.write_stmt(stmt)?;
        }
        self.indent -= 1;
        self.line("}");
        Ok(())
    }

    fn write_macro(&mut self, func: &'m FunctionDef) -> Result<(), LowerError> {
        let mut formals: Vec<String> = Vec::with_capacity(func.params.len() + 1);
        for param in &func.params {
            self.check_reserved(&param.name, param.span)?;
            formals.push(escape_ident(&param.name));
        }
        if func.vararg.is_some() {
            formals.push("...".to_string());
        }
        let formals = formals.join(", ");
        let name = escape_ident(&func.name);

        // Single expression: a parenthesised expansion
        if let [Stmt {
            kind: StmtKind::Expr { value },
            ..
        }] = func.body.as_slice()
        {
            let body = self.expr_text(value)?;
            self.line(&format!("#define {}({}) ({})", name, formals, body));
            return Ok(());
        }

        // Multiple statements: do { ... } while (0) with continuations
        self.line(&format!("#define {}({}) do {{ \\", name, formals));
        let start = self.out.len();
        self.indent += 1;
        let mut result = Ok(());
        for stmt in &func.body {
            if let Err(err) = self.write_stmt(stmt) {
                result = Err(err);
                break;
            }
        }
        self.indent -= 1;
        let rendered = self.out.split_off(start);
        result?;
        for line in rendered.lines() {
            self.out.push_str(line);
            self.out.push_str(" \\\n");
        }
        self.line("} while (0)");
        Ok(())
    }
}
