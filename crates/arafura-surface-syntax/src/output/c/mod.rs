//! C writer for the surface-syntax AST.
//!
//! Lowering is pattern-directed: each C construct is recognised by a local
//! syntactic shape, dispatched over the AST variant plus, for a few nodes, a
//! secondary discriminator on a child. The walk is split by grammatical
//! category: statements here, types in [`types`], expressions in [`exprs`],
//! declarations in [`decls`], and the tag pre-pass in [`tags`].

pub mod tags;

mod decls;
mod exprs;
mod types;

use crate::ast::*;
use crate::error::LowerError;
use tags::TagSet;

/// The reserved wildcard identifier.
pub(crate) const WILDCARD: &str = "W";

/// Heads that make a subscript a type form rather than an array extent.
pub(crate) const QUALIFIERS: &[&str] = &[
    "const", "volatile", "unsigned", "signed", "static", "extern", "long", "short",
];

pub(crate) fn is_type_head(id: &str) -> bool {
    matches!(
        id,
        "type" | "enum" | "union" | "list" | "bit" | "atomic" | "thread_local" | "alignas"
            | "cast" | "alignof"
    ) || QUALIFIERS.contains(&id)
}

/// Strip the two-underscore escape: `___` emits as `_`, `__FILE__` as
/// `FILE__`. `__VA_ARGS__` is exempt so variadic macro bodies survive.
pub(crate) fn escape_ident(name: &str) -> String {
    if name == "__VA_ARGS__" {
        return name.to_string();
    }
    match name.strip_prefix("__") {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => name.to_string(),
    }
}

/// True when an `if` test selects the preprocessor encoding.
pub(crate) fn is_pp_test(test: &Expr) -> bool {
    matches!(&test.kind, ExprKind::List { elts } if elts.len() == 1)
}

/// Short description of a node shape for diagnostics.
pub(crate) fn shape_of(expr: &Expr) -> &'static str {
    match &expr.kind {
        ExprKind::Name { .. } => "name",
        ExprKind::Num { .. } => "number",
        ExprKind::Str { .. } => "string",
        ExprKind::Bool { .. } | ExprKind::NoneLit => "constant",
        ExprKind::Tuple { .. } => "tuple",
        ExprKind::List { .. } => "list literal",
        ExprKind::Dict { .. } => "dict literal",
        ExprKind::Binary { .. } => "binary operator",
        ExprKind::Unary { .. } => "unary operator",
        ExprKind::Boolean { .. } => "boolean operator",
        ExprKind::Compare { .. } => "comparison",
        ExprKind::Call { .. } => "call",
        ExprKind::Attribute { .. } => "attribute",
        ExprKind::Subscript { .. } => "subscript",
        ExprKind::Conditional { .. } => "conditional expression",
        ExprKind::Walrus { .. } => "assignment expression",
    }
}

/// Emits the AST as C text.
///
/// Owns the output buffer, the tag set and the contextual-type stack; the
/// stack is pushed on entry to a declaration and per brace-init element, and
/// consulted only by wildcard compound literals.
pub struct CWriter<'m> {
    out: String,
    indent: usize,
    tags: TagSet,
    ctx: Vec<&'m Expr>,
}

impl<'m> CWriter<'m> {
    /// Lower a module to C source.
    pub fn emit(module: &'m Module) -> Result<String, LowerError> {
        let mut writer = CWriter {
            out: String::new(),
            indent: 0,
            tags: TagSet::collect(module),
            ctx: Vec::new(),
        };
        writer.write_module(module)?;
        Ok(writer.out)
    }

    fn write_module(&mut self, module: &'m Module) -> Result<(), LowerError> {
        for stmt in &module.body {
            self.write_stmt(stmt)?;
        }
        Ok(())
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// A line pinned to column 0 (labels).
    fn raw_line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    pub(crate) fn check_reserved(&self, id: &str, span: Span) -> Result<(), LowerError> {
        if id == WILDCARD || id == "label" || id == "macro" {
            return Err(LowerError::ReservedMisuse {
                span,
                name: id.to_string(),
            });
        }
        Ok(())
    }

    fn write_stmt(&mut self, stmt: &'m Stmt) -> Result<(), LowerError> {
        match &stmt.kind {
            StmtKind::Import { modules } => {
                for module in modules {
                    self.line(&format!("#include \"{}.h\"", module));
                }
                Ok(())
            }

            StmtKind::ImportFrom { module, wildcard } => {
                if *wildcard {
                    self.line(&format!("#include <{}.h>", module));
                } else {
                    self.line(&format!("#include \"{}.h\"", module));
                }
                Ok(())
            }

            StmtKind::AnnAssign {
                target,
                annotation,
                value,
            } => self.write_ann_assign(stmt.span, target, annotation, value.as_ref()),

            StmtKind::Assign { target, value } => {
                let target = self.expr_text(target)?;
                let value = self.expr_text(value)?;
                self.line(&format!("{} = {};", target, value));
                Ok(())
            }

            StmtKind::AugAssign { target, op, value } => {
                let token = match op {
                    BinOp::Add => "+=",
                    BinOp::Sub => "-=",
                    BinOp::Mul => "*=",
                    BinOp::Div => "/=",
                    BinOp::Mod => "%=",
                    BinOp::BitAnd => "&=",
                    BinOp::BitOr => "|=",
                    BinOp::BitXor => "^=",
                    BinOp::Shl => "<<=",
                    BinOp::Shr => ">>=",
                    BinOp::Pow | BinOp::FloorDiv => {
                        return Err(LowerError::UnrecognisedPattern {
                            span: stmt.span,
                            expected: "augmented assignment operator",
                            found: "`**=` or `//=`".to_string(),
                        });
                    }
                };
                let target = self.expr_text(target)?;
                let value = self.expr_text(value)?;
                self.line(&format!("{} {} {};", target, token, value));
                Ok(())
            }

            StmtKind::Expr { value } => {
                let text = self.expr_text(value)?;
                self.line(&format!("{};", text));
                Ok(())
            }

            StmtKind::If { test, body, orelse } => {
                if is_pp_test(test) {
                    self.write_preprocessor_if(test, body, orelse, true)
                } else {
                    self.write_runtime_if(test, body, orelse)
                }
            }

            StmtKind::While { test, body } => self.write_while(test, body),

            StmtKind::For {
                targets,
                iter,
                body,
            } => self.write_c_for(stmt.span, targets, iter, body),

            StmtKind::Match { subject, cases } => self.write_switch(subject, cases),

            StmtKind::Return { value } => {
                match value {
                    Some(v) => {
                        let text = self.expr_text(v)?;
                        self.line(&format!("return {};", text));
                    }
                    None => self.line("return;"),
                }
                Ok(())
            }

            StmtKind::Break => {
                self.line("break;");
                Ok(())
            }

            StmtKind::Continue => {
                self.line("continue;");
                Ok(())
            }

            StmtKind::Raise { exc } => {
                let ExprKind::Name { id } = &exc.kind else {
                    return Err(LowerError::UnrecognisedPattern {
                        span: exc.span,
                        expected: "label name after raise",
                        found: shape_of(exc).to_string(),
                    });
                };
                self.check_reserved(id, exc.span)?;
                self.line(&format!("goto {};", escape_ident(id)));
                Ok(())
            }

            StmtKind::Delete { targets } => {
                for target in targets {
                    let ExprKind::Name { id } = &target.kind else {
                        return Err(LowerError::UnrecognisedPattern {
                            span: target.span,
                            expected: "macro name after del",
                            found: shape_of(target).to_string(),
                        });
                    };
                    self.check_reserved(id, target.span)?;
                    let name = escape_ident(id);
                    self.line(&format!("#undef {}", name));
                }
                Ok(())
            }

            StmtKind::Function(func) => self.write_function(stmt.span, func),

            StmtKind::Class(class) => self.write_class(stmt.span, class, false),

            StmtKind::TypeAlias { name, value } => {
                self.check_reserved(name, stmt.span)?;
                let decl = self.type_text(value, &escape_ident(name))?;
                self.line(&format!("typedef {};", decl));
                Ok(())
            }
        }
    }

    fn write_runtime_if(
        &mut self,
        test: &'m Expr,
        body: &'m [Stmt],
        orelse: &'m [Stmt],
    ) -> Result<(), LowerError> {
        let cond = self.expr_text(test)?;
        self.line(&format!("if ({}) {{", cond));
        self.indent += 1;
        for stmt in body {
            self.write_stmt(stmt)?;
        }
        self.indent -= 1;
        self.write_orelse(orelse)
    }

    fn write_orelse(&mut self, orelse: &'m [Stmt]) -> Result<(), LowerError> {
        match orelse {
            [] => {
                self.line("}");
                Ok(())
            }
            // A single nested `if` is an elif
            [Stmt {
                kind: StmtKind::If { test, body, orelse },
                ..
            }] if !is_pp_test(test) => {
                let cond = self.expr_text(test)?;
                self.line(&format!("}} else if ({}) {{", cond));
                self.indent += 1;
                for stmt in body {
                    self.write_stmt(stmt)?;
                }
                self.indent -= 1;
                self.write_orelse(orelse)
            }
            stmts => {
                self.line("} else {");
                self.indent += 1;
                for stmt in stmts {
                    self.write_stmt(stmt)?;
                }
                self.indent -= 1;
                self.line("}");
                Ok(())
            }
        }
    }

    fn write_preprocessor_if(
        &mut self,
        test: &'m Expr,
        body: &'m [Stmt],
        orelse: &'m [Stmt],
        first: bool,
    ) -> Result<(), LowerError> {
        let cond = match &test.kind {
            ExprKind::List { elts } if elts.len() == 1 => &elts[0],
            _ => {
                return Err(LowerError::UnrecognisedPattern {
                    span: test.span,
                    expected: "single-element preprocessor test",
                    found: shape_of(test).to_string(),
                });
            }
        };

        let directive = self.pp_condition(cond, first)?;
        self.line(&directive);

        // Branch bodies lower in the current context, not braced
        for stmt in body {
            self.write_stmt(stmt)?;
        }

        match orelse {
            [] => {
                self.line("#endif");
                Ok(())
            }
            [Stmt {
                kind: StmtKind::If { test, body, orelse },
                ..
            }] if is_pp_test(test) => self.write_preprocessor_if(test, body, orelse, false),
            stmts => {
                self.line("#else");
                for stmt in stmts {
                    self.write_stmt(stmt)?;
                }
                self.line("#endif");
                Ok(())
            }
        }
    }

    fn pp_condition(&mut self, cond: &'m Expr, first: bool) -> Result<String, LowerError> {
        if let ExprKind::Name { id } = &cond.kind {
            let name = escape_ident(id);
            return Ok(if first {
                format!("#ifdef {}", name)
            } else {
                format!("#elif defined({})", name)
            });
        }

        if let ExprKind::Unary {
            op: UnaryOp::Not,
            operand,
        } = &cond.kind
        {
            if let ExprKind::Name { id } = &operand.kind {
                let name = escape_ident(id);
                return Ok(if first {
                    format!("#ifndef {}", name)
                } else {
                    format!("#elif !defined({})", name)
                });
            }
        }

        let text = self.expr_text(cond)?;
        Ok(if first {
            format!("#if {}", text)
        } else {
            format!("#elif {}", text)
        })
    }

    fn write_while(&mut self, test: &'m Expr, body: &'m [Stmt]) -> Result<(), LowerError> {
        let empty_test = matches!(&test.kind, ExprKind::Tuple { elts } if elts.is_empty());

        if !empty_test {
            let cond = self.expr_text(test)?;
            self.line(&format!("while ({}) {{", cond));
            self.indent += 1;
            for stmt in body {
                self.write_stmt(stmt)?;
            }
            self.indent -= 1;
            self.line("}");
            return Ok(());
        }

        // `while ():` is do-while when the body ends in `if C: continue`,
        // otherwise an infinite loop.
        if let Some((last, rest)) = body.split_last() {
            if let StmtKind::If { test, body, orelse } = &last.kind {
                let is_continue =
                    body.len() == 1 && matches!(body[0].kind, StmtKind::Continue) && orelse.is_empty();
                if is_continue && !is_pp_test(test) {
                    let cond = self.expr_text(test)?;
                    self.line("do {");
                    self.indent += 1;
                    for stmt in rest {
                        self.write_stmt(stmt)?;
                    }
                    self.indent -= 1;
                    self.line(&format!("}} while ({});", cond));
                    return Ok(());
                }
            }
        }

        self.line("for (;;) {");
        self.indent += 1;
        for stmt in body {
            self.write_stmt(stmt)?;
        }
        self.indent -= 1;
        self.line("}");
        Ok(())
    }

    /// `for VARS in TYPES(INIT)(COND)(STEP):` - the only recognised `for`.
    fn write_c_for(
        &mut self,
        span: Span,
        targets: &'m [String],
        iter: &'m Expr,
        body: &'m [Stmt],
    ) -> Result<(), LowerError> {
        let header_error = |found: &Expr| LowerError::UnrecognisedPattern {
            span,
            expected: "loop header TYPES(INIT)(COND)(STEP)",
            found: shape_of(found).to_string(),
        };

        let ExprKind::Call {
            func: step_func,
            args: step_args,
            keywords: step_kw,
        } = &iter.kind
        else {
            return Err(header_error(iter));
        };
        let ExprKind::Call {
            func: cond_func,
            args: cond_args,
            keywords: cond_kw,
        } = &step_func.kind
        else {
            return Err(header_error(step_func));
        };
        let ExprKind::Call {
            func: types,
            args: init_args,
            keywords: init_kw,
        } = &cond_func.kind
        else {
            return Err(header_error(cond_func));
        };
        if !step_kw.is_empty() || !cond_kw.is_empty() || !init_kw.is_empty() {
            return Err(header_error(iter));
        }

        let type_exprs: Vec<&'m Expr> = match &types.kind {
            ExprKind::Tuple { elts } => elts.iter().collect(),
            _ => vec![&**types; targets.len()],
        };
        if type_exprs.len() != targets.len() {
            return Err(LowerError::AnnotationMismatch {
                span,
                message: format!(
                    "loop declares {} variables but {} types",
                    targets.len(),
                    type_exprs.len()
                ),
            });
        }

        let mut init_parts = Vec::new();
        if let Some(init) = init_args.first() {
            let items: Vec<&'m Expr> = match &init.kind {
                ExprKind::Tuple { elts } => elts.iter().collect(),
                _ => vec![init],
            };
            if items.len() != targets.len() {
                return Err(LowerError::AnnotationMismatch {
                    span,
                    message: format!(
                        "loop declares {} variables but {} initialisers",
                        targets.len(),
                        items.len()
                    ),
                });
            }

            let mut shared_type = None;
            for (i, (name, item)) in targets.iter().zip(&items).enumerate() {
                self.check_reserved(name, span)?;
                let ty = self.type_text(type_exprs[i], "")?;
                match &shared_type {
                    None => shared_type = Some(ty.clone()),
                    Some(first) if *first != ty => {
                        return Err(LowerError::AnnotationMismatch {
                            span,
                            message: "loop variables must share one type".to_string(),
                        });
                    }
                    Some(_) => {}
                }

                let ExprKind::Walrus { value, .. } = &item.kind else {
                    return Err(LowerError::UnrecognisedPattern {
                        span: item.span,
                        expected: "walrus initialiser `(name := value)`",
                        found: shape_of(item).to_string(),
                    });
                };
                let value = self.expr_text(value)?;
                if i == 0 {
                    init_parts.push(format!("{} {} = {}", ty, escape_ident(name), value));
                } else {
                    init_parts.push(format!("{} = {}", escape_ident(name), value));
                }
            }
        }

        let cond = match cond_args.first() {
            Some(c) => self.expr_text(c)?,
            None => String::new(),
        };
        let step = match step_args.first() {
            Some(s) => self.expr_text(s)?,
            None => String::new(),
        };

        self.line(&format!(
            "for ({}; {}; {}) {{",
            init_parts.join(", "),
            cond,
            step
        ));
        self.indent += 1;
        for stmt in body {
            self.write_stmt(stmt)?;
        }
        self.indent -= 1;
        self.line("}");
        Ok(())
    }

    fn write_switch(
        &mut self,
        subject: &'m Expr,
        cases: &'m [MatchCase],
    ) -> Result<(), LowerError> {
        let subject = self.expr_text(subject)?;
        self.line(&format!("switch ({}) {{", subject));

        for case in cases {
            if case.pattern.is_name(WILDCARD) {
                self.line("default:");
            } else {
                let value = self.expr_text(&case.pattern)?;
                self.line(&format!("case {}:", value));
            }
            self.indent += 1;
            for stmt in &case.body {
                self.write_stmt(stmt)?;
            }
            self.indent -= 1;
        }

        self.line("}");
        Ok(())
    }
}
