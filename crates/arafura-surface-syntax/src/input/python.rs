//! Tree-sitter based reader for the Python-shaped surface syntax.
//!
//! The reader is a faithful structural ingest: it rebuilds the parse tree as
//! the typed AST and makes no lowering decisions. Anything outside the
//! supported subset is rejected here with the node kind in the message.

use crate::ast::*;
use crate::error::ReadError;
use tree_sitter::{Node, Parser, Tree};

/// Parse source into the surface-syntax AST.
pub fn read_python(source: &str) -> Result<Module, ReadError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|err| ReadError::Parse(err.to_string()))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ReadError::Parse("failed to parse".into()))?;

    let ctx = ReadContext::new(source);
    ctx.read_module(&tree)
}

fn span(node: Node) -> Span {
    let pos = node.start_position();
    Span::new(pos.row + 1, pos.column + 1)
}

/// Locate the first concrete error node under `node`.
fn find_error(node: Node) -> Option<Span> {
    if node.is_error() || node.is_missing() {
        return Some(span(node));
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            if let Some(s) = find_error(child) {
                return Some(s);
            }
        }
    }
    None
}

struct ReadContext<'a> {
    source: &'a str,
}

impl<'a> ReadContext<'a> {
    fn new(source: &'a str) -> Self {
        Self { source }
    }

    fn node_text(&self, node: Node) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn unsupported<T>(&self, node: Node) -> Result<T, ReadError> {
        Err(ReadError::Unsupported {
            span: span(node),
            kind: node.kind().to_string(),
        })
    }

    fn missing<T>(&self, node: Node, what: &str) -> Result<T, ReadError> {
        Err(ReadError::Parse(format!("{} missing {}", node.kind(), what)))
    }

    fn read_module(&self, tree: &Tree) -> Result<Module, ReadError> {
        let root = tree.root_node();

        if root.has_error() {
            let at = find_error(root).unwrap_or_default();
            return Err(ReadError::Syntax { span: at });
        }

        Ok(Module::new(self.read_block_stmts(root)?))
    }

    fn read_block_stmts(&self, node: Node) -> Result<Vec<Stmt>, ReadError> {
        let mut stmts = Vec::new();
        let mut cursor = node.walk();

        for child in node.children(&mut cursor) {
            if child.is_named() {
                if let Some(stmt) = self.read_stmt(child)? {
                    stmts.push(stmt);
                }
            }
        }

        Ok(stmts)
    }

    fn read_stmt(&self, node: Node) -> Result<Option<Stmt>, ReadError> {
        let kind = match node.kind() {
            // Comments and pass carry no meaning
            "comment" | "pass_statement" => return Ok(None),

            "expression_statement" => {
                let inner = node
                    .child(0)
                    .ok_or_else(|| ReadError::Parse("expression_statement has no child".into()))?;
                match inner.kind() {
                    "assignment" => self.read_assignment(inner)?,
                    "augmented_assignment" => self.read_augmented_assignment(inner)?,
                    _ => StmtKind::Expr {
                        value: self.read_expr(inner)?,
                    },
                }
            }

            // Control flow
            "if_statement" => self.read_if_statement(node)?,
            "while_statement" => self.read_while_statement(node)?,
            "for_statement" => self.read_for_statement(node)?,
            "match_statement" => self.read_match_statement(node)?,

            "return_statement" => {
                let mut cursor = node.walk();
                let value = node
                    .children(&mut cursor)
                    .find(|c| c.is_named())
                    .map(|n| self.read_expr(n))
                    .transpose()?;
                StmtKind::Return { value }
            }

            "break_statement" => StmtKind::Break,
            "continue_statement" => StmtKind::Continue,

            "raise_statement" => {
                let mut cursor = node.walk();
                let exc = node
                    .children(&mut cursor)
                    .find(|c| c.is_named())
                    .ok_or_else(|| ReadError::Parse("raise missing target".into()))?;
                StmtKind::Raise {
                    exc: self.read_expr(exc)?,
                }
            }

            "delete_statement" => self.read_delete_statement(node)?,

            "import_statement" => self.read_import_statement(node)?,
            "import_from_statement" => self.read_import_from_statement(node)?,

            "function_definition" => StmtKind::Function(Box::new(
                self.read_function_definition(node, Vec::new())?,
            )),
            "class_definition" => {
                StmtKind::Class(Box::new(self.read_class_definition(node, Vec::new())?))
            }
            "decorated_definition" => self.read_decorated_definition(node)?,

            "type_alias_statement" => self.read_type_alias(node)?,

            _ => return self.unsupported(node),
        };

        Ok(Some(Stmt {
            span: span(node),
            kind,
        }))
    }

    fn read_assignment(&self, node: Node) -> Result<StmtKind, ReadError> {
        let left = node
            .child_by_field_name("left")
            .ok_or_else(|| ReadError::Parse("assignment missing left".into()))?;

        let annotation = node.child_by_field_name("type");
        let right = node.child_by_field_name("right");

        if let Some(ann) = annotation {
            // Annotated declaration: target must be a plain name
            if left.kind() != "identifier" {
                return self.unsupported(left);
            }
            return Ok(StmtKind::AnnAssign {
                target: self.node_text(left).to_string(),
                annotation: self.read_type_expr(ann)?,
                value: right.map(|n| self.read_expr(n)).transpose()?,
            });
        }

        let right = right.ok_or_else(|| ReadError::Parse("assignment missing right".into()))?;
        if right.kind() == "assignment" {
            // a = b = c
            return self.unsupported(right);
        }

        Ok(StmtKind::Assign {
            target: self.read_expr(left)?,
            value: self.read_expr(right)?,
        })
    }

    fn read_augmented_assignment(&self, node: Node) -> Result<StmtKind, ReadError> {
        let left = node
            .child_by_field_name("left")
            .ok_or_else(|| ReadError::Parse("augmented_assignment missing left".into()))?;
        let right = node
            .child_by_field_name("right")
            .ok_or_else(|| ReadError::Parse("augmented_assignment missing right".into()))?;
        let op_node = node
            .child_by_field_name("operator")
            .ok_or_else(|| ReadError::Parse("augmented_assignment missing operator".into()))?;

        let op = match self.node_text(op_node) {
            "+=" => BinOp::Add,
            "-=" => BinOp::Sub,
            "*=" => BinOp::Mul,
            "/=" => BinOp::Div,
            "%=" => BinOp::Mod,
            "&=" => BinOp::BitAnd,
            "|=" => BinOp::BitOr,
            "^=" => BinOp::BitXor,
            "<<=" => BinOp::Shl,
            ">>=" => BinOp::Shr,
            "**=" => BinOp::Pow,
            "//=" => BinOp::FloorDiv,
            other => {
                return Err(ReadError::Parse(format!("unknown augmented op: {}", other)));
            }
        };

        Ok(StmtKind::AugAssign {
            target: self.read_expr(left)?,
            op,
            value: self.read_expr(right)?,
        })
    }

    fn read_if_statement(&self, node: Node) -> Result<StmtKind, ReadError> {
        let condition = node
            .child_by_field_name("condition")
            .ok_or_else(|| ReadError::Parse("if missing condition".into()))?;
        let consequence = node
            .child_by_field_name("consequence")
            .ok_or_else(|| ReadError::Parse("if missing consequence".into()))?;

        let mut cursor = node.walk();
        let alternatives: Vec<Node> = node
            .children_by_field_name("alternative", &mut cursor)
            .collect();

        self.build_if(condition, consequence, &alternatives)
    }

    /// Fold `elif` clauses into nested single-`If` orelse lists.
    fn build_if(
        &self,
        condition: Node,
        consequence: Node,
        alternatives: &[Node],
    ) -> Result<StmtKind, ReadError> {
        let test = self.read_expr(condition)?;
        let body = self.read_block_stmts(consequence)?;

        let orelse = match alternatives.split_first() {
            None => Vec::new(),
            Some((first, rest)) => match first.kind() {
                "elif_clause" => {
                    let cond = first
                        .child_by_field_name("condition")
                        .ok_or_else(|| ReadError::Parse("elif missing condition".into()))?;
                    let cons = first
                        .child_by_field_name("consequence")
                        .ok_or_else(|| ReadError::Parse("elif missing consequence".into()))?;
                    vec![Stmt {
                        span: span(*first),
                        kind: self.build_if(cond, cons, rest)?,
                    }]
                }
                "else_clause" => {
                    let block = first
                        .child_by_field_name("body")
                        .ok_or_else(|| ReadError::Parse("else missing body".into()))?;
                    self.read_block_stmts(block)?
                }
                _ => Vec::new(),
            },
        };

        Ok(StmtKind::If { test, body, orelse })
    }

    fn read_while_statement(&self, node: Node) -> Result<StmtKind, ReadError> {
        let condition = node
            .child_by_field_name("condition")
            .ok_or_else(|| ReadError::Parse("while missing condition".into()))?;
        let body = node
            .child_by_field_name("body")
            .ok_or_else(|| ReadError::Parse("while missing body".into()))?;

        Ok(StmtKind::While {
            test: self.read_expr(condition)?,
            body: self.read_block_stmts(body)?,
        })
    }

    fn read_for_statement(&self, node: Node) -> Result<StmtKind, ReadError> {
        let left = node
            .child_by_field_name("left")
            .ok_or_else(|| ReadError::Parse("for missing left".into()))?;
        let right = node
            .child_by_field_name("right")
            .ok_or_else(|| ReadError::Parse("for missing right".into()))?;
        let body = node
            .child_by_field_name("body")
            .ok_or_else(|| ReadError::Parse("for missing body".into()))?;

        let targets = match left.kind() {
            "identifier" => vec![self.node_text(left).to_string()],
            "tuple_pattern" | "pattern_list" => {
                let mut names = Vec::new();
                let mut cursor = left.walk();
                for child in left.children(&mut cursor) {
                    if child.is_named() {
                        if child.kind() != "identifier" {
                            return self.unsupported(child);
                        }
                        names.push(self.node_text(child).to_string());
                    }
                }
                names
            }
            _ => return self.unsupported(left),
        };

        Ok(StmtKind::For {
            targets,
            iter: self.read_expr(right)?,
            body: self.read_block_stmts(body)?,
        })
    }

    fn read_match_statement(&self, node: Node) -> Result<StmtKind, ReadError> {
        let mut cursor = node.walk();
        let subjects: Vec<Node> = node.children_by_field_name("subject", &mut cursor).collect();
        let subject = match subjects.as_slice() {
            [single] => self.read_expr(*single)?,
            _ => return self.unsupported(node),
        };

        let body = node
            .child_by_field_name("body")
            .ok_or_else(|| ReadError::Parse("match missing body".into()))?;

        let mut cases = Vec::new();
        let mut cursor = body.walk();
        for clause in body.children(&mut cursor) {
            if clause.kind() != "case_clause" {
                continue;
            }
            cases.push(self.read_case_clause(clause)?);
        }

        Ok(StmtKind::Match { subject, cases })
    }

    fn read_case_clause(&self, node: Node) -> Result<MatchCase, ReadError> {
        let mut cursor = node.walk();
        let patterns: Vec<Node> = node
            .children(&mut cursor)
            .filter(|c| c.kind() == "case_pattern")
            .collect();
        let pattern_node = match patterns.as_slice() {
            [single] => *single,
            _ => return self.unsupported(node),
        };

        let pattern = match pattern_node.named_child(0) {
            // Bare identifiers appear as dotted_name inside patterns
            Some(inner) if inner.kind() == "dotted_name" => Expr {
                span: span(inner),
                kind: ExprKind::Name {
                    id: self.node_text(inner).to_string(),
                },
            },
            Some(inner) => self.read_expr(inner)?,
            None => Expr {
                span: span(pattern_node),
                kind: ExprKind::Name {
                    id: self.node_text(pattern_node).to_string(),
                },
            },
        };

        let consequence = node
            .child_by_field_name("consequence")
            .ok_or_else(|| ReadError::Parse("case missing consequence".into()))?;

        Ok(MatchCase {
            span: span(node),
            pattern,
            body: self.read_block_stmts(consequence)?,
        })
    }

    fn read_delete_statement(&self, node: Node) -> Result<StmtKind, ReadError> {
        let mut cursor = node.walk();
        let target = node
            .children(&mut cursor)
            .find(|c| c.is_named())
            .ok_or_else(|| ReadError::Parse("del missing target".into()))?;

        let targets = if target.kind() == "expression_list" {
            let mut exprs = Vec::new();
            let mut cursor = target.walk();
            for child in target.children(&mut cursor) {
                if child.is_named() {
                    exprs.push(self.read_expr(child)?);
                }
            }
            exprs
        } else {
            vec![self.read_expr(target)?]
        };

        Ok(StmtKind::Delete { targets })
    }

    fn read_import_statement(&self, node: Node) -> Result<StmtKind, ReadError> {
        let mut modules = Vec::new();
        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            if name.kind() != "dotted_name" {
                return self.unsupported(name);
            }
            modules.push(self.node_text(name).to_string());
        }
        Ok(StmtKind::Import { modules })
    }

    fn read_import_from_statement(&self, node: Node) -> Result<StmtKind, ReadError> {
        let module = node
            .child_by_field_name("module_name")
            .ok_or_else(|| ReadError::Parse("from-import missing module".into()))?;
        if module.kind() != "dotted_name" {
            return self.unsupported(module);
        }

        let mut cursor = node.walk();
        let wildcard = node
            .children(&mut cursor)
            .any(|c| c.kind() == "wildcard_import");

        Ok(StmtKind::ImportFrom {
            module: self.node_text(module).to_string(),
            wildcard,
        })
    }

    fn read_decorated_definition(&self, node: Node) -> Result<StmtKind, ReadError> {
        let mut decorators = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "decorator" {
                decorators.push(self.read_decorator(child)?);
            }
        }

        let definition = node
            .child_by_field_name("definition")
            .ok_or_else(|| ReadError::Parse("decorated_definition missing definition".into()))?;

        match definition.kind() {
            "function_definition" => Ok(StmtKind::Function(Box::new(
                self.read_function_definition(definition, decorators)?,
            ))),
            "class_definition" => Ok(StmtKind::Class(Box::new(
                self.read_class_definition(definition, decorators)?,
            ))),
            _ => self.unsupported(definition),
        }
    }

    fn read_decorator(&self, node: Node) -> Result<Decorator, ReadError> {
        let inner = node
            .named_child(0)
            .ok_or_else(|| ReadError::Parse("decorator has no expression".into()))?;

        match inner.kind() {
            "identifier" => Ok(Decorator {
                span: span(node),
                name: self.node_text(inner).to_string(),
                args: Vec::new(),
            }),
            "call" => {
                let func = inner
                    .child_by_field_name("function")
                    .ok_or_else(|| ReadError::Parse("decorator call missing function".into()))?;
                if func.kind() != "identifier" {
                    return self.unsupported(func);
                }
                let mut args = Vec::new();
                if let Some(arglist) = inner.child_by_field_name("arguments") {
                    let mut cursor = arglist.walk();
                    for arg in arglist.children(&mut cursor) {
                        if arg.is_named() && arg.kind() != "comment" {
                            args.push(self.read_expr(arg)?);
                        }
                    }
                }
                Ok(Decorator {
                    span: span(node),
                    name: self.node_text(func).to_string(),
                    args,
                })
            }
            _ => self.unsupported(inner),
        }
    }

    fn read_function_definition(
        &self,
        node: Node,
        decorators: Vec<Decorator>,
    ) -> Result<FunctionDef, ReadError> {
        let name = node
            .child_by_field_name("name")
            .ok_or_else(|| ReadError::Parse("function missing name".into()))?;
        let body = node
            .child_by_field_name("body")
            .ok_or_else(|| ReadError::Parse("function missing body".into()))?;

        let mut params = Vec::new();
        let mut vararg = None;

        if let Some(parameters) = node.child_by_field_name("parameters") {
            let mut cursor = parameters.walk();
            for child in parameters.children(&mut cursor) {
                match child.kind() {
                    "identifier" => params.push(Param {
                        span: span(child),
                        name: self.node_text(child).to_string(),
                        annotation: None,
                    }),
                    "typed_parameter" => {
                        let pname = child
                            .child(0)
                            .filter(|n| n.kind() == "identifier")
                            .ok_or_else(|| ReadError::Parse("typed_parameter missing name".into()))?;
                        let ty = child
                            .child_by_field_name("type")
                            .ok_or_else(|| ReadError::Parse("typed_parameter missing type".into()))?;
                        params.push(Param {
                            span: span(child),
                            name: self.node_text(pname).to_string(),
                            annotation: Some(self.read_type_expr(ty)?),
                        });
                    }
                    "list_splat_pattern" => {
                        let inner = child
                            .named_child(0)
                            .ok_or_else(|| ReadError::Parse("splat missing name".into()))?;
                        vararg = Some(self.node_text(inner).to_string());
                    }
                    "default_parameter" | "typed_default_parameter" | "dictionary_splat_pattern" => {
                        return self.unsupported(child);
                    }
                    _ => {}
                }
            }
        }

        let returns = node
            .child_by_field_name("return_type")
            .map(|n| self.read_type_expr(n))
            .transpose()?;

        Ok(FunctionDef {
            name: self.node_text(name).to_string(),
            params,
            vararg,
            returns,
            body: self.read_block_stmts(body)?,
            decorators,
        })
    }

    fn read_class_definition(
        &self,
        node: Node,
        decorators: Vec<Decorator>,
    ) -> Result<ClassDef, ReadError> {
        let name = node
            .child_by_field_name("name")
            .ok_or_else(|| ReadError::Parse("class missing name".into()))?;
        let body = node
            .child_by_field_name("body")
            .ok_or_else(|| ReadError::Parse("class missing body".into()))?;

        let mut bases = Vec::new();
        if let Some(superclasses) = node.child_by_field_name("superclasses") {
            let mut cursor = superclasses.walk();
            for base in superclasses.children(&mut cursor) {
                if base.is_named() {
                    if base.kind() != "identifier" {
                        return self.unsupported(base);
                    }
                    bases.push(self.node_text(base).to_string());
                }
            }
        }

        Ok(ClassDef {
            name: self.node_text(name).to_string(),
            bases,
            decorators,
            body: self.read_block_stmts(body)?,
        })
    }

    fn read_type_alias(&self, node: Node) -> Result<StmtKind, ReadError> {
        let mut cursor = node.walk();
        let types: Vec<Node> = node
            .children(&mut cursor)
            .filter(|c| c.kind() == "type")
            .collect();
        let [left, right] = types.as_slice() else {
            return self.missing(node, "alias name and value");
        };

        let name = self.unwrap_type(*left)?;
        if name.kind() != "identifier" {
            return self.unsupported(name);
        }

        Ok(StmtKind::TypeAlias {
            name: self.node_text(name).to_string(),
            value: self.read_type_expr(*right)?,
        })
    }

    /// Annotations arrive wrapped in a grammar `type` node; unwrap to the
    /// inner expression.
    fn unwrap_type<'b>(&self, node: Node<'b>) -> Result<Node<'b>, ReadError> {
        if node.kind() == "type" {
            node.named_child(0)
                .ok_or_else(|| ReadError::Parse("empty type annotation".into()))
        } else {
            Ok(node)
        }
    }

    fn read_type_expr(&self, node: Node) -> Result<Expr, ReadError> {
        let inner = self.unwrap_type(node)?;
        self.read_expr(inner)
    }

    fn read_expr(&self, node: Node) -> Result<Expr, ReadError> {
        let kind = match node.kind() {
            // Literals
            "integer" | "float" => ExprKind::Num {
                text: self.node_text(node).to_string(),
            },
            "string" => self.read_string(node)?,
            "concatenated_string" => return self.unsupported(node),
            "true" => ExprKind::Bool { value: true },
            "false" => ExprKind::Bool { value: false },
            "none" => ExprKind::NoneLit,

            "identifier" => ExprKind::Name {
                id: self.node_text(node).to_string(),
            },

            // Operators
            "binary_operator" => self.read_binary_operator(node)?,
            "comparison_operator" => self.read_comparison_operator(node)?,
            "boolean_operator" => self.read_boolean_operator(node)?,
            "unary_operator" => self.read_unary_operator(node)?,
            "not_operator" => {
                let arg = node
                    .child_by_field_name("argument")
                    .ok_or_else(|| ReadError::Parse("not_operator missing argument".into()))?;
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(self.read_expr(arg)?),
                }
            }

            "call" => self.read_call(node)?,
            "attribute" => self.read_attribute(node)?,
            "subscript" => self.read_subscript(node)?,

            "list" => ExprKind::List {
                elts: self.read_elements(node)?,
            },
            "tuple" => ExprKind::Tuple {
                elts: self.read_elements(node)?,
            },
            "dictionary" => self.read_dictionary(node)?,

            "parenthesized_expression" => {
                let inner = node.named_child(0).ok_or_else(|| {
                    ReadError::Parse("parenthesized_expression missing inner".into())
                })?;
                return self.read_expr(inner);
            }

            "conditional_expression" => self.read_conditional_expression(node)?,

            "named_expression" => {
                let name = node
                    .child_by_field_name("name")
                    .ok_or_else(|| ReadError::Parse("named_expression missing name".into()))?;
                let value = node
                    .child_by_field_name("value")
                    .ok_or_else(|| ReadError::Parse("named_expression missing value".into()))?;
                ExprKind::Walrus {
                    target: self.node_text(name).to_string(),
                    value: Box::new(self.read_expr(value)?),
                }
            }

            _ => return self.unsupported(node),
        };

        Ok(Expr {
            span: span(node),
            kind,
        })
    }

    fn read_elements(&self, node: Node) -> Result<Vec<Expr>, ReadError> {
        let mut elts = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.is_named() && child.kind() != "comment" {
                elts.push(self.read_expr(child)?);
            }
        }
        Ok(elts)
    }

    fn read_dictionary(&self, node: Node) -> Result<ExprKind, ReadError> {
        let mut items = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "pair" {
                let key = child
                    .child_by_field_name("key")
                    .ok_or_else(|| ReadError::Parse("pair missing key".into()))?;
                let value = child
                    .child_by_field_name("value")
                    .ok_or_else(|| ReadError::Parse("pair missing value".into()))?;
                items.push((self.read_expr(key)?, self.read_expr(value)?));
            }
        }
        Ok(ExprKind::Dict { items })
    }

    fn read_string(&self, node: Node) -> Result<ExprKind, ReadError> {
        let text = self.node_text(node);
        if text.starts_with("f") || text.starts_with("r") || text.starts_with("b") {
            return self.unsupported(node);
        }
        if text.starts_with("\"\"\"") || text.starts_with("'''") {
            return self.unsupported(node);
        }

        let quote = match text.chars().next() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(ReadError::Parse("malformed string literal".into())),
        };
        let inner = &text[1..text.len().saturating_sub(1)];

        // Normalize to double-quote escaping: `\'` unescapes, bare `"` escapes,
        // every other escape sequence passes through verbatim.
        let mut value = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some('\'') => value.push('\''),
                    Some(next) => {
                        value.push('\\');
                        value.push(next);
                    }
                    None => value.push('\\'),
                },
                '"' if quote == '\'' => value.push_str("\\\""),
                c => value.push(c),
            }
        }

        Ok(ExprKind::Str { value })
    }

    fn read_binary_operator(&self, node: Node) -> Result<ExprKind, ReadError> {
        let left = node
            .child_by_field_name("left")
            .ok_or_else(|| ReadError::Parse("binary_operator missing left".into()))?;
        let right = node
            .child_by_field_name("right")
            .ok_or_else(|| ReadError::Parse("binary_operator missing right".into()))?;
        let op_node = node
            .child_by_field_name("operator")
            .ok_or_else(|| ReadError::Parse("binary_operator missing operator".into()))?;

        let op = match self.node_text(op_node) {
            "+" => BinOp::Add,
            "-" => BinOp::Sub,
            "*" => BinOp::Mul,
            "/" => BinOp::Div,
            "%" => BinOp::Mod,
            "**" => BinOp::Pow,
            "//" => BinOp::FloorDiv,
            "&" => BinOp::BitAnd,
            "|" => BinOp::BitOr,
            "^" => BinOp::BitXor,
            "<<" => BinOp::Shl,
            ">>" => BinOp::Shr,
            other => {
                return Err(ReadError::Parse(format!("unknown binary op: {}", other)));
            }
        };

        Ok(ExprKind::Binary {
            left: Box::new(self.read_expr(left)?),
            op,
            right: Box::new(self.read_expr(right)?),
        })
    }

    fn read_comparison_operator(&self, node: Node) -> Result<ExprKind, ReadError> {
        let mut cursor = node.walk();
        let operands: Vec<Node> = node.children(&mut cursor).filter(|c| c.is_named()).collect();

        let mut cursor = node.walk();
        let mut ops = Vec::new();
        for op_node in node.children_by_field_name("operators", &mut cursor) {
            ops.push(match self.node_text(op_node) {
                "==" => CmpOp::Eq,
                "!=" => CmpOp::Ne,
                "<" => CmpOp::Lt,
                "<=" => CmpOp::Le,
                ">" => CmpOp::Gt,
                ">=" => CmpOp::Ge,
                // `in`, `is`, `not in`, ...
                _ => return self.unsupported(op_node),
            });
        }

        let (first, rest) = operands
            .split_first()
            .ok_or_else(|| ReadError::Parse("comparison missing operands".into()))?;
        if rest.len() != ops.len() {
            return Err(ReadError::Parse("comparison operand/operator mismatch".into()));
        }

        Ok(ExprKind::Compare {
            left: Box::new(self.read_expr(*first)?),
            ops,
            comparators: rest
                .iter()
                .map(|n| self.read_expr(*n))
                .collect::<Result<_, _>>()?,
        })
    }

    fn read_boolean_operator(&self, node: Node) -> Result<ExprKind, ReadError> {
        let left = node
            .child_by_field_name("left")
            .ok_or_else(|| ReadError::Parse("boolean_operator missing left".into()))?;
        let right = node
            .child_by_field_name("right")
            .ok_or_else(|| ReadError::Parse("boolean_operator missing right".into()))?;
        let op_node = node
            .child_by_field_name("operator")
            .ok_or_else(|| ReadError::Parse("boolean_operator missing operator".into()))?;

        let op = match self.node_text(op_node) {
            "and" => BoolOp::And,
            "or" => BoolOp::Or,
            other => {
                return Err(ReadError::Parse(format!("unknown boolean op: {}", other)));
            }
        };

        // Flatten chains over the same operator
        let mut values = Vec::new();
        match self.read_expr(left)? {
            Expr {
                kind: ExprKind::Boolean { op: inner, values: vs },
                ..
            } if inner == op => values.extend(vs),
            other => values.push(other),
        }
        values.push(self.read_expr(right)?);

        Ok(ExprKind::Boolean { op, values })
    }

    fn read_unary_operator(&self, node: Node) -> Result<ExprKind, ReadError> {
        let op_node = node
            .child_by_field_name("operator")
            .ok_or_else(|| ReadError::Parse("unary_operator missing operator".into()))?;
        let arg = node
            .child_by_field_name("argument")
            .ok_or_else(|| ReadError::Parse("unary_operator missing argument".into()))?;

        let op = match self.node_text(op_node) {
            "-" => UnaryOp::Neg,
            "+" => UnaryOp::Pos,
            "~" => UnaryOp::Invert,
            other => {
                return Err(ReadError::Parse(format!("unknown unary op: {}", other)));
            }
        };

        Ok(ExprKind::Unary {
            op,
            operand: Box::new(self.read_expr(arg)?),
        })
    }

    fn read_call(&self, node: Node) -> Result<ExprKind, ReadError> {
        let function = node
            .child_by_field_name("function")
            .ok_or_else(|| ReadError::Parse("call missing function".into()))?;

        let mut args = Vec::new();
        let mut keywords = Vec::new();

        if let Some(arguments) = node.child_by_field_name("arguments") {
            let mut cursor = arguments.walk();
            for child in arguments.children(&mut cursor) {
                if !child.is_named() || child.kind() == "comment" {
                    continue;
                }
                if child.kind() == "keyword_argument" {
                    let name = child
                        .child_by_field_name("name")
                        .ok_or_else(|| ReadError::Parse("keyword_argument missing name".into()))?;
                    let value = child
                        .child_by_field_name("value")
                        .ok_or_else(|| ReadError::Parse("keyword_argument missing value".into()))?;
                    keywords.push(Keyword {
                        name: self.node_text(name).to_string(),
                        value: self.read_expr(value)?,
                    });
                } else {
                    args.push(self.read_expr(child)?);
                }
            }
        }

        Ok(ExprKind::Call {
            func: Box::new(self.read_expr(function)?),
            args,
            keywords,
        })
    }

    fn read_attribute(&self, node: Node) -> Result<ExprKind, ReadError> {
        let object = node
            .child_by_field_name("object")
            .ok_or_else(|| ReadError::Parse("attribute missing object".into()))?;
        let attribute = node
            .child_by_field_name("attribute")
            .ok_or_else(|| ReadError::Parse("attribute missing attribute".into()))?;

        Ok(ExprKind::Attribute {
            value: Box::new(self.read_expr(object)?),
            attr: self.node_text(attribute).to_string(),
        })
    }

    fn read_subscript(&self, node: Node) -> Result<ExprKind, ReadError> {
        let value = node
            .child_by_field_name("value")
            .ok_or_else(|| ReadError::Parse("subscript missing value".into()))?;

        let mut cursor = node.walk();
        let mut index = Vec::new();
        for sub in node.children_by_field_name("subscript", &mut cursor) {
            if sub.kind() == "slice" {
                return self.unsupported(sub);
            }
            index.push(self.read_expr(sub)?);
        }

        Ok(ExprKind::Subscript {
            value: Box::new(self.read_expr(value)?),
            index,
        })
    }

    fn read_conditional_expression(&self, node: Node) -> Result<ExprKind, ReadError> {
        // consequent if test else alternate
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).filter(|c| c.is_named()).collect();

        let [consequent, test, alternate] = children.as_slice() else {
            return Err(ReadError::Parse("conditional_expression needs 3 parts".into()));
        };

        Ok(ExprKind::Conditional {
            test: Box::new(self.read_expr(*test)?),
            consequent: Box::new(self.read_expr(*consequent)?),
            alternate: Box::new(self.read_expr(*alternate)?),
        })
    }
}
