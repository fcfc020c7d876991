//! Syntax walker that flattens a Python syntax tree into function declarations.
//!
//! The walker does a depth-first, pre-order traversal of the whole tree, so
//! declarations come out in source order and an enclosing function is always
//! emitted before the functions nested inside it. Function bodies, class
//! bodies and compound statements are all descended into. Expressions are
//! never entered.
//!
//! Decorator expressions are lowered into a small closed model
//! ([`Decorator`], [`Callee`], [`Argument`], [`Expr`]) so that route
//! extraction can match on their shape structurally instead of poking at raw
//! tree-sitter nodes.

use crate::error::{Error, Result};
use crate::parser::ParsedFile;
use log::debug;
use tree_sitter::Node;

/// A `def` or `async def` together with the decorators attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    pub name: String,
    pub is_async: bool,
    /// 1-based line of the `def` keyword (or `async`)
    pub line: usize,
    /// Parameters in declaration order
    pub parameters: Vec<ParamDecl>,
    /// Decorators in source order, outermost first
    pub decorators: Vec<Decorator>,
}

impl FunctionDecl {
    /// Names of the parameters that can be passed positionally, in order.
    pub fn positional_parameters(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .filter(|p| p.kind == ParamKind::Positional)
            .map(|p| p.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    pub name: String,
    pub kind: ParamKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Regular or positional-only parameter
    Positional,
    /// `*args`
    VarPositional,
    /// Declared after `*` or `*args`
    KeywordOnly,
    /// `**kwargs`
    VarKeyword,
}

/// Shape of a decorator expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decorator {
    /// `@<callee>(<arguments>)`
    Call {
        callee: Callee,
        arguments: Vec<Argument>,
    },
    /// Any other expression, e.g. `@staticmethod` or `@app.route`
    Other { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callee {
    /// `<receiver>.<attribute>`
    Attribute { receiver: String, attribute: String },
    Other { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    Positional(Expr),
    Keyword { name: String, value: Expr },
    /// `*xs` or `**kw`
    Unpacked { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A literal string with escapes decoded
    Str(String),
    Other { text: String },
}

impl Expr {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Expr::Str(s) => Some(s),
            Expr::Other { .. } => None,
        }
    }
}

/// Walks a parsed file and returns every function declaration in source order.
///
/// # Errors
///
/// Returns [`Error::SyntaxFailure`] if a declaration is structurally
/// incomplete (for instance a function node without a name).
pub fn walk(parsed: &ParsedFile) -> Result<Vec<FunctionDecl>> {
    let mut walker = SyntaxWalker {
        src: parsed.bytes(),
        functions: Vec::new(),
    };
    walker.visit(parsed.tree.root_node())?;
    debug!(
        "Walked {}: {} function declarations",
        parsed.path.display(),
        walker.functions.len()
    );
    Ok(walker.functions)
}

struct SyntaxWalker<'a> {
    src: &'a [u8],
    functions: Vec<FunctionDecl>,
}

impl<'a> SyntaxWalker<'a> {
    /// Pre-order walk over statements only, driven by an explicit stack.
    /// Expressions are never entered since a `def` cannot appear inside one.
    fn visit(&mut self, root: Node) -> Result<()> {
        let mut pending = vec![root];
        while let Some(node) = pending.pop() {
            match node.kind() {
                "decorated_definition" => {
                    let mut decorators = Vec::new();
                    let mut cursor = node.walk();
                    for child in node.named_children(&mut cursor) {
                        if child.kind() == "decorator" {
                            decorators.push(self.lower_decorator(child)?);
                        }
                    }

                    match node.child_by_field_name("definition") {
                        Some(def) if def.kind() == "function_definition" => {
                            self.visit_function(def, decorators)?;
                            pending.extend(def.child_by_field_name("body"));
                        }
                        Some(def) => pending.push(def),
                        None => return Err(malformed(node, "decorated definition without a body")),
                    }
                }
                "function_definition" => {
                    self.visit_function(node, Vec::new())?;
                    // Nested functions come after their parent.
                    pending.extend(node.child_by_field_name("body"));
                }
                kind if holds_statements(kind) => {
                    let mut cursor = node.walk();
                    let children: Vec<_> = node.named_children(&mut cursor).collect();
                    pending.extend(children.into_iter().rev());
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn visit_function(&mut self, node: Node, decorators: Vec<Decorator>) -> Result<()> {
        let name = node
            .child_by_field_name("name")
            .ok_or_else(|| malformed(node, "function definition without a name"))?;
        let params = node
            .child_by_field_name("parameters")
            .ok_or_else(|| malformed(node, "function definition without a parameter list"))?;

        let is_async = node.child(0).map_or(false, |c| c.kind() == "async");

        self.functions.push(FunctionDecl {
            name: self.text(name)?.to_string(),
            is_async,
            line: node.start_position().row + 1,
            parameters: self.lower_parameters(params)?,
            decorators,
        });
        Ok(())
    }

    fn lower_parameters(&self, params: Node) -> Result<Vec<ParamDecl>> {
        let mut out = Vec::new();
        let mut keyword_only = false;

        let mut cursor = params.walk();
        for child in params.named_children(&mut cursor) {
            let plain = if keyword_only {
                ParamKind::KeywordOnly
            } else {
                ParamKind::Positional
            };

            match child.kind() {
                "identifier" => out.push(ParamDecl {
                    name: self.text(child)?.to_string(),
                    kind: plain,
                }),
                "default_parameter" | "typed_default_parameter" => {
                    // Tuple-unpacking defaults carry no single name.
                    if let Some(name) = child
                        .child_by_field_name("name")
                        .filter(|n| n.kind() == "identifier")
                    {
                        out.push(ParamDecl {
                            name: self.text(name)?.to_string(),
                            kind: plain,
                        });
                    }
                }
                "typed_parameter" => {
                    let Some(inner) = child.named_child(0) else {
                        continue;
                    };
                    match inner.kind() {
                        "identifier" => out.push(ParamDecl {
                            name: self.text(inner)?.to_string(),
                            kind: plain,
                        }),
                        "list_splat_pattern" => {
                            keyword_only = true;
                            out.push(self.splat(inner, ParamKind::VarPositional)?);
                        }
                        "dictionary_splat_pattern" => {
                            out.push(self.splat(inner, ParamKind::VarKeyword)?);
                        }
                        _ => {}
                    }
                }
                "list_splat_pattern" => {
                    keyword_only = true;
                    out.push(self.splat(child, ParamKind::VarPositional)?);
                }
                "dictionary_splat_pattern" => {
                    out.push(self.splat(child, ParamKind::VarKeyword)?);
                }
                "keyword_separator" => keyword_only = true,
                _ => {}
            }
        }

        Ok(out)
    }

    fn splat(&self, node: Node, kind: ParamKind) -> Result<ParamDecl> {
        Ok(ParamDecl {
            name: self.text(node)?.trim_start_matches('*').to_string(),
            kind,
        })
    }

    fn lower_decorator(&self, node: Node) -> Result<Decorator> {
        let expr = node
            .named_children(&mut node.walk())
            .find(|c| c.kind() != "comment")
            .ok_or_else(|| malformed(node, "empty decorator"))?;
        let expr = unparenthesize(expr);

        if expr.kind() != "call" {
            return Ok(Decorator::Other {
                text: self.text(expr)?.to_string(),
            });
        }

        let function = expr
            .child_by_field_name("function")
            .ok_or_else(|| malformed(expr, "call without a callee"))?;
        let callee = match function.kind() {
            "attribute" => {
                let receiver = function
                    .child_by_field_name("object")
                    .ok_or_else(|| malformed(function, "attribute without an object"))?;
                let attribute = function
                    .child_by_field_name("attribute")
                    .ok_or_else(|| malformed(function, "attribute without a name"))?;
                Callee::Attribute {
                    receiver: self.text(receiver)?.to_string(),
                    attribute: self.text(attribute)?.to_string(),
                }
            }
            _ => Callee::Other {
                text: self.text(function)?.to_string(),
            },
        };

        let mut arguments = Vec::new();
        if let Some(args) = expr.child_by_field_name("arguments") {
            if args.kind() == "argument_list" {
                let mut cursor = args.walk();
                for arg in args.named_children(&mut cursor) {
                    if let Some(lowered) = self.lower_argument(arg)? {
                        arguments.push(lowered);
                    }
                }
            } else {
                // `f(x for x in y)`
                arguments.push(Argument::Positional(Expr::Other {
                    text: self.text(args)?.to_string(),
                }));
            }
        }

        Ok(Decorator::Call { callee, arguments })
    }

    fn lower_argument(&self, node: Node) -> Result<Option<Argument>> {
        let arg = match node.kind() {
            "comment" => return Ok(None),
            "keyword_argument" => {
                let name = node
                    .child_by_field_name("name")
                    .ok_or_else(|| malformed(node, "keyword argument without a name"))?;
                let value = node
                    .child_by_field_name("value")
                    .ok_or_else(|| malformed(node, "keyword argument without a value"))?;
                Argument::Keyword {
                    name: self.text(name)?.to_string(),
                    value: self.lower_expr(value)?,
                }
            }
            "list_splat" | "dictionary_splat" => Argument::Unpacked {
                text: self.text(node)?.to_string(),
            },
            _ => Argument::Positional(self.lower_expr(node)?),
        };
        Ok(Some(arg))
    }

    fn lower_expr(&self, node: Node) -> Result<Expr> {
        if let Some(s) = self.string_literal(node)? {
            return Ok(Expr::Str(s));
        }
        Ok(Expr::Other {
            text: self.text(node)?.to_string(),
        })
    }

    fn string_literal(&self, node: Node) -> Result<Option<String>> {
        match node.kind() {
            "string" => Ok(decode_string_token(self.text(node)?)),
            "concatenated_string" => {
                let mut joined = String::new();
                let mut cursor = node.walk();
                for part in node.named_children(&mut cursor) {
                    if part.kind() == "comment" {
                        continue;
                    }
                    match decode_string_token(self.text(part)?) {
                        Some(s) => joined.push_str(&s),
                        None => return Ok(None),
                    }
                }
                Ok(Some(joined))
            }
            _ => Ok(None),
        }
    }

    fn text(&self, node: Node) -> Result<&'a str> {
        node.utf8_text(self.src)
            .map_err(|e| malformed(node, &format!("invalid UTF-8 in source: {}", e)))
    }
}

/// Node kinds whose children may include a function definition.
fn holds_statements(kind: &str) -> bool {
    matches!(
        kind,
        "module"
            | "block"
            | "class_definition"
            | "if_statement"
            | "elif_clause"
            | "else_clause"
            | "for_statement"
            | "while_statement"
            | "try_statement"
            | "except_clause"
            | "except_group_clause"
            | "finally_clause"
            | "with_statement"
            | "match_statement"
            | "case_clause"
    )
}

/// `@(app.get("/x"))` decorates with the inner call.
fn unparenthesize(mut node: Node) -> Node {
    while node.kind() == "parenthesized_expression" {
        let inner = node
            .named_children(&mut node.walk())
            .find(|c| c.kind() != "comment");
        match inner {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

fn malformed(node: Node, what: &str) -> Error {
    Error::SyntaxFailure(format!("{} at line {}", what, node.start_position().row + 1))
}

/// Decodes a single Python string token such as `"abc"`, `r'\d'` or
/// `"""doc"""`. Returns `None` for f-strings, byte strings and anything that
/// is not a well-formed token or cannot be decoded.
fn decode_string_token(token: &str) -> Option<String> {
    let quote_at = token.find(|c| c == '"' || c == '\'')?;
    let prefix = token[..quote_at].to_ascii_lowercase();
    if prefix.contains('f') || prefix.contains('b') || prefix.contains('t') {
        return None;
    }
    let raw = prefix.contains('r');

    let body = &token[quote_at..];
    let inner = if body.len() >= 6 && (body.starts_with("\"\"\"") || body.starts_with("'''")) {
        body.get(3..body.len() - 3)?
    } else if body.len() >= 2 {
        body.get(1..body.len() - 1)?
    } else {
        return None;
    };

    if raw {
        Some(inner.to_string())
    } else {
        unescape(inner)
    }
}

/// Decodes backslash escapes as Python does for a non-raw `str`. `\N{...}`
/// needs the Unicode name table and is not decoded; it yields `None`, as
/// does any malformed escape.
fn unescape(s: &str) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escape) = chars.next() else {
            out.push('\\');
            break;
        };
        match escape {
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\x0b'),
            // line continuation
            '\n' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '0'..='7' => {
                let mut code = escape.to_digit(8)?;
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(digit) => {
                            code = code * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code)?);
            }
            'x' => out.push(hex_escape(&mut chars, 2)?),
            'u' => out.push(hex_escape(&mut chars, 4)?),
            'U' => out.push(hex_escape(&mut chars, 8)?),
            'N' => return None,
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    Some(out)
}

fn hex_escape(chars: &mut impl Iterator<Item = char>, digits: usize) -> Option<char> {
    let mut code = 0u32;
    for _ in 0..digits {
        code = code * 16 + chars.next()?.to_digit(16)?;
    }
    char::from_u32(code)
}
