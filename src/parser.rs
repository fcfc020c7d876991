use crate::error::{Error, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

/// Path recorded for sources that did not come from a file.
pub const INLINE_SOURCE: &str = "<source>";

/// Python parser built on tree-sitter.
///
/// tree-sitter recovers from syntax errors by inserting `ERROR` and `MISSING`
/// nodes instead of failing. `PythonParser` rejects any tree containing such
/// nodes, so a malformed source never reaches route extraction.
///
/// # Example
///
/// ```no_run
/// use openapi_from_python::parser::PythonParser;
///
/// let parsed = PythonParser::parse_source("def ping():\n    pass\n").unwrap();
/// println!("{} top-level statements", parsed.tree.root_node().named_child_count());
/// ```
pub struct PythonParser;

/// A successfully parsed Python source with its concrete syntax tree.
///
/// The source text is kept alongside the tree because tree-sitter nodes only
/// carry byte offsets.
#[derive(Debug)]
pub struct ParsedFile {
    /// Path to the source file, or [`INLINE_SOURCE`]
    pub path: PathBuf,
    /// The source text the tree was built from
    pub source: String,
    /// The parsed syntax tree
    pub tree: Tree,
}

impl ParsedFile {
    /// Raw bytes of the source, as expected by `Node::utf8_text`.
    pub fn bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }
}

impl PythonParser {
    /// Parses Python source text held in memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SyntaxFailure`] describing the first invalid
    /// location when the text is not valid Python.
    pub fn parse_source(source: &str) -> Result<ParsedFile> {
        Self::parse_with_path(source.to_string(), PathBuf::from(INLINE_SOURCE))
    }

    /// Reads and parses a single Python source file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The file contains invalid Python syntax
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());

        let content = fs::read_to_string(path)?;
        let parsed = Self::parse_with_path(content, path.to_path_buf())?;

        debug!("Successfully parsed file: {}", path.display());
        Ok(parsed)
    }

    /// Parses multiple Python files, returning one result per path.
    ///
    /// Failures are logged as warnings but do not stop the remaining files
    /// from being parsed; callers decide whether a single failure is fatal.
    pub fn parse_files(paths: &[PathBuf]) -> Vec<Result<ParsedFile>> {
        debug!("Parsing {} files", paths.len());

        let results: Vec<Result<ParsedFile>> = paths
            .iter()
            .map(|path| match Self::parse_file(path) {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("Failed to parse {}: {}", path.display(), e);
                    Err(e)
                }
            })
            .collect();

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        debug!(
            "Parsing complete: {} succeeded, {} failed",
            success_count,
            results.len() - success_count
        );

        results
    }

    fn parse_with_path(source: String, path: PathBuf) -> Result<ParsedFile> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| Error::SyntaxFailure(format!("failed to load Python grammar: {}", e)))?;

        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| Error::SyntaxFailure("parser returned no tree".to_string()))?;

        let root = tree.root_node();
        if root.has_error() {
            let detail = first_error(root)
                .map(describe_error)
                .unwrap_or_else(|| "invalid syntax".to_string());
            return Err(Error::SyntaxFailure(detail));
        }
        if let Some(detail) = find_first(root, invalid_construct, |_| true) {
            return Err(Error::SyntaxFailure(detail));
        }

        Ok(ParsedFile { path, source, tree })
    }
}

/// Pre-order search over the tree with a `TreeCursor`, so deeply nested
/// expressions never grow the call stack. Children of a node are only
/// visited when `descend` accepts it.
fn find_first<'t, T>(
    root: Node<'t>,
    mut visit: impl FnMut(Node<'t>) -> Option<T>,
    descend: impl Fn(Node<'t>) -> bool,
) -> Option<T> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if let Some(found) = visit(node) {
            return Some(found);
        }
        if descend(node) && cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

/// First `ERROR` or `MISSING` node in source order.
fn first_error(root: Node) -> Option<Node> {
    find_first(
        root,
        |node| (node.is_error() || node.is_missing()).then_some(node),
        |node| node.has_error(),
    )
}

/// Constructs the tree-sitter grammar accepts but Python rejects.
fn invalid_construct(node: Node) -> Option<String> {
    let (offending, message) = match node.kind() {
        "parameters" | "lambda_parameters" => {
            misplaced_default(node).map(|n| (n, "non-default argument follows default argument"))
        }
        "delete_statement" => node
            .named_child(0)
            .and_then(|target| {
                if target.kind() == "expression_list" {
                    let mut cursor = target.walk();
                    let found = target
                        .named_children(&mut cursor)
                        .find(|t| t.kind() == "call");
                    found
                } else {
                    Some(target).filter(|t| t.kind() == "call")
                }
            })
            .map(|n| (n, "cannot delete function call")),
        "augmented_assignment" => node
            .child_by_field_name("left")
            .filter(|left| {
                matches!(
                    left.kind(),
                    "pattern_list"
                        | "tuple_pattern"
                        | "list_pattern"
                        | "list_splat_pattern"
                        | "expression_list"
                        | "tuple"
                        | "list"
                )
            })
            .map(|n| (n, "illegal expression for augmented assignment")),
        _ => None,
    }?;

    let pos = offending.start_position();
    Some(format!(
        "{} at line {}, column {}",
        message,
        pos.row + 1,
        pos.column + 1
    ))
}

/// A plain positional parameter after one with a default, before any `*`.
fn misplaced_default(params: Node) -> Option<Node> {
    let mut seen_default = false;
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        let plain = match param.kind() {
            "default_parameter" | "typed_default_parameter" => {
                seen_default = true;
                continue;
            }
            "identifier" => true,
            // `*args: T` and `**kw: T` are typed parameters too.
            "typed_parameter" => match param.named_child(0) {
                Some(inner) if inner.kind() == "identifier" => true,
                _ => return None,
            },
            "list_splat_pattern" | "dictionary_splat_pattern" | "keyword_separator" => {
                return None
            }
            _ => false,
        };
        if plain && seen_default {
            return Some(param);
        }
    }
    None
}

fn describe_error(node: Node) -> String {
    let pos = node.start_position();
    if node.is_missing() {
        format!(
            "missing `{}` at line {}, column {}",
            node.kind(),
            pos.row + 1,
            pos.column + 1
        )
    } else {
        format!("invalid syntax at line {}, column {}", pos.row + 1, pos.column + 1)
    }
}
