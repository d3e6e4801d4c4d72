//! Python structural extractor built on tree-sitter.
//!
//! The extractor turns one source unit into a [`UnitMetadata`] record. It
//! never returns an error for bad input: syntax errors, unreadable files and
//! undecodable bytes are recorded in `parsing_errors`, and a routine whose
//! tree has an unexpected shape is kept as a degraded entry.
//!
//! Complexity, raise sites and yields are gathered over the routine's whole
//! subtree, nested routines included.

use std::collections::{BTreeSet, VecDeque};
use std::path::Path;

use tree_sitter::{Language, Node, Parser};
use tracing::{debug, warn};

use super::python_literal::{clean_docstring, collapse_whitespace, decode_literal};
use crate::core::errors::{DocsmithError, Result};
use crate::core::model::{
    ArgumentInfo, ClassMetadata, DegradedRoutine, FunctionEntry, LineSpan, ParsingError,
    RoutineMetadata, UnitMetadata,
};

#[cfg(test)]
#[path = "python_tests.rs"]
mod tests;

/// Node kinds that add one to the heuristic complexity.
const BRANCH_KINDS: &[&str] = &[
    "if_statement",
    "elif_clause",
    "for_statement",
    "while_statement",
    "with_statement",
    "try_statement",
    "boolean_operator",
    "list_comprehension",
    "dictionary_comprehension",
];

/// Node kinds that open a nesting level.
const NESTING_KINDS: &[&str] = &[
    "for_statement",
    "while_statement",
    "with_statement",
    "try_statement",
    "function_definition",
];

/// Name recorded for a degraded routine whose name could not be read.
const UNKNOWN_ROUTINE: &str = "<unknown>";

/// Get the tree-sitter grammar for Python.
pub fn python_language() -> Language {
    tree_sitter_python::LANGUAGE.into()
}

/// Create a parser configured for Python.
pub fn create_parser() -> Result<Parser> {
    let mut parser = Parser::new();
    parser.set_language(&python_language()).map_err(|e| {
        DocsmithError::parse("python", format!("Failed to set parser language: {e}"))
    })?;
    Ok(parser)
}

/// Extracts routine, class and import metadata from Python source.
pub struct PythonExtractor {
    parser: Parser,
}

impl PythonExtractor {
    /// Create a new extractor
    pub fn new() -> Result<Self> {
        Ok(Self {
            parser: create_parser()?,
        })
    }

    /// Read and extract one file, recording read and decode failures on the unit.
    pub fn extract_file(&mut self, path: &Path) -> UnitMetadata {
        let file_path = path.display().to_string();

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read {}: {}", file_path, e);
                let mut unit = UnitMetadata::new(file_path);
                unit.parsing_errors
                    .push(ParsingError::new("IoError", e.to_string()));
                return unit;
            }
        };

        match std::str::from_utf8(&bytes) {
            Ok(source) => {
                let source = source.strip_prefix('\u{feff}').unwrap_or(source);
                self.extract_source(source, &file_path)
            }
            Err(e) => {
                warn!("Failed to decode {} as UTF-8: {}", file_path, e);
                let mut unit = UnitMetadata::new(file_path);
                unit.parsing_errors.push(ParsingError::new(
                    "UnicodeDecodeError",
                    format!(
                        "'utf-8' codec can't decode byte at position {}",
                        e.valid_up_to()
                    ),
                ));
                unit
            }
        }
    }

    /// Extract metadata from source text.
    pub fn extract_source(&mut self, source: &str, file_path: &str) -> UnitMetadata {
        let mut unit = UnitMetadata::new(file_path);

        let Some(tree) = self.parser.parse(source, None) else {
            warn!("Parser produced no tree for {}", file_path);
            unit.parsing_errors.push(ParsingError::new(
                "SyntaxError",
                "parser produced no syntax tree",
            ));
            return unit;
        };

        let root = tree.root_node();
        if root.has_error() {
            let (line, column) = first_error_position(root);
            let message = format!("invalid syntax at line {line}, column {column}");
            warn!("Syntax error in {}: {}", file_path, message);
            unit.parsing_errors
                .push(ParsingError::new("SyntaxError", message));
            return unit;
        }

        let walker = UnitWalker {
            source: source.as_bytes(),
        };
        walker.walk(root, &mut unit);

        debug!(
            "Extracted {} routines, {} classes and {} imports from {}",
            unit.functions.len(),
            unit.classes.len(),
            unit.imports.len(),
            file_path
        );
        unit
    }
}

/// Locate the first ERROR or MISSING node, 1-based line and column.
fn first_error_position(root: Node) -> (usize, usize) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let position = node.start_position();
            return (position.row + 1, position.column + 1);
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    let position = root.start_position();
    (position.row + 1, position.column + 1)
}

/// Wrapper nodes with no syntax-tree level of their own: their children
/// sit at the same depth as the wrapper.
const TRANSPARENT_KINDS: &[&str] = &[
    "block",
    "decorated_definition",
    "else_clause",
    "finally_clause",
];

/// Queue the children one level below `node`, flattening transparent wrappers.
fn push_level_children<'tree>(node: Node<'tree>, queue: &mut VecDeque<Node<'tree>>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if TRANSPARENT_KINDS.contains(&child.kind()) {
            push_level_children(child, queue);
        } else {
            queue.push_back(child);
        }
    }
}

struct UnitWalker<'src> {
    source: &'src [u8],
}

impl<'src> UnitWalker<'src> {
    /// Breadth-first over the tree: definitions are listed level by level,
    /// in source order within a level.
    fn walk(&self, root: Node, unit: &mut UnitMetadata) {
        let mut queue = VecDeque::from([root]);
        while let Some(node) = queue.pop_front() {
            match node.kind() {
                "function_definition" => unit.functions.push(self.routine_entry(node)),
                "class_definition" => unit.classes.push(self.class_metadata(node)),
                "import_statement" => self.plain_imports(node, &mut unit.imports),
                "import_from_statement" => self.from_imports(node, &mut unit.imports),
                _ => {}
            }
            push_level_children(node, &mut queue);
        }
    }

    fn text(&self, node: Node) -> Result<&'src str> {
        node.utf8_text(self.source).map_err(DocsmithError::from)
    }

    /// Render an expression as single-line source text.
    fn render(&self, node: Node) -> Option<String> {
        let rendered = collapse_whitespace(self.text(node).ok()?);
        (!rendered.is_empty()).then_some(rendered)
    }

    fn routine_entry(&self, node: Node) -> FunctionEntry {
        match self.routine_metadata(node) {
            Ok(routine) => routine.into(),
            Err(e) => {
                let name = node
                    .child_by_field_name("name")
                    .and_then(|name| self.text(name).ok())
                    .unwrap_or(UNKNOWN_ROUTINE)
                    .to_string();
                warn!("Degraded metadata for routine '{}': {}", name, e);
                FunctionEntry::Degraded(DegradedRoutine {
                    name,
                    parse_error: e.to_string(),
                })
            }
        }
    }

    fn routine_metadata(&self, node: Node) -> Result<RoutineMetadata> {
        let name_node = required_field(node, "name")?;
        let parameters = required_field(node, "parameters")?;
        let body = required_field(node, "body")?;

        let start_line = node.start_position().row + 1;
        let mut routine = RoutineMetadata::new(self.text(name_node)?, start_line);
        routine.args = self.arguments(parameters)?;
        routine.returns = node
            .child_by_field_name("return_type")
            .and_then(|annotation| self.render(annotation));
        routine.decorators = self.decorators(node);
        routine.end_line = node.end_position().row + 1;
        routine.indent = node.start_position().column;
        routine.is_async = node.child(0).is_some_and(|first| first.kind() == "async");

        routine.complexity = 1 + count_branches(node);
        routine.nesting_depth = max_nesting(node, 0);
        self.collect_raises(node, &mut routine.raises);
        routine.yields = contains_yield(node);
        routine.returns_value = returns_value(body);

        let colon_line = colon_line(node).unwrap_or(start_line);
        if let Some(first) = first_statement(body) {
            routine.body_start_line = first.start_position().row + 1;
            routine.inline_body = routine.body_start_line == colon_line;
        }

        if let Some((docstring, span)) = self.docstring(body)? {
            routine.has_docstring = !docstring.is_empty();
            routine.docstring = Some(docstring);
            routine.docstring_span = Some(span);
        }

        Ok(routine)
    }

    /// Positional parameters in declaration order; stops at the first
    /// variadic or keyword-only marker.
    fn arguments(&self, parameters: Node) -> Result<Vec<ArgumentInfo>> {
        let mut args = Vec::new();
        let mut cursor = parameters.walk();

        for param in parameters.named_children(&mut cursor) {
            let arg = match param.kind() {
                "identifier" => ArgumentInfo::new(self.text(param)?),
                "default_parameter" => {
                    let name = required_field(param, "name")?;
                    let mut arg = ArgumentInfo::new(self.text(name)?);
                    arg.default = param
                        .child_by_field_name("value")
                        .and_then(|value| self.render(value));
                    arg
                }
                "typed_default_parameter" => {
                    let name = required_field(param, "name")?;
                    let mut arg = ArgumentInfo::new(self.text(name)?);
                    arg.annotation = param
                        .child_by_field_name("type")
                        .and_then(|ty| self.render(ty));
                    arg.default = param
                        .child_by_field_name("value")
                        .and_then(|value| self.render(value));
                    arg
                }
                "typed_parameter" => {
                    let Some(target) = param.named_child(0) else {
                        return Err(DocsmithError::parse(
                            "python",
                            "typed parameter without a target",
                        ));
                    };
                    if target.kind() != "identifier" {
                        // `*args: T` / `**kwargs: T`
                        break;
                    }
                    let mut arg = ArgumentInfo::new(self.text(target)?);
                    arg.annotation = param
                        .child_by_field_name("type")
                        .and_then(|ty| self.render(ty));
                    arg
                }
                "positional_separator" | "comment" => continue,
                "list_splat_pattern" | "dictionary_splat_pattern" | "keyword_separator" => break,
                other => {
                    return Err(DocsmithError::parse(
                        "python",
                        format!("unsupported parameter node '{other}'"),
                    ))
                }
            };
            args.push(arg);
        }

        Ok(args)
    }

    fn decorators(&self, node: Node) -> Vec<String> {
        let Some(parent) = node.parent().filter(|p| p.kind() == "decorated_definition") else {
            return Vec::new();
        };

        let mut cursor = parent.walk();
        parent
            .named_children(&mut cursor)
            .filter(|child| child.kind() == "decorator")
            .filter_map(|decorator| decorator.named_child(0))
            .filter_map(|expr| self.render(expr))
            .collect()
    }

    fn collect_raises(&self, node: Node, raises: &mut BTreeSet<String>) {
        if node.kind() == "raise_statement" {
            let cause = node.child_by_field_name("cause");
            let mut cursor = node.walk();
            let raised = node
                .named_children(&mut cursor)
                .find(|child| Some(*child) != cause && child.kind() != "comment");
            let name = raised
                .and_then(|expr| self.render(expr))
                .unwrap_or_else(|| "Exception".to_string());
            raises.insert(name);
        }

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.collect_raises(child, raises);
        }
    }

    /// Docstring text and span of a block's leading string statement.
    fn docstring(&self, body: Node) -> Result<Option<(String, LineSpan)>> {
        let Some(statement) = first_statement(body) else {
            return Ok(None);
        };
        if statement.kind() != "expression_statement" || statement.named_child_count() != 1 {
            return Ok(None);
        }
        let Some(expr) = statement.named_child(0) else {
            return Ok(None);
        };

        let raw = match expr.kind() {
            "string" => match decode_literal(self.text(expr)?) {
                Some(literal) if literal.is_docstring_candidate() => literal.value,
                _ => return Ok(None),
            },
            "concatenated_string" => {
                let mut joined = String::new();
                let mut cursor = expr.walk();
                for part in expr.named_children(&mut cursor) {
                    if part.kind() != "string" {
                        continue;
                    }
                    match decode_literal(self.text(part)?) {
                        Some(literal) if literal.is_docstring_candidate() => {
                            joined.push_str(&literal.value);
                        }
                        _ => return Ok(None),
                    }
                }
                joined
            }
            _ => return Ok(None),
        };

        let span = LineSpan::new(
            statement.start_position().row + 1,
            statement.end_position().row + 1,
        );
        Ok(Some((clean_docstring(&raw), span)))
    }

    fn class_metadata(&self, node: Node) -> ClassMetadata {
        let name = node
            .child_by_field_name("name")
            .and_then(|name| self.text(name).ok())
            .unwrap_or(UNKNOWN_ROUTINE)
            .to_string();

        let bases = node
            .child_by_field_name("superclasses")
            .map(|args| {
                let mut cursor = args.walk();
                args.named_children(&mut cursor)
                    .filter(|arg| !matches!(arg.kind(), "keyword_argument" | "comment"))
                    .filter_map(|arg| self.render(arg))
                    .collect()
            })
            .unwrap_or_default();

        let body = node.child_by_field_name("body");
        let (docstring, has_docstring) = match body.map(|b| self.docstring(b)) {
            Some(Ok(Some((text, _)))) => {
                let present = !text.is_empty();
                (Some(text), present)
            }
            _ => (None, false),
        };

        let methods = body
            .map(|block| {
                let mut cursor = block.walk();
                block
                    .named_children(&mut cursor)
                    .filter_map(|stmt| match stmt.kind() {
                        "function_definition" => Some(stmt),
                        "decorated_definition" => stmt
                            .child_by_field_name("definition")
                            .filter(|def| def.kind() == "function_definition"),
                        _ => None,
                    })
                    .map(|def| self.routine_entry(def))
                    .collect()
            })
            .unwrap_or_default();

        ClassMetadata {
            name,
            bases,
            has_docstring,
            docstring,
            start_line: node.start_position().row + 1,
            end_line: node.end_position().row + 1,
            methods,
        }
    }

    fn plain_imports(&self, node: Node, imports: &mut Vec<String>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if let Some(name) = self.imported_name(child) {
                imports.push(name);
            }
        }
    }

    fn from_imports(&self, node: Node, imports: &mut Vec<String>) {
        let module_node = node.child_by_field_name("module_name");
        let module = module_node
            .and_then(|module| self.text(module).ok())
            .map(|text| text.trim_start_matches('.').trim().to_string())
            .unwrap_or_default();

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if Some(child) == module_node {
                continue;
            }
            let name = if child.kind() == "wildcard_import" {
                Some("*".to_string())
            } else {
                self.imported_name(child)
            };
            if let Some(name) = name {
                if module.is_empty() {
                    imports.push(name);
                } else {
                    imports.push(format!("{module}.{name}"));
                }
            }
        }
    }

    fn imported_name(&self, node: Node) -> Option<String> {
        match node.kind() {
            "dotted_name" => self.render(node),
            "aliased_import" => node
                .child_by_field_name("name")
                .and_then(|name| self.render(name)),
            _ => None,
        }
    }
}

fn required_field<'tree>(node: Node<'tree>, field: &str) -> Result<Node<'tree>> {
    node.child_by_field_name(field).ok_or_else(|| {
        DocsmithError::parse(
            "python",
            format!("{} is missing its '{}' field", node.kind(), field),
        )
    })
}

/// First statement of a block, skipping comments.
fn first_statement(body: Node) -> Option<Node> {
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment");
    first
}

/// Line of the colon that closes a definition header.
fn colon_line(node: Node) -> Option<usize> {
    let mut cursor = node.walk();
    let colon = node
        .children(&mut cursor)
        .find(|child| !child.is_named() && child.kind() == ":");
    colon.map(|colon| colon.end_position().row + 1)
}

fn count_branches(node: Node) -> usize {
    let own = usize::from(BRANCH_KINDS.contains(&node.kind()));
    let mut cursor = node.walk();
    let nested: usize = node
        .named_children(&mut cursor)
        .map(count_branches)
        .sum();
    own + nested
}

/// Deepest block nesting below `node`, which sits at `depth`.
fn max_nesting(node: Node, depth: usize) -> usize {
    let mut deepest = depth;
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        let child_depth = match child.kind() {
            "if_statement" => if_chain_nesting(child, depth + 1),
            kind if NESTING_KINDS.contains(&kind) => max_nesting(child, depth + 1),
            _ => max_nesting(child, depth),
        };
        deepest = deepest.max(child_depth);
    }
    deepest
}

/// Each `elif` sits one level below the branch before it; `else` shares
/// the level of the last branch.
fn if_chain_nesting(node: Node, depth: usize) -> usize {
    let mut deepest = depth;
    let mut level = depth;
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        let child_depth = match child.kind() {
            "elif_clause" => {
                level += 1;
                max_nesting(child, level)
            }
            "else_clause" => max_nesting(child, level),
            _ => max_nesting(child, depth),
        };
        deepest = deepest.max(child_depth);
    }
    deepest
}

fn contains_yield(node: Node) -> bool {
    if node.kind() == "yield" && node.is_named() {
        return true;
    }
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).any(contains_yield);
    found
}

/// Whether a `return <expr>` occurs in this body, outside nested scopes.
fn returns_value(node: Node) -> bool {
    match node.kind() {
        "return_statement" => {
            let mut cursor = node.walk();
            let has_value = node
                .named_children(&mut cursor)
                .any(|child| child.kind() != "comment");
            has_value
        }
        "function_definition" | "class_definition" | "lambda" => false,
        _ => {
            let mut cursor = node.walk();
            let found = node.named_children(&mut cursor).any(returns_value);
            found
        }
    }
}
