use super::Tokenizer;
use crate::error::TokenizerError;
use crate::types::TokenizedMethod;
use anyhow::{Context, Result};
use std::path::Path;
use tree_sitter::{Language, Node, Parser};

/// Grammar-specific node kinds used to find methods and their enclosing scopes
struct LanguageSpec {
    name: &'static str,
    method_kinds: &'static [&'static str],
    container_kinds: &'static [&'static str],
    separator: &'static str,
    /// Keyword closing a method whose grammar exposes no body node (Ruby's `end`)
    closing_keyword: Option<&'static str>,
}

static RUST: LanguageSpec = LanguageSpec {
    name: "Rust",
    method_kinds: &["function_item"],
    container_kinds: &["impl_item", "trait_item", "mod_item"],
    separator: "::",
    closing_keyword: None,
};

static PYTHON: LanguageSpec = LanguageSpec {
    name: "Python",
    method_kinds: &["function_definition"],
    container_kinds: &["class_definition"],
    separator: ".",
    closing_keyword: None,
};

static JAVASCRIPT: LanguageSpec = LanguageSpec {
    name: "JavaScript",
    method_kinds: &[
        "function_declaration",
        "generator_function_declaration",
        "method_definition",
    ],
    container_kinds: &["class_declaration", "class"],
    separator: ".",
    closing_keyword: None,
};

static TYPESCRIPT: LanguageSpec = LanguageSpec {
    name: "TypeScript",
    method_kinds: &[
        "function_declaration",
        "generator_function_declaration",
        "method_definition",
    ],
    container_kinds: &[
        "class_declaration",
        "abstract_class_declaration",
        "internal_module",
    ],
    separator: ".",
    closing_keyword: None,
};

static GO: LanguageSpec = LanguageSpec {
    name: "Go",
    method_kinds: &["function_declaration", "method_declaration"],
    container_kinds: &[],
    separator: ".",
    closing_keyword: None,
};

static JAVA: LanguageSpec = LanguageSpec {
    name: "Java",
    method_kinds: &["method_declaration", "constructor_declaration"],
    container_kinds: &[
        "class_declaration",
        "interface_declaration",
        "enum_declaration",
        "record_declaration",
    ],
    separator: ".",
    closing_keyword: None,
};

static C: LanguageSpec = LanguageSpec {
    name: "C",
    method_kinds: &["function_definition"],
    container_kinds: &[],
    separator: "::",
    closing_keyword: None,
};

static CPP: LanguageSpec = LanguageSpec {
    name: "C++",
    method_kinds: &["function_definition"],
    container_kinds: &["class_specifier", "struct_specifier", "namespace_definition"],
    separator: "::",
    closing_keyword: None,
};

static CSHARP: LanguageSpec = LanguageSpec {
    name: "C#",
    method_kinds: &["method_declaration", "constructor_declaration"],
    container_kinds: &[
        "class_declaration",
        "struct_declaration",
        "interface_declaration",
        "record_declaration",
        "namespace_declaration",
    ],
    separator: ".",
    closing_keyword: None,
};

static RUBY: LanguageSpec = LanguageSpec {
    name: "Ruby",
    method_kinds: &["method", "singleton_method"],
    container_kinds: &["class", "module"],
    separator: ".",
    closing_keyword: Some("end"),
};

static PHP: LanguageSpec = LanguageSpec {
    name: "PHP",
    method_kinds: &["function_definition", "method_declaration"],
    container_kinds: &[
        "class_declaration",
        "interface_declaration",
        "trait_declaration",
    ],
    separator: ".",
    closing_keyword: None,
};

const SUPPORTED_EXTENSIONS: &[&str] = &[
    "rs", "py", "js", "mjs", "cjs", "jsx", "ts", "tsx", "go", "java", "c", "h", "cpp", "cc",
    "cxx", "hpp", "hxx", "hh", "cs", "rb", "php",
];

/// File extensions the syntax tokenizer understands
pub fn supported_extensions() -> &'static [&'static str] {
    SUPPORTED_EXTENSIONS
}

fn language_for(extension: &str) -> Option<(Language, &'static LanguageSpec)> {
    let language: (Language, &'static LanguageSpec) = match extension.to_lowercase().as_str() {
        "rs" => (tree_sitter_rust::LANGUAGE.into(), &RUST),
        "py" => (tree_sitter_python::LANGUAGE.into(), &PYTHON),
        "js" | "mjs" | "cjs" | "jsx" => (tree_sitter_javascript::LANGUAGE.into(), &JAVASCRIPT),
        "ts" => (tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(), &TYPESCRIPT),
        "tsx" => (tree_sitter_typescript::LANGUAGE_TSX.into(), &TYPESCRIPT),
        "go" => (tree_sitter_go::LANGUAGE.into(), &GO),
        "java" => (tree_sitter_java::LANGUAGE.into(), &JAVA),
        "c" | "h" => (tree_sitter_c::LANGUAGE.into(), &C),
        "cpp" | "cc" | "cxx" | "hpp" | "hxx" | "hh" => (tree_sitter_cpp::LANGUAGE.into(), &CPP),
        "cs" => (tree_sitter_c_sharp::LANGUAGE.into(), &CSHARP),
        "rb" => (tree_sitter_ruby::LANGUAGE.into(), &RUBY),
        "php" => (tree_sitter_php::LANGUAGE_PHP.into(), &PHP),
        _ => return None,
    };
    Some(language)
}

fn extension_of(filename: &str) -> Option<&str> {
    Path::new(filename).extension().and_then(|ext| ext.to_str())
}

/// Tree-sitter based tokenizer producing qualified method names and body tokens
///
/// Identifiers take the form `Scope.name(ParamType, ...)`, using `::` as the scope
/// separator for Rust, C and C++. Parameters render as their declared type when the
/// grammar exposes one, otherwise as the parameter text.
#[derive(Debug, Clone, Default)]
pub struct SyntaxTokenizer;

impl SyntaxTokenizer {
    pub fn new() -> Self {
        Self
    }

    /// Name of the grammar used for a file, if any
    pub fn language_name(filename: &str) -> Option<&'static str> {
        extension_of(filename)
            .and_then(language_for)
            .map(|(_, spec)| spec.name)
    }
}

impl Tokenizer for SyntaxTokenizer {
    fn get_methods(&self, filename: &str, source_code: &str) -> Result<Vec<TokenizedMethod>> {
        let (language, spec) = extension_of(filename)
            .and_then(language_for)
            .ok_or_else(|| TokenizerError::UnsupportedLanguage(filename.to_string()))?;

        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .context("Failed to set parser language")?;

        let tree = parser
            .parse(source_code, None)
            .ok_or_else(|| TokenizerError::ParseFailed(filename.to_string()))?;

        let mut methods = Vec::new();
        let mut scope = Vec::new();
        collect_methods(
            tree.root_node(),
            source_code.as_bytes(),
            spec,
            &mut scope,
            &mut methods,
        );

        tracing::trace!(
            "Tokenized {} methods from {} ({})",
            methods.len(),
            filename,
            spec.name
        );
        Ok(methods)
    }

    fn supports(&self, filename: &str) -> bool {
        extension_of(filename).and_then(language_for).is_some()
    }
}

fn collect_methods(
    node: Node<'_>,
    source: &[u8],
    spec: &LanguageSpec,
    scope: &mut Vec<String>,
    result: &mut Vec<TokenizedMethod>,
) {
    let kind = node.kind();
    if spec.method_kinds.contains(&kind)
        && let Some(method) = method_from_node(node, source, spec, scope)
    {
        result.push(method);
    }

    let entered = spec.container_kinds.contains(&kind)
        && match container_name(node, source) {
            Some(name) => {
                scope.push(name);
                true
            }
            None => false,
        };

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_methods(child, source, spec, scope, result);
    }

    if entered {
        scope.pop();
    }
}

fn method_from_node(
    node: Node<'_>,
    source: &[u8],
    spec: &LanguageSpec,
    scope: &[String],
) -> Option<TokenizedMethod> {
    // C-family definitions nest the name inside declarators
    let mut signature_owner = node;
    let name_node = match node.child_by_field_name("name") {
        Some(name) => name,
        None => {
            let mut declarator = node.child_by_field_name("declarator")?;
            loop {
                if declarator.kind() == "function_declarator" {
                    signature_owner = declarator;
                }
                match declarator.child_by_field_name("declarator") {
                    Some(inner) => declarator = inner,
                    None => break declarator,
                }
            }
        }
    };
    let name = node_text(name_node, source)?;

    let mut segments: Vec<String> = scope.to_vec();
    if let Some(receiver) = node
        .child_by_field_name("receiver")
        .and_then(|receiver| receiver_type(receiver, source))
    {
        segments.push(receiver);
    }
    segments.push(name.to_string());

    let parameters = signature_owner.child_by_field_name("parameters");
    let rendered = parameters
        .map(|params| render_parameters(params, source))
        .unwrap_or_default();
    let identifier = format!("{}({})", segments.join(spec.separator), rendered);

    let header_end = parameters
        .map(|params| params.end_byte())
        .unwrap_or_else(|| name_node.end_byte());
    let tokens = body_tokens(node, header_end, source, spec);

    Some(TokenizedMethod::new(identifier, tokens))
}

fn container_name(node: Node<'_>, source: &[u8]) -> Option<String> {
    let name_node = node
        .child_by_field_name("name")
        .or_else(|| node.child_by_field_name("type"))?;
    let text = node_text(name_node, source)?;
    let base = text.split('<').next().unwrap_or(text).trim();
    if base.is_empty() {
        None
    } else {
        Some(base.to_string())
    }
}

/// Go method receivers qualify the method with their (dereferenced) type
fn receiver_type(receiver: Node<'_>, source: &[u8]) -> Option<String> {
    let mut cursor = receiver.walk();
    let declaration = receiver.named_children(&mut cursor).next()?;
    let type_node = declaration.child_by_field_name("type")?;
    let text = node_text(type_node, source)?;
    let base = text.trim_start_matches('*');
    let base = base.split('[').next().unwrap_or(base).trim();
    Some(base.to_string())
}

fn render_parameters(parameters: Node<'_>, source: &[u8]) -> String {
    let mut rendered = Vec::new();
    let mut cursor = parameters.walk();
    for parameter in parameters.named_children(&mut cursor) {
        if parameter.kind().contains("comment") {
            continue;
        }
        let shown = parameter
            .child_by_field_name("type")
            .unwrap_or(parameter);
        if let Some(text) = node_text(shown, source) {
            let text = text.trim_start_matches(':').trim();
            rendered.push(collapse_whitespace(text));
        }
    }
    rendered.join(", ")
}

fn body_tokens(node: Node<'_>, header_end: usize, source: &[u8], spec: &LanguageSpec) -> Vec<String> {
    let mut tokens = Vec::new();
    match (node.child_by_field_name("body"), spec.closing_keyword) {
        (Some(body), _) => collect_leaves(body, source, 0, &mut tokens),
        // Statements sit directly under the method node, between header and keyword
        (None, Some(keyword)) => {
            collect_leaves(node, source, header_end, &mut tokens);
            if tokens.last().is_some_and(|last| last == keyword) {
                tokens.pop();
            }
            let leading = tokens.iter().take_while(|token| *token == ";").count();
            tokens.drain(..leading);
        }
        // Abstract and interface declarations have no body at all
        (None, None) => {}
    }

    if tokens.len() >= 2 && tokens[0] == "{" && tokens[tokens.len() - 1] == "}" {
        tokens.pop();
        tokens.remove(0);
    }

    if tokens.is_empty() {
        tokens.push(String::new());
    }
    tokens
}

fn collect_leaves(node: Node<'_>, source: &[u8], min_start: usize, tokens: &mut Vec<String>) {
    if node.kind().contains("comment") || node.end_byte() <= min_start {
        return;
    }

    if node.child_count() == 0 {
        if node.start_byte() >= min_start
            && let Some(text) = node_text(node, source)
            && !text.is_empty()
        {
            tokens.push(text.to_string());
        }
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_leaves(child, source, min_start, tokens);
    }
}

fn node_text<'a>(node: Node<'_>, source: &'a [u8]) -> Option<&'a str> {
    node.utf8_text(source).ok()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
