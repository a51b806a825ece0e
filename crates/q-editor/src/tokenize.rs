//! Syntax tokenizers.
//!
//! A [`Tokenizer`] turns one line of text into a run-length list of
//! [`Token`]s: a [`Category`] plus a length in chars. The lengths of the
//! returned tokens always add up to the char count of the input, so a
//! renderer can walk the line and the tokens side by side.
//!
//! # Architecture
//!
//! 1. [`TokenizerRegistry`] maps file extensions and exact file names to a
//!    [`Language`]. Anything unmatched falls back to [`Language::Plain`].
//! 2. [`Language::tokenizer`] builds the implementation:
//!    - **Rust**: tree-sitter with the grammar's bundled highlight query.
//!    - **Python, shell, C-like, config**: a regex scanner with a keyword
//!      list and a line-comment prefix.
//!    - **Plain**: one `Text` token for the whole line.
//! 3. Lines cache their tokens (see [`Line::tokens`](crate::line::Line::tokens)),
//!    so a tokenizer only runs for lines whose text changed.
//!
//! Tokenization is per line. Constructs that span lines (block comments,
//! multi-line strings) are highlighted only on the line where they open.

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Parser, Query, QueryCursor};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Syntax category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Ordinary text, no highlighting.
    Text,
    Keyword,
    Function,
    Macro,
    Type,
    String,
    Number,
    Constant,
    Comment,
    Operator,
    Punctuation,
    Variable,
    Property,
    Attribute,
    Label,
}

/// A run of `len` chars sharing one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub category: Category,
    pub len: usize,
}

impl Token {
    #[inline]
    #[must_use]
    pub const fn new(category: Category, len: usize) -> Self {
        Self { category, len }
    }
}

/// Turns one line of text into tokens.
///
/// `&mut self` because parser-backed implementations reuse internal state
/// between calls.
pub trait Tokenizer {
    /// Short name, for logs and the status line.
    fn name(&self) -> &'static str;

    /// Tokenize `text`. Token lengths must sum to `text.chars().count()`.
    fn tokens(&mut self, text: &str) -> Vec<Token>;
}

// ---------------------------------------------------------------------------
// Plain text
// ---------------------------------------------------------------------------

/// Fallback tokenizer: the whole line is one `Text` token.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainText;

impl Tokenizer for PlainText {
    fn name(&self) -> &'static str {
        "text"
    }

    fn tokens(&mut self, text: &str) -> Vec<Token> {
        let len = text.chars().count();
        if len == 0 {
            Vec::new()
        } else {
            vec![Token::new(Category::Text, len)]
        }
    }
}

// ---------------------------------------------------------------------------
// Tree-sitter (Rust)
// ---------------------------------------------------------------------------

/// Tree-sitter tokenizer for Rust source.
pub struct TreeSitterTokenizer {
    parser: Parser,
    query: Query,
    /// Category for each capture index. `None` = leave as text.
    capture_categories: Vec<Option<Category>>,
}

impl TreeSitterTokenizer {
    /// Build a Rust tokenizer. Returns `None` if the grammar or the query
    /// fails to load.
    #[must_use]
    pub fn rust() -> Option<Self> {
        let lang: tree_sitter::Language = tree_sitter_rust::LANGUAGE.into();
        let mut parser = Parser::new();
        parser.set_language(&lang).ok()?;
        let query = Query::new(&lang, tree_sitter_rust::HIGHLIGHTS_QUERY).ok()?;
        let capture_categories = query
            .capture_names()
            .iter()
            .map(|name| capture_category(name))
            .collect();
        Some(Self {
            parser,
            query,
            capture_categories,
        })
    }
}

impl Tokenizer for TreeSitterTokenizer {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn tokens(&mut self, text: &str) -> Vec<Token> {
        let mut cells = vec![Category::Text; text.chars().count()];
        if cells.is_empty() {
            return Vec::new();
        }
        let Some(tree) = self.parser.parse(text, None) else {
            return run_length(&cells);
        };

        let mut cursor = QueryCursor::new();
        let mut captures = cursor.captures(&self.query, tree.root_node(), text.as_bytes());
        while let Some((m, _)) = captures.next() {
            for capture in m.captures {
                let Some(category) = self.capture_categories[capture.index as usize] else {
                    continue;
                };
                let node = capture.node;
                let start = byte_to_char(text, node.start_byte());
                let end = byte_to_char(text, node.end_byte()).min(cells.len());
                // Later captures are more specific and win.
                for cell in cells.iter_mut().take(end).skip(start) {
                    *cell = category;
                }
            }
        }
        run_length(&cells)
    }
}

impl std::fmt::Debug for TreeSitterTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeSitterTokenizer")
            .field("captures", &self.capture_categories.len())
            .finish_non_exhaustive()
    }
}

/// Map a highlight-query capture name to a category.
#[allow(clippy::match_same_arms)]
fn capture_category(name: &str) -> Option<Category> {
    let category = match name {
        "keyword" => Category::Keyword,
        "string" | "escape" => Category::String,
        "comment" | "comment.documentation" => Category::Comment,
        "function" | "function.method" => Category::Function,
        "function.macro" => Category::Macro,
        "type" | "type.builtin" | "constructor" => Category::Type,
        "constant" | "constant.builtin" => Category::Constant,
        "variable.builtin" | "variable.parameter" => Category::Variable,
        "operator" => Category::Operator,
        "punctuation.bracket" | "punctuation.delimiter" => Category::Punctuation,
        "property" => Category::Property,
        "attribute" => Category::Attribute,
        "label" => Category::Label,
        _ => return None,
    };
    Some(category)
}

// ---------------------------------------------------------------------------
// Keyword / regex scanner
// ---------------------------------------------------------------------------

/// Regex scanner for languages without a tree-sitter grammar here.
///
/// Recognizes a line comment, quoted strings, numbers, identifiers (keyword
/// when listed, function when followed by `(`), operators and punctuation.
#[derive(Debug)]
pub struct KeywordTokenizer {
    name: &'static str,
    keywords: &'static [&'static str],
    pattern: Regex,
}

impl KeywordTokenizer {
    /// Build a scanner. Returns `None` if the pattern fails to compile.
    #[must_use]
    pub fn new(
        name: &'static str,
        keywords: &'static [&'static str],
        comment: &str,
    ) -> Option<Self> {
        let pattern = format!(
            r#"(?P<comment>{}.*$)|(?P<string>"(?:[^"\\]|\\.)*"?|'(?:[^'\\]|\\.)*'?)|(?P<number>\b\d[\w.]*)|(?P<word>[A-Za-z_]\w*)(?P<call>\s*\()?|(?P<op>[-+*/%=<>!&|^~?]+)|(?P<punct>[()\[\]{{}},.;:@$])"#,
            regex::escape(comment)
        );
        let pattern = Regex::new(&pattern).ok()?;
        Some(Self {
            name,
            keywords,
            pattern,
        })
    }
}

impl Tokenizer for KeywordTokenizer {
    fn name(&self) -> &'static str {
        self.name
    }

    fn tokens(&mut self, text: &str) -> Vec<Token> {
        let mut cells = vec![Category::Text; text.chars().count()];
        for caps in self.pattern.captures_iter(text) {
            let (m, category) = if let Some(m) = caps.name("comment") {
                (m, Category::Comment)
            } else if let Some(m) = caps.name("string") {
                (m, Category::String)
            } else if let Some(m) = caps.name("number") {
                (m, Category::Number)
            } else if let Some(m) = caps.name("word") {
                let category = if self.keywords.contains(&m.as_str()) {
                    Category::Keyword
                } else if caps.name("call").is_some() {
                    Category::Function
                } else {
                    Category::Text
                };
                (m, category)
            } else if let Some(m) = caps.name("op") {
                (m, Category::Operator)
            } else if let Some(m) = caps.name("punct") {
                (m, Category::Punctuation)
            } else {
                continue;
            };
            let start = byte_to_char(text, m.start());
            let end = byte_to_char(text, m.end());
            for cell in &mut cells[start..end] {
                *cell = category;
            }
            // The `(` of a call is punctuation, not part of the name.
            if let Some(call) = caps.name("call") {
                let start = byte_to_char(text, call.start());
                let end = byte_to_char(text, call.end());
                cells[start..end - 1].fill(Category::Text);
                cells[end - 1] = Category::Punctuation;
            }
        }
        run_length(&cells)
    }
}

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

const SHELL_KEYWORDS: &[&str] = &[
    "if", "then", "else", "elif", "fi", "case", "esac", "for", "select", "while", "until",
    "do", "done", "in", "function", "time", "local", "export", "readonly", "return", "exit",
];

const C_LIKE_KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "class", "const", "continue", "default", "do", "double",
    "else", "enum", "extern", "false", "float", "for", "func", "function", "goto", "if",
    "import", "int", "interface", "let", "long", "namespace", "new", "null", "package",
    "private", "public", "return", "short", "signed", "sizeof", "static", "struct", "switch",
    "this", "true", "typedef", "union", "unsigned", "var", "void", "volatile", "while",
];

const CONF_KEYWORDS: &[&str] = &["true", "false", "yes", "no", "on", "off"];

// ---------------------------------------------------------------------------
// Language + registry
// ---------------------------------------------------------------------------

/// Languages with a dedicated tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Plain,
    Rust,
    Python,
    Shell,
    CLike,
    Conf,
}

impl Language {
    /// Build a tokenizer for the language, falling back to plain text if the
    /// backing grammar or pattern cannot be loaded.
    #[must_use]
    pub fn tokenizer(self) -> Box<dyn Tokenizer> {
        let built: Option<Box<dyn Tokenizer>> = match self {
            Self::Plain => None,
            Self::Rust => TreeSitterTokenizer::rust().map(|t| Box::new(t) as Box<dyn Tokenizer>),
            Self::Python => keyword_box("python", PYTHON_KEYWORDS, "#"),
            Self::Shell => keyword_box("shell", SHELL_KEYWORDS, "#"),
            Self::CLike => keyword_box("c", C_LIKE_KEYWORDS, "//"),
            Self::Conf => keyword_box("conf", CONF_KEYWORDS, "#"),
        };
        built.unwrap_or_else(|| {
            if self != Self::Plain {
                tracing::warn!(language = ?self, "tokenizer unavailable, using plain text");
            }
            Box::new(PlainText)
        })
    }
}

fn keyword_box(
    name: &'static str,
    keywords: &'static [&'static str],
    comment: &str,
) -> Option<Box<dyn Tokenizer>> {
    KeywordTokenizer::new(name, keywords, comment).map(|t| Box::new(t) as Box<dyn Tokenizer>)
}

/// Chooses a [`Language`] for a path: exact file name first, then
/// extension, then plain text.
#[derive(Debug, Clone)]
pub struct TokenizerRegistry {
    by_file_name: HashMap<String, Language>,
    by_extension: HashMap<String, Language>,
}

impl TokenizerRegistry {
    /// A registry with no entries. Every path resolves to plain text.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            by_file_name: HashMap::new(),
            by_extension: HashMap::new(),
        }
    }

    /// Map an extension (without the dot) to a language.
    pub fn register_extension(&mut self, ext: &str, lang: Language) {
        self.by_extension.insert(ext.to_ascii_lowercase(), lang);
    }

    /// Map an exact file name to a language. Takes precedence over the
    /// extension.
    pub fn register_file_name(&mut self, name: &str, lang: Language) {
        self.by_file_name.insert(name.to_string(), lang);
    }

    /// Language for `path`.
    #[must_use]
    pub fn detect(&self, path: &Path) -> Language {
        let by_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| self.by_file_name.get(n));
        let by_ext = || {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(|e| self.by_extension.get(&e.to_ascii_lowercase()))
        };
        by_name.or_else(by_ext).copied().unwrap_or(Language::Plain)
    }

    /// Build the tokenizer for `path`.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> Box<dyn Tokenizer> {
        self.detect(path).tokenizer()
    }
}

impl Default for TokenizerRegistry {
    fn default() -> Self {
        let mut reg = Self::empty();
        reg.register_extension("rs", Language::Rust);
        for ext in ["py", "pyw"] {
            reg.register_extension(ext, Language::Python);
        }
        for ext in ["sh", "bash", "zsh"] {
            reg.register_extension(ext, Language::Shell);
        }
        for ext in ["c", "h", "cc", "cpp", "hpp", "java", "js", "ts", "go", "cs"] {
            reg.register_extension(ext, Language::CLike);
        }
        for ext in ["conf", "cfg", "ini", "toml"] {
            reg.register_extension(ext, Language::Conf);
        }
        reg.register_file_name("config.txt", Language::Conf);
        for name in ["Makefile", ".bashrc", ".profile"] {
            reg.register_file_name(name, Language::Shell);
        }
        reg
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Char index of byte offset `byte` in `s` (clamped to the end).
fn byte_to_char(s: &str, byte: usize) -> usize {
    let byte = byte.min(s.len());
    s.char_indices().take_while(|(b, _)| *b < byte).count()
}

/// Collapse per-char categories into runs.
fn run_length(cells: &[Category]) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    for &category in cells {
        match tokens.last_mut() {
            Some(last) if last.category == category => last.len += 1,
            _ => tokens.push(Token::new(category, 1)),
        }
    }
    tokens
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Category covering char column `col`.
    fn category_at(tokens: &[Token], col: usize) -> Category {
        let mut start = 0;
        for t in tokens {
            if col < start + t.len {
                return t.category;
            }
            start += t.len;
        }
        panic!("column {col} past end of tokens");
    }

    fn total_len(tokens: &[Token]) -> usize {
        tokens.iter().map(|t| t.len).sum()
    }

    // -- Plain text ---------------------------------------------------------

    #[test]
    fn plain_single_token() {
        let mut t = PlainText;
        assert_eq!(t.tokens("hello world"), vec![Token::new(Category::Text, 11)]);
        assert!(t.tokens("").is_empty());
    }

    #[test]
    fn plain_counts_chars_not_bytes() {
        let mut t = PlainText;
        assert_eq!(t.tokens("café"), vec![Token::new(Category::Text, 4)]);
    }

    // -- Tree-sitter Rust ---------------------------------------------------

    #[test]
    fn rust_keyword_and_constant() {
        let mut t = TreeSitterTokenizer::rust().unwrap();
        let tokens = t.tokens("let x = 42;");
        assert_eq!(total_len(&tokens), 11);
        assert_eq!(category_at(&tokens, 0), Category::Keyword);
        assert_eq!(category_at(&tokens, 2), Category::Keyword);
        assert_eq!(category_at(&tokens, 8), Category::Constant);
    }

    #[test]
    fn rust_comment() {
        let mut t = TreeSitterTokenizer::rust().unwrap();
        let tokens = t.tokens("// hello");
        assert_eq!(tokens, vec![Token::new(Category::Comment, 8)]);
    }

    #[test]
    fn rust_string() {
        let mut t = TreeSitterTokenizer::rust().unwrap();
        let tokens = t.tokens("let s = \"hello\";");
        assert_eq!(category_at(&tokens, 8), Category::String);
        assert_eq!(category_at(&tokens, 10), Category::String);
    }

    #[test]
    fn rust_function_definition() {
        let mut t = TreeSitterTokenizer::rust().unwrap();
        let tokens = t.tokens("fn foo() {}");
        assert_eq!(category_at(&tokens, 0), Category::Keyword);
        assert_eq!(category_at(&tokens, 3), Category::Function);
    }

    #[test]
    fn rust_multibyte_columns() {
        let mut t = TreeSitterTokenizer::rust().unwrap();
        let text = "// héllo wörld";
        let tokens = t.tokens(text);
        assert_eq!(total_len(&tokens), text.chars().count());
    }

    #[test]
    fn rust_empty_line() {
        let mut t = TreeSitterTokenizer::rust().unwrap();
        assert!(t.tokens("").is_empty());
    }

    // -- Keyword scanner ----------------------------------------------------

    #[test]
    fn python_line() {
        let mut t = KeywordTokenizer::new("python", PYTHON_KEYWORDS, "#").unwrap();
        let text = "def f(x): return 'a' # done";
        let tokens = t.tokens(text);
        assert_eq!(total_len(&tokens), text.chars().count());
        assert_eq!(category_at(&tokens, 0), Category::Keyword);
        assert_eq!(category_at(&tokens, 4), Category::Function);
        assert_eq!(category_at(&tokens, 5), Category::Punctuation);
        assert_eq!(category_at(&tokens, 10), Category::Keyword);
        assert_eq!(category_at(&tokens, 17), Category::String);
        assert_eq!(category_at(&tokens, 21), Category::Comment);
        assert_eq!(category_at(&tokens, 26), Category::Comment);
    }

    #[test]
    fn c_like_comment_and_number() {
        let mut t = KeywordTokenizer::new("c", C_LIKE_KEYWORDS, "//").unwrap();
        let tokens = t.tokens("int n = 10; // ten");
        assert_eq!(category_at(&tokens, 0), Category::Keyword);
        assert_eq!(category_at(&tokens, 4), Category::Text);
        assert_eq!(category_at(&tokens, 6), Category::Operator);
        assert_eq!(category_at(&tokens, 8), Category::Number);
        assert_eq!(category_at(&tokens, 12), Category::Comment);
    }

    #[test]
    fn keyword_inside_identifier_is_text() {
        let mut t = KeywordTokenizer::new("python", PYTHON_KEYWORDS, "#").unwrap();
        let tokens = t.tokens("format");
        assert_eq!(tokens, vec![Token::new(Category::Text, 6)]);
    }

    #[test]
    fn unterminated_string_runs_to_end() {
        let mut t = KeywordTokenizer::new("shell", SHELL_KEYWORDS, "#").unwrap();
        let tokens = t.tokens("echo \"oops");
        assert_eq!(category_at(&tokens, 9), Category::String);
    }

    // -- Registry -----------------------------------------------------------

    #[test]
    fn detect_by_extension() {
        let reg = TokenizerRegistry::default();
        assert_eq!(reg.detect(Path::new("main.rs")), Language::Rust);
        assert_eq!(reg.detect(Path::new("/a/b/script.PY")), Language::Python);
        assert_eq!(reg.detect(Path::new("x.c")), Language::CLike);
    }

    #[test]
    fn detect_by_file_name_beats_extension() {
        let reg = TokenizerRegistry::default();
        assert_eq!(reg.detect(Path::new("/etc/quire/config.txt")), Language::Conf);
        assert_eq!(reg.detect(Path::new("notes.txt")), Language::Plain);
        assert_eq!(reg.detect(Path::new("Makefile")), Language::Shell);
    }

    #[test]
    fn unknown_falls_back_to_plain() {
        let reg = TokenizerRegistry::default();
        assert_eq!(reg.detect(Path::new("no_ext")), Language::Plain);
        assert_eq!(reg.resolve(Path::new("x.unknown")).name(), "text");
    }

    #[test]
    fn custom_registration() {
        let mut reg = TokenizerRegistry::empty();
        assert_eq!(reg.detect(Path::new("a.rs")), Language::Plain);
        reg.register_extension("rs", Language::Rust);
        assert_eq!(reg.resolve(Path::new("a.rs")).name(), "rust");
    }

    // -- Helpers ------------------------------------------------------------

    #[test]
    fn run_length_merges_neighbors() {
        use Category::{Keyword, Text};
        let tokens = run_length(&[Keyword, Keyword, Text, Keyword]);
        assert_eq!(
            tokens,
            vec![Token::new(Keyword, 2), Token::new(Text, 1), Token::new(Keyword, 1)]
        );
    }

    #[test]
    fn byte_to_char_multibyte() {
        assert_eq!(byte_to_char("héllo", 0), 0);
        assert_eq!(byte_to_char("héllo", 3), 2);
        assert_eq!(byte_to_char("héllo", 99), 5);
    }
}
