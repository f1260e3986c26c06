//! Code tokenization using syntect.
//!
//! Code is split into runs of text tagged with a [`TokenKind`]. The kinds use
//! the class names common to web highlighting themes (`keyword`, `string`,
//! `comment`, ...), so a single stylesheet can colour the output.

use std::sync::OnceLock;

use syntect::parsing::{ParseState, ParsingError, ScopeError, ScopeStack, SyntaxSet};
use syntect::util::LinesWithEndings;

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
    #[error("failed to parse code: {0}")]
    Parse(#[from] ParsingError),

    #[error("invalid scope stack: {0}")]
    Scope(#[from] ScopeError),
}

/// Classification of a run of code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Comment,
    String,
    Number,
    Boolean,
    Constant,
    Keyword,
    Operator,
    Function,
    ClassName,
    Tag,
    AttrName,
    Punctuation,
    Variable,
}

impl TokenKind {
    /// CSS class for this kind, used alongside the `token` class.
    pub fn class(self) -> &'static str {
        match self {
            TokenKind::Comment => "comment",
            TokenKind::String => "string",
            TokenKind::Number => "number",
            TokenKind::Boolean => "boolean",
            TokenKind::Constant => "constant",
            TokenKind::Keyword => "keyword",
            TokenKind::Operator => "operator",
            TokenKind::Function => "function",
            TokenKind::ClassName => "class-name",
            TokenKind::Tag => "tag",
            TokenKind::AttrName => "attr-name",
            TokenKind::Punctuation => "punctuation",
            TokenKind::Variable => "variable",
        }
    }
}

/// A run of code text. `kind` is `None` for text outside any known class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: Option<TokenKind>,
    pub text: String,
}

/// A syntax highlighter backed by syntect's bundled grammars.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntaxHighlighter;

impl SyntaxHighlighter {
    /// Split `code` into classified tokens.
    ///
    /// Returns `Ok(None)` when no grammar matches `lang`. Concatenating the
    /// token texts always gives back `code` unchanged.
    pub fn tokenize(&self, code: &str, lang: &str) -> Result<Option<Vec<Token>>, HighlightError> {
        let Some(syntax) = find_syntax(lang) else {
            return Ok(None);
        };

        let ss = syntax_set();
        let mut state = ParseState::new(syntax);
        let mut stack = ScopeStack::new();
        let mut tokens: Vec<Token> = Vec::new();

        for line in LinesWithEndings::from(code) {
            let ops = state.parse_line(line, ss)?;
            let mut start = 0;
            for (index, op) in ops {
                if index > start {
                    push_token(&mut tokens, classify(&stack), &line[start..index]);
                    start = index;
                }
                stack.apply(&op)?;
            }
            if start < line.len() {
                push_token(&mut tokens, classify(&stack), &line[start..]);
            }
        }

        Ok(Some(tokens))
    }
}

fn find_syntax(lang: &str) -> Option<&'static syntect::parsing::SyntaxReference> {
    let ss = syntax_set();
    let lang = grammar_alias(lang).unwrap_or(lang);
    ss.find_syntax_by_token(lang)
        .or_else(|| ss.find_syntax_by_extension(lang))
}

/// Fence tags with no bundled grammar, read with the closest one that exists.
/// JSX and TypeScript share JavaScript's keywords, strings and comments.
fn grammar_alias(lang: &str) -> Option<&'static str> {
    match lang.to_ascii_lowercase().as_str() {
        "jsx" | "ts" | "tsx" | "typescript" => Some("js"),
        _ => None,
    }
}

/// Append text, merging it into the previous token when the kind matches.
fn push_token(tokens: &mut Vec<Token>, kind: Option<TokenKind>, text: &str) {
    if let Some(last) = tokens.last_mut()
        && last.kind == kind
    {
        last.text.push_str(text);
        return;
    }
    tokens.push(Token {
        kind,
        text: text.to_string(),
    });
}

/// Map a scope stack onto a token kind.
///
/// Comments and strings win wherever they appear in the stack; otherwise the
/// innermost classifiable scope decides.
fn classify(stack: &ScopeStack) -> Option<TokenKind> {
    let scopes: Vec<String> = stack
        .as_slice()
        .iter()
        .map(|scope| scope.build_string())
        .collect();

    if scopes.iter().any(|s| has_prefix(s, "comment")) {
        return Some(TokenKind::Comment);
    }
    if scopes.iter().any(|s| has_prefix(s, "string")) {
        return Some(TokenKind::String);
    }

    scopes.iter().rev().find_map(|scope| classify_scope(scope))
}

fn classify_scope(scope: &str) -> Option<TokenKind> {
    let kind = if has_prefix(scope, "constant.numeric") {
        TokenKind::Number
    } else if has_prefix(scope, "constant.language") {
        if scope.contains("boolean") || scope.contains("true") || scope.contains("false") {
            TokenKind::Boolean
        } else {
            TokenKind::Constant
        }
    } else if has_prefix(scope, "constant") {
        TokenKind::Constant
    } else if has_prefix(scope, "keyword.operator") {
        TokenKind::Operator
    } else if has_prefix(scope, "keyword") || has_prefix(scope, "storage") {
        TokenKind::Keyword
    } else if has_prefix(scope, "entity.name.function") || has_prefix(scope, "support.function")
    {
        TokenKind::Function
    } else if has_prefix(scope, "entity.name.class")
        || has_prefix(scope, "entity.name.type")
        || has_prefix(scope, "support.class")
        || has_prefix(scope, "support.type")
    {
        TokenKind::ClassName
    } else if has_prefix(scope, "entity.name.tag") {
        TokenKind::Tag
    } else if has_prefix(scope, "entity.other.attribute-name") {
        TokenKind::AttrName
    } else if has_prefix(scope, "punctuation") {
        TokenKind::Punctuation
    } else if has_prefix(scope, "variable") {
        TokenKind::Variable
    } else {
        return None;
    };
    Some(kind)
}

/// Scope prefix match on whole atoms: `keyword` matches `keyword.control`
/// but not `keywords`.
fn has_prefix(scope: &str, prefix: &str) -> bool {
    scope
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}
