//! Lexical analyzer for `.layout` templates.
//!
//! The lexer turns template text into a flat stream of [`Token`]s. Blocks are
//! not matched here; that is the job of the [`tree`](super::tree) builder.
//!
//! The public entry point is [`tokenize`]. Lexing is lenient: a template that
//! ends inside `{...}` or `[...]{...}` still yields a best-effort token plus a
//! warning. The only fatal condition is a `\` that is not followed by a
//! command name.

use log::{debug, warn};
use winnow::{
    Parser as _,
    error::{ContextError, ErrMode},
    token::{take_till, take_while},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
    tokens::{Token, TokenKind},
};

type IResult<O> = std::result::Result<O, ErrMode<ContextError>>;

/// Number of preceding tokens quoted when reporting an empty command name.
const ERROR_CONTEXT_TOKENS: usize = 5;

/// The token stream of a template together with the recoveries made.
#[derive(Debug, Clone, Default)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub warnings: Vec<Diagnostic>,
}

/// Tokenize a template.
///
/// # Errors
///
/// Returns a [`ParseError`] with code [`ErrorCode::E001`] when a `\` is not
/// followed by a command name. Write `\\` for a literal backslash.
pub fn tokenize(text: &str) -> Result<Lexed, ParseError> {
    let mut lexer = Lexer::new(text);
    let outcome = lexer.run();

    let Lexer {
        mut tokens,
        mut diagnostics,
        ..
    } = lexer;
    if let Err(diagnostic) = outcome {
        diagnostics.emit(diagnostic);
    }
    let warnings = diagnostics.finish()?;

    for token in tokens.iter_mut().filter(|t| t.kind.carries_field_name()) {
        token.text = token.text.trim().to_lowercase();
    }

    debug!(tokens = tokens.len(), warnings = warnings.len(); "Template tokenized");
    Ok(Lexed { tokens, warnings })
}

/// Plain text up to the next backslash.
fn text_run<'s>(input: &mut &'s str) -> IResult<&'s str> {
    take_till(1.., '\\').parse_next(input)
}

/// `\\`, decoded to a single backslash.
fn escaped_backslash<'s>(input: &mut &'s str) -> IResult<&'s str> {
    "\\\\".value("\\").parse_next(input)
}

fn command_name<'s>(input: &mut &'s str) -> IResult<&'s str> {
    take_while(1.., |c: char| c.is_alphabetic() || c == '_').parse_next(input)
}

fn skip_until<'s>(input: &mut &'s str, stop: char) -> &'s str {
    let skipped: IResult<&'s str> = take_till(0.., stop).parse_next(input);
    skipped.unwrap_or_default()
}

fn eat(input: &mut &str, mut c: char) -> bool {
    let eaten: IResult<char> = c.parse_next(input);
    eaten.is_ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionSection {
    Outside,
    Chain,
    Field,
}

struct Lexer<'src> {
    src: &'src str,
    input: &'src str,
    tokens: Vec<Token>,
    text: String,
    text_start: usize,
    diagnostics: DiagnosticCollector,
}

impl<'src> Lexer<'src> {
    fn new(src: &'src str) -> Self {
        Self {
            src,
            input: src,
            tokens: Vec::new(),
            text: String::new(),
            text_start: 0,
            diagnostics: DiagnosticCollector::new(),
        }
    }

    fn offset(&self) -> usize {
        self.src.len() - self.input.len()
    }

    fn run(&mut self) -> Result<(), Diagnostic> {
        while !self.input.is_empty() {
            let start = self.offset();
            if let Ok(run) = text_run(&mut self.input) {
                self.push_text(start, run);
            } else if let Ok(backslash) = escaped_backslash(&mut self.input) {
                self.push_text(start, backslash);
            } else {
                self.flush_text();
                eat(&mut self.input, '\\');
                self.command(start)?;
            }
        }
        self.flush_text();
        Ok(())
    }

    fn push_text(&mut self, start: usize, text: &str) {
        if self.text.is_empty() {
            self.text_start = start;
        }
        self.text.push_str(text);
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            let text = std::mem::take(&mut self.text);
            let span = self.text_start..self.offset();
            self.tokens.push(Token::new(TokenKind::Text, text, span));
        }
    }

    /// Read a command after its backslash, which starts at `start`.
    fn command(&mut self, start: usize) -> Result<(), Diagnostic> {
        let Ok(name) = command_name(&mut self.input) else {
            return Err(self.empty_command(start));
        };

        match name.to_lowercase().as_str() {
            "begin" => self.bracketed_field(TokenKind::FieldBlockStart, start),
            "end" => self.bracketed_field(TokenKind::FieldBlockEnd, start),
            "begingroup" => self.bracketed_field(TokenKind::GroupBlockStart, start),
            "endgroup" => self.bracketed_field(TokenKind::GroupBlockEnd, start),
            "format" if self.input.starts_with('[') => self.bracketed_option(start),
            "format" => self.bracketed_field(TokenKind::OptionField, start),
            "encoding" => self.marker(TokenKind::EncodingMarker, start),
            "filename" => self.marker(TokenKind::FilenameMarker, start),
            "filepath" => self.marker(TokenKind::FilepathMarker, start),
            _ => {
                let span = start..self.offset();
                self.tokens
                    .push(Token::new(TokenKind::SimpleCommand, name, span));
            }
        }
        Ok(())
    }

    fn marker(&mut self, kind: TokenKind, start: usize) {
        let span = start..self.offset();
        self.tokens.push(Token::new(kind, "", span));
    }

    /// `{name}` after a command. Characters before the first `{` are skipped
    /// and the first `}` terminates; braces do not nest.
    fn bracketed_field(&mut self, kind: TokenKind, start: usize) {
        skip_until(&mut self.input, '{');
        if !eat(&mut self.input, '{') {
            self.unterminated(ErrorCode::W001, kind, start);
            return;
        }

        let content = skip_until(&mut self.input, '}');
        if eat(&mut self.input, '}') {
            let span = start..self.offset();
            self.tokens.push(Token::new(kind, content, span));
        } else {
            if !content.is_empty() {
                let span = start..self.offset();
                self.tokens.push(Token::new(kind, content, span));
            }
            self.unterminated(ErrorCode::W001, kind, start);
        }
    }

    /// `[chain]{field}` after `\format`.
    ///
    /// Inside double quotes, brackets and braces are literal; the quotes
    /// themselves are kept. An empty field becomes a single space.
    fn bracketed_option(&mut self, start: usize) {
        let mut section = OptionSection::Outside;
        let mut in_quotes = false;
        let mut chain: Option<String> = None;
        let mut buffer = String::new();
        let mut end = None;

        for (index, c) in self.input.char_indices() {
            if c == '"' {
                in_quotes = !in_quotes;
                if section != OptionSection::Outside {
                    buffer.push(c);
                }
                continue;
            }
            if !in_quotes {
                match (section, c) {
                    (OptionSection::Outside, '[') => {
                        section = OptionSection::Chain;
                        continue;
                    }
                    (OptionSection::Outside, '{') => {
                        section = OptionSection::Field;
                        continue;
                    }
                    (OptionSection::Chain, ']') => {
                        chain = Some(std::mem::take(&mut buffer));
                        section = OptionSection::Outside;
                        continue;
                    }
                    (OptionSection::Field, '}') => {
                        end = Some(index + c.len_utf8());
                        break;
                    }
                    _ => {}
                }
            }
            if section != OptionSection::Outside {
                buffer.push(c);
            }
        }

        match end {
            Some(consumed) => self.input = &self.input[consumed..],
            None => {
                self.input = &self.input[self.input.len()..];
                if section == OptionSection::Chain {
                    chain = Some(std::mem::take(&mut buffer));
                }
            }
        }

        let field = if buffer.is_empty() {
            " ".to_string()
        } else {
            buffer
        };
        let span = start..self.offset();
        self.tokens.push(Token::option_field(field, chain, span));

        if end.is_none() {
            self.unterminated(ErrorCode::W002, TokenKind::OptionField, start);
        }
    }

    fn unterminated(&mut self, code: ErrorCode, kind: TokenKind, start: usize) {
        warn!(code = code.as_str(), offset = start; "Template ends inside {kind}");
        let span = Span::new(start..self.offset());
        let diagnostic = Diagnostic::warning(format!("template ends inside {kind}"))
            .with_code(code)
            .with_label(span, "unterminated")
            .with_help(match code {
                ErrorCode::W002 => "close the option with `]{field}`",
                _ => "close the field name with `}`",
            });
        self.diagnostics.emit(diagnostic);
    }

    fn empty_command(&self, start: usize) -> Diagnostic {
        let context_from = self.tokens.len().saturating_sub(ERROR_CONTEXT_TOKENS);
        let context = &self.tokens[context_from..];
        let context_text: String = context.iter().map(Token::to_string).collect();

        let backslash = Span::new(start..start + 1);
        let mut diagnostic = Diagnostic::error("empty command name")
            .with_code(ErrorCode::E001)
            .with_label(backslash, "expected a command name after `\\`")
            .with_help("write `\\\\` for a literal backslash");
        if let (Some(first), Some(last)) = (context.first(), context.last()) {
            diagnostic = diagnostic.with_secondary_label(
                first.span.union(last.span),
                format!("after `{context_text}`"),
            );
        }
        diagnostic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text)
            .expect("template should tokenize")
            .tokens
            .iter()
            .map(|t| t.kind)
            .collect()
    }

    fn single_token(text: &str) -> Token {
        let lexed = tokenize(text).expect("template should tokenize");
        assert_eq!(lexed.tokens.len(), 1, "tokens: {:?}", lexed.tokens);
        lexed.tokens.into_iter().next().expect("one token")
    }

    #[test]
    fn test_plain_text() {
        let token = single_token("Hello, world.\n");
        assert_eq!(token.kind, TokenKind::Text);
        assert_eq!(token.text, "Hello, world.\n");
        assert_eq!(token.span, Span::new(0..14));
    }

    #[test]
    fn test_empty_template() {
        let lexed = tokenize("").expect("empty template");
        assert!(lexed.tokens.is_empty());
        assert!(lexed.warnings.is_empty());
    }

    #[test]
    fn test_simple_command() {
        let lexed = tokenize("\\author: \\Title.").expect("tokenize");
        let texts: Vec<_> = lexed.tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["author", ": ", "title", "."]);
        assert_eq!(lexed.tokens[0].kind, TokenKind::SimpleCommand);
        assert_eq!(lexed.tokens[0].span, Span::new(0..7));
    }

    #[test]
    fn test_underscore_in_command_name() {
        let token = single_token("\\short_title");
        assert_eq!(token.kind, TokenKind::SimpleCommand);
        assert_eq!(token.text, "short_title");
    }

    #[test]
    fn test_escaped_backslash_is_literal() {
        let token = single_token("a\\\\b");
        assert_eq!(token.kind, TokenKind::Text);
        assert_eq!(token.text, "a\\b");
    }

    #[test]
    fn test_escaped_backslash_before_command() {
        let lexed = tokenize("\\\\\\year").expect("tokenize");
        assert_eq!(lexed.tokens[0].text, "\\");
        assert_eq!(lexed.tokens[1].kind, TokenKind::SimpleCommand);
        assert_eq!(lexed.tokens[1].text, "year");
    }

    #[test]
    fn test_blocks() {
        assert_eq!(
            kinds("\\begin{volume}Vol. \\volume\\end{volume}"),
            [
                TokenKind::FieldBlockStart,
                TokenKind::Text,
                TokenKind::SimpleCommand,
                TokenKind::FieldBlockEnd,
            ]
        );
        assert_eq!(
            kinds("\\begingroup{year}\\year\\endgroup{year}"),
            [
                TokenKind::GroupBlockStart,
                TokenKind::SimpleCommand,
                TokenKind::GroupBlockEnd,
            ]
        );
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let lexed = tokenize("\\BEGIN{ Author }x\\End{author}").expect("tokenize");
        assert_eq!(lexed.tokens[0].kind, TokenKind::FieldBlockStart);
        assert_eq!(lexed.tokens[0].text, "author");
        assert_eq!(lexed.tokens[2].kind, TokenKind::FieldBlockEnd);
    }

    #[test]
    fn test_markers() {
        assert_eq!(
            kinds("\\encoding \\filename \\filepath"),
            [
                TokenKind::EncodingMarker,
                TokenKind::Text,
                TokenKind::FilenameMarker,
                TokenKind::Text,
                TokenKind::FilepathMarker,
            ]
        );
    }

    #[test]
    fn test_format_with_chain() {
        let token = single_token("\\format[HTMLChars,Default(n.d.)]{\\Year}");
        assert_eq!(token.kind, TokenKind::OptionField);
        assert_eq!(token.option_parts(), ("\\Year", Some("HTMLChars,Default(n.d.)")));
    }

    #[test]
    fn test_format_without_chain() {
        let token = single_token("\\format{\\title}");
        assert_eq!(token.kind, TokenKind::OptionField);
        assert_eq!(token.option_parts(), ("\\title", None));
    }

    #[test]
    fn test_format_quotes_protect_brackets() {
        let token = single_token("\\format[Replace(\"]\",x)]{\\title}");
        assert_eq!(token.option_parts(), ("\\title", Some("Replace(\"]\",x)")));

        let token = single_token("\\format[X]{\"a}b\"}");
        assert_eq!(token.option_parts(), ("\"a}b\"", Some("X")));
    }

    #[test]
    fn test_format_field_with_newline() {
        let token = single_token("\\format[ToUpperCase]{line one\nline two}");
        assert_eq!(
            token.option_parts(),
            ("line one\nline two", Some("ToUpperCase"))
        );
    }

    #[test]
    fn test_format_empty_field_is_space() {
        let token = single_token("\\format[ToLowerCase]{}");
        assert_eq!(token.option_parts(), (" ", Some("ToLowerCase")));
    }

    #[test]
    fn test_unterminated_bracketed_field() {
        let lexed = tokenize("x\\begin{tit").expect("recoverable");
        assert_eq!(lexed.tokens.len(), 2);
        assert_eq!(lexed.tokens[1].kind, TokenKind::FieldBlockStart);
        assert_eq!(lexed.tokens[1].text, "tit");
        assert_eq!(lexed.warnings.len(), 1);
        assert_eq!(lexed.warnings[0].code(), Some(ErrorCode::W001));
    }

    #[test]
    fn test_unterminated_field_without_content() {
        let lexed = tokenize("\\end").expect("recoverable");
        assert!(lexed.tokens.is_empty());
        assert_eq!(lexed.warnings[0].code(), Some(ErrorCode::W001));
    }

    #[test]
    fn test_unterminated_option() {
        let lexed = tokenize("\\format[ToUpperCase]{\\tit").expect("recoverable");
        assert_eq!(lexed.tokens.len(), 1);
        assert_eq!(
            lexed.tokens[0].option_parts(),
            ("\\tit", Some("ToUpperCase"))
        );
        assert_eq!(lexed.warnings[0].code(), Some(ErrorCode::W002));
    }

    #[test]
    fn test_empty_command_name() {
        let err = tokenize("\\author: \\1999").unwrap_err();
        let diagnostic = err.first_error().expect("an error");
        assert_eq!(diagnostic.code(), Some(ErrorCode::E001));
        assert_eq!(diagnostic.labels()[0].span(), Span::new(9..10));
        assert!(diagnostic.labels()[1].message().contains("\\author: "));
    }

    #[test]
    fn test_trailing_backslash_is_error() {
        assert!(tokenize("text\\").is_err());
    }

    #[test]
    fn test_option_payload_keeps_case() {
        let token = single_token("\\format[ToLowerCase]{\\Title}");
        assert_eq!(token.option_parts().0, "\\Title");
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// Text without backslashes.
    fn plain_text_strategy() -> impl Strategy<Value = String> {
        "[^\\\\]{1,80}"
    }

    /// A field name that is not a keyword.
    fn field_name_strategy() -> impl Strategy<Value = String> {
        "[a-z][a-z_]{0,15}".prop_filter("avoid keywords", |s| {
            !matches!(
                s.as_str(),
                "begin"
                    | "begingroup"
                    | "end"
                    | "endgroup"
                    | "format"
                    | "filename"
                    | "filepath"
                    | "encoding"
            )
        })
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Text without commands comes back as one verbatim token.
    fn check_plain_text_is_single_token(text: &str) -> Result<(), TestCaseError> {
        let lexed = tokenize(text).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(lexed.tokens.len(), 1);
        prop_assert_eq!(&lexed.tokens[0].text, text);
        prop_assert!(lexed.warnings.is_empty());
        Ok(())
    }

    /// A field reference between text keeps both sides intact.
    fn check_field_between_text(
        before: &str,
        field: &str,
        after: &str,
    ) -> Result<(), TestCaseError> {
        let template = format!("{before}\\{field}\n{after}");
        let lexed = tokenize(&template).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(lexed.tokens.len(), 3);
        prop_assert_eq!(&lexed.tokens[0].text, before);
        prop_assert_eq!(lexed.tokens[1].kind, TokenKind::SimpleCommand);
        prop_assert_eq!(&lexed.tokens[1].text, field);
        prop_assert_eq!(lexed.tokens[2].text.clone(), format!("\n{after}"));
        Ok(())
    }

    /// Token spans are ordered and stay inside the template.
    fn check_spans_in_bounds(template: &str) -> Result<(), TestCaseError> {
        if let Ok(lexed) = tokenize(template) {
            let mut previous_end = 0;
            for token in &lexed.tokens {
                prop_assert!(token.span.start() >= previous_end);
                prop_assert!(token.span.end() <= template.len());
                previous_end = token.span.end();
            }
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn plain_text_is_single_token(text in plain_text_strategy()) {
            check_plain_text_is_single_token(&text)?;
        }

        #[test]
        fn field_between_text(
            before in plain_text_strategy(),
            field in field_name_strategy(),
            after in plain_text_strategy(),
        ) {
            check_field_between_text(&before, &field, &after)?;
        }

        #[test]
        fn spans_in_bounds(template in "[a-z{}\\[\\]\\\\ \"]{0,60}") {
            check_spans_in_bounds(&template)?;
        }
    }
}
