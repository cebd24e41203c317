//! Tree builder: matches blocks in a token stream and resolves formatters.
//!
//! A block start is closed by the first following end of the same kind and
//! name. Nothing here fails; structural problems become warnings:
//!
//! - an end that closes nothing is dropped (`W100`);
//! - a start that is never closed is dropped and its contents are kept as
//!   siblings (`W101`);
//! - a block reopened inside itself is closed by the first end (`W102`);
//! - an unknown formatter name resolves to a passthrough (`W200`);
//! - a formatter argument that is never closed is recovered (`W201`).

use std::fmt;

use log::{debug, warn};

use reflayout_core::format::{FormatterChain, FormatterRegistry};

use crate::{
    chain::parse_chain,
    error::{Diagnostic, ErrorCode},
    tokens::{Token, TokenKind},
};

/// Which test a block applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// `\begin{test}...\end{test}`: rendered when the field test holds.
    Field,
    /// `\begingroup{field}...\endgroup{field}`: rendered when the field is
    /// present and differs from the previous group value.
    Group,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::Field => write!(f, "begin"),
            BlockKind::Group => write!(f, "begingroup"),
        }
    }
}

/// A node of a parsed template.
#[derive(Debug)]
pub enum LayoutNode {
    Text(String),
    /// `\field`, name lower-cased.
    FieldRef(String),
    /// `\format[chain]{field}`. A field starting with `\` is read from the
    /// entry; anything else is database-level text.
    OptionField { field: String, chain: FormatterChain },
    Block {
        kind: BlockKind,
        /// Field names joined by `;`, `&`, `&&` (all) or `|`, `||` (any),
        /// each optionally negated with `!`.
        test: String,
        children: Vec<LayoutNode>,
    },
    EncodingMarker,
    FilenameMarker,
    FilepathMarker,
}

/// The result of tree building.
#[derive(Debug, Default)]
pub struct Forest {
    pub nodes: Vec<LayoutNode>,
    /// Unresolved formatter names, each listed once, in order of appearance.
    pub missing_formatters: Vec<String>,
    pub warnings: Vec<Diagnostic>,
}

/// Build the node tree of a token stream.
pub fn build_forest(tokens: &[Token], registry: &FormatterRegistry) -> Forest {
    let mut builder = TreeBuilder {
        registry,
        missing_formatters: Vec::new(),
        warnings: Vec::new(),
    };
    let nodes = builder.build(tokens);

    debug!(
        nodes = nodes.len(),
        missing = builder.missing_formatters.len(),
        warnings = builder.warnings.len();
        "Layout tree built"
    );
    Forest {
        nodes,
        missing_formatters: builder.missing_formatters,
        warnings: builder.warnings,
    }
}

struct TreeBuilder<'a> {
    registry: &'a FormatterRegistry,
    missing_formatters: Vec<String>,
    warnings: Vec<Diagnostic>,
}

impl TreeBuilder<'_> {
    fn build(&mut self, tokens: &[Token]) -> Vec<LayoutNode> {
        let mut nodes = Vec::new();
        let mut index = 0;

        while index < tokens.len() {
            let token = &tokens[index];
            index += 1;

            match token.kind {
                TokenKind::Text => nodes.push(LayoutNode::Text(token.text.clone())),
                TokenKind::SimpleCommand => nodes.push(LayoutNode::FieldRef(token.text.clone())),
                TokenKind::OptionField => nodes.push(self.option_field(token)),
                TokenKind::EncodingMarker => nodes.push(LayoutNode::EncodingMarker),
                TokenKind::FilenameMarker => nodes.push(LayoutNode::FilenameMarker),
                TokenKind::FilepathMarker => nodes.push(LayoutNode::FilepathMarker),
                TokenKind::FieldBlockStart | TokenKind::GroupBlockStart => {
                    let rest = &tokens[index..];
                    match find_close(token, rest) {
                        Some(close) => {
                            nodes.push(self.block(token, &rest[..close]));
                            index += close + 1;
                        }
                        None => self.unterminated_block(token),
                    }
                }
                TokenKind::FieldBlockEnd | TokenKind::GroupBlockEnd => self.unmatched_end(token),
            }
        }

        nodes
    }

    fn block(&mut self, start: &Token, inner: &[Token]) -> LayoutNode {
        if let Some(nested) = inner
            .iter()
            .find(|t| t.kind == start.kind && t.text == start.text)
        {
            warn!(block = start.text.as_str(); "Block reopened inside itself");
            self.warnings.push(
                Diagnostic::warning(format!(
                    "{} is opened again before it is closed",
                    display_command(start)
                ))
                .with_code(ErrorCode::W102)
                .with_label(nested.span, "reopened here")
                .with_secondary_label(start.span, "outer block")
                .with_help("the first matching end closes the outer block"),
            );
        }

        let kind = match start.kind {
            TokenKind::GroupBlockStart => BlockKind::Group,
            _ => BlockKind::Field,
        };
        LayoutNode::Block {
            kind,
            test: start.text.clone(),
            children: self.build(inner),
        }
    }

    fn option_field(&mut self, token: &Token) -> LayoutNode {
        let (field, chain) = token.option_parts();
        let parsed = chain.map(parse_chain).unwrap_or_default();
        for name in &parsed.unterminated {
            warn!(formatter = name.as_str(); "Formatter argument is never closed");
            self.warnings.push(
                Diagnostic::warning(format!("argument of `{name}` is never closed"))
                    .with_code(ErrorCode::W201)
                    .with_label(token.span, "in this chain")
                    .with_help("close the argument with `)`, or `\")` after a quoted one"),
            );
        }

        let (chain, missing) = self.registry.build_chain(&parsed.calls);

        for name in missing {
            warn!(formatter = name.as_str(); "Unknown formatter");
            self.warnings.push(
                Diagnostic::warning(format!("unknown formatter `{name}`"))
                    .with_code(ErrorCode::W200)
                    .with_label(token.span, "used here")
                    .with_help("the value is passed through unchanged"),
            );
            if !self.missing_formatters.contains(&name) {
                self.missing_formatters.push(name);
            }
        }

        LayoutNode::OptionField {
            field: field.to_string(),
            chain,
        }
    }

    fn unterminated_block(&mut self, start: &Token) {
        warn!(block = start.text.as_str(); "Block is never closed");
        let closing = start.kind.closing_kind().unwrap_or(TokenKind::FieldBlockEnd);
        self.warnings.push(
            Diagnostic::warning(format!("{} is never closed", display_command(start)))
                .with_code(ErrorCode::W101)
                .with_label(start.span, "opened here")
                .with_help(format!(
                    "add `{}{{{}}}`",
                    closing.to_string().trim_matches('`'),
                    start.text
                )),
        );
    }

    fn unmatched_end(&mut self, end: &Token) {
        warn!(block = end.text.as_str(); "Block end closes no open block");
        self.warnings.push(
            Diagnostic::warning(format!("{} closes no open block", display_command(end)))
                .with_code(ErrorCode::W100)
                .with_label(end.span, "unmatched end")
                .with_help("check that block names and kinds match"),
        );
    }
}

/// Index in `rest` of the end token closing `start`.
fn find_close(start: &Token, rest: &[Token]) -> Option<usize> {
    let closing = start.kind.closing_kind()?;
    rest.iter()
        .position(|t| t.kind == closing && t.text == start.text)
}

fn display_command(token: &Token) -> String {
    format!("`{token}`")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn forest(text: &str) -> Forest {
        let lexed = tokenize(text).expect("template should tokenize");
        build_forest(&lexed.tokens, &FormatterRegistry::default())
    }

    fn codes(forest: &Forest) -> Vec<ErrorCode> {
        forest.warnings.iter().filter_map(Diagnostic::code).collect()
    }

    #[test]
    fn test_leaves() {
        let forest = forest("Title: \\title\\encoding");
        assert!(matches!(&forest.nodes[0], LayoutNode::Text(t) if t == "Title: "));
        assert!(matches!(&forest.nodes[1], LayoutNode::FieldRef(f) if f == "title"));
        assert!(matches!(forest.nodes[2], LayoutNode::EncodingMarker));
        assert!(forest.warnings.is_empty());
    }

    #[test]
    fn test_nested_blocks() {
        let forest = forest("\\begin{volume}Vol. \\begin{number}(\\number)\\end{number}\\end{volume}.");
        assert_eq!(forest.nodes.len(), 2);
        let LayoutNode::Block {
            kind,
            test,
            children,
        } = &forest.nodes[0]
        else {
            panic!("expected a block, got {:?}", forest.nodes[0]);
        };
        assert_eq!(*kind, BlockKind::Field);
        assert_eq!(test, "volume");
        assert_eq!(children.len(), 2);
        assert!(matches!(&children[1], LayoutNode::Block { test, .. } if test == "number"));
    }

    #[test]
    fn test_group_block() {
        let forest = forest("\\begingroup{year}\\year\\endgroup{year}");
        assert!(matches!(
            &forest.nodes[0],
            LayoutNode::Block { kind: BlockKind::Group, children, .. } if children.len() == 1
        ));
    }

    #[test]
    fn test_end_kind_must_match() {
        let forest = forest("\\begin{year}x\\endgroup{year}");
        assert_eq!(codes(&forest), [ErrorCode::W101, ErrorCode::W100]);
        assert_eq!(forest.nodes.len(), 1);
        assert!(matches!(&forest.nodes[0], LayoutNode::Text(t) if t == "x"));
    }

    #[test]
    fn test_mismatched_end_is_dropped() {
        let forest = forest("\\begin{bar}A\\end{foo}B\\end{bar}");
        assert_eq!(codes(&forest), [ErrorCode::W100]);
        let LayoutNode::Block { children, .. } = &forest.nodes[0] else {
            panic!("expected a block");
        };
        assert_eq!(children.len(), 2);
    }

    #[test]
    fn test_same_name_nesting_does_not_fail() {
        let forest = forest("\\begin{x}\\begin{x}A\\end{x}\\end{x}");
        assert!(codes(&forest).contains(&ErrorCode::W102));
        assert!(codes(&forest).contains(&ErrorCode::W100));
        assert!(matches!(&forest.nodes[0], LayoutNode::Block { test, .. } if test == "x"));
    }

    #[test]
    fn test_option_field_resolves_chain() {
        let forest = forest("\\format[RemoveBrackets,ToUpperCase]{\\title}");
        let LayoutNode::OptionField { field, chain } = &forest.nodes[0] else {
            panic!("expected an option field");
        };
        assert_eq!(field, "\\title");
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.apply("{a} b".to_string()), "A B");
        assert!(forest.missing_formatters.is_empty());
    }

    #[test]
    fn test_unterminated_argument_keeps_later_formatters() {
        let forest = forest("\\format[Default(\"n.d.),ToUpperCase]{\\year}");
        assert_eq!(codes(&forest), [ErrorCode::W201]);
        let LayoutNode::OptionField { chain, .. } = &forest.nodes[0] else {
            panic!("expected an option field");
        };
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.apply(String::new()), "N.D.");
    }

    #[test]
    fn test_option_field_keeps_newline_in_field() {
        let forest = forest("\\format[ToUpperCase]{a\nb}");
        let LayoutNode::OptionField { field, chain } = &forest.nodes[0] else {
            panic!("expected an option field");
        };
        assert_eq!(field, "a\nb");
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_unknown_formatter_is_recorded_once() {
        let forest = forest("\\format[Nonexistent]{\\title} \\format[Nonexistent]{\\year}");
        assert_eq!(forest.missing_formatters, ["Nonexistent"]);
        assert_eq!(codes(&forest), [ErrorCode::W200, ErrorCode::W200]);
    }
}
