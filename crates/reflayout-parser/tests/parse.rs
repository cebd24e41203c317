use reflayout_core::{
    FormatterRegistry,
    format::{BuiltinFormatters, FormatterCall},
};
use reflayout_parser::{
    BlockKind, ErrorCode, LayoutNode, TokenKind, parse, parse_formatter_chain, tokenize,
};

#[test]
fn test_article_layout() {
    let source = "\\begin{author}\\format[Authors(LastFirst,Initials)]{\\author}. \\end{author}\
                  \\title. \\begin{journal}\\format[HTMLChars]{\\journal}\\end{journal}\n";

    let forest = parse(source, &FormatterRegistry::default()).expect("Failed to parse");

    assert!(forest.warnings.is_empty(), "{:?}", forest.warnings);
    assert!(forest.missing_formatters.is_empty());
    assert_eq!(forest.nodes.len(), 5);

    match &forest.nodes[0] {
        LayoutNode::Block {
            kind: BlockKind::Field,
            test,
            children,
        } => {
            assert_eq!(test, "author");
            match &children[0] {
                LayoutNode::OptionField { field, chain } => {
                    assert_eq!(field, "\\author");
                    assert_eq!(chain.links()[0].name(), "Authors");
                    assert_eq!(chain.links()[0].argument(), Some("LastFirst,Initials"));
                }
                other => panic!("Expected option field, got {other:?}"),
            }
        }
        other => panic!("Expected author block, got {other:?}"),
    }

    assert!(matches!(&forest.nodes[1], LayoutNode::FieldRef(name) if name == "title"));
    assert!(matches!(&forest.nodes[2], LayoutNode::Text(text) if text == ". "));
}

#[test]
fn test_group_layout() {
    let source = "\\begingroup{Year}<h2>\\year</h2>\\endgroup{year}\\title";
    let forest = parse(source, &FormatterRegistry::default()).expect("Failed to parse");

    assert!(matches!(
        &forest.nodes[0],
        LayoutNode::Block { kind: BlockKind::Group, test, children }
            if test == "year" && children.len() == 3
    ));
}

#[test]
fn test_database_level_layout() {
    let source = "<meta charset=\"\\encoding\"><title>\\filename</title>";
    let lexed = tokenize(source).expect("Failed to tokenize");
    let kinds: Vec<_> = lexed.tokens.iter().map(|t| t.kind).collect();

    assert_eq!(
        kinds,
        [
            TokenKind::Text,
            TokenKind::EncodingMarker,
            TokenKind::Text,
            TokenKind::FilenameMarker,
            TokenKind::Text,
        ]
    );
}

#[test]
fn test_formatter_chain_with_quoted_argument() {
    assert_eq!(
        parse_formatter_chain("Foo(\"a,b\"),Bar"),
        [
            FormatterCall::with_argument("Foo", "a,b"),
            FormatterCall::new("Bar"),
        ]
    );
}

#[test]
fn test_quoted_parenthesis_does_not_swallow_chain() {
    assert_eq!(
        parse_formatter_chain("Default(\"(\"),ToUpperCase"),
        [
            FormatterCall::with_argument("Default", "("),
            FormatterCall::new("ToUpperCase"),
        ]
    );

    let forest = parse(
        "\\format[Default(\"(\"),ToUpperCase]{\\title}",
        &FormatterRegistry::default(),
    )
    .expect("Failed to parse");
    assert!(forest.warnings.is_empty(), "{:?}", forest.warnings);
    match &forest.nodes[0] {
        LayoutNode::OptionField { chain, .. } => {
            assert_eq!(chain.apply("dune".to_string()), "DUNE");
            assert_eq!(chain.apply(String::new()), "(");
        }
        other => panic!("Expected option field, got {other:?}"),
    }
}

#[test]
fn test_unknown_formatter_is_reported() {
    let forest = parse("\\format[Nonexistent]{\\title}", &FormatterRegistry::default())
        .expect("Failed to parse");

    assert_eq!(forest.missing_formatters, ["Nonexistent"]);
    assert_eq!(forest.warnings[0].code(), Some(ErrorCode::W200));
}

#[test]
fn test_injected_builtins() {
    let registry = FormatterRegistry::new(BuiltinFormatters::empty());
    let forest = parse("\\format[ToUpperCase]{\\title}", &registry).expect("Failed to parse");

    assert_eq!(forest.missing_formatters, ["ToUpperCase"]);
}

#[test]
fn test_malformed_same_name_nesting() {
    let forest = parse(
        "\\begin{x}\\begin{x}A\\end{x}\\end{x}",
        &FormatterRegistry::default(),
    )
    .expect("Malformed nesting must not fail");

    assert!(
        forest
            .warnings
            .iter()
            .any(|w| w.code() == Some(ErrorCode::W102))
    );
}

#[test]
fn test_lexer_and_tree_warnings_are_combined() {
    let forest = parse("\\end{x}\\begin{y", &FormatterRegistry::default())
        .expect("Recoverable template");

    let codes: Vec<_> = forest.warnings.iter().filter_map(|w| w.code()).collect();
    assert_eq!(codes, [ErrorCode::W001, ErrorCode::W100, ErrorCode::W101]);
}

#[test]
fn test_empty_command_aborts() {
    let err = parse("Price: \\$10", &FormatterRegistry::default()).unwrap_err();

    assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E001));
}
