//! Compiles every `tests/fixtures/*.phpx` file and checks that the output is
//! well-formed PHP: it lexes cleanly, its brackets balance and no markup is
//! left behind.

use std::fs;
use std::path::PathBuf;

use phpx_codegen::{BareLiteralFormatter, Compiler, PragmaFormatter};
use phpx_lexer::{HostKind, Token, TokenKind};

fn fixtures() -> Vec<(String, String)> {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let mut files: Vec<(String, String)> = fs::read_dir(&dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "phpx"))
        .map(|path| {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            (name, fs::read_to_string(&path).unwrap())
        })
        .collect();
    files.sort();
    assert!(!files.is_empty(), "no fixtures in {}", dir.display());
    files
}

fn closer(token: &Token) -> Option<HostKind> {
    match token.kind {
        TokenKind::Host(HostKind::OpenCurly | HostKind::DollarOpenCurlyBraces) => {
            Some(HostKind::CloseCurly)
        }
        TokenKind::Host(HostKind::OpenParen) => Some(HostKind::CloseParen),
        TokenKind::Host(HostKind::OpenBracket | HostKind::Attribute) => {
            Some(HostKind::CloseBracket)
        }
        _ => None,
    }
}

fn assert_well_formed(name: &str, php: &str) {
    let tokens = phpx_lexer::tokenize(php)
        .unwrap_or_else(|e| panic!("{name}: output does not lex: {e}\n{php}"));

    let mut open: Vec<&Token> = Vec::new();
    for token in &tokens {
        match token.kind {
            TokenKind::FragmentOpen | TokenKind::ElementOpen | TokenKind::TemplateDelimiter => {
                panic!("{name}: markup left in output at {token}\n{php}")
            }
            TokenKind::Host(HostKind::DoubleQuote | HostKind::UnterminatedString) => {
                panic!("{name}: unterminated string at {token}\n{php}")
            }
            TokenKind::Host(
                kind @ (HostKind::CloseCurly | HostKind::CloseParen | HostKind::CloseBracket),
            ) => {
                let opener = open
                    .pop()
                    .unwrap_or_else(|| panic!("{name}: unmatched {token}\n{php}"));
                assert_eq!(closer(opener), Some(kind), "{name}: {opener} closed by {token}");
            }
            _ if closer(token).is_some() => open.push(token),
            _ => {}
        }
    }
    assert!(open.is_empty(), "{name}: unclosed {:?}\n{php}", open);
}

// =============================================================================
// Fixtures
// =============================================================================

#[test]
fn test_fixtures_compile_to_well_formed_php() {
    let compilers = [
        ("literal", Compiler::new()),
        ("bare", Compiler::new().with_formatter(BareLiteralFormatter)),
        ("pragma", Compiler::new().with_formatter(PragmaFormatter::default())),
    ];

    for (name, source) in fixtures() {
        for (formatter, compiler) in &compilers {
            let php = compiler
                .compile(&source)
                .unwrap_or_else(|e| panic!("{name} ({formatter}): {e}"));
            assert_well_formed(&format!("{name} ({formatter})"), &php);
        }
    }
}

#[test]
fn test_fixtures_keep_host_code() {
    for (name, source) in fixtures() {
        let php = phpx_codegen::compile(&source).unwrap();
        if source.starts_with("<?php") {
            assert!(php.starts_with("<?php"), "{name}");
        }
        assert_eq!(
            source.lines().count(),
            php.lines().count(),
            "{name}: line structure changed"
        );
    }
}

#[test]
fn test_compiling_twice_is_stable() {
    for (name, source) in fixtures() {
        let once = phpx_codegen::compile(&source).unwrap();
        let twice = phpx_codegen::compile(&once).unwrap();
        assert_eq!(once, twice, "{name}");
    }
}
