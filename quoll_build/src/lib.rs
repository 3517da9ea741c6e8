//! The QuollVM compiler: source text in, binary gamefile out.
//!
//! Phases run in a fixed order — lex, parse, translate, organize, ident
//! check, function compile, encode — and any accumulated error stops the
//! pipeline at the next phase boundary. Warnings never do.

pub mod encode;
pub mod error;
pub mod expression;
pub mod gamedata;
pub mod lexer;
pub mod parsing;
pub mod token;
pub mod translate;
pub mod value;

pub use error::{BuildError, Diagnostic, Severity};
pub use gamedata::GameData;

/// The outcome of a build: the encoded gamefile when the build succeeded,
/// plus every diagnostic either way.
#[derive(Debug)]
pub struct BuildResult {
    pub gamefile: Option<Vec<u8>>,
    pub diagnostics: Vec<Diagnostic>,
    pub next_ident: i32,
}

impl BuildResult {
    pub fn succeeded(&self) -> bool {
        self.gamefile.is_some()
    }
}

/// Compile a set of `(name, text)` sources into a gamefile. The build
/// timestamp is a parameter so callers can produce reproducible output.
pub fn compile(sources: &[(&str, &str)], build_number: u32) -> BuildResult {
    let mut gamedata = GameData::new();
    translate::add_default_constants(&mut gamedata);

    let mut tokens = Vec::new();
    for (name, text) in sources {
        log::debug!("lexing {}", name);
        tokens.extend(lexer::lex_string(&mut gamedata, name, text));
    }
    let mut next_ident = -1;

    let gamefile = loop {
        if gamedata.has_errors() {
            break None;
        }
        gamedata.sort_vocab();

        let mut state = parsing::ParseState::new(&tokens);
        parsing::parse_tokens(&mut gamedata, &mut state);
        if gamedata.has_errors() {
            break None;
        }

        translate::translate_symbols(&mut gamedata);
        if gamedata.has_errors() {
            break None;
        }

        gamedata.organize();
        next_ident = gamedata.check_object_idents();
        if gamedata.has_errors() {
            break None;
        }

        expression::compile_functions(&mut gamedata);
        if gamedata.has_errors() {
            break None;
        }

        let bytes = encode::generate(&mut gamedata, build_number);
        if gamedata.has_errors() {
            break None;
        }
        break Some(bytes);
    };

    // Unused-symbol sweep: the required symbols count as used.
    for name in ["TITLE", "AUTHOR", "VERSION", "GAMEID", "main"] {
        gamedata.symbols.mark_used(name);
    }
    let unused: Vec<_> = gamedata
        .symbols
        .symbols
        .iter()
        .filter(|sym| sym.uses == 0)
        .map(|sym| (sym.origin.clone(), sym.name.clone()))
        .collect();
    for (origin, name) in unused {
        gamedata.add_warning(origin, format!("Symbol {} declared but never used.", name));
    }

    BuildResult {
        gamefile,
        diagnostics: gamedata.diagnostics,
        next_ident,
    }
}
