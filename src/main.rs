use std::{fs::read_to_string, path::PathBuf, process::ExitCode, time::Instant};

use clap::Parser;
use frontend::{
    arena::{arena::DEFAULT_PAGES_PER_CHUNK, Arena, ArenaConfig},
    lexer::{
        lexer::{Lexer, LexerConfig, DEFAULT_MAX_LEXEME_LEN},
        source::StringSource,
        tokens::TokenKind,
    },
    render_error,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "frontend", version, about = "Tokenize a source file and print its tokens")]
struct Args {
    /// Source file to tokenize
    file: PathBuf,

    /// Longest lexeme kept before a token is marked truncated
    #[arg(long, default_value_t = DEFAULT_MAX_LEXEME_LEN)]
    max_lexeme_len: usize,

    /// Fail when the source contains any lexical error
    #[arg(long)]
    strict: bool,

    /// Pages per arena chunk
    #[arg(long, default_value_t = DEFAULT_PAGES_PER_CHUNK)]
    chunk_pages: usize,
}

/// Installs a stderr subscriber when `FRONTEND_LOG` or `RUST_LOG` is set.
fn init_tracing() {
    let filter = match std::env::var("FRONTEND_LOG") {
        Ok(value) => EnvFilter::builder().parse_lossy(value),
        Err(_) if std::env::var("RUST_LOG").is_ok() => EnvFilter::from_default_env(),
        Err(_) => return,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let file_name = args.file.to_string_lossy().into_owned();
    let source = match read_to_string(&args.file) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("Error: failed to read {}: {}", file_name, error);
            return ExitCode::FAILURE;
        }
    };

    let arena_config = ArenaConfig {
        pages_per_chunk: args.chunk_pages,
        ..ArenaConfig::default()
    };
    let mut arena = match Arena::with_config(arena_config) {
        Ok(arena) => arena,
        Err(error) => {
            eprintln!("Error: {}", error);
            return ExitCode::FAILURE;
        }
    };

    let config = LexerConfig {
        max_lexeme_len: args.max_lexeme_len,
        ..LexerConfig::default()
    };

    let start = Instant::now();
    let mut errors = vec![];
    let mut identifiers = vec![];
    let mut count = 0;

    for token in Lexer::with_config(StringSource::new(&source), config) {
        count += 1;

        if token.kind == TokenKind::Identifier {
            match arena.alloc_str(&token.value) {
                Ok(handle) => identifiers.push(handle),
                Err(error) => {
                    eprintln!("Error: {}", error);
                    return ExitCode::FAILURE;
                }
            }
        }

        if let Some(error) = token.to_error() {
            errors.push(error);
        }

        println!("{}", token);
    }

    println!("Tokenized {} tokens in {:?}", count, start.elapsed());
    println!(
        "Stored {} identifiers in {} arena chunk(s), {} bytes reserved",
        identifiers.len(),
        arena.chunk_count(),
        arena.total_capacity()
    );

    for error in &errors {
        eprint!("{}", render_error(error, &source, &file_name));
    }

    arena.destroy();

    if args.strict && !errors.is_empty() {
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
