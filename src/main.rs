use std::io;

use clap::Parser;
use kodigo::cli::{generate_completions, AppConfig, Args, Commands};
use kodigo::diagnostic::render_diagnostics;
use kodigo::interpreter::{parse_with_diagnostics, Interpreter};
use owo_colors::OwoColorize;

fn main() {
    let args = Args::parse();

    if let Some(Commands::Complete { shell }) = args.command {
        generate_completions(shell);
        return;
    }

    let config = AppConfig::from_args(&args);

    let Some(script) = &args.script else {
        error_message(&config, "No script provided. Usage: kodigo <SCRIPT>");
        std::process::exit(2);
    };

    verbose_log(&config, &format!("Reading {}", script.display()));
    let source = match std::fs::read_to_string(script) {
        Ok(source) => source,
        Err(error) => {
            error_message(
                &config,
                &format!("Failed to read {}: {}", script.display(), error),
            );
            std::process::exit(1);
        }
    };

    let file_name = script.display().to_string();
    let program = match parse_with_diagnostics(&source) {
        Ok(program) => program,
        Err(diagnostics) => {
            let rendered =
                render_diagnostics(&source, &file_name, &diagnostics, config.color_enabled);
            eprint!("{}", rendered);
            std::process::exit(1);
        }
    };

    verbose_log(
        &config,
        &format!("Parsed {} top-level statements", program.statements.len()),
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut interpreter = Interpreter::with_io(stdin.lock(), stdout.lock());
    let fatal = interpreter.run(&program).err();
    let mut errors = interpreter.take_errors();
    drop(interpreter);
    if let Some(fatal_error) = fatal {
        errors.push(fatal_error);
    }

    if !errors.is_empty() {
        let diagnostics: Vec<_> = errors.iter().map(|error| error.to_diagnostic()).collect();
        let rendered = render_diagnostics(&source, &file_name, &diagnostics, config.color_enabled);
        eprint!("{}", rendered);
        std::process::exit(1);
    }

    verbose_log(&config, "Program finished");
}

fn verbose_log(config: &AppConfig, message: &str) {
    if config.verbose {
        eprintln!("[kodigo:debug] {}", message);
    }
}

fn error_message(config: &AppConfig, message: &str) {
    if config.color_enabled {
        eprintln!("{}", message.red().bold());
    } else {
        eprintln!("{}", message);
    }
}
