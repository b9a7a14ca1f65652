use ay_compiler::config::Config;
use ay_compiler::error::{CompilerError, Diagnostic};
use ay_compiler::{generate, parse, tokenize, ParsedProgram};
use clap::{Parser as ClapParser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(ClapParser)]
#[command(name = "ayc", author, version, about = "Ay to JavaScript compiler")]
struct Cli {
    /// Print progress for each compilation stage
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an Ay source file to JavaScript
    Build {
        /// Source file to compile
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (defaults to the input name with the configured extension)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Print the token stream as JSON lines
        #[arg(long)]
        emit_tokens: bool,

        /// Print the AST as JSON
        #[arg(long)]
        emit_ast: bool,

        /// Do not prepend the runtime support script
        #[arg(long)]
        no_runtime: bool,
    },
    /// Check a source file for syntax errors without writing output
    Check {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
    /// Manage compiler configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the active configuration
    Show,
    /// Write a default config file for the current environment
    Init,
    /// Print the config file location
    Path,
}

fn read_source(path: &Path) -> Result<String, CompilerError> {
    if !path.exists() {
        return Err(CompilerError::FileNotFound(path.to_path_buf()));
    }
    Ok(fs::read_to_string(path)?)
}

fn parse_file(path: &Path, verbose: bool) -> Result<ParsedProgram, CompilerError> {
    let source = read_source(path)?;
    if verbose {
        println!("Parsing {} ({} bytes)...", path.display(), source.len());
    }

    let parsed = parse(&source)?;
    if verbose {
        println!(
            "Parsed {} statement(s), {} variable(s) declared",
            parsed.body.len(),
            parsed.variables.len()
        );
    }
    Ok(parsed)
}

fn report(path: &Path, diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{}: {}\n", path.display(), diagnostic);
    }
    eprintln!("{} error(s) found", diagnostics.len());
}

struct BuildOptions {
    output: Option<PathBuf>,
    emit_tokens: bool,
    emit_ast: bool,
    no_runtime: bool,
}

fn build(input: &Path, options: BuildOptions, config: &Config) -> Result<bool, CompilerError> {
    if options.emit_tokens {
        for token in tokenize(&read_source(input)?)? {
            println!("{}", serde_json::to_string(&token)?);
        }
    }

    let parsed = parse_file(input, config.verbose)?;
    if options.emit_ast {
        println!("{}", serde_json::to_string_pretty(&parsed.program())?);
    }

    if !parsed.is_ok() {
        report(input, &parsed.diagnostics);
        return Ok(false);
    }

    let mut output = if options.no_runtime {
        String::new()
    } else {
        config.load_runtime()?
    };
    if !output.is_empty() && !output.ends_with('\n') {
        output.push('\n');
    }
    output.push_str(&generate(&parsed.body));
    output.push('\n');

    let output_path = options
        .output
        .unwrap_or_else(|| config.output_path_for(input));
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output_path, output)?;

    if config.verbose {
        println!("Wrote {}", output_path.display());
    }
    Ok(true)
}

fn run(cli: Cli) -> Result<bool, CompilerError> {
    let mut config = Config::load()?;
    config.verbose |= cli.verbose;

    match cli.command {
        Commands::Build {
            input,
            output,
            emit_tokens,
            emit_ast,
            no_runtime,
        } => {
            let options = BuildOptions {
                output,
                emit_tokens,
                emit_ast,
                no_runtime,
            };
            build(&input, options, &config)
        }
        Commands::Check { input } => {
            let parsed = parse_file(&input, config.verbose)?;
            if parsed.is_ok() {
                println!("{}: no errors", input.display());
                Ok(true)
            } else {
                report(&input, &parsed.diagnostics);
                Ok(false)
            }
        }
        Commands::Config { command } => {
            match command {
                ConfigCommands::Show => {
                    println!("{}", serde_json::to_string_pretty(&config)?);
                }
                ConfigCommands::Init => {
                    let config_path = Config::get_config_path();
                    if config_path.exists() {
                        println!("Config file already exists at: {}", config_path.display());
                    } else {
                        Config::default().save()?;
                        println!("Initialized new config file at: {}", config_path.display());
                    }
                }
                ConfigCommands::Path => {
                    println!("{}", Config::get_config_path().display());
                }
            }
            Ok(true)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
