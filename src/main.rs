use clap::Parser;
use std::io::Read;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use ysh_syntax::{parse_with_options, to_source, ParserOptions};

#[derive(Parser)]
#[command(name = "ysh-parse")]
#[command(about = "Parse YSH source and report syntax diagnostics")]
#[command(version)]
struct Cli {
    /// Parse the script given on the command line
    #[arg(short = 'c')]
    script: Option<String>,

    /// Dump the syntax tree and diagnostics as JSON
    #[arg(long = "json")]
    json: bool,

    /// Print the canonical re-serialization of the parsed source
    #[arg(long = "print")]
    print: bool,

    /// Fail on any diagnostic, including informational ones
    #[arg(long = "strict")]
    strict: bool,

    /// Script file to parse
    #[arg()]
    script_file: Option<String>,
}

fn read_source(cli: &Cli) -> Result<String, String> {
    if let Some(script) = &cli.script {
        return Ok(script.clone());
    }
    if let Some(file) = &cli.script_file {
        return std::fs::read_to_string(file)
            .map_err(|e| format!("cannot read script file: {}: {}", file, e));
    }

    use std::io::IsTerminal;
    if std::io::stdin().is_terminal() {
        return Err(
            "no script provided. Use -c 'script', provide a script file, or pipe via stdin."
                .to_string(),
        );
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| format!("cannot read stdin: {}", e))?;
    Ok(buf)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let source = match read_source(&cli) {
        Ok(source) => source,
        Err(message) => {
            eprintln!("Error: {}", message);
            return ExitCode::from(2);
        }
    };

    let (program, diagnostics) = parse_with_options(&source, &ParserOptions::default());

    for diagnostic in &diagnostics {
        eprintln!("{}", diagnostic.render(&source));
    }

    if cli.json {
        let output = serde_json::json!({
            "program": program,
            "diagnostics": diagnostics,
        });
        match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: cannot serialize syntax tree: {}", e);
                return ExitCode::from(2);
            }
        }
    }

    if cli.print {
        print!("{}", to_source(&program));
    }

    let failed = if cli.strict {
        !diagnostics.is_empty()
    } else {
        diagnostics.iter().any(|d| d.is_error())
    };
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
