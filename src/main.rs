use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;

use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use log::{LevelFilter, error, info};
use rand::SeedableRng;
use rand::rngs::StdRng;

use notes_diagram::diagram::render_diagram;
use notes_diagram::export::{Envelope, svg_to_pdf, svg_to_png};
use notes_diagram::{Error, Result, Theme};

/// Render automata and sequence diagrams written as plain text
#[derive(Parser, Debug)]
#[command(name = "notes-diagram")]
#[command(about = "Render text diagrams to SVG, PNG, PDF or a JSON envelope", long_about = None)]
struct Args {
    /// Input diagram file (use "-" for stdin)
    #[arg(value_name = "INPUT", required_unless_present_any = ["completions", "list_themes"])]
    input: Option<PathBuf>,

    /// Output file path (extension determines format: .svg, .png, .pdf or .json)
    #[arg(short, long, value_name = "OUTPUT", required_unless_present_any = ["completions", "list_themes"])]
    output: Option<PathBuf>,

    /// Path to a theme file (TOML or YAML)
    #[arg(short, long, value_name = "THEME", conflicts_with = "builtin_theme")]
    theme: Option<PathBuf>,

    /// Name of a built-in theme
    #[arg(long, value_name = "NAME")]
    builtin_theme: Option<String>,

    /// Print the names of the built-in themes and exit
    #[arg(long)]
    list_themes: bool,

    /// Seed for automata state placement, for reproducible layouts
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Raster scale multiplier for PNG output (e.g. 2.0 for sharper output)
    #[arg(long, default_value_t = 1.0)]
    png_scale: f32,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

fn main() {
    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    if let Err(err) = run(&args) {
        error!(err:err; "Render failed");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    if let Some(shell) = args.completions {
        clap_complete::generate(
            shell,
            &mut Args::command(),
            "notes-diagram",
            &mut std::io::stdout(),
        );
        return Ok(());
    }

    if args.list_themes {
        for name in Theme::list_builtins() {
            println!("{}", name);
        }
        return Ok(());
    }

    let (Some(input), Some(output)) = (&args.input, &args.output) else {
        return Err(Error::Usage("both INPUT and --output are required".to_string()));
    };

    let theme = load_theme(args)?;
    let source = read_source(input)?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let output_ext = output
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| Error::Usage("output file has no extension".to_string()))?;

    let rendered = render_diagram(&source, &theme, &mut rng);

    match output_ext.as_str() {
        "json" => {
            let failure = rendered.as_ref().err().cloned();
            let envelope = Envelope::from_result(rendered);
            let json = serde_json::to_string_pretty(&envelope)
                .map_err(|e| Error::Export(format!("failed to encode JSON: {}", e)))?;
            write_output(output, json.as_bytes())?;
            if let Some(err) = failure {
                return Err(err.into());
            }
        }
        "svg" => write_output(output, rendered?.as_bytes())?,
        "png" => write_output(output, &svg_to_png(&rendered?, args.png_scale)?)?,
        "pdf" => write_output(output, &svg_to_pdf(&rendered?)?)?,
        _ => {
            return Err(Error::Usage(format!(
                "unsupported output format: .{} (use .svg, .png, .pdf or .json)",
                output_ext
            )));
        }
    }

    info!(path = output.display().to_string(); "Diagram saved");
    Ok(())
}

fn load_theme(args: &Args) -> Result<Theme> {
    match (&args.theme, &args.builtin_theme) {
        (Some(path), _) => Theme::from_path(path),
        (None, Some(name)) => Theme::from_builtin(name),
        (None, None) => Ok(Theme::default()),
    }
}

fn read_source(input: &Path) -> Result<String> {
    if input.to_str() == Some("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| Error::io("<stdin>", e))?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(input).map_err(|e| Error::io(input, e))
    }
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).map_err(|e| Error::io(path, e))
}
