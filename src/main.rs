//! CLI entry point for minibars

use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use minibars::config::{load_context, RenderConfig};
use minibars::Template;

#[derive(Parser)]
#[command(name = "minibars")]
#[command(author = "Yukang Chen")]
#[command(version)]
#[command(about = "Compile and render minibars HTML templates", long_about = None)]
struct Cli {
    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template with a context
    #[command(alias = "r")]
    Render {
        /// Template file
        template: PathBuf,

        /// Context data file (JSON, YAML or TOML)
        #[arg(short, long)]
        context: Option<PathBuf>,

        /// Values for the template's declared globals (JSON, YAML or TOML)
        #[arg(short, long)]
        globals: Option<PathBuf>,

        /// Render configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the output here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compile templates and report the variables they use
    Check {
        /// Template files
        #[arg(required = true)]
        templates: Vec<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "minibars=debug,info"
    } else {
        "minibars=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Render {
            template,
            context,
            globals,
            config,
            output,
        } => render(&template, context, globals, config, output)?,

        Commands::Check { templates, json } => check(&templates, json)?,

        Commands::Version => {
            println!("minibars version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn compile_file(path: &Path) -> Result<Template> {
    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read template {:?}", path))?;
    Template::compile(&source).with_context(|| format!("Failed to compile {:?}", path))
}

fn render(
    template_path: &Path,
    context_path: Option<PathBuf>,
    globals_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = match config_path {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };

    let context = match context_path {
        Some(path) => load_context(path)?,
        None => config.load_context()?,
    };
    let mut globals = config.globals_context();
    if let Some(path) = globals_path {
        globals.merge(&load_context(path)?);
    }
    let host = config.host();

    let template = compile_file(template_path)?;
    for name in template.required_variables() {
        if !context.contains(name) {
            tracing::debug!("Context has no value for {}", name);
        }
    }

    tracing::info!("Rendering {:?}", template_path);
    let rendered = template
        .render_with_host(&host, Some(&context), &globals)
        .with_context(|| format!("Failed to render {:?}", template_path))?;

    match output.or(config.output) {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, rendered).with_context(|| format!("Failed to write {:?}", path))?;
            tracing::info!("Wrote {:?}", path);
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

fn check(paths: &[PathBuf], json: bool) -> Result<()> {
    let mut report = Vec::new();
    let mut failed = 0;

    for path in paths {
        match compile_file(path) {
            Ok(template) => {
                let required: Vec<&String> = template.required_variables().iter().collect();
                let declared: Vec<&String> = template.declared_globals().iter().collect();
                if json {
                    report.push(serde_json::json!({
                        "template": path,
                        "ok": true,
                        "required": required,
                        "globals": declared,
                    }));
                } else {
                    println!("ok    {}", path.display());
                    if !required.is_empty() {
                        println!("      required: {}", join(&required));
                    }
                    if !declared.is_empty() {
                        println!("      globals:  {}", join(&declared));
                    }
                }
            }
            Err(e) => {
                failed += 1;
                let message = format!("{:#}", e);
                if json {
                    report.push(serde_json::json!({
                        "template": path,
                        "ok": false,
                        "error": message,
                    }));
                } else {
                    println!("error {}", path.display());
                    println!("      {}", message);
                }
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    if failed > 0 {
        bail!("{} of {} templates failed to compile", failed, paths.len());
    }
    Ok(())
}

fn join(names: &[&String]) -> String {
    names
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
