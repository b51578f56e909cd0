// File: crates/cml-cli/src/main.rs
// Summary: `cml-renderer <input.cml> [output.png]`; parses a CML document and rasterizes it to PNG.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use cml_core::{parse, RenderOptions};
use cml_render_skia::render_to_png;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const BUILD_TIME: &str = match option_env!("CML_BUILD_TIME") {
    Some(v) => v,
    None => "unknown",
};
const GIT_REF: &str = match option_env!("CML_GIT_REF") {
    Some(v) => v,
    None => "unknown",
};
const DEFAULT_OUTPUT: &str = "output.png";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Usage,
    Version,
    Render { input: PathBuf, output: PathBuf },
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Command {
    let mut args = args.into_iter().skip(1);
    match args.next() {
        None => Command::Usage,
        Some(flag) if flag == "--version" || flag == "-v" => Command::Version,
        Some(input) => Command::Render {
            input: PathBuf::from(input),
            output: PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_OUTPUT.to_string())),
        },
    }
}

fn build_info() -> String {
    format!("Build Time: {BUILD_TIME}\nGit Ref: {GIT_REF}")
}

fn run(input: &Path, output: &Path) -> Result<()> {
    let text = std::fs::read_to_string(input).with_context(|| format!("error reading file {}", input.display()))?;
    let chart = parse(&text).context("error parsing CML")?;
    debug!(bars = chart.bars.len(), drawings = chart.drawings.len(), "parsed {}", input.display());
    render_to_png(&chart, &RenderOptions::default(), output).context("error rendering chart")?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match parse_args(std::env::args()) {
        Command::Usage => {
            println!("Usage: cml-renderer <input.cml> [output.png]");
            println!("Example: cml-renderer example.cml chart.png");
            println!();
            println!("Version: {VERSION}");
            println!("{}", build_info());
            ExitCode::FAILURE
        }
        Command::Version => {
            println!("cml-renderer version {VERSION}");
            println!("{}", build_info());
            ExitCode::SUCCESS
        }
        Command::Render { input, output } => match run(&input, &output) {
            Ok(()) => {
                println!("Chart rendered successfully to {}", output.display());
                ExitCode::SUCCESS
            }
            Err(err) => {
                error!("{err:#}");
                eprintln!("Error: {err:#}");
                ExitCode::FAILURE
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("cml-renderer").chain(list.iter().copied()).map(String::from).collect()
    }

    #[test]
    fn no_arguments_prints_usage() {
        assert_eq!(parse_args(args(&[])), Command::Usage);
    }

    #[test]
    fn version_flags() {
        assert_eq!(parse_args(args(&["--version"])), Command::Version);
        assert_eq!(parse_args(args(&["-v"])), Command::Version);
    }

    #[test]
    fn output_defaults_to_output_png() {
        assert_eq!(
            parse_args(args(&["chart.cml"])),
            Command::Render { input: "chart.cml".into(), output: "output.png".into() }
        );
        assert_eq!(
            parse_args(args(&["chart.cml", "out/c.png"])),
            Command::Render { input: "chart.cml".into(), output: "out/c.png".into() }
        );
    }

    #[test]
    fn missing_input_is_an_error() {
        let err = run(Path::new("does/not/exist.cml"), Path::new("unused.png")).unwrap_err();
        assert!(format!("{err:#}").contains("error reading file"));
    }

    #[test]
    fn parse_errors_carry_line_numbers() {
        let dir = std::env::temp_dir().join(format!("cml-cli-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("bad.cml");
        std::fs::write(&input, "bars:\n  2024/01/01 10:00, 1, x, 0.5, 1\n").unwrap();
        let err = run(&input, &dir.join("bad.png")).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("error parsing CML"), "{msg}");
        assert!(msg.contains("line 2"), "{msg}");
        assert!(!dir.join("bad.png").exists());
    }
}
