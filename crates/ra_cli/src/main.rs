// crates/ra_cli/src/main.rs
//
// Exit codes, error mapping, the validate-only short-circuit, and the full run
// path (params → pipeline → artifacts → optional reports → optional text print).

mod args;
mod logging;

mod exitcodes {
    pub const OK: i32 = 0;
    /// Bad arguments, schema/validation failures, invalid configuration.
    pub const VALIDATION: i32 = 2;
    /// Internal invariant violation (a bug).
    pub const INTERNAL: i32 = 3;
    pub const IO: i32 = 4;
}

use std::fmt;
use std::path::Path;
use std::process::ExitCode;

use args::{parse_and_validate as parse_cli, Args};
use ra_pipeline::{load_and_validate, resolve_params, run, write_artifacts, PipelineError, PipelineOutputs};
use ra_report::{build_model, render_text::render_text, ReportModel};
use tracing::{info, warn};

/// Central error type for CLI → exit-code mapping.
#[derive(Debug)]
enum MainError {
    Validation(String),
    Internal(String),
    Io(String),
}

impl fmt::Display for MainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MainError::Validation(m) => write!(f, "validation: {m}"),
            MainError::Internal(m) => write!(f, "internal: {m}"),
            MainError::Io(m) => write!(f, "io: {m}"),
        }
    }
}

fn main() -> ExitCode {
    let args = match parse_cli() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("ra: error: {e}");
            return ExitCode::from(exitcodes::VALIDATION as u8);
        }
    };
    logging::init(args.quiet);

    let outcome = if args.validate_only { validate_only(&args) } else { run_once(&args) };
    let rc = match outcome {
        Ok(()) => exitcodes::OK,
        Err(e) => {
            eprintln!("ra: error: {e}");
            map_error(&e)
        }
    };
    ExitCode::from(rc as u8)
}

fn map_error(e: &MainError) -> i32 {
    match e {
        MainError::Validation(_) => exitcodes::VALIDATION,
        MainError::Internal(_) => exitcodes::INTERNAL,
        MainError::Io(_) => exitcodes::IO,
    }
}

fn map_pipeline_err(e: PipelineError) -> MainError {
    use PipelineError::*;
    match e {
        Validation(report) => {
            let mut msg = report.to_string();
            for issue in &report.issues {
                msg.push_str("\n  ");
                msg.push_str(&issue.to_string());
            }
            MainError::Validation(msg)
        }
        Schema(m) | InvalidConfig(m) => MainError::Validation(m),
        Io(m) => MainError::Io(m),
        Internal(m) | Build(m) => MainError::Internal(m),
    }
}

/// Load + validate inputs and params; nothing runs, nothing is written.
fn validate_only(args: &Args) -> Result<(), MainError> {
    resolve_params(args.params.as_deref(), &args.overrides()).map_err(map_pipeline_err)?;
    let (_, validated) = load_and_validate(&args.source()).map_err(map_pipeline_err)?;
    if !args.quiet {
        println!(
            "OK: {} unit(s) valid, {} warning(s)",
            validated.inputs.len(),
            validated.report.warnings().count()
        );
    }
    Ok(())
}

fn run_once(args: &Args) -> Result<(), MainError> {
    let params = resolve_params(args.params.as_deref(), &args.overrides()).map_err(map_pipeline_err)?;
    let outs = run(&args.source(), &params).map_err(map_pipeline_err)?;

    let needs_model = args.wants_print() || !args.render.is_empty();
    let model = if needs_model { Some(report_model(&outs)?) } else { None };

    if let Some(dir) = &args.out {
        let written = write_artifacts(dir, &outs).map_err(map_pipeline_err)?;
        if let Some(m) = &model {
            render_reports(args, m, dir)?;
        }
        info!(dir = %dir.display(), files = written.len(), "run complete");
    }

    if args.wants_print() {
        if let Some(m) = &model {
            print!("{}", render_text(m));
        }
    }
    Ok(())
}

fn report_model(outs: &PipelineOutputs) -> Result<ReportModel, MainError> {
    let result = serde_json::to_value(&outs.result).map_err(|e| MainError::Internal(format!("result to JSON: {e}")))?;
    let run = serde_json::to_value(&outs.run_record)
        .map_err(|e| MainError::Internal(format!("run_record to JSON: {e}")))?;
    build_model(&result, &run).map_err(|e| MainError::Internal(format!("report: {e}")))
}

fn render_reports(args: &Args, model: &ReportModel, out_dir: &Path) -> Result<(), MainError> {
    for fmt in &args.render {
        match fmt.as_str() {
            "json" => render_json_report(model, out_dir)?,
            "html" => render_html_report(model, out_dir)?,
            other => warn!(renderer = other, "unknown renderer skipped"),
        }
    }
    Ok(())
}

fn write_report(path: &Path, body: &str) -> Result<(), MainError> {
    ra_io::canonical_json::write_atomic(path, body.as_bytes())
        .map_err(|e| MainError::Io(format!("write {}: {e}", path.display())))
}

fn render_json_report(model: &ReportModel, out_dir: &Path) -> Result<(), MainError> {
    #[cfg(feature = "report-json")]
    {
        let body = ra_report::render_json::render_json(model).map_err(|e| MainError::Internal(e.to_string()))?;
        write_report(&out_dir.join("report.json"), &body)
    }
    #[cfg(not(feature = "report-json"))]
    {
        let _ = (model, out_dir);
        Err(MainError::Validation("json renderer not enabled (build with feature `report-json`)".into()))
    }
}

fn render_html_report(model: &ReportModel, out_dir: &Path) -> Result<(), MainError> {
    #[cfg(feature = "report-html")]
    {
        let body = ra_report::render_html::render_html(model).map_err(|e| MainError::Internal(e.to_string()))?;
        write_report(&out_dir.join("report.html"), &body)
    }
    #[cfg(not(feature = "report-html"))]
    {
        let _ = (model, out_dir);
        Err(MainError::Validation("html renderer not enabled (build with feature `report-html`)".into()))
    }
}
