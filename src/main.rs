use banded::{
    OutputFormat, PipelineError, RenderConfig, ReportPipelineBuilder, Severity, VecRowSource,
    lint_template, template_info, validate_template,
};
use clap::Parser;
use serde_json::Value as Json;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Renders a JRXML report template against a JSON array of rows.
#[derive(Parser, Debug)]
#[command(name = "banded", version, about)]
struct Cli {
    /// The JRXML template.
    template: PathBuf,

    /// A JSON array of row objects. Without it the report has no rows.
    data: Option<PathBuf>,

    /// Where to write the report; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// html, pdf, xlsx or chart. Inferred from the output extension, else pdf.
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// A report parameter. Values that parse as JSON are taken as JSON.
    #[arg(short = 'p', long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
    params: Vec<(String, Json)>,

    /// Reject parameters the template does not declare.
    #[arg(long)]
    strict: bool,

    /// Print validation and lint findings and exit.
    #[arg(long)]
    validate: bool,

    /// Print a JSON summary of the template and exit.
    #[arg(long)]
    info: bool,

    /// Print the bound field values of the first N rows as JSON and exit.
    #[arg(long, value_name = "N")]
    preview: Option<usize>,

    /// Print the paginated layout model as JSON instead of rendering.
    #[arg(long)]
    debug_layout: bool,
}

fn parse_param(arg: &str) -> Result<(String, Json), String> {
    let (name, raw) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", arg))?;
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Json::String(raw.to_string()));
    Ok((name.trim().to_string(), value))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("banded=info"))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, PipelineError> {
    let source = fs::read_to_string(&cli.template)?;

    if cli.validate {
        return validate(&source);
    }

    let format = cli
        .format
        .or_else(|| cli.output.as_deref().and_then(OutputFormat::from_extension))
        .unwrap_or(OutputFormat::Pdf);
    let config = RenderConfig::default()
        .with_format(format)
        .with_strict_parameters(cli.strict)
        .with_preview_limit(cli.preview.unwrap_or(banded::DEFAULT_PREVIEW_LIMIT));

    let pipeline = ReportPipelineBuilder::new()
        .with_template_source(&source)?
        .with_parameters(cli.params.into_iter().collect())
        .with_config(config)
        .build()?;

    if cli.info {
        print_json(&template_info(pipeline.template()))?;
        return Ok(ExitCode::SUCCESS);
    }

    let rows = match &cli.data {
        Some(path) => VecRowSource::from_json_str(&fs::read_to_string(path)?)?,
        None => VecRowSource::default(),
    };

    if cli.preview.is_some() {
        print_json(&pipeline.preview(rows)?)?;
        return Ok(ExitCode::SUCCESS);
    }

    if cli.debug_layout {
        print_json(&pipeline.layout(rows)?)?;
        return Ok(ExitCode::SUCCESS);
    }

    match &cli.output {
        Some(path) => pipeline.render_to_file(rows, path)?,
        None => {
            let bytes = pipeline.render(rows)?;
            io::stdout().lock().write_all(&bytes)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn validate(source: &str) -> Result<ExitCode, PipelineError> {
    let mut findings = banded_template::validate_source(source);
    if findings.is_empty() {
        let template = banded::parse_template(source)?;
        findings = validate_template(&template);
        findings.extend(lint_template(&template));
    }
    for finding in &findings {
        println!("{}", finding);
    }
    let errors = findings.iter().filter(|f| f.severity == Severity::Error).count();
    println!("{} error(s), {} warning(s)", errors, findings.len() - errors);
    Ok(if errors == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), PipelineError> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
