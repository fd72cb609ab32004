use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use vaultlogic::{
    EvaluationContext, ListVariable, Value, VariableResolver, evaluate_condition, parse_condition,
    parse_condition_value, parse_transform_config, parse_variables, transform_list_with_context,
    validate_condition_expression,
};

#[derive(Parser)]
#[command(name = "vaultlogic")]
#[command(version, about = "Evaluate workflow conditions and transform list variables")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate a condition expression and print true or false
    Eval {
        #[arg(short = 'e', long = "expr")]
        expr: PathBuf,
        #[arg(short = 'c', long = "context")]
        context: Option<PathBuf>,
        #[arg(short = 'r', long = "record")]
        record: Option<PathBuf>,
    },
    /// Check a condition expression and print one problem per line
    Validate {
        #[arg(short = 'e', long = "expr")]
        expr: PathBuf,
    },
    /// Run a list variable through a transform config
    Transform {
        #[arg(short = 'l', long = "list")]
        list: PathBuf,
        #[arg(short = 't', long = "config")]
        config: PathBuf,
        #[arg(short = 'c', long = "context")]
        context: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
    /// Resolve variable aliases to storage keys
    Resolve {
        #[arg(short = 'v', long = "variables")]
        variables: PathBuf,
        #[arg(required = true)]
        names: Vec<String>,
    },
}

fn main() -> Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Eval {
            expr,
            context,
            record,
        } => run_eval(&expr, context.as_deref(), record.as_deref()),
        Command::Validate { expr } => run_validate(&expr),
        Command::Transform {
            list,
            config,
            context,
            pretty,
        } => run_transform(&list, &config, context.as_deref(), pretty),
        Command::Resolve { variables, names } => run_resolve(&variables, &names),
    }
}

fn run_eval(expr: &Path, context: Option<&Path>, record: Option<&Path>) -> Result<ExitCode> {
    let text = read_text(expr)?;
    let condition = parse_condition(&text)
        .with_context(|| format!("failed to parse condition: {}", expr.display()))?;
    let variables = match context {
        Some(path) => read_object(path)?,
        None => serde_json::Map::new(),
    };
    let mut ctx = EvaluationContext::new(variables);
    if let Some(path) = record {
        ctx = ctx.with_record(read_object(path)?);
    }

    let result = evaluate_condition(&condition, &ctx);
    debug!(result, "condition evaluated");
    println!("{}", result);
    Ok(ExitCode::SUCCESS)
}

fn run_validate(expr: &Path) -> Result<ExitCode> {
    let text = read_text(expr)?;
    let raw = parse_condition_value(&text)
        .with_context(|| format!("failed to parse condition: {}", expr.display()))?;
    let errors = validate_condition_expression(&raw);
    if errors.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }
    for err in &errors {
        println!("{}", err);
    }
    Ok(ExitCode::FAILURE)
}

fn run_transform(
    list_path: &Path,
    config_path: &Path,
    context: Option<&Path>,
    pretty: bool,
) -> Result<ExitCode> {
    let list = read_list(list_path)?;
    let config_text = read_text(config_path)?;
    let config = parse_transform_config(&config_text)
        .with_context(|| format!("failed to parse transform config: {}", config_path.display()))?;
    let context = match context {
        Some(path) => read_object(path)?,
        None => serde_json::Map::new(),
    };

    let output = transform_list_with_context(&list, &config, &context);
    let rendered = if pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", rendered);
    Ok(ExitCode::SUCCESS)
}

fn run_resolve(variables_path: &Path, names: &[String]) -> Result<ExitCode> {
    let text = read_text(variables_path)?;
    let variables = parse_variables(&text)
        .with_context(|| format!("failed to parse variables: {}", variables_path.display()))?;
    let resolver = VariableResolver::new(&variables);
    for key in resolver.resolve_operands(names) {
        println!("{}", key);
    }
    Ok(ExitCode::SUCCESS)
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn has_extension(path: &Path, wanted: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| wanted.iter().any(|w| ext.eq_ignore_ascii_case(w)))
}

fn read_document(path: &Path) -> Result<Value> {
    let text = read_text(path)?;
    let value = if has_extension(path, &["yaml", "yml"]) {
        serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse YAML: {}", path.display()))?
    } else {
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse JSON: {}", path.display()))?
    };
    Ok(value)
}

fn read_object(path: &Path) -> Result<serde_json::Map<String, Value>> {
    match read_document(path)? {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("{} must contain an object", path.display()),
    }
}

fn read_list(path: &Path) -> Result<ListVariable> {
    let text = read_text(path)?;
    let list = if has_extension(path, &["csv"]) {
        ListVariable::from_csv_str(&text)
    } else {
        ListVariable::from_json_str(&text)
    };
    list.with_context(|| format!("failed to load list: {}", path.display()))
}
