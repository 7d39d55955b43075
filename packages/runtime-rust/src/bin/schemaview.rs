//! `schemaview`: describe a JSON Schema, validate rows against it, or
//! render one page of a table view as JSON.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use schemaview_core::{
    introspect, validate_row, JsonSchemaNode, Row, RowKeyAccessor, SortDirection, Value,
    ViewAction,
};
use schemaview_runtime::{init_tracing, RuntimeConfig, ViewRegistry};

#[derive(Parser)]
#[command(name = "schemaview")]
#[command(about = "Schema-driven table and form descriptors", long_about = None)]
struct Cli {
    /// Runtime config (JSON); defaults apply to missing keys
    #[arg(long, global = true, env = "SCHEMAVIEW_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the field descriptors of a schema
    Describe {
        /// Path to the JSON Schema document
        #[arg(short, long)]
        schema: PathBuf,
    },

    /// Validate every row of a dataset; exits non-zero if any row fails
    Validate {
        #[arg(short, long)]
        schema: PathBuf,

        /// Path to a JSON array of row objects
        #[arg(short, long)]
        rows: PathBuf,
    },

    /// Render one page of the table view
    Page {
        #[arg(short, long)]
        schema: PathBuf,

        #[arg(short, long)]
        rows: PathBuf,

        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: usize,

        #[arg(long)]
        page_size: Option<usize>,

        /// Sort column, optionally suffixed with `:desc`; repeat for multi-sort
        #[arg(long)]
        sort: Vec<String>,

        /// Global filter text
        #[arg(long)]
        filter: Option<String>,

        /// Field holding the row key; row position when omitted
        #[arg(long)]
        key: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => RuntimeConfig::from_json(&read(path)?)?,
        None => RuntimeConfig::default(),
    };
    // A subscriber installed by an embedding process wins.
    let _ = init_tracing(config.log_format, &config.log_filter);

    match cli.command {
        Commands::Describe { schema } => {
            let doc = load_json(&schema)?;
            let definition = introspect(&JsonSchemaNode::new(&doc));
            println!("{}", serde_json::to_string_pretty(&definition)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate { schema, rows } => {
            let doc = load_json(&schema)?;
            let node = JsonSchemaNode::new(&doc);
            let mut failed = 0usize;
            for (index, row) in load_rows(&rows)?.iter().enumerate() {
                let result = validate_row(&node, row);
                for (path, message) in result.errors().iter() {
                    println!("row {index}: {path}: {message}");
                }
                if !result.is_valid() {
                    failed += 1;
                }
            }
            if failed > 0 {
                println!("{failed} invalid row(s)");
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Page {
            schema,
            rows,
            page,
            page_size,
            sort,
            filter,
            key,
        } => {
            let doc = load_json(&schema)?;
            let definition = introspect(&JsonSchemaNode::new(&doc));

            let mut view_config = config.view_config().with_multi_sort(sort.len() > 1);
            if let Some(field) = key {
                view_config = view_config.with_row_key(RowKeyAccessor::field(field));
            }
            let registry = ViewRegistry::new(config);
            let view = registry.mount(definition.name.clone(), &definition, view_config)?;
            view.set_rows(load_rows(&rows)?)?;

            if let Some(size) = page_size {
                view.dispatch(&ViewAction::SetPageSize { size })?;
            }
            for spec in &sort {
                let (column, direction) = parse_sort(spec)?;
                view.dispatch(&ViewAction::AddSort { column, direction })?;
            }
            if let Some(text) = filter {
                view.dispatch(&ViewAction::SetGlobalFilter { text })?;
            }
            view.dispatch(&ViewAction::SetPageIndex {
                index: page.saturating_sub(1),
            })?;

            let snapshot = view.snapshot();
            let columns: Vec<_> = snapshot.visible_columns().into_iter().cloned().collect();
            let page_rows: Vec<serde_json::Value> = snapshot
                .page_rows()
                .into_iter()
                .map(|row| {
                    let cells = columns.iter().map(|c| {
                        let cell = row.get(&c.id).map_or(serde_json::Value::Null, Value::to_json);
                        (c.id.clone(), cell)
                    });
                    serde_json::Value::Object(cells.collect())
                })
                .collect();
            let out = serde_json::json!({
                "columns": columns,
                "rows": page_rows,
                "pageIndex": snapshot.state().pagination.page_index,
                "pageCount": snapshot.page_count(),
                "rowCount": snapshot.row_count(),
                "pages": view.page_strip(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn load_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    serde_json::from_str(&read(path)?).with_context(|| format!("parsing {}", path.display()))
}

fn load_rows(path: &Path) -> anyhow::Result<Vec<Row>> {
    let serde_json::Value::Array(items) = load_json(path)? else {
        bail!("{}: expected a JSON array of objects", path.display());
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| -> anyhow::Result<Row> {
            let serde_json::Value::Object(fields) = item else {
                bail!("{}: row {index} is not an object", path.display());
            };
            Ok(fields
                .into_iter()
                .map(|(name, value)| (name, Value::from(value)))
                .collect())
        })
        .collect()
}

fn parse_sort(spec: &str) -> anyhow::Result<(String, SortDirection)> {
    match spec.split_once(':') {
        None => Ok((spec.to_string(), SortDirection::Asc)),
        Some((column, "asc")) => Ok((column.to_string(), SortDirection::Asc)),
        Some((column, "desc")) => Ok((column.to_string(), SortDirection::Desc)),
        Some((_, other)) => bail!("unknown sort direction '{other}' in '{spec}'"),
    }
}
