use clap::{Args, Parser, Subcommand, ValueEnum};
use ovsdb::schema::{parse_schema, Schema};
use ovsdb::validation::check_schema;
use ovsdb_codegen::naming::SchemaNames;
use ovsdb_codegen::{generate, CodegenConfig, DEFAULT_RUNTIME_PATH};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process;

/// ovsdb-gen: generate typed Rust data-access code from OVSDB schemas
#[derive(Parser)]
#[command(name = "ovsdb-gen", version, about)]
struct Cli {
    /// Output format for inspect and validate reports
    #[arg(long, default_value = "yaml", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Args)]
struct SchemaArgs {
    /// Path to the .ovsschema JSON file
    #[arg(long, env = "OVSDB_SCHEMA")]
    schema: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Generate Rust source for a schema
    Generate {
        #[command(flatten)]
        schema: SchemaArgs,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Path of the runtime crate as seen from the generated code
        #[arg(long, default_value = DEFAULT_RUNTIME_PATH)]
        runtime_path: String,
    },

    /// Show tables, columns, shapes and the Rust names derived for them
    Inspect {
        #[command(flatten)]
        schema: SchemaArgs,
    },

    /// Check a schema without generating code
    Validate {
        #[command(flatten)]
        schema: SchemaArgs,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("ERROR:{e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Generate {
            schema,
            output,
            runtime_path,
        } => {
            let schema = load(&schema.schema)?;
            let config = CodegenConfig::with_runtime_path(runtime_path);
            let source = generate(&schema, &config)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, source)
                        .map_err(|e| format!("Failed to write '{}': {e}", path.display()))?;
                    log::info!("wrote {}", path.display());
                }
                None => print!("{source}"),
            }
        }

        Command::Inspect { schema } => {
            let schema = load(&schema.schema)?;
            let report = inspect(&schema)?;
            print_output(&report, &cli.format)?;
        }

        Command::Validate { schema } => {
            let schema = load(&schema.schema)?;
            let report = validate(&schema);
            print_output(&report, &cli.format)?;
            if !report.valid {
                return Err(format!("schema {} has {} error(s)", schema.name, report.errors.len()).into());
            }
        }
    }

    Ok(())
}

fn load(path: &Path) -> Result<Schema, Box<dyn std::error::Error>> {
    let schema = parse_schema(path)
        .map_err(|e| format!("Failed to load schema '{}': {e}", path.display()))?;
    Ok(schema)
}

#[derive(Serialize)]
struct SchemaReport {
    name: String,
    version: Option<String>,
    database_type: String,
    row_ref_type: String,
    tables: Vec<TableReport>,
}

#[derive(Serialize)]
struct TableReport {
    name: String,
    row_type: String,
    table_type: String,
    field: String,
    is_root: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_rows: Option<u64>,
    indexes: Vec<Vec<String>>,
    columns: Vec<ColumnReport>,
    referrer_finders: Vec<String>,
}

#[derive(Serialize)]
struct ColumnReport {
    name: String,
    field: String,
    shape: String,
    family: String,
    read_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    ref_table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value_ref_table: Option<String>,
}

fn inspect(schema: &Schema) -> Result<SchemaReport, Box<dyn std::error::Error>> {
    let names = SchemaNames::resolve(schema)?;

    let mut tables = Vec::new();
    for table in schema.ordered_tables() {
        let table_names = names.table(&table.name)?;
        let mut columns = Vec::new();
        for column in table.ordered_columns() {
            let family = column.family(table)?;
            columns.push(ColumnReport {
                name: column.name.clone(),
                field: table_names.column(&column.name)?.to_string(),
                shape: family.shape.to_string(),
                family: family.to_string(),
                read_only: column.is_read_only(),
                ref_table: column.key_ref_table().map(str::to_string),
                value_ref_table: column.value_ref_table().map(str::to_string),
            });
        }
        tables.push(TableReport {
            name: table.name.clone(),
            row_type: table_names.row_type.clone(),
            table_type: table_names.table_type.clone(),
            field: table_names.field.clone(),
            is_root: table.is_root,
            max_rows: table.max_rows,
            indexes: table_names.indexes.iter().map(|i| i.columns.clone()).collect(),
            columns,
            referrer_finders: table_names.referrers.iter().map(|r| r.method.clone()).collect(),
        });
    }

    Ok(SchemaReport {
        name: schema.name.clone(),
        version: schema.version.clone(),
        database_type: names.db_type.clone(),
        row_ref_type: names.row_ref_type.clone(),
        tables,
    })
}

#[derive(Serialize)]
struct ValidationReport {
    valid: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
}

fn validate(schema: &Schema) -> ValidationReport {
    let result = check_schema(schema);
    let mut errors: Vec<String> = result.errors.iter().map(|e| e.to_string()).collect();
    // Naming problems only surface once the structural checks pass.
    if errors.is_empty() {
        if let Err(e) = SchemaNames::resolve(schema) {
            errors.push(e.to_string());
        }
    }
    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings: result.warnings,
    }
}

fn print_output<T: Serialize>(
    value: &T,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ovsdb::schema::parse_schema_str;

    const SCHEMA: &str = r#"{
      "name": "Open_vSwitch",
      "tables": {
        "Open_vSwitch": {
          "columns": {
            "bridges": {"type": {"key": {"type": "uuid", "refTable": "Bridge"}, "min": 0, "max": "unlimited"}}
          },
          "isRoot": true
        },
        "Bridge": {
          "columns": {
            "name": {"type": "string"},
            "type": {"type": {"key": "string", "min": 0, "max": 1}}
          },
          "indexes": [["name"]]
        }
      }
    }"#;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "ovsdb-gen",
            "generate",
            "--schema",
            "vswitch.ovsschema",
            "--runtime-path",
            "crate::ovsdb",
        ])
        .unwrap();
        match cli.command {
            Command::Generate {
                schema,
                output,
                runtime_path,
            } => {
                assert_eq!(schema.schema, PathBuf::from("vswitch.ovsschema"));
                assert!(output.is_none());
                assert_eq!(runtime_path, "crate::ovsdb");
            }
            _ => panic!("expected generate"),
        }

        let cli = Cli::try_parse_from(["ovsdb-gen", "inspect", "--schema", "a.json", "--format", "json"])
            .unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
        assert!(matches!(cli.command, Command::Inspect { .. }));
    }

    #[test]
    fn test_inspect_report() {
        let schema = parse_schema_str(SCHEMA).unwrap();
        let report = inspect(&schema).unwrap();
        assert_eq!(report.database_type, "OvsdbOpenVSwitch");
        assert_eq!(report.tables.len(), 2);

        let bridge = &report.tables[0];
        assert_eq!(bridge.name, "Bridge");
        assert_eq!(bridge.indexes, vec![vec!["name".to_string()]]);
        let ty = bridge.columns.iter().find(|c| c.name == "type").unwrap();
        assert_eq!(ty.field, "r#type");
        assert_eq!(ty.shape, "Optional");
        assert_eq!(ty.family, "Optional<StringAtom>");

        let root = &report.tables[1];
        assert_eq!(root.referrer_finders, vec!["find_bridge_referrer_bridges".to_string()]);
    }

    #[test]
    fn test_validate_report() {
        let schema = parse_schema_str(SCHEMA).unwrap();
        let report = validate(&schema);
        assert!(report.valid);
        assert!(report.errors.is_empty());

        let broken = SCHEMA.replace(r#""refTable": "Bridge""#, r#""refTable": "Missing""#);
        let report = validate(&parse_schema_str(&broken).unwrap());
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
    }
}
