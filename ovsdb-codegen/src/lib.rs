//! OVSDB code generation - generates typed Rust data-access code from an
//! RFC 7047 schema at compile time.
//!
//! The main entry point is [`generate_from_schema`], which reads a schema JSON
//! file and writes a complete Rust source file with one row struct and one
//! table aggregate per table, plus a database struct tying them together.

mod database_gen;
mod generator;
pub mod naming;
mod row_gen;
mod table_gen;
pub mod type_utils;

use ovsdb::error::{OvsdbError, Result};
use ovsdb::schema::Schema;
use std::path::Path;

/// Default path of the runtime crate as seen from generated code.
pub const DEFAULT_RUNTIME_PATH: &str = "::ovsdb";

/// Options for a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenConfig {
    /// Path under which generated code reaches the `ovsdb` runtime crate,
    /// e.g. `::ovsdb` or `crate::ovsdb` when it is re-exported.
    pub runtime_path: String,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            runtime_path: DEFAULT_RUNTIME_PATH.to_string(),
        }
    }
}

impl CodegenConfig {
    pub fn with_runtime_path(runtime_path: impl Into<String>) -> Self {
        Self {
            runtime_path: runtime_path.into(),
        }
    }

    fn parsed_runtime_path(&self) -> Result<syn::Path> {
        syn::parse_str::<syn::Path>(&self.runtime_path).map_err(|e| {
            OvsdbError::Config(format!(
                "invalid runtime path {:?}: {e}",
                self.runtime_path
            ))
        })
    }
}

/// Generate formatted Rust source for an already parsed schema.
pub fn generate(schema: &Schema, config: &CodegenConfig) -> Result<String> {
    let runtime_path = config.parsed_runtime_path()?;
    let tokens = generator::generate_all(schema, &runtime_path)?;
    let mut source = generator::file_header(schema);
    source.push_str(&generator::format_token_stream(&tokens)?);
    Ok(source)
}

/// Generate Rust types from a schema JSON file.
///
/// Reads the schema at `schema_path`, generates typed Rust code, and writes
/// the output to `output_path`. This is intended to be called from a `build.rs`
/// build script.
///
/// # Example
///
/// ```no_run
/// // In build.rs:
/// let out_dir = std::env::var("OUT_DIR").unwrap();
/// ovsdb_codegen::generate_from_schema("schema.json", &format!("{out_dir}/generated.rs")).unwrap();
/// ```
pub fn generate_from_schema(
    schema_path: &str,
    output_path: &str,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let schema = ovsdb::schema::parse_schema(Path::new(schema_path))?;
    let source = generate(&schema, &CodegenConfig::default())?;
    std::fs::write(output_path, source)?;
    Ok(())
}

/// Generate Rust types from a schema JSON string.
///
/// Like [`generate_from_schema`] but takes the schema content directly
/// instead of reading from a file. Useful for testing.
pub fn generate_from_schema_str(
    schema_json: &str,
) -> std::result::Result<String, Box<dyn std::error::Error>> {
    let schema = ovsdb::schema::parse_schema_str(schema_json)?;
    Ok(generate(&schema, &CodegenConfig::default())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ovsdb::schema::{AtomicType, BaseType, Column, ColumnType, Table};
    use pretty_assertions::assert_eq;

    const TEST_SCHEMA: &str = r#"{
  "name": "Open_vSwitch",
  "version": "8.3.0",
  "tables": {
    "Open_vSwitch": {
      "columns": {
        "bridges": {"type": {"key": {"type": "uuid", "refTable": "Bridge"}, "min": 0, "max": "unlimited"}},
        "ovs_version": {"type": {"key": "string", "min": 0, "max": 1}},
        "external_ids": {"type": {"key": "string", "value": "string", "min": 0, "max": "unlimited"}}
      },
      "isRoot": true,
      "maxRows": 1
    },
    "Bridge": {
      "columns": {
        "name": {"type": "string", "mutable": false},
        "ports": {"type": {"key": {"type": "uuid", "refTable": "Port"}, "min": 0, "max": "unlimited"}},
        "datapath_type": {"type": "string"},
        "stp_enable": {"type": "boolean"},
        "external_ids": {"type": {"key": "string", "value": "string", "min": 0, "max": "unlimited"}}
      },
      "isRoot": true,
      "indexes": [["name"]]
    },
    "Port": {
      "columns": {
        "name": {"type": "string", "mutable": false},
        "tag": {"type": {"key": {"type": "integer", "minInteger": 0, "maxInteger": 4095}, "min": 0, "max": 1}},
        "trunks": {"type": {"key": "integer", "min": 0, "max": 4096}},
        "interfaces": {"type": {"key": {"type": "uuid", "refTable": "Interface"}, "min": 1, "max": "unlimited"}},
        "qos": {"type": {"key": {"type": "uuid", "refTable": "QoS"}, "min": 0, "max": 1}}
      },
      "indexes": [["name"]]
    },
    "Interface": {
      "columns": {
        "name": {"type": "string", "mutable": false},
        "type": {"type": "string"},
        "ofport": {"type": {"key": "integer", "min": 0, "max": 1}},
        "options": {"type": {"key": "string", "value": "string", "min": 0, "max": "unlimited"}}
      },
      "indexes": [["name"]]
    },
    "QoS": {
      "columns": {
        "type": {"type": "string"},
        "queues": {"type": {"key": {"type": "integer", "minInteger": 0, "maxInteger": 4294967295},
                            "value": {"type": "uuid", "refTable": "Queue"},
                            "min": 0, "max": "unlimited"}}
      },
      "isRoot": true
    },
    "Queue": {
      "columns": {
        "dscp": {"type": {"key": {"type": "integer", "minInteger": 0, "maxInteger": 63}, "min": 0, "max": 1}},
        "other_config": {"type": {"key": "string", "value": "string", "min": 0, "max": "unlimited"}}
      },
      "isRoot": true
    }
  }
}"#;

    #[test]
    fn test_generate_from_schema_str_full() {
        let result = generate_from_schema_str(TEST_SCHEMA);
        assert!(result.is_ok(), "Generation failed: {:?}", result.err());

        let code = result.unwrap();

        // Verify it's valid Rust
        assert!(
            syn::parse_file(&code).is_ok(),
            "Generated code is not valid Rust:\n{}",
            &code[..code.len().min(2000)]
        );

        assert!(code.starts_with("// Generated from the Open_vSwitch schema, version 8.3.0."));
        assert!(code.contains("use ::ovsdb::types as ovsdb_rt;"));

        // Row and table types
        for name in ["Bridge", "Port", "Interface", "QoS", "Queue", "OpenVSwitch"] {
            assert!(code.contains(&format!("pub struct {name} {{")), "Missing {name}");
            assert!(code.contains(&format!("pub struct {name}Table(")), "Missing {name}Table");
        }

        // Schema name collides with the Open_vSwitch row type
        assert!(code.contains("pub struct OvsdbOpenVSwitch {"));
        assert!(code.contains("pub enum OvsdbOpenVSwitchRowRef<'a>"));

        // Index lookups
        assert!(code.contains("fn get_by_name("));
        assert!(code.contains("fn match_by_name("));
        assert!(code.contains("fn get_by_any_index("));

        // Referrer finders
        assert!(code.contains("fn find_bridge_referrer_bridges("));
        assert!(code.contains("fn find_port_referrer_ports("));
        assert!(code.contains("fn find_interface_referrer_interfaces("));
        assert!(code.contains("fn find_qos_referrer_qos("));
        assert!(code.contains("fn find_queue_value_referrer_queues("));

        // External ids only where the column exists
        assert!(code.contains("impl ovsdb_rt::ExternalIds for Bridge"));
        assert!(code.contains("impl ovsdb_rt::ExternalIds for OpenVSwitch"));
        assert!(!code.contains("impl ovsdb_rt::ExternalIds for Port"));
        assert!(!code.contains("impl ovsdb_rt::ExternalIds for Queue"));
    }

    #[test]
    fn test_column_shapes_in_generated_fields() {
        let code = generate_from_schema_str(TEST_SCHEMA).unwrap();
        assert!(code.contains("pub tag: ::std::option::Option<i64>"));
        assert!(code.contains("pub trunks: ::std::vec::Vec<i64>"));
        assert!(code.contains("pub interfaces: ::std::vec::Vec<::std::string::String>"));
        assert!(code.contains("pub r#type: ::std::string::String"));
        assert!(code.contains("pub stp_enable: bool"));
        assert!(code.contains(
            "pub queues: ::std::collections::BTreeMap<i64, ::std::string::String>"
        ));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let build = |order: &[&str]| {
            let mut schema = Schema::new("db");
            for name in order {
                let mut table = Table::new(*name);
                table.add_column(Column::new("zeta", ColumnType::atom(AtomicType::Integer)));
                table.add_column(Column::new("alpha", ColumnType::optional(AtomicType::String)));
                schema.add_table(table);
            }
            generate(&schema, &CodegenConfig::default()).unwrap()
        };
        let first = build(&["B", "A", "C"]);
        let second = build(&["C", "B", "A"]);
        assert_eq!(first, second);
        assert!(first.find("pub struct A {").unwrap() < first.find("pub struct B {").unwrap());
        assert!(first.find("pub alpha:").unwrap() < first.find("pub zeta:").unwrap());
    }

    #[test]
    fn test_custom_runtime_path() {
        let mut schema = Schema::new("db");
        schema.add_table(Table::new("Item"));
        let code = generate(&schema, &CodegenConfig::with_runtime_path("crate::rt")).unwrap();
        assert!(code.contains("use crate::rt::types as ovsdb_rt;"));

        let err = generate(&schema, &CodegenConfig::with_runtime_path("not a path")).unwrap_err();
        assert!(matches!(err, OvsdbError::Config(_)));
    }

    #[test]
    fn test_generation_errors() {
        // Unresolved reference
        let mut schema = Schema::new("db");
        let mut table = Table::new("Bridge");
        table.add_column(Column::new("ports", ColumnType::set(BaseType::reference("Port"))));
        schema.add_table(table);
        let err = generate(&schema, &CodegenConfig::default()).unwrap_err();
        assert!(matches!(err, OvsdbError::UnresolvedRef { .. }), "{err}");

        // Map keyed by real numbers has no runtime family
        let mut schema = Schema::new("db");
        let mut table = Table::new("Stats");
        table.add_column(Column::new(
            "by_load",
            ColumnType::map(BaseType::new(AtomicType::Real), BaseType::new(AtomicType::String)),
        ));
        schema.add_table(table);
        let err = generate(&schema, &CodegenConfig::default()).unwrap_err();
        assert!(matches!(err, OvsdbError::UnsupportedShape { .. }), "{err}");

        // No tables at all
        let err = generate(&Schema::new("db"), &CodegenConfig::default()).unwrap_err();
        assert!(matches!(err, OvsdbError::Schema(_)));

        // Malformed JSON
        assert!(generate_from_schema_str("{").is_err());
    }

    #[test]
    fn test_table_without_legal_type_name_fails() {
        let schema = r#"{
            "name": "db",
            "tables": {
                "Self": {"columns": {"x": {"type": "integer"}}, "isRoot": true}
            }
        }"#;
        let err = generate_from_schema_str(schema).unwrap_err();
        let err = err.downcast_ref::<OvsdbError>().unwrap();
        assert!(matches!(err, OvsdbError::Schema(_)), "{err}");
    }

    #[test]
    fn test_unparseable_tokens_are_an_error() {
        let tokens: proc_macro2::TokenStream = "pub struct Self {}".parse().unwrap();
        let err = generator::format_token_stream(&tokens).unwrap_err();
        assert!(matches!(err, OvsdbError::Schema(ref msg) if msg.contains("not valid Rust")));
    }

    #[test]
    fn test_generate_from_schema_file() {
        let dir = tempfile::tempdir().unwrap();
        let schema_path = dir.path().join("vswitch.ovsschema");
        let output_path = dir.path().join("generated.rs");
        std::fs::write(&schema_path, TEST_SCHEMA).unwrap();

        generate_from_schema(
            schema_path.to_str().unwrap(),
            output_path.to_str().unwrap(),
        )
        .unwrap();

        let code = std::fs::read_to_string(&output_path).unwrap();
        assert!(syn::parse_file(&code).is_ok());
        assert_eq!(code, generate_from_schema_str(TEST_SCHEMA).unwrap());
    }
}
