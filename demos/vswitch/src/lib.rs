//! Typed access to an Open vSwitch database.
//!
//! The row, table and database types are generated at build time from
//! `schema/vswitch.ovsschema`.

include!(concat!(env!("OUT_DIR"), "/vswitch.rs"));

use ovsdb::types::{Database, Value};
use ovsdb::{OvsdbError, Result};

/// Load rows keyed by table name then row uuid, the shape of an OVSDB
/// `monitor` reply:
///
/// ```json
/// {"Bridge": {"<uuid>": {"name": "br0", "ports": ["set", [["uuid", "<uuid>"]]]}}}
/// ```
///
/// Rows go through the dyn `Table`/`Row` interface, so any generated
/// database can be filled the same way.
pub fn load_rows<D: Database>(db: &mut D, dump: &Value) -> Result<usize> {
    let tables = dump
        .as_object()
        .ok_or_else(|| OvsdbError::Schema("row dump must be a JSON object".to_string()))?;

    let mut loaded = 0;
    for (table_name, rows) in tables {
        let table = db
            .table_mut(table_name)
            .ok_or_else(|| OvsdbError::Schema(format!("unknown table {table_name}")))?;
        let rows = rows.as_object().ok_or_else(|| {
            OvsdbError::Schema(format!("rows of table {table_name} must be a JSON object"))
        })?;

        for (uuid, columns) in rows {
            let mut row = table.new_row();
            row.set_column(ovsdb::schema::UUID_COLUMN, &Value::String(uuid.clone()))?;
            if let Some(columns) = columns.as_object() {
                for (column, value) in columns {
                    row.set_column(column, value)?;
                }
            }
            table.append_row(row);
            loaded += 1;
        }
        log::debug!("loaded {} rows into {table_name}", rows.len());
    }
    Ok(loaded)
}
