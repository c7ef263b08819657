use ovsdb::error::{OvsdbError, Result};
use ovsdb::schema::Schema;
use ovsdb::validation::validate_schema;
use proc_macro2::TokenStream;
use quote::quote;

use crate::database_gen::generate_database;
use crate::naming::SchemaNames;
use crate::row_gen::generate_row;
use crate::table_gen::generate_table;

/// Generate the complete data-access module for `schema`.
///
/// `runtime_path` is the path under which the `ovsdb` runtime crate is
/// reachable from the generated code (normally `::ovsdb`).
pub fn generate_all(schema: &Schema, runtime_path: &syn::Path) -> Result<TokenStream> {
    if schema.tables.is_empty() {
        return Err(OvsdbError::Schema(format!(
            "schema {} declares no tables",
            schema.name
        )));
    }
    validate_schema(schema)?;
    let names = SchemaNames::resolve(schema)?;

    let mut items = Vec::new();
    for table in schema.ordered_tables() {
        let table_names = names.table(&table.name)?;
        log::debug!(
            "generating {} / {} for table {}",
            table_names.row_type,
            table_names.table_type,
            table.name
        );
        items.push(generate_row(table, table_names)?);
        items.push(generate_table(table, table_names)?);
    }
    items.push(generate_database(schema, &names)?);

    Ok(quote! {
        #[allow(unused_imports)]
        use #runtime_path::types as ovsdb_rt;

        #(#items)*
    })
}

/// Format a token stream as pretty-printed Rust source code. Fails when the
/// tokens are not a valid Rust file.
pub fn format_token_stream(tokens: &TokenStream) -> Result<String> {
    let file = syn::parse2::<syn::File>(tokens.clone()).map_err(|e| {
        log::error!("generated code does not parse: {e}");
        OvsdbError::Schema(format!("generated code is not valid Rust: {e}"))
    })?;
    Ok(prettyplease::unparse(&file))
}

/// Leading comment of a generated file.
pub fn file_header(schema: &Schema) -> String {
    match &schema.version {
        Some(version) => format!(
            "// Generated from the {} schema, version {version}. Do not edit.\n\n",
            schema.name
        ),
        None => format!("// Generated from the {} schema. Do not edit.\n\n", schema.name),
    }
}
