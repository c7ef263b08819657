use ovsdb::error::{OvsdbError, Result};
use ovsdb::schema::{
    AtomicType, OperatorFamily, Shape, Table, EXTERNAL_IDS_COLUMN, UUID_COLUMN,
};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::naming::{ident, TableNames};
use crate::type_utils::{column_rust_type, family_fn, has_serde_default, runtime};

/// A column with everything the generators need about it.
pub(crate) struct ResolvedColumn<'t> {
    pub name: &'t str,
    pub field: proc_macro2::Ident,
    pub family: OperatorFamily,
    pub read_only: bool,
}

/// Columns of `table` in name order, classified.
pub(crate) fn resolve_columns<'t>(
    table: &'t Table,
    names: &TableNames,
) -> Result<Vec<ResolvedColumn<'t>>> {
    table
        .ordered_columns()
        .into_iter()
        .map(|column| -> Result<ResolvedColumn<'t>> {
            Ok(ResolvedColumn {
                name: &column.name,
                field: ident(names.column(&column.name)?),
                family: column.family(table)?,
                read_only: column.is_read_only(),
            })
        })
        .collect()
}

/// `a && b && c`, or `true` for no terms.
pub(crate) fn all_of(terms: Vec<TokenStream>) -> TokenStream {
    terms
        .into_iter()
        .reduce(|a, b| quote! { #a && #b })
        .unwrap_or_else(|| quote! { true })
}

/// Generate the row struct, its inherent impl and its `Row` impl.
pub fn generate_row(table: &Table, names: &TableNames) -> Result<TokenStream> {
    let columns = resolve_columns(table, names)?;
    let row_ident = format_ident!("{}", names.row_type);

    let mut tokens = generate_row_struct(table, &row_ident, &columns);
    tokens.extend(generate_row_impl(table, names, &row_ident, &columns)?);
    tokens.extend(generate_row_trait_impl(table, &row_ident, &columns));
    Ok(tokens)
}

fn generate_row_struct(
    table: &Table,
    row_ident: &proc_macro2::Ident,
    columns: &[ResolvedColumn<'_>],
) -> TokenStream {
    let doc_comment = format!(" A row of the `{}` table.", table.name);

    let field_tokens: Vec<_> = columns
        .iter()
        .map(|column| {
            let field = &column.field;
            let ty = column_rust_type(&column.family);
            let original = column.name;
            let serde_attr = if has_serde_default(column.family.shape) {
                quote! { #[serde(rename = #original, default)] }
            } else {
                quote! { #[serde(rename = #original)] }
            };
            quote! {
                #serde_attr
                pub #field: #ty,
            }
        })
        .collect();

    quote! {
        #[doc = #doc_comment]
        #[derive(Debug, Clone, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        pub struct #row_ident {
            #(#field_tokens)*
        }
    }
}

fn generate_row_impl(
    table: &Table,
    names: &TableNames,
    row_ident: &proc_macro2::Ident,
    columns: &[ResolvedColumn<'_>],
) -> Result<TokenStream> {
    let table_name = &table.name;
    let is_root = table.is_root;
    let column_names: Vec<&str> = columns.iter().map(|c| c.name).collect();

    let non_zero_checks: Vec<_> = columns
        .iter()
        .map(|column| {
            let field = &column.field;
            let matches = family_fn(&column.family, "matches_if_non_zero");
            quote! { #matches(&self.#field, &probe.#field) }
        })
        .collect();
    let match_non_zeros = all_of(non_zero_checks);

    let mut index_matchers = Vec::new();
    for index in &names.indexes {
        let method = format_ident!("match_by_{}", index.suffix);
        let doc = format!(" Compare the `[{}]` index columns.", index.columns.join(", "));
        let mut checks = Vec::new();
        for column_name in &index.columns {
            let column = find_column(table, columns, column_name)?;
            let field = &column.field;
            let matches = family_fn(&column.family, "matches");
            checks.push(quote! { #matches(&self.#field, &probe.#field) });
        }
        let body = all_of(checks);
        index_matchers.push(quote! {
            #[doc = #doc]
            pub fn #method(&self, probe: &Self) -> bool {
                #body
            }
        });
    }

    let external_ids = external_ids_column(columns).map(|column| {
        let field = &column.field;
        let rt = runtime();
        quote! {
            impl #rt::ExternalIds for #row_ident {
                fn set_external_id(&mut self, key: &str, value: &str) {
                    self.#field.insert(key.to_string(), value.to_string());
                }

                fn get_external_id(&self, key: &str) -> ::std::option::Option<&str> {
                    self.#field.get(key).map(::std::string::String::as_str)
                }

                fn remove_external_id(&mut self, key: &str) -> ::std::option::Option<::std::string::String> {
                    self.#field.remove(key)
                }
            }
        }
    });

    Ok(quote! {
        impl #row_ident {
            pub const TABLE_NAME: &'static str = #table_name;
            pub const IS_ROOT: bool = #is_root;
            pub const COLUMNS: &'static [&'static str] = &[#(#column_names),*];

            /// True when every non-zero field of `probe` equals the same field of `self`.
            pub fn match_non_zeros(&self, probe: &Self) -> bool {
                #match_non_zeros
            }

            #(#index_matchers)*
        }

        #external_ids
    })
}

fn generate_row_trait_impl(
    table: &Table,
    row_ident: &proc_macro2::Ident,
    columns: &[ResolvedColumn<'_>],
) -> TokenStream {
    let rt = runtime();

    let uuid_body = match columns.iter().find(|c| c.name == UUID_COLUMN) {
        Some(column) if column.family.shape == Shape::Atom => {
            let field = &column.field;
            quote! { &self.#field }
        }
        _ => quote! { "" },
    };

    let cmd_args: Vec<_> = columns
        .iter()
        .filter(|column| !column.read_only)
        .map(|column| {
            let field = &column.field;
            let name = column.name;
            let cmd_args = family_fn(&column.family, "cmd_args");
            quote! { args.extend(#cmd_args(#name, &self.#field)); }
        })
        .collect();
    let cmd_args_body = if cmd_args.is_empty() {
        quote! { ::std::vec::Vec::new() }
    } else {
        quote! {
            let mut args = ::std::vec::Vec::new();
            #(#cmd_args)*
            args
        }
    };

    let set_arms: Vec<_> = columns
        .iter()
        .map(|column| {
            let field = &column.field;
            let name = column.name;
            let ensure = family_fn(&column.family, "ensure");
            quote! {
                #name => {
                    self.#field = #ensure(val).map_err(|e| #rt::column_error(name, val, e))?;
                }
            }
        })
        .collect();

    let external_ids = external_ids_column(columns).map(|_| {
        quote! {
            fn external_ids(&self) -> ::std::option::Option<&dyn #rt::ExternalIds> {
                ::std::option::Option::Some(self)
            }

            fn external_ids_mut(&mut self) -> ::std::option::Option<&mut dyn #rt::ExternalIds> {
                ::std::option::Option::Some(self)
            }
        }
    });

    if external_ids.is_none() && table.has_external_ids() {
        log::warn!(
            "table {}: {} is not a string to string map, external-id helpers disabled",
            table.name,
            EXTERNAL_IDS_COLUMN
        );
    }

    quote! {
        impl #rt::Row for #row_ident {
            fn table_name(&self) -> &'static str {
                Self::TABLE_NAME
            }

            fn is_root(&self) -> bool {
                Self::IS_ROOT
            }

            fn uuid(&self) -> &str {
                #uuid_body
            }

            fn cmd_args(&self) -> ::std::vec::Vec<::std::string::String> {
                #cmd_args_body
            }

            fn set_column(&mut self, name: &str, val: &#rt::Value) -> #rt::Result<()> {
                match name {
                    #(#set_arms)*
                    _ => return ::std::result::Result::Err(#rt::OvsdbError::UnknownColumn(name.to_string())),
                }
                ::std::result::Result::Ok(())
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }

            #external_ids
        }
    }
}

/// The `external_ids` column, when it has the string to string map shape the
/// helpers are written against.
fn external_ids_column<'a, 't>(columns: &'a [ResolvedColumn<'t>]) -> Option<&'a ResolvedColumn<'t>> {
    columns.iter().find(|column| {
        column.name == EXTERNAL_IDS_COLUMN
            && column.family
                == OperatorFamily {
                    shape: Shape::Map,
                    key: AtomicType::String,
                    value: Some(AtomicType::String),
                }
    })
}

pub(crate) fn find_column<'a, 't>(
    table: &Table,
    columns: &'a [ResolvedColumn<'t>],
    name: &str,
) -> Result<&'a ResolvedColumn<'t>> {
    columns
        .iter()
        .find(|column| column.name == name)
        .ok_or_else(|| OvsdbError::IndexColumn {
            table: table.name.clone(),
            column: name.to_string(),
        })
}
