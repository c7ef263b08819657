use ovsdb::error::Result;
use ovsdb::schema::{Shape, Table};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::naming::{ReferrerNames, TableNames};
use crate::row_gen::{find_column, resolve_columns, ResolvedColumn};
use crate::type_utils::{family_fn, runtime};

/// Generate the table aggregate for one table: the newtype over its rows,
/// lookups, referrer finders and the `Table` impl.
pub fn generate_table(table: &Table, names: &TableNames) -> Result<TokenStream> {
    let columns = resolve_columns(table, names)?;
    let row_ident = format_ident!("{}", names.row_type);
    let table_ident = format_ident!("{}", names.table_type);
    let doc_comment = format!(" Rows of the `{}` table, in insertion order.", table.name);

    let get_by_index: Vec<_> = names
        .indexes
        .iter()
        .map(|index| {
            let getter = format_ident!("get_by_{}", index.suffix);
            let matcher = format_ident!("match_by_{}", index.suffix);
            quote! {
                pub fn #getter(&self, probe: &#row_ident) -> ::std::option::Option<&#row_ident> {
                    self.0.iter().find(|row| row.#matcher(probe))
                }
            }
        })
        .collect();

    let any_index = generate_any_index(table, names, &row_ident, &columns)?;

    let referrers = names
        .referrers
        .iter()
        .map(|referrer| generate_referrer(table, referrer, &row_ident, &columns))
        .collect::<Result<Vec<_>>>()?;

    let table_trait = generate_table_trait_impl(&row_ident, &table_ident, table.has_index());

    Ok(quote! {
        #[doc = #doc_comment]
        #[derive(Debug, Clone, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(transparent)]
        pub struct #table_ident(pub ::std::vec::Vec<#row_ident>);

        impl #table_ident {
            pub fn new() -> Self {
                Self::default()
            }

            pub fn push(&mut self, row: #row_ident) {
                self.0.push(row);
            }

            pub fn iter(&self) -> ::std::slice::Iter<'_, #row_ident> {
                self.0.iter()
            }

            /// First row matching every non-zero field of `probe`.
            pub fn find_one_match_non_zeros(&self, probe: &#row_ident) -> ::std::option::Option<&#row_ident> {
                self.0.iter().find(|row| row.match_non_zeros(probe))
            }

            #(#get_by_index)*

            #any_index

            #(#referrers)*
        }

        #table_trait
    })
}

/// `get_by_any_index`: try each index in declaration order, skipping those
/// with a zero-valued key column in the probe.
fn generate_any_index(
    table: &Table,
    names: &TableNames,
    row_ident: &proc_macro2::Ident,
    columns: &[ResolvedColumn<'_>],
) -> Result<TokenStream> {
    if names.indexes.is_empty() {
        return Ok(quote! {
            pub fn get_by_any_index(&self, _probe: &#row_ident) -> ::std::option::Option<&#row_ident> {
                ::std::option::Option::None
            }
        });
    }

    let mut attempts = Vec::new();
    for index in &names.indexes {
        let getter = format_ident!("get_by_{}", index.suffix);
        let mut zero_checks = Vec::new();
        for column_name in &index.columns {
            let column = find_column(table, columns, column_name)?;
            let field = &column.field;
            let is_zero = family_fn(&column.family, "is_zero");
            zero_checks.push(quote! { #is_zero(&probe.#field) });
        }
        let any_zero = zero_checks
            .into_iter()
            .reduce(|a, b| quote! { #a || #b })
            .unwrap_or_else(|| quote! { false });
        attempts.push(quote! {
            if !(#any_zero) {
                if let ::std::option::Option::Some(row) = self.#getter(probe) {
                    return ::std::option::Option::Some(row);
                }
            }
        });
    }

    Ok(quote! {
        /// First row found through any index whose key columns are all set in `probe`.
        pub fn get_by_any_index(&self, probe: &#row_ident) -> ::std::option::Option<&#row_ident> {
            #(#attempts)*
            ::std::option::Option::None
        }
    })
}

fn generate_referrer(
    table: &Table,
    referrer: &ReferrerNames,
    row_ident: &proc_macro2::Ident,
    columns: &[ResolvedColumn<'_>],
) -> Result<TokenStream> {
    let column = find_column(table, columns, &referrer.column)?;
    let field = &column.field;
    let method = format_ident!("{}", referrer.method);
    let doc = if referrer.by_value {
        format!(
            " Rows whose `{}` map values reference the given `{}` row.",
            referrer.column, referrer.ref_table
        )
    } else {
        format!(
            " Rows whose `{}` column references the given `{}` row.",
            referrer.column, referrer.ref_table
        )
    };

    let scan = match column.family.shape {
        Shape::Atom => quote! {
            if row.#field == ref_uuid {
                found.push(row);
            }
        },
        Shape::Optional => quote! {
            if row.#field.as_deref() == ::std::option::Option::Some(ref_uuid) {
                found.push(row);
            }
        },
        Shape::Multiples => quote! {
            for item in &row.#field {
                if item == ref_uuid {
                    found.push(row);
                }
            }
        },
        Shape::Map => {
            let items = if referrer.by_value {
                quote! { values() }
            } else {
                quote! { keys() }
            };
            quote! {
                for item in row.#field.#items {
                    if item == ref_uuid {
                        found.push(row);
                    }
                }
            }
        }
    };

    Ok(quote! {
        #[doc = #doc]
        pub fn #method(&self, ref_uuid: &str) -> ::std::vec::Vec<&#row_ident> {
            let mut found = ::std::vec::Vec::new();
            for row in &self.0 {
                #scan
            }
            found
        }
    })
}

fn generate_table_trait_impl(
    row_ident: &proc_macro2::Ident,
    table_ident: &proc_macro2::Ident,
    has_index: bool,
) -> TokenStream {
    let rt = runtime();
    quote! {
        impl #rt::Table for #table_ident {
            fn table_name(&self) -> &'static str {
                #row_ident::TABLE_NAME
            }

            fn is_root(&self) -> bool {
                #row_ident::IS_ROOT
            }

            fn rows(&self) -> ::std::vec::Vec<&dyn #rt::Row> {
                self.0.iter().map(|row| row as &dyn #rt::Row).collect()
            }

            fn new_row(&self) -> ::std::boxed::Box<dyn #rt::Row> {
                ::std::boxed::Box::new(#row_ident::default())
            }

            fn append_row(&mut self, row: ::std::boxed::Box<dyn #rt::Row>) {
                self.0.push(#rt::downcast_row::<#row_ident>(row));
            }

            fn has_index(&self) -> bool {
                #has_index
            }

            fn len(&self) -> usize {
                self.0.len()
            }

            fn get_row_by_any_index(&self, row: &dyn #rt::Row) -> ::std::option::Option<&dyn #rt::Row> {
                let probe = #rt::row_ref::<#row_ident>(row).unwrap_or_else(|| #rt::bad_type(row.table_name()));
                self.get_by_any_index(probe).map(|found| found as &dyn #rt::Row)
            }

            fn find_row_match_non_zeros(&self, row: &dyn #rt::Row) -> ::std::option::Option<&dyn #rt::Row> {
                let probe = #rt::row_ref::<#row_ident>(row).unwrap_or_else(|| #rt::bad_type(row.table_name()));
                self.find_one_match_non_zeros(probe).map(|found| found as &dyn #rt::Row)
            }
        }
    }
}
