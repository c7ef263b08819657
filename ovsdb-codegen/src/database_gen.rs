use ovsdb::error::Result;
use ovsdb::schema::Schema;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::naming::{ident, SchemaNames};
use crate::type_utils::runtime;

/// Generate the database struct holding one table per schema table, the
/// row-reference union and the `Database` impl.
pub fn generate_database(schema: &Schema, names: &SchemaNames) -> Result<TokenStream> {
    let rt = runtime();
    let db_ident = format_ident!("{}", names.db_type);
    let row_ref_ident = format_ident!("{}", names.row_ref_type);

    let mut fields = Vec::new();
    let mut variants = Vec::new();
    let mut variant_names = Vec::new();
    let mut from_impls = Vec::new();
    let mut from_row_attempts = Vec::new();
    let mut non_zero_arms = Vec::new();
    let mut any_index_arms = Vec::new();
    let mut table_refs = Vec::new();
    let mut table_arms = Vec::new();
    let mut table_mut_arms = Vec::new();

    // Sort tables for deterministic output
    for table_name in schema.ordered_table_names() {
        let table = names.table(table_name)?;
        let field = ident(&table.field);
        let row_ident = format_ident!("{}", table.row_type);
        let table_ident = format_ident!("{}", table.table_type);

        fields.push(quote! {
            #[serde(rename = #table_name, default)]
            pub #field: #table_ident,
        });
        variants.push(quote! { #row_ident(&'a #row_ident), });
        variant_names.push(quote! { Self::#row_ident(_) => #row_ident::TABLE_NAME, });
        from_impls.push(quote! {
            impl<'a> ::std::convert::From<&'a #row_ident> for #row_ref_ident<'a> {
                fn from(row: &'a #row_ident) -> Self {
                    Self::#row_ident(row)
                }
            }
        });
        from_row_attempts.push(quote! {
            if let ::std::option::Option::Some(row) = #rt::row_ref::<#row_ident>(row) {
                return ::std::option::Option::Some(Self::#row_ident(row));
            }
        });
        non_zero_arms.push(quote! {
            #row_ref_ident::#row_ident(probe) => self
                .#field
                .find_one_match_non_zeros(probe)
                .map(#row_ref_ident::#row_ident),
        });
        any_index_arms.push(quote! {
            #row_ref_ident::#row_ident(probe) => self
                .#field
                .get_by_any_index(probe)
                .map(#row_ref_ident::#row_ident),
        });
        table_refs.push(quote! { &self.#field as &dyn #rt::Table });
        table_arms.push(quote! {
            #table_name => ::std::option::Option::Some(&self.#field as &dyn #rt::Table),
        });
        table_mut_arms.push(quote! {
            #table_name => ::std::option::Option::Some(&mut self.#field as &mut dyn #rt::Table),
        });
    }

    let as_row_arms: Vec<_> = schema
        .ordered_table_names()
        .into_iter()
        .map(|table_name| -> Result<TokenStream> {
            let row_ident = format_ident!("{}", names.table(table_name)?.row_type);
            Ok(quote! { Self::#row_ident(row) => row as &'a dyn #rt::Row, })
        })
        .collect::<Result<_>>()?;

    let db_doc = format!(" Tables of the `{}` database.", schema.name);
    let row_ref_doc = format!(" A borrowed row of any table of the `{}` database.", schema.name);

    Ok(quote! {
        #[doc = #db_doc]
        #[derive(Debug, Clone, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        pub struct #db_ident {
            #(#fields)*
        }

        #[doc = #row_ref_doc]
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub enum #row_ref_ident<'a> {
            #(#variants)*
        }

        impl<'a> #row_ref_ident<'a> {
            pub fn table_name(&self) -> &'static str {
                match self {
                    #(#variant_names)*
                }
            }

            pub fn as_row(&self) -> &'a dyn #rt::Row {
                match *self {
                    #(#as_row_arms)*
                }
            }

            /// Recover the union from a dyn row; `None` when no table of this
            /// database owns the row's type.
            pub fn from_row(row: &'a dyn #rt::Row) -> ::std::option::Option<Self> {
                #(#from_row_attempts)*
                ::std::option::Option::None
            }
        }

        #(#from_impls)*

        impl #db_ident {
            pub fn new() -> Self {
                Self::default()
            }

            /// First row of the probe's table matching every non-zero field of the probe.
            pub fn find_one_match_non_zeros(&self, row: #row_ref_ident<'_>) -> ::std::option::Option<#row_ref_ident<'_>> {
                match row {
                    #(#non_zero_arms)*
                }
            }

            /// First row of the probe's table found through any of that table's indexes.
            pub fn find_one_match_by_any_index(&self, row: #row_ref_ident<'_>) -> ::std::option::Option<#row_ref_ident<'_>> {
                match row {
                    #(#any_index_arms)*
                }
            }
        }

        impl #rt::Database for #db_ident {
            fn tables(&self) -> ::std::vec::Vec<&dyn #rt::Table> {
                ::std::vec![#(#table_refs),*]
            }

            fn table(&self, name: &str) -> ::std::option::Option<&dyn #rt::Table> {
                match name {
                    #(#table_arms)*
                    _ => ::std::option::Option::None,
                }
            }

            fn table_mut(&mut self, name: &str) -> ::std::option::Option<&mut dyn #rt::Table> {
                match name {
                    #(#table_mut_arms)*
                    _ => ::std::option::Option::None,
                }
            }

            fn find_row_match_non_zeros(&self, row: &dyn #rt::Row) -> ::std::option::Option<&dyn #rt::Row> {
                let probe = #row_ref_ident::from_row(row).unwrap_or_else(|| #rt::bad_type(row.table_name()));
                self.find_one_match_non_zeros(probe).map(|found| found.as_row())
            }

            fn find_row_match_by_any_index(&self, row: &dyn #rt::Row) -> ::std::option::Option<&dyn #rt::Row> {
                let probe = #row_ref_ident::from_row(row).unwrap_or_else(|| #rt::bad_type(row.table_name()));
                self.find_one_match_by_any_index(probe).map(|found| found.as_row())
            }
        }
    })
}
