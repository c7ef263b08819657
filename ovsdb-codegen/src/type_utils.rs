use ovsdb::schema::{AtomicType, OperatorFamily, Shape};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

/// Alias under which generated code imports the runtime `types` module.
pub fn runtime() -> TokenStream {
    quote! { ovsdb_rt }
}

/// Rust type of a single atom. Standard types are fully qualified so that a
/// table named e.g. `String` cannot shadow them.
pub fn atomic_rust_type(atomic: AtomicType) -> TokenStream {
    match atomic {
        AtomicType::Integer => quote! { i64 },
        AtomicType::Real => quote! { f64 },
        AtomicType::Boolean => quote! { bool },
        AtomicType::String | AtomicType::Uuid => quote! { ::std::string::String },
    }
}

/// Field type of a column with the given operator family.
/// Must agree with the `Repr` of the runtime family.
pub fn column_rust_type(family: &OperatorFamily) -> TokenStream {
    let key = atomic_rust_type(family.key);
    match (family.shape, family.value) {
        (Shape::Map, Some(value)) => {
            let value = atomic_rust_type(value);
            quote! { ::std::collections::BTreeMap<#key, #value> }
        }
        (Shape::Multiples, _) | (Shape::Map, None) => quote! { ::std::vec::Vec<#key> },
        (Shape::Optional, _) => quote! { ::std::option::Option<#key> },
        (Shape::Atom, _) => key,
    }
}

/// Runtime marker type for an atom, e.g. `ovsdb_rt::StringAtom`.
fn atom_marker(atomic: AtomicType) -> TokenStream {
    let rt = runtime();
    let marker = format_ident!("{}", atomic.export_name());
    quote! { #rt::#marker }
}

/// The family type, e.g. `ovsdb_rt::Multiples<ovsdb_rt::UuidAtom>`.
pub fn family_type(family: &OperatorFamily) -> TokenStream {
    let rt = runtime();
    let shape = format_ident!("{}", family.shape.as_str());
    let key = atom_marker(family.key);
    match family.value {
        Some(value) => {
            let value = atom_marker(value);
            quote! { #rt::#shape<#key, #value> }
        }
        None => quote! { #rt::#shape<#key> },
    }
}

/// Fully qualified operator, e.g. `<ovsdb_rt::Atom<ovsdb_rt::StringAtom> as ovsdb_rt::Family>::matches`.
pub fn family_fn(family: &OperatorFamily, verb: &str) -> TokenStream {
    let rt = runtime();
    let ty = family_type(family);
    let verb = format_ident!("{}", verb);
    quote! { <#ty as #rt::Family>::#verb }
}

/// Whether serde should fill a missing field from `Default`.
pub fn has_serde_default(shape: Shape) -> bool {
    !matches!(shape, Shape::Atom)
}
