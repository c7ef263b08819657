use std::path::Path;

const SCHEMA: &str = "schema/vswitch.ovsschema";

fn main() {
    println!("cargo:rerun-if-changed={SCHEMA}");

    let out_dir = std::env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let output = Path::new(&out_dir).join("vswitch.rs");
    let output = output.to_str().expect("OUT_DIR is valid UTF-8");

    if let Err(e) = ovsdb_codegen::generate_from_schema(SCHEMA, output) {
        panic!("failed to generate code from {SCHEMA}: {e}");
    }
}
