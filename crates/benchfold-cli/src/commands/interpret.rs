use crate::config::Config;
use crate::support::{exit_with, load_schema_or_exit, print_json, read_documents_or_exit};
use benchfold_schema::{SchemaFile, interpret_build};
use serde_json::json;

pub fn run(config: &Config, schema: String, build: u32, files: Vec<String>, json_output: bool) {
    let schema = load_schema_or_exit(&SchemaFile::new(&schema), &schema);
    let documents = read_documents_or_exit(&files);
    let interpretation = interpret_build(&schema, &documents, build, config.interpret_options())
        .unwrap_or_else(|e| exit_with(format!("build {build}: {e}")));
    let tree = &interpretation.tree;
    let skipped: Vec<String> = interpretation.errors.iter().map(ToString::to_string).collect();

    if json_output {
        print_json(&json!({
            "build": build,
            "documents": documents.len(),
            "skipped": skipped,
            "tree": tree,
        }));
        return;
    }

    println!("benchfold interpret --build {build}");
    println!("  Documents: {} ({} skipped)", documents.len(), skipped.len());
    println!("  Values: {}", tree.values().count());
    for (_, node, value) in tree.values() {
        for (sample_build, literal) in &value.samples {
            let unit = value
                .unit
                .as_deref()
                .map(|u| format!(" {u}"))
                .unwrap_or_default();
            let failed = if value.failed_at(*sample_build) {
                "  FAILED"
            } else {
                ""
            };
            println!("    {} = {literal}{unit}{failed}", node.path);
        }
    }
    for error in &skipped {
        println!("  Skipped: {error}");
    }
}
