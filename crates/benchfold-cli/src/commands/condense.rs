use crate::config::Config;
use crate::support::{
    EXIT_FAILING, exit_with, load_schema_or_exit, print_json, read_documents_or_exit,
    schema_file_or_exit, verdict_line,
};
use benchfold_history::{AtomicStoreMutationError, condense, mutate_summary_jsonl};
use benchfold_kernel::VerdictReport;
use benchfold_schema::{SchemaProvider, interpret_build};
use serde_json::json;
use std::convert::Infallible;

pub struct Args {
    pub schema: String,
    pub build: u32,
    pub summary: String,
    pub files: Vec<String>,
    pub json: bool,
}

pub fn run(config: &Config, args: Args) {
    let Args {
        schema,
        build,
        summary,
        files,
        json: json_output,
    } = args;
    let provider = schema_file_or_exit(config, &schema);
    let extra = provider.extra_thresholds();
    let schema = load_schema_or_exit(&provider, &schema);
    let documents = read_documents_or_exit(&files);
    let interpretation = interpret_build(&schema, &documents, build, config.interpret_options())
        .unwrap_or_else(|e| exit_with(format!("build {build}: {e}")));

    let (report, values): (VerdictReport, usize) = mutate_summary_jsonl(&summary, |current| {
        let condensation = condense(&interpretation.tree, current, &extra);
        let changed = condensation.summary != *current;
        *current = condensation.summary;
        Ok::<_, Infallible>(((condensation.report, current.len()), changed))
    })
    .unwrap_or_else(|e: AtomicStoreMutationError<Infallible>| exit_with(e));

    if json_output {
        print_json(&json!({
            "build": build,
            "summary": summary,
            "values": values,
            "report": report,
        }));
    } else {
        println!("benchfold condense --build {build}");
        println!("  Summary: {summary} ({values} values)");
        println!("  Verdicts: {}", report.verdicts.len());
        println!(
            "  Result: {}",
            if report.failed() { "FAILED" } else { "passed" }
        );
        for verdict in report.failing() {
            println!("    {}", verdict_line(verdict));
        }
    }

    if report.failed() {
        std::process::exit(EXIT_FAILING);
    }
}
