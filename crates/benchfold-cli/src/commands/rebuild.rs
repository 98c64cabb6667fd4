use crate::config::Config;
use crate::support::{exit_with, print_json};
use benchfold_history::{export, rebuild, save_summary};
use benchfold_schema::{DirectoryProvider, SchemaFile};
use serde_json::json;

pub struct Args {
    pub schema: String,
    pub history: String,
    pub summary: String,
    pub workers: Option<usize>,
    pub budget_secs: Option<u64>,
    pub json: bool,
}

pub fn run(config: &Config, args: Args) {
    let options = config.rebuild_options(args.workers, args.budget_secs);
    let content = DirectoryProvider::new(&args.history);
    let schema = SchemaFile::new(&args.schema);

    let rebuilt = rebuild(&content, &schema, &options)
        .unwrap_or_else(|e| exit_with(format!("rebuild from {}: {e}", args.history)));
    save_summary(&args.summary, &rebuilt.summary)
        .unwrap_or_else(|e| exit_with(format!("failed to save {}: {e}", args.summary)));

    if args.json {
        print_json(&json!({
            "history": args.history,
            "summary": args.summary,
            "builds": rebuilt.builds,
            "workers": rebuilt.workers,
            "values": export(&rebuilt.summary).len(),
        }));
    } else {
        println!("benchfold rebuild {}", args.history);
        println!("  Builds: {}", rebuilt.builds);
        println!("  Workers: {}", rebuilt.workers);
        println!("  Values: {}", rebuilt.summary.len());
        println!("  Summary: {}", args.summary);
    }
}
