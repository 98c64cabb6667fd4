use crate::support::{fmt_opt, load_summary_or_exit, print_json};
use benchfold_history::export;

pub fn run(summary: String, json_output: bool) {
    let records = export(&load_summary_or_exit(&summary));

    if json_output {
        print_json(&records);
        return;
    }

    println!("benchfold show {summary}");
    println!("  Values: {}", records.len());
    for record in &records {
        let unit = record
            .unit
            .as_deref()
            .map(|u| format!(" [{u}]"))
            .unwrap_or_default();
        println!("    {}{unit}", record.path);
        println!(
            "      passed {} failed {} last build {}",
            record.passed,
            record.failed,
            record
                .last_build
                .map_or_else(|| "-".to_string(), |b| b.to_string())
        );
        if record.kind.is_numeric() {
            println!(
                "      previous {} min {} max {} avg {} sd {}",
                fmt_opt(record.previous),
                fmt_opt(record.minimum),
                fmt_opt(record.maximum),
                fmt_opt(record.average),
                fmt_opt(record.std_deviation)
            );
        }
    }
}
