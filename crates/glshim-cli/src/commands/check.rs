use crate::commands::generate::print_summary;
use crate::support::{EXIT_REJECTED, generator_or_exit, print_json, with_jobs_or_exit};
use serde_json::json;

pub fn run(catalog: String, tweaks: Option<String>, config: Option<String>, json_output: bool) {
    let (generator, config, sources) = generator_or_exit(&catalog, tweaks, config.as_deref());
    let report = with_jobs_or_exit(config.jobs, || generator.generate_all());

    if json_output {
        let payload = json!({
            "reportKind": report.report_kind,
            "result": report.result,
            "functionCount": report.functions.len() + report.failed_functions().len(),
            "failureClasses": report.failure_classes,
            "issues": report.issues,
            "sources": sources,
        });
        print_json(&payload);
    } else {
        println!("glshim check");
        println!("  Catalog: {}", sources.catalog);
        println!("  Tweaks: {}", sources.tweaks);
        println!(
            "  Functions: {} ok, {} failed",
            report.functions.len(),
            report.failed_functions().len()
        );
        print_summary(&report);
    }

    if !report.is_accepted() {
        std::process::exit(EXIT_REJECTED);
    }
}
