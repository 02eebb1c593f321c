use crate::support::{EXIT_REJECTED, generator_or_exit, print_json, with_jobs_or_exit};
use glshim_kernel::GenerationReport;

pub struct Args {
    pub catalog: String,
    pub tweaks: Option<String>,
    pub config: Option<String>,
    pub functions: Vec<String>,
    pub jobs: Option<usize>,
    pub json: bool,
}

pub fn run(args: Args) {
    let (generator, config, sources) =
        generator_or_exit(&args.catalog, args.tweaks, args.config.as_deref());
    let jobs = args.jobs.or(config.jobs);

    let report = with_jobs_or_exit(jobs, || {
        if args.functions.is_empty() {
            generator.generate_all()
        } else {
            generator.generate_selected(&args.functions)
        }
    });

    if args.json {
        print_json(&report);
    } else {
        println!("glshim generate");
        println!("  Catalog: {}", sources.catalog);
        println!("  Tweaks: {}", sources.tweaks);
        if let Some(config) = &sources.config {
            println!("  Config: {config}");
        }
        println!("  Generated: {}", report.functions.len());
        for function in &report.functions {
            println!("    {}{}", function.name, function.signature.render());
        }
        print_summary(&report);
    }

    if !report.is_accepted() {
        std::process::exit(EXIT_REJECTED);
    }
}

pub fn print_summary(report: &GenerationReport) {
    println!("  Result: {}", report.result);
    println!("  Digest: {}", report.digest);
    if !report.issues.is_empty() {
        println!("  Issues ({}):", report.issues.len());
        for issue in &report.issues {
            println!("    - [{}] {}", issue.failure_class, issue.message);
        }
    }
}
