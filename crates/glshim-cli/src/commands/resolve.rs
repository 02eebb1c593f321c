use crate::support::{EXIT_REJECTED, fail, load_registry_or_exit, print_json};

pub fn run(name: String, tweaks: Option<String>, json_output: bool) {
    let (registry, tweaks_label) = load_registry_or_exit(tweaks.as_deref());
    let resolved = match registry.lookup(&name) {
        Some(Ok(resolved)) => resolved,
        Some(Err(err)) => fail(EXIT_REJECTED, err),
        None => fail(
            EXIT_REJECTED,
            format!("no descriptor for `{name}` in {tweaks_label}"),
        ),
    };

    if json_output {
        print_json(resolved.as_ref());
        return;
    }

    println!("glshim resolve {name}");
    println!("  Tweaks: {tweaks_label}");
    if !resolved.copied_from.is_empty() {
        println!("  Copied from: {}", resolved.copied_from.join(" -> "));
    }
    if !resolved.result.is_empty() {
        println!("  Result: {}", resolved.result);
    }
    if !resolved.params.is_empty() {
        println!("  Params:");
        for (param, tweak) in &resolved.params {
            let flags = serde_json::to_string(tweak).expect("json serialization");
            println!("    {param}: {flags}");
        }
    }
    for (label, text) in [
        ("Before", &resolved.before),
        ("After", &resolved.after),
        ("Doc", &resolved.doc),
    ] {
        if text.trim().is_empty() {
            continue;
        }
        println!("  {label}:");
        for line in glshim_kernel::dedent(text).lines() {
            println!("    {line}");
        }
    }
}
