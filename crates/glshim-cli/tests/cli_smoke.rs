use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "glshim-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path.join(name);
        fs::write(&path, contents).expect("fixture file should be written");
        path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run_glshim<I, S>(cwd: &Path, args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_glshim");
    Command::new(bin)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("glshim command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn assert_exit_code(output: &Output, code: i32) {
    assert_eq!(
        output.status.code(),
        Some(code),
        "\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr),
    );
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout should be valid json: {e}\nstdout:\n{}",
            stdout_text(output)
        )
    })
}

fn gl21_catalog() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../glshim-tweaks/tests/fixtures/gl21-catalog.json")
}

const SMALL_CATALOG: &str = r#"{
  "functions": [
    { "name": "GenBuffers", "params": [
      { "name": "n", "type": "int32" },
      { "name": "buffers", "type": "*uint32" } ] },
    { "name": "GetUniformfv", "params": [
      { "name": "program", "type": "uint32" },
      { "name": "location", "type": "int32" },
      { "name": "params", "type": "*float32" } ] },
    { "name": "GetUniformiv", "params": [
      { "name": "program", "type": "uint32" },
      { "name": "location", "type": "int32" },
      { "name": "params", "type": "*int32" } ] }
  ]
}"#;

const SMALL_TWEAKS: &str = r#"
[[function]]
name = "GenBuffers"
doc = "returns n buffer names. {{ funcSince(this, \"1.5+\") }}"

[function.params.buffers]
output = true
unnamed = true
retype = "sequence<Buffer>"

[[function]]
name = "GetUniformfv"
before = "let mut params_c: [{{ paramElemType(this, \"params\") }}; 4] = Default::default();"
doc = "call {{ this.name }} for each element."

[function.params.params]
replace = true

[[function]]
name = "GetUniformiv"
copy = "GetUniformfv"
"#;

const CYCLE_TWEAKS: &str = r#"
[[function]]
name = "GetUniformfv"
copy = "GetUniformiv"

[[function]]
name = "GetUniformiv"
copy = "GetUniformfv"
"#;

#[test]
fn generate_json_reports_accepted_wrappers() {
    let tmp = TempDirGuard::new("generate-json");
    let catalog = tmp.write("catalog.json", SMALL_CATALOG);
    let tweaks = tmp.write("tweaks.toml", SMALL_TWEAKS);

    let output = run_glshim(
        tmp.path(),
        [
            OsStr::new("generate"),
            OsStr::new("--catalog"),
            catalog.as_os_str(),
            OsStr::new("--tweaks"),
            tweaks.as_os_str(),
            OsStr::new("--json"),
        ],
    );
    assert_success(&output);

    let report = parse_json_stdout(&output);
    assert_eq!(report["reportKind"], "glshim.generation_report.v1");
    assert_eq!(report["result"], "accepted");
    assert!(
        report["digest"]
            .as_str()
            .is_some_and(|digest| digest.starts_with("gr1_"))
    );

    let functions = report["functions"].as_array().expect("functions array");
    assert_eq!(functions.len(), 3);
    let gen_buffers = &functions[0];
    assert_eq!(gen_buffers["name"], "GenBuffers");
    assert_eq!(
        gen_buffers["signature"]["results"][0]["type"],
        "sequence<Buffer>"
    );
    assert_eq!(
        gen_buffers["doc"],
        "returns n buffer names. GenBuffers is available in GL version 1.5 or greater."
    );

    let iv = &functions[2];
    assert_eq!(iv["name"], "GetUniformiv");
    assert_eq!(iv["copiedFrom"][0], "GetUniformfv");
    assert_eq!(iv["doc"], "call GetUniformiv for each element.");
    assert_eq!(
        iv["before"],
        "let mut params_c: [int32; 4] = Default::default();"
    );
}

#[test]
fn generate_text_lists_signatures() {
    let tmp = TempDirGuard::new("generate-text");
    let catalog = tmp.write("catalog.json", SMALL_CATALOG);
    let tweaks = tmp.write("tweaks.toml", SMALL_TWEAKS);

    let output = run_glshim(
        tmp.path(),
        [
            OsStr::new("generate"),
            OsStr::new("--catalog"),
            catalog.as_os_str(),
            OsStr::new("--tweaks"),
            tweaks.as_os_str(),
        ],
    );
    assert_success(&output);
    let text = stdout_text(&output);
    assert!(text.contains("GenBuffers(n int32) -> sequence<Buffer>"), "{text}");
    assert!(text.contains("Result: accepted"), "{text}");
}

#[test]
fn generate_with_builtin_table_accepts_sample_gl_catalog() {
    let tmp = TempDirGuard::new("generate-builtin");
    let catalog = gl21_catalog();

    let output = run_glshim(
        tmp.path(),
        [
            OsStr::new("generate"),
            OsStr::new("--catalog"),
            catalog.as_os_str(),
            OsStr::new("--json"),
        ],
    );
    assert_success(&output);
    let report = parse_json_stdout(&output);
    assert_eq!(report["result"], "accepted");
    assert!(report["issues"].as_array().is_some_and(Vec::is_empty));
}

#[test]
fn generate_function_filter_limits_output() {
    let tmp = TempDirGuard::new("generate-filter");
    let catalog = gl21_catalog();

    let output = run_glshim(
        tmp.path(),
        [
            OsStr::new("generate"),
            OsStr::new("--catalog"),
            catalog.as_os_str(),
            OsStr::new("--function"),
            OsStr::new("GenBuffers"),
            OsStr::new("--function"),
            OsStr::new("CreateShader"),
            OsStr::new("--json"),
        ],
    );
    assert_success(&output);
    let report = parse_json_stdout(&output);
    let names: Vec<&str> = report["functions"]
        .as_array()
        .expect("functions array")
        .iter()
        .filter_map(|function| function["name"].as_str())
        .collect();
    assert_eq!(names, vec!["CreateShader", "GenBuffers"]);
}

#[test]
fn generate_rejects_copy_cycles_with_exit_one() {
    let tmp = TempDirGuard::new("generate-cycle");
    let catalog = tmp.write("catalog.json", SMALL_CATALOG);
    let tweaks = tmp.write("tweaks.toml", CYCLE_TWEAKS);

    let output = run_glshim(
        tmp.path(),
        [
            OsStr::new("generate"),
            OsStr::new("--catalog"),
            catalog.as_os_str(),
            OsStr::new("--tweaks"),
            tweaks.as_os_str(),
            OsStr::new("--json"),
        ],
    );
    assert_exit_code(&output, 1);
    let report = parse_json_stdout(&output);
    assert_eq!(report["result"], "rejected");
    assert_eq!(report["failureClasses"][0], "config_copy_cycle");

    let issues = report["issues"].as_array().expect("issues array");
    assert_eq!(issues.len(), 2);
    assert_eq!(
        issues[0]["message"],
        "GetUniformfv: copy cycle GetUniformfv -> GetUniformiv -> GetUniformfv"
    );
    // The untouched function still generates.
    assert_eq!(report["functions"][0]["name"], "GenBuffers");
}

#[test]
fn missing_catalog_exits_two_with_error_prefix() {
    let tmp = TempDirGuard::new("missing-catalog");
    let output = run_glshim(
        tmp.path(),
        ["generate", "--catalog", "does-not-exist.json", "--json"],
    );
    assert_exit_code(&output, 2);
    assert!(stderr_text(&output).contains("error: failed to load catalog"));
    assert!(output.stdout.is_empty());
}

#[test]
fn malformed_tweak_table_exits_two() {
    let tmp = TempDirGuard::new("bad-tweaks");
    let catalog = tmp.write("catalog.json", SMALL_CATALOG);
    let tweaks = tmp.write("tweaks.toml", "[[function]]\nname = \"GenBuffers\"\nbogus = 1\n");

    let output = run_glshim(
        tmp.path(),
        [
            OsStr::new("check"),
            OsStr::new("--catalog"),
            catalog.as_os_str(),
            OsStr::new("--tweaks"),
            tweaks.as_os_str(),
        ],
    );
    assert_exit_code(&output, 2);
    assert!(stderr_text(&output).contains("error: invalid toml at"));
}

#[test]
fn config_file_sets_api_label_and_tweaks() {
    let tmp = TempDirGuard::new("config");
    let catalog = tmp.write("catalog.json", SMALL_CATALOG);
    tmp.write("tweaks.toml", SMALL_TWEAKS);
    tmp.write(
        "glshim.toml",
        "api_label = \"GLES\"\ntweaks = \"tweaks.toml\"\njobs = 2\n",
    );

    // Picked up from the working directory without --config.
    let output = run_glshim(
        tmp.path(),
        [
            OsStr::new("generate"),
            OsStr::new("--catalog"),
            catalog.as_os_str(),
            OsStr::new("--function"),
            OsStr::new("GenBuffers"),
            OsStr::new("--json"),
        ],
    );
    assert_success(&output);
    let report = parse_json_stdout(&output);
    assert_eq!(
        report["functions"][0]["doc"],
        "returns n buffer names. GenBuffers is available in GLES version 1.5 or greater."
    );
}

#[test]
fn jobs_flag_does_not_change_the_report() {
    let tmp = TempDirGuard::new("jobs");
    let catalog = gl21_catalog();
    let run = |jobs: &str| {
        let output = run_glshim(
            tmp.path(),
            [
                OsStr::new("generate"),
                OsStr::new("--catalog"),
                catalog.as_os_str(),
                OsStr::new("--jobs"),
                OsStr::new(jobs),
                OsStr::new("--json"),
            ],
        );
        assert_success(&output);
        parse_json_stdout(&output)
    };
    let single = run("1");
    let many = run("4");
    assert_eq!(single["digest"], many["digest"]);
    assert_eq!(single, many);
}

#[test]
fn check_json_reports_only_issues() {
    let tmp = TempDirGuard::new("check");
    let catalog = tmp.write("catalog.json", SMALL_CATALOG);
    let tweaks = tmp.write(
        "tweaks.toml",
        "[[function]]\nname = \"GenBuffers\"\n\n[function.params.count]\nomit = true\n",
    );

    let output = run_glshim(
        tmp.path(),
        [
            OsStr::new("check"),
            OsStr::new("--catalog"),
            catalog.as_os_str(),
            OsStr::new("--tweaks"),
            tweaks.as_os_str(),
            OsStr::new("--json"),
        ],
    );
    assert_exit_code(&output, 1);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["result"], "rejected");
    assert_eq!(payload["functionCount"], 3);
    assert!(payload.get("functions").is_none());
    assert_eq!(payload["issues"][0]["function"], "GenBuffers");
    assert_eq!(
        payload["issues"][0]["failureClass"],
        "config_unknown_parameter"
    );
}

#[test]
fn check_lists_every_bad_tweak_of_one_function() {
    let tmp = TempDirGuard::new("check-many");
    let catalog = tmp.write("catalog.json", SMALL_CATALOG);
    let tweaks = tmp.write(
        "tweaks.toml",
        "[[function]]\nname = \"GenBuffers\"\n\n\
         [function.params.count]\nomit = true\n\n\
         [function.params.buffers]\noutput = true\nomit = true\n",
    );

    let output = run_glshim(
        tmp.path(),
        [
            OsStr::new("check"),
            OsStr::new("--catalog"),
            catalog.as_os_str(),
            OsStr::new("--tweaks"),
            tweaks.as_os_str(),
            OsStr::new("--json"),
        ],
    );
    assert_exit_code(&output, 1);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["functionCount"], 3);
    let issues = payload["issues"].as_array().expect("issues array");
    assert_eq!(issues.len(), 2);
    assert!(issues.iter().all(|issue| issue["function"] == "GenBuffers"));
    assert_eq!(issues[0]["failureClass"], "config_conflicting_roles");
    assert_eq!(issues[1]["failureClass"], "config_unknown_parameter");
}

#[test]
fn resolve_prints_copy_merged_descriptor() {
    let tmp = TempDirGuard::new("resolve");
    let output = run_glshim(tmp.path(), ["resolve", "GetVertexAttribiv", "--json"]);
    assert_success(&output);
    let resolved = parse_json_stdout(&output);
    assert_eq!(resolved["name"], "GetVertexAttribiv");
    assert_eq!(resolved["copiedFrom"][0], "GetVertexAttribdv");
    assert_eq!(resolved["params"]["params"]["replace"], true);

    let output = run_glshim(tmp.path(), ["resolve", "GetVertexAttribiv"]);
    assert_success(&output);
    let text = stdout_text(&output);
    assert!(text.contains("Copied from: GetVertexAttribdv"), "{text}");
}

#[test]
fn resolve_unknown_function_fails() {
    let tmp = TempDirGuard::new("resolve-unknown");
    let output = run_glshim(tmp.path(), ["resolve", "NoSuchFunction"]);
    assert_exit_code(&output, 1);
    assert!(stderr_text(&output).contains("error: no descriptor for `NoSuchFunction`"));
}
