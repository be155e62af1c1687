//! Build command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

fn hash_line(stdout: &[u8]) -> String {
  String::from_utf8_lossy(stdout)
    .lines()
    .find(|l| l.trim_start().starts_with("Hash:"))
    .map(|l| l.trim().to_string())
    .unwrap_or_else(|| panic!("no hash line in output"))
}

#[test]
fn build_plain_project_with_defaults() {
  let env = TestEnv::script_project();

  env
    .compkit_cmd("build")
    .assert()
    .success()
    .stdout(predicate::str::contains("Build complete!"))
    .stdout(predicate::str::contains("compileScript"))
    .stdout(predicate::str::contains("copyOthers"))
    .stdout(predicate::str::contains("Hash:"));

  assert_eq!(env.read("lib/index.js"), env.read("src/index.jsx"));
  assert_eq!(env.read("lib/index.css"), ".container { display: flex; }\n");
  assert_eq!(env.read("lib/assets/logo.svg"), "<svg/>\n");
  assert!(!env.path("lib/__tests__").exists());
  assert!(!env.path("lib/index.jsx").exists());
}

#[test]
fn build_twice_reports_the_same_hash() {
  let env = TestEnv::script_project();

  let first = env.compkit_cmd("build").output().unwrap();
  let second = env.compkit_cmd("build").output().unwrap();

  assert!(first.status.success());
  assert!(second.status.success());
  assert_eq!(hash_line(&first.stdout), hash_line(&second.stdout));
}

#[test]
fn build_into_custom_output_dir() {
  let env = TestEnv::script_project();

  env.compkit_cmd("build").args(["-o", "dist"]).assert().success();

  assert!(env.path("dist/index.js").exists());
  assert!(!env.path("lib").exists());
}

#[test]
fn output_dir_overlapping_sources_is_rejected() {
  let env = TestEnv::script_project();

  for output_dir in [".", "src", "src/dist"] {
    env
      .compkit_cmd("build")
      .args(["--output-dir", output_dir])
      .assert()
      .failure()
      .stderr(predicate::str::contains("overlaps source directory"));
  }

  assert!(env.path("src/index.jsx").exists());
  assert!(env.path("src/assets/logo.svg").exists());
}

#[test]
fn unknown_target_is_rejected() {
  let env = TestEnv::script_project();

  env
    .compkit_cmd("build")
    .args(["-t", "desktop"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("unknown target: desktop"));

  assert!(!env.path("lib").exists());
}

#[test]
fn invalid_config_fails() {
  let env = TestEnv::script_project();
  env.write_file("compkit.json", "{ \"outputDir\": 42 }");

  env
    .compkit_cmd("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load project config"));
}

#[test]
fn miniapp_without_compiler_fails() {
  let env = TestEnv::script_project();

  env
    .compkit_cmd("build")
    .args(["--target", "miniapp"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("no miniapp compiler is configured"));

  assert!(!env.path("lib").exists());
}

#[test]
fn typed_project_without_typed_compiler_fails() {
  let env = TestEnv::script_project();
  env.write_file("tsconfig.json", "{}");
  env.write_file("src/title.ts", "export const title: string = 'x';\n");

  env
    .compkit_cmd("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("no step registered for compileTyped"))
    .stderr(predicate::str::contains("add a \"typed\" block"));
}

#[cfg(unix)]
mod with_commands {
  use super::*;

  #[test]
  fn script_command_transforms_sources() {
    let env = TestEnv::script_project();
    env.write_file(
      "compkit.json",
      r#"{ "script": { "program": "tr", "args": ["a-z", "A-Z"] } }"#,
    );

    env.compkit_cmd("build").assert().success();

    assert_eq!(
      env.read("lib/index.js"),
      "EXPORT DEFAULT FUNCTION INDEX() { RETURN NULL; }\n"
    );
    assert_eq!(env.read("lib/index.css"), ".container { display: flex; }\n");
  }

  #[test]
  fn typed_miniapp_build_runs_compiler_on_intermediate_entry() {
    let env = TestEnv::empty();
    env.write_file("tsconfig.json", "{}");
    env.write_file("src/index.tsx", "export const title: string = 'x';\n");
    env.write_file("src/index.css", ".title {}\n");
    env.write_file(
      "compkit.json",
      r#"{
        "targets": ["web", "miniapp"],
        "typed": {
          "emit": { "program": "sed", "args": ["s/: string//"] },
          "declaration": { "program": "sh", "args": ["-c", "echo 'export declare const title: string;'"] }
        },
        "miniapp": {
          "command": {
            "program": "sh",
            "args": ["-c", "test -f \"$0.js\" && mkdir -p \"$1\" && echo \"$0\" > \"$1/entry.txt\"", "{entry}", "{dist}"]
          }
        }
      }"#,
    );

    env.compkit_cmd("build").assert().success();

    assert_eq!(env.read("lib/index.js"), "export const title = 'x';\n");
    assert_eq!(env.read("lib/index.d.ts"), "export declare const title: string;\n");
    assert_eq!(env.read("lib/index.css"), ".title {}\n");
    assert_eq!(env.read("lib/miniapp/entry.txt"), "lib/miniappTemp/index\n");
    assert!(!env.path("lib/miniappTemp").exists());
  }

  #[test]
  fn miniapp_compiler_failure_exits_non_zero() {
    let env = TestEnv::script_project();
    env.write_file(
      "compkit.json",
      r#"{
        "targets": ["miniapp"],
        "miniapp": { "command": { "program": "sh", "args": ["-c", "echo 'Unexpected token' >&2; exit 3"] } }
      }"#,
    );

    env
      .compkit_cmd("build")
      .assert()
      .failure()
      .stdout(predicate::str::contains("compileScript"))
      .stderr(predicate::str::contains("Miniapp compiler failed: Unexpected token"));

    // Primary output is left in place.
    assert!(env.path("lib/index.js").exists());
  }
}
