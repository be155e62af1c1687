//! Builds against real source trees for the web and weex targets.

use std::sync::Arc;

use async_trait::async_trait;

use compkit_lib::config::ProjectConfig;
use compkit_lib::context::{BuildContext, Target};
use compkit_lib::execute::{BuildError, Orchestrator};
use compkit_lib::task::{StepCause, StepName, TaskRegistry, Toolchain};
use compkit_lib::transform::{ScriptTransform, TransformError};
use compkit_lib::util::hash::hash_tree;

use super::common::{COMPONENT_JSX, COMPONENT_TSX, TestProject, toolchain};

#[tokio::test]
async fn plain_project_with_default_config() {
  let project = TestProject::script();
  let config = ProjectConfig::default();
  let context = BuildContext::resolve(project.root(), &config);

  let report = Orchestrator::from_config(&config).run(&context).await.unwrap();

  assert!(report.is_success());
  assert!(!context.has_typed_sources);
  assert_eq!(project.read("lib/index.js"), COMPONENT_JSX);
  assert_eq!(project.read("lib/index.css"), ".container { display: flex; }\n");
  assert!(!project.exists("lib/__tests__"));
  assert!(project.exists("src/index.jsx"));

  for step in [StepName::Clean, StepName::CompileScript, StepName::CopyOthers] {
    assert!(report.ran(step), "{} did not run", step);
  }
  assert!(!report.ran(StepName::CompileTyped));
}

#[tokio::test]
async fn previous_output_is_removed() {
  let project = TestProject::script();
  project.write("lib/removed.js", "stale");
  let context = project.context(&[Target::Web]);

  Orchestrator::new(TaskRegistry::standard(&toolchain()))
    .run(&context)
    .await
    .unwrap();

  assert!(!project.exists("lib/removed.js"));
  assert!(project.exists("lib/index.js"));
}

#[tokio::test]
async fn typed_project_emits_code_and_declarations() {
  let project = TestProject::typed();
  let context = project.context(&[Target::Web, Target::Weex]);
  assert!(context.has_typed_sources);

  let report = Orchestrator::new(TaskRegistry::standard(&toolchain()))
    .run(&context)
    .await
    .unwrap();

  assert!(report.is_success());
  let code = project.read("lib/index.js");
  assert!(code.starts_with("/* compiled */\n"));
  assert!(code.contains("const greeting = 'Hello World!';"));
  assert!(project.read("lib/index.d.ts").contains("export default Index;"));
  assert!(project.read("lib/utils/format.js").starts_with("/* compiled */\n"));
  assert!(project.exists("lib/index.css"));
  // Declaration sources are neither compiled nor copied.
  assert!(!project.exists("lib/types.d.ts"));
  assert!(!project.exists("lib/types.js"));
  assert!(!project.exists("lib/miniappTemp"));
}

#[tokio::test]
async fn typed_project_without_typed_compiler_fails_before_running() {
  let project = TestProject::typed();
  project.write("lib/index.js", "previous");
  let context = project.context(&[Target::Web]);

  let err = Orchestrator::new(TaskRegistry::standard(&Toolchain::default()))
    .run(&context)
    .await
    .unwrap_err();

  assert!(matches!(err, BuildError::MissingStep(StepName::CompileTyped)));
  assert_eq!(project.read("lib/index.js"), "previous");
}

struct RejectJsx;

#[async_trait]
impl ScriptTransform for RejectJsx {
  async fn transform(&self, path: &std::path::Path, source: String) -> Result<String, TransformError> {
    if path.extension().is_some_and(|e| e == "jsx") {
      return Err(TransformError::Rejected {
        file: path.display().to_string(),
        message: "Support for the experimental syntax 'jsx' isn't currently enabled".to_string(),
      });
    }
    Ok(source)
  }
}

#[tokio::test]
async fn transform_failure_fails_the_compile_stage() {
  let project = TestProject::script();
  let context = project.context(&[Target::Web]);
  let toolchain = Toolchain {
    script: Arc::new(RejectJsx),
    typed: None,
  };

  let err = Orchestrator::new(TaskRegistry::standard(&toolchain))
    .run(&context)
    .await
    .unwrap_err();

  match err {
    BuildError::Stage { index, source } => {
      assert_eq!(index, 1);
      assert_eq!(source.step, StepName::CompileScript);
      assert!(matches!(source.cause, StepCause::Transform(TransformError::Rejected { .. })));
    }
    other => panic!("expected stage failure, got {:?}", other),
  }
}

#[tokio::test]
async fn repeated_builds_produce_identical_output() {
  let project = TestProject::typed();
  let context = project.context(&[Target::Web]);
  let orchestrator = Orchestrator::new(TaskRegistry::standard(&toolchain()));

  orchestrator.run(&context).await.unwrap();
  let first = hash_tree(&context.output_root).unwrap();
  orchestrator.run(&context).await.unwrap();
  let second = hash_tree(&context.output_root).unwrap();

  assert_eq!(first, second);
  assert_eq!(project.read("src/index.tsx"), COMPONENT_TSX);
}
