//! Shared helpers for library integration tests.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use compkit_lib::config::ProjectConfig;
use compkit_lib::consts::MINIAPP_DIST_DIR;
use compkit_lib::context::{BuildContext, Target};
use compkit_lib::execute::Orchestrator;
use compkit_lib::miniapp::{CollaboratorError, MiniappCompiler};
use compkit_lib::task::{TaskRegistry, Toolchain};
use compkit_lib::transform::{ScriptTransform, TransformError, TypedCompileOptions, TypedCompiler, TypedOutput};

pub const COMPONENT_JSX: &str = r#"import { createElement } from 'rax';
import View from 'rax-view';

export default function Index() {
  return <View>Hello World!</View>;
}
"#;

pub const COMPONENT_TSX: &str = r#"import { createElement } from 'rax';
import View from 'rax-view';

const greeting: string = 'Hello World!';

export default function Index() {
  return <View>{greeting}</View>;
}
"#;

pub const TRIAD: [&str; 3] = ["component.json", "component.js", "component.axml"];

pub fn fixture_dir() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join("jsx2mp")
}

pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_dir().join(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// A component project in a temporary directory.
pub struct TestProject {
  pub temp: TempDir,
}

impl TestProject {
  /// A plain script component with a stylesheet and a test file.
  pub fn script() -> Self {
    let project = Self {
      temp: TempDir::new().unwrap(),
    };
    project.write("src/index.jsx", COMPONENT_JSX);
    project.write("src/index.css", ".container { display: flex; }\n");
    project.write("src/__tests__/index.test.jsx", "it('renders', () => {});\n");
    project
  }

  /// A typed component: `tsconfig.json` plus typed sources.
  pub fn typed() -> Self {
    let project = Self {
      temp: TempDir::new().unwrap(),
    };
    project.write("tsconfig.json", "{ \"compilerOptions\": { \"jsx\": \"preserve\" } }\n");
    project.write("src/index.tsx", COMPONENT_TSX);
    project.write("src/types.d.ts", "declare module 'rax-view';\n");
    project.write("src/utils/format.js", "export const format = (s) => s.trim();\n");
    project.write("src/index.css", ".container { display: flex; }\n");
    project
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  pub fn write(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn read(&self, relative_path: &str) -> String {
    std::fs::read_to_string(self.temp.path().join(relative_path))
      .unwrap_or_else(|e| panic!("Failed to read {}: {}", relative_path, e))
  }

  pub fn exists(&self, relative_path: &str) -> bool {
    self.temp.path().join(relative_path).exists()
  }

  pub fn context(&self, targets: &[Target]) -> BuildContext {
    let config = ProjectConfig::default().with_targets(targets.to_vec());
    BuildContext::resolve(self.root(), &config)
  }
}

/// Prefixes every script with a marker so transformed output is recognisable.
pub struct MarkCompiled;

#[async_trait]
impl ScriptTransform for MarkCompiled {
  async fn transform(&self, _path: &Path, source: String) -> Result<String, TransformError> {
    Ok(format!("/* compiled */\n{}", source))
  }
}

/// Drops the `: string` annotations used in the fixtures.
pub struct StripTypes;

#[async_trait]
impl TypedCompiler for StripTypes {
  async fn compile(
    &self,
    _path: &Path,
    source: String,
    options: &TypedCompileOptions,
  ) -> Result<TypedOutput, TransformError> {
    Ok(TypedOutput {
      code: source.replace(": string", ""),
      declaration: options
        .declaration
        .then(|| "declare function Index(): any;\nexport default Index;\n".to_string()),
    })
  }
}

pub fn toolchain() -> Toolchain {
  Toolchain {
    script: Arc::new(MarkCompiled),
    typed: Some(Arc::new(StripTypes)),
  }
}

/// One recorded miniapp compiler invocation.
#[derive(Debug, Clone)]
pub struct CompilerCall {
  pub entry_override: Option<PathBuf>,
  /// Whether `<entry>.js` existed when the compiler ran.
  pub entry_present: bool,
}

/// Stands in for the JSX-to-miniapp compiler.
///
/// It checks that the entry it was pointed at has been built, then writes the
/// artifact triad into `<output>/miniapp`.
#[derive(Default)]
pub struct FixtureCompiler {
  pub calls: Mutex<Vec<CompilerCall>>,
  pub fail_with: Option<String>,
}

impl FixtureCompiler {
  pub fn failing(message: &str) -> Self {
    Self {
      fail_with: Some(message.to_string()),
      ..Default::default()
    }
  }

  pub fn calls(&self) -> Vec<CompilerCall> {
    self.calls.lock().unwrap().clone()
  }
}

#[async_trait]
impl MiniappCompiler for FixtureCompiler {
  async fn build(&self, context: &BuildContext, entry_override: Option<&Path>) -> Option<CollaboratorError> {
    let entry = entry_override
      .map(Path::to_path_buf)
      .unwrap_or_else(|| context.output_root.join("index"));
    let entry_present = context.project_root.join(&entry).with_extension("js").is_file();

    self.calls.lock().unwrap().push(CompilerCall {
      entry_override: entry_override.map(Path::to_path_buf),
      entry_present,
    });

    if let Some(message) = &self.fail_with {
      return Some(CollaboratorError::new(message.clone()));
    }
    if !entry_present {
      return Some(CollaboratorError::new(format!("entry {} not found", entry.display())));
    }

    let dist = context.output_root.join(MINIAPP_DIST_DIR);
    std::fs::create_dir_all(&dist).unwrap();
    for name in TRIAD {
      std::fs::copy(fixture_dir().join(name), dist.join(name)).unwrap();
    }
    None
  }
}

pub fn orchestrator(compiler: Arc<FixtureCompiler>) -> Orchestrator {
  Orchestrator::new(TaskRegistry::standard(&toolchain())).with_miniapp_compiler(compiler)
}
