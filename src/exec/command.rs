// src/exec/command.rs

//! Compiler backed by an external shell command.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tracing::debug;

use crate::exec::backend::{CompileRequest, SceneCompiler};
use crate::types::{BuildArtifact, BuildMode};

/// Runs a configured shell command and takes its stdout as the bundle.
///
/// The template may use `{scene}`, `{entry}` and `{dir}`; the same values
/// are also exported as `SCENEWATCH_SCENE`, `SCENEWATCH_ENTRY` and
/// `SCENEWATCH_DIR`, plus `SCENEWATCH_MINIFY` (`1` or `0`).
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    template: String,
}

impl CommandCompiler {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Substitute the placeholders for `request`.
    pub fn render(&self, request: &CompileRequest) -> String {
        self.template
            .replace("{scene}", request.scene.as_str())
            .replace("{entry}", &request.entry_point)
            .replace("{dir}", &request.scene_dir.to_string_lossy())
    }

    async fn run(&self, request: CompileRequest, minify: bool) -> Result<BuildArtifact> {
        let line = self.render(&request);
        debug!(scene = %request.scene, cmd = %line, minify, "starting compiler");

        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&line);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&line);
            c
        };

        cmd.env("SCENEWATCH_SCENE", request.scene.as_str())
            .env("SCENEWATCH_ENTRY", &request.entry_point)
            .env("SCENEWATCH_DIR", &request.scene_dir)
            .env("SCENEWATCH_MINIFY", if minify { "1" } else { "0" })
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = cmd
            .output()
            .await
            .with_context(|| format!("spawning compiler for scene '{}'", request.scene))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output
                .status
                .code()
                .map_or_else(|| "a signal".to_string(), |c| format!("status {c}"));
            bail!("`{}` exited with {}: {}", line, code, stderr.trim());
        }

        let content = String::from_utf8(output.stdout)
            .with_context(|| format!("compiler output for scene '{}' is not UTF-8", request.scene))?;
        let mode = if minify {
            BuildMode::Compiled
        } else {
            BuildMode::Transpiled
        };

        Ok(BuildArtifact::new(content, mode))
    }
}

impl SceneCompiler for CommandCompiler {
    fn compile(
        &self,
        request: CompileRequest,
        minify: bool,
    ) -> Pin<Box<dyn Future<Output = Result<BuildArtifact>> + Send + '_>> {
        Box::pin(self.run(request, minify))
    }
}
