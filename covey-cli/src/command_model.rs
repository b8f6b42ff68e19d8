//! Model backend that shells out to a local inference program.

use async_trait::async_trait;
use covey_core::{GenerationOptions, Model, ModelError};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::ModelConfig;

/// Runs `command args... <sampling flags>` once per generation, writing the
/// prompt to stdin and returning stdout.
///
/// Sampling options become `--n-predict`, `--temp`, `--top-p`, `--top-k`
/// and `--repeat-penalty`; each stop sequence adds a `--reverse-prompt`.
/// The child is killed if the generation is dropped or times out.
#[derive(Debug, Clone)]
pub struct CommandModel {
    name: String,
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandModel {
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(300),
        }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(config.name.clone(), config.command.clone())
            .with_args(config.args.iter().cloned())
            .with_timeout(Duration::from_secs(config.timeout_secs))
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.args.extend(args);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn sampling_flags(options: &GenerationOptions) -> Vec<String> {
        let mut flags = vec![
            "--n-predict".to_string(),
            options.max_tokens.to_string(),
            "--temp".to_string(),
            options.temperature.to_string(),
            "--top-p".to_string(),
            options.top_p.to_string(),
            "--top-k".to_string(),
            options.top_k.to_string(),
            "--repeat-penalty".to_string(),
            options.repetition_penalty.to_string(),
        ];
        for stop in &options.stop_sequences {
            flags.push("--reverse-prompt".to_string());
            flags.push(stop.clone());
        }
        flags
    }
}

#[async_trait]
impl Model for CommandModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, ModelError> {
        let program = self.program.display().to_string();
        debug!(program = %program, prompt_len = prompt.len(), "Spawning model process");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .args(Self::sampling_flags(options))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ModelError::Unavailable(format!("{program}: {e}")))?;

        // Feed stdin while draining stdout so a prompt larger than the pipe
        // buffer cannot stall an echoing child.
        let stdin = child.stdin.take();
        let feed = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            stdin.write_all(prompt.as_bytes()).await
        };
        let exchange = async { tokio::join!(feed, child.wait_with_output()) };

        let (written, output) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| {
                warn!(program = %program, timeout_secs = self.timeout.as_secs(), "Model process timed out");
                ModelError::Generation(format!(
                    "{program} timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?;
        let output = output.map_err(|e| ModelError::Generation(format!("{program}: {e}")))?;

        // A child may exit without reading its whole prompt.
        if let Err(e) = written {
            debug!(program = %program, error = %e, "Model process closed stdin early");
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ModelError::Generation(format!(
                "{program} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let text = text.strip_prefix(prompt).unwrap_or(&text);
        Ok(text.trim().to_string())
    }
}
