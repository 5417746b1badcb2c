use async_trait::async_trait;
use course_core::{CoreError, Result};
use course_sdk::FileCache;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{Task, TaskContext, TaskResult};

pub const AUDIO_EXTENSIONS: &[&str] = &["m4a", "mp3", "wav", "ogg", "flac", "webm"];

pub const TRANSCRIPTS_FILE: &str = "all_transcripts.json";

/// Transcribes every audio file in a directory. Transcripts are cached so
/// reruns do not repeat paid calls.
#[derive(Debug, Clone)]
pub struct TranscribeTask {
    pub audio_dir: PathBuf,
    pub output_dir: PathBuf,
    pub cache: Option<FileCache>,
}

impl TranscribeTask {
    pub fn new(audio_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            audio_dir: audio_dir.into(),
            output_dir: output_dir.into(),
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: FileCache) -> Self {
        self.cache = Some(cache);
        self
    }
}

/// Audio files directly inside `dir`, sorted by name.
pub async fn audio_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        CoreError::Configuration(format!("cannot read audio directory {}: {}", dir.display(), e))
    })?;
    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| CoreError::Transport(e.to_string()))?
    {
        let path = entry.path();
        let is_audio = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| AUDIO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_audio {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn io_error(path: &Path, e: std::io::Error) -> CoreError {
    CoreError::Transport(format!("{}: {}", path.display(), e))
}

#[async_trait]
impl Task for TranscribeTask {
    async fn execute(&self, context: &TaskContext) -> Result<TaskResult> {
        let llm = context.llm()?;
        let cache = self.cache.clone().or_else(|| {
            context
                .course
                .http_client()
                .config()
                .cache_dir
                .clone()
                .map(FileCache::new)
        });

        let files = audio_files(&self.audio_dir).await?;
        info!(files = files.len(), dir = %self.audio_dir.display(), "Transcribing directory");

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| io_error(&self.output_dir, e))?;

        let mut transcripts = BTreeMap::new();
        for path in &files {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("audio")
                .to_string();
            let stem = path
                .file_stem()
                .and_then(|n| n.to_str())
                .unwrap_or(file_name.as_str())
                .to_string();
            let audio = tokio::fs::read(path).await.map_err(|e| io_error(path, e))?;

            let transcript = match &cache {
                Some(cache) => {
                    let key = format!(
                        "transcript:{}:{}:{}",
                        llm.config().transcription_model,
                        file_name,
                        audio.len()
                    );
                    let bytes = cache
                        .get_or_fetch(&key, || async {
                            llm.transcribe(&file_name, audio.clone())
                                .await
                                .map(String::into_bytes)
                        })
                        .await?;
                    String::from_utf8_lossy(&bytes).into_owned()
                }
                None => llm.transcribe(&file_name, audio).await?,
            };
            debug!(file = %file_name, chars = transcript.chars().count(), "Transcribed");

            let text_path = self.output_dir.join(format!("{}.txt", stem));
            tokio::fs::write(&text_path, &transcript)
                .await
                .map_err(|e| io_error(&text_path, e))?;
            transcripts.insert(stem, transcript);
        }

        let combined = self.output_dir.join(TRANSCRIPTS_FILE);
        let body = serde_json::to_string_pretty(&transcripts)?;
        tokio::fs::write(&combined, body)
            .await
            .map_err(|e| io_error(&combined, e))?;
        info!(path = %combined.display(), "Transcripts saved");

        Ok(TaskResult::local(
            self.name(),
            None,
            json!({ "files": files.len(), "output": combined.display().to_string(), "transcripts": transcripts }),
        ))
    }

    fn name(&self) -> &str {
        "transcribe"
    }
}
