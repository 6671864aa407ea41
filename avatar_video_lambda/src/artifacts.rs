use std::path::{Path, PathBuf};

/// Scratch files owned by a single invocation.
///
/// Paths are derived from the execution id so concurrent invocations on the
/// same host never touch each other's files. Whatever exists when the value
/// is dropped is removed, whether the pipeline finished, failed or panicked.
#[derive(Debug)]
pub struct TransientArtifacts {
    avatar: PathBuf,
    audio: PathBuf,
    video: PathBuf,
}

impl TransientArtifacts {
    #[must_use]
    pub fn new(scratch_dir: &Path, execution_id: &str) -> Self {
        Self {
            avatar: scratch_dir.join(format!("avatar_{execution_id}.png")),
            audio: scratch_dir.join(format!("output_{execution_id}.mp3")),
            video: scratch_dir.join(format!("final_video_{execution_id}.mp4")),
        }
    }

    #[must_use]
    pub fn avatar(&self) -> &Path {
        &self.avatar
    }

    #[must_use]
    pub fn audio(&self) -> &Path {
        &self.audio
    }

    #[must_use]
    pub fn video(&self) -> &Path {
        &self.video
    }

    #[must_use]
    pub fn paths(&self) -> [&Path; 3] {
        [&self.avatar, &self.audio, &self.video]
    }

    fn remove_all(&self) {
        for path in self.paths() {
            match std::fs::remove_file(path) {
                Ok(()) => {
                    tracing::info!(
                        "Cleaned up temporary file: {}",
                        path.display()
                    );
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(
                        "Error cleaning up temporary file {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }
    }
}

impl Drop for TransientArtifacts {
    fn drop(&mut self) {
        self.remove_all();
    }
}
