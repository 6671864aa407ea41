use avatar_video_lambda::{
    GenerateVideoError, Stages, metadata::MetadataError,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::Notify;
use types::VideoCreation;

pub const PUBLIC_BASE: &str = "https://cdn.example.com";

/// Speech synthesis fails for this script whatever the configured fault.
pub const UNSPEAKABLE_SCRIPT: &str = "this script cannot be spoken";

/// Which stage should misbehave, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fault {
    #[default]
    Healthy,
    Unconfigured,
    AvatarMissing,
    AvatarServerError,
    Speech,
    LipSync,
    LipSyncNoOutput,
    ResultDownload,
    Upload,
    Metadata,
    PanicInLipSync,
}

/// Holds lip-sync calls until released.
#[derive(Default)]
pub struct LipSyncGate {
    pub reached: Notify,
    pub release: Notify,
}

/// In-process stand-in for every collaborator. Stages write real files to
/// the scratch directory so cleanup can be observed.
pub struct FakeStages {
    pub scratch: tempfile::TempDir,
    pub fault: Fault,
    pub calls: Mutex<Vec<String>>,
    pub published_keys: Mutex<Vec<String>>,
    pub records: Mutex<Vec<VideoCreation>>,
    pub avatar_paths: Mutex<Vec<PathBuf>>,
    pub gate: Option<LipSyncGate>,
}

impl FakeStages {
    pub fn new(fault: Fault) -> Self {
        Self {
            scratch: tempfile::tempdir().unwrap(),
            fault,
            calls: Mutex::new(Vec::new()),
            published_keys: Mutex::new(Vec::new()),
            records: Mutex::new(Vec::new()),
            avatar_paths: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn with_lip_sync_gate(mut self) -> Self {
        self.gate = Some(LipSyncGate::default());
        self
    }

    pub fn avatar_paths(&self) -> Vec<PathBuf> {
        self.avatar_paths.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn published_keys(&self) -> Vec<String> {
        self.published_keys.lock().unwrap().clone()
    }

    pub fn records(&self) -> Vec<VideoCreation> {
        self.records.lock().unwrap().clone()
    }

    pub fn scratch_entries(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.scratch.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    fn called(&self, stage: &str) {
        self.calls.lock().unwrap().push(stage.to_string());
    }
}

impl Stages for FakeStages {
    fn ensure_configured(&self) -> Result<(), GenerateVideoError> {
        if self.fault == Fault::Unconfigured {
            return Err(GenerateVideoError::Configuration(
                "Replicate API token not found.".to_string(),
            ));
        }
        Ok(())
    }

    fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    async fn fetch_avatar(
        &self,
        key: &str,
        destination: &Path,
    ) -> Result<(), GenerateVideoError> {
        self.called("fetch_avatar");
        self.avatar_paths
            .lock()
            .unwrap()
            .push(destination.to_path_buf());
        match self.fault {
            Fault::AvatarMissing => Err(GenerateVideoError::AvatarNotFound {
                path: key.to_string(),
            }),
            Fault::AvatarServerError => Err(GenerateVideoError::stage(
                "Failed to download avatar image. Server error: AccessDenied",
            )),
            _ => {
                tokio::fs::write(destination, b"png").await.unwrap();
                Ok(())
            }
        }
    }

    async fn synthesize_speech(
        &self,
        text: &str,
        destination: &Path,
    ) -> Result<(), GenerateVideoError> {
        self.called("synthesize_speech");
        tokio::fs::write(destination, b"mp3").await.unwrap();
        if self.fault == Fault::Speech || text == UNSPEAKABLE_SCRIPT {
            return Err(GenerateVideoError::stage(
                "TTS generation failed: throttled",
            ));
        }
        Ok(())
    }

    async fn invoke_lip_sync(
        &self,
        image: &Path,
        audio: &Path,
    ) -> Result<String, GenerateVideoError> {
        self.called("invoke_lip_sync");
        if let Some(gate) = &self.gate {
            gate.reached.notify_one();
            gate.release.notified().await;
        }
        if !image.exists() || !audio.exists() {
            return Err(GenerateVideoError::stage(
                "Lip-sync process failed: inputs vanished",
            ));
        }
        match self.fault {
            Fault::LipSync => Err(GenerateVideoError::stage(
                "Lip-sync generation failed due to Replicate API error: \
                 prediction failed",
            )),
            Fault::LipSyncNoOutput => Err(GenerateVideoError::stage(
                "Lip-sync process did not return a video URL from Replicate.",
            )),
            Fault::PanicInLipSync => panic!("lip-sync model exploded"),
            _ => Ok("https://replicate.delivery/p1/output.mp4".to_string()),
        }
    }

    async fn fetch_result(
        &self,
        url: &str,
        destination: &Path,
    ) -> Result<(), GenerateVideoError> {
        self.called("fetch_result");
        if self.fault == Fault::ResultDownload {
            return Err(GenerateVideoError::stage(format!(
                "Failed to download generated video from Replicate: \
                 404 for {url}"
            )));
        }
        tokio::fs::write(destination, b"mp4").await.unwrap();
        Ok(())
    }

    async fn publish_video(
        &self,
        source: &Path,
        key: &str,
    ) -> Result<String, GenerateVideoError> {
        self.called("publish_video");
        assert!(source.exists());
        if self.fault == Fault::Upload {
            return Err(GenerateVideoError::stage(
                "Failed to upload video to storage: AccessDenied",
            ));
        }
        self.published_keys.lock().unwrap().push(key.to_string());
        Ok(format!("{PUBLIC_BASE}/{key}"))
    }

    async fn record_metadata(
        &self,
        record: &VideoCreation,
    ) -> Result<String, MetadataError> {
        self.called("record_metadata");
        self.records.lock().unwrap().push(record.clone());
        if self.fault == Fault::Metadata {
            return Err(MetadataError::PutItem(
                "ProvisionedThroughputExceededException".to_string(),
            ));
        }
        Ok(record.id.clone())
    }
}
