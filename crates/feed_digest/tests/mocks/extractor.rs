use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use feed_digest::{
    extract::{ContentExtractor, ExtractedContent, ScratchFile},
    types::FeedItem,
};

#[derive(Clone)]
enum Mode {
    Transcript(String),
    Audio,
}

#[derive(Clone)]
pub struct MockExtractor {
    mode: Mode,
    pub calls: Arc<Mutex<Vec<String>>>,
    /// Scratch files handed out in audio mode
    pub scratch_paths: Arc<Mutex<Vec<PathBuf>>>,
    pub fail_with: Option<String>,
}

impl MockExtractor {
    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            calls: Arc::new(Mutex::new(Vec::new())),
            scratch_paths: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn transcript(text: &str) -> Self {
        Self::with_mode(Mode::Transcript(text.to_string()))
    }

    /// Writes a small fake audio file into `<workdir>/audio` for every item
    pub fn audio() -> Self {
        Self::with_mode(Mode::Audio)
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Self::transcript("")
        }
    }
}

impl ContentExtractor for MockExtractor {
    type Error = anyhow::Error;

    async fn extract(
        &self,
        item: &FeedItem,
        workdir: &Path,
    ) -> Result<ExtractedContent, Self::Error> {
        self.calls.lock().unwrap().push(item.id.clone());
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }

        match &self.mode {
            Mode::Transcript(text) => Ok(ExtractedContent::Transcript(text.clone())),
            Mode::Audio => {
                let dir = workdir.join("audio");
                std::fs::create_dir_all(&dir)?;
                let path = dir.join(format!("{}.audio", item.id));
                std::fs::write(&path, b"ID3-mock-audio")?;

                self.scratch_paths.lock().unwrap().push(path.clone());
                Ok(ExtractedContent::Audio(ScratchFile::new(path, "audio/mpeg")))
            }
        }
    }
}
