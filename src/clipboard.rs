use crate::error::{Result, RoveError};

/// Text sink for copy requests. Failures are logged, never reported back.
pub trait Clipboard: Send + Sync {
    fn copy(&self, text: &str);
}

/// The OS clipboard, via arboard.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    fn try_copy(&self, text: &str) -> Result<()> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| RoveError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| RoveError::Clipboard(e.to_string()))
    }
}

impl Clipboard for SystemClipboard {
    fn copy(&self, text: &str) {
        if let Err(e) = self.try_copy(text) {
            tracing::warn!("copy failed: {}", e);
        }
    }
}

/// Keeps everything copied, for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    copied: parking_lot::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MemoryClipboard {
    pub fn copied(&self) -> Vec<String> {
        self.copied.lock().clone()
    }
}

#[cfg(test)]
impl Clipboard for MemoryClipboard {
    fn copy(&self, text: &str) {
        self.copied.lock().push(text.to_string());
    }
}
