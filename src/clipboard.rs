use anyhow::{Context, Result};
use arboard::Clipboard;

/// Destination for copy actions.
pub trait ClipboardWriter {
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// The platform clipboard.
///
/// The handle is opened on first use and kept, since some platforms drop the
/// clipboard contents when the owning handle goes away.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardWriter for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        if self.inner.is_none() {
            self.inner = Some(Clipboard::new().context("Failed to open the system clipboard")?);
        }
        match self.inner.as_mut() {
            Some(clipboard) => clipboard
                .set_text(text.to_owned())
                .context("Failed to write to the system clipboard"),
            None => anyhow::bail!("System clipboard unavailable"),
        }
    }
}
