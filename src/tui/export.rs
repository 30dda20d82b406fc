use anyhow::Result;
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

use super::state::{truncate_chars, UiState};

// Global clipboard manager channel - initialized once on first use
static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// Copy the image URL of the open detail view.
pub fn copy_image_url(state: &mut UiState) {
    let Some(url) = state.detail.as_ref().and_then(|d| d.image_url.clone()) else {
        state.info = "No image URL to copy".into();
        return;
    };
    state.info = match copy_to_clipboard(&url) {
        Ok(()) => format!("✓ Copied to clipboard: {}", truncate_chars(&url, 60)),
        Err(e) => format!("Clipboard copy failed: {e:#}"),
    };
}

/// Initialize the clipboard manager thread if not already initialized.
/// Clipboard writes are processed sequentially on one background thread, and each
/// clipboard instance is kept alive long enough for clipboard managers to read it.
fn init_clipboard_manager() -> Result<&'static std_mpsc::Sender<String>> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();

        std::thread::spawn(move || {
            use arboard::Clipboard;

            for text in rx {
                if let Ok(mut clipboard) = Clipboard::new() {
                    if clipboard.set_text(&text).is_ok() {
                        std::thread::sleep(Duration::from_secs(2));
                    }
                }
            }
        });

        tx
    });

    CLIPBOARD_SENDER
        .get()
        .ok_or_else(|| anyhow::anyhow!("Failed to initialize clipboard manager"))
}

/// Queue `text` for the clipboard without blocking the UI thread.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let sender = init_clipboard_manager()?;
    sender
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("Clipboard manager channel closed"))?;
    Ok(())
}
