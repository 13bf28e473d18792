//! System clipboard access.
//!
//! The app talks to the [`Clipboard`] trait so tests can substitute an
//! in-memory clipboard for the real one.

use image::RgbaImage;

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("clipboard image is malformed ({width}x{height})")]
    MalformedImage { width: usize, height: usize },
}

pub trait Clipboard {
    /// The image currently on the clipboard, or `None` when it holds
    /// something else.
    fn image(&mut self) -> Result<Option<RgbaImage>, ClipboardError>;

    /// The text currently on the clipboard, if any.
    fn text(&mut self) -> Result<Option<String>, ClipboardError>;

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The desktop clipboard. Connected on first use, then held open: on X11
/// the text we put on the clipboard is only served while the handle lives.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

fn unavailable(e: arboard::Error) -> ClipboardError {
    ClipboardError::Unavailable(e.to_string())
}

impl SystemClipboard {
    fn handle(&mut self) -> Result<&mut arboard::Clipboard, ClipboardError> {
        let handle = match self.inner.take() {
            Some(handle) => handle,
            None => arboard::Clipboard::new().map_err(unavailable)?,
        };
        Ok(self.inner.insert(handle))
    }
}

impl Clipboard for SystemClipboard {
    fn image(&mut self) -> Result<Option<RgbaImage>, ClipboardError> {
        let data = match self.handle()?.get_image() {
            Ok(data) => data,
            Err(arboard::Error::ContentNotAvailable) => return Ok(None),
            Err(e) => return Err(unavailable(e)),
        };

        let (width, height) = (data.width, data.height);
        let malformed = ClipboardError::MalformedImage { width, height };
        let (Ok(w), Ok(h)) = (u32::try_from(width), u32::try_from(height)) else {
            return Err(malformed);
        };
        // arboard hands out tightly packed RGBA rows
        RgbaImage::from_raw(w, h, data.bytes.into_owned())
            .map(Some)
            .ok_or(malformed)
    }

    fn text(&mut self) -> Result<Option<String>, ClipboardError> {
        match self.handle()?.get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(unavailable(e)),
        }
    }

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.handle()?.set_text(text).map_err(unavailable)
    }
}
