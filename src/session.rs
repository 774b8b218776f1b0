//! The single owned state record behind the UI.
//!
//! All mutation goes through the transition methods below. Each operation
//! that starts gets a [`Ticket`] carrying the session epoch at that moment;
//! completions holding an older ticket are dropped, so a slow first upload
//! cannot overwrite the result of a later one.

use tracing::debug;

use crate::error::CoverError;
use crate::frame::{CapturedFrame, FrameExtractor};
use crate::generate::{CoverDesigner, GenerationResult};
use crate::presets::{StyleCatalog, StylePreset};

/// Proof that an operation was started at a given epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
}

impl Ticket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

#[derive(Debug, Clone)]
pub struct CoverSession {
    catalog: StyleCatalog,
    selected: usize,
    title: String,
    loading: bool,
    error: Option<String>,
    frame: Option<CapturedFrame>,
    result: Option<GenerationResult>,
    epoch: u64,
}

impl CoverSession {
    pub fn new(catalog: StyleCatalog) -> Self {
        Self {
            catalog,
            selected: 0,
            title: String::new(),
            loading: false,
            error: None,
            frame: None,
            result: None,
            epoch: 0,
        }
    }

    pub fn catalog(&self) -> &StyleCatalog {
        &self.catalog
    }

    pub fn selected_preset(&self) -> &StylePreset {
        &self.catalog.presets()[self.selected]
    }

    /// Select a style by id. Returns false and keeps the current selection
    /// when the id is unknown.
    pub fn select_preset(&mut self, id: &str) -> bool {
        match self.catalog.presets().iter().position(|p| p.id.eq_ignore_ascii_case(id.trim())) {
            Some(idx) => {
                self.selected = idx;
                true
            }
            None => false,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn frame(&self) -> Option<&CapturedFrame> {
        self.frame.as_ref()
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        self.result.as_ref()
    }

    /// The generate action is available only with a frame and nothing running.
    pub fn can_generate(&self) -> bool {
        self.frame.is_some() && !self.loading
    }

    /// What the preview shows: the cover if there is one, else the frame.
    pub fn display_image(&self) -> Option<DisplayImage<'_>> {
        match (&self.result, &self.frame) {
            (Some(result), _) => Some(DisplayImage::Cover(result)),
            (None, Some(frame)) => Some(DisplayImage::Frame(frame)),
            (None, None) => None,
        }
    }

    fn next_ticket(&mut self) -> Ticket {
        self.epoch += 1;
        Ticket { epoch: self.epoch }
    }

    fn is_current(&self, ticket: Ticket, what: &str) -> bool {
        let current = ticket.epoch == self.epoch;
        if !current {
            debug!(ticket = ticket.epoch, epoch = self.epoch, what, "dropping stale completion");
        }
        current
    }

    /// A new upload supersedes the previous frame and result.
    pub fn upload_started(&mut self) -> Ticket {
        self.loading = true;
        self.error = None;
        self.frame = None;
        self.result = None;
        self.next_ticket()
    }

    pub fn upload_succeeded(&mut self, ticket: Ticket, frame: CapturedFrame) -> bool {
        if !self.is_current(ticket, "upload") {
            return false;
        }
        self.frame = Some(frame);
        self.loading = false;
        true
    }

    pub fn upload_failed(&mut self, ticket: Ticket, err: &CoverError) -> bool {
        if !self.is_current(ticket, "upload") {
            return false;
        }
        self.error = Some(err.user_message());
        self.loading = false;
        true
    }

    /// `None` when there is no frame or another operation is running.
    pub fn generate_started(&mut self) -> Option<Ticket> {
        if !self.can_generate() {
            return None;
        }
        self.loading = true;
        self.error = None;
        Some(self.next_ticket())
    }

    pub fn generate_succeeded(&mut self, ticket: Ticket, result: GenerationResult) -> bool {
        if !self.is_current(ticket, "generate") {
            return false;
        }
        self.result = Some(result);
        self.loading = false;
        true
    }

    /// The previously displayed result, if any, is kept.
    pub fn generate_failed(&mut self, ticket: Ticket, err: &CoverError) -> bool {
        if !self.is_current(ticket, "generate") {
            return false;
        }
        self.error = Some(err.user_message());
        self.loading = false;
        true
    }

    /// Run a full upload: start, extract, then apply the outcome.
    pub async fn upload(&mut self, extractor: &FrameExtractor, video: Vec<u8>) -> Result<(), CoverError> {
        let ticket = self.upload_started();
        match extractor.extract(video).await {
            Ok(frame) => {
                self.upload_succeeded(ticket, frame);
                Ok(())
            }
            Err(err) => {
                self.upload_failed(ticket, &err);
                Err(err)
            }
        }
    }

    /// Run a full generation with the current frame, title and style.
    /// Returns `Ok(false)` when the action is not available.
    pub async fn generate(&mut self, designer: &CoverDesigner) -> Result<bool, CoverError> {
        let Some(ticket) = self.generate_started() else {
            return Ok(false);
        };
        let preset = self.selected_preset().clone();
        let outcome = designer.generate_cover(self.frame.as_ref(), &self.title, &preset).await;
        match outcome {
            Ok(Some(result)) => {
                self.generate_succeeded(ticket, result);
                Ok(true)
            }
            Ok(None) => {
                let err = CoverError::generation("no frame to generate from");
                self.generate_failed(ticket, &err);
                Err(err)
            }
            Err(err) => {
                self.generate_failed(ticket, &err);
                Err(err)
            }
        }
    }
}

impl Default for CoverSession {
    fn default() -> Self {
        Self::new(StyleCatalog::builtin())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayImage<'a> {
    Frame(&'a CapturedFrame),
    Cover(&'a GenerationResult),
}
