//! State of the scanner screen: the staged image and the latest outcome.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::error::ClassificationError;
use crate::types::PredictionResult;

/// Where the scanner is in its single-request cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScanPhase {
    #[default]
    Idle,
    /// An image is staged and no request has been made for it yet.
    Staged,
    InFlight,
    Done(Result<PredictionResult, ClassificationError>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no image staged")]
    NothingStaged,

    #[error("a classification is already in flight")]
    AlreadyInFlight,

    #[error("no classification is in flight")]
    NotInFlight,
}

/// Scanner screen state. At most one classification is in flight.
#[derive(Debug, Clone, Default)]
pub struct ScanSession {
    staged: Option<PathBuf>,
    phase: ScanPhase,
    availability: Option<Result<(), ClassificationError>>,
}

impl ScanSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn staged(&self) -> Option<&Path> {
        self.staged.as_deref()
    }

    pub fn phase(&self) -> &ScanPhase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == ScanPhase::InFlight
    }

    /// Stage a new image, discarding any previous outcome.
    pub fn stage(&mut self, path: impl Into<PathBuf>) -> Result<(), SessionError> {
        if self.is_loading() {
            return Err(SessionError::AlreadyInFlight);
        }
        self.staged = Some(path.into());
        self.phase = ScanPhase::Staged;
        Ok(())
    }

    /// Mark the request for the staged image as started and return its path.
    pub fn begin(&mut self) -> Result<PathBuf, SessionError> {
        if self.is_loading() {
            return Err(SessionError::AlreadyInFlight);
        }
        let path = self.staged.clone().ok_or(SessionError::NothingStaged)?;
        self.phase = ScanPhase::InFlight;
        Ok(path)
    }

    pub fn finish(&mut self, result: Result<PredictionResult, ClassificationError>) -> Result<(), SessionError> {
        if !self.is_loading() {
            return Err(SessionError::NotInFlight);
        }
        self.phase = ScanPhase::Done(result);
        Ok(())
    }

    pub fn prediction(&self) -> Option<&PredictionResult> {
        match &self.phase {
            ScanPhase::Done(Ok(prediction)) => Some(prediction),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ClassificationError> {
        match &self.phase {
            ScanPhase::Done(Err(err)) => Some(err),
            _ => None,
        }
    }

    pub fn record_availability(&mut self, result: Result<(), ClassificationError>) {
        self.availability = Some(result);
    }

    /// `None` until an availability check has completed.
    pub fn availability(&self) -> Option<&Result<(), ClassificationError>> {
        self.availability.as_ref()
    }
}
