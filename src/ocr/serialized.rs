//! Serializing guard for recognizers that are not reentrant.

use std::sync::Mutex;

use image::DynamicImage;

use super::backend::{OcrError, Recognizer, StatefulRecognizer};
use crate::models::RecognizedWord;

/// Shares one stateful engine across workers by taking a lock per call.
///
/// Throughput drops to one recognition at a time, but workers still
/// overlap on decoding and persisting.
pub struct Serialized<R> {
    name: String,
    inner: Mutex<R>,
}

impl<R: StatefulRecognizer> Serialized<R> {
    pub fn new(inner: R) -> Self {
        Self {
            name: inner.name().to_string(),
            inner: Mutex::new(inner),
        }
    }

    fn with_engine<T>(&self, f: impl FnOnce(&mut R) -> Result<T, OcrError>) -> Result<T, OcrError> {
        let mut engine = self
            .inner
            .lock()
            .map_err(|_| OcrError::OcrFailed(format!("{} lock poisoned", self.name)))?;
        f(&mut engine)
    }

    pub fn into_inner(self) -> Option<R> {
        self.inner.into_inner().ok()
    }
}

impl<R: StatefulRecognizer> Recognizer for Serialized<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        format!("{} is available", self.name)
    }

    fn recognize(&self, image: &DynamicImage) -> Result<Vec<String>, OcrError> {
        self.with_engine(|engine| engine.recognize_mut(image))
    }

    fn recognize_words(&self, image: &DynamicImage) -> Result<Vec<RecognizedWord>, OcrError> {
        self.with_engine(|engine| engine.recognize_words_mut(image))
    }

    fn recognize_hocr(&self, image: &DynamicImage) -> Result<String, OcrError> {
        self.with_engine(|engine| engine.recognize_hocr_mut(image))
    }
}
