//! Seams to the external text-generation and embedding services.
//!
//! Both services are synchronous request/response endpoints. Implementations
//! report any network or protocol failure as [`Error::Transport`](crate::Error).

use crate::Result;

/// One generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest<'a> {
    pub prompt: &'a str,
    pub system: Option<&'a str>,
    pub model: &'a str,
    pub temperature: f32,
}

/// A text-generation service returning raw completion text
pub trait TextGenerator {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String>;
}

/// An embedding service returning one vector per text
pub trait Embedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Model identifier sent with each request
    fn model(&self) -> &str;
}

impl<T: TextGenerator + ?Sized> TextGenerator for &T {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String> {
        (**self).generate(request)
    }
}

impl<T: TextGenerator + ?Sized> TextGenerator for Box<T> {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String> {
        (**self).generate(request)
    }
}

impl<T: Embedder + ?Sized> Embedder for &T {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        (**self).embed(text)
    }

    fn model(&self) -> &str {
        (**self).model()
    }
}

impl<T: Embedder + ?Sized> Embedder for Box<T> {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        (**self).embed(text)
    }

    fn model(&self) -> &str {
        (**self).model()
    }
}
