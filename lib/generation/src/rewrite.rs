//! Rewrite dysfunctional text into its functional version.

use reframe_core::{
    Error, ExamplePair, GeneratedRecord, GenerationRequest, Result, RewriteConfig, TextGenerator,
};
use reframe_prompt::rewrite_prompt;
use tracing::{debug, info};

/// Pairs each generated record with a functional rewrite from the service
pub struct FunctionalRewriter<G> {
    generator: G,
    model: String,
    temperature: f32,
}

impl<G: TextGenerator> FunctionalRewriter<G> {
    pub fn new(generator: G, config: &RewriteConfig) -> Self {
        Self {
            generator,
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    /// Functional version of one dysfunctional text
    pub fn rewrite_one(&self, dysfunctional_text: &str) -> Result<String> {
        let prompt = rewrite_prompt(dysfunctional_text);
        let request = GenerationRequest {
            prompt: &prompt,
            system: None,
            model: &self.model,
            temperature: self.temperature,
        };
        let response = self.generator.generate(&request)?;
        let functional = response.trim();
        if functional.is_empty() {
            return Err(Error::transport(self.model.as_str(), "empty rewrite response"));
        }
        Ok(functional.to_string())
    }

    /// Rewrite every record, keeping the input order.
    ///
    /// Any existing functional text is replaced.
    pub fn rewrite(&self, records: &[GeneratedRecord]) -> Result<Vec<ExamplePair>> {
        let total = records.len();
        let mut pairs = Vec::with_capacity(total);
        for (i, record) in records.iter().enumerate() {
            debug!("Rewriting record {} of {}", i + 1, total);
            let functional = self.rewrite_one(&record.dysfunctional_text)?;
            pairs.push(ExamplePair::new(record.dysfunctional_text.clone(), functional));
        }
        info!("Rewrote {} records with {}", pairs.len(), self.model);
        Ok(pairs)
    }
}
