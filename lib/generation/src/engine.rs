//! Structured generation over a topic catalogue.

use crate::schema::ValidationError;
use crate::state::{transition, TopicEvent, TopicState};
use crate::templates::{topic_prompt, SYSTEM_MESSAGE};
use reframe_core::{
    Error, GeneratedRecord, GenerationConfig, GenerationMode, GenerationRequest, Result,
    SourceConfig, TextGenerator,
};
use tracing::{debug, info, warn};

/// How one topic ended
#[derive(Debug, Clone, PartialEq)]
pub struct TopicReport {
    pub topic: String,
    /// Generation calls made for this topic
    pub attempts: u32,
    pub requested: usize,
    pub produced: usize,
    /// Last validation failure when the topic was aborted
    pub error: Option<ValidationError>,
}

impl TopicReport {
    pub fn is_aborted(&self) -> bool {
        self.error.is_some()
    }
}

/// Records from every topic, in catalogue order, with per-topic reports
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationOutput {
    pub records: Vec<GeneratedRecord>,
    pub topics: Vec<TopicReport>,
}

impl GenerationOutput {
    pub fn requested(&self) -> usize {
        self.topics.iter().map(|t| t.requested).sum()
    }

    pub fn produced(&self) -> usize {
        self.records.len()
    }

    pub fn aborted(&self) -> impl Iterator<Item = &TopicReport> {
        self.topics.iter().filter(|t| t.is_aborted())
    }
}

/// Runs the per-topic state machine against one generation service
pub struct GenerationEngine<G> {
    generator: G,
    model: String,
    temperature: f32,
    pairs_max_attempts: u32,
    dysfunctional_only_max_attempts: u32,
}

impl<G: TextGenerator> GenerationEngine<G> {
    pub fn new(generator: G, model: impl Into<String>, temperature: f32, config: &GenerationConfig) -> Self {
        Self {
            generator,
            model: model.into(),
            temperature,
            pairs_max_attempts: config.pairs_max_attempts.max(1),
            dysfunctional_only_max_attempts: config.dysfunctional_only_max_attempts.max(1),
        }
    }

    /// Engine for one configured source
    pub fn for_source(generator: G, source: &SourceConfig, config: &GenerationConfig) -> Self {
        Self::new(generator, source.model.clone(), source.temperature, config)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_attempts(&self, mode: GenerationMode) -> u32 {
        match mode {
            GenerationMode::Pairs => self.pairs_max_attempts,
            GenerationMode::DysfunctionalOnly => self.dysfunctional_only_max_attempts,
        }
    }

    /// Generate records for every topic in order.
    ///
    /// A topic whose attempts are exhausted contributes no records and the
    /// run moves on. Transport failures stop the run.
    pub fn generate<S: AsRef<str>>(
        &self,
        topics: &[S],
        records_per_topic: usize,
        mode: GenerationMode,
    ) -> Result<GenerationOutput> {
        let mut output = GenerationOutput::default();
        let total = topics.len();

        for (i, topic) in topics.iter().enumerate() {
            let topic = topic.as_ref();
            info!("Generating output {} of {} ({}): {}", i + 1, total, self.model, topic);

            let (records, report) = self.generate_topic(topic, records_per_topic, mode)?;
            output.records.extend(records);
            output.topics.push(report);
        }

        info!(
            "Generated {} records, {} requested ({} topics aborted)",
            output.produced(),
            output.requested(),
            output.aborted().count()
        );
        Ok(output)
    }

    /// Drive one topic from `Pending` to a terminal state
    pub fn generate_topic(
        &self,
        topic: &str,
        records_per_topic: usize,
        mode: GenerationMode,
    ) -> Result<(Vec<GeneratedRecord>, TopicReport)> {
        let max_attempts = self.max_attempts(mode);
        let prompt = topic_prompt(topic, records_per_topic, mode);
        let request = GenerationRequest {
            prompt: &prompt,
            system: Some(SYSTEM_MESSAGE),
            model: &self.model,
            temperature: self.temperature,
        };

        let mut state = TopicState::Pending;
        while !state.is_terminal() {
            let event = match &state {
                TopicState::Pending => TopicEvent::Begin,
                TopicState::Calling { failures } => {
                    debug!("Calling {} (attempt {} of {})", self.model, failures + 1, max_attempts);
                    TopicEvent::Response(self.generator.generate(&request)?)
                }
                TopicState::Validating { .. } => TopicEvent::Validate,
                TopicState::Retry { failures, error } => {
                    warn!(
                        "Invalid response for '{}' ({}), re-running model ({} of {} attempts used)",
                        topic, error, failures, max_attempts
                    );
                    TopicEvent::Resubmit
                }
                TopicState::Success { .. } | TopicState::Aborted { .. } => break,
            };
            state = transition(state, event, mode, max_attempts)
                .map_err(|e| Error::Generation(e.to_string()))?;
        }

        let mut report = TopicReport {
            topic: topic.to_string(),
            attempts: 0,
            requested: records_per_topic,
            produced: 0,
            error: None,
        };
        match state {
            TopicState::Success { records, attempts } => {
                if records.len() != records_per_topic {
                    debug!(
                        "'{}' produced {} records, {} requested",
                        topic,
                        records.len(),
                        records_per_topic
                    );
                }
                report.attempts = attempts;
                report.produced = records.len();
                Ok((records, report))
            }
            TopicState::Aborted { attempts, error } => {
                warn!(
                    "Invalid response for '{}' after {} attempts, aborting topic: {}",
                    topic, attempts, error
                );
                report.attempts = attempts;
                report.error = Some(error);
                Ok((Vec::new(), report))
            }
            other => Err(Error::Generation(format!(
                "topic '{}' stopped in state `{}`",
                topic,
                other.name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    /// Replays canned responses and records every request
    struct ScriptedGenerator {
        responses: RefCell<VecDeque<Result<String>>>,
        fallback: String,
        calls: Cell<usize>,
        prompts: RefCell<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(responses: Vec<Result<String>>, fallback: &str) -> Self {
            Self {
                responses: RefCell::new(responses.into_iter().collect()),
                fallback: fallback.to_string(),
                calls: Cell::new(0),
                prompts: RefCell::new(Vec::new()),
            }
        }

        fn always(raw: &str) -> Self {
            Self::new(Vec::new(), raw)
        }
    }

    impl TextGenerator for ScriptedGenerator {
        fn generate(&self, request: &GenerationRequest<'_>) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            self.prompts.borrow_mut().push(request.prompt.to_string());
            assert_eq!(request.system, Some(SYSTEM_MESSAGE));
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(self.fallback.clone()))
        }
    }

    const ONE_PAIR: &str = r#"[{"dysfunctional": "You never help.", "functional": "Could you help me with this?"}]"#;

    fn config() -> GenerationConfig {
        GenerationConfig {
            pairs_max_attempts: 5,
            dysfunctional_only_max_attempts: 3,
            ..GenerationConfig::default()
        }
    }

    #[test]
    fn test_always_malformed_spends_budget_then_continues() {
        let generator = ScriptedGenerator::new(
            vec![
                Ok("nope".to_string()),
                Ok("nope".to_string()),
                Ok("nope".to_string()),
                Ok("nope".to_string()),
                Ok("nope".to_string()),
            ],
            ONE_PAIR,
        );
        let engine = GenerationEngine::new(&generator, "stub", 0.0, &config());
        let output = engine
            .generate(&["Holidays", "Finances"], 1, GenerationMode::Pairs)
            .unwrap();

        // five failed calls for the first topic, one good call for the second
        assert_eq!(generator.calls.get(), 6);
        assert_eq!(output.topics[0].attempts, 5);
        assert_eq!(output.topics[0].produced, 0);
        assert!(matches!(output.topics[0].error, Some(ValidationError::Malformed(_))));
        assert_eq!(output.topics[1].produced, 1);
        assert_eq!(output.records.len(), 1);
        assert_eq!(output.aborted().count(), 1);
    }

    #[test]
    fn test_dysfunctional_only_budget() {
        let generator = ScriptedGenerator::always("[1, 2, 3]");
        let engine = GenerationEngine::new(&generator, "stub", 0.8, &config());
        let output = engine
            .generate(&["Holidays"], 5, GenerationMode::DysfunctionalOnly)
            .unwrap();

        assert_eq!(generator.calls.get(), 3);
        assert!(output.records.is_empty());
        assert_eq!(output.requested(), 5);
        assert_eq!(output.produced(), 0);
    }

    #[test]
    fn test_fail_then_succeed() {
        let generator = ScriptedGenerator::new(vec![Ok("Here you go: [".to_string())], ONE_PAIR);
        let engine = GenerationEngine::new(&generator, "stub", 0.0, &config());
        let output = engine.generate(&["Holidays"], 1, GenerationMode::Pairs).unwrap();

        assert_eq!(generator.calls.get(), 2);
        assert_eq!(output.records.len(), 1);
        assert_eq!(output.records[0].dysfunctional_text, "You never help.");
        assert_eq!(output.topics[0].attempts, 2);
        assert!(!output.topics[0].is_aborted());

        // retries resend the identical prompt
        let prompts = generator.prompts.borrow();
        assert_eq!(prompts[0], prompts[1]);
    }

    #[test]
    fn test_transport_error_is_fatal() {
        let generator = ScriptedGenerator::new(
            vec![Ok(ONE_PAIR.to_string()), Err(Error::transport("stub", "connection refused"))],
            ONE_PAIR,
        );
        let engine = GenerationEngine::new(&generator, "stub", 0.0, &config());
        let err = engine
            .generate(&["Holidays", "Finances", "School"], 1, GenerationMode::Pairs)
            .unwrap_err();

        assert!(err.is_transport());
        assert_eq!(generator.calls.get(), 2);
    }

    #[test]
    fn test_counts_are_not_adjusted() {
        let three = r#"[
            {"dysfunctional": "a", "functional": "b"},
            {"dysfunctional": "c", "functional": "d"},
            {"dysfunctional": "e", "functional": "f"}
        ]"#;
        let generator = ScriptedGenerator::always(three);
        let engine = GenerationEngine::new(&generator, "stub", 0.0, &config());
        let output = engine.generate(&["Holidays"], 5, GenerationMode::Pairs).unwrap();

        assert_eq!(output.requested(), 5);
        assert_eq!(output.produced(), 3);
    }

    #[test]
    fn test_topics_in_order() {
        let generator = ScriptedGenerator::always(ONE_PAIR);
        let engine = GenerationEngine::new(&generator, "stub", 0.0, &config());
        let topics = vec!["First".to_string(), "Second".to_string()];
        let output = engine.generate(&topics, 2, GenerationMode::Pairs).unwrap();

        let names: Vec<&str> = output.topics.iter().map(|t| t.topic.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
        let prompts = generator.prompts.borrow();
        assert!(prompts[0].contains("'First'"));
        assert!(prompts[1].contains("'Second'"));
        assert!(prompts[0].contains("Provide 2 pairs of sentences."));
    }

    #[test]
    fn test_empty_catalogue() {
        let generator = ScriptedGenerator::always(ONE_PAIR);
        let engine = GenerationEngine::new(&generator, "stub", 0.0, &config());
        let output = engine
            .generate::<&str>(&[], 5, GenerationMode::Pairs)
            .unwrap();
        assert_eq!(generator.calls.get(), 0);
        assert_eq!(output, GenerationOutput::default());
    }
}
