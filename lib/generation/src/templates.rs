//! Topic prompts for synthetic data generation.

use reframe_core::GenerationMode;

/// System instruction sent with every generation call
pub const SYSTEM_MESSAGE: &str = "\
You are an AI assistant that outputs only JSON data.
Do not include any text before or after the JSON response.";

const TASK: &str = "\
Generate examples of dysfunctional and toxic language that might be encountered between couples or
ex-couples who have to continuously interact.";

const DYSFUNCTIONAL_ENTRY: &str = "\
A sentence reflecting dysfunctional communication, showcasing various forms of toxicity such as
insults, harassment, threats, manipulation, and derogatory remarks.";

const FUNCTIONAL_ENTRY: &str =
    "A transformed version of the same sentence that represents functional, healthy communication.";

const PAIRS_FORMAT: &str = r#"[
    {
        "dysfunctional": "write here the dysfunctional text",
        "functional": "write here the functional text"
    },
    {
        "dysfunctional": "write here the dysfunctional text",
        "functional": "write here the functional text"
    }
]"#;

const DYSFUNCTIONAL_FORMAT: &str = r#"[
    {
        "dysfunctional": "write here the dysfunctional text"
    },
    {
        "dysfunctional": "write here the dysfunctional text"
    }
]"#;

/// Build the prompt asking for `count` records about `topic`
pub fn topic_prompt(topic: &str, count: usize, mode: GenerationMode) -> String {
    let (entries, unit, format) = match mode {
        GenerationMode::Pairs => (
            format!("1 - {}\n\n2 - {}", DYSFUNCTIONAL_ENTRY, FUNCTIONAL_ENTRY),
            "pairs of sentences",
            PAIRS_FORMAT,
        ),
        GenerationMode::DysfunctionalOnly => (
            format!("1 - {}", DYSFUNCTIONAL_ENTRY),
            "sentences",
            DYSFUNCTIONAL_FORMAT,
        ),
    };

    format!(
        "{task}\n\n\
         Each entry should include:\n\n\
         {entries}\n\n\
         Ensure the sentences are realistic and diverse in terms of content and context.\n\
         The sentences should refer to this issue category:\n\
         '{topic}'\n\n\
         Provide {count} {unit}.\n\n\
         Always respond only with valid JSON format and nothing else.\n\
         Do not include any text before or after the JSON.\n\n\
         You must provide the output exactly in the following format:\n\n\
         {format}\n",
        task = TASK,
        entries = entries,
        topic = topic,
        count = count,
        unit = unit,
        format = format,
    )
}
