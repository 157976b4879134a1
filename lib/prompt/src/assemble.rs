//! Few-shot prompt rendering.
//!
//! A prompt is the instruction header, then one `Input` / `Expected Output`
//! block per example in the order given, then the text to transform. The
//! examples section is left out entirely when there are no examples, which is
//! the shape used for plain rewrite requests.

use reframe_core::ExamplePair;

/// Instruction header for turning dysfunctional text into functional language
pub const INSTRUCTION_HEADER: &str = "\
Below is an instruction that describes a task.
Write a response that appropriately completes the request.

### Objective:
Transform the following text, which originates from the context of dysfunctional communication between couples, into functional language.
Make the text actionable or practical, while maintaining a natural, conversational tone.

### Instructions:
1. Review the provided text carefully.
2. Convert the text into functional, everyday language, focusing on making the content actionable and practical.
3. Aim for a conversational tone, as if explaining to a friend, to ensure the paragraph is engaging and accessible.
4. Ensure the transformed text promotes understanding, empathy, and positive communication, suitable for couples or ex-couples who need to interact constructively.
5. Always respond with exactly one transformed text and nothing else: no extra commentary, no alternatives.
";

const EXAMPLES_INTRO: &str = "\
### Examples
Here are some examples of how to convert a dysfunctional text into its functional version:
";

const INPUT_INTRO: &str = "\
### Input
Please transform the following text into functional language:
";

/// Render the full prompt. Pure: identical inputs give identical output.
pub fn assemble(instruction_header: &str, examples: &[ExamplePair], query_text: &str) -> String {
    let mut prompt = String::with_capacity(
        instruction_header.len()
            + query_text.len()
            + examples
                .iter()
                .map(|e| e.dysfunctional_text.len() + e.functional_text.len() + 40)
                .sum::<usize>()
            + 256,
    );

    prompt.push_str(instruction_header.trim_end());
    prompt.push_str("\n\n");

    if !examples.is_empty() {
        prompt.push_str(EXAMPLES_INTRO);
        for example in examples {
            prompt.push_str("\n- Input: ");
            prompt.push_str(example.dysfunctional_text.trim());
            prompt.push_str("\n- Expected Output: ");
            prompt.push_str(example.functional_text.trim());
            prompt.push('\n');
        }
        prompt.push('\n');
    }

    prompt.push_str(INPUT_INTRO);
    prompt.push('\n');
    prompt.push_str(query_text.trim());
    prompt.push('\n');
    prompt
}

/// Few-shot prompt with the default header
pub fn fewshot_prompt(examples: &[ExamplePair], query_text: &str) -> String {
    assemble(INSTRUCTION_HEADER, examples, query_text)
}

/// Zero-shot rewrite prompt for a single dysfunctional text
pub fn rewrite_prompt(dysfunctional_text: &str) -> String {
    assemble(INSTRUCTION_HEADER, &[], dysfunctional_text)
}
