// Cover letter generation: style knobs, prompt rendering and the generate action.
// All LLM calls go through llm_client; no direct provider calls here.

pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod style;
