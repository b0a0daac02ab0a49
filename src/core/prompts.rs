// src/core/prompts.rs — Base instructions for the two roles

use crate::core::types::STOP_MARKER;

pub const BASE_GENERATION_SYSTEM_PROMPT: &str = "\
Your task is to generate the best content possible for the user's request.
If the user provides critique, respond with a revised version of your previous attempt.
You must always output the revised content.";

pub const BASE_REFLECTION_SYSTEM_PROMPT: &str = "\
You are tasked with generating critique and recommendations for the user's generated content.
If the user content has something wrong or something to be improved, output a list of recommendations and critiques.
If the user content is ok and there's nothing to change, output this: <OK>";

/// Caller-supplied prefix, a newline, then the base instruction.
pub fn compose(prefix: &str, base: &str) -> String {
    format!("{prefix}\n{base}")
}

pub fn generation_system_prompt(prefix: &str) -> String {
    compose(prefix, BASE_GENERATION_SYSTEM_PROMPT)
}

/// The base reflection instruction names `<OK>`; a configured marker replaces it.
pub fn reflection_system_prompt(prefix: &str, stop_marker: &str) -> String {
    compose(
        prefix,
        &BASE_REFLECTION_SYSTEM_PROMPT.replace(STOP_MARKER, stop_marker),
    )
}
