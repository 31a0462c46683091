//! Reusable prompts using Handlebars for templating. Strict mode is on
//! so a missing variable is an error rather than an empty string.

use std::fmt;

use anyhow::{Error, Result};
use handlebars::Handlebars;
use serde_json::json;

#[derive(Debug)]
pub enum Prompt {
    Persona,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

const PERSONA_PROMPT: &str = r"You are an AI assistant for {{name}}'s portfolio website. Answer questions about their background, skills, projects, and experience using the information below.

{{#if profile}}
{{profile}}
{{else}}
No profile details have been provided. If asked for specifics, say that you don't have that information rather than guessing.
{{/if}}

Be friendly, concise, and accurate. If asked something unrelated to {{name}}'s resume or portfolio, politely redirect the conversation back to their professional background.";

pub fn templates<'a>() -> Handlebars<'a> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    // Output is a plain text prompt, not HTML
    registry.register_escape_fn(handlebars::no_escape);
    registry
        .register_template_string(&Prompt::Persona.to_string(), PERSONA_PROMPT)
        .expect("Failed to register template");
    registry
}

/// Render the system persona for `name`. `profile` is free form
/// markdown (resume, project list) and may be empty.
pub fn render_persona(name: &str, profile: &str) -> Result<String, Error> {
    let rendered = templates().render(
        &Prompt::Persona.to_string(),
        &json!({
            "name": name.trim(),
            "profile": profile.trim(),
        }),
    )?;
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_renders_persona_with_profile() {
        let persona = render_persona("Ada", "## Projects\n1. Engine <Analytical>").unwrap();
        assert!(persona.starts_with("You are an AI assistant for Ada's portfolio website."));
        assert!(persona.contains("1. Engine <Analytical>"));
        assert!(!persona.contains("No profile details"));
        assert!(persona.ends_with("back to their professional background."));
    }

    #[test]
    fn it_renders_persona_without_profile() {
        let persona = render_persona("Ada", "   ").unwrap();
        assert!(persona.contains("No profile details have been provided."));
    }
}
