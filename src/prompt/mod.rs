use crate::wire::{Content, GenerateContentRequest, GenerationConfig, WireRole};

/// Sampling parameters sent with every call. Not user-configurable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl SamplingParams {
    pub const FIXED: SamplingParams = SamplingParams {
        temperature: 0.7,
        top_k: 32,
        top_p: 0.95,
        max_output_tokens: 8192,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptShape {
    Fresh,
    Refine,
}

impl PromptShape {
    /// Refinement needs both an artifact and at least one earlier turn.
    pub fn select(has_artifact: bool, prior_turns: usize) -> Self {
        if has_artifact && prior_turns > 0 {
            PromptShape::Refine
        } else {
            PromptShape::Fresh
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptShape::Fresh => "generate",
            PromptShape::Refine => "refine",
        }
    }
}

fn system_preamble() -> &'static str {
r#"
You are an AI web developer assistant that generates complete, self-contained HTML files with embedded CSS and JavaScript.

ALWAYS include:
- Proper HTML5 structure with DOCTYPE
- Internal CSS in a <style> tag
- JavaScript functionality in a <script> tag
- Modern design with responsive layout
- Error handling and good UX principles

NEVER:
- Use external dependencies or CDN links
- Return incomplete code
- Return multiple versions or code variations

When given a website description, create a COMPLETE and WORKING implementation.
"#
}

/// Model turn replayed after the preamble so the instruction lands in a fresh user turn.
pub fn preamble_ack() -> &'static str {
    "I understand. I will generate complete, self-contained HTML files with embedded CSS and JavaScript based on the user's requirements."
}

pub fn user_prompt_generate(instruction: &str) -> String {
    format!(
r#"Create a complete, self-contained website for: {instruction}

The response must be a SINGLE HTML file that includes all CSS and JavaScript inline.
The website should look professional, be responsive, and implement the requested functionality.

Return ONLY the full HTML code without any explanations or markdown formatting."#
    )
}

pub fn user_prompt_refine(artifact: &str, instruction: &str) -> String {
    format!(
r#"
I have this existing website code:

```html
{artifact}
```

Please improve it according to the following requirements: {instruction}

Return ONLY the complete, improved HTML code without any explanations or markdown formatting.
"#
    )
}

/// One call's worth of prompt material. Built per call, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_preamble: Option<String>,
    pub prior_artifact: Option<String>,
    pub instruction: String,
    pub sampling: SamplingParams,
}

impl GenerationRequest {
    pub fn fresh(instruction: &str) -> Self {
        Self {
            system_preamble: Some(system_preamble().to_string()),
            prior_artifact: None,
            instruction: instruction.to_string(),
            sampling: SamplingParams::FIXED,
        }
    }

    pub fn refine(artifact: &str, instruction: &str) -> Self {
        Self {
            system_preamble: None,
            prior_artifact: Some(artifact.to_string()),
            instruction: instruction.to_string(),
            sampling: SamplingParams::FIXED,
        }
    }

    pub fn shape(&self) -> PromptShape {
        if self.prior_artifact.is_some() {
            PromptShape::Refine
        } else {
            PromptShape::Fresh
        }
    }

    pub fn to_wire(&self) -> GenerateContentRequest {
        let mut contents = Vec::with_capacity(3);
        match &self.prior_artifact {
            Some(artifact) => {
                contents.push(Content::text(
                    WireRole::User,
                    user_prompt_refine(artifact, &self.instruction),
                ));
            }
            None => {
                if let Some(preamble) = &self.system_preamble {
                    contents.push(Content::text(WireRole::User, preamble.as_str()));
                    contents.push(Content::text(WireRole::Model, preamble_ack()));
                }
                contents.push(Content::text(
                    WireRole::User,
                    user_prompt_generate(&self.instruction),
                ));
            }
        }

        GenerateContentRequest {
            contents,
            generation_config: GenerationConfig {
                temperature: self.sampling.temperature,
                top_k: self.sampling.top_k,
                top_p: self.sampling.top_p,
                max_output_tokens: self.sampling.max_output_tokens,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_artifact_always_means_fresh() {
        for turns in [0, 1, 7] {
            assert_eq!(PromptShape::select(false, turns), PromptShape::Fresh);
        }
        assert_eq!(PromptShape::select(true, 0), PromptShape::Fresh);
        assert_eq!(PromptShape::select(true, 1), PromptShape::Refine);
    }

    #[test]
    fn fresh_request_carries_preamble_and_instruction() {
        let wire = GenerationRequest::fresh("Build a portfolio site").to_wire();
        assert_eq!(wire.contents.len(), 3);
        assert_eq!(wire.contents[0].role, WireRole::User);
        assert!(wire.contents[0].parts[0].text.contains("NEVER:"));
        assert!(wire.contents[0].parts[0].text.contains("CDN links"));
        assert_eq!(wire.contents[1].role, WireRole::Model);
        let user = &wire.contents[2].parts[0].text;
        assert!(user.contains("Create a complete, self-contained website for: Build a portfolio site"));
        assert!(user.contains("Return ONLY the full HTML code"));
    }

    #[test]
    fn refine_request_embeds_artifact_verbatim_without_preamble() {
        let artifact = "<!DOCTYPE html>\n<html>\n  <body>  odd   spacing\t</body>\n</html>";
        let req = GenerationRequest::refine(artifact, "Make the header blue");
        assert_eq!(req.shape(), PromptShape::Refine);
        assert!(req.system_preamble.is_none());

        let wire = req.to_wire();
        assert_eq!(wire.contents.len(), 1);
        let text = &wire.contents[0].parts[0].text;
        assert!(text.contains(&format!("```html\n{artifact}\n```")));
        assert!(text.contains("following requirements: Make the header blue"));
        assert!(text.contains("Return ONLY the complete, improved HTML code"));
    }

    #[test]
    fn sampling_parameters_are_fixed() {
        for req in [GenerationRequest::fresh("a"), GenerationRequest::refine("<p/>", "b")] {
            let cfg = req.to_wire().generation_config;
            assert_eq!(cfg.temperature, 0.7);
            assert_eq!(cfg.top_k, 32);
            assert_eq!(cfg.top_p, 0.95);
            assert_eq!(cfg.max_output_tokens, 8192);
        }
    }
}
