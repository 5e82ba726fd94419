//! # Prompts
//!
//! The coding agent's system instructions and the fixed strings sent to the Coral server.

/// Description this agent registers with the Coral server.
pub const AGENT_DESCRIPTION: &str = "A coding agent that can write code, make necessary changes and correction to code if there is any error according to the library/documentation provided.";

/// Role name carried on the agent's messages.
pub const AGENT_ROLE_NAME: &str = "coding_agent";

/// Instruction submitted to the agent on every loop iteration.
pub const USER_MESSAGE: &str = "[automated] continue collaborating with other agents. make sure to mention agents you intend to communicate with";

pub const CODING_AGENT_TEMPLATE: &str = include_str!("../../prompts/coding_agent.md");

/// A builder for rendering prompts with context.
pub struct PromptRenderer<'a> {
    template: &'a str,
    replacements: Vec<(&'a str, String)>,
}

impl<'a> PromptRenderer<'a> {
    pub fn new(template: &'a str) -> Self {
        Self {
            template,
            replacements: Vec::new(),
        }
    }

    pub fn set(mut self, key: &'a str, value: impl Into<String>) -> Self {
        self.replacements.push((key, value.into()));
        self
    }

    pub fn render(self) -> String {
        let mut result = self.template.to_string();
        for (key, value) in self.replacements {
            result = result.replace(key, &value);
        }

        if let Some(placeholder) = find_placeholder(&result) {
            tracing::error!("[PROMPT RENDER ERROR] Unreplaced placeholder found in output: {}", placeholder);
        }

        result
    }
}

/// First `{{UPPER_CASE}}` placeholder left in `text`.
/// Escaped JSON such as `{{"type": "object"}}` does not count.
fn find_placeholder(text: &str) -> Option<&str> {
    let mut rest = text;
    let mut offset = 0;
    while let Some(start) = rest.find("{{") {
        let open = offset + start;
        let after = &text[open + 2..];
        if let Some(end) = after.find("}}") {
            let name = &after[..end];
            let is_var = !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
            if is_var {
                return Some(&text[open..open + 2 + end + 2]);
            }
        }
        offset = open + 2;
        rest = &text[offset..];
    }
    None
}

/// System instructions with the tool catalog embedded.
pub fn coding_agent_prompt(tools_description: &str) -> String {
    PromptRenderer::new(CODING_AGENT_TEMPLATE)
        .set("{{TOOLS_DESCRIPTION}}", tools_description)
        .render()
}
