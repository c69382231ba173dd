//! Fixed wording used by the answer composer.

/// Prompts and canned replies for one product's support assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    /// Product name interpolated into the question prompt.
    pub product: String,
    /// System message sent ahead of every completion request.
    pub system_prompt: String,
    /// Reply to greetings when no documentation matched.
    pub greeting: String,
    /// Reply to "who are you" style questions when no documentation matched.
    pub capabilities: String,
    /// Reply to anything else when no documentation matched.
    pub fallback: String,
}

impl Persona {
    /// User message wrapping the question and its numbered context block.
    pub fn question_prompt(&self, query: &str, context: &str) -> String {
        format!(
            "Question about {} API: {}\n\nRelevant documentation:\n{}",
            self.product, query, context
        )
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            product: "CrustData".to_string(),
            system_prompt: "You are CrustData's API support specialist. \
                Provide accurate, technical information about CrustData's APIs based on the context. \
                Keep responses concise and technical. If information is not in the context, \
                clearly state that and suggest contacting CrustData support."
                .to_string(),
            greeting: "Hello! I'm the CrustData API assistant. I can help you with \
                authentication, the company and people endpoints, search filters, and \
                request examples. What would you like to know?"
                .to_string(),
            capabilities: "I'm a support assistant for CrustData's APIs. I answer questions \
                using the official API documentation: how to authenticate, which endpoints \
                exist, what parameters they take, and what their responses look like. \
                Ask me about any endpoint and I'll walk you through it."
                .to_string(),
            fallback: "I couldn't find anything about that in the CrustData API documentation. \
                I can help with topics such as:\n\
                - Authentication and API tokens\n\
                - Company data and company search endpoints\n\
                - People data and people search endpoints\n\
                - Filters, pagination, and rate limits\n\n\
                For everything else, see the documentation at https://docs.crustdata.com \
                or contact CrustData support."
                .to_string(),
        }
    }
}

/// Renders search hits as `Document N:` sections, numbered from 1.
pub fn render_context<'a, I>(chunks: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, text)| format!("Document {}:\n{}\n", i + 1, text))
        .collect::<Vec<_>>()
        .join("\n")
}
