use tracing::{debug, info, warn};

use super::command::Command;
use crate::core::models::EvaluationResult;
use crate::playground::{Evaluate, Share, SnippetTemplate};

const TRUNCATION_MARKER: char = '…';

/// Turns a mention body into a reply.
///
/// Holds no state of its own; the reply depends only on the input text and
/// what the collaborators return.
pub struct Dispatcher {
    template: SnippetTemplate,
    evaluator: Box<dyn Evaluate>,
    sharer: Box<dyn Share>,
    max_output_chars: usize,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        template: SnippetTemplate,
        evaluator: Box<dyn Evaluate>,
        sharer: Box<dyn Share>,
        max_output_chars: usize,
    ) -> Self {
        Self {
            template,
            evaluator,
            sharer,
            max_output_chars,
        }
    }

    /// `text` must already be trimmed and unescaped.
    pub async fn dispatch(&self, user: &str, text: &str) -> Option<String> {
        match Command::parse(text)? {
            Command::Rustc(snippet) => self.rustc(user, snippet).await,
            Command::Crate(_) | Command::Doc(_) | Command::Example(_) => {
                debug!("Command not implemented yet: {}", text);
                None
            }
            Command::Unrecognized(keyword) => {
                debug!("Ignoring unrecognized command !{}", keyword);
                None
            }
        }
    }

    async fn rustc(&self, user: &str, snippet: &str) -> Option<String> {
        let code = self.template.render(snippet);
        match self.evaluator.evaluate(&code).await {
            EvaluationResult::CompileError(output) => {
                let output = truncate_output(&output, self.max_output_chars);
                let link = match self.sharer.share(&code).await {
                    Ok(url) => Some(url),
                    Err(e) => {
                        warn!("Failed to share failing snippet: {}", e);
                        None
                    }
                };
                info!(user, "Snippet failed to compile");
                Some(format_failure(user, &output, link.as_deref()))
            }
            EvaluationResult::Success(output) => {
                let output = truncate_output(&output, self.max_output_chars);
                info!(user, "Snippet ran");
                Some(format_success(user, &output))
            }
            EvaluationResult::Unknown => {
                warn!(user, "Playground gave no usable result");
                None
            }
        }
    }
}

#[must_use]
pub fn format_success(user: &str, output: &str) -> String {
    format!("<@{user}>: :+1:\n```{output}```")
}

#[must_use]
pub fn format_failure(user: &str, output: &str, link: Option<&str>) -> String {
    let mut reply = format!("<@{user}>: :scream_cat:\n```{output}```");
    if let Some(url) = link {
        reply.push_str("\nFor details ");
        reply.push_str(url);
    }
    reply
}

/// Cuts `output` to at most `max_chars` characters, marking the cut.
#[must_use]
pub fn truncate_output(output: &str, max_chars: usize) -> String {
    match output.char_indices().nth(max_chars) {
        Some((idx, _)) if max_chars > 0 => {
            let mut cut = output[..idx].to_string();
            cut.push(TRUNCATION_MARKER);
            cut
        }
        _ => output.to_string(),
    }
}
