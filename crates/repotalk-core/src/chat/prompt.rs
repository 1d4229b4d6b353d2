//! Prompt assembly.
//!
//! A pure function with no I/O: the digest, the prior history, and the new
//! query are embedded into one model-ready string. Section markers are
//! always emitted, even for empty inputs, so the model (and tests) can rely
//! on the prompt's shape.

use repotalk_types::chat::Exchange;

const FRAMING: &str = "You are an expert software engineer answering questions about a code \
repository. Use only the repository context below. When you reference code, name the file it \
comes from. If the answer is not in the repository, say so instead of guessing.";

/// Build the full prompt for one query.
///
/// Embeds, in order: system framing, the directory tree, the file content,
/// the serialized history (each exchange in insertion order), and the new
/// query. The literal `query`, `tree`, and `content` strings always appear
/// verbatim in the output.
pub fn build_prompt(query: &str, history: &[Exchange], tree: &str, content: &str) -> String {
    let mut prompt = String::with_capacity(
        FRAMING.len() + tree.len() + content.len() + query.len() + history.len() * 64 + 256,
    );

    prompt.push_str(FRAMING);
    prompt.push_str("\n\nDirectory Structure:\n");
    prompt.push_str(tree);
    prompt.push_str("\n\nFile Content:\n");
    prompt.push_str(content);

    prompt.push_str("\n\nConversation History:\n");
    if history.is_empty() {
        prompt.push_str("(none)\n");
    } else {
        for exchange in history {
            prompt.push_str("Q: ");
            prompt.push_str(&exchange.query);
            prompt.push_str("\nA: ");
            prompt.push_str(&exchange.response);
            prompt.push('\n');
        }
    }

    prompt.push_str("\nQuestion: ");
    prompt.push_str(query);
    prompt.push('\n');

    prompt
}
