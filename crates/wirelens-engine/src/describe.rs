use serde_json::json;
use wirelens_contracts::RelayError;

use crate::gateway::{CompletionOptions, InferenceGateway};

/// Fixed rewriting rubric: simplify the procedure for the stated
/// cognitive/disability profile, avoid directional and spatial
/// vocabulary, allow more steps than the source, Korean output only.
const ADAPTATION_RUBRIC: &str = "\
You can only answer in korean, without using emoticons.\n\
First Text contains a sequence of instructions, and Second Text contains a Description of the degree and type of disability.\n\
Because the recipient has an intellectual disability, the easier it is to explain it to them, the better.\n\
Also, the recipients have no understanding of the arrangement. The concepts of vertical, horizontal, and direction are also confusing.\n\n\
So re-write those instructions depending on the degree and type of disability, in the following format (You can write a description by generating more orders than the given order.):\n\n\
1. ...\n\
2. ...\n\
3. ...\n\
...\n\n\
If the text does not contain a sequence of instructions, then simply write \"제공된 설명문 없음\"";

/// Rewrites a plain-language assembly procedure for a reader profile.
/// One round trip through the gateway; no caching, no parsing beyond
/// trimming. Gateway failures propagate unchanged.
pub async fn adapt_description(
    gateway: &dyn InferenceGateway,
    options: &CompletionOptions,
    base_procedure: &str,
    profile: &str,
) -> Result<String, RelayError> {
    let messages = vec![
        json!({"role": "system", "content": ADAPTATION_RUBRIC}),
        json!({"role": "user", "content": format!("{profile}{base_procedure}")}),
    ];
    let reply = gateway.complete(&messages, options).await?;
    Ok(reply.trim().to_string())
}
