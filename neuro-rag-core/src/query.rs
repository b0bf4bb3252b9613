//! Query engine: one question, every available file, one generation call.

use tracing::{error, info};

use crate::config::ModelConfig;
use crate::contract::{ContentPart, GenerateRequest, Generator};
use crate::error::QueryError;
use crate::synchronise::AvailableFileSet;

/// Builds the request sent for `question`: the question text first, then every file in set order.
pub fn build_request(
    model: &ModelConfig,
    question: &str,
    available: &AvailableFileSet,
) -> GenerateRequest {
    let mut contents = Vec::with_capacity(available.len() + 1);
    contents.push(ContentPart::Text(question.to_string()));
    contents.extend(available.iter().map(ContentPart::from));
    GenerateRequest {
        model: model.name.clone(),
        config: model.generation,
        contents,
    }
}

/// Ask the hosted model `question` using the available files as context.
///
/// Fails with [`QueryError::NoDocuments`] before any network call when nothing is loaded.
pub async fn query<G>(
    generator: &G,
    model: &ModelConfig,
    question: &str,
    available: &AvailableFileSet,
) -> Result<String, QueryError>
where
    G: Generator + ?Sized,
{
    if available.is_empty() {
        return Err(QueryError::NoDocuments);
    }

    info!(model = %model.name, files = available.len(), "[QUERY] Sending question");
    let text = generator
        .generate(build_request(model, question, available))
        .await
        .map_err(|e| {
            error!(error = ?e, "[QUERY][ERROR] Generation failed");
            QueryError::Generation(e)
        })?;

    if text.trim().is_empty() {
        error!("[QUERY][ERROR] Model returned no text");
        return Err(QueryError::EmptyResponse);
    }
    info!(chars = text.len(), "[QUERY] Received answer");
    Ok(text)
}
