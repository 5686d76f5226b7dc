use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::{AppError, AppResult, Persona};

use super::store::QuestionCandidate;

/// What the client sees: options in shuffled order and a token it can
/// decode locally to check an answer. The token is obfuscation, not a
/// security boundary; anyone can decode it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientQuestion {
    pub id: String,
    pub message: String,
    pub options: Vec<Persona>,
    pub answer_token: String,
}

/// Builds the client-safe question: decoys plus the true sender, uniformly
/// shuffled (Fisher–Yates). Options carry only name, color, and badges;
/// provenance stays behind.
pub fn assemble(id: String, candidate: &QuestionCandidate, rng: &mut impl Rng) -> ClientQuestion {
    let mut options: Vec<Persona> = candidate
        .distractors
        .iter()
        .cloned()
        .chain(std::iter::once(candidate.sender.clone()))
        .collect();
    options.shuffle(rng);

    ClientQuestion {
        id,
        message: candidate.message.clone(),
        options,
        answer_token: BASE64.encode(&candidate.sender.name),
    }
}

/// Exact inverse of the token produced by [`assemble`].
pub fn decode_token(token: &str) -> AppResult<String> {
    let bytes = BASE64
        .decode(token)
        .map_err(|_| AppError::Validation("malformed answer token".to_owned()))?;
    String::from_utf8(bytes)
        .map_err(|_| AppError::Validation("malformed answer token".to_owned()))
}
