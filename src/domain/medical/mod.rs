//! Medical query domain: modes, safety validation, prompts and answer scoring

mod answer;
mod attachment;
mod mode;
mod prompt;
mod validator;

pub use answer::{confidence_score, detect_medications, AiAnswer};
pub use attachment::{
    ImageAttachment, INVALID_IMAGE_MESSAGE, MAX_IMAGE_BYTES, MAX_IMAGE_DIMENSION,
};
pub use mode::QueryMode;
pub use prompt::{consultation_prompt, imaging_prompt};
pub use validator::{
    InvalidReason, QueryValidator, ValidationOutcome, EMERGENCY_KEYWORDS, EMERGENCY_MESSAGE,
    MAX_QUERY_CHARS, MEDICAL_DISCLAIMER, MIN_QUERY_CHARS,
};
