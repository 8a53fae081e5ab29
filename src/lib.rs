//*** START FILE: src/lib.rs ***//

// Essay grid-sheet pipeline: normalize, score, locate mistakes, render.
pub mod config;
pub mod error;
pub mod types {
    pub mod essay_data;
}
pub mod parsing;
pub mod sheet;
pub mod scoring;
pub mod render;
pub mod storage;

// Chat-facing layers built on the pipeline
pub mod session;
pub mod essay_service;
pub mod grammar;
pub mod admin;
pub mod chat;

pub use config::Config;
pub use error::{EssayError, Result};
pub use essay_service::{EssayService, FinalizedEssay};
pub use types::essay_data::{EssaySubmission, ScoreResult};

//*** END FILE: src/lib.rs ***//
