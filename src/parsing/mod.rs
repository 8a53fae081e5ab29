pub mod ai_response;

pub use ai_response::parse_ai_response;
