pub mod call;

pub use call::{Call, CallStatus, TranscriptEntry};
