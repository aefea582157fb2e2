pub mod realtime;

// Re-export commonly used types for convenience
pub use realtime::{
    AudioStream, BaseRealtime, GeminiLive, RealtimeConfig, RealtimeError, RealtimeResult,
    SharedRealtime,
};
