//! # qg_pacer
//!
//! Client-side pacing for quota-limited HTTP APIs: minimum spacing between
//! requests, a sliding-window cap, and reaction to provider quota headers and
//! 429 rejections.

pub mod clock;
pub mod config;
pub mod error;
pub mod jitter;
pub mod pacer;
pub mod quota;
pub mod request_log;
pub mod shared;

pub use clock::Clock;
pub use clock::ManualClock;
pub use clock::TokioClock;
pub use config::PacerConfig;
pub use config::PacerSettings;
pub use config::SAFETY_MARGIN;
pub use error::PacerError;
pub use error::Result;
pub use jitter::FixedJitter;
pub use jitter::Jitter;
pub use jitter::NoJitter;
pub use jitter::UniformJitter;
pub use pacer::Pacer;
pub use pacer::PacerBuilder;
pub use pacer::TOO_MANY_REQUESTS;
pub use quota::HeaderSource;
pub use quota::QuotaSignal;
pub use request_log::RequestLog;
pub use shared::SharedPacer;
