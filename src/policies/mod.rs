//! Cooldown policies.
//!
//! ## Contents
//! - [`BackoffPolicy`] how the under-reschedule cooldown grows (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization to desynchronize profiles
//!
//! ## Quick wiring
//! ```text
//! SchedulerConfig { cooldown: BackoffPolicy, .. }
//!      └─► core::worker, after each execution:
//!           - delay = scheduled_at - now
//!           - cooldown.is_strike(delay) → scheduled_at = now + cooldown.delay_for(strikes), strikes += 1
//!           - otherwise strikes = 0
//! ```

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
