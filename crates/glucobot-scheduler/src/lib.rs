//! `glucobot-scheduler` — in-memory one-shot job scheduler.
//!
//! # Overview
//!
//! [`SchedulerHandle`] is the cheap, cloneable enqueue side used by message
//! handlers; [`SchedulerEngine::run`] polls the queue every tick and forwards
//! each due job exactly once over an mpsc channel. Nothing is persisted: a
//! restart forgets every pending job.
//!
//! Jobs whose instant is already in the past fire on the next tick, and the
//! scheduler never dedupes: scheduling again for a chat with a job still
//! pending yields two independent fires. Repetition of the reminder message
//! itself belongs to the notification loop, not to the scheduler.

pub mod engine;

pub use engine::{SchedulerEngine, SchedulerHandle};
