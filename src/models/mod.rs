//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod event;
pub mod participant;
pub mod review;
pub mod user;

// Re-export commonly used models
pub use event::{CreateEventRequest, Event, EventFilter, EventStatus, EventView, UpdateEventRequest};
pub use participant::{
    JoinOutcome, Participant, ParticipationStatus, PaymentOutcome, PaymentOutcomeKind, PaymentStatus,
};
pub use review::{CreateReviewRequest, Review};
pub use user::{CreateUserRequest, User, UserRole};
