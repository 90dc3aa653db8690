pub mod confirmation_service;
pub mod event_publisher;
pub mod renewal_worker;
pub mod user_service;

pub use confirmation_service::{
    ConfirmationError, ConfirmationService, RenewalOutcome, VerificationOutcome,
};
pub use event_publisher::{DomainEvent, EventBus, EventLogSink, EventPublisher};
pub use renewal_worker::{RenewalQueue, RenewalWorker};
pub use user_service::{RegisterUserRequest, RegisteredUser, UserService, UserServiceError};
