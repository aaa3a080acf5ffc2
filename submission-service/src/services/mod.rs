//! Services layer for the submission backend.
//!
//! The session and access-control core (tokens, revocation, verification
//! codes, rate limits, view checks) plus the domain services built on it.

pub mod access;
pub mod activity;
pub mod admin;
pub mod auth;
pub mod clock;
pub mod content;
mod database;
pub mod email;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod rate_limit;
pub mod repository;
pub mod revocation;
pub mod session;
pub mod storage;
pub mod store;
pub mod submission;
pub mod token;
pub mod user;
pub mod verification;

pub use access::{AccessPolicy, SubmissionAccess, ViewAuthority};
pub use activity::{ActivityInput, ActivityService};
pub use admin::{AdminService, PrincipalStatistics};
pub use auth::{AuthService, AuthServiceDeps};
pub use clock::{Clock, ManualClock, SystemClock};
pub use content::ContentService;
pub use database::PgRepository;
pub use email::{EmailSender, MockEmailSender, SmtpEmailSender};
pub use error::ServiceError;
pub use memory::InMemoryRepository;
pub use rate_limit::{RateLimitPolicies, RateLimiter};
pub use repository::{Page, Paged, Repository};
pub use revocation::RevocationRegistry;
pub use session::{Session, SessionAuthenticator};
pub use storage::{BlobStore, LocalBlobStore};
pub use store::{EphemeralStore, MemoryStore, RedisStore};
pub use submission::{SubmissionService, SubmissionServiceDeps};
pub use token::{AccessClaims, IssuedToken, TokenService};
pub use user::UserService;
pub use verification::VerificationCodeIssuer;
