pub mod activity;
pub mod principal;
pub mod submission;

pub use activity::Activity;
pub use principal::{Principal, PrincipalProfile, Role};
pub use submission::{ReviewStatus, Submission};
