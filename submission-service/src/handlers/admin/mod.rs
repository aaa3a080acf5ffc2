pub mod activities;
pub mod reviews;
pub mod users;

pub use activities::{create_activity, delete_activity, update_activity};
pub use reviews::{batch_review, review_queue, review_submission};
pub use users::{list_users, update_role, user_statistics};
