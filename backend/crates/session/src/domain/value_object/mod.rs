//! Value Objects

pub mod security_stamp;
pub mod user_id;
pub mod user_role;
pub mod user_status;

pub use security_stamp::SecurityStamp;
pub use user_id::UserId;
pub use user_role::UserRole;
pub use user_status::UserStatus;
