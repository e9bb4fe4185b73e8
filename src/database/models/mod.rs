pub mod group;
pub mod user;

pub use group::{CreateGroup, Group, UpdateGroup};
pub use user::{CreateUser, UpdateUser, User, UserFilter};
