//! Row types mirrored from the portal database, split per table.

pub mod application;
pub mod blog_post;
pub mod common;
pub mod project;
pub mod user;

pub use application::*;
pub use blog_post::*;
pub use common::*;
pub use project::*;
pub use user::*;
