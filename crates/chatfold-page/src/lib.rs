pub mod click;
pub mod dom;
pub mod error;
pub mod scan;
pub mod title;
pub mod walk;

pub use dom::{Element, ElementPath, HostPage, PathStep, SnapshotPage};
pub use error::PageError;
pub use scan::RecentChats;
pub use title::{ResolvedTitle, TitleResolver, TitleSource};
