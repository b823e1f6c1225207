pub mod policy;
pub mod post;
pub mod report;
