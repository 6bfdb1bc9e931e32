pub mod attrition;
pub mod comments;
pub mod fleet;
pub mod stats;
pub mod survey;
