//! Describe the state, protocol and members of one or more groups.

pub mod request;
pub mod response;
