pub(crate) mod category;
pub(crate) mod comment;
pub(crate) mod error;
pub(crate) mod location;
pub(crate) mod policy;
pub(crate) mod post;
pub(crate) mod user;
