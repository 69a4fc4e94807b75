//! CLI command implementations.

mod authorize;
mod common;
mod whoami;

pub(crate) use authorize::AuthorizeArgs;
pub(crate) use whoami::WhoamiArgs;
