pub mod identity;
pub mod profile;
pub mod text;
pub mod types;

pub use identity::IdentityCodec;
pub use profile::HostProfile;
pub use types::*;
