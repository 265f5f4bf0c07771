pub mod error;
pub mod value;
pub mod version;

pub use error::{OptLockError, Result};
pub use value::Value;
pub use version::Version;
