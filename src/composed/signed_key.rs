mod key_parser;
mod public;
mod secret;
mod shared;

pub use self::public::*;
pub use self::secret::*;
pub use self::shared::*;
