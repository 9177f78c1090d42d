use derive_new::new;
use serde::{Deserialize, Serialize};

pub use broadcast::*;
pub use helix::*;
pub use identity::*;
pub use login::*;

mod broadcast;
mod helix;
mod identity;
mod login;

pub use crate::time::Timestamp;
