//! The calendar viewer's side of the system: how it reaches Helix, what it remembers
//! within a session, and how zoom and navigation drive loading and rendering.

pub mod auth;
pub mod cache;
pub mod client;
pub mod controller;
pub mod state;
pub mod streamers;
pub mod view;

pub use auth::{ImplicitFlow, UserToken};
pub use cache::{LocalCache, PeriodKey, PeriodLoad};
pub use client::{FetchError, Mode, RemoteClient};
pub use controller::{AddOutcome, Debounce, InputTicket, Notice, Renderer, StreamerTag, Timeline};
pub use state::{Action, Selection, ViewState, ZoomLevel};
pub use streamers::TrackedStreamers;
pub use view::{BroadcastBlock, NavControls, View};
