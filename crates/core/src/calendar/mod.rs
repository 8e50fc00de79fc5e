//! Calendar sync: ports, ICS parsing, OAuth state and the orchestrator

pub mod ics;
pub mod oauth_state;
pub mod ports;
pub mod service;

pub use ics::{decode_ics_date, parse_ics, ParsedIcsEvent};
pub use oauth_state::OAuthState;
pub use service::{CalendarSyncService, SyncOutcome};
