// Session-based API client modules
//
// Client for the Pi-hole v6 REST API: password login at `/api/auth`,
// then `sid`-authenticated calls to `/api/dns/blocking`.

pub mod auth;
pub mod client;

pub use client::{SID_HEADER, SessionClient};
