// Legacy API client modules
//
// Client for the Pi-hole v5 `admin/api.php` endpoint: query-parameter
// actions authenticated by an API key in the `auth` parameter.

pub mod client;

pub use client::{LegacyAction, LegacyClient};
