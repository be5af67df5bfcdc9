//! Network defaults and environment variable names.

/// Default WebSocket endpoint (local development server).
pub const DEFAULT_WS_URL: &str = "ws://127.0.0.1:3000/ws";

/// Environment variable holding the endpoint address.
pub const ENDPOINT_ENV: &str = "CHARTFEED_ENDPOINT";

/// Environment variable holding the shared secret.
pub const SECRET_ENV: &str = "CHARTFEED_SECRET";
