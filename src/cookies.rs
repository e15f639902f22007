// src/cookies.rs
//! Cookies: the [`Record`] contract, the default [`Cookie`] record and header glue.

mod cookie;
mod header;

pub use cookie::Cookie;
pub use cookie::Record;

pub use header::cookies_from_headers;
pub use header::render_cookie_header;
