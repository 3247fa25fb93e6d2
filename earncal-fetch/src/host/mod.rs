//! Host APIs available to crumb strategies.
//!
//! - [`http`] - Cookie-jar HTTP session with a fixed browser User-Agent

pub mod http;
