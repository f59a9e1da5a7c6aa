//! JSON API routes used by browser scripts.

pub mod media;
