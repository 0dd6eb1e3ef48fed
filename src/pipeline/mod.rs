//! Stages of a single upload.
//!
//! Each submodule does one thing and is tested on its own. The network call
//! itself lives in [`crate::client`], which drives these stages in order.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ form ──▶ (POST, watched by idle) ──▶ images
//! (path)   (multipart)                            (data URI → .png)
//! ```
//!
//! 1. [`input`]: confirm the file exists, is readable and is a regular file
//! 2. [`form`]: stream the file into a two-part multipart body, reporting
//!    progress per chunk
//! 3. [`idle`]: last-activity watchdog used by both transfer directions
//! 4. [`images`]: decode the returned data URIs and write them to disk

pub mod form;
pub mod idle;
pub mod images;
pub mod input;
