//! # Events Module
//!
//! Observer channel for inspection progress and similarity reports.
//!
//! ## Design
//! The core emits events through a channel so that any front end can
//! render progress or print reports. Events are one-way: nothing a
//! listener does can change a verdict.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Report(report) = event {
//!             println!("{}", report);
//!         }
//!     }
//! });
//!
//! report_resnet_similarity(&embedder, &paths, &reference, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{EventChannel, EventReceiver, EventSender, null_sender};
pub use types::*;
