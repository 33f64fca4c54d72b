//! # Events Module
//!
//! Event-driven progress reporting for any UI layer.
//!
//! ## Design
//! - `EventChannel` - one producer, one consumer. A rename batch mirrors
//!   its progress stream onto it.
//! - `Broadcaster` - many subscribers, no history. The folder monitor
//!   publishes what it observes and does through one.
//! - `StateHolder` - a broadcaster that caches the last value and replays
//!   it to late subscribers. The folder monitor status lives in one.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Rename(RenameEvent::Progress(p)) = event {
//!             println!("{}% {}", p.percent(), p.item.name);
//!         }
//!     }
//! });
//!
//! executor.run_with_events(items, config, CancellationToken::new(), &sender);
//! ```

mod broadcast;
mod channel;
mod types;

pub use broadcast::{Broadcaster, StateHolder};
pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
