pub mod decoder;
pub mod delivery;
pub mod dispatcher;
pub mod event;
pub mod sink;
pub mod types;

#[cfg(test)]
mod testing;

pub use self::decoder::Decoder;
pub use self::delivery::{Delivery, DeliveryError, DeliveryStats, Protocol};
pub use self::dispatcher::{same_sink, DispatchReport, Dispatcher, SinkAddress, Subscription};
pub use self::event::{
  EventKind, MidiEvent, MidiObject, Notification, ObjectKind, PropertyChange, SystemCommand,
};
pub use self::sink::{DefaultSink, Diagnostics, DiagnosticsError, MidiEventSink, SinkLock};
