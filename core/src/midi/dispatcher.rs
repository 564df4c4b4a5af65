use std::any::Any;
use std::collections::HashSet;
use std::iter::FromIterator;
use std::ops::AddAssign;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError};

use log::{debug, error, trace};
use uuid::Uuid;

use crate::midi::event::{EventKind, MidiEvent};
use crate::midi::sink::SinkLock;

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct SinkAddress(Uuid);

impl SinkAddress {
  pub fn new() -> SinkAddress {
    SinkAddress(Uuid::new_v4())
  }
}

/// Tells whether two handles point to the very same sink instance.
pub fn same_sink<A, B>(a: &Arc<A>, b: &Arc<B>) -> bool
where
  A: ?Sized,
  B: ?Sized,
{
  Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// The kinds of events a registered sink wants to receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
  kinds: HashSet<EventKind>,
}

impl Subscription {
  pub fn all() -> Subscription {
    Subscription {
      kinds: HashSet::from_iter(EventKind::ALL.iter().cloned()),
    }
  }

  pub fn none() -> Subscription {
    Subscription {
      kinds: HashSet::new(),
    }
  }

  pub fn kinds(self, kinds: HashSet<EventKind>) -> Subscription {
    Subscription {
      kinds: self.kinds.union(&kinds).cloned().collect(),
    }
  }

  pub fn kind(self, kind: EventKind) -> Subscription {
    self.kinds(HashSet::from_iter(std::iter::once(kind)))
  }

  pub fn without(mut self, kind: EventKind) -> Subscription {
    self.kinds.remove(&kind);
    self
  }

  pub fn accepts(&self, kind: EventKind) -> bool {
    self.kinds.contains(&kind)
  }
}

impl Default for Subscription {
  fn default() -> Subscription {
    Subscription::all()
  }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
  pub delivered: usize,
  pub skipped: usize,
  pub failed: usize,
}

impl AddAssign for DispatchReport {
  fn add_assign(&mut self, rhs: DispatchReport) {
    self.delivered += rhs.delivered;
    self.skipped += rhs.skipped;
    self.failed += rhs.failed;
  }
}

struct Registration {
  address: SinkAddress,
  subscription: Subscription,
  sink: SinkLock,
}

/// Keeps the registered sinks and hands every event to them in registration order.
///
/// A sink that panics is reported and skipped for that event only; the
/// remaining sinks still receive it and the failing one keeps receiving
/// later events.
pub struct Dispatcher {
  registrations: Vec<Registration>,
}

impl Dispatcher {
  pub fn new() -> Dispatcher {
    Dispatcher {
      registrations: Vec::new(),
    }
  }

  pub fn len(&self) -> usize {
    self.registrations.len()
  }

  pub fn is_empty(&self) -> bool {
    self.registrations.is_empty()
  }

  pub fn addresses(&self) -> Vec<SinkAddress> {
    self
      .registrations
      .iter()
      .map(|registration| registration.address)
      .collect()
  }

  pub fn add_sink(&mut self, sink: SinkLock) -> SinkAddress {
    self.subscribe(sink, Subscription::all())
  }

  pub fn subscribe(&mut self, sink: SinkLock, subscription: Subscription) -> SinkAddress {
    let address = SinkAddress::new();
    debug!("(+) sink [{:?}] {:?}", address, subscription);
    self.registrations.push(Registration {
      address,
      subscription,
      sink,
    });
    address
  }

  pub fn get_sink(&self, address: &SinkAddress) -> Option<SinkLock> {
    self
      .registrations
      .iter()
      .find(|registration| registration.address == *address)
      .map(|registration| registration.sink.clone())
  }

  pub fn contains<S>(&self, sink: &Arc<S>) -> bool
  where
    S: ?Sized,
  {
    self
      .registrations
      .iter()
      .any(|registration| same_sink(&registration.sink, sink))
  }

  /// Removes every registration of this very instance.
  pub fn remove_sink<S>(&mut self, sink: &Arc<S>) -> bool
  where
    S: ?Sized,
  {
    let before = self.registrations.len();
    self.registrations.retain(|registration| {
      let same = same_sink(&registration.sink, sink);
      if same {
        debug!("(-) sink [{:?}]", registration.address);
      }
      !same
    });
    self.registrations.len() != before
  }

  pub fn remove_address(&mut self, address: &SinkAddress) -> Option<SinkLock> {
    let index = self
      .registrations
      .iter()
      .position(|registration| registration.address == *address)?;
    debug!("(-) sink [{:?}]", address);
    Some(self.registrations.remove(index).sink)
  }

  pub fn dispatch(&self, event: &MidiEvent) -> DispatchReport {
    let kind = event.kind();
    let mut report = DispatchReport::default();

    trace!("dispatching {} to {} sinks", event, self.registrations.len());

    for registration in self.registrations.iter() {
      if !registration.subscription.accepts(kind) {
        report.skipped += 1;
        continue;
      }

      let mut sink = registration
        .sink
        .write()
        .unwrap_or_else(PoisonError::into_inner);

      let result = panic::catch_unwind(AssertUnwindSafe(|| event.deliver_to(&mut *sink)));

      match result {
        Ok(()) => report.delivered += 1,
        Err(cause) => {
          report.failed += 1;
          error!(
            "Sink [{:?}] failed handling {}: {}",
            registration.address,
            kind.name(),
            panic_message(&*cause)
          );
        }
      }
    }

    report
  }
}

impl Default for Dispatcher {
  fn default() -> Dispatcher {
    Dispatcher::new()
  }
}

fn panic_message(cause: &(dyn Any + Send)) -> &str {
  cause
    .downcast_ref::<&str>()
    .cloned()
    .or_else(|| cause.downcast_ref::<String>().map(String::as_str))
    .unwrap_or("unknown cause")
}
