use std::thread;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use failure::Fail;
use log::{debug, info};

use crate::config::Decoder as DecoderConfig;
use crate::midi::decoder::Decoder;
use crate::midi::dispatcher::{DispatchReport, Dispatcher, Subscription};
use crate::midi::event::MidiEvent;
use crate::midi::sink::SinkLock;
use crate::time::Timestamp;

#[derive(Debug, Fail)]
pub enum DeliveryError {
  #[fail(display = "Failed to create the MIDI delivery thread: {}", cause)]
  Start { cause: String },

  #[fail(display = "Failed to join the MIDI delivery thread")]
  Stop,

  #[fail(display = "The MIDI delivery thread is not running")]
  Closed,
}

pub enum Protocol {
  Stop,

  /// Raw bytes as received from a source, decoded on the delivery thread.
  Packet { timestamp: Timestamp, data: Vec<u8> },

  Event(MidiEvent),

  AddSink {
    sink: SinkLock,
    subscription: Subscription,
  },

  /// Removes every registration of this very sink instance.
  RemoveSink(SinkLock),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryStats {
  pub packets: usize,
  pub events: usize,
  pub dispatch: DispatchReport,
}

struct DeliveryThread {
  dispatcher: Dispatcher,
  decoder: Decoder,
  stats: DeliveryStats,
}

impl DeliveryThread {
  fn new(dispatcher: Dispatcher, decoder: Decoder) -> DeliveryThread {
    DeliveryThread {
      dispatcher,
      decoder,
      stats: DeliveryStats::default(),
    }
  }

  fn handle_messages(mut self, protocol_rx: Receiver<Protocol>) -> DeliveryStats {
    for msg in protocol_rx.iter() {
      match msg {
        Protocol::Stop => {
          info!("MIDI delivery thread stopped ...");
          break;
        }

        Protocol::Packet { timestamp, data } => {
          self.stats.packets += 1;
          for event in self.decoder.decode(timestamp, &data) {
            self.deliver(&event);
          }
        }

        Protocol::Event(event) => self.deliver(&event),

        Protocol::AddSink { sink, subscription } => {
          self.dispatcher.subscribe(sink, subscription);
        }

        Protocol::RemoveSink(sink) => {
          if !self.dispatcher.remove_sink(&sink) {
            debug!("Sink to remove was not registered");
          }
        }
      }
    }

    self.stats
  }

  fn deliver(&mut self, event: &MidiEvent) {
    self.stats.events += 1;
    self.stats.dispatch += self.dispatcher.dispatch(event);
  }
}

/// Owns the thread where every sink callback runs, one event at a time.
pub struct Delivery {
  handler: JoinHandle<DeliveryStats>,
  protocol_tx: Sender<Protocol>,
}

impl Delivery {
  pub fn new_channel(capacity: usize) -> (Sender<Protocol>, Receiver<Protocol>) {
    crossbeam_channel::bounded::<Protocol>(capacity)
  }

  pub fn new(
    dispatcher: Dispatcher,
    decoder_config: &DecoderConfig,
    channel_capacity: usize,
  ) -> Result<Delivery, DeliveryError> {
    info!("Starting MIDI delivery ...");
    debug!("{} sinks, {:?}", dispatcher.len(), decoder_config);

    let (protocol_tx, protocol_rx) = Self::new_channel(channel_capacity);
    let decoder = Decoder::new(decoder_config);

    thread::Builder::new()
      .name("midi-delivery".into())
      .spawn(move || DeliveryThread::new(dispatcher, decoder).handle_messages(protocol_rx))
      .map_err(|err| DeliveryError::Start {
        cause: err.to_string(),
      })
      .map(|handler| Delivery {
        handler,
        protocol_tx,
      })
  }

  pub fn sender(&self) -> Sender<Protocol> {
    self.protocol_tx.clone()
  }

  /// Registers a sink for the events queued after this call.
  pub fn add_sink(&self, sink: SinkLock, subscription: Subscription) -> Result<(), DeliveryError> {
    self
      .protocol_tx
      .send(Protocol::AddSink { sink, subscription })
      .map_err(|_| DeliveryError::Closed)
  }

  /// Events queued before this call still reach the sink.
  pub fn remove_sink(&self, sink: SinkLock) -> Result<(), DeliveryError> {
    self
      .protocol_tx
      .send(Protocol::RemoveSink(sink))
      .map_err(|_| DeliveryError::Closed)
  }

  /// Delivers everything queued before this call, then joins the thread.
  pub fn stop(self) -> Result<DeliveryStats, DeliveryError> {
    info!("Stopping MIDI delivery ...");

    let Delivery {
      handler,
      protocol_tx,
    } = self;

    protocol_tx
      .send(Protocol::Stop)
      .map_err(|_| DeliveryError::Stop)
      .and_then(|()| handler.join().map_err(|_| DeliveryError::Stop))
  }
}
