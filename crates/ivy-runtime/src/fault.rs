//! Process-wide panic capture.
//!
//! [`install_panic_hook`] runs once per process and forwards every panic to
//! a [`FaultSink`]. Panics inside command bodies are still caught and
//! reported by the command manager; the hook only makes them (and panics in
//! any other task) visible to event handlers as well.

use std::panic::{self, PanicHookInfo};
use std::sync::OnceLock;

use ivy_framework::{Fault, FaultKind, FaultSink};

static SINK: OnceLock<FaultSink> = OnceLock::new();

/// Installs the panic hook, forwarding panics into `sink`.
///
/// Only the first call installs anything; later calls return `false` and
/// leave the first sink in place. While nobody subscribes to the sink, the
/// previously installed hook (by default the one printing to stderr) runs
/// instead.
pub fn install_panic_hook(sink: FaultSink) -> bool {
    if SINK.set(sink).is_err() {
        return false;
    }

    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let delivered = SINK
            .get()
            .map(|sink| sink.report(fault_from(info)))
            .unwrap_or(0);
        if delivered == 0 {
            previous(info);
        }
    }));
    true
}

/// The sink panics are forwarded to, once a hook is installed.
pub fn installed_sink() -> Option<&'static FaultSink> {
    SINK.get()
}

fn fault_from(info: &PanicHookInfo<'_>) -> Fault {
    let payload = info.payload();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "Box<dyn Any>".to_string());

    let fault = Fault::new(FaultKind::Panic, message);
    match info.location() {
        Some(location) => fault.at(location.to_string()),
        None => fault,
    }
}
