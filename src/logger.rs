//! Per-client logging handle
//!
//! Each client owns a [`ClientLogger`] instead of sharing a global logger. The
//! logger carries a span tagged with the target host and an enabled flag, so
//! two clients in one process can log (or stay quiet) independently.

use std::time::Duration;

use tracing::{debug, error, info, info_span, warn, Span};

use crate::error::RemoteError;

/// Structured event sink for one client
#[derive(Debug, Clone)]
pub struct ClientLogger {
    enabled: bool,
    span: Span,
}

impl ClientLogger {
    /// Create a logger for a client talking to `host`
    pub fn new(host: &str, enabled: bool) -> Self {
        let span = if enabled {
            info_span!("linux_remote", host = %host)
        } else {
            Span::none()
        };
        Self { enabled, span }
    }

    /// A logger that emits nothing
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            span: Span::none(),
        }
    }

    /// Whether events are emitted
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn emit(&self, f: impl FnOnce()) {
        if self.enabled {
            self.span.in_scope(f);
        }
    }

    pub(crate) fn connecting(&self, address: &str, username: &str) {
        self.emit(|| debug!(%address, %username, "connecting"));
    }

    pub(crate) fn host_key(&self, host: &str, fingerprint: &dyn std::fmt::Display) {
        self.emit(|| debug!(%host, %fingerprint, "accepting server host key"));
    }

    pub(crate) fn auth_attempt(&self, method: &str, username: &str) {
        self.emit(|| debug!(%method, %username, "attempting authentication"));
    }

    pub(crate) fn authenticated(&self, method: &str) {
        self.emit(|| info!(%method, "authentication successful"));
    }

    pub(crate) fn connected(&self, address: &str, username: &str) {
        self.emit(|| info!(%address, %username, "connection established"));
    }

    pub(crate) fn connect_failed(&self, address: &str, err: &RemoteError) {
        self.emit(|| error!(%address, error = %err, "connection failed"));
    }

    pub(crate) fn closed(&self) {
        self.emit(|| debug!("connection closed"));
    }

    pub(crate) fn dropped_open(&self) {
        self.emit(|| warn!("connection dropped without close, releasing session"));
    }

    pub(crate) fn dispatched(&self, command: &str) {
        self.emit(|| info!(%command, "COMMAND"));
    }

    pub(crate) fn completed(&self, exited: i32, stdout: Option<&str>) {
        self.emit(|| info!(exited, stdout = stdout.unwrap_or(""), "RESULT"));
    }

    pub(crate) fn stderr(&self, stderr: &str) {
        self.emit(|| warn!(%stderr, "STDERR"));
    }

    pub(crate) fn signalled(&self, signal: &dyn std::fmt::Debug) {
        self.emit(|| warn!(?signal, "remote process terminated by signal"));
    }

    pub(crate) fn channel_finished(&self, exit_status: Option<u32>, stdout_len: usize, stderr_len: usize) {
        self.emit(|| debug!(?exit_status, stdout_len, stderr_len, "channel closed"));
    }

    pub(crate) fn command_failed(&self, command: &str, err: &RemoteError) {
        self.emit(|| error!(%command, error = %err, "command failed"));
    }

    pub(crate) fn transferred(&self, direction: &str, from: &str, to: &str) {
        self.emit(|| info!(%from, %to, "{}", direction));
    }

    pub(crate) fn transfer_bytes(&self, direction: &str, bytes: usize, remote: &str) {
        self.emit(|| debug!(%direction, bytes, %remote, "sftp transfer finished"));
    }

    pub(crate) fn local_finished(&self, command: &str, code: i32) {
        self.emit(|| debug!(%command, code, "local command completed"));
    }

    pub(crate) fn local_timed_out(&self, command: &str, timeout: Duration) {
        self.emit(|| warn!(%command, ?timeout, "local command timed out, process killed"));
    }
}

impl Default for ClientLogger {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
pub(crate) mod capture {
    //! A subscriber layer that records what reaches it

    use std::sync::{Arc, Mutex};

    use tracing::field::{Field, Visit};
    use tracing::span::{Attributes, Id};
    use tracing::subscriber::DefaultGuard;
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    #[derive(Debug, Default)]
    pub struct Captured {
        pub spans: Vec<String>,
        pub events: Vec<String>,
    }

    #[derive(Clone, Default)]
    pub struct Recorder(Arc<Mutex<Captured>>);

    impl Recorder {
        /// Install the recorder as this thread's default subscriber
        pub fn install() -> (Self, DefaultGuard) {
            let recorder = Self::default();
            let subscriber = tracing_subscriber::registry().with(recorder.clone());
            let guard = tracing::subscriber::set_default(subscriber);
            (recorder, guard)
        }

        pub fn span_count(&self) -> usize {
            self.0.lock().unwrap().spans.len()
        }

        pub fn events(&self) -> Vec<String> {
            self.0.lock().unwrap().events.clone()
        }
    }

    struct Message(String);

    impl Visit for Message {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{:?}", value);
            }
        }
    }

    impl<S: Subscriber> Layer<S> for Recorder {
        fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
            self.0
                .lock()
                .unwrap()
                .spans
                .push(attrs.metadata().name().to_string());
        }

        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut message = Message(String::new());
            event.record(&mut message);
            self.0.lock().unwrap().events.push(message.0);
        }
    }
}
