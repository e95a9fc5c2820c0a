use tokio::sync::mpsc;
use treehouse_types::{Event, LogEvent, Status, StatusEvent, StreamKind};

/// Capacity of the channel between the running tasks and the consumer loop.
pub const EVENT_BUFFER: usize = 256;

/// Receives everything the orchestrator reports.
///
/// Implemented by front ends; the headless printer lives in the CLI.
pub trait EventSink: Send {
    fn on_log(&mut self, event: LogEvent);
    fn on_status(&mut self, event: StatusEvent);
}

impl EventSink for Vec<Event> {
    fn on_log(&mut self, event: LogEvent) {
        self.push(Event::Log(event));
    }

    fn on_status(&mut self, event: StatusEvent) {
        self.push(Event::Status(event));
    }
}

#[must_use]
pub fn channel() -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    (EventSender { tx }, rx)
}

/// Single consumer loop: forwards every event to `sink` until all senders
/// are gone.
pub async fn pump<S: EventSink + ?Sized>(mut rx: mpsc::Receiver<Event>, sink: &mut S) {
    while let Some(event) = rx.recv().await {
        match event {
            Event::Log(event) => sink.on_log(event),
            Event::Status(event) => sink.on_status(event),
        }
    }
}

/// Sending half handed to each supervisor and health monitor, pre-tagged
/// with the service it reports for.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<Event>,
}

impl EventSender {
    #[must_use]
    pub fn for_service(&self, service: &str, color: &str) -> ServiceEvents {
        ServiceEvents {
            tx: self.tx.clone(),
            service: service.to_owned(),
            color: color.to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceEvents {
    tx: mpsc::Sender<Event>,
    service: String,
    color: String,
}

impl ServiceEvents {
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    pub async fn log(&self, line: String, stream: StreamKind) {
        self.send(Event::Log(LogEvent {
            service: self.service.clone(),
            line,
            color: self.color.clone(),
            stream,
        }))
        .await;
    }

    pub async fn status(&self, status: impl Into<Status>, detail: Option<String>) {
        self.send(Event::Status(StatusEvent {
            service: self.service.clone(),
            status: status.into(),
            color: self.color.clone(),
            detail,
        }))
        .await;
    }

    async fn send(&self, event: Event) {
        if let Err(err) = self.tx.send(event).await {
            tracing::error!("Failed to send event for `{}`: {err}", self.service);
        }
    }
}

#[cfg(test)]
mod tests {
    use treehouse_types::{HealthStatus, ServiceStatus};

    use super::*;

    #[tokio::test]
    async fn test_pump_forwards_in_order() {
        let (tx, rx) = channel();
        let events = tx.for_service("api", "green");
        drop(tx);

        events.status(ServiceStatus::Starting, None).await;
        events.log("hello".to_owned(), StreamKind::Stdout).await;
        events
            .status(HealthStatus::Healthy, Some("200".to_owned()))
            .await;
        drop(events);

        let mut sink: Vec<Event> = Vec::new();
        pump(rx, &mut sink).await;

        assert_eq!(sink.len(), 3);
        assert!(matches!(
            &sink[0],
            Event::Status(StatusEvent { status: Status::Process(ServiceStatus::Starting), .. })
        ));
        assert!(matches!(&sink[1], Event::Log(LogEvent { line, color, .. }) if line == "hello" && color == "green"));
        assert!(matches!(
            &sink[2],
            Event::Status(StatusEvent { status: Status::Health(HealthStatus::Healthy), detail: Some(code), .. }) if code == "200"
        ));
    }
}
