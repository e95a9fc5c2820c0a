use std::io::{self, Stdout, Write};

use colored::{Color, Colorize};
use treehouse_core::{
    types::{HealthStatus, LogEvent, ServiceStatus, Status, StatusEvent},
    EventSink,
};

/// Headless printer: one colored line per event.
pub struct Logger<W: Write = Stdout> {
    output: W,
}

impl<W: Write> Logger<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }

    pub fn into_inner(self) -> W {
        self.output
    }

    fn color(name: &str) -> Color {
        name.parse().unwrap_or(Color::White)
    }

    pub fn log(&mut self, service_name: &str, color: &str, message: &str) {
        let prefix = format!("[{service_name}]").color(Self::color(color));
        for line in message.lines() {
            let _ = writeln!(self.output, "{prefix} {line}");
        }
    }

    pub fn health(&mut self, service_name: &str, color: &str, message: &str) {
        let prefix = format!("[health][{service_name}]").color(Self::color(color));
        let _ = writeln!(self.output, "{prefix} {message}");
    }

    pub fn system(&mut self, message: &str) {
        let prefix = "[system]".color(Color::Red);
        for line in message.lines() {
            let _ = writeln!(self.output, "{prefix} {line}");
        }
    }
}

impl Logger {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> EventSink for Logger<W> {
    fn on_log(&mut self, event: LogEvent) {
        // One event is exactly one line, blank ones included.
        let prefix = format!("[{}]", event.service).color(Self::color(&event.color));
        let _ = writeln!(self.output, "{prefix} {}", event.line);
    }

    fn on_status(&mut self, event: StatusEvent) {
        let detail = event.detail.as_deref();
        match event.status {
            Status::Health(HealthStatus::Healthy) => self.health(
                &event.service,
                &event.color,
                &format!("success ({})", detail.unwrap_or_default()),
            ),
            Status::Health(HealthStatus::Unhealthy) => self.health(
                &event.service,
                &event.color,
                &format!("failure ({})", detail.unwrap_or("timeout")),
            ),
            Status::Health(HealthStatus::Aborted) => {
                self.health(&event.service, &event.color, "aborted");
            }
            Status::Process(ServiceStatus::Exited) => {
                let message = match detail {
                    Some(detail) => format!("exited ({detail})"),
                    None => "exited".to_owned(),
                };
                self.log(&event.service, &event.color, &message);
            }
            Status::Process(ServiceStatus::Crashed) => {
                let message = match detail {
                    Some(detail) => format!("crashed ({detail})"),
                    None => "crashed".to_owned(),
                };
                self.log(&event.service, &event.color, &message);
            }
            Status::Process(ServiceStatus::Error) => self.log(
                &event.service,
                &event.color,
                &format!("error: {}", detail.unwrap_or("failed to start")),
            ),
            Status::Process(ServiceStatus::Starting | ServiceStatus::Running)
            | Status::Health(HealthStatus::Pending) => {
                tracing::debug!("`{}` is {}", event.service, event.status);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use treehouse_core::types::StreamKind;

    use super::*;

    fn output(logger: Logger<Cursor<Vec<u8>>>) -> String {
        String::from_utf8(logger.into_inner().into_inner()).unwrap()
    }

    fn status(status: impl Into<Status>, detail: Option<&str>) -> StatusEvent {
        StatusEvent {
            service: "api".to_owned(),
            status: status.into(),
            color: "cyan".to_owned(),
            detail: detail.map(str::to_owned),
        }
    }

    #[test]
    fn test_log() {
        let mut logger = Logger::new(Cursor::new(Vec::new()));

        logger.log("test", "bright green", "line1\nline2");

        let service = "[test]".color(Color::BrightGreen);
        let line1 = format!("{service} line1");
        let line2 = format!("{service} line2");
        assert_eq!(output(logger), format!("{line1}\n{line2}\n"));
    }

    #[test]
    fn test_log_event() {
        let mut logger = Logger::new(Cursor::new(Vec::new()));

        logger.on_log(LogEvent {
            service: "web".to_owned(),
            line: "listening".to_owned(),
            color: "blue".to_owned(),
            stream: StreamKind::Stderr,
        });

        let service = "[web]".color(Color::Blue);
        assert_eq!(output(logger), format!("{service} listening\n"));
    }

    #[test]
    fn test_health_lines() {
        let mut logger = Logger::new(Cursor::new(Vec::new()));

        logger.on_status(status(HealthStatus::Healthy, Some("200")));
        logger.on_status(status(HealthStatus::Unhealthy, Some("timeout")));
        logger.on_status(status(HealthStatus::Aborted, None));

        let prefix = "[health][api]".color(Color::Cyan);
        assert_eq!(
            output(logger),
            format!("{prefix} success (200)\n{prefix} failure (timeout)\n{prefix} aborted\n")
        );
    }

    #[test]
    fn test_process_lines() {
        let mut logger = Logger::new(Cursor::new(Vec::new()));

        logger.on_status(status(ServiceStatus::Starting, None));
        logger.on_status(status(ServiceStatus::Running, Some("pid 1")));
        logger.on_status(status(ServiceStatus::Exited, None));
        logger.on_status(status(ServiceStatus::Crashed, Some("exit code 2")));
        logger.on_status(status(ServiceStatus::Error, Some("No such file or directory")));

        let prefix = "[api]".color(Color::Cyan);
        assert_eq!(
            output(logger),
            format!(
                "{prefix} exited\n{prefix} crashed (exit code 2)\n{prefix} error: No such file or directory\n"
            )
        );
    }

    #[test]
    fn test_unknown_color_falls_back() {
        assert_eq!(Logger::<Vec<u8>>::color("not-a-color"), Color::White);
        assert_eq!(Logger::<Vec<u8>>::color("bright magenta"), Color::BrightMagenta);
    }

    #[test]
    fn test_logger_stdout() {
        let _logger = Logger::stdout();
    }
}
