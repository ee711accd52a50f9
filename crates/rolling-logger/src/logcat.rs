//! Logcat forwarding for Android builds

use std::fmt::{self, Write as _};

use android_logger::{AndroidLogger, Config};
use log::Log;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

pub struct LogcatLayer {
    logger: AndroidLogger,
}

impl LogcatLayer {
    pub fn new(tag: &str) -> Self {
        let config = Config::default()
            .with_max_level(log::LevelFilter::Trace)
            .with_tag(tag.to_string());
        Self {
            logger: AndroidLogger::new(config),
        }
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

impl<S: Subscriber> Layer<S> for LogcatLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let level = match *meta.level() {
            Level::ERROR => log::Level::Error,
            Level::WARN => log::Level::Warn,
            Level::INFO => log::Level::Info,
            Level::DEBUG => log::Level::Debug,
            Level::TRACE => log::Level::Trace,
        };

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        self.logger.log(
            &log::Record::builder()
                .level(level)
                .target(meta.target())
                .args(format_args!("{}{}", visitor.message, visitor.fields))
                .build(),
        );
    }
}
