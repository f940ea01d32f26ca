use colored::{ColoredString, Colorize};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::FormatEvent;
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::registry::LookupSpan;

/// Status-line formatter for scan progress: a severity symbol, then the
/// message. Diagnostic lines (`-D` and up) carry the emitting module so
/// verbose output can be traced back to a probe.
pub struct ScanFormatter;

fn symbol(level: Level) -> &'static str {
    match level {
        Level::TRACE => "[ ]",
        Level::DEBUG => "[?]",
        Level::INFO => "[+]",
        Level::WARN => "[*]",
        Level::ERROR => "[-]",
    }
}

fn paint(level: Level, symbol: &str) -> ColoredString {
    match level {
        Level::TRACE => symbol.dimmed(),
        Level::DEBUG => symbol.cyan(),
        Level::INFO => symbol.green().bold(),
        Level::WARN => symbol.yellow().bold(),
        Level::ERROR => symbol.red().bold(),
    }
}

impl<S, N> FormatEvent<S, N> for ScanFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> format::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let level = *meta.level();

        write!(writer, "{} ", paint(level, symbol(level)))?;
        if matches!(level, Level::DEBUG | Level::TRACE) {
            write!(writer, "{} ", meta.target().dimmed())?;
        }
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Installs the global subscriber. Log output goes to stderr; stdout is
/// reserved for scan results.
pub fn init(debug_level: u8, quiet: bool) {
    let default_directive = match debug_level {
        0 if quiet => "warn",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .event_format(ScanFormatter)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
