#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![doc = include_str!("../README.md")]

pub use color_eyre::eyre;
pub use tabula_testhelpers_macros::test;

pub mod alloc_tracker;

use log::{Level, LevelFilter, Log, Metadata, Record};
use owo_colors::{OwoColorize, Style};
use std::io::Write;
use std::sync::Once;

struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let level_style = match record.level() {
            Level::Error => Style::new().fg_rgb::<243, 139, 168>(),
            Level::Warn => Style::new().fg_rgb::<249, 226, 175>(),
            Level::Info => Style::new().fg_rgb::<166, 227, 161>(),
            Level::Debug => Style::new().fg_rgb::<137, 180, 250>(),
            Level::Trace => Style::new().fg_rgb::<148, 226, 213>(),
        };

        eprintln!(
            "{} - {}: {}",
            record.level().style(level_style),
            record
                .target()
                .style(Style::new().fg_rgb::<137, 180, 250>()),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Installs color-eyre and color-backtrace (except on miri), and a logger.
///
/// Only the first call in a process does anything.
pub fn setup() {
    static SETUP: Once = Once::new();
    SETUP.call_once(|| {
        #[cfg(not(miri))]
        install_hooks();

        // another harness may have claimed the logger already
        if log::set_boxed_logger(Box::new(SimpleLogger)).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });
}

#[cfg(not(miri))]
fn install_hooks() {
    use color_eyre::config::HookBuilder;
    use regex::Regex;
    use std::sync::LazyLock;

    /// Panic machinery, the test runner and thread plumbing.
    static IGNORE_FRAMES: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^(std::panic|core::panic|test::run_test|__pthread_cond_wait|std::sys::(pal|backtrace)|std::thread::Builder|core::ops::function|test::__rust_begin_short_backtrace|<core::panic::|<alloc::boxed::Box<F,A> as core::ops::function::FnOnce<Args>>::call_once)")
            .unwrap()
    });

    let eyre_filter = move |frames: &mut Vec<&color_eyre::config::Frame>| {
        frames.retain(|frame| {
            frame
                .name
                .as_ref()
                .map(|n| !IGNORE_FRAMES.is_match(&n.to_string()))
                .unwrap_or(true)
        });
    };

    HookBuilder::default()
        .add_frame_filter(Box::new(eyre_filter))
        .install()
        .expect("Failed to set up color-eyre");

    {
        use color_backtrace::{BacktracePrinter, Frame};

        let filter = move |frames: &mut Vec<&Frame>| {
            frames.retain(|frame| {
                frame
                    .name
                    .as_ref()
                    .map(|name| !IGNORE_FRAMES.is_match(name))
                    .unwrap_or(true)
            });
        };

        let stderr = color_backtrace::termcolor::StandardStream::stderr(
            color_backtrace::termcolor::ColorChoice::Auto,
        );
        let printer = BacktracePrinter::new().add_frame_filter(Box::new(filter));
        printer.install(Box::new(stderr));
    }
}
