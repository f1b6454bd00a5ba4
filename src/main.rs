//! streammark CLI - replay markdown as a stream and print what a viewer
//! would see.
//!
//! Committed blocks go to stdout as they close. With `--pending`, every
//! speculative view is written to stderr as well.

use std::cell::RefCell;
use std::error::Error;
use std::io::{self, Read, Write};
use std::rc::Rc;
use std::time::Duration;

use streammark::{ChunkFeeder, FeedConfig, FeedOutcome, MarkdownMachine, SeriesTable};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str =
    "usage: streammark [FILE|-] [--batch N] [--delay-ms MS] [--series TABLE.json] [--pending]";

struct Args {
    input: Option<String>,
    feed: FeedConfig,
    series: Option<String>,
    pending: bool,
}

fn parse_args() -> Result<Args, Box<dyn Error>> {
    let mut args = Args {
        input: None,
        feed: FeedConfig {
            batch_size: 4,
            rate: Duration::ZERO,
        },
        series: None,
        pending: false,
    };

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--batch" => args.feed.batch_size = it.next().ok_or(USAGE)?.parse()?,
            "--delay-ms" => args.feed.rate = Duration::from_millis(it.next().ok_or(USAGE)?.parse()?),
            "--series" => args.series = Some(it.next().ok_or(USAGE)?),
            "--pending" => args.pending = true,
            "-h" | "--help" => return Err(USAGE.into()),
            "-" => args.input = None,
            _ if arg.starts_with("--") => return Err(format!("unknown flag {arg}\n{USAGE}").into()),
            _ => args.input = Some(arg),
        }
    }
    Ok(args)
}

/// Stream `input` through a machine, writing committed HTML to `out`.
///
/// The first write or machine error cancels the feed and is returned once
/// the current batch is done.
fn replay<W: Write + 'static>(
    input: &str,
    table: SeriesTable,
    feed: FeedConfig,
    mut out: W,
    show_pending: bool,
) -> Result<FeedOutcome, Box<dyn Error>> {
    let write_error: Rc<RefCell<Option<io::Error>>> = Rc::default();
    let errors = write_error.clone();
    let machine = MarkdownMachine::builder(table)
        .on_processed_content(move |html| {
            if let Err(err) = out.write_all(html.as_bytes()).and_then(|()| out.flush()) {
                let mut slot = errors.borrow_mut();
                if slot.is_none() {
                    *slot = Some(err);
                }
            }
        })
        .on_in_processing_content(move |html| {
            if show_pending {
                eprintln!("~ {}", html.trim_end());
            }
        })
        .build();

    let feeder = ChunkFeeder::new(feed)?;
    let cancel = feeder.cancel_handle();
    let mut failure = None;
    let outcome = feeder.feed(input, |chunk, _| {
        failure = machine.eat(chunk).err();
        if failure.is_some() || write_error.borrow().is_some() {
            cancel.cancel();
        }
    });
    if let Some(err) = failure {
        return Err(err.into());
    }
    if let Some(err) = write_error.take() {
        return Err(err.into());
    }

    machine.finish_eating()?;
    if let Some(err) = write_error.take() {
        return Err(err.into());
    }
    Ok(outcome)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = parse_args()?;

    let input = match &args.input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let table = match &args.series {
        Some(path) => SeriesTable::from_json(&std::fs::read_to_string(path)?)?,
        None => SeriesTable::default(),
    };

    let outcome = replay(&input, table, args.feed, io::stdout(), args.pending)?;
    if let FeedOutcome::Completed { delivered } = outcome {
        info!(delivered, "stream replayed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Collects output, or fails every write with a broken pipe.
    struct Pipe {
        buf: Rc<RefCell<Vec<u8>>>,
        writes: Rc<Cell<usize>>,
        broken: bool,
    }

    impl Pipe {
        fn new(broken: bool) -> (Self, Rc<RefCell<Vec<u8>>>, Rc<Cell<usize>>) {
            let buf: Rc<RefCell<Vec<u8>>> = Rc::default();
            let writes: Rc<Cell<usize>> = Rc::default();
            let pipe = Self {
                buf: buf.clone(),
                writes: writes.clone(),
                broken,
            };
            (pipe, buf, writes)
        }
    }

    impl Write for Pipe {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.writes.set(self.writes.get() + 1);
            if self.broken {
                return Err(io::ErrorKind::BrokenPipe.into());
            }
            self.buf.borrow_mut().extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn config(batch_size: usize) -> FeedConfig {
        FeedConfig {
            batch_size,
            rate: Duration::ZERO,
        }
    }

    #[test]
    fn test_replay_writes_committed_html() {
        let (pipe, buf, _) = Pipe::new(false);
        let doc = "# Hi\n\nSome **bold**";
        let outcome = replay(doc, SeriesTable::default(), config(3), pipe, false).unwrap();

        assert!(matches!(outcome, FeedOutcome::Completed { .. }));
        assert_eq!(
            String::from_utf8(buf.borrow().clone()).unwrap(),
            "<h1>Hi</h1>\n<p>Some <strong>bold</strong></p>\n"
        );
    }

    #[test]
    fn test_write_error_stops_replay() {
        let (pipe, _, writes) = Pipe::new(true);
        let doc = "a\n\nb\n\nc\n\nd";
        let err = replay(doc, SeriesTable::default(), config(3), pipe, false).unwrap_err();

        let err = err.downcast::<io::Error>().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(writes.get(), 1);
    }
}
