//! File Session
//!
//! This demo drives real file I/O through the checked `file` protocol.
//!
//! Key concepts:
//! - Actions wrap real `std::fs` calls; their outcome picks the next state
//! - A failed open is an outcome, an I/O error is an action failure
//! - `with_resource` closes the handle when the body bails out early
//! - Session reports tell completed sessions from abandoned ones
//!
//! Run with: RUST_LOG=tenet=debug cargo run --example file_session

use std::cell::RefCell;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;
use tenet::protocols::file::{self, FileOutcome, FileState};
use tenet::session::{run_session, with_resource, Observed, Step};
use tenet::ProtocolError;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
enum DemoError {
    #[error("protocol: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("io: {0}")]
    Io(#[from] io::Error),
    #[error("file already holds a checked write")]
    AlreadyWritten,
}

/// Open `path`, reporting a missing file as `Opened(false)` rather than an error.
fn try_open(path: &Path, write: bool) -> io::Result<(FileOutcome, Option<File>)> {
    let result = if write {
        OpenOptions::new().create(true).append(true).open(path)
    } else {
        File::open(path)
    };
    match result {
        Ok(handle) => Ok((FileOutcome::Opened(true), Some(handle))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok((FileOutcome::Opened(false), None)),
        Err(err) => Err(err),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tenet=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let registry = file::registry()?;
    let target = std::env::temp_dir().join("tenet-file-session.txt");
    let _ = fs::remove_file(&target);

    println!("=== Scripted session: write then close ===");
    let path = target.as_path();
    let writer: &RefCell<Option<File>> = &RefCell::new(None);
    let report = run_session(&registry, file::KIND, FileState::Closed, move |state, observed| {
        match (state, observed) {
            (FileState::Closed, Observed::Start) => Some(Step::new(file::OPEN_WRITE, move || {
                let (outcome, handle) = try_open(path, true)?;
                *writer.borrow_mut() = handle;
                Ok::<_, io::Error>(outcome)
            })),
            (FileState::WriteOpen, _) => Some(Step::new(file::CLOSE, move || {
                if let Some(mut handle) = writer.borrow_mut().take() {
                    writeln!(handle, "checked write")?;
                    handle.flush()?;
                }
                Ok::<_, io::Error>(FileOutcome::Closed)
            })),
            (_, Observed::Failed(err)) => {
                println!("  action failed: {err}");
                None
            }
            _ => None,
        }
    })?;
    println!("  result: {:?}", report.result);
    println!("  path:   {:?}", report.log.get_path());

    println!("\n=== Reading a missing file takes the Opened(false) branch ===");
    let missing = std::env::temp_dir().join("tenet-does-not-exist.txt");
    let handle = registry.instantiate(file::KIND)?;
    let outcome = handle.invoke(file::OPEN_READ, || try_open(&missing, false).map(|(o, _)| o))?;
    println!("  outcome: {outcome:?}, state: {:?}", handle.state());
    println!("  finished: {:?}", handle.finish());

    println!("\n=== Early exit inside with_resource ===");
    let result: Result<(String, _), DemoError> =
        with_resource(&registry, file::KIND, FileState::Closed, |handle| {
            let mut contents = String::new();
            let mut reader = None;
            handle.invoke(file::OPEN_READ, || {
                let (outcome, opened) = try_open(path, false)?;
                reader = opened;
                Ok::<_, io::Error>(outcome)
            })?;
            if let Some(mut reader) = reader {
                reader.read_to_string(&mut contents)?;
            }
            if contents.contains("checked write") {
                // Bail out without closing; cleanup closes the handle.
                return Err(DemoError::AlreadyWritten);
            }
            handle.perform(file::CLOSE, FileOutcome::Closed)?;
            Ok(contents)
        });
    match result {
        Ok((contents, report)) => println!("  read {contents:?}, completed: {}", report.is_completed()),
        Err(err) => println!("  body failed: {err}"),
    }

    println!("\n=== Protocol violation ===");
    let handle = registry.instantiate(file::KIND)?;
    handle.perform(file::OPEN_READ, FileOutcome::Opened(true))?;
    if let Err(err) = handle.perform(file::OPEN_WRITE, FileOutcome::Opened(true)) {
        println!("  refused: {err}");
    }
    handle.perform(file::CLOSE, FileOutcome::Closed)?;

    let _ = fs::remove_file(&target);
    Ok(())
}
