//! External UCI engines: the line protocol and the child process behind it.

use std::ffi::OsStr;
use std::io::{BufRead, BufReader, Write};
use std::process::{self, Child, ChildStdin, ChildStdout, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, trace, warn};

use crate::command::{Command, Reply, parse_reply};
use crate::error::MoverError;
use crate::mover::{ExternalMover, Interrupt};

/// A UCI conversation over any pair of streams.
///
/// `input` is what the engine reads, `output` is what it writes.
pub struct UciSession<W, R> {
    input: W,
    output: R,
    depth: u8,
    quit_sent: bool,
}

impl<W: Write, R: BufRead> UciSession<W, R> {
    /// Wrap the streams; searches will run to `depth` plies.
    pub fn new(input: W, output: R, depth: u8) -> Self {
        Self {
            input,
            output,
            depth,
            quit_sent: false,
        }
    }

    /// Perform the `uci`/`uciok` and `isready`/`readyok` exchange.
    pub fn handshake(&mut self) -> Result<(), MoverError> {
        self.send(&Command::Uci)?;
        self.wait_for(&Reply::UciOk)?;
        self.send(&Command::UciNewGame)?;
        self.send(&Command::IsReady)?;
        self.wait_for(&Reply::ReadyOk)
    }

    /// Ask for the best move in `fen` and block until the engine answers.
    pub fn best_move(&mut self, fen: &str) -> Result<String, MoverError> {
        if self.quit_sent {
            return Err(MoverError::NotRunning);
        }
        self.send(&Command::Position {
            fen: fen.to_string(),
        })?;
        self.send(&Command::Go { depth: self.depth })?;

        loop {
            let line = self.read_line()?;
            match parse_reply(&line) {
                Reply::BestMove { best, .. } => return Ok(best),
                Reply::MissingBestMove => return Err(MoverError::Protocol { line }),
                _ => {}
            }
        }
    }

    /// Tell the engine to exit. Only the first call writes anything.
    pub fn quit(&mut self) -> Result<(), MoverError> {
        if self.quit_sent {
            return Ok(());
        }
        self.quit_sent = true;
        self.send(&Command::Quit)
    }

    fn send(&mut self, cmd: &Command) -> Result<(), MoverError> {
        debug!(%cmd, "to engine");
        writeln!(self.input, "{cmd}")?;
        self.input.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, MoverError> {
        let mut line = String::new();
        if self.output.read_line(&mut line)? == 0 {
            return Err(MoverError::Closed);
        }
        let line = line.trim_end().to_string();
        trace!(line = %line, "from engine");
        Ok(line)
    }

    fn wait_for(&mut self, expected: &Reply) -> Result<(), MoverError> {
        loop {
            if parse_reply(&self.read_line()?) == *expected {
                return Ok(());
            }
        }
    }
}

impl<W: Write + Send, R: BufRead + Send> ExternalMover for UciSession<W, R> {
    fn request_best_move(&mut self, fen: &str) -> Result<String, MoverError> {
        self.best_move(fen)
    }

    fn close(&mut self) -> Result<(), MoverError> {
        self.quit()
    }
}

struct Running {
    /// Shared with [`ProcessKiller`] so a stuck search can be ended from outside.
    child: Arc<Mutex<Child>>,
    session: UciSession<ChildStdin, BufReader<ChildStdout>>,
}

fn lock_child(child: &Mutex<Child>) -> MutexGuard<'_, Child> {
    child.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Kills the engine process; a blocked read then fails with [`MoverError::Closed`].
struct ProcessKiller(Arc<Mutex<Child>>);

impl Interrupt for ProcessKiller {
    fn interrupt(&self) {
        let mut child = lock_child(&self.0);
        warn!(pid = child.id(), "killing unresponsive engine");
        if let Err(err) = child.kill() {
            debug!(%err, "engine already gone");
        }
    }
}

/// A UCI engine running as a child process.
///
/// The process is shut down by [`ExternalMover::close`] or, failing that, on drop.
pub struct UciProcess {
    running: Option<Running>,
}

impl UciProcess {
    /// Start `program`, complete the handshake, and search to `depth` on every request.
    pub fn spawn(program: impl AsRef<OsStr>, depth: u8) -> Result<UciProcess, MoverError> {
        let program = program.as_ref();
        let mut child = process::Command::new(program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            reap(&mut child);
            return Err(MoverError::NotRunning);
        };

        let mut session = UciSession::new(stdin, BufReader::new(stdout), depth);
        if let Err(err) = session.handshake() {
            reap(&mut child);
            return Err(err);
        }

        info!(program = %program.to_string_lossy(), depth, "engine ready");
        Ok(UciProcess {
            running: Some(Running {
                child: Arc::new(Mutex::new(child)),
                session,
            }),
        })
    }

    /// Return `true` until the process has been closed.
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }
}

fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

impl ExternalMover for UciProcess {
    fn request_best_move(&mut self, fen: &str) -> Result<String, MoverError> {
        let running = self.running.as_mut().ok_or(MoverError::NotRunning)?;
        running.session.best_move(fen)
    }

    fn close(&mut self) -> Result<(), MoverError> {
        let Some(Running { child, mut session }) = self.running.take() else {
            return Ok(());
        };
        // The engine may already be gone; the child still has to be reaped.
        if let Err(err) = session.quit() {
            debug!(%err, "quit not delivered");
        }
        drop(session);
        let status = lock_child(&child).wait()?;
        debug!(%status, "engine exited");
        Ok(())
    }

    fn interrupter(&self) -> Option<Arc<dyn Interrupt>> {
        let running = self.running.as_ref()?;
        Some(Arc::new(ProcessKiller(Arc::clone(&running.child))))
    }
}

impl Drop for UciProcess {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(%err, "engine did not shut down cleanly");
        }
    }
}
