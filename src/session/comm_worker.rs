//! The communication worker (spec.md §4.2–4.3): owns the client socket,
//! implements the protocol state machine, mediates between client frames
//! and the goal worker's queues, emits heartbeats, and handles draining
//! of stale async results.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::session::command::{parse_command, Command};
use crate::session::goal_worker::{GoalRequest, OutboxMessage};
use crate::session::pair::{CancelOutcome, PairState};
use crate::wire::{frame, Reply};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(2);

/// Why the communication worker stopped running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// `close` was received: the client asked to end this session.
    CleanClose,
    /// `quit` was received: the whole server process should stop.
    Quit,
    /// The greeting frame's password did not match byte-for-byte
    /// (spec.md §4.2 step 1). A deliberate protocol termination, not an
    /// infrastructure failure — never triggers halt-on-connection-loss.
    PasswordMismatch,
    /// Socket I/O failure, frame desync beyond recovery, or the goal
    /// worker died — spec.md §4.2 "Disconnect path".
    Abnormal,
}

impl DisconnectReason {
    /// Whether this disconnect is the "unexpected" kind that should
    /// trigger the embedded-mode halt-on-connection-loss policy
    /// (spec.md §4.2 "Disconnect path").
    pub fn is_unexpected(&self) -> bool {
        matches!(self, DisconnectReason::Abnormal)
    }
}

/// Result of the greeting exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GreetOutcome {
    Ok,
    Mismatch,
    Abnormal,
}

pub struct CommWorker<R, W> {
    reader: R,
    writer: W,
    pair: Arc<PairState>,
    goal_inbox: mpsc::Sender<GoalRequest>,
    goal_outbox: mpsc::UnboundedReceiver<OutboxMessage>,
    goal_handle: tokio::task::JoinHandle<()>,
}

impl<R, W> CommWorker<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(
        reader: R,
        writer: W,
        pair: Arc<PairState>,
        goal_inbox: mpsc::Sender<GoalRequest>,
        goal_outbox: mpsc::UnboundedReceiver<OutboxMessage>,
        goal_handle: tokio::task::JoinHandle<()>,
    ) -> Self {
        CommWorker {
            reader,
            writer,
            pair,
            goal_inbox,
            goal_outbox,
            goal_handle,
        }
    }

    /// Greeting state (spec.md §4.2 step 1).
    pub async fn greet(&mut self, password: &[u8]) -> GreetOutcome {
        let payload = match frame::read_frame(&mut self.reader).await {
            Ok(payload) => payload,
            Err(_) => return GreetOutcome::Abnormal,
        };
        if constant_time_eq(payload.as_bytes(), password) {
            debug!(comm_id = %self.pair.comm_id, "handshake accepted");
            let reply = Reply::handshake_ok(&self.pair.comm_id, &self.pair.goal_id);
            if frame::write_frame(&mut self.writer, &reply.to_payload())
                .await
                .is_err()
            {
                return GreetOutcome::Abnormal;
            }
            GreetOutcome::Ok
        } else {
            warn!(comm_id = %self.pair.comm_id, "handshake password mismatch");
            let reply = Reply::exception_tag("password_mismatch");
            let _ = frame::write_frame(&mut self.writer, &reply.to_payload()).await;
            GreetOutcome::Mismatch
        }
    }

    /// Ready/Running/Draining/Terminal states (spec.md §4.2 steps 2–6).
    pub async fn serve(mut self) -> DisconnectReason {
        loop {
            let payload = match frame::read_frame(&mut self.reader).await {
                Ok(payload) => payload,
                Err(_) => return self.abort_and_finish(DisconnectReason::Abnormal).await,
            };

            let command = match parse_command(&payload) {
                Ok(command) => command,
                Err(tag) => {
                    if self.reply(Reply::exception_tag(tag)).await.is_err() {
                        return self.abort_and_finish(DisconnectReason::Abnormal).await;
                    }
                    continue;
                }
            };

            let outcome = match command {
                Command::Run { goal_text, timeout } => self.handle_run(goal_text, timeout).await,
                Command::RunAsync {
                    goal_text,
                    timeout,
                    find_all,
                } => self.handle_run_async(goal_text, timeout, find_all).await,
                Command::AsyncResult { timeout } => self.handle_async_result(timeout).await,
                Command::CancelAsync => self.handle_cancel_async().await,
                Command::Close => self.handle_close().await,
                Command::Quit => self.handle_quit().await,
            };

            match outcome {
                Ok(Some(reason)) => return self.finish(reason),
                Ok(None) => continue,
                Err(()) => return self.abort_and_finish(DisconnectReason::Abnormal).await,
            }
        }
    }

    /// Abort the goal worker task outright — used when the connection
    /// never makes it out of the greeting state.
    pub fn abort_goal(&self) {
        self.goal_handle.abort();
    }

    async fn reply(&mut self, reply: Reply) -> std::io::Result<()> {
        frame::write_frame(&mut self.writer, &reply.to_payload()).await
    }

    /// Drain stale outbox results from a previous async session before
    /// dispatching a new `run`/`run_async` (spec.md §4.2 step 5).
    async fn drain(&mut self, heartbeat: bool) -> Result<(), ()> {
        if !self.pair.query_in_progress() {
            return Ok(());
        }
        loop {
            if heartbeat {
                tokio::select! {
                    msg = self.goal_outbox.recv() => {
                        match msg {
                            Some(m) if m.terminal => break,
                            Some(_) => continue,
                            None => return Err(()),
                        }
                    }
                    _ = tokio::time::sleep(HEARTBEAT_INTERVAL) => {
                        if frame::write_heartbeat(&mut self.writer).await.is_err() {
                            return Err(());
                        }
                    }
                }
            } else {
                match self.goal_outbox.recv().await {
                    Some(m) if m.terminal => break,
                    Some(_) => continue,
                    None => return Err(()),
                }
            }
        }
        self.pair.set_query_in_progress(false);
        Ok(())
    }

    async fn handle_run(&mut self, goal_text: String, timeout: i64) -> Result<Option<DisconnectReason>, ()> {
        if self.drain(true).await.is_err() {
            let _ = self.reply(Reply::exception_tag("connection_failed")).await;
            return Err(());
        }

        self.pair.set_query_in_progress(true);
        if self
            .goal_inbox
            .send(GoalRequest {
                goal_text,
                timeout,
                find_all: true,
            })
            .await
            .is_err()
        {
            let _ = self.reply(Reply::exception_tag("connection_failed")).await;
            return Err(());
        }

        loop {
            tokio::select! {
                msg = self.goal_outbox.recv() => {
                    match msg {
                        Some(m) => {
                            if m.terminal {
                                self.pair.set_query_in_progress(false);
                            }
                            if self.reply(m.reply).await.is_err() {
                                return Err(());
                            }
                            return Ok(None);
                        }
                        None => {
                            let _ = self.reply(Reply::exception_tag("connection_failed")).await;
                            return Err(());
                        }
                    }
                }
                _ = tokio::time::sleep(HEARTBEAT_INTERVAL) => {
                    if frame::write_heartbeat(&mut self.writer).await.is_err() {
                        return Err(());
                    }
                }
            }
        }
    }

    async fn handle_run_async(
        &mut self,
        goal_text: String,
        timeout: i64,
        find_all: bool,
    ) -> Result<Option<DisconnectReason>, ()> {
        if self.drain(false).await.is_err() {
            let _ = self.reply(Reply::exception_tag("connection_failed")).await;
            return Err(());
        }

        self.pair.set_query_in_progress(true);
        if self
            .goal_inbox
            .send(GoalRequest {
                goal_text,
                timeout,
                find_all,
            })
            .await
            .is_err()
        {
            self.pair.set_query_in_progress(false);
            let _ = self.reply(Reply::exception_tag("connection_failed")).await;
            return Err(());
        }

        if self.reply(Reply::Success(vec![Vec::new()])).await.is_err() {
            return Err(());
        }
        Ok(None)
    }

    async fn handle_async_result(&mut self, timeout: i64) -> Result<Option<DisconnectReason>, ()> {
        if !self.pair.query_in_progress() {
            if self.reply(Reply::exception_tag("no_query")).await.is_err() {
                return Err(());
            }
            return Ok(None);
        }

        let received = if timeout < 0 {
            self.goal_outbox.recv().await
        } else if timeout == 0 {
            match self.goal_outbox.try_recv() {
                Ok(m) => Some(m),
                Err(mpsc::error::TryRecvError::Empty) => {
                    if self
                        .reply(Reply::exception_tag("result_not_available"))
                        .await
                        .is_err()
                    {
                        return Err(());
                    }
                    return Ok(None);
                }
                Err(mpsc::error::TryRecvError::Disconnected) => None,
            }
        } else {
            match tokio::time::timeout(Duration::from_secs(timeout as u64), self.goal_outbox.recv())
                .await
            {
                Ok(received) => received,
                Err(_) => {
                    if self
                        .reply(Reply::exception_tag("result_not_available"))
                        .await
                        .is_err()
                    {
                        return Err(());
                    }
                    return Ok(None);
                }
            }
        };

        match received {
            Some(m) => {
                if m.terminal {
                    self.pair.set_query_in_progress(false);
                }
                if self.reply(m.reply).await.is_err() {
                    return Err(());
                }
                Ok(None)
            }
            None => {
                let _ = self.reply(Reply::exception_tag("connection_failed")).await;
                Err(())
            }
        }
    }

    async fn handle_cancel_async(&mut self) -> Result<Option<DisconnectReason>, ()> {
        let reply = match self.pair.try_cancel() {
            CancelOutcome::Injected | CancelOutcome::PendingResultsOnly => {
                Reply::Success(vec![Vec::new()])
            }
            CancelOutcome::NoQuery => Reply::exception_tag("no_query"),
        };
        if self.reply(reply).await.is_err() {
            return Err(());
        }
        Ok(None)
    }

    async fn handle_close(&mut self) -> Result<Option<DisconnectReason>, ()> {
        self.goal_handle.abort();
        if self.reply(Reply::Success(vec![Vec::new()])).await.is_err() {
            return Err(());
        }
        Ok(Some(DisconnectReason::CleanClose))
    }

    async fn handle_quit(&mut self) -> Result<Option<DisconnectReason>, ()> {
        if self.reply(Reply::Success(vec![Vec::new()])).await.is_err() {
            return Err(());
        }
        Ok(Some(DisconnectReason::Quit))
    }

    async fn abort_and_finish(mut self, reason: DisconnectReason) -> DisconnectReason {
        warn!(comm_id = %self.pair.comm_id, ?reason, "connection ending abnormally");
        self.goal_handle.abort();
        reason
    }

    fn finish(self, reason: DisconnectReason) -> DisconnectReason {
        debug!(comm_id = %self.pair.comm_id, ?reason, "connection ended");
        reason
    }
}

/// Byte-exact, constant-time password comparison (spec.md §9).
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod comm_worker_tests;
