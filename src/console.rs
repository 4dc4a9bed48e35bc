//! Interactive console loop.
//!
//! Everything runs on one task. Topology and fault requests are spawned and
//! report back through an [`Event`] channel, so the operator can keep
//! editing while a refresh is in flight.

use std::io::Write;
use std::pin::pin;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info, warn};

use crate::cache::TopologyCache;
use crate::client::LabClient;
use crate::commands::{Command, HELP, parse_command};
use crate::config::ConsoleConfig;
use crate::controller::EditOutcome;
use crate::entry::EntryId;
use crate::error::{DiscoveryError, EditError, SubmitError};
use crate::protocol::SubmitResponse;
use crate::render::{
    render_entries, render_entry_line, render_issues, render_options, render_report,
    render_status, render_topology,
};
use crate::topology::TopologySnapshot;
use crate::workbench::{RefreshOutcome, RefreshTicket, SubmitTicket, Workbench};

/// Completion of a spawned request.
#[derive(Debug)]
pub enum Event {
    Refreshed(RefreshTicket, Result<TopologySnapshot, DiscoveryError>),
    Submitted(SubmitTicket, Result<SubmitResponse, SubmitError>),
    FaultFlag(Result<String, String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Console<W> {
    wb: Workbench,
    client: LabClient,
    mark_fault_flag: bool,
    flag_pending: bool,
    events: UnboundedSender<Event>,
    out: W,
}

impl<W: Write> Console<W> {
    pub fn new(
        wb: Workbench,
        client: LabClient,
        mark_fault_flag: bool,
        events: UnboundedSender<Event>,
        out: W,
    ) -> Self {
        Self {
            wb,
            client,
            mark_fault_flag,
            flag_pending: false,
            events,
            out,
        }
    }

    pub fn workbench(&self) -> &Workbench {
        &self.wb
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Nothing is in flight whose outcome the operator still has to see.
    pub fn is_idle(&self) -> bool {
        !self.wb.is_submitting() && !self.flag_pending
    }

    fn print(&mut self, text: &str) {
        if let Err(e) = self
            .out
            .write_all(text.as_bytes())
            .and_then(|_| self.out.flush())
        {
            warn!("console output failed: {e}");
        }
    }

    pub fn start_refresh(&mut self) {
        let ticket = self.wb.begin_refresh();
        let client = self.client.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = client.fetch_topology().await;
            let _ = tx.send(Event::Refreshed(ticket, result));
        });
    }

    pub fn start_submit(&mut self) {
        let ticket = match self.wb.begin_submit() {
            Ok(ticket) => ticket,
            Err(SubmitError::Invalid(issues)) => {
                warn!("submission blocked by {} issue(s)", issues.len());
                self.print(&render_issues(&issues));
                return;
            }
            Err(e) => {
                warn!("{e}");
                return;
            }
        };
        self.print(&format!("submitting {} fault(s)...\n", ticket.len()));
        let client = self.client.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = client.submit_batch(ticket.payloads()).await;
            let _ = tx.send(Event::Submitted(ticket, result));
        });
    }

    fn start_fault_flag(&mut self) {
        self.flag_pending = true;
        let client = self.client.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = client
                .set_fault_flag(true)
                .await
                .map_err(|e| format!("{e:#}"));
            let _ = tx.send(Event::FaultFlag(result));
        });
    }

    pub fn handle_line(&mut self, line: &str) -> Flow {
        match parse_command(line) {
            Ok(Some(command)) => self.handle_command(command),
            Ok(None) => Flow::Continue,
            Err(e) => {
                warn!("{e}");
                Flow::Continue
            }
        }
    }

    pub fn handle_command(&mut self, command: Command) -> Flow {
        match command {
            Command::Help => self.print(&format!("{HELP}\n")),
            Command::List => self.print(&render_entries(&self.wb)),
            Command::Status => self.print(&render_status(&self.wb)),
            Command::Topology => {
                let text = render_topology(self.wb.topology(), self.wb.cache().status());
                self.print(&text);
            }
            Command::Refresh => self.start_refresh(),

            Command::Add => match self.wb.add() {
                Ok(id) => self.print_entry(id),
                Err(e) => warn!("{e}"),
            },

            Command::Remove(id) => match self.wb.remove(id) {
                Ok(Some(new_id)) => {
                    self.print(&format!("removed {id}; batch reseeded\n"));
                    self.print_entry(new_id);
                }
                Ok(None) => self.print(&format!("removed {id}\n")),
                Err(e) => warn!("{e}"),
            },

            Command::Kind(id, kind) => {
                let outcome = self.wb.set_kind(id, kind);
                self.report_edit(id, outcome);
            }
            Command::Set {
                entry,
                field,
                value,
            } => {
                let outcome = self.wb.edit(entry, field, &value);
                self.report_edit(entry, outcome);
            }
            Command::Discard { entry, field } => match self.wb.discard(entry, field) {
                Ok(()) => self.print_entry(entry),
                Err(e) => warn!("{e}"),
            },
            Command::Options { entry, field } => match self.wb.options(entry, field) {
                Ok(values) => self.print(&render_options(field, &values)),
                Err(e) => warn!("{e}"),
            },

            Command::Check => {
                let issues = self.wb.issues();
                self.print(&render_issues(&issues));
            }
            Command::Submit => self.start_submit(),
            Command::Report => match self.wb.last_report() {
                Some(report) => {
                    let text = render_report(report);
                    self.print(&text);
                }
                None => self.print("no batch submitted yet\n"),
            },
            Command::Quit => {
                if self.wb.is_submitting() {
                    warn!("leaving with a submission in flight; its result will not be shown");
                }
                return Flow::Quit;
            }
        }
        Flow::Continue
    }

    fn report_edit(
        &mut self,
        id: EntryId,
        outcome: Result<EditOutcome, EditError>,
    ) {
        match outcome {
            Ok(EditOutcome::Committed) => self.print_entry(id),
            Ok(EditOutcome::Pending { reason }) => {
                warn!("{id}: kept as draft, not applied: {reason}");
            }
            Err(e) => warn!("{e}"),
        }
    }

    fn print_entry(&mut self, id: EntryId) {
        if let Some(entry) = self.wb.set().get(id) {
            let line = format!("{}\n", render_entry_line(entry));
            self.print(&line);
        }
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Refreshed(ticket, result) => match self.wb.complete_refresh(ticket, result) {
                RefreshOutcome::Applied { corrected } => {
                    let mut text = format!("topology: {}\n", self.wb.topology().summary());
                    if corrected > 0 {
                        text.push_str(&format!("{corrected} entries adjusted\n"));
                    }
                    self.print(&text);
                }
                RefreshOutcome::Failed(error) => {
                    warn!("topology unavailable: {error}");
                }
                RefreshOutcome::Superseded => {}
            },
            Event::Submitted(ticket, result) => {
                let report = self.wb.complete_submit(ticket, result);
                let took_effect = report.any_took_effect();
                let text = render_report(report);
                self.print(&text);
                if self.mark_fault_flag && took_effect {
                    self.start_fault_flag();
                }
            }
            Event::FaultFlag(result) => {
                self.flag_pending = false;
                match result {
                    Ok(message) => debug!("fault flag set: {message}"),
                    Err(message) => {
                        warn!("{message}");
                        self.wb.add_notice(message.clone());
                        self.print(&format!("  note: {message}\n"));
                    }
                }
            }
        }
    }
}

/// Run the console on stdin/stdout until `quit`, end of input or Ctrl-C.
pub async fn run_console(config: ConsoleConfig) -> Result<()> {
    let client = config.client()?;
    let mut cache = TopologyCache::new(config.session_store());
    cache.load();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut console = Console::new(
        Workbench::new(cache),
        client,
        config.mark_fault_flag,
        tx,
        std::io::stdout(),
    );
    info!("fault console for {}", config.base_url);
    if config.refresh_on_start {
        console.start_refresh();
    }
    console.print("type 'help' for commands\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;
    let mut ctrl_c = pin!(tokio::signal::ctrl_c());

    loop {
        if !input_open && console.is_idle() {
            break;
        }
        tokio::select! {
            line = lines.next_line(), if input_open => match line {
                Ok(Some(line)) => {
                    if console.handle_line(&line) == Flow::Quit {
                        break;
                    }
                }
                Ok(None) => {
                    input_open = false;
                    if !console.is_idle() {
                        info!("input closed; waiting for the submission in flight");
                    }
                }
                Err(e) => {
                    warn!("stdin read failed: {e}");
                    input_open = false;
                }
            },
            Some(event) = rx.recv() => console.handle_event(event),
            _ = &mut ctrl_c => {
                info!("interrupted");
                break;
            }
        }
    }
    Ok(())
}
