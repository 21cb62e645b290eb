//! Interactive client: `mvtgen shell`.
//!
//! The main thread owns the [`Workflow`] and is the only thing that mutates
//! it. Everything else talks to it through one channel of [`Event`]s:
//!
//! - a reader thread forwards stdin lines;
//! - each generate/explain runs the service call on its own worker thread
//!   and sends the outcome back with its ticket;
//! - a timer thread announces when the copy confirmation expires.
//!
//! Results that arrive after `clear` (or after a newer request) carry an old
//! ticket and are dropped by the workflow.

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Instant;

use anyhow::Result;
use colored::Colorize;

use crate::activity::ActivityLog;
use crate::clipboard::{Clipboard, SystemClipboard};
use crate::config::MvtConfig;
use crate::error::{RemoteError, WorkflowError};
use crate::ingest::PathSeedFile;
use crate::render::{self, Renderer, TerminalRenderer};
use crate::service::{ConfigService, ExplainRequest, GenerateRequest, HttpConfigService};
use crate::workflow::{RequestKind, RequestTicket, Workflow};
use crate::EXAMPLE_PROMPTS;

const PROMPT: &str = "mvtgen> ";

const HELP: &str = "\
Commands:
  describe <text>   set the test description
  seed <json>       set the seed configuration (empty to clear)
  load <path>       load the seed from a .json file
  generate          generate a configuration from the form
  explain           explain the current configuration
  copy              copy the configuration to the clipboard
  clear             reset everything
  show              print the current state
  examples          list example descriptions
  example <n>       use example <n> as the description
  help              show this help
  quit              exit";

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Describe(String),
    Seed(String),
    Load(String),
    Generate,
    Explain,
    Copy,
    Clear,
    Show,
    Examples,
    Example(usize),
    Help,
    Quit,
    Empty,
    Unknown(String),
}

/// Parse one input line. Arguments keep their inner whitespace.
pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "" => Command::Empty,
        "describe" | "d" => Command::Describe(rest.to_string()),
        "seed" => Command::Seed(rest.to_string()),
        "load" | "upload" if !rest.is_empty() => Command::Load(rest.to_string()),
        "generate" | "gen" | "g" => Command::Generate,
        "explain" | "e" => Command::Explain,
        "copy" | "c" => Command::Copy,
        "clear" => Command::Clear,
        "show" | "s" => Command::Show,
        "examples" => Command::Examples,
        "example" => match rest.parse::<usize>() {
            Ok(n) if (1..=EXAMPLE_PROMPTS.len()).contains(&n) => Command::Example(n),
            _ => Command::Unknown(line.to_string()),
        },
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum Event {
    Input(String),
    InputClosed,
    Finished(RequestTicket, Result<String, RemoteError>),
    CopyExpired,
}

/// Delivers a worker's outcome exactly once.
///
/// If the worker unwinds before sending, dropping the guard reports an
/// interruption so the workflow still leaves the loading state.
struct CompletionGuard {
    tx: Sender<Event>,
    ticket: RequestTicket,
    sent: bool,
}

impl CompletionGuard {
    fn new(tx: Sender<Event>, ticket: RequestTicket) -> Self {
        Self {
            tx,
            ticket,
            sent: false,
        }
    }

    fn complete(mut self, outcome: Result<String, RemoteError>) {
        self.sent = true;
        let _ = self.tx.send(Event::Finished(self.ticket, outcome));
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if !self.sent {
            let _ = self.tx.send(Event::Finished(
                self.ticket,
                Err(RemoteError::transport("request interrupted")),
            ));
        }
    }
}

/// Whether the loop keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

// ---------------------------------------------------------------------------
// Shell
// ---------------------------------------------------------------------------

pub struct Shell<C: Clipboard, R: Renderer> {
    workflow: Workflow<C, R>,
    tx: Sender<Event>,
    rx: Receiver<Event>,
    input_closed: bool,
}

impl<C: Clipboard, R: Renderer> Shell<C, R> {
    pub fn new(workflow: Workflow<C, R>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            workflow,
            tx,
            rx,
            input_closed: false,
        }
    }

    pub fn workflow(&self) -> &Workflow<C, R> {
        &self.workflow
    }

    /// Read commands from `input` until `quit` or end of input.
    ///
    /// At end of input the shell waits for an in-flight request to finish.
    pub fn run<I>(mut self, input: I) -> Result<()>
    where
        I: BufRead + Send + 'static,
    {
        spawn_reader(input, self.tx.clone());
        print_prompt();

        loop {
            if self.step()? == Flow::Quit {
                break;
            }
        }
        Ok(())
    }

    /// Wait for and handle the next event.
    pub fn step(&mut self) -> Result<Flow> {
        let event = self.rx.recv()?;
        Ok(self.handle_event(event))
    }

    fn handle_event(&mut self, event: Event) -> Flow {
        match event {
            Event::Input(line) => {
                let flow = self.handle_line(&line);
                if flow == Flow::Continue {
                    print_prompt();
                }
                flow
            }
            Event::InputClosed => {
                self.input_closed = true;
                self.idle_flow()
            }
            Event::Finished(ticket, outcome) => {
                // Failures are already on the banner.
                let _ = match ticket.kind() {
                    RequestKind::Generate => self.workflow.finish_generate(ticket, outcome),
                    RequestKind::Explain => self.workflow.finish_explain(ticket, outcome),
                };
                self.idle_flow()
            }
            Event::CopyExpired => {
                self.workflow.render();
                Flow::Continue
            }
        }
    }

    /// Once input is gone, quit as soon as nothing is in flight.
    fn idle_flow(&self) -> Flow {
        if self.input_closed && !self.workflow.state().is_loading() {
            Flow::Quit
        } else {
            Flow::Continue
        }
    }

    /// Handle one line of input.
    pub fn handle_line(&mut self, line: &str) -> Flow {
        match parse_command(line) {
            Command::Empty => {}
            Command::Describe(text) => self.workflow.set_description(&text),
            Command::Seed(text) => self.workflow.set_seed(&text),
            Command::Load(path) => {
                let _ = self.workflow.ingest_file(&PathSeedFile::new(path));
            }
            Command::Generate => self.spawn_generate(),
            Command::Explain => self.spawn_explain(),
            Command::Copy => {
                if self.workflow.copy().is_ok() {
                    self.schedule_copy_expiry();
                }
            }
            Command::Clear => self.workflow.clear(),
            Command::Show => self.show(),
            Command::Examples => print_examples(),
            Command::Example(n) => {
                let prompt = EXAMPLE_PROMPTS[n - 1];
                self.workflow.set_description(prompt);
                println!("  {} {}", "Description:".bold(), prompt);
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => return Flow::Quit,
            Command::Unknown(text) => {
                println!(
                    "{} {} (type `help` for commands)",
                    "Unknown command:".yellow(),
                    text
                );
            }
        }
        Flow::Continue
    }

    fn spawn_generate(&mut self) {
        let description = self.workflow.state().description.clone();
        let seed = self.workflow.state().seed.clone();
        match self.workflow.start_generate(&description, Some(&seed)) {
            Ok((ticket, request)) => {
                let service = self.workflow.service();
                spawn_worker(service, self.tx.clone(), ticket, Job::Generate(request));
            }
            Err(e) => self.report_refusal(&e),
        }
    }

    fn spawn_explain(&mut self) {
        match self.workflow.start_explain() {
            Ok((ticket, request)) => {
                let service = self.workflow.service();
                spawn_worker(service, self.tx.clone(), ticket, Job::Explain(request));
            }
            Err(e) => self.report_refusal(&e),
        }
    }

    /// Refusals that leave no banner still need a word to the user.
    fn report_refusal(&self, error: &WorkflowError) {
        if matches!(error, WorkflowError::RequestInFlight) {
            println!("{}", "A request is already running.".yellow());
        }
    }

    fn schedule_copy_expiry(&self) {
        let Some(deadline) = self.workflow.state().copy_feedback_deadline() else {
            return;
        };
        let tx = self.tx.clone();
        thread::spawn(move || {
            thread::sleep(deadline.saturating_duration_since(Instant::now()));
            let _ = tx.send(Event::CopyExpired);
        });
    }

    fn show(&self) {
        let state = self.workflow.state();
        println!("  {} {}", "Description:".bold(), state.description);
        if !state.seed.trim().is_empty() {
            println!("  {} {}", "Seed:".bold(), state.seed.trim());
        }
        println!("  {}", render::status_line(state, Instant::now()).dimmed());
    }
}

// ---------------------------------------------------------------------------
// Threads
// ---------------------------------------------------------------------------

enum Job {
    Generate(GenerateRequest),
    Explain(ExplainRequest),
}

fn spawn_worker(
    service: Arc<dyn ConfigService>,
    tx: Sender<Event>,
    ticket: RequestTicket,
    job: Job,
) {
    thread::spawn(move || {
        let guard = CompletionGuard::new(tx, ticket);
        let outcome = match &job {
            Job::Generate(request) => service.generate(request),
            Job::Explain(request) => service.explain(request),
        };
        guard.complete(outcome);
    });
}

fn spawn_reader<I>(input: I, tx: Sender<Event>)
where
    I: BufRead + Send + 'static,
{
    thread::spawn(move || {
        for line in input.lines() {
            let Ok(line) = line else { break };
            if tx.send(Event::Input(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(Event::InputClosed);
    });
}

fn print_prompt() {
    print!("{}", PROMPT.cyan());
    let _ = std::io::stdout().flush();
}

fn print_examples() {
    for (i, prompt) in EXAMPLE_PROMPTS.iter().enumerate() {
        println!("  {} {}", format!("{}.", i + 1).bold(), prompt);
    }
    println!("  {}", "Use `example <n>` to pick one.".dimmed());
}

/// Start the interactive shell on stdin/stdout.
pub fn run(cfg: &MvtConfig) -> Result<()> {
    println!("{}", "mvtgen shell".bold().cyan());
    println!("{}", "Type `help` for commands.".dimmed());

    let service = Arc::new(HttpConfigService::from_config(&cfg.service));
    let workflow = Workflow::new(service, SystemClipboard, TerminalRenderer::stdout())
        .with_activity(ActivityLog::from_config(&cfg.activity));

    let stdin = std::io::BufReader::new(std::io::stdin());
    Shell::new(workflow).run(stdin)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
