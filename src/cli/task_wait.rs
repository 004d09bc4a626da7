use crate::binding::constraint::{Constraint, ConstraintSet, PatternRule};
use crate::binding::missing_arguments;
use crate::cli::ProcessCommand;
use crate::context::Context;
use crate::error::{Error, ExitStatus, Result};
use crate::poller::{Completion, Notifications, Phase, PollState, TaskPoller};
use async_trait::async_trait;
use clap::Args;
use colored::Colorize;
use console::Term;
use serde_json::Value;
use std::fmt::Debug;
use std::io::{IsTerminal, Read};
use std::time::Duration;
use tokio::sync::oneshot;

const ARGUMENT: &str = "notification-uuid";

/// How long an open stdin pipe may stay silent before it counts as absent.
const STDIN_WAIT: Duration = Duration::from_secs(10);

#[derive(Debug, Args)]
#[command(
    long_about = "Wait for a task to complete.\n\nAccepts either a notification UUID as an argument or a JSON payload on standard input containing `_links.notification.href`, as printed by `cloudapi api`."
)]
pub struct TaskWaitArgs {
    /// Notification UUID.
    #[arg(value_name = "notification-uuid")]
    pub notification_uuid: Option<String>,
}

/// Extracts the notification id from an API response carrying `_links.notification.href`.
pub fn notification_id_from_json(payload: &str) -> Result<String> {
    let missing = || missing_arguments(&[ARGUMENT.to_string()]);

    let value: Value = serde_json::from_str(payload).map_err(|_| missing())?;
    let href = value
        .pointer("/_links/notification/href")
        .and_then(Value::as_str)
        .ok_or_else(missing)?;

    href.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .ok_or_else(missing)
}

fn validate_uuid(id: &str) -> Result<String> {
    ConstraintSet::new()
        .with(Constraint::NotBlank)
        .with(Constraint::Pattern(PatternRule::uuid()?))
        .validate(id)
        .map_err(Error::ValidationError)?;
    Ok(id.to_string())
}

/// Reads `reader` to the end on a detached thread; a reader that is still open after `wait` yields `None`.
async fn read_with_deadline<R>(mut reader: R, wait: Duration) -> Result<Option<String>>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        let mut payload = String::new();
        let _ = tx.send(reader.read_to_string(&mut payload).map(|_| payload));
    });

    match tokio::time::timeout(wait, rx).await {
        Ok(Ok(read)) => Ok(Some(read?).filter(|p| !p.trim().is_empty())),
        Ok(Err(_)) => Ok(None),
        Err(_) => {
            tracing::debug!(?wait, "No payload on stdin");
            Ok(None)
        }
    }
}

async fn read_stdin() -> Result<Option<String>> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    read_with_deadline(stdin, STDIN_WAIT).await
}

/// Single status line on stderr, redrawn in place.
struct ProgressLine {
    term: Term,
}

impl ProgressLine {
    fn start(id: &str) -> Self {
        let line = ProgressLine {
            term: Term::stderr(),
        };
        line.draw(&format!("Waiting for task {} to complete", id));
        line
    }

    fn draw(&self, message: &str) {
        if self.term.is_term() {
            let _ = self.term.clear_line();
            let _ = self.term.write_str(&format!("{} {}", "*".cyan(), message));
        }
    }

    fn update(&self, state: &PollState) {
        match state.phase {
            Phase::Polling => self.draw(&state.message()),
            _ => {
                if self.term.is_term() {
                    let _ = self.term.clear_line();
                }
            }
        }
    }
}

fn print_completion(id: &str, completion: &Completion) {
    let notification = &completion.notification;
    println!(
        "{} The task with notification uuid {} completed with status \"{}\".",
        "[OK]".green().bold(),
        id,
        notification.status
    );
    println!("     Task type: {}", notification.label);
    println!("     Duration: {} seconds", completion.duration_secs);
}

impl TaskWaitArgs {
    /// An explicit argument wins; otherwise the id comes from stdin.
    async fn notification_id(&self) -> Result<String> {
        if let Some(id) = &self.notification_uuid {
            return validate_uuid(id);
        }
        match read_stdin().await? {
            Some(payload) => notification_id_from_json(&payload),
            None => Err(missing_arguments(&[ARGUMENT.to_string()])),
        }
    }
}

#[async_trait]
impl ProcessCommand for TaskWaitArgs {
    async fn process_command(&self, context: &Context) -> Result<ExitStatus> {
        let id = self.notification_id().await?;
        let dispatcher = context.dispatcher()?;
        let poller = TaskPoller::new(Notifications::new(&dispatcher));

        let progress = ProgressLine::start(&id);
        let completion = poller.wait(&id, |state| progress.update(state)).await?;
        print_completion(&id, &completion);

        Ok(ExitStatus::Success)
    }
}
