//! Terminal flows for filling in and sending the contact form.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Result};
use colored::Colorize;

use crate::controller::{AttemptReport, SubmissionController, SubmissionStatus, SubmitError};
use crate::form::{DraftRecord, Field};
use crate::handoff::LinkLauncher;
use crate::intake::FormIntake;

pub(crate) fn run_compose_flow<I, L, R>(
    rt: &tokio::runtime::Runtime,
    controller: &SubmissionController<I, L>,
    input: &mut R,
) -> Result<()>
where
    I: FormIntake,
    L: LinkLauncher,
    R: BufRead,
{
    println!();
    println!("{}", "Send us a message".bright_cyan().bold());
    println!(
        "  {}",
        "Tell us about your security needs. Press Enter on an empty line to finish the message."
            .bright_black()
    );
    println!();

    let mut pending = Field::ALL.to_vec();
    loop {
        for field in &pending {
            let value = prompt_field(input, *field, controller.rules().is_required(*field))?;
            controller.update(*field, value);
        }

        println!();
        println!("{}", "Sending your message...".bright_cyan());

        match rt.block_on(controller.submit()) {
            Ok(report) => {
                print_attempt(&report);
                return Ok(());
            }
            Err(SubmitError::Invalid(err)) => {
                print_validation(&err.reasons(&controller.draft()));
                pending = err.fields;
                println!();
            }
            Err(err @ SubmitError::InFlight) => {
                return Err(err.into());
            }
        }
    }
}

/// One-shot submission from command-line flags.
pub(crate) fn run_quick_submit<I, L>(
    rt: &tokio::runtime::Runtime,
    controller: &SubmissionController<I, L>,
    draft: DraftRecord,
) -> Result<()>
where
    I: FormIntake,
    L: LinkLauncher,
{
    println!("{}", "Sending your message...".bright_cyan());

    match rt.block_on(controller.submit_draft(draft.clone())) {
        Ok(report) => {
            print_attempt(&report);
            Ok(())
        }
        Err(SubmitError::Invalid(err)) => {
            print_validation(&err.reasons(&draft));
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

pub(crate) fn print_attempt(report: &AttemptReport) {
    match &report.status {
        SubmissionStatus::Succeeded => {
            println!(
                "{}",
                "✓ Thanks! Your message has been sent.".bright_green()
            );
            if let Some(handoff) = &report.handoff {
                match &handoff.error {
                    None => println!(
                        "{} {}",
                        "Continue the conversation in chat:".bright_white(),
                        handoff.url.bright_blue()
                    ),
                    Some(reason) => {
                        println!(
                            "{} {}",
                            "Could not open the chat app:".bright_yellow(),
                            reason.bright_black()
                        );
                        println!(
                            "{} {}",
                            "Open this link instead:".bright_white(),
                            handoff.url.bright_blue()
                        );
                    }
                }
            }
        }
        SubmissionStatus::Failed(errors) => {
            println!("{}", "✗ Your message could not be sent.".bright_red());
            for e in errors {
                println!("  - {}", e.bright_red());
            }
            println!(
                "{}",
                "Your draft was kept. Run the command again to retry.".bright_black()
            );
        }
        other => {
            println!("{} {:?}", "Unexpected state:".bright_yellow(), other);
        }
    }
    println!(
        "{} {}",
        "Attempt:".bright_black(),
        report.id.to_string().bright_black()
    );
}

fn print_validation(reasons: &[String]) {
    println!("{}", "Validation issues:".bright_red());
    for e in reasons {
        println!("  - {}", e.bright_red());
    }
}

fn prompt_field<R: BufRead>(input: &mut R, field: Field, required: bool) -> Result<String> {
    let suffix = if required { "" } else { " (optional)" };
    if field == Field::Message {
        println!("{}{}:", field.label().bright_white(), suffix.bright_black());
        return read_multiline_message(input);
    }

    print!("{}{}: ", field.label().bright_white(), suffix.bright_black());
    let _ = io::stdout().flush();

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("input closed before the form was complete");
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Reads until an empty line. End of input finishes the message, unless
/// nothing was read at all.
fn read_multiline_message<R: BufRead>(input: &mut R) -> Result<String> {
    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            if lines.is_empty() {
                bail!("input closed before the form was complete");
            }
            break;
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            break;
        }
        lines.push(line.to_string());
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::HandoffSettings;
    use crate::form::FormRules;
    use crate::handoff::{ChatHandoff, DeferredLauncher};
    use crate::intake::IntakeError;
    use serde_json::Value;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    type Sent = Arc<Mutex<Vec<Value>>>;

    struct AcceptingIntake {
        payloads: Sent,
    }

    impl FormIntake for AcceptingIntake {
        async fn submit(&self, payload: &Value) -> Result<(), IntakeError> {
            self.payloads.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    fn controller() -> (SubmissionController<AcceptingIntake, DeferredLauncher>, Sent) {
        let sent = Sent::default();
        let controller = SubmissionController::new(
            AcceptingIntake {
                payloads: Arc::clone(&sent),
            },
            FormRules::default(),
            HandoffSettings {
                handoff: ChatHandoff::new("https://wa.me", "15550100200", ""),
                launcher: DeferredLauncher,
                launch: false,
            },
        );
        (controller, sent)
    }

    #[test]
    fn test_reprompts_only_invalid_fields() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (controller, sent) = controller();
        // name, email, phone, subject, message + blank line, then the email again
        let mut input = Cursor::new("John Doe\nnot-an-email\n\nTest\nHello\nthere\n\njohn@x.com\n");

        run_compose_flow(&rt, &controller, &mut input).unwrap();

        let payloads = sent.lock().unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0]["name"], "John Doe");
        assert_eq!(payloads[0]["email"], "john@x.com");
        assert_eq!(payloads[0]["subject"], "Test");
        assert_eq!(payloads[0]["message"], "Hello\nthere");
        assert_eq!(controller.current_state(), SubmissionStatus::Succeeded);
    }

    #[test]
    fn test_closed_input_ends_flow() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (controller, sent) = controller();
        let mut input = Cursor::new("");

        let err = run_compose_flow(&rt, &controller, &mut input).unwrap_err();
        assert!(err.to_string().contains("input closed"));
        assert!(sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_input_closed_during_reprompt_ends_flow() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (controller, sent) = controller();
        let mut input = Cursor::new("John Doe\nnot-an-email\n\nTest\nHello\n\n");

        let err = run_compose_flow(&rt, &controller, &mut input).unwrap_err();
        assert!(err.to_string().contains("input closed"));
        assert!(sent.lock().unwrap().is_empty());
        assert_eq!(
            controller.current_state(),
            SubmissionStatus::Invalid(vec![Field::Email])
        );
    }

    #[test]
    fn test_message_ends_at_end_of_input() {
        let mut input = Cursor::new("first line\nsecond line");
        let message = read_multiline_message(&mut input).unwrap();
        assert_eq!(message, "first line\nsecond line");
    }
}
