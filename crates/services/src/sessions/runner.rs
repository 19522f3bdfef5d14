use tokio::sync::mpsc;

use exam_core::model::ExamResult;
use exam_core::timer::TimerEvent;

use super::controller::{ExamController, SubmitOutcome};
use super::events::{ExamInput, SessionCommand};
use super::timer_task::TimerEvents;
use super::view::ResultId;
use crate::error::SessionError;

/// How a run of the session loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExamOutcome {
    Completed { result_id: ResultId, result: ExamResult },
    /// The host left without submitting, or dropped its input channel.
    Discarded,
}

/// Single event loop for one attempt.
///
/// Countdown events and host inputs are handled one at a time, each to
/// completion, on the caller's task. Countdown events win ties so an expiry
/// is never overtaken by input queued behind it.
///
/// # Errors
///
/// Returns `SessionError::InvalidExamConfiguration` when the host confirms a
/// start the exam cannot satisfy. Persistence failures are not fatal: the
/// loop keeps running so the host can retry with `FinalizeResult`.
pub async fn run_exam(
    mut controller: ExamController,
    mut inputs: mpsc::Receiver<ExamInput>,
) -> Result<ExamOutcome, SessionError> {
    let mut timer_events: Option<TimerEvents> = None;

    loop {
        if let (Some(result_id), Some(result)) = (controller.result_id(), controller.result()) {
            return Ok(ExamOutcome::Completed {
                result_id,
                result: result.clone(),
            });
        }

        tokio::select! {
            biased;

            Some(event) = next_timer_event(&mut timer_events) => {
                let outcome = controller.on_timer_event(event).await;
                settle(&mut controller, outcome).await?;
            }
            input = inputs.recv() => match input {
                Some(ExamInput::Command(command)) => {
                    apply(&mut controller, command, &mut timer_events).await?;
                }
                Some(ExamInput::Signal(signal)) => {
                    let response = controller.handle_signal(&signal);
                    tracing::trace!(?signal, ?response, "environment signal handled");
                }
                Some(ExamInput::Discard) | None => {
                    controller.discard().await;
                    return Ok(ExamOutcome::Discarded);
                }
            },
        }
    }
}

async fn next_timer_event(events: &mut Option<TimerEvents>) -> Option<TimerEvent> {
    let Some(stream) = events.as_mut() else {
        return std::future::pending().await;
    };
    match stream.recv().await {
        Some(event) => Some(event),
        None => {
            *events = None;
            std::future::pending().await
        }
    }
}

async fn apply(
    controller: &mut ExamController,
    command: SessionCommand,
    timer_events: &mut Option<TimerEvents>,
) -> Result<(), SessionError> {
    match command {
        SessionCommand::RequestStart => {
            controller.request_start();
        }
        SessionCommand::CancelStart => {
            controller.cancel_start();
        }
        SessionCommand::ConfirmStart => match controller.confirm_start() {
            Ok(events) => *timer_events = events,
            Err(SessionError::AlreadyStarted) => {
                tracing::debug!("start confirmed twice");
            }
            Err(err) => {
                tracing::error!("exam cannot start: {err}");
                controller.discard().await;
                return Err(err);
            }
        },
        SessionCommand::Answer { index, value } => {
            controller.record_answer(index, value);
        }
        SessionCommand::ToggleFlag(index) => {
            controller.toggle_flag(index);
        }
        SessionCommand::Navigate(index) => {
            controller.navigate(index);
        }
        SessionCommand::Next => {
            controller.next_question();
        }
        SessionCommand::Previous => {
            controller.previous_question();
        }
        SessionCommand::EnterReview => {
            controller.enter_review();
        }
        SessionCommand::ResumeFromReview => {
            controller.resume_from_review();
        }
        SessionCommand::PauseTimer => {
            controller.pause_timer();
        }
        SessionCommand::ResumeTimer => {
            controller.resume_timer();
        }
        SessionCommand::Submit => {
            let outcome = controller.request_submit().await;
            settle(controller, outcome).await?;
        }
        SessionCommand::FinalizeResult => {
            let outcome = controller
                .finalize_result()
                .await
                .map(|result_id| SubmitOutcome::Completed { result_id });
            settle(controller, outcome).await?;
        }
    }
    Ok(())
}

/// Keep running after recoverable submission failures; stop on the rest.
async fn settle(
    controller: &mut ExamController,
    outcome: Result<SubmitOutcome, SessionError>,
) -> Result<(), SessionError> {
    match outcome {
        Ok(_) | Err(SessionError::Storage(_) | SessionError::NotSubmitting) => Ok(()),
        Err(err) => {
            tracing::error!("exam session aborted: {err}");
            controller.discard().await;
            Err(err)
        }
    }
}
