use std::sync::atomic::{AtomicU64, Ordering};

use exam_core::model::{AnswerSheet, Exam, IntegrityEvent, Milestone, QuestionKind};
use exam_core::monitor::{CapabilityUnavailable, EnvironmentSignal, ExamEnvironment, ListenerId, SignalKind};
use exam_core::timer::format_remaining;
use services::{ExamHost, ExamInput, SessionCommand};

/// Terminal stand-in for a browser window. Signals are typed by the user.
#[derive(Debug, Default)]
pub struct TerminalEnvironment {
    next_id: u64,
    live: usize,
}

impl ExamEnvironment for TerminalEnvironment {
    fn add_listener(&mut self, kind: SignalKind) -> Result<ListenerId, CapabilityUnavailable> {
        self.next_id += 1;
        self.live += 1;
        tracing::trace!(signal = %kind, "listener added");
        Ok(ListenerId(self.next_id))
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.live = self.live.saturating_sub(1);
        tracing::trace!(id = id.0, remaining = self.live, "listener removed");
    }

    fn reassert_location(&mut self) {
        println!("(navigation blocked, you are still in the exam)");
    }
}

/// Prints host callbacks to stdout.
#[derive(Debug, Default)]
pub struct TerminalHost {
    integrity_events: AtomicU64,
}

impl ExamHost for TerminalHost {
    fn on_time_up(&self) {
        println!("Time is up. Submitting your answers.");
    }

    fn on_submit(&self, answers: &AnswerSheet) {
        println!("Submitting {} answer(s)...", answers.len());
    }

    fn on_integrity_event(&self, event: &IntegrityEvent) {
        let total = self.integrity_events.fetch_add(1, Ordering::Relaxed) + 1;
        println!("Warning: {} recorded ({total} so far).", event.kind);
    }

    fn on_timer_warning(&self, mark: u32) {
        println!("{} remaining.", format_remaining(mark));
    }

    fn on_milestone(&self, milestone: Milestone) {
        match milestone {
            Milestone::Answered(n) => println!("{n} questions answered."),
            Milestone::HalfwayThere => println!("Halfway there."),
            Milestone::AllAnswered => println!("All questions answered. Type `review` or `submit`."),
        }
    }
}

pub fn print_exam(exam: &Exam) {
    println!("{}", exam.name());
    match exam.meta().timed_minutes() {
        Some(minutes) => println!("{} questions, {minutes} minute(s)", exam.total_questions()),
        None => println!("{} questions, untimed", exam.total_questions()),
    }
    for (index, question) in exam.questions().iter().enumerate() {
        if let Some(section) = exam.section_for(index).filter(|s| s.start == index) {
            println!();
            println!("== {} ==", section.title);
        }
        println!("{:>3}. {}", index + 1, question.text());
        match question.kind() {
            QuestionKind::MultipleChoice { options, .. } => {
                for option in options {
                    println!("       [{}] {}", option.id, option.text);
                }
            }
            QuestionKind::TrueFalse { .. } => println!("       true / false"),
            QuestionKind::FillInBlank { .. } => println!("       (free text)"),
        }
    }
    println!();
}

pub fn print_help() {
    println!("Commands:");
    println!("  start | cancel            confirm or cancel the start");
    println!("  a <n> <answer>            answer question n");
    println!("  f <n>                     toggle the review flag on question n");
    println!("  g <n> | next | prev       navigate");
    println!("  review | resume           enter or leave review");
    println!("  pause | continue          pause or resume the timer");
    println!("  submit | retry            submit, or retry a failed save");
    println!("  hide | back | link <url>  simulate leaving the exam");
    println!("  close                     simulate closing the window");
    println!("  quit                      leave without submitting");
}

/// Parse one line of user input. Question numbers are 1-based.
pub fn parse_line(line: &str) -> Result<Vec<ExamInput>, String> {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    let inputs = match word {
        "" => Vec::new(),
        "start" => vec![SessionCommand::ConfirmStart.into()],
        "cancel" => vec![SessionCommand::CancelStart.into()],
        "a" => {
            let (number, value) = rest
                .split_once(' ')
                .ok_or_else(|| "usage: a <n> <answer>".to_string())?;
            vec![
                SessionCommand::Answer {
                    index: question_index(number)?,
                    value: value.trim().to_string(),
                }
                .into(),
            ]
        }
        "f" => vec![SessionCommand::ToggleFlag(question_index(rest)?).into()],
        "g" => vec![SessionCommand::Navigate(question_index(rest)?).into()],
        "next" => vec![SessionCommand::Next.into()],
        "prev" => vec![SessionCommand::Previous.into()],
        "review" => vec![SessionCommand::EnterReview.into()],
        "resume" => vec![SessionCommand::ResumeFromReview.into()],
        "pause" => vec![SessionCommand::PauseTimer.into()],
        "continue" => vec![SessionCommand::ResumeTimer.into()],
        "submit" => vec![SessionCommand::Submit.into()],
        "retry" => vec![SessionCommand::FinalizeResult.into()],
        "hide" => vec![
            EnvironmentSignal::VisibilityChanged { hidden: true }.into(),
            EnvironmentSignal::VisibilityChanged { hidden: false }.into(),
        ],
        "back" => vec![EnvironmentSignal::HistoryNavigated.into()],
        "link" => vec![
            EnvironmentSignal::LinkActivated {
                href: rest.to_string(),
                exam_exit: false,
            }
            .into(),
        ],
        "close" => vec![
            EnvironmentSignal::BeforeUnload.into(),
            EnvironmentSignal::PageHide.into(),
            ExamInput::Discard,
        ],
        "quit" => vec![ExamInput::Discard],
        other => return Err(format!("unknown command: {other} (type `help`)")),
    };
    Ok(inputs)
}

fn question_index(raw: &str) -> Result<usize, String> {
    let number: usize = raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid question number: {raw}"))?;
    number
        .checked_sub(1)
        .ok_or_else(|| "question numbers start at 1".to_string())
}
