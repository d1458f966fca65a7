use ui::vm::ExamIntent;

pub const HELP: &str = "\
commands:
  <letter>          select an option (e.g. `b`)
  clear             clear the selection
  n | next          submit the selection and go on
  s | skip          skip this question
  r | review        mark for review and go on
  j <number>        jump to a question by its palette number
  c | continue      start the next section
  retry             reload the current section
  finish            finish the exam (asks for confirmation)
  yes | no          answer the confirmation
  q | quit          leave without finishing";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Intent(ExamIntent),
    /// 1-based palette number, resolved against the section on screen.
    JumpTo(usize),
}

/// Map one input line to a command. `None` for blank or unrecognised input.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    let (head, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(head, rest)| (head, rest.trim()));

    let intent = match head.to_ascii_lowercase().as_str() {
        "" => return None,
        "clear" => ExamIntent::ClearSelection,
        "n" | "next" => ExamIntent::Next,
        "s" | "skip" => ExamIntent::Skip,
        "r" | "review" => ExamIntent::Review,
        "j" | "jump" => return rest.parse::<usize>().ok().filter(|n| *n > 0).map(Command::JumpTo),
        "c" | "continue" => ExamIntent::ContinueSection,
        "retry" => ExamIntent::RetryLoad,
        "finish" => ExamIntent::RequestFinish,
        "yes" | "y" => ExamIntent::ConfirmFinish,
        "no" => ExamIntent::CancelFinish,
        "q" | "quit" => ExamIntent::Leave,
        label if label.len() == 1 && label.chars().all(|c| c.is_ascii_alphabetic()) => {
            ExamIntent::Select(label.to_ascii_uppercase())
        }
        _ => return None,
    };
    Some(Command::Intent(intent))
}
