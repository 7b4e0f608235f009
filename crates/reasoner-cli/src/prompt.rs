use anyhow::Result;
use console::style;
use reasoner::models::display::DisplaySink;

pub mod rustyline;

pub trait Prompt {
    fn get_input(&mut self) -> Result<Input>;
    /// Display sink for one turn. It shows a busy indicator until the first event.
    fn turn_sink(&mut self, show_reasoning: bool) -> Box<dyn DisplaySink + Send>;
    fn render_notice(&mut self, text: &str);
    fn close(&mut self);
    fn ready(&self) {
        println!(
            "{} {}",
            style("reasoner").bold().cyan(),
            style("- type /help for commands, /exit to end the session").dim()
        );
        println!();
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Input {
    pub input_type: InputType,
    pub content: Option<String>, // Optional content as sometimes the user may be issuing a command eg. (Exit)
}

#[derive(Debug, PartialEq, Eq)]
pub enum InputType {
    AskAgain,        // Ask the user for input again. Control flow command.
    Message,         // User sent a message
    Exit,            // User wants to exit the session
    Clear,           // Drop the conversation history
    ToggleReasoning, // Show or hide the reasoning channel
    Help,            // Print the command list
}

impl Input {
    fn command(input_type: InputType) -> Self {
        Self {
            input_type,
            content: None,
        }
    }

    /// Interpret one line typed at the prompt
    pub fn parse(line: &str) -> Self {
        let text = line.trim();
        let is = |command: &str| text.eq_ignore_ascii_case(command);

        if text.is_empty() {
            Self::command(InputType::AskAgain)
        } else if is("/exit") || is("/quit") {
            Self::command(InputType::Exit)
        } else if is("/clear") {
            Self::command(InputType::Clear)
        } else if is("/reasoning") || is("/r") {
            Self::command(InputType::ToggleReasoning)
        } else if is("/help") || is("/?") {
            Self::command(InputType::Help)
        } else {
            Self {
                input_type: InputType::Message,
                content: Some(text.to_string()),
            }
        }
    }
}

pub const HELP: &str = "Commands:
/exit | /quit - Exit the session
/clear - Clear the conversation history
/reasoning | /r - Show or hide the model's reasoning
/? | /help - Display this help message
Ctrl+C - Interrupt the reply (resets the conversation to before the interrupted message)";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Input::parse("/exit").input_type, InputType::Exit);
        assert_eq!(Input::parse(" /QUIT ").input_type, InputType::Exit);
        assert_eq!(Input::parse("/clear").input_type, InputType::Clear);
        assert_eq!(Input::parse("/reasoning").input_type, InputType::ToggleReasoning);
        assert_eq!(Input::parse("/r").input_type, InputType::ToggleReasoning);
        assert_eq!(Input::parse("/?").input_type, InputType::Help);
        assert_eq!(Input::parse("   ").input_type, InputType::AskAgain);
    }

    #[test]
    fn test_parse_message_is_trimmed() {
        assert_eq!(
            Input::parse("  what is 3/4 of 12?\n"),
            Input {
                input_type: InputType::Message,
                content: Some("what is 3/4 of 12?".to_string()),
            }
        );
        assert_eq!(Input::parse("/unknown").input_type, InputType::Message);
    }
}
