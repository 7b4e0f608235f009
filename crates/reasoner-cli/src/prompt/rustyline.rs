use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use cliclack::spinner;
use console::style;
use reasoner::models::display::DisplaySink;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use super::{Input, InputType, Prompt, HELP};
use crate::render::TerminalSink;

const PROMPT: &str = "\x1b[1m\x1b[38;5;30m> \x1b[0m";

pub struct RustylinePrompt {
    editor: DefaultEditor,
    history_file: Option<PathBuf>,
}

impl RustylinePrompt {
    pub fn new() -> Result<Self> {
        let mut editor = DefaultEditor::new()?;
        let history_file = dirs::data_dir().map(|dir| dir.join("reasoner").join("history.txt"));
        if let Some(path) = &history_file {
            // Missing on first run
            let _ = editor.load_history(path);
        }
        Ok(Self {
            editor,
            history_file,
        })
    }

    fn save_history(&mut self) -> Result<()> {
        if let Some(path) = &self.history_file {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            self.editor.save_history(path)?;
        }
        Ok(())
    }
}

impl Prompt for RustylinePrompt {
    fn get_input(&mut self) -> Result<Input> {
        let line = match self.editor.readline(PROMPT) {
            Ok(line) => line,
            Err(e) => {
                match e {
                    ReadlineError::Interrupted | ReadlineError::Eof => (),
                    _ => eprintln!("Input error: {}", e),
                }
                return Ok(Input::command(InputType::Exit));
            }
        };

        let input = Input::parse(&line);
        match input.input_type {
            InputType::Help => {
                println!("{}", HELP);
                Ok(Input::command(InputType::AskAgain))
            }
            InputType::Message => {
                self.editor.add_history_entry(line.trim())?;
                Ok(input)
            }
            _ => Ok(input),
        }
    }

    fn turn_sink(&mut self, show_reasoning: bool) -> Box<dyn DisplaySink + Send> {
        let spin = spinner();
        spin.start(if show_reasoning {
            "thinking..."
        } else {
            "awaiting reply..."
        });
        Box::new(TerminalSink::new(Some(spin)))
    }

    fn render_notice(&mut self, text: &str) {
        println!("{}", style(text).dim());
    }

    fn close(&mut self) {
        if let Err(e) = self.save_history() {
            tracing::warn!("failed to save input history: {}", e);
        }
    }
}
