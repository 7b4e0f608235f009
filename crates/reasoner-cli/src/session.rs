use anyhow::Result;
use tokio::sync::watch;

use crate::prompt::{InputType, Prompt};
use reasoner::conversation::Conversation;
use reasoner::errors::ReasonerError;
use reasoner::turn::TurnDriver;

pub struct Session<'a> {
    driver: TurnDriver,
    conversation: Conversation,
    prompt: Box<dyn Prompt + 'a>,
}

impl<'a> Session<'a> {
    pub fn new(driver: TurnDriver, prompt: Box<dyn Prompt + 'a>) -> Self {
        Session {
            driver,
            conversation: Conversation::new(),
            prompt,
        }
    }

    pub fn set_show_reasoning(&mut self, show: bool) {
        self.conversation.set_show_reasoning(show);
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub async fn start(&mut self) -> Result<()> {
        self.prompt.ready();

        loop {
            let input = self.prompt.get_input()?;
            match input.input_type {
                InputType::Message => {
                    if let Some(content) = &input.content {
                        self.reply(content).await;
                    }
                }
                InputType::Clear => {
                    self.conversation.clear();
                    self.prompt.render_notice("Conversation cleared.");
                }
                InputType::ToggleReasoning => {
                    let notice = if self.conversation.toggle_reasoning_visible() {
                        "Reasoning will be shown."
                    } else {
                        "Reasoning will be hidden."
                    };
                    self.prompt.render_notice(notice);
                }
                InputType::Exit => break,
                InputType::AskAgain | InputType::Help => continue,
            }
        }
        self.prompt.close();
        Ok(())
    }

    async fn reply(&mut self, text: &str) {
        let mut sink = self.prompt.turn_sink(self.conversation.show_reasoning());
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let result = {
            let run = self
                .driver
                .run(&mut self.conversation, text, sink.as_mut(), cancel_rx);
            tokio::pin!(run);
            tokio::select! {
                result = &mut run => result,
                _ = tokio::signal::ctrl_c() => {
                    let _ = cancel_tx.send(true);
                    run.await
                }
            }
        };
        sink.close();

        // Transport errors were already shown inline by the sink
        if let Err(ReasonerError::Cancelled) = result {
            self.prompt.render_notice(
                " Interrupt: Resetting conversation to before the last sent message...",
            );
        }
    }
}
