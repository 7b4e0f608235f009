use serde::Serialize;

use super::buffer::{ChannelBuffer, Push};
use crate::format::Pipeline;
use crate::models::display::{DisplayEvent, DisplaySink};
use crate::models::stream::{Channel, StreamEvent};

/// Raw text of a completed turn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TurnOutcome {
    pub answer: String,
    pub reasoning: String,
}

/// Reduces an ordered stream of channel deltas into display events.
///
/// Each channel is buffered separately. A completed unit is run through the
/// channel's pipeline and emitted as [`DisplayEvent::Unit`]; anything else is
/// echoed raw as [`DisplayEvent::Provisional`]. A delta on the other channel
/// closes the unit in progress, so provisional text never outlives a channel
/// switch. Hidden reasoning is still buffered and ends up in the [`TurnOutcome`].
pub struct ChunkAggregator<'a> {
    pipeline: &'a Pipeline,
    reasoning: ChannelBuffer,
    answer: ChannelBuffer,
    current: Option<Channel>,
    show_reasoning: bool,
}

impl<'a> ChunkAggregator<'a> {
    pub fn new(pipeline: &'a Pipeline, show_reasoning: bool) -> Self {
        Self {
            pipeline,
            reasoning: ChannelBuffer::new(Channel::Reasoning),
            answer: ChannelBuffer::new(Channel::Answer).keep_fences(true),
            current: None,
            show_reasoning,
        }
    }

    pub fn push<K: DisplaySink + ?Sized>(&mut self, event: &StreamEvent, sink: &mut K) {
        if event.delta.is_empty() {
            return;
        }
        if let Some(previous) = self.current.replace(event.channel) {
            if previous != event.channel {
                if let Some(unit) = self.buffer_mut(previous).take_pending() {
                    self.emit(sink, previous, unit, true);
                }
            }
        }
        let result = self.buffer_mut(event.channel).push(&event.delta);
        match result {
            Push::Provisional(delta) => self.emit(sink, event.channel, delta, false),
            Push::Unit(unit) => self.emit(sink, event.channel, unit, true),
            Push::Ignored => {}
        }
    }

    /// Flush what is left of each channel, reasoning first, and close both buffers
    pub fn finish<K: DisplaySink + ?Sized>(mut self, sink: &mut K) -> TurnOutcome {
        for channel in [Channel::Reasoning, Channel::Answer] {
            if let Some(unit) = self.buffer_mut(channel).finish() {
                self.emit(sink, channel, unit, true);
            }
        }
        tracing::debug!(
            reasoning = self.reasoning.contents().len(),
            answer = self.answer.contents().len(),
            "stream finished"
        );
        TurnOutcome {
            answer: self.answer.into_contents(),
            reasoning: self.reasoning.into_contents(),
        }
    }

    /// Raw reasoning received so far
    pub fn reasoning(&self) -> &str {
        self.reasoning.contents()
    }

    /// Raw answer received so far
    pub fn answer(&self) -> &str {
        self.answer.contents()
    }

    fn buffer_mut(&mut self, channel: Channel) -> &mut ChannelBuffer {
        match channel {
            Channel::Reasoning => &mut self.reasoning,
            Channel::Answer => &mut self.answer,
        }
    }

    fn emit<K: DisplaySink + ?Sized>(
        &self,
        sink: &mut K,
        channel: Channel,
        text: String,
        complete: bool,
    ) {
        if channel == Channel::Reasoning && !self.show_reasoning {
            return;
        }
        let event = if complete {
            DisplayEvent::Unit {
                channel,
                text: self.pipeline.format(channel, &text),
            }
        } else {
            DisplayEvent::Provisional {
                channel,
                text: self.pipeline.passthrough(&text),
            }
        };
        sink.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatOptions;

    fn run(events: &[StreamEvent], show_reasoning: bool) -> (Vec<DisplayEvent>, TurnOutcome) {
        let pipeline = Pipeline::default();
        let mut aggregator = ChunkAggregator::new(&pipeline, show_reasoning);
        let mut sink = Vec::new();
        for event in events {
            aggregator.push(event, &mut sink);
        }
        let outcome = aggregator.finish(&mut sink);
        (sink, outcome)
    }

    #[test]
    fn test_ordering_and_final_answer() {
        let (events, outcome) = run(
            &[
                StreamEvent::reasoning("Step "),
                StreamEvent::reasoning("one.\n"),
                StreamEvent::answer("42"),
            ],
            true,
        );
        assert_eq!(
            events,
            vec![
                DisplayEvent::Provisional {
                    channel: Channel::Reasoning,
                    text: "Step ".to_string()
                },
                DisplayEvent::Unit {
                    channel: Channel::Reasoning,
                    text: "Step one.\n".to_string()
                },
                DisplayEvent::Provisional {
                    channel: Channel::Answer,
                    text: "42".to_string()
                },
                DisplayEvent::Unit {
                    channel: Channel::Answer,
                    text: "42".to_string()
                },
            ]
        );
        assert_eq!(outcome.answer, "42");
        assert_eq!(outcome.reasoning, "Step one.\n");
    }

    #[test]
    fn test_units_are_formatted() {
        let (events, outcome) = run(&[StreamEvent::answer("so 3/4 of pi.")], true);
        assert_eq!(
            events,
            vec![DisplayEvent::Unit {
                channel: Channel::Answer,
                text: "so 3⁄4 of π.".to_string()
            }]
        );
        assert_eq!(outcome.answer, "so 3/4 of pi.");
    }

    #[test]
    fn test_hidden_reasoning_is_recorded_not_shown() {
        let (events, outcome) = run(
            &[
                StreamEvent::reasoning("think."),
                StreamEvent::reasoning(" more"),
                StreamEvent::answer("ok."),
            ],
            false,
        );
        assert!(events
            .iter()
            .all(|event| event.channel() == Some(Channel::Answer)));
        assert_eq!(outcome.reasoning, "think. more");
        assert_eq!(outcome.answer, "ok.");
    }

    #[test]
    fn test_channel_switch_closes_pending_unit() {
        let (events, outcome) = run(
            &[
                StreamEvent::reasoning("no period here"),
                StreamEvent::answer("Yes"),
                StreamEvent::answer(" it is"),
            ],
            true,
        );
        let units: Vec<(Option<Channel>, &str)> = events
            .iter()
            .filter(|event| matches!(event, DisplayEvent::Unit { .. }))
            .map(|event| (event.channel(), event.text()))
            .collect();
        assert_eq!(
            units,
            vec![
                (Some(Channel::Reasoning), "no period here"),
                (Some(Channel::Answer), "Yes it is"),
            ]
        );
        assert_eq!(outcome.reasoning, "no period here");
    }

    #[test]
    fn test_empty_delta_does_not_switch_channel() {
        let (events, _) = run(
            &[
                StreamEvent::reasoning("still "),
                StreamEvent::answer(""),
                StreamEvent::reasoning("going."),
            ],
            true,
        );
        let units: Vec<&str> = events
            .iter()
            .filter(|event| matches!(event, DisplayEvent::Unit { .. }))
            .map(DisplayEvent::text)
            .collect();
        assert_eq!(units, vec!["still going."]);
    }

    #[test]
    fn test_code_block_arrives_as_one_unit() {
        let pipeline = Pipeline::new(&FormatOptions::html());
        let mut aggregator = ChunkAggregator::new(&pipeline, true);
        let mut sink = Vec::new();
        for delta in ["Here:\n", "```zzz\n", "a.\n", "b\n", "```", "\n"] {
            aggregator.push(&StreamEvent::answer(delta), &mut sink);
        }
        aggregator.finish(&mut sink);

        let units: Vec<&str> = sink
            .iter()
            .filter(|event| matches!(event, DisplayEvent::Unit { .. }))
            .map(DisplayEvent::text)
            .collect();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0], "Here:\n");
        assert_eq!(
            units[1],
            "<div class=\"code-block\"><pre><code>a.\nb</code></pre></div>\n"
        );
    }

    #[test]
    fn test_inline_backticks_keep_units_flowing() {
        let (events, _) = run(
            &[
                StreamEvent::answer("Use ``` to fence."),
                StreamEvent::answer(" Next line"),
                StreamEvent::answer(".\n"),
            ],
            true,
        );
        let units: Vec<&str> = events
            .iter()
            .filter(|event| matches!(event, DisplayEvent::Unit { .. }))
            .map(DisplayEvent::text)
            .collect();
        assert_eq!(units, vec!["Use ``` to fence.", " Next line.\n"]);
    }

    #[test]
    fn test_empty_stream() {
        let (events, outcome) = run(&[], true);
        assert!(events.is_empty());
        assert_eq!(outcome, TurnOutcome::default());
    }
}
