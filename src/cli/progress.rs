// src/cli/progress.rs — Terminal rendering of completion blocks

use crossterm::style::{Color, Stylize};

use crate::core::transcript::STOP_NOTICE;
use crate::core::types::{CompletionTag, ProgressEvent};

/// Console color for each completion tag.
pub fn tag_color(tag: CompletionTag) -> Color {
    match tag {
        CompletionTag::Generation => Color::Green,
        CompletionTag::Reflection => Color::Blue,
        CompletionTag::Default => Color::White,
    }
}

/// Plain text for an event, with the color it should be shown in.
pub fn format_event(event: &ProgressEvent) -> (String, Color) {
    match event {
        ProgressEvent::StepStart { step, max_steps } => {
            (format!("[step {}/{}]", step, max_steps), Color::DarkGrey)
        }
        ProgressEvent::Completion { tag, content } => (
            format!("\n\n{}\n\n{}", tag.label(), content),
            tag_color(*tag),
        ),
        ProgressEvent::StopMarkerFound { .. } => (STOP_NOTICE.to_string(), Color::Red),
        ProgressEvent::Complete { steps, stop } => (
            format!("[done] steps={} ({})", steps, stop),
            Color::DarkGrey,
        ),
    }
}

/// Build a progress callback that writes colored blocks to stderr.
///
/// Stdout stays reserved for the final output.
pub fn terminal_progress() -> impl Fn(ProgressEvent) + Send + Sync + 'static {
    move |event| {
        let (text, color) = format_event(&event);
        eprintln!("{}", text.with(color));
    }
}
