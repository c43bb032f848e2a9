use std::io::IsTerminal;
use std::time::Duration;

use anstyle::{AnsiColor, Effects, Style};
use indicatif::ProgressBar;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputStyle {
    Plain,
    Rich,
}

pub fn detect_output_style(force_plain: bool) -> OutputStyle {
    if force_plain || !std::io::stdout().is_terminal() {
        OutputStyle::Plain
    } else {
        OutputStyle::Rich
    }
}

/// Framing lines around the reporter stream. The reporter's literal lines are
/// never styled; acceptance probes grep those verbatim.
pub fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    let line = format!("{status}: {message}");
    match style {
        OutputStyle::Plain => line,
        OutputStyle::Rich => colorize(status_style(status), &line),
    }
}

pub fn start_spinner(style: OutputStyle, label: &str) -> Option<ProgressBar> {
    if style != OutputStyle::Rich {
        return None;
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(label.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    Some(spinner)
}

pub fn finish_spinner(spinner: Option<ProgressBar>) {
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
}

fn status_style(status: &str) -> Style {
    let color = match status {
        "done" => AnsiColor::BrightGreen,
        "fail" => AnsiColor::BrightRed,
        _ => AnsiColor::BrightCyan,
    };
    Style::new().fg_color(Some(color.into())).effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}

#[cfg(test)]
mod render_tests {
    use super::{render_status_line, OutputStyle};

    #[test]
    fn plain_status_line_is_uncolored() {
        assert_eq!(
            render_status_line(OutputStyle::Plain, "step", "staging R packages"),
            "step: staging R packages"
        );
    }

    #[test]
    fn rich_status_line_wraps_the_plain_text() {
        let line = render_status_line(OutputStyle::Rich, "done", "R packages staged");
        assert!(line.contains("done: R packages staged"));
        assert_ne!(line, "done: R packages staged");
    }
}
