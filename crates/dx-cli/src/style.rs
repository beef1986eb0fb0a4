use std::env;

use color_eyre::owo_colors::OwoColorize;
use dx_core::CommandStatus;

pub struct Style {
    enabled: bool,
}

impl Style {
    pub fn new(force_no_color: bool, is_tty: bool) -> Self {
        let env_no_color = env::var_os("NO_COLOR").is_some();
        Self {
            enabled: !(force_no_color || env_no_color) && is_tty,
        }
    }

    pub fn status(&self, status: &CommandStatus, text: &str) -> String {
        let (symbol, tone) = match status {
            CommandStatus::Ok => ("✔", Tone::Green),
            CommandStatus::UserError => ("✗", Tone::Yellow),
            CommandStatus::Failure => ("✖", Tone::Red),
        };
        self.paint(&format!("{symbol} {text}"), tone, true)
    }

    pub fn info(&self, text: &str) -> String {
        self.paint(text, Tone::Blue, false)
    }

    pub fn error_header(&self, status: &CommandStatus, text: &str) -> String {
        let tone = match status {
            CommandStatus::Failure => Tone::Red,
            _ => Tone::Yellow,
        };
        self.paint(text, tone, true)
    }

    pub fn fix_bullet(&self, text: &str) -> String {
        self.paint(text, Tone::Green, false)
    }

    pub fn table_header(&self, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        text.bold().to_string()
    }

    pub fn dim(&self, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        text.dimmed().to_string()
    }

    fn paint(&self, text: &str, tone: Tone, bold: bool) -> String {
        if !self.enabled {
            return text.to_string();
        }
        let colored = match tone {
            Tone::Green => text.green().to_string(),
            Tone::Yellow => text.yellow().to_string(),
            Tone::Red => text.red().to_string(),
            Tone::Blue => text.cyan().to_string(),
        };
        if bold {
            colored.bold().to_string()
        } else {
            colored
        }
    }
}

enum Tone {
    Green,
    Yellow,
    Red,
    Blue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_output_without_a_terminal() {
        let style = Style::new(false, false);
        assert_eq!(
            style.status(&CommandStatus::Ok, "dx check: ok"),
            "✔ dx check: ok"
        );
        assert_eq!(style.table_header("Tool"), "Tool");
    }

    #[test]
    fn no_color_flag_wins_over_tty() {
        let style = Style::new(true, true);
        assert_eq!(style.info("hint"), "hint");
    }
}
