//! Scrollback display for the conversation

use crate::conversation::{Role, Turn};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};
use unicode_width::UnicodeWidthStr;

/// Renders every turn in order, newest at the bottom.
///
/// `scroll` counts lines up from the bottom.
pub struct HistoryView<'a> {
    pub turns: &'a [Turn],
    pub error: Option<&'a str>,
    pub notice: Option<&'a str>,
    pub pending: bool,
    pub scroll: u16,
}

impl Widget for HistoryView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title("Conversation");
        let inner_area = block.inner(area);
        block.render(area, buf);

        let lines = self.lines(inner_area.width);
        let height = inner_area.height as usize;
        let end = lines.len().saturating_sub(self.scroll as usize);
        let start = end.saturating_sub(height);

        for (i, line) in lines[start..end].iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

impl<'a> HistoryView<'a> {
    /// All display lines, before scrolling is applied
    pub fn lines(&self, width: u16) -> Vec<Line<'a>> {
        let mut all_lines = Vec::new();

        if self.turns.is_empty() && !self.pending {
            all_lines.push(Line::from(Span::styled(
                "Start by typing a message below. Enter sends, Esc quits.",
                Style::default().fg(Color::DarkGray),
            )));
        }

        for turn in self.turns {
            all_lines.push(Line::from(Span::styled(
                format!("{}:", turn.role().label()),
                role_style(turn.role()).add_modifier(Modifier::BOLD),
            )));
            for content_line in wrap_text(turn.text(), width.saturating_sub(2) as usize) {
                all_lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(content_line, role_style(turn.role())),
                ]));
            }
            all_lines.push(Line::default());
        }

        if self.pending {
            all_lines.push(Line::from(Span::styled(
                "Thinking...",
                Style::default().fg(Color::Yellow),
            )));
        }

        if let Some(error) = self.error {
            for line in wrap_text(&format!("Error: {error}"), width as usize) {
                all_lines.push(Line::from(Span::styled(line, Style::default().fg(Color::Red))));
            }
        }

        if let Some(notice) = self.notice {
            for line in notice.lines() {
                all_lines.push(Line::from(Span::styled(
                    line.to_string(),
                    Style::default().fg(Color::Cyan),
                )));
            }
        }

        all_lines
    }
}

fn role_style(role: Role) -> Style {
    match role {
        Role::User => Style::default().fg(Color::Blue),
        Role::Assistant => Style::default().fg(Color::Green),
    }
}

/// Wrap text to fit within the given display width, keeping explicit line
/// breaks. Words wider than a line are split across lines.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current_line = String::new();
        let mut current_width = 0;

        for word in paragraph.split_whitespace() {
            let word_width = UnicodeWidthStr::width(word);
            if current_width > 0 && current_width + 1 + word_width > width {
                lines.push(std::mem::take(&mut current_line));
                current_width = 0;
            }

            if word_width > width {
                for ch in word.chars() {
                    let cw = UnicodeWidthStr::width(ch.encode_utf8(&mut [0; 4]));
                    if current_width > 0 && current_width + cw > width {
                        lines.push(std::mem::take(&mut current_line));
                        current_width = 0;
                    }
                    current_line.push(ch);
                    current_width += cw;
                }
                continue;
            }

            if current_width > 0 {
                current_line.push(' ');
                current_width += 1;
            }
            current_line.push_str(word);
            current_width += word_width;
        }

        lines.push(current_line);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_text(buf: &Buffer) -> String {
        let area = buf.area;
        let mut text = String::new();
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                text.push_str(buf.get(x, y).symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn wrap_breaks_on_words_and_newlines() {
        assert_eq!(
            wrap_text("the quick brown fox", 10),
            vec!["the quick", "brown fox"]
        );
        assert_eq!(wrap_text("a\n\nb", 10), vec!["a", "", "b"]);
        assert_eq!(
            wrap_text("averyveryverylongword", 5),
            vec!["avery", "veryv", "erylo", "ngwor", "d"]
        );
        assert_eq!(wrap_text("ok 漢字漢字", 4), vec!["ok", "漢字", "漢字"]);
        assert_eq!(wrap_text("", 5), vec![""]);
    }

    #[test]
    fn long_unbroken_reply_stays_visible() {
        let url = "https://example.com/a/very/long/path/that/ends/TAIL";
        let turns = vec![Turn::user("link?"), Turn::assistant(url)];
        let view = HistoryView {
            turns: &turns,
            error: None,
            notice: None,
            pending: false,
            scroll: 0,
        };
        let area = Rect::new(0, 0, 30, 12);
        let mut buf = Buffer::empty(area);
        view.render(area, &mut buf);

        let text = buffer_text(&buf);
        assert!(text.contains("https://example.com/a/very"));
        assert!(text.contains("/long/path/that/ends/TAIL"));
    }

    #[test]
    fn renders_turns_in_order_with_error() {
        let turns = vec![Turn::user("hello"), Turn::assistant("hi")];
        let view = HistoryView {
            turns: &turns,
            error: Some("boom"),
            notice: None,
            pending: false,
            scroll: 0,
        };
        let area = Rect::new(0, 0, 30, 12);
        let mut buf = Buffer::empty(area);
        view.render(area, &mut buf);

        let text = buffer_text(&buf);
        let you = text.find("You:").expect("user label missing");
        let assistant = text.find("Assistant:").expect("assistant label missing");
        assert!(you < assistant);
        assert!(text.contains("hello"));
        assert!(text.contains("Error: boom"));
    }

    #[test]
    fn shows_latest_lines_when_overflowing() {
        let turns: Vec<Turn> = (0..10).map(|i| Turn::user(format!("msg{i}"))).collect();
        let view = HistoryView {
            turns: &turns,
            error: None,
            notice: None,
            pending: true,
            scroll: 0,
        };
        let area = Rect::new(0, 0, 20, 6);
        let mut buf = Buffer::empty(area);
        view.render(area, &mut buf);

        let text = buffer_text(&buf);
        assert!(text.contains("Thinking..."));
        assert!(text.contains("msg9"));
        assert!(!text.contains("msg0"));
    }

    #[test]
    fn scrolling_reveals_older_lines() {
        let turns: Vec<Turn> = (0..10).map(|i| Turn::user(format!("msg{i}"))).collect();
        let view = HistoryView {
            turns: &turns,
            error: None,
            notice: None,
            pending: false,
            scroll: 27,
        };
        let area = Rect::new(0, 0, 20, 6);
        let mut buf = Buffer::empty(area);
        view.render(area, &mut buf);

        let text = buffer_text(&buf);
        assert!(text.contains("msg0"));
        assert!(!text.contains("msg9"));
    }
}
