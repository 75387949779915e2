use crate::ui::conversation::commands::{parse_slash_command, ParsedCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};
use unicode_width::UnicodeWidthStr;

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted(String),
    Command(ParsedCommand),
    None,
}

/// Single-line text input. One submission produces one string.
#[derive(Debug, Clone, Default)]
pub struct ConversationComposer {
    content: String,
    /// Byte offset, always on a char boundary
    cursor: usize,
    placeholder: String,
    has_focus: bool,
}

impl ConversationComposer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            has_focus: true,
            ..Default::default()
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        match key.code {
            KeyCode::Enter => {
                if self.content.trim().is_empty() {
                    return ComposerResult::None;
                }
                let content = std::mem::take(&mut self.content);
                self.cursor = 0;
                return match parse_slash_command(&content) {
                    Some(command) => ComposerResult::Command(command),
                    None => ComposerResult::Submitted(content),
                };
            }
            KeyCode::Char(c) => {
                self.content.insert(self.cursor, c);
                self.cursor += c.len_utf8();
            }
            KeyCode::Backspace => {
                if let Some(prev) = self.prev_boundary() {
                    self.content.remove(prev);
                    self.cursor = prev;
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.content.len() {
                    self.content.remove(self.cursor);
                }
            }
            KeyCode::Left => {
                if let Some(prev) = self.prev_boundary() {
                    self.cursor = prev;
                }
            }
            KeyCode::Right => {
                if let Some(c) = self.content[self.cursor..].chars().next() {
                    self.cursor += c.len_utf8();
                }
            }
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.content.len(),
            _ => {}
        }

        ComposerResult::None
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.content[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(index, _)| index)
    }

    pub fn set_focus(&mut self, has_focus: bool) {
        self.has_focus = has_focus;
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

impl Widget for &ConversationComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Message")
            .style(if self.has_focus {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            });

        let inner_area = block.inner(area);
        block.render(area, buf);

        let line = if self.content.is_empty() {
            Line::from(vec![Span::styled(
                self.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            )])
        } else {
            let mut content = self.content.clone();
            if self.has_focus {
                content.insert(self.cursor, '▌');
            }
            let visible = visible_window(&content, self.cursor, inner_area.width as usize);
            Line::from(vec![Span::raw(visible.to_string())])
        };

        buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
    }
}

/// Slice of `text` that fits in `width` columns and contains the char at byte
/// offset `focus`. The window ends just after the focus when the text overflows
/// on both sides.
fn visible_window(text: &str, focus: usize, width: usize) -> &str {
    if width == 0 || UnicodeWidthStr::width(text) <= width {
        return text;
    }

    let chars: Vec<(usize, usize)> = text
        .char_indices()
        .map(|(index, ch)| (index, UnicodeWidthStr::width(ch.encode_utf8(&mut [0; 4]))))
        .collect();
    let focus_index = chars
        .iter()
        .position(|(index, _)| *index >= focus)
        .unwrap_or(chars.len());

    let mut start = focus_index;
    let mut end = focus_index;
    let mut used = 0;
    if let Some((_, w)) = chars.get(focus_index) {
        end += 1;
        used = *w;
    }
    while start > 0 && used + chars[start - 1].1 <= width {
        start -= 1;
        used += chars[start].1;
    }
    while end < chars.len() && used + chars[end].1 <= width {
        used += chars[end].1;
        end += 1;
    }

    let from = chars.get(start).map_or(text.len(), |(index, _)| *index);
    let to = chars.get(end).map_or(text.len(), |(index, _)| *index);
    &text[from..to]
}
