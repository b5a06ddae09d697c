use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, List, ListItem, ListState, Paragraph, Wrap};

use super::model::QueryBrowser;

const LIST_HELP: &str = "↑/↓ move  enter open  esc quit";
const DETAIL_HELP: &str = "↑/↓ scroll  q query from this record  esc back";

pub fn draw(frame: &mut Frame, browser: &QueryBrowser) {
    let [body, help] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());
    let block = Block::bordered()
        .border_type(BorderType::Rounded)
        .title(" Query Results ");

    if browser.selected().is_some() {
        let lines: Vec<Line> = browser.detail_lines().into_iter().map(Line::from).collect();
        let detail = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((browser.scroll(), 0));
        frame.render_widget(detail, body);
        frame.render_widget(Paragraph::new(DETAIL_HELP), help);
        return;
    }

    let items: Vec<ListItem> = browser
        .neighbors()
        .iter()
        .map(|n| {
            let set = n.set.as_deref().unwrap_or("");
            ListItem::new(format!(
                "{}/{}/{}  distance {}",
                n.namespace, set, n.key, n.distance
            ))
        })
        .collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(browser.cursor()));
    frame.render_stateful_widget(list, body, &mut state);
    frame.render_widget(Paragraph::new(LIST_HELP), help);
}
