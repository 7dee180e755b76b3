use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::app::{App, InputMode, PreviewMode, SaveMode};

const SHORTCUTS: [(&str, &str); 7] = [
    ("SPACE", "Select"),
    ("/", "Search"),
    ("P", "Preview Mode"),
    ("ALT+J/K", "Scroll"),
    ("CTRL+S", "Save"),
    ("ENTER", "Save & Quit"),
    ("Q", "Quit"),
];

/// Draws the whole picker for the current frame.
pub fn draw(f: &mut Frame, app: &App, host: &str) {
    let [header, body, search, status] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(10),
        Constraint::Length(3),
        Constraint::Length(5),
    ])
    .areas(f.area());
    let [list, preview] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(body);

    draw_header(f, host, header);
    draw_templates(f, app, list);
    draw_preview(f, app, preview);
    draw_search(f, app, search);
    draw_status(f, app, status);

    if app.input_mode == InputMode::Confirm {
        draw_save_prompt(f, app);
    }
}

fn draw_header(f: &mut Frame, host: &str, area: Rect) {
    let title = Line::from(vec![
        Span::styled("gogi", Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)),
        Span::raw("  templates from "),
        Span::styled(host.to_string(), Style::default().fg(Color::Cyan)),
    ]);
    let header = Paragraph::new(title)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Magenta)),
        );
    f.render_widget(header, area);
}

fn draw_templates(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = if app.is_loading {
        vec![
            ListItem::new("Fetching template list...")
                .style(Style::default().fg(Color::DarkGray).italic()),
        ]
    } else if app.visible.is_empty() {
        vec![ListItem::new("No templates match.").style(Style::default().fg(Color::Yellow))]
    } else {
        app.visible
            .iter()
            .map(|name| {
                if app.selected.contains(name) {
                    ListItem::new(format!("[x] {}", name))
                        .style(Style::default().fg(Color::Green).bold())
                } else {
                    ListItem::new(format!("[ ] {}", name))
                }
            })
            .collect()
    };

    let mut state = ListState::default();
    if !app.visible.is_empty() {
        state.select(Some(app.cursor));
    }

    let title = format!(" Templates {}/{} ", app.visible.len(), app.templates.len());
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White).bold())
        .highlight_symbol("> ");

    f.render_stateful_widget(list, area, &mut state);
}

fn draw_preview(f: &mut Frame, app: &App, area: Rect) {
    let title = match app.preview_mode {
        PreviewMode::Highlighted => " Preview: highlighted ",
        PreviewMode::Combined => " Preview: selection ",
    };

    let preview = Paragraph::new(app.preview_text())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(title, Style::default().fg(Color::Yellow).bold()))
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.preview_scroll, 0));

    f.render_widget(preview, area);
}

fn draw_search(f: &mut Frame, app: &App, area: Rect) {
    let editing = app.input_mode == InputMode::Search;
    let (style, title) = if editing {
        (Style::default().fg(Color::Cyan).bold(), " Search ")
    } else {
        (Style::default().fg(Color::DarkGray), " Search (press / to edit) ")
    };

    let input = Paragraph::new(app.query.as_str())
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(title).border_style(style));
    f.render_widget(input, area);

    if editing {
        let offset = u16::try_from(app.query.chars().count()).unwrap_or(u16::MAX);
        let x = area.x.saturating_add(1).saturating_add(offset);
        let x = x.min(area.right().saturating_sub(2));
        f.set_cursor_position((x, area.y + 1));
    }
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let message = if let Some(msg) = &app.notification {
        badge_line(" DONE ", Color::Green, msg, Color::LightGreen)
    } else if let Some(err) = &app.error {
        badge_line(" ERROR ", Color::Red, err, Color::LightRed)
    } else if app.is_saving {
        badge_line(" SAVING ", Color::Yellow, "Fetching selection...", Color::Yellow)
    } else if app.selected.is_empty() {
        badge_line(" SELECTED (0) ", Color::Cyan, "None", Color::DarkGray)
    } else {
        let label = format!(" SELECTED ({}) ", app.selected.len());
        badge_line(&label, Color::Cyan, &app.selection_summary(), Color::Green)
    };

    let mut shortcuts = Vec::new();
    for (key, desc) in SHORTCUTS {
        shortcuts.push(Span::styled(
            format!(" {} ", key),
            Style::default().bg(Color::DarkGray).fg(Color::White).bold(),
        ));
        shortcuts.push(Span::raw(format!(" {}  ", desc)));
    }

    let status = Paragraph::new(vec![message, Line::default(), Line::from(shortcuts)])
        .block(Block::default().borders(Borders::ALL).title(" Status "));
    f.render_widget(status, area);
}

fn badge_line(badge: &str, badge_color: Color, text: &str, text_color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(badge.to_string(), Style::default().bg(badge_color).fg(Color::Black).bold()),
        Span::raw(" "),
        Span::styled(text.to_string(), Style::default().fg(text_color)),
    ])
}

/// Asks whether an existing `.gitignore` is appended to or replaced.
fn draw_save_prompt(f: &mut Frame, app: &App) {
    let area = centered(f.area(), 50, 9);
    f.render_widget(Clear, area);

    let option = |label: &'static str, mode: SaveMode, color: Color| {
        if app.save_mode == mode {
            Span::styled(label, Style::default().bg(color).fg(Color::Black).bold())
        } else {
            Span::styled(label, Style::default().fg(color))
        }
    };

    let text = vec![
        Line::default(),
        Line::from("A .gitignore already exists in this directory."),
        Line::default(),
        Line::from(vec![
            option(" [A] Append ", SaveMode::Append, Color::Green),
            Span::raw("    "),
            option(" [O] Overwrite ", SaveMode::Overwrite, Color::Red),
        ]),
        Line::default(),
        Line::from(Span::styled(
            "Enter confirms, Esc cancels",
            Style::default().fg(Color::DarkGray).italic(),
        )),
    ];

    let prompt = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(" Save ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow).bold()),
        );
    f.render_widget(prompt, area);
}

fn centered(area: Rect, width_percent: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height)]).flex(Flex::Center).areas(area);
    let [cell] = Layout::horizontal([Constraint::Percentage(width_percent)])
        .flex(Flex::Center)
        .areas(row);
    cell
}
