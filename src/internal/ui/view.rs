use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Padding, Paragraph, Wrap},
};

use super::app::{App, InputMode};
use crate::internal::controller::ViewState;
use crate::internal::models::QueryMode;
use crate::internal::notification::NotificationType;
use crate::internal::render::ArticleCard;
use crate::utils::palette::Palette;

/// Width of the index column in front of each title.
const INDEX_WIDTH: usize = 4;
/// Descriptions longer than this many wrapped lines are cut with an ellipsis.
const MAX_DESCRIPTION_LINES: usize = 2;

#[tracing::instrument(skip(app, f))]
pub fn draw(app: &mut App, f: &mut Frame) {
    let start = std::time::Instant::now();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_top_bar(app, f, chunks[0]);

    match (app.cards.is_empty(), app.controller.state()) {
        (false, _) => {
            let body = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(4)])
                .split(chunks[1]);
            render_list(app, f, body[0]);
            render_selection(app, f, body[1]);
        }
        (true, ViewState::Loading) => render_message(
            app,
            f,
            chunks[1],
            &format!("{} Loading {}...", app.get_spinner_char(), list_label(app)),
            app.palette.muted,
        ),
        (true, ViewState::Empty) => {
            render_message(app, f, chunks[1], "No articles found", app.palette.muted)
        }
        (true, ViewState::Error) => {
            let message = app
                .controller
                .last_error()
                .unwrap_or("Could not fetch news")
                .to_string();
            render_message(app, f, chunks[1], &message, app.palette.error)
        }
        (true, ViewState::Idle | ViewState::Loaded) => {
            render_message(app, f, chunks[1], "Press r to load headlines", app.palette.muted)
        }
    }

    render_status_bar(app, f, chunks[2]);

    if app.input_mode == InputMode::Search {
        render_search_overlay(app, f);
    }

    if app.notification.is_some() {
        render_notification(app, f);
    }

    if app.config.logging.enable_performance_metrics && cfg!(debug_assertions) {
        tracing::debug!(elapsed = ?start.elapsed(), "render.draw");
    }
}

fn list_label(app: &App) -> String {
    match app.controller.mode() {
        QueryMode::Headlines => format!(
            "top headlines ({})",
            app.config.network.country.to_uppercase()
        ),
        QueryMode::Search => format!("results for \"{}\"", app.controller.query().query),
    }
}

/// Wrap `text` to `width` columns. Always returns at least one line.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let lines: Vec<String> = textwrap::wrap(text, width.max(1))
        .into_iter()
        .map(|line| line.into_owned())
        .collect();
    match lines.is_empty() {
        true => vec![String::new()],
        false => lines,
    }
}

/// The lines of one list entry: numbered title, meta line and description.
pub fn card_lines(
    index: usize,
    card: &ArticleCard,
    width: usize,
    now: i64,
    palette: &Palette,
) -> Vec<Line<'static>> {
    let text_width = width.saturating_sub(INDEX_WIDTH);
    let indent = " ".repeat(INDEX_WIDTH);
    let mut lines = Vec::new();

    for (i, chunk) in wrap_text(&card.title, text_width).into_iter().enumerate() {
        let lead = match i {
            0 => format!("{:<INDEX_WIDTH$}", index + 1),
            _ => indent.clone(),
        };
        lines.push(Line::from(vec![
            Span::styled(lead, Style::default().fg(palette.muted)),
            Span::styled(
                chunk,
                Style::default()
                    .fg(palette.foreground)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
    }

    let mut meta = vec![
        Span::raw(indent.clone()),
        Span::styled("by ", Style::default().fg(palette.border)),
        Span::styled(card.byline.clone(), Style::default().fg(palette.accent)),
    ];
    if let Some(domain) = &card.domain {
        meta.push(Span::styled(" | ", Style::default().fg(palette.border)));
        meta.push(Span::styled(domain.clone(), Style::default().fg(palette.muted)));
    }
    if let Some(ts) = card.published_at {
        meta.push(Span::styled(" | ", Style::default().fg(palette.border)));
        meta.push(Span::styled(
            crate::utils::datetime::format_relative(ts, now),
            Style::default().fg(palette.muted),
        ));
    }
    lines.push(Line::from(meta));

    if !card.description.is_empty() {
        let mut wrapped = wrap_text(&card.description, text_width);
        if wrapped.len() > MAX_DESCRIPTION_LINES {
            wrapped.truncate(MAX_DESCRIPTION_LINES);
            if let Some(last) = wrapped.last_mut() {
                last.push('…');
            }
        }
        for chunk in wrapped {
            lines.push(Line::from(vec![
                Span::raw(indent.clone()),
                Span::styled(chunk, Style::default().fg(palette.foreground)),
            ]));
        }
    }

    lines.push(Line::from(""));
    lines
}

fn render_list(app: &mut App, f: &mut Frame, area: Rect) {
    // Borders plus one column of padding on each side.
    let inner_width = area.width.saturating_sub(4) as usize;
    let now = jiff::Timestamp::now().as_second();

    let mut items: Vec<ListItem> = app
        .cards
        .iter()
        .enumerate()
        .map(|(idx, card)| ListItem::new(card_lines(idx, card, inner_width, now, &app.palette)))
        .collect();

    let total = app.controller.store().total_results();
    if app.controller.show_more() {
        let label = match app.controller.is_loading() {
            true => format!("{} Loading more...", app.get_spinner_char()),
            false => format!(
                "▼ More articles (m) | {} of {}",
                app.cards.len(),
                total
            ),
        };
        items.push(ListItem::new(Line::from(Span::styled(
            label,
            Style::default().fg(app.palette.accent),
        ))));
    }

    let title = format!(
        "News v{} - {} ({} of {})",
        app.app_version,
        list_label(app),
        app.cards.len(),
        total
    );

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .padding(Padding::horizontal(1))
                .border_style(Style::default().fg(app.palette.border))
                .title(title)
                .title_style(Style::default().fg(app.palette.foreground)),
        )
        .style(Style::default().bg(app.palette.background))
        .highlight_style(
            Style::default()
                .bg(app.palette.selection_bg)
                .fg(app.palette.selection_fg),
        );

    f.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_selection(app: &App, f: &mut Frame, area: Rect) {
    let lines = match app.selected_card() {
        Some(card) => vec![
            Line::from(vec![
                Span::styled("Link:  ", Style::default().fg(app.palette.muted)),
                Span::styled(card.url.clone(), Style::default().fg(app.palette.accent)),
            ]),
            Line::from(vec![
                Span::styled("Image: ", Style::default().fg(app.palette.muted)),
                Span::styled(
                    card.image_url.clone(),
                    Style::default().fg(app.palette.foreground),
                ),
            ]),
        ],
        None => vec![Line::from(Span::styled(
            "No article selected",
            Style::default().fg(app.palette.muted),
        ))],
    };

    let p = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .padding(Padding::horizontal(1))
                .border_style(Style::default().fg(app.palette.border))
                .title("Selected")
                .title_style(Style::default().fg(app.palette.foreground)),
        )
        .style(Style::default().bg(app.palette.background));
    f.render_widget(p, area);
}

fn render_message(app: &App, f: &mut Frame, area: Rect, message: &str, color: ratatui::style::Color) {
    let p = Paragraph::new(message.to_string())
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .padding(Padding::new(1, 1, area.height.saturating_sub(3) / 2, 0))
                .border_style(Style::default().fg(app.palette.border))
                .title(format!("News v{}", app.app_version))
                .title_style(Style::default().fg(app.palette.foreground)),
        )
        .style(Style::default().fg(color).bg(app.palette.background));
    f.render_widget(p, area);
}

fn render_top_bar(app: &App, f: &mut Frame, area: Rect) {
    let text = format!("Theme: {}", app.theme_service.current());

    let p = Paragraph::new(text)
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .padding(Padding::horizontal(1))
                .style(Style::default().bg(app.palette.background)),
        )
        .style(Style::default().fg(app.palette.foreground));
    f.render_widget(p, area);
}

/// Status bar text for the current input mode and view state.
pub fn status_text(app: &App) -> String {
    let counts = format!(
        "{}/{}",
        app.controller.store().len(),
        app.controller.store().total_results()
    );
    let clear_hint = match app.controller.clear_visible() {
        true => " | c: Clear search",
        false => "",
    };

    match (app.input_mode, app.controller.state()) {
        (InputMode::Search, _) => "Search: Type a term | Enter: Search | Esc: Cancel".to_string(),
        (InputMode::Normal, ViewState::Loading) => format!(
            "{} Loading {}... | {}{} | q: Quit",
            app.get_spinner_char(),
            list_label(app),
            counts,
            clear_hint
        ),
        (InputMode::Normal, ViewState::Error) => format!(
            "Error: {} | r: Retry | m: More{} | t: Theme | q: Quit",
            app.controller.last_error().unwrap_or("request failed"),
            clear_hint
        ),
        (InputMode::Normal, _) => format!(
            "{} | /: Search{} | j/k: Nav | m: More | Enter: Open | r: Reload | t: Theme | q: Quit",
            counts, clear_hint
        ),
    }
}

fn render_status_bar(app: &App, f: &mut Frame, area: Rect) {
    let p = Paragraph::new(status_text(app))
        .block(
            Block::default()
                .padding(Padding::horizontal(1))
                .style(Style::default().bg(app.palette.selection_bg)),
        )
        .style(Style::default().fg(app.palette.selection_fg));
    f.render_widget(p, area);
}

fn render_notification(app: &App, f: &mut Frame) {
    if let Some(notification) = &app.notification {
        let area = f.area();

        let popup_width = (notification.message.chars().count() as u16 + 4)
            .min(area.width.saturating_sub(4));
        let popup_height = 3;

        let popup_x = (area.width.saturating_sub(popup_width)) / 2;
        let popup_y = (area.height.saturating_sub(popup_height)) / 2;

        let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

        let bg_color = match notification.notification_type {
            NotificationType::Info => app.palette.selection_bg,
            NotificationType::Error => app.palette.error,
        };

        let popup = Paragraph::new(notification.message.as_str())
            .style(
                Style::default()
                    .bg(bg_color)
                    .fg(app.palette.selection_fg)
                    .add_modifier(Modifier::BOLD),
            )
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(app.palette.border))
                    .title(notification.notification_type.title()),
            )
            .alignment(Alignment::Center);

        f.render_widget(Clear, popup_area);
        f.render_widget(popup, popup_area);
    }
}

fn render_search_overlay(app: &App, f: &mut Frame) {
    let area = f.area();

    let search_width = 60.min(area.width.saturating_sub(4));
    let search_height = 3;

    let search_x = (area.width.saturating_sub(search_width)) / 2;
    let search_y = (area.height.saturating_sub(search_height)) / 2;

    let search_area = Rect::new(search_x, search_y, search_width, search_height);

    let input_line = Line::from(Span::styled(
        format!("{}█", app.search_input),
        Style::default().fg(app.palette.foreground),
    ));

    let search_box = Paragraph::new(input_line)
        .style(Style::default().bg(app.palette.background))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.palette.selection_bg))
                .title(" Search news ")
                .title_style(
                    Style::default()
                        .fg(app.palette.selection_fg)
                        .bg(app.palette.selection_bg)
                        .add_modifier(Modifier::BOLD),
                ),
        );

    f.render_widget(Clear, search_area);
    f.render_widget(search_box, search_area);
}
