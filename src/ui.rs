use fastlegend::{
    leaderboard::Leaderboard,
    mode::Mode,
    preferences::{ColorMode, Theme},
    session::TypingSession,
    util::{format_clock, format_secs, round1},
    MetricsResult,
};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

fn accent(theme: Theme) -> Color {
    match theme {
        Theme::Spotify => Color::Rgb(30, 215, 96),
        Theme::Ocean => Color::Cyan,
        Theme::Sunset => Color::Rgb(255, 140, 66),
        Theme::Forest => Color::Rgb(74, 160, 90),
        Theme::Cyberpunk => Color::Magenta,
    }
}

fn base_style(color_mode: ColorMode) -> Style {
    match color_mode {
        ColorMode::Light => Style::default().fg(Color::Black),
        ColorMode::Dark => Style::default().fg(Color::White),
        ColorMode::Auto => Style::default(),
    }
}

pub fn draw(app: &App, f: &mut Frame) {
    match app.state {
        AppState::Typing => render_typing(app, f),
        AppState::Results => render_results(app, f),
        AppState::Leaderboard => render_leaderboard(app, f),
    }
}

fn clock_label(session: &TypingSession) -> String {
    match session.remaining() {
        Some(remaining) => format!("{}s", format_secs(remaining)),
        None => format_clock(session.elapsed()),
    }
}

fn stats_bar(session: &TypingSession, accent_style: Style) -> Line<'static> {
    let live = session.metrics();
    let label = Style::default().add_modifier(Modifier::DIM);

    let mut spans = vec![
        Span::styled("wpm ", label),
        Span::styled(format!("{:.0}", live.wpm), accent_style),
        Span::raw("   "),
        Span::styled("acc ", label),
        Span::styled(format!("{:.1}%", live.accuracy), accent_style),
        Span::raw("   "),
        Span::styled("time ", label),
        Span::styled(clock_label(session), accent_style),
        Span::raw("   "),
        Span::styled("chars ", label),
        Span::styled(session.typed().chars().count().to_string(), accent_style),
    ];

    if session.config().mode == Mode::Words {
        spans.push(Span::raw("   "));
        spans.push(Span::styled("words ", label));
        spans.push(Span::styled(
            format!("{}/{}", session.words_typed(), session.config().duration),
            accent_style,
        ));
    }

    Line::from(spans)
}

/// Target text coloured by what has been typed so far
fn prompt_line(session: &TypingSession) -> Line<'static> {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = bold_style.fg(Color::Green);
    let red_bold_style = bold_style.fg(Color::Red);
    let dim_bold_style = bold_style.add_modifier(Modifier::DIM);
    let cursor_style = dim_bold_style.add_modifier(Modifier::UNDERLINED);

    let typed = session.typed().chars().collect::<Vec<char>>();
    let target = session.target().chars().collect::<Vec<char>>();

    let mut spans = typed
        .iter()
        .enumerate()
        .map(|(idx, &c)| match target.get(idx) {
            Some(&expected) if expected == c => Span::styled(c.to_string(), green_bold_style),
            _ => Span::styled(
                match c {
                    ' ' => "·".to_owned(),
                    c => c.to_string(),
                },
                red_bold_style,
            ),
        })
        .collect::<Vec<Span>>();

    if let Some(cursor) = target.get(typed.len()) {
        spans.push(Span::styled(cursor.to_string(), cursor_style));
    }
    if typed.len() + 1 < target.len() {
        spans.push(Span::styled(
            target[typed.len() + 1..].iter().collect::<String>(),
            dim_bold_style,
        ));
    }

    Line::from(spans)
}

fn render_typing(app: &App, f: &mut Frame) {
    let area = f.area();
    let session = &app.session;
    let accent_style = Style::default()
        .fg(accent(app.config.theme))
        .add_modifier(Modifier::BOLD);

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let prompt_width = session.target().width() as u16;
    let prompt_lines = if prompt_width <= max_chars_per_line {
        1
    } else {
        prompt_width / max_chars_per_line + 2
    };
    let padding = area.height.saturating_sub(prompt_lines + 4) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(padding),
            Constraint::Length(2), // stats bar
            Constraint::Length(prompt_lines),
            Constraint::Length(2), // status
            Constraint::Min(0),
        ])
        .split(area);

    f.render_widget(
        Paragraph::new(stats_bar(session, accent_style))
            .style(base_style(app.config.color_mode))
            .alignment(Alignment::Center),
        chunks[1],
    );

    f.render_widget(
        Paragraph::new(prompt_line(session))
            .alignment(if prompt_lines == 1 {
                Alignment::Center
            } else {
                Alignment::Left
            })
            .wrap(Wrap { trim: false }),
        chunks[2],
    );

    let status = if session.is_paused() {
        Span::styled(
            "PAUSED - ctrl+p to resume",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        )
    } else {
        let hint = match session.config().mode {
            Mode::Zen => "enter finish / tab new / ctrl+p pause / ctrl+l leaderboard / esc quit",
            _ => "tab new / ctrl+p pause / ctrl+l leaderboard / esc quit",
        };
        Span::styled(hint, Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM))
    };
    f.render_widget(
        Paragraph::new(Line::from(status)).alignment(Alignment::Center),
        chunks[3],
    );
}

fn result_lines(result: &MetricsResult, accent_style: Style) -> Vec<Line<'static>> {
    let label = Style::default().add_modifier(Modifier::DIM);
    let row = |name: &'static str, value: String| {
        Line::from(vec![
            Span::styled(format!("{name:>12}  "), label),
            Span::styled(value, accent_style),
        ])
    };

    vec![
        row("wpm", format!("{:.0}", result.wpm)),
        row("raw", format!("{:.0}", result.raw_wpm)),
        row("accuracy", format!("{}%", round1(result.accuracy))),
        row("errors", result.errors.to_string()),
        row("consistency", format!("{}%", round1(result.consistency))),
        row("time", format!("{}s", result.time_taken_secs)),
        row("mode", result.mode.to_string()),
    ]
}

fn render_results(app: &App, f: &mut Frame) {
    let area = f.area();
    let accent_style = Style::default()
        .fg(accent(app.config.theme))
        .add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(9),    // result block
            Constraint::Length(1), // personal bests
            Constraint::Length(1), // status
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let body = match &app.last_result {
        Some(result) => result_lines(result, accent_style),
        None => vec![Line::from("no result yet")],
    };
    f.render_widget(
        Paragraph::new(body).block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(" results ", accent_style)),
        ),
        chunks[0],
    );

    let prefs = app.prefs.prefs();
    let bests = format!(
        "best {:.0} wpm / {}% acc / {} tests / avg {:.0} wpm",
        prefs.best_wpm,
        round1(prefs.best_accuracy),
        prefs.total_tests,
        prefs.average_wpm
    );
    f.render_widget(
        Paragraph::new(Span::styled(bests, Style::default().add_modifier(Modifier::BOLD)))
            .alignment(Alignment::Center),
        chunks[1],
    );

    if let Some(status) = &app.status {
        f.render_widget(
            Paragraph::new(Span::styled(
                status.clone(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ))
            .alignment(Alignment::Center),
            chunks[2],
        );
    }

    f.render_widget(
        Paragraph::new(Span::styled(
            "(r)etry / (n)ew / (l)eaderboard / (esc)ape",
            italic_style,
        )),
        chunks[4],
    );
}

fn leaderboard_table(board: &Leaderboard, accent_style: Style) -> Table<'static> {
    let header = Row::new(vec!["#", "name", "location", "wpm", "acc", "tests"])
        .style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));

    let rows = board
        .display()
        .iter()
        .map(|ranked| {
            let style = if ranked.is_current_user {
                accent_style
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(ranked.rank.to_string()),
                Cell::from(ranked.entry.name.clone()),
                Cell::from(ranked.entry.location.clone()),
                Cell::from(format!("{:.0}", ranked.entry.best_wpm)),
                Cell::from(format!("{}%", round1(ranked.entry.best_accuracy))),
                Cell::from(ranked.entry.tests_completed.to_string()),
            ])
            .style(style)
        })
        .collect::<Vec<Row>>();

    Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Min(12),
            Constraint::Min(12),
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(7),
        ],
    )
    .header(header)
}

fn render_leaderboard(app: &App, f: &mut Frame) {
    let area = f.area();
    let accent_style = Style::default()
        .fg(accent(app.config.theme))
        .add_modifier(Modifier::BOLD);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(3), // aggregates
            Constraint::Min(0),    // table
            Constraint::Length(1), // your rank
            Constraint::Length(1), // legend
        ])
        .split(area);

    let title_block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(" global leaderboard ", accent_style));

    if !app.snapshot.is_loaded() {
        f.render_widget(
            Paragraph::new("loading leaderboard...")
                .block(title_block)
                .alignment(Alignment::Center),
            chunks[0],
        );
        return;
    }

    let board = app.leaderboard();
    let stats = board.stats();
    let summary = format!(
        "{} players / top {:.0} wpm / best {}% acc / {} tests",
        stats.players,
        stats.max_wpm,
        round1(stats.max_accuracy),
        stats.total_tests
    );
    f.render_widget(
        Paragraph::new(summary)
            .block(title_block)
            .alignment(Alignment::Center),
        chunks[0],
    );

    f.render_widget(leaderboard_table(&board, accent_style), chunks[1]);

    let rank_line = match board.current_user_rank() {
        Some(rank) => format!("your rank: #{rank}"),
        None => "register with `fastlegend register` and finish a test to appear here".to_string(),
    };
    f.render_widget(
        Paragraph::new(Span::styled(rank_line, accent_style)).alignment(Alignment::Center),
        chunks[2],
    );

    f.render_widget(
        Paragraph::new(Span::styled(
            "(b)ack / (n)ew / (esc)ape",
            Style::default().add_modifier(Modifier::ITALIC),
        )),
        chunks[3],
    );
}
