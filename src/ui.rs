// ============================================
// src/ui.rs
// 画面レイアウトと描画
// (レイアウトはクリック判定でも同じものを使う)
// ============================================

use ratatui::{
    prelude::*,
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::app::App;
use crate::assets::FlagArt;
use crate::questions::PromptKind;
use crate::session::Phase;

const TITLE: &str = "World Quiz Game";

// ボタンの色 (通常・ホバー・選択中)
const BUTTON_BASE: Color = Color::Rgb(200, 0, 0);
const BUTTON_HOVER: Color = Color::Rgb(72, 118, 255);
const BUTTON_SELECTED: Color = Color::Rgb(65, 105, 225);

// 選択肢バーの色
const OPTION_IDLE: Color = Color::Rgb(230, 230, 230);
const OPTION_RIGHT: Color = Color::Rgb(0, 200, 0);
const OPTION_WRONG: Color = Color::Rgb(200, 0, 0);

const BUTTON_WIDTH: u16 = 20;
const DROPDOWN_WIDTH: u16 = 24;
const BUTTON_HEIGHT: u16 = 3;
const OPTION_MAX_WIDTH: u16 = 60;

// --------------------------------------------------
// レイアウト
// --------------------------------------------------

/// 枠線の内側 (各画面はここに配置する)
pub fn screen_area(full: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(full)
}

/// メニュー画面の配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuLayout {
    pub title: Rect,
    /// `PromptKind::ALL` と同じ順
    pub modes: [Rect; 2],
    pub dropdown: Rect,
    /// ドロップダウンの項目 (開いているときだけ有効)
    pub items: Vec<Rect>,
    pub start: Rect,
}

pub fn menu_layout(area: Rect, item_count: usize) -> MenuLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),             // [0] タイトル
            Constraint::Length(1),             // [1] 空白
            Constraint::Length(BUTTON_HEIGHT), // [2] 形式ボタン
            Constraint::Length(1),             // [3] 空白
            Constraint::Length(BUTTON_HEIGHT), // [4] ドロップダウン
            Constraint::Min(0),                // [5] 項目が広がる場所
            Constraint::Length(BUTTON_HEIGHT), // [6] START
            Constraint::Length(1),             // [7] 空白
        ])
        .split(area);

    let mode_row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(BUTTON_WIDTH),
            Constraint::Length(2),
            Constraint::Length(BUTTON_WIDTH),
            Constraint::Fill(1),
        ])
        .split(rows[2]);

    let dropdown = centered(rows[4], DROPDOWN_WIDTH);
    let items = (0..item_count)
        .map(|i| {
            let offset = BUTTON_HEIGHT.saturating_mul(i as u16 + 1);
            Rect {
                y: dropdown.y.saturating_add(offset),
                ..dropdown
            }
            .intersection(area)
        })
        .collect();

    MenuLayout {
        title: rows[0],
        modes: [mode_row[1], mode_row[3]],
        dropdown,
        items,
        start: centered(rows[6], BUTTON_WIDTH),
    }
}

/// 出題画面の配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizLayout {
    pub header: Rect,
    pub prompt: Rect,
    pub options: Vec<Rect>,
}

pub fn quiz_layout(area: Rect, option_count: usize) -> QuizLayout {
    let mut constraints = vec![
        Constraint::Length(1), // [0] 問題番号とライフ
        Constraint::Length(1), // [1] 空白
        Constraint::Min(3),    // [2] 国旗 or 問題文
        Constraint::Length(1), // [3] 空白
    ];
    constraints.extend((0..option_count).map(|_| Constraint::Length(BUTTON_HEIGHT)));
    constraints.push(Constraint::Length(1));

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let width = OPTION_MAX_WIDTH.min(area.width);
    QuizLayout {
        header: rows[0],
        prompt: centered(rows[2], width),
        options: (0..option_count).map(|i| centered(rows[4 + i], width)).collect(),
    }
}

/// ゲームオーバー画面の配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOverLayout {
    pub title: Rect,
    pub score: Rect,
    pub play_again: Rect,
}

pub fn game_over_layout(area: Rect) -> GameOverLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(1), // [1] Game Over!
            Constraint::Length(1),
            Constraint::Length(1), // [3] スコア
            Constraint::Length(1),
            Constraint::Length(BUTTON_HEIGHT), // [5] Play Again
            Constraint::Fill(1),
        ])
        .split(area);

    GameOverLayout {
        title: rows[1],
        score: rows[3],
        play_again: centered(rows[5], BUTTON_WIDTH),
    }
}

/// 横方向の中央に `width` 幅で置く
fn centered(area: Rect, width: u16) -> Rect {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(width),
            Constraint::Fill(1),
        ])
        .split(area)[1]
}

// --------------------------------------------------
// 描画
// --------------------------------------------------

pub fn ui<R>(f: &mut Frame, app: &mut App<'_, R>) {
    let size = f.area();
    app.resize(size);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {TITLE} "));
    let inner_area = block.inner(size);
    f.render_widget(block, size);

    match app.state().phase {
        Phase::Menu => draw_menu(f, app, inner_area),
        Phase::AwaitingAnswer | Phase::ShowingFeedback { .. } => draw_quiz(f, app, inner_area),
        Phase::GameOver => draw_game_over(f, app, inner_area),
    }
}

fn button<'a>(label: impl Into<Line<'a>>, selected: bool, hover: bool) -> Paragraph<'a> {
    let color = if selected {
        BUTTON_SELECTED
    } else if hover {
        BUTTON_HOVER
    } else {
        BUTTON_BASE
    };
    Paragraph::new(label.into())
        .style(Style::default().fg(Color::White).bg(color).bold())
        .block(Block::default().borders(Borders::ALL))
        .centered()
}

fn draw_menu<R>(f: &mut Frame, app: &App<'_, R>, area: Rect) {
    let categories = app.menu_categories();
    let layout = menu_layout(area, categories.len());
    let menu = app.menu();

    f.render_widget(
        Paragraph::new(TITLE)
            .style(Style::default().fg(Color::White).bold())
            .centered(),
        layout.title,
    );

    // 1. 形式ボタン
    for (kind, rect) in PromptKind::ALL.iter().zip(layout.modes) {
        f.render_widget(
            button(kind.label(), menu.kind == Some(*kind), app.hovered(rect)),
            rect,
        );
    }

    // 2. START (ドロップダウンが上に重なることがあるので先に描く)
    f.render_widget(button("START", false, app.hovered(layout.start)), layout.start);

    // 3. カテゴリのドロップダウン
    let arrow = if menu.dropdown_open { "▲" } else { "▼" };
    let label = menu.category.as_deref().unwrap_or("Select Difficulty");
    f.render_widget(
        button(
            format!("{label} {arrow}"),
            false,
            app.hovered(layout.dropdown),
        ),
        layout.dropdown,
    );

    if menu.dropdown_open {
        for (name, rect) in categories.iter().zip(&layout.items) {
            if rect.is_empty() {
                continue;
            }
            f.render_widget(Clear, *rect);
            f.render_widget(
                button(
                    *name,
                    menu.category.as_deref() == Some(*name),
                    app.hovered(*rect),
                ),
                *rect,
            );
        }
    }
}

fn draw_quiz<R>(f: &mut Frame, app: &mut App<'_, R>, area: Rect) {
    let state = app.state();
    let Some(question) = state.current_question.clone() else {
        return;
    };
    let layout = quiz_layout(area, question.options.len());
    let feedback = state.feedback();
    let awaiting = state.phase == Phase::AwaitingAnswer;

    // 0. 問題番号とライフ
    let progress = format!(
        "Question {}/{}  [{}]",
        state.question_index + 1,
        state.total_questions(),
        state.category.as_deref().unwrap_or_default()
    );
    let max_lives = app.max_lives();
    let hearts: Vec<Span> = (0..max_lives)
        .map(|i| {
            let color = if i < state.lives {
                Color::Red
            } else {
                Color::DarkGray
            };
            Span::styled("♥ ", Style::default().fg(color))
        })
        .collect();
    let header = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length((max_lives as u16).saturating_mul(2)),
        ])
        .split(layout.header);
    f.render_widget(Paragraph::new(progress).bold(), header[0]);
    f.render_widget(Paragraph::new(Line::from(hearts)), header[1]);

    // 1. 国旗 or 問題文
    let prompt = match question.kind {
        PromptKind::Flag => flag_panel(
            question.prompt_text(),
            app.flag_art(&question.subject.country_code),
        ),
        PromptKind::Capital => Paragraph::new(question.prompt_text())
            .style(Style::default().fg(Color::White).bold())
            .centered(),
    };
    f.render_widget(
        prompt.block(Block::default().borders(Borders::ALL)),
        layout.prompt,
    );

    // 2. 選択肢
    for (i, (option, rect)) in question.options.iter().zip(&layout.options).enumerate() {
        let bg = match feedback {
            Some((_, correct)) if i == correct => OPTION_RIGHT,
            Some((chosen, _)) if i == chosen => OPTION_WRONG,
            _ => OPTION_IDLE,
        };
        let border = if awaiting && app.hovered(*rect) {
            BUTTON_HOVER
        } else {
            Color::DarkGray
        };
        f.render_widget(
            Paragraph::new(format!("{}. {option}", i + 1))
                .style(Style::default().fg(Color::Black).bg(bg))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(border)),
                ),
            *rect,
        );
    }
}

fn flag_panel(prompt: String, art: &FlagArt) -> Paragraph<'static> {
    match art {
        FlagArt::Found { path, glyph } => {
            let file = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Paragraph::new(vec![
                Line::from(prompt).bold(),
                Line::from(""),
                Line::from(glyph.clone()),
                Line::from(Span::styled(file, Style::default().fg(Color::DarkGray))),
            ])
            .centered()
        }
        // 画像がなくても続行する
        FlagArt::Missing => Paragraph::new(vec![
            Line::from(prompt).bold(),
            Line::from(""),
            Line::from("Flag not found").fg(Color::Yellow),
        ])
        .centered(),
    }
}

fn draw_game_over<R>(f: &mut Frame, app: &App<'_, R>, area: Rect) {
    let layout = game_over_layout(area);
    let state = app.state();

    f.render_widget(
        Paragraph::new("Game Over!")
            .style(Style::default().fg(Color::White).bold())
            .centered(),
        layout.title,
    );
    f.render_widget(
        Paragraph::new(format!(
            "Final Score: {}/{}",
            state.score,
            state.total_questions()
        ))
        .style(Style::default().fg(Color::Yellow))
        .centered(),
        layout.score,
    );
    f.render_widget(
        button("Play Again", false, app.hovered(layout.play_again)),
        layout.play_again,
    );
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use ratatui::backend::TestBackend;

    use super::*;
    use crate::app::tests::{app, center, start_easy};
    use crate::bank::fixtures::bank;

    fn render<R>(app: &mut App<'_, R>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn layouts_fit_inside_the_screen() {
        let area = screen_area(Rect::new(0, 0, 80, 30));
        let menu = menu_layout(area, 3);
        for rect in menu.modes.iter().chain(&menu.items).chain([&menu.dropdown, &menu.start]) {
            assert_eq!(area.intersection(*rect), *rect);
        }
        assert!(!menu.modes[0].intersects(menu.modes[1]));

        let quiz = quiz_layout(area, 4);
        assert_eq!(quiz.options.len(), 4);
        for pair in quiz.options.windows(2) {
            assert!(!pair[0].intersects(pair[1]));
        }
    }

    #[test]
    fn menu_shows_buttons() {
        let bank = bank();
        let mut app = app(&bank);
        let screen = render(&mut app);
        assert!(screen.contains(TITLE));
        assert!(screen.contains("Flag Quiz"));
        assert!(screen.contains("Capital Quiz"));
        assert!(screen.contains("Select Difficulty"));
        assert!(screen.contains("START"));
    }

    #[test]
    fn capital_quiz_shows_prompt_and_progress() {
        let bank = bank();
        let mut app = app(&bank);
        render(&mut app);
        start_easy(&mut app, PromptKind::Capital, Instant::now());

        let screen = render(&mut app);
        let question = app.state().current_question.clone().unwrap();
        assert!(screen.contains("Question 1/10"));
        assert!(screen.contains(&format!(
            "What is the capital of {}?",
            question.subject.country_name
        )));
        for option in &question.options {
            assert!(screen.contains(option.as_str()));
        }
    }

    #[test]
    fn flag_quiz_without_images_shows_placeholder() {
        let bank = bank();
        let mut app = app(&bank);
        render(&mut app);
        start_easy(&mut app, PromptKind::Flag, Instant::now());

        let screen = render(&mut app);
        assert!(screen.contains("Flag not found"));
        assert!(screen.contains("Which country is this flag?"));
    }

    #[test]
    fn game_over_shows_final_score() {
        let bank = bank();
        let mut app = app(&bank);
        render(&mut app);
        let mut now = Instant::now();
        start_easy(&mut app, PromptKind::Capital, now);

        // 全部間違える
        while app.state().phase != Phase::GameOver {
            let wrong = (app.state().current_question.as_ref().unwrap().correct_index + 1) % 4;
            let layout = quiz_layout(app.area(), 4);
            let (x, y) = center(layout.options[wrong]);
            app.click(x, y, now).unwrap();
            now += app.feedback_duration();
            app.tick(now).unwrap();
        }

        let screen = render(&mut app);
        assert!(screen.contains("Game Over!"));
        assert!(screen.contains("Final Score: 0/10"));
        assert!(screen.contains("Play Again"));
    }
}
