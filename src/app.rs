// ============================================
// src/app.rs
// 画面側の状態 (メニュー選択・ポインタ位置) と入力の振り分け
// ============================================

use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyCode, KeyEventKind, MouseButton, MouseEventKind};
use ratatui::layout::{Position, Rect};
use tracing::debug;

use crate::assets::{FlagArt, FlagAssets};
use crate::bank::QuestionBank;
use crate::error::QuizResult;
use crate::questions::PromptKind;
use crate::random::RandomSource;
use crate::session::{Phase, QuizSession, SessionEvent, SessionRules, SessionState};
use crate::ui;

/// メニューでの選択状態
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuSelection {
    pub kind: Option<PromptKind>,
    pub category: Option<String>,
    pub dropdown_open: bool,
}

/// アプリ全体の状態を管理する
pub struct App<'a, R> {
    session: QuizSession<'a, R>,
    /// セッション状態 (遷移関数に渡して、戻ってきたもので置き換える)
    state: SessionState,
    menu: MenuSelection,
    assets: FlagAssets,
    /// 最後に見たマウス位置 (ホバー表示用)
    pointer: Option<Position>,
    /// 最後に描画した枠の内側
    area: Rect,
    should_quit: bool,
}

impl<'a, R> App<'a, R> {
    pub fn new(bank: &'a QuestionBank, rules: SessionRules, assets: FlagAssets, rng: R) -> Self {
        Self {
            session: QuizSession::new(bank, rules, rng),
            state: SessionState::default(),
            menu: MenuSelection::default(),
            assets,
            pointer: None,
            area: Rect::default(),
            should_quit: false,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn menu(&self) -> &MenuSelection {
        &self.menu
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn max_lives(&self) -> u32 {
        self.session.rules().max_lives
    }

    pub fn feedback_duration(&self) -> Duration {
        self.session.rules().feedback_duration
    }

    /// 端末サイズが変わったら (描画のたびにも) 呼ぶ
    pub fn resize(&mut self, full: Rect) {
        self.area = ui::screen_area(full);
    }

    pub fn hovered(&self, rect: Rect) -> bool {
        self.pointer.is_some_and(|p| rect.contains(p))
    }

    pub fn flag_art(&mut self, code: &str) -> &FlagArt {
        self.assets.art(code)
    }

    /// ドロップダウンに出すカテゴリ。
    /// 形式が未選択なら、どちらかの形式で遊べるもの。
    pub fn menu_categories(&self) -> Vec<&'a str> {
        match self.menu.kind {
            Some(kind) => self.session.playable_categories(kind),
            None => {
                let bank = self.session.bank();
                let rules = self.session.rules();
                bank.categories()
                    .filter(|c| PromptKind::ALL.iter().any(|k| bank.playable(*k, c, rules)))
                    .collect()
            }
        }
    }
}

impl<R: RandomSource> App<'_, R> {
    /// MARK: 端末イベントの処理
    pub fn handle_event(&mut self, event: Event, now: Instant) -> QuizResult<()> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Enter => self.confirm(now)?,
                KeyCode::Char(c) => {
                    // 1-9 で選択肢を選ぶ
                    if let Some(n) = c.to_digit(10).filter(|n| *n >= 1) {
                        self.dispatch(SessionEvent::Answer(n as usize - 1), now)?;
                    }
                }
                _ => {}
            },
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                    self.pointer = Some(Position::new(mouse.column, mouse.row));
                }
                MouseEventKind::Down(MouseButton::Left) => {
                    self.pointer = Some(Position::new(mouse.column, mouse.row));
                    self.click(mouse.column, mouse.row, now)?;
                }
                _ => {}
            },
            Event::Resize(width, height) => self.resize(Rect::new(0, 0, width, height)),
            _ => {}
        }
        Ok(())
    }

    /// 毎フレーム呼ぶ (正誤表示の時間切れ判定)
    pub fn tick(&mut self, now: Instant) -> QuizResult<()> {
        self.dispatch(SessionEvent::Tick, now)
    }

    /// MARK: クリック位置からボタンを判定する。どこにも当たらなければ何もしない。
    pub fn click(&mut self, x: u16, y: u16, now: Instant) -> QuizResult<()> {
        let at = Position::new(x, y);
        match self.state.phase {
            Phase::Menu => self.click_menu(at, now),
            Phase::AwaitingAnswer => {
                let count = self
                    .state
                    .current_question
                    .as_ref()
                    .map_or(0, |q| q.options.len());
                let layout = ui::quiz_layout(self.area, count);
                match layout.options.iter().position(|r| r.contains(at)) {
                    Some(i) => self.dispatch(SessionEvent::Answer(i), now),
                    None => Ok(()),
                }
            }
            Phase::ShowingFeedback { .. } => Ok(()),
            Phase::GameOver => {
                if ui::game_over_layout(self.area).play_again.contains(at) {
                    self.dispatch(SessionEvent::Restart, now)?;
                }
                Ok(())
            }
        }
    }

    fn click_menu(&mut self, at: Position, now: Instant) -> QuizResult<()> {
        let categories = self.menu_categories();
        let layout = ui::menu_layout(self.area, categories.len());

        // 開いているドロップダウンは他のボタンより手前
        if self.menu.dropdown_open {
            if let Some(i) = layout.items.iter().position(|r| r.contains(at)) {
                self.menu.category = Some(categories[i].to_string());
                self.menu.dropdown_open = false;
                return Ok(());
            }
        }

        if let Some(i) = layout.modes.iter().position(|r| r.contains(at)) {
            self.select_kind(PromptKind::ALL[i]);
        } else if layout.dropdown.contains(at) {
            self.menu.dropdown_open = !self.menu.dropdown_open;
        } else if layout.start.contains(at) {
            self.start(now)?;
        }
        Ok(())
    }

    fn select_kind(&mut self, kind: PromptKind) {
        self.menu.kind = Some(kind);
        // 選び直した形式で遊べないカテゴリは外す
        if let Some(category) = &self.menu.category {
            if !self.session.playable_categories(kind).contains(&category.as_str()) {
                self.menu.category = None;
            }
        }
    }

    /// Enter: メニューなら開始、ゲームオーバーならメニューへ
    fn confirm(&mut self, now: Instant) -> QuizResult<()> {
        match self.state.phase {
            Phase::Menu => self.start(now),
            Phase::GameOver => self.dispatch(SessionEvent::Restart, now),
            _ => Ok(()),
        }
    }

    /// 形式とカテゴリが両方そろっているときだけ開始する
    fn start(&mut self, now: Instant) -> QuizResult<()> {
        let (Some(kind), Some(category)) = (self.menu.kind, self.menu.category.clone()) else {
            debug!("start ignored: mode or category not chosen");
            return Ok(());
        };
        self.menu.dropdown_open = false;
        self.dispatch(SessionEvent::Start { kind, category }, now)
    }

    fn dispatch(&mut self, event: SessionEvent, now: Instant) -> QuizResult<()> {
        let restart = event == SessionEvent::Restart;
        let state = std::mem::take(&mut self.state);
        self.state = self.session.transition(state, event, now)?;
        if restart && self.state.phase == Phase::Menu {
            self.menu = MenuSelection::default();
        }
        Ok(())
    }
}
