// ============================================
// src/session.rs
// クイズ進行のステートマシン
// (メニュー -> 出題 -> 正誤表示 -> 次の問題 / ゲームオーバー)
// ============================================

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::bank::{CountryEntry, QuestionBank};
use crate::error::{QuizError, QuizResult};
use crate::questions::{PromptKind, Question};
use crate::random::RandomSource;

/// 1セッションのルール (問題数・選択肢数・ライフ・正誤表示時間)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRules {
    pub num_questions: usize,
    pub num_options: usize,
    pub max_lives: u32,
    pub feedback_duration: Duration,
}

impl Default for SessionRules {
    fn default() -> Self {
        Self {
            num_questions: 10,
            num_options: 4,
            max_lives: 3,
            feedback_duration: Duration::from_millis(1500),
        }
    }
}

impl SessionRules {
    pub fn validate(&self) -> QuizResult<()> {
        if self.num_questions == 0 {
            return Err(QuizError::config("num_questions must be at least 1"));
        }
        if self.num_options < 2 {
            return Err(QuizError::config("num_options must be at least 2"));
        }
        if self.max_lives == 0 {
            return Err(QuizError::config("max_lives must be at least 1"));
        }
        Ok(())
    }
}

/// 進行フェーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Menu,
    AwaitingAnswer,
    /// 正誤表示中。選んだ番号と表示開始時刻を持つ。
    ShowingFeedback {
        chosen: usize,
        since: Instant,
    },
    GameOver,
}

/// セッションの状態。遷移関数だけがこれを作り替える。
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub phase: Phase,
    pub question_index: usize,
    pub lives: u32,
    pub score: u32,
    pub current_question: Option<Question>,
    pub kind: Option<PromptKind>,
    pub category: Option<String>,
    /// このセッションで出題する国 (開始時に抽選)
    deck: Vec<CountryEntry>,
    /// 誤答候補の元になる答えの一覧
    pool: Vec<String>,
}

impl SessionState {
    pub fn total_questions(&self) -> usize {
        self.deck.len()
    }

    /// 正誤表示中なら (選んだ番号, 正解番号)
    pub fn feedback(&self) -> Option<(usize, usize)> {
        match (self.phase, &self.current_question) {
            (Phase::ShowingFeedback { chosen, .. }, Some(q)) => Some((chosen, q.correct_index)),
            _ => None,
        }
    }
}

/// 遷移を起こすイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// メニューで形式とカテゴリを選んで開始
    Start {
        kind: PromptKind,
        category: String,
    },
    /// `i` 番目の選択肢を選んだ
    Answer(usize),
    /// 毎フレームの時刻通知 (正誤表示の終了判定用)
    Tick,
    /// ゲームオーバーからメニューへ戻る
    Restart,
}

/// バンクと乱数ソースを持ち、状態遷移を行う
pub struct QuizSession<'a, R> {
    bank: &'a QuestionBank,
    rules: SessionRules,
    rng: R,
}

impl<'a, R> QuizSession<'a, R> {
    pub fn new(bank: &'a QuestionBank, rules: SessionRules, rng: R) -> Self {
        Self { bank, rules, rng }
    }

    pub fn rules(&self) -> &SessionRules {
        &self.rules
    }

    pub fn bank(&self) -> &'a QuestionBank {
        self.bank
    }

    /// メニューに出せるカテゴリ
    pub fn playable_categories(&self, kind: PromptKind) -> Vec<&'a str> {
        let bank = self.bank;
        bank.categories()
            .filter(|c| bank.playable(kind, c, &self.rules))
            .collect()
    }
}

impl<R: RandomSource> QuizSession<'_, R> {
    /// MARK: 状態遷移。受け取った状態を消費して次の状態を返す。
    /// 当てはまらない組み合わせは何もしない。
    pub fn transition(
        &mut self,
        state: SessionState,
        event: SessionEvent,
        now: Instant,
    ) -> QuizResult<SessionState> {
        match (state.phase, event) {
            (Phase::Menu, SessionEvent::Start { kind, category }) => {
                self.start(kind, category)
            }
            (Phase::AwaitingAnswer, SessionEvent::Answer(chosen)) => {
                Ok(Self::answer(state, chosen, now))
            }
            (Phase::ShowingFeedback { since, .. }, SessionEvent::Tick) => {
                if now.saturating_duration_since(since) >= self.rules.feedback_duration {
                    self.advance(state)
                } else {
                    Ok(state)
                }
            }
            (Phase::GameOver, SessionEvent::Restart) => {
                debug!("back to menu");
                Ok(SessionState::default())
            }
            _ => Ok(state),
        }
    }

    fn start(&mut self, kind: PromptKind, category: String) -> QuizResult<SessionState> {
        let deck = self
            .bank
            .sample(&category, self.rules.num_questions, &mut self.rng)?;
        let pool = self.bank.answer_pool(kind, &category)?;
        let Some(first) = deck.first().cloned() else {
            return Err(QuizError::InsufficientData {
                requested: self.rules.num_questions,
                available: 0,
            });
        };
        let question = Question::build(kind, first, &pool, self.rules.num_options, &mut self.rng)?;

        info!(mode = kind.label(), category = %category, questions = deck.len(), "session started");
        Ok(SessionState {
            phase: Phase::AwaitingAnswer,
            question_index: 0,
            lives: self.rules.max_lives,
            score: 0,
            current_question: Some(question),
            kind: Some(kind),
            category: Some(category),
            deck,
            pool,
        })
    }

    fn answer(mut state: SessionState, chosen: usize, now: Instant) -> SessionState {
        let Some(question) = &state.current_question else {
            return state;
        };
        if chosen >= question.options.len() {
            return state;
        }

        let correct = chosen == question.correct_index;
        debug!(
            question = state.question_index + 1,
            chosen,
            correct,
            expected = question.correct_answer(),
            "answered"
        );
        if correct {
            state.score += 1;
        } else {
            state.lives = state.lives.saturating_sub(1);
        }
        state.phase = Phase::ShowingFeedback { chosen, since: now };
        state
    }

    fn advance(&mut self, mut state: SessionState) -> QuizResult<SessionState> {
        if state.lives == 0 || state.question_index + 1 >= state.deck.len() {
            info!(score = state.score, lives = state.lives, "game over");
            state.phase = Phase::GameOver;
            return Ok(state);
        }

        state.question_index += 1;
        let subject = state.deck[state.question_index].clone();
        // kind は開始時に必ず入る
        let kind = state.kind.unwrap_or(PromptKind::Flag);
        let question = Question::build(
            kind,
            subject,
            &state.pool,
            self.rules.num_options,
            &mut self.rng,
        )?;
        state.current_question = Some(question);
        state.phase = Phase::AwaitingAnswer;
        Ok(state)
    }
}
