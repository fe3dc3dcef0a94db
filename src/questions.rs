/*
 * src/questions.rs
 * 出題形式と、1問分の問題データ
 */

use crate::bank::{CountryEntry, distractors};
use crate::error::QuizResult;
use crate::random::RandomSource;

/// 出題形式
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PromptKind {
    /// 国旗を見て国名を答える
    Flag,
    /// 国名を見て首都を答える
    Capital,
}

impl PromptKind {
    pub const ALL: [PromptKind; 2] = [PromptKind::Flag, PromptKind::Capital];

    /// メニューのボタン表示名
    pub fn label(self) -> &'static str {
        match self {
            PromptKind::Flag => "Flag Quiz",
            PromptKind::Capital => "Capital Quiz",
        }
    }

    /// この形式での正解 (国名 or 首都)
    pub fn answer_of(self, entry: &CountryEntry) -> &str {
        match self {
            PromptKind::Flag => &entry.country_name,
            PromptKind::Capital => &entry.capital,
        }
    }

    pub fn prompt_text(self, entry: &CountryEntry) -> String {
        match self {
            PromptKind::Flag => "Which country is this flag?".to_string(),
            PromptKind::Capital => format!("What is the capital of {}?", entry.country_name),
        }
    }
}

/// 1問分のデータ。作成後は変更しない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub kind: PromptKind,
    pub subject: CountryEntry,
    pub options: Vec<String>,
    pub correct_index: usize,
}

impl Question {
    /// MARK: 誤答を選び、正解をランダムな位置に差し込む
    pub fn build<R: RandomSource + ?Sized>(
        kind: PromptKind,
        subject: CountryEntry,
        pool: &[String],
        num_options: usize,
        rng: &mut R,
    ) -> QuizResult<Self> {
        let correct = kind.answer_of(&subject).to_string();
        let mut options = distractors(&correct, pool, num_options.saturating_sub(1), rng)?;

        // 正解の位置が覚えられないよう毎回ランダムに
        let correct_index = rng.below(options.len() + 1);
        options.insert(correct_index, correct);

        Ok(Self {
            kind,
            subject,
            options,
            correct_index,
        })
    }

    pub fn correct_answer(&self) -> &str {
        &self.options[self.correct_index]
    }

    pub fn prompt_text(&self) -> String {
        self.kind.prompt_text(&self.subject)
    }
}
