// ============================================
// src/bank.rs
// 国データ (問題バンク) の読み込みとサンプリング
// ============================================

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{QuizError, QuizResult};
use crate::questions::PromptKind;
use crate::random::{self, RandomSource};
use crate::session::SessionRules;

/// 1か国分のデータ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryEntry {
    pub country_code: String,
    pub country_name: String,
    pub capital: String,
}

/// JSON 上の生の形 (欠けたフィールドは後で検査する)
#[derive(Deserialize)]
struct RawEntry {
    country_code: Option<Value>,
    country_name: Option<Value>,
    capital: Option<Value>,
}

/// カテゴリ (難易度・地域) ごとに分けた国リスト
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    /// データセットに書かれた順のまま保持する
    categories: Vec<(String, Vec<CountryEntry>)>,
}

impl QuestionBank {
    /// MARK: JSON 文字列からバンクを作る
    pub fn load(source: &str) -> QuizResult<Self> {
        let root: Value = serde_json::from_str(source)
            .map_err(|e| QuizError::data_format(format!("invalid JSON: {e}")))?;
        let Value::Object(map) = root else {
            return Err(QuizError::data_format(
                "top level must be an object of category -> list",
            ));
        };

        let mut categories = Vec::with_capacity(map.len());
        for (name, value) in map {
            let Value::Array(items) = value else {
                return Err(QuizError::data_format(format!(
                    "category `{name}` is not a list"
                )));
            };

            let mut entries = Vec::with_capacity(items.len());
            let mut seen = HashSet::new();
            for (idx, item) in items.into_iter().enumerate() {
                let entry = parse_entry(&name, idx, item)?;
                // カテゴリ内でコードは一意
                if !seen.insert(entry.country_code.to_uppercase()) {
                    return Err(QuizError::data_format(format!(
                        "duplicate country_code `{}` in category `{name}`",
                        entry.country_code
                    )));
                }
                entries.push(entry);
            }
            categories.push((name, entries));
        }

        let bank = Self { categories };
        bank.warn_cross_category_duplicates();
        Ok(bank)
    }

    /// ファイルから読み込む (起動時に一度だけ)
    pub fn load_file(path: &Path) -> QuizResult<Self> {
        let source = fs::read_to_string(path).map_err(|source| QuizError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let bank = Self::load(&source)?;
        info!(
            path = %path.display(),
            categories = bank.categories.len(),
            countries = bank.total_entries(),
            "dataset loaded"
        );
        Ok(bank)
    }

    /// カテゴリ名一覧 (データセット順)
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(name, _)| name.as_str())
    }

    pub fn entries(&self, category: &str) -> QuizResult<&[CountryEntry]> {
        self.categories
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, entries)| entries.as_slice())
            .ok_or_else(|| QuizError::UnknownCategory(category.to_string()))
    }

    pub fn total_entries(&self) -> usize {
        self.categories.iter().map(|(_, e)| e.len()).sum()
    }

    /// MARK: カテゴリから重複なしで `count` 件をランダム順に取り出す
    pub fn sample<R: RandomSource + ?Sized>(
        &self,
        category: &str,
        count: usize,
        rng: &mut R,
    ) -> QuizResult<Vec<CountryEntry>> {
        let entries = self.entries(category)?;
        if count > entries.len() {
            return Err(QuizError::InsufficientData {
                requested: count,
                available: entries.len(),
            });
        }
        Ok(random::choose(entries, count, rng))
    }

    /// カテゴリ内の答えの候補 (重複を除いてデータセット順)
    pub fn answer_pool(&self, kind: PromptKind, category: &str) -> QuizResult<Vec<String>> {
        let mut seen = HashSet::new();
        Ok(self
            .entries(category)?
            .iter()
            .map(|e| kind.answer_of(e))
            .filter(|answer| seen.insert(*answer))
            .map(str::to_string)
            .collect())
    }

    /// メニューに出してよいカテゴリか (1セッション分を賄えるか)
    pub fn playable(&self, kind: PromptKind, category: &str, rules: &SessionRules) -> bool {
        let Ok(entries) = self.entries(category) else {
            return false;
        };
        let pool = self.answer_pool(kind, category).map_or(0, |p| p.len());
        entries.len() >= rules.num_questions && pool >= rules.num_options
    }

    /// 別カテゴリ間の重複コードは許すが警告を出す
    fn warn_cross_category_duplicates(&self) {
        let mut owner: HashMap<String, &str> = HashMap::new();
        for (name, entries) in &self.categories {
            for entry in entries {
                let code = entry.country_code.to_uppercase();
                if let Some(first) = owner.get(&code) {
                    warn!(code = %code, first = %first, again = %name, "country code appears in more than one category");
                } else {
                    owner.insert(code, name.as_str());
                }
            }
        }
    }
}

fn parse_entry(category: &str, idx: usize, item: Value) -> QuizResult<CountryEntry> {
    if !item.is_object() {
        return Err(QuizError::data_format(format!(
            "entry #{idx} in `{category}` is not an object"
        )));
    }
    let raw: RawEntry = serde_json::from_value(item)
        .map_err(|e| QuizError::data_format(format!("entry #{idx} in `{category}`: {e}")))?;

    let field = |value: Option<Value>, key: &str| -> QuizResult<String> {
        match value {
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            _ => Err(QuizError::data_format(format!(
                "entry #{idx} in `{category}` is missing `{key}`"
            ))),
        }
    };

    Ok(CountryEntry {
        country_code: field(raw.country_code, "country_code")?,
        country_name: field(raw.country_name, "country_name")?,
        capital: field(raw.capital, "capital")?,
    })
}

/// MARK: 正解以外から `n` 個の誤答を選ぶ
pub fn distractors<R: RandomSource + ?Sized>(
    correct: &str,
    pool: &[String],
    n: usize,
    rng: &mut R,
) -> QuizResult<Vec<String>> {
    let mut seen = HashSet::new();
    let candidates: Vec<&String> = pool
        .iter()
        .filter(|v| v.as_str() != correct && seen.insert(v.as_str()))
        .collect();
    if candidates.len() < n {
        return Err(QuizError::InsufficientData {
            requested: n,
            available: candidates.len(),
        });
    }
    Ok(random::choose(&candidates, n, rng)
        .into_iter()
        .cloned()
        .collect())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::QuestionBank;

    /// テスト用のデータセット。Easy は12か国、Tiny は3か国。
    pub const DATASET: &str = r#"{
        "Easy": [
            {"country_code": "fr", "country_name": "France", "capital": "Paris"},
            {"country_code": "de", "country_name": "Germany", "capital": "Berlin"},
            {"country_code": "it", "country_name": "Italy", "capital": "Rome"},
            {"country_code": "es", "country_name": "Spain", "capital": "Madrid"},
            {"country_code": "pt", "country_name": "Portugal", "capital": "Lisbon"},
            {"country_code": "gb", "country_name": "United Kingdom", "capital": "London"},
            {"country_code": "ie", "country_name": "Ireland", "capital": "Dublin"},
            {"country_code": "nl", "country_name": "Netherlands", "capital": "Amsterdam"},
            {"country_code": "be", "country_name": "Belgium", "capital": "Brussels"},
            {"country_code": "at", "country_name": "Austria", "capital": "Vienna"},
            {"country_code": "ch", "country_name": "Switzerland", "capital": "Bern"},
            {"country_code": "se", "country_name": "Sweden", "capital": "Stockholm"}
        ],
        "Tiny": [
            {"country_code": "jp", "country_name": "Japan", "capital": "Tokyo"},
            {"country_code": "kr", "country_name": "South Korea", "capital": "Seoul"},
            {"country_code": "cn", "country_name": "China", "capital": "Beijing"}
        ]
    }"#;

    pub fn bank() -> QuestionBank {
        QuestionBank::load(DATASET).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::io::Write;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::fixtures::{DATASET, bank};
    use super::*;
    use crate::random::RngSource;
    use crate::random::testing::Scripted;

    fn err_message(source: &str) -> String {
        match QuestionBank::load(source) {
            Err(QuizError::DataFormat { message }) => message,
            other => panic!("expected DataFormat error, got {other:?}"),
        }
    }

    #[test]
    fn load_keeps_dataset_order() {
        let bank = bank();
        assert_eq!(bank.categories().collect::<Vec<_>>(), vec!["Easy", "Tiny"]);
        assert_eq!(bank.entries("Easy").unwrap().len(), 12);
        assert_eq!(bank.entries("Tiny").unwrap()[0].capital, "Tokyo");
        assert_eq!(bank.total_entries(), 15);
    }

    #[test]
    fn load_rejects_non_list_category() {
        let msg = err_message(r#"{"Easy": {"country_code": "fr"}}"#);
        assert!(msg.contains("not a list"), "{msg}");
    }

    #[test]
    fn load_rejects_non_object_root() {
        err_message(r#"[1, 2, 3]"#);
    }

    #[test]
    fn load_rejects_missing_or_empty_fields() {
        let msg = err_message(r#"{"Easy": [{"country_code": "fr", "country_name": "France"}]}"#);
        assert!(msg.contains("capital"), "{msg}");

        let msg = err_message(
            r#"{"Easy": [{"country_code": "  ", "country_name": "France", "capital": "Paris"}]}"#,
        );
        assert!(msg.contains("country_code"), "{msg}");

        let msg = err_message(
            r#"{"Easy": [{"country_code": "fr", "country_name": 12, "capital": "Paris"}]}"#,
        );
        assert!(msg.contains("country_name"), "{msg}");
    }

    #[test]
    fn load_rejects_duplicate_code_within_category() {
        let msg = err_message(
            r#"{"Easy": [
                {"country_code": "fr", "country_name": "France", "capital": "Paris"},
                {"country_code": "FR", "country_name": "France", "capital": "Paris"}
            ]}"#,
        );
        assert!(msg.contains("duplicate"), "{msg}");
    }

    #[test]
    fn load_accepts_duplicate_code_across_categories() {
        let bank = QuestionBank::load(
            r#"{
                "Easy": [{"country_code": "fr", "country_name": "France", "capital": "Paris"}],
                "Hard": [{"country_code": "fr", "country_name": "France", "capital": "Paris"}]
            }"#,
        )
        .unwrap();
        assert_eq!(bank.total_entries(), 2);
    }

    #[test]
    fn load_file_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DATASET.as_bytes()).unwrap();
        let bank = QuestionBank::load_file(file.path()).unwrap();
        assert_eq!(bank.total_entries(), 15);

        let missing = QuestionBank::load_file(Path::new("/definitely/not/here.json"));
        assert!(matches!(missing, Err(QuizError::Io { .. })));
    }

    #[test]
    fn sample_returns_distinct_members() {
        let bank = bank();
        let easy = bank.entries("Easy").unwrap();
        let mut rng = RngSource(StdRng::seed_from_u64(1));
        for k in 0..=easy.len() {
            let drawn = bank.sample("Easy", k, &mut rng).unwrap();
            assert_eq!(drawn.len(), k);
            let codes: HashSet<_> = drawn.iter().map(|e| &e.country_code).collect();
            assert_eq!(codes.len(), k);
            assert!(drawn.iter().all(|e| easy.contains(e)));
        }
    }

    #[test]
    fn sample_fails_when_category_is_too_small() {
        let err = bank().sample("Tiny", 4, &mut Scripted::default()).unwrap_err();
        assert!(matches!(
            err,
            QuizError::InsufficientData {
                requested: 4,
                available: 3
            }
        ));
    }

    #[test]
    fn sample_fails_for_unknown_category() {
        let err = bank().sample("Nope", 1, &mut Scripted::default()).unwrap_err();
        assert!(matches!(err, QuizError::UnknownCategory(name) if name == "Nope"));
    }

    #[test]
    fn distractors_exclude_correct_and_are_distinct() {
        let pool = bank().answer_pool(PromptKind::Capital, "Easy").unwrap();
        let mut rng = RngSource(StdRng::seed_from_u64(9));
        for _ in 0..50 {
            let picked = distractors("Paris", &pool, 3, &mut rng).unwrap();
            assert_eq!(picked.len(), 3);
            assert!(!picked.iter().any(|p| p == "Paris"));
            let unique: HashSet<_> = picked.iter().collect();
            assert_eq!(unique.len(), 3);
        }
    }

    #[test]
    fn distractors_collapse_duplicates_in_pool() {
        let pool: Vec<String> = ["A", "B", "B", "B", "C"].map(String::from).to_vec();
        let err = distractors("A", &pool, 3, &mut Scripted::default()).unwrap_err();
        assert!(matches!(
            err,
            QuizError::InsufficientData {
                requested: 3,
                available: 2
            }
        ));
    }

    #[test]
    fn bundled_dataset_is_fully_playable() {
        let bank = QuestionBank::load(include_str!("../Assets/Capitals_and_Categories.json"))
            .unwrap();
        assert_eq!(
            bank.categories().collect::<Vec<_>>(),
            vec!["Easy", "Medium", "Hard"]
        );

        let mut codes = HashSet::new();
        for category in bank.categories() {
            for kind in PromptKind::ALL {
                assert!(bank.playable(kind, category, &SessionRules::default()));
            }
            for entry in bank.entries(category).unwrap() {
                assert!(codes.insert(entry.country_code.to_uppercase()));
            }
        }
    }

    #[test]
    fn playable_checks_size_and_pool() {
        let bank = bank();
        let rules = SessionRules::default();
        assert!(bank.playable(PromptKind::Flag, "Easy", &rules));
        assert!(!bank.playable(PromptKind::Flag, "Tiny", &rules));
        assert!(!bank.playable(PromptKind::Flag, "Missing", &rules));

        let small = SessionRules {
            num_questions: 3,
            num_options: 3,
            ..SessionRules::default()
        };
        assert!(bank.playable(PromptKind::Capital, "Tiny", &small));
    }
}
