// ============================================
// src/config.rs
// 設定: 既定値 < 設定ファイル (TOML) < コマンドライン
// ============================================

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use directories::ProjectDirs;
use serde::Deserialize;

use crate::error::{QuizError, QuizResult};
use crate::session::SessionRules;

const CONFIG_FILE: &str = "config.toml";
const LOG_FILE: &str = "worldquiz.log";

/// コマンドライン引数
#[derive(Debug, Default, Parser)]
#[command(name = "worldquiz", version, about = "World Quiz Game: guess flags and capitals")]
pub struct Cli {
    /// 設定ファイル (省略時は OS の設定ディレクトリの config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 国データ JSON
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// 国旗画像ディレクトリ
    #[arg(short, long)]
    pub flags: Option<PathBuf>,

    /// 1セッションの問題数
    #[arg(long)]
    pub questions: Option<usize>,

    /// ライフの数
    #[arg(long)]
    pub lives: Option<u32>,

    /// 正誤表示の時間 (ミリ秒)
    #[arg(long)]
    pub feedback_ms: Option<u64>,

    /// ログの出力先
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// ゲーム設定
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    pub dataset: PathBuf,
    pub flag_dir: PathBuf,
    pub num_questions: usize,
    pub num_options: usize,
    pub max_lives: u32,
    pub feedback_ms: u64,
    pub log_file: Option<PathBuf>,
}

impl Default for GameConfig {
    fn default() -> Self {
        let rules = SessionRules::default();
        Self {
            dataset: PathBuf::from("Assets/Capitals_and_Categories.json"),
            flag_dir: PathBuf::from("Assets/flags_images"),
            num_questions: rules.num_questions,
            num_options: rules.num_options,
            max_lives: rules.max_lives,
            feedback_ms: rules.feedback_duration.as_millis() as u64,
            log_file: None,
        }
    }
}

impl GameConfig {
    /// MARK: 設定を組み立てる
    pub fn load(cli: &Cli) -> QuizResult<Self> {
        // 既定の場所のファイルは無ければ既定値、あれば壊れていたらエラー
        let path = cli
            .config
            .clone()
            .or_else(|| default_config_path().filter(|p| p.is_file()));
        let base = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        let config = base.with_overrides(cli);
        config.rules().validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> QuizResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| QuizError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> QuizResult<Self> {
        toml::from_str(text).map_err(|e| QuizError::config(e.to_string()))
    }

    /// コマンドラインで指定された項目だけ上書き
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(data) = &cli.data {
            self.dataset = data.clone();
        }
        if let Some(flags) = &cli.flags {
            self.flag_dir = flags.clone();
        }
        if let Some(n) = cli.questions {
            self.num_questions = n;
        }
        if let Some(lives) = cli.lives {
            self.max_lives = lives;
        }
        if let Some(ms) = cli.feedback_ms {
            self.feedback_ms = ms;
        }
        if let Some(log) = &cli.log_file {
            self.log_file = Some(log.clone());
        }
        self
    }

    pub fn rules(&self) -> SessionRules {
        SessionRules {
            num_questions: self.num_questions,
            num_options: self.num_options,
            max_lives: self.max_lives,
            feedback_duration: Duration::from_millis(self.feedback_ms),
        }
    }

    /// ログファイルの場所 (指定がなければ OS のデータディレクトリ)
    pub fn log_path(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(|| {
            project_dirs()
                .map(|dirs| dirs.data_dir().join(LOG_FILE))
                .unwrap_or_else(|| PathBuf::from(LOG_FILE))
        })
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "WorldQuiz", "worldquiz")
}

fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
