// ============================================
// src/error.rs
// ゲーム全体で使うエラー型
// ============================================

use std::path::PathBuf;

use thiserror::Error;

/// クイズのエラー
#[derive(Debug, Error)]
pub enum QuizError {
    /// データセットの形式が不正 (起動時に致命的)
    #[error("dataset format error: {message}")]
    DataFormat { message: String },

    /// 要求数に対して候補が足りない
    #[error("insufficient data: requested {requested}, only {available} available")]
    InsufficientData { requested: usize, available: usize },

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    /// 国旗画像が見つからない (その場で回復する)
    #[error("flag image not found for `{code}`")]
    AssetMissing { code: String },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {message}")]
    Config { message: String },
}

impl QuizError {
    pub fn data_format(message: impl Into<String>) -> Self {
        Self::DataFormat {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

pub type QuizResult<T> = Result<T, QuizError>;
