// ============================================
// src/assets.rs
// 国旗画像の解決 (見つからなくてもゲームは止めない)
// ============================================

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{QuizError, QuizResult};

const FLAG_EXTENSION: &str = "png";

/// 国旗の表示内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagArt {
    Found { path: PathBuf, glyph: String },
    /// "Flag not found" を表示する
    Missing,
}

/// 国旗画像ディレクトリ。一度調べたコードは覚えておく。
#[derive(Debug, Clone)]
pub struct FlagAssets {
    dir: PathBuf,
    cache: HashMap<String, FlagArt>,
}

impl FlagAssets {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: HashMap::new(),
        }
    }

    /// `<CODE>.png` -> `<code>.png` の順に探す
    pub fn resolve(&self, code: &str) -> QuizResult<PathBuf> {
        [code.to_uppercase(), code.to_lowercase()]
            .iter()
            .map(|name| self.dir.join(format!("{name}.{FLAG_EXTENSION}")))
            .find(|path| path.is_file())
            .ok_or_else(|| QuizError::AssetMissing {
                code: code.to_string(),
            })
    }

    /// MARK: 表示用に解決 (失敗はその場で Missing に落とす)
    pub fn art(&mut self, code: &str) -> &FlagArt {
        let key = code.to_uppercase();
        if !self.cache.contains_key(&key) {
            let art = match self.resolve(code) {
                Ok(path) => FlagArt::Found {
                    path,
                    glyph: flag_glyph(code),
                },
                Err(err) => {
                    debug!(dir = %self.dir.display(), "{err}");
                    FlagArt::Missing
                }
            };
            self.cache.insert(key.clone(), art);
        }
        &self.cache[&key]
    }
}

/// 2文字コードなら地域指示記号で国旗絵文字を作る。それ以外はコードのまま。
pub fn flag_glyph(code: &str) -> String {
    let code = code.to_uppercase();
    if code.len() == 2 && code.chars().all(|c| c.is_ascii_uppercase()) {
        code.chars()
            .filter_map(|c| char::from_u32(0x1F1E6 + (c as u32 - 'A' as u32)))
            .collect()
    } else {
        code
    }
}
