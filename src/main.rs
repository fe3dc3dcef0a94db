// ============================================
// src/main.rs (メインファイル)
// ============================================

use std::io::{self, stdout};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    ExecutableCommand,
    cursor::{Hide, Show},
    event::{self, DisableMouseCapture, EnableMouseCapture},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use tracing::info;

mod app;
mod assets;
mod bank;
mod config;
mod error;
mod logging;
mod questions;
mod random;
mod session;
mod ui;

use app::App;
use assets::FlagAssets;
use bank::QuestionBank;
use config::{Cli, GameConfig};
use random::{RandomSource, RngSource};

/// 入力待ちの最大時間 (この間隔で正誤表示の時間切れも判定する)
const POLL_INTERVAL: Duration = Duration::from_millis(50);

// --------------------------------------------------
// メイン関数 (TUIセットアップと実行ループ)
// --------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = GameConfig::load(&cli).context("failed to load configuration")?;
    logging::init_logging(&config.log_path())?;

    // データは起動時に一度だけ読む。壊れていたらここで終了。
    let bank = QuestionBank::load_file(&config.dataset)
        .with_context(|| format!("failed to load dataset {}", config.dataset.display()))?;

    let mut app = App::new(
        &bank,
        config.rules(),
        FlagAssets::new(&config.flag_dir),
        RngSource::thread(),
    );

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app);
    // ループがエラーで抜けても端末は必ず元に戻す
    restore_terminal()?;
    result
}

fn setup_terminal() -> io::Result<Terminal<impl Backend>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?; // 代替スクリーンを使用
    stdout().execute(EnableMouseCapture)?; // クリックとホバーを受け取る
    stdout().execute(Hide)?; // カーソルを非表示
    let backend = CrosstermBackend::new(stdout());
    Terminal::new(backend)
}

fn restore_terminal() -> io::Result<()> {
    stdout().execute(Show)?; // カーソルを再表示
    stdout().execute(DisableMouseCapture)?;
    stdout().execute(LeaveAlternateScreen)?; // 代替スクリーンを終了
    disable_raw_mode()?;
    Ok(())
}

fn run_app<R: RandomSource>(
    terminal: &mut Terminal<impl Backend>,
    app: &mut App<'_, R>,
) -> Result<()> {
    info!("game started");

    loop {
        terminal.draw(|f| ui::ui(f, app))?;

        if event::poll(POLL_INTERVAL)? {
            app.handle_event(event::read()?, Instant::now())?;
        }
        if app.should_quit() {
            break;
        }

        // 正誤表示はブロックせず、毎周時刻を見て進める
        app.tick(Instant::now())?;
    }

    info!("game closed");
    Ok(())
}
