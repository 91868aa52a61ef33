use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

const TICK_CHARS: &str = "/|\\- ";

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(TICK_CHARS)
}

/// スピナーを回しながら `action` を実行する。失敗時はスピナーを消す。
pub fn with_spinner<T, F>(message: &str, action: F) -> Result<T>
where
    F: FnOnce(&ProgressBar) -> Result<T>,
{
    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_style(style("{spinner:.green} {msg}"));
    spinner.set_message(message.to_string());

    let result = action(&spinner);
    match &result {
        Ok(_) => spinner.finish_with_message(format!("✔ {message}")),
        Err(_) => spinner.finish_and_clear(),
    }
    result
}

/// ファンアウト処理の進捗バー。端末でない場合は何も描画しない。
pub fn counter_bar(total: usize, message: &str) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        style("{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len}").progress_chars("=> "),
    );
    bar.set_message(message.to_string());
    bar
}
