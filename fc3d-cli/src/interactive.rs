use anyhow::{Context, Result};

use fc3d_engine::intent::classify;

use crate::Session;

#[derive(Debug, PartialEq)]
enum InteractiveCommand {
    Add,
    History,
    Recommend,
    Missing,
    Digest,
    Refresh,
    Quit,
    /// Anything else is treated as a free-text question.
    Ask(String),
}

fn parse_command(input: &str) -> Option<InteractiveCommand> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let command = match trimmed.to_lowercase().as_str() {
        "1" | "添加" | "add" => InteractiveCommand::Add,
        "2" | "历史" | "history" | "hist" => InteractiveCommand::History,
        "3" | "推荐" | "recommend" | "rec" => InteractiveCommand::Recommend,
        "4" | "遗漏" | "missing" | "miss" => InteractiveCommand::Missing,
        "5" | "摘要" | "digest" => InteractiveCommand::Digest,
        "6" | "刷新" | "refresh" => InteractiveCommand::Refresh,
        "7" | "退出" | "quit" | "q" | "exit" => InteractiveCommand::Quit,
        _ => InteractiveCommand::Ask(trimmed.to_string()),
    };
    Some(command)
}

fn display_menu() {
    println!();
    println!("── 交互模式 ──");
    println!("  1. 添加    手动添加一期开奖");
    println!("  2. 历史    最近开奖");
    println!("  3. 推荐    下期号码推荐");
    println!("  4. 遗漏    遗漏表");
    println!("  5. 摘要    文本摘要");
    println!("  6. 刷新    重新加载数据");
    println!("  7. 退出");
    println!("  也可以直接提问，例如：最近和值走势怎么样");
    println!();
}

fn prompt_with_default(msg: &str, default: &str) -> Result<String> {
    let input = super::prompt(&format!("{} [{}]：", msg, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

fn cmd_history_interactive(session: &Session) -> Result<()> {
    let n_str = prompt_with_default("显示期数", "10")?;
    let n: u32 = n_str.parse().context("期数无效")?;
    super::cmd_list(session, n)
}

fn cmd_missing_interactive(session: &Session) -> Result<()> {
    let dimension = prompt_with_default("维度", "hundreds")?;
    let n_str = prompt_with_default("显示期数", "30")?;
    let n: usize = n_str.parse().context("期数无效")?;
    super::cmd_missing(session, &dimension, n)
}

fn cmd_ask_interactive(session: &Session, text: &str) -> Result<()> {
    log::debug!("interactive query classified as {}", classify(text));
    super::cmd_ask(session, text, false)
}

pub fn run_interactive(session: &Session) -> Result<()> {
    println!("欢迎使用 fc3d 交互模式！");

    loop {
        display_menu();
        let input = match super::prompt("> ") {
            Ok(s) => s,
            Err(_) => break,
        };

        let Some(command) = parse_command(&input) else { continue };

        let outcome = match command {
            InteractiveCommand::Quit => {
                println!("再见！");
                break;
            }
            InteractiveCommand::Add => super::cmd_add(session, None, None, None),
            InteractiveCommand::History => cmd_history_interactive(session),
            InteractiveCommand::Recommend => super::cmd_recommend(session),
            InteractiveCommand::Missing => cmd_missing_interactive(session),
            InteractiveCommand::Digest => super::cmd_digest(session),
            InteractiveCommand::Refresh => {
                session.cache.invalidate();
                session.history().map(|h| println!("已加载 {} 期开奖。", h.len()))
            }
            InteractiveCommand::Ask(text) => cmd_ask_interactive(session, &text),
        };
        if let Err(e) = outcome {
            println!("错误：{e:#}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_by_number() {
        assert_eq!(parse_command("1"), Some(InteractiveCommand::Add));
        assert_eq!(parse_command("2"), Some(InteractiveCommand::History));
        assert_eq!(parse_command("3"), Some(InteractiveCommand::Recommend));
        assert_eq!(parse_command("4"), Some(InteractiveCommand::Missing));
        assert_eq!(parse_command("5"), Some(InteractiveCommand::Digest));
        assert_eq!(parse_command("6"), Some(InteractiveCommand::Refresh));
        assert_eq!(parse_command("7"), Some(InteractiveCommand::Quit));
    }

    #[test]
    fn test_parse_command_by_name() {
        assert_eq!(parse_command("添加"), Some(InteractiveCommand::Add));
        assert_eq!(parse_command("历史"), Some(InteractiveCommand::History));
        assert_eq!(parse_command("推荐"), Some(InteractiveCommand::Recommend));
        assert_eq!(parse_command("遗漏"), Some(InteractiveCommand::Missing));
        assert_eq!(parse_command("摘要"), Some(InteractiveCommand::Digest));
        assert_eq!(parse_command("刷新"), Some(InteractiveCommand::Refresh));
        assert_eq!(parse_command("退出"), Some(InteractiveCommand::Quit));
    }

    #[test]
    fn test_parse_command_by_alias() {
        assert_eq!(parse_command("add"), Some(InteractiveCommand::Add));
        assert_eq!(parse_command("hist"), Some(InteractiveCommand::History));
        assert_eq!(parse_command("rec"), Some(InteractiveCommand::Recommend));
        assert_eq!(parse_command("miss"), Some(InteractiveCommand::Missing));
        assert_eq!(parse_command("q"), Some(InteractiveCommand::Quit));
        assert_eq!(parse_command("exit"), Some(InteractiveCommand::Quit));
    }

    #[test]
    fn test_parse_command_case_insensitive() {
        assert_eq!(parse_command("QUIT"), Some(InteractiveCommand::Quit));
        assert_eq!(parse_command("  Digest "), Some(InteractiveCommand::Digest));
        assert_eq!(parse_command("REC"), Some(InteractiveCommand::Recommend));
    }

    #[test]
    fn test_free_text_becomes_question() {
        assert_eq!(
            parse_command("  最近和值走势怎么样 "),
            Some(InteractiveCommand::Ask("最近和值走势怎么样".to_string()))
        );
        assert_eq!(parse_command("8"), Some(InteractiveCommand::Ask("8".to_string())));
    }

    #[test]
    fn test_parse_command_empty() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("   "), None);
    }
}
