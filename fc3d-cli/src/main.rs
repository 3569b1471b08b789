mod display;
mod import;
mod interactive;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use fc3d_db::db::{count_draws, db_path, fetch_all_draws, fetch_last_draws, insert_draw, latest_period, migrate, open_db};
use fc3d_db::models::{RawDraw, parse_digits};
use fc3d_db::rusqlite::Connection;
use fc3d_engine::cache::HistoryCache;
use fc3d_engine::chart::{build_chart, build_for_query, ChartRequest};
use fc3d_engine::config::AnalysisConfig;
use fc3d_engine::digest::build_digest;
use fc3d_engine::dimension::Dimension;
use fc3d_engine::features::DrawRecord;
use fc3d_engine::gap::ChronologicalGapTable;
use fc3d_engine::intent::{classify, QueryIntent};
use fc3d_engine::recommend::recommend;
use fc3d_engine::streak::summarize;
use fc3d_engine::window::DrawHistory;
use crate::display::{
    display_bundle, display_digest, display_draws, display_gap_table, display_import_summary,
    display_recommendation, display_streaks,
};

#[derive(Parser)]
#[command(name = "fc3d", about = "福彩3D 开奖数据分析")]
struct Cli {
    /// 数据库路径（默认 ./data/fc3d.db）
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// 分析参数 JSON 文件
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 从 CSV 文件导入开奖数据
    Import {
        /// CSV 文件路径
        #[arg(short, long, default_value = "data/fc3d.csv")]
        file: PathBuf,
    },

    /// 显示数据库路径
    DbPath,

    /// 列出最近的开奖
    List {
        /// 显示期数
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// 手动添加一期开奖
    Add {
        /// 期号（例如 2024123）
        #[arg(long)]
        period: Option<String>,
        /// 日期 YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
        /// 开奖号码，例如 358
        #[arg(long)]
        digits: Option<String>,
    },

    /// 遗漏表
    Missing {
        /// 维度: hundreds, tens, units, sum, span, sum-tail, big-small,
        /// odd-even, prime-composite, road-hundreds, road-tens, road-units
        #[arg(short, long, default_value = "hundreds")]
        dimension: String,

        /// 显示期数
        #[arg(short, long, default_value = "30")]
        last: usize,
    },

    /// 出现次数、平均遗漏、最大遗漏、最大连出
    Streaks {
        #[arg(short, long, default_value = "hundreds")]
        dimension: String,

        /// 统计窗口（期数）
        #[arg(short, long, default_value = "100")]
        window: usize,
    },

    /// 下期号码推荐
    Recommend,

    /// 按分析类型生成图表数据
    Chart {
        /// prediction, frequency, missing, sum, span, trend, hot-cold,
        /// pattern, road, group
        #[arg(short, long, default_value = "prediction")]
        intent: String,

        /// 输出 JSON
        #[arg(long)]
        json: bool,
    },

    /// 用自然语言提问，自动识别分析类型
    Ask {
        text: String,

        #[arg(long)]
        json: bool,
    },

    /// 文本摘要
    Digest,

    /// 交互模式
    Interactive,
}

/// Connection, analysis parameters and the cached history for one run.
pub struct Session {
    pub conn: Connection,
    pub config: AnalysisConfig,
    pub cache: HistoryCache,
}

impl Session {
    pub fn open(path: &Path, config: AnalysisConfig) -> Result<Self> {
        let conn = open_db(path)?;
        migrate(&conn)?;
        Ok(Self {
            conn,
            config,
            cache: HistoryCache::new(),
        })
    }

    /// Reuses the cached history while the stored data has not changed.
    pub fn history(&self) -> Result<DrawHistory> {
        let key = (latest_period(&self.conn)?, count_draws(&self.conn)? as usize);
        self.cache.get_or_insert_with(key, || {
            let raw = fetch_all_draws(&self.conn)?;
            DrawHistory::new(raw).context("历史数据无效")
        })
    }

    fn non_empty_history(&self) -> Result<Option<DrawHistory>> {
        let history = self.history()?;
        if history.is_empty() {
            println!("数据库为空。请先运行：fc3d import");
            return Ok(None);
        }
        Ok(Some(history))
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let path = cli.db.unwrap_or_else(db_path);
    let config = match &cli.config {
        Some(p) => AnalysisConfig::load(p)?,
        None => AnalysisConfig::default(),
    };
    let session = Session::open(&path, config)?;

    match cli.command {
        Command::Import { file } => cmd_import(&session, &file),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&session, last),
        Command::Add { period, date, digits } => cmd_add(&session, period, date, digits),
        Command::Missing { dimension, last } => cmd_missing(&session, &dimension, last),
        Command::Streaks { dimension, window } => cmd_streaks(&session, &dimension, window),
        Command::Recommend => cmd_recommend(&session),
        Command::Chart { intent, json } => {
            let intent: QueryIntent = intent.parse()?;
            cmd_chart(&session, intent, json)
        }
        Command::Ask { text, json } => cmd_ask(&session, &text, json),
        Command::Digest => cmd_digest(&session),
        Command::Interactive => interactive::run_interactive(&session),
    }
}

fn cmd_import(session: &Session, file: &Path) -> Result<()> {
    let result = import::import_csv(&session.conn, file)?;
    session.cache.invalidate();
    display_import_summary(&result);
    Ok(())
}

pub(crate) fn cmd_list(session: &Session, last: u32) -> Result<()> {
    let n = count_draws(&session.conn)?;
    if n == 0 {
        println!("数据库为空。请先运行：fc3d import");
        return Ok(());
    }
    let records: Vec<DrawRecord> = fetch_last_draws(&session.conn, last)?
        .iter()
        .map(DrawRecord::from_raw)
        .collect();
    display_draws(&records);
    Ok(())
}

pub(crate) fn cmd_missing(session: &Session, dimension: &str, last: usize) -> Result<()> {
    let dimension: Dimension = dimension.parse()?;
    let Some(history) = session.non_empty_history()? else { return Ok(()) };
    let table = ChronologicalGapTable::build(&history.all().chronological(), dimension).into_presentation();
    display_gap_table(&table, last);
    Ok(())
}

fn cmd_streaks(session: &Session, dimension: &str, window: usize) -> Result<()> {
    let dimension: Dimension = dimension.parse()?;
    let Some(history) = session.non_empty_history()? else { return Ok(()) };
    let table = ChronologicalGapTable::build(&history.latest(window).chronological(), dimension);
    display_streaks(&summarize(&table));
    Ok(())
}

pub(crate) fn cmd_recommend(session: &Session) -> Result<()> {
    let Some(history) = session.non_empty_history()? else { return Ok(()) };
    display_recommendation(&recommend(&history, &session.config));
    Ok(())
}

fn cmd_chart(session: &Session, intent: QueryIntent, json: bool) -> Result<()> {
    let history = session.history()?;
    let bundle = build_chart(ChartRequest::for_intent(intent), &history, &session.config);
    if json {
        println!("{}", serde_json::to_string_pretty(&bundle)?);
    } else {
        display_bundle(&bundle);
    }
    Ok(())
}

pub(crate) fn cmd_ask(session: &Session, text: &str, json: bool) -> Result<()> {
    let history = session.history()?;
    let bundle = build_for_query(text, &history, &session.config);
    if json {
        println!("{}", serde_json::to_string_pretty(&bundle)?);
    } else {
        println!("识别为：{}", classify(text).label());
        display_bundle(&bundle);
    }
    Ok(())
}

pub(crate) fn cmd_digest(session: &Session) -> Result<()> {
    let history = session.history()?;
    display_digest(&build_digest(&history, &session.config));
    Ok(())
}

pub(crate) fn cmd_add(
    session: &Session,
    period: Option<String>,
    date: Option<String>,
    digits: Option<String>,
) -> Result<()> {
    println!("手动添加开奖\n");

    let period = match period {
        Some(p) => p,
        None => prompt("期号（例如 2024123）：")?,
    };
    let raw_date = match date {
        Some(d) => d,
        None => prompt("日期（YYYY-MM-DD）：")?,
    };
    let date = import::parse_date(&raw_date)?;
    let digits = match digits {
        Some(d) => parse_digits(&d)?,
        None => prompt_digits()?,
    };

    let draw = RawDraw::new(period, date, digits);
    draw.validate()?;

    println!("\n待写入：");
    display_draws(&[DrawRecord::from_raw(&draw)]);

    let confirm = prompt("\n确认写入？(y/n)：")?;
    if confirm.trim().to_lowercase() == "y" {
        let inserted = insert_draw(&session.conn, &draw)?;
        if inserted {
            session.cache.invalidate();
            println!("写入成功。");
        } else {
            println!("该期已存在（已跳过）。");
        }
    } else {
        println!("已取消。");
    }

    Ok(())
}

pub(crate) fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    let read = io::stdin()
        .read_line(&mut input)
        .context("读取输入失败")?;
    if read == 0 {
        bail!("输入已结束");
    }
    Ok(input.trim().to_string())
}

fn prompt_digits() -> Result<[u8; 3]> {
    loop {
        let input = prompt("开奖号码（例如 358 或 3 5 8）：")?;
        match parse_digits(&input) {
            Ok(d) => return Ok(d),
            Err(e) => println!("号码无效（{e}）。请重新输入。"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_history_follows_inserts() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::open(&dir.path().join("fc3d.db"), AnalysisConfig::default()).unwrap();
        assert!(session.history().unwrap().is_empty());

        insert_draw(&session.conn, &RawDraw::new("2024001", "2024-01-01", [3, 5, 8])).unwrap();
        let history = session.history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest_period(), Some("2024001"));

        insert_draw(&session.conn, &RawDraw::new("2024002", "2024-01-02", [1, 1, 1])).unwrap();
        assert_eq!(session.history().unwrap().latest_period(), Some("2024002"));
    }

    #[test]
    fn test_cli_parses_chart_and_ask() {
        let cli = Cli::try_parse_from(["fc3d", "chart", "--intent", "hot-cold", "--json"]).unwrap();
        match cli.command {
            Command::Chart { intent, json } => {
                assert_eq!(intent.parse::<QueryIntent>().unwrap(), QueryIntent::HotCold);
                assert!(json);
            }
            _ => panic!("expected chart command"),
        }

        let cli = Cli::try_parse_from(["fc3d", "--db", "/tmp/x.db", "ask", "和值走势"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        assert!(matches!(cli.command, Command::Ask { ref text, json: false } if text == "和值走势"));
    }
}
